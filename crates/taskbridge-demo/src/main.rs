//! TaskBridge demo.
//!
//! Runs a ticking task through the adapters and prints what comes out.

mod config;
mod ticker;

use std::sync::{Arc, Weak};

use clap::{Parser, ValueEnum};
use parking_lot::Mutex;
use taskbridge::{BridgeConfig, observable_from_task_with, task_from_observable_with};
use taskbridge_core::{EventKind, Task, TaskError};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::Config;
use ticker::TickerTask;

/// Which direction to drive the ticker through.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    /// Task -> stream: print each tagged event as JSON.
    Stream,
    /// Task -> stream -> task: print callbacks of the re-wrapped task.
    Roundtrip,
}

/// TaskBridge demo.
#[derive(Parser, Debug)]
#[command(name = "taskbridge-demo", about = "Drive a ticking task through the TaskBridge adapters")]
struct Args {
    /// Adapter direction
    #[arg(long, value_enum, default_value = "stream")]
    mode: Mode,

    /// Number of ticks
    #[arg(long, default_value = "5")]
    steps: u32,

    /// Milliseconds between ticks
    #[arg(long, default_value = "200")]
    tick_interval_ms: u64,

    /// Cancel after this many progress events
    #[arg(long)]
    cancel_after: Option<u32>,

    /// Fail at this tick
    #[arg(long)]
    fail_at: Option<u32>,
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Self {
            steps: args.steps,
            tick_interval_ms: args.tick_interval_ms,
            cancel_after: args.cancel_after,
            fail_at: args.fail_at,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("Failed to encode event: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Task went away without finishing")]
    Dropped,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from(&args);
    info!(mode = ?args.mode, steps = config.steps, "TaskBridge demo starting");

    let outcome = match args.mode {
        Mode::Stream => run_stream(&config).await,
        Mode::Roundtrip => run_roundtrip(&config).await,
    };

    if let Err(e) = &outcome {
        error!(error = %e, "Demo finished with error");
    }
    outcome.map_err(Into::into)
}

/// Subscribe to the ticker as a stream and print every event.
async fn run_stream(config: &Config) -> Result<(), DemoError> {
    let ticker = Arc::new(TickerTask::new(config.clone(), Handle::current()));
    let stream = observable_from_task_with(ticker, BridgeConfig::new().with_name("ticker"));
    let mut events = stream.into_receiver();

    let mut progress_seen = 0;
    while let Some(item) = events.recv().await {
        let event = item?;
        println!("{}", serde_json::to_string(&event)?);

        if event.kind() == EventKind::Progress {
            progress_seen += 1;
            if config.cancel_after == Some(progress_seen) {
                info!(progress_seen, "Releasing subscription early");
                events.release();
                break;
            }
        }
    }

    info!("Stream finished");
    Ok(())
}

/// Wrap the ticker's stream back into a task and listen to its callbacks.
async fn run_roundtrip(config: &Config) -> Result<(), DemoError> {
    let ticker = Arc::new(TickerTask::new(config.clone(), Handle::current()));
    let stream = observable_from_task_with(ticker, BridgeConfig::new().with_name("ticker"));
    let task = Arc::new(task_from_observable_with(
        stream,
        BridgeConfig::new().with_name("roundtrip"),
    ));

    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Result<(), DemoError>>();

    let mut listeners = Vec::new();
    listeners.extend(task.on_status_change(Box::new(|status| println!("status: {status}"))));
    listeners.extend(task.on_message(Box::new(|message| {
        println!("message [{:?}]: {}", message.level, message.text)
    })));
    listeners.extend(task.on_result(Box::new(|result| println!("result: {result}"))));

    let weak: Weak<_> = Arc::downgrade(&task);
    let cancel_after = config.cancel_after;
    let canceled_tx = done_tx.clone();
    let progress_count = Mutex::new(0u32);
    listeners.extend(task.on_progress(Box::new(move |progress| {
        println!("progress: {}", progress.map_or("-".to_string(), |p| format!("{:.0}%", p * 100.0)));
        let mut seen = progress_count.lock();
        *seen += 1;
        if cancel_after == Some(*seen) {
            drop(seen);
            if let Some(task) = weak.upgrade() {
                info!("Canceling round-tripped task");
                task.cancel();
                let _ = canceled_tx.send(Ok(()));
            }
        }
    })));

    let complete_tx = done_tx.clone();
    listeners.push(task.on_did_complete(Box::new(move || {
        let _ = complete_tx.send(Ok(()));
    })));
    let error_tx = done_tx;
    listeners.push(task.on_did_error(Box::new(move |e| {
        let _ = error_tx.send(Err(e.clone().into()));
    })));

    task.start();
    let outcome = done_rx.recv().await.unwrap_or(Err(DemoError::Dropped));

    for mut listener in listeners {
        listener.dispose();
    }
    info!(bridge_id = %task.id(), status = ?task.status(), "Round trip finished");
    outcome
}
