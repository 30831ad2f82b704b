//! Adapter configuration.

/// Options shared by both adapters.
#[derive(Debug, Clone, Default)]
pub struct BridgeConfig {
    /// Human-readable name attached to log lines, e.g. the producing command.
    pub name: Option<String>,

    /// Log events a task emits after it finished at `debug` instead of `trace`.
    pub log_late_events: bool,
}

impl BridgeConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name used in log lines.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Surface late task events at `debug` level.
    pub fn with_log_late_events(mut self, enabled: bool) -> Self {
        self.log_late_events = enabled;
        self
    }

    pub(crate) fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = BridgeConfig::new()
            .with_name("adb logcat")
            .with_log_late_events(true);

        assert_eq!(config.label(), "adb logcat");
        assert!(config.log_late_events);
    }

    #[test]
    fn test_default_label() {
        assert_eq!(BridgeConfig::default().label(), "unnamed");
    }
}
