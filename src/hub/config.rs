//! Hub configuration

/// How a fan-out pass reacts to a subscriber failing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanoutPolicy {
    /// Keep delivering to the rest of the pass, report all failures afterwards
    #[default]
    Guarded,
    /// Stop the pass at the first failure and report it
    FailFast,
}

/// Hub configuration options
///
/// The policy applies to `event`, `end` and `error` passes alike.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Name attached to every log line of the hub
    pub label: String,

    /// Failure handling during fan-out
    pub fanout: FanoutPolicy,

    /// Initial number of keys the default store makes room for
    pub key_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            label: "dispatch".to_string(),
            fanout: FanoutPolicy::Guarded,
            key_capacity: 0,
        }
    }
}

impl HubConfig {
    /// Create a config with a custom label
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Set the log label
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the fan-out failure policy
    pub fn fanout(mut self, policy: FanoutPolicy) -> Self {
        self.fanout = policy;
        self
    }

    /// Stop each fan-out pass at the first failing subscriber
    pub fn fail_fast(self) -> Self {
        self.fanout(FanoutPolicy::FailFast)
    }

    /// Set the initial key capacity
    pub fn key_capacity(mut self, keys: usize) -> Self {
        self.key_capacity = keys;
        self
    }
}
