//! Hub lifecycle state and statistics

/// Lifecycle state of a hub
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubState {
    /// No upstream subscription
    Idle,
    /// Subscribed to the upstream on behalf of at least one subscriber
    Active,
}

/// Statistics for a hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubStats {
    /// Current lifecycle state
    pub state: HubState,
    /// Subscribers across all keys, wildcard included
    pub subscribers: usize,
    /// Keys with at least one subscriber, wildcard included
    pub keys: usize,
    /// Times the upstream has been started
    pub upstream_runs: u64,
    /// Times an upstream subscription has been released
    pub upstream_releases: u64,
    /// Upstream events dispatched
    pub events: u64,
}
