//! Metric name and label definitions.
//!
//! Centralizing these keeps names consistent between the crates that record
//! them and whatever dashboards read them.

/// Event dispatch metrics
pub mod dispatch {
    /// Total number of events pulled off the fan-in queue
    pub const EVENTS_TOTAL: &str = "herald_dispatch_events_total";
    /// Events that classified to nothing routable (no prefix, bot author)
    pub const IGNORED_TOTAL: &str = "herald_dispatch_ignored_total";
    /// Events whose target module could not be resolved
    pub const NOT_FOUND_TOTAL: &str = "herald_dispatch_not_found_total";
    /// Dispatches halted by a plugin or a failed argument parse
    pub const HALTED_TOTAL: &str = "herald_dispatch_halted_total";
    /// Dispatches that failed in a plugin or in the handler
    pub const FAILURES_TOTAL: &str = "herald_dispatch_failures_total";
    /// End-to-end dispatch duration in seconds
    pub const DURATION_SECONDS: &str = "herald_dispatch_duration_seconds";
    /// Dispatches currently in flight
    pub const IN_FLIGHT: &str = "herald_dispatch_in_flight";
}

/// Plugin pipeline metrics
pub mod plugins {
    /// Total control plugin invocations
    pub const CALLS_TOTAL: &str = "herald_plugins_calls_total";
    /// Control plugin invocations that returned an error or panicked
    pub const FAILURES_TOTAL: &str = "herald_plugins_failures_total";
    /// Per-plugin execution duration in seconds
    pub const DURATION_SECONDS: &str = "herald_plugins_duration_seconds";
}

/// Module registry metrics
pub mod registry {
    /// Modules accepted into the registry
    pub const MODULES_REGISTERED: &str = "herald_registry_modules_registered";
    /// Modules discarded by an init plugin or an invalid type
    pub const MODULES_REJECTED_TOTAL: &str = "herald_registry_modules_rejected_total";
}

/// Common label keys
pub mod labels {
    pub const KIND: &str = "kind";
    pub const MODULE: &str = "module";
    pub const PLUGIN: &str = "plugin";
    pub const STAGE: &str = "stage";
}
