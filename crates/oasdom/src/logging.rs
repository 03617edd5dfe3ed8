//! Log event names.
//!
//! The crate only emits `tracing` events; installing a subscriber is up to
//! the application.

/// Standard log event names.
pub mod events {
    /// A type registry finished its linking pass.
    pub const TYPES_LINKED: &str = "types_linked";

    /// `link()` was called on an already linked registry.
    pub const LINK_SKIPPED: &str = "link_skipped";

    /// A polymorphic entry was resolved to one of its candidates.
    pub const VARIANT_RESOLVED: &str = "variant_resolved";

    /// A polymorphic entry matched no candidate.
    pub const VARIANT_UNRESOLVED: &str = "variant_unresolved";

    /// A document node failed validation.
    pub const NODE_REJECTED: &str = "node_rejected";
}

/// Route `tracing` output through the test harness.
#[cfg(test)]
pub(crate) fn init_test_logging() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("oasdom=trace")),
        )
        .with_test_writer()
        .try_init();
}
