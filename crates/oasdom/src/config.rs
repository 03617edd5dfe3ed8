//! Parse configuration.

/// Default limit on nested node depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Options controlling a parse call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum number of nested nodes (default: 64).
    ///
    /// Callbacks nest path items inside operations inside path items, so a
    /// hostile document can recurse arbitrarily deep. A node nested deeper
    /// than this is reported as a violation instead of being parsed.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
