//! Engine configuration passed to the widget tree.

// ---------------------------------------------------------------------------
// LayoutConfig
// ---------------------------------------------------------------------------

/// Configuration for layout parsing and binding resolution.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Compare widget names in binding paths case-sensitively.
    pub case_sensitive_names: bool,
    /// Emit a `tracing` warning when a layout string fails to parse.
    pub warn_on_parse_failure: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            case_sensitive_names: false,
            warn_on_parse_failure: true,
        }
    }
}

impl LayoutConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set case-sensitive name matching (builder).
    pub fn with_case_sensitive_names(mut self, enabled: bool) -> Self {
        self.case_sensitive_names = enabled;
        self
    }

    /// Set whether parse failures are logged (builder).
    pub fn with_parse_warnings(mut self, enabled: bool) -> Self {
        self.warn_on_parse_failure = enabled;
        self
    }

    /// Whether `a` and `b` name the same widget under this config.
    pub fn names_match(&self, a: &str, b: &str) -> bool {
        if self.case_sensitive_names {
            a == b
        } else {
            a.to_lowercase() == b.to_lowercase()
        }
    }
}
