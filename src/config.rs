// SyntaxLang interpreter configuration

/// Runtime limits and conventions, filled from CLI flags by the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Nested calls allowed before a StackOverflowError
    pub max_call_depth: usize,
    /// Extension accepted by `import`
    pub source_extension: String,
    /// Print every stack frame instead of the first ten
    pub full_trace: bool,
}

impl Config {
    pub const DEFAULT_MAX_CALL_DEPTH: usize = 1024;

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_call_depth: Self::DEFAULT_MAX_CALL_DEPTH,
            source_extension: "sl".to_string(),
            full_trace: false,
        }
    }
}
