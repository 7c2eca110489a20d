/// Evaluation settings shared by every expression of a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalConfig {
    /// Deepest allowed nesting of function calls, or `None` for no limit.
    pub max_call_depth: Option<usize>,
    /// Name of the outermost context, shown at the bottom of tracebacks.
    pub program_name: String,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_call_depth: Some(1000),
            program_name: "<program>".to_string(),
        }
    }
}

impl EvalConfig {
    pub fn with_max_call_depth(mut self, depth: Option<usize>) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_program_name(mut self, name: impl Into<String>) -> Self {
        self.program_name = name.into();
        self
    }
}
