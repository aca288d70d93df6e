use crate::compile::DEFAULT_CAPACITY;

/// Limits and sizing for an [`Evaluator`](crate::Evaluator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalConfig {
    /// Dice that may be rolled in one evaluation. `None` means no limit.
    pub max_rolls: Option<usize>,
    /// Instruction slots reserved for a program before it has to grow.
    pub program_capacity: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_rolls: Some(1000),
            program_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl EvalConfig {
    pub fn with_max_rolls(mut self, max: usize) -> Self {
        self.max_rolls = Some(max);
        self
    }

    pub fn with_unlimited_rolls(mut self) -> Self {
        self.max_rolls = None;
        self
    }

    pub fn with_program_capacity(mut self, capacity: usize) -> Self {
        self.program_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = EvalConfig::default();
        assert_eq!(config.max_rolls, Some(1000));
        assert_eq!(config.program_capacity, 255);
    }

    #[test]
    fn test_config_builder_chain() {
        let config = EvalConfig::default()
            .with_max_rolls(20)
            .with_program_capacity(8);
        assert_eq!(config.max_rolls, Some(20));
        assert_eq!(config.program_capacity, 8);
        assert_eq!(config.with_unlimited_rolls().max_rolls, None);
    }
}
