//! Emulator configuration.

use crate::model::ProcessorModel;

/// Emulator configuration.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EmulatorConfig {
    /// Family member to emulate. Defaults to the 68000.
    pub model: ProcessorModel,
    /// Stop the loop after this many instructions. `None` runs until the
    /// guest halts or finishes.
    pub instruction_limit: Option<u64>,
}

impl EmulatorConfig {
    #[must_use]
    pub const fn new(model: ProcessorModel) -> Self {
        Self {
            model,
            instruction_limit: None,
        }
    }

    #[must_use]
    pub const fn with_instruction_limit(mut self, limit: u64) -> Self {
        self.instruction_limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::EmulatorConfig;
    use crate::model::ProcessorModel;

    #[test]
    fn default_is_unbounded_68000() {
        let config = EmulatorConfig::default();
        assert_eq!(config.model, ProcessorModel::Mc68000);
        assert_eq!(config.instruction_limit, None);
    }

    #[test]
    fn builder_sets_limit() {
        let config = EmulatorConfig::new(ProcessorModel::Mc68030).with_instruction_limit(100);
        assert_eq!(config.model, ProcessorModel::Mc68030);
        assert_eq!(config.instruction_limit, Some(100));
    }
}
