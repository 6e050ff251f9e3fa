use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid line range {start}-{end}: start line cannot be greater than end line")]
    InvalidLineRange { start: usize, end: usize },

    #[error("invalid starting rule ID `{0}`: expected <PREFIX>-<NUMBER>")]
    InvalidRuleId(String),

    #[error("rule ID sequence starting at `{0}` runs past the largest number")]
    RuleIdOverflow(String),

    #[error("duplicate internal rule ID: {0}")]
    DuplicateInternalId(u32),

    #[error("rule {0} has no assigned rule ID; assign IDs before resolving dependencies")]
    UnassignedRuleId(u32),

    #[error("rule {rule} depends on unknown internal ID {dependency}")]
    UnknownDependency { rule: u32, dependency: u32 },
}
