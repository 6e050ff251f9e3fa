pub mod deps;
pub mod describe;
pub mod error;
pub mod overrides;
pub mod rule;
pub mod rule_id;

pub use deps::{resolve_dependencies, DependencyGraph, ResolveReport};
pub use error::ModelError;
pub use overrides::OverrideTable;
pub use rule::{sort_rules, Rule, SourceType};
pub use rule_id::{assign_rule_ids, RuleIdSeed};
