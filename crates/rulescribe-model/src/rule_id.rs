use std::collections::BTreeMap;
use std::str::FromStr;

use regex::Regex;

use crate::error::ModelError;
use crate::rule::{sort_rules, Rule};

/// Parsed starting identifier of the form `<PREFIX>-<NUMBER>`.
///
/// The digit count of `<NUMBER>` is kept as the zero-padding width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleIdSeed {
    pub prefix: String,
    pub number: u64,
    pub width: usize,
}

impl RuleIdSeed {
    /// Identifier `offset` positions after the seed; `None` once the number
    /// no longer fits in a `u64`.
    pub fn nth(&self, offset: u64) -> Option<String> {
        let number = self.number.checked_add(offset)?;
        Some(format!("{}-{:0width$}", self.prefix, number, width = self.width))
    }
}

impl FromStr for RuleIdSeed {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let re = Regex::new(r"^(?P<prefix>.+)-(?P<number>\d+)$").unwrap();
        let caps = re
            .captures(s)
            .ok_or_else(|| ModelError::InvalidRuleId(s.to_string()))?;
        let digits = &caps["number"];
        let number = digits
            .parse::<u64>()
            .map_err(|_| ModelError::InvalidRuleId(s.to_string()))?;

        Ok(Self {
            prefix: caps["prefix"].to_string(),
            number,
            width: digits.len(),
        })
    }
}

/// Sort `rules` deterministically and stamp sequential rule IDs starting at
/// `starting_rule_id`.
///
/// Returns the `internal_id -> rule_id` mapping. The slice is left in sorted
/// order.
pub fn assign_rule_ids(
    rules: &mut [Rule],
    starting_rule_id: &str,
) -> Result<BTreeMap<u32, String>, ModelError> {
    let seed: RuleIdSeed = starting_rule_id.parse()?;
    sort_rules(rules);

    let mut assigned = BTreeMap::new();
    for (offset, rule) in rules.iter_mut().enumerate() {
        let rule_id = seed
            .nth(offset as u64)
            .ok_or_else(|| ModelError::RuleIdOverflow(starting_rule_id.to_string()))?;
        rule.rule_id = Some(rule_id.clone());
        assigned.insert(rule.internal_id, rule_id);
    }

    Ok(assigned)
}
