//! Built-in description overrides for the code analyzer.

use rulescribe_model::OverrideTable;

/// What a guard override can match on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardContext {
    pub condition: String,
    pub predicate: String,
    pub called: String,
    /// Single-expression body of the predicate function, when known
    pub predicate_body: Option<String>,
}

/// What a conditional-throw override can match on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrowContext {
    pub function: String,
    pub condition: String,
    pub exception: Option<String>,
    pub message: Option<String>,
}

pub const CHANNEL_MAPPING_GUARD: &str = "If the site region resolved from 'channel.siteID' equals 'wr' AND \
     'beneAdminFeesFeatureFlag' is true, then the request's (target, medium) must be validated \
     against the configured channel mapping.";

pub const CHANNEL_MAPPING_THROW: &str = "For region 'wr' with 'beneAdminFeesFeatureFlag' = true, the pair \
     (target.lowercase(), medium.uppercase()) must exist in 'channelConfig.targetToMediumMap'; \
     otherwise the request is rejected with 'Invalid channel mapping for target: <target> and \
     medium: <medium>'.";

pub fn builtin_guard_overrides() -> OverrideTable<GuardContext> {
    OverrideTable::new().with(
        "channel-mapping-guard",
        |c: &GuardContext| {
            c.predicate == "shouldValidateChannelMapping"
                && c.called == "validateChannelMapping"
                && c.predicate_body.as_deref().is_some_and(|body| {
                    body.contains("beneAdminFeesFeatureFlag") && body.contains("\"wr\"")
                })
        },
        CHANNEL_MAPPING_GUARD,
    )
}

pub fn builtin_throw_overrides() -> OverrideTable<ThrowContext> {
    OverrideTable::new().with(
        "channel-mapping-throw",
        |c: &ThrowContext| {
            c.function == "validateChannelMapping"
                && c.message
                    .as_deref()
                    .is_some_and(|m| m.contains("Invalid channel mapping"))
        },
        CHANNEL_MAPPING_THROW,
    )
}
