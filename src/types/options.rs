use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default cap on column-aware transitive-closure iterations before giving up
/// on reaching a fixpoint.
pub const DEFAULT_CLOSURE_ITERATION_CAP: usize = 10;

/// Runtime knobs for a single [`crate::enumerate`] call.
///
/// `Default` enumerates every level with no ceiling, and caps closure at 10
/// iterations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnumerationOptions {
    /// Caps the subset size enumerated by the subset enumerator. `None`
    /// enumerates every level up to the size of the alias universe. Drivers
    /// processing wide queries (dozens of aliases) should set this
    /// explicitly; it is not enforced automatically.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_level: Option<usize>,

    /// Iteration cap for the join graph's column-aware transitive closure.
    /// Raising it lets schemas that legitimately need deeper chaining reach a
    /// fixpoint the default cap would otherwise cut off; the closure also
    /// terminates on its own once no new edge is added in a round, so a
    /// higher cap costs nothing on schemas that converge quickly.
    pub closure_iteration_cap: usize,
}

impl Default for EnumerationOptions {
    fn default() -> Self {
        Self {
            max_level: None,
            closure_iteration_cap: DEFAULT_CLOSURE_ITERATION_CAP,
        }
    }
}
