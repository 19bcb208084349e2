//! Resolution options.
//!
//! Options are fixed when a [`Catalog`](crate::catalog::Catalog) is created,
//! so every cached table in a catalog is resolved under the same rules.
//!
//! ```toml
//! diamondPolicy = "merge_identical"
//! maxRefinementDepth = 64
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_REFINEMENT_DEPTH: usize = 256;

/// What to do when flattening reaches the same operation name twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiamondPolicy {
    /// Every repeated name is a `DuplicateOperationName` failure.
    #[default]
    Reject,

    /// A concept reached again along a different chain of refinements is
    /// taken once. A concept repeating its own clause, or refining the same
    /// concept twice, is still rejected.
    MergeIdentical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ResolveOptions {
    pub diamond_policy: DiamondPolicy,

    /// Longest refinement chain accepted before resolution gives up.
    pub max_refinement_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            diamond_policy: DiamondPolicy::Reject,
            max_refinement_depth: DEFAULT_MAX_REFINEMENT_DEPTH,
        }
    }
}

impl ResolveOptions {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let options: Self =
            toml::from_str(text).map_err(|source| ConfigError::ParseToml { source })?;
        options.validate()?;
        Ok(options)
    }

    pub fn with_diamond_policy(mut self, policy: DiamondPolicy) -> Self {
        self.diamond_policy = policy;
        self
    }

    pub fn with_max_refinement_depth(mut self, depth: usize) -> Self {
        self.max_refinement_depth = depth;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_refinement_depth == 0 {
            return Err(ConfigError::Invalid(
                "maxRefinementDepth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
