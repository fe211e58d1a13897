// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scan and extraction budgets.
//!
//! STEP files can run to hundreds of megabytes, and a single analysis
//! call must not be able to pin a CPU or balloon memory no matter what
//! the input looks like. Every budget here is a hard cap checked on
//! every iteration; exhausting one produces a truncation flag and a
//! warning, never an error.

use serde::{Deserialize, Serialize};

/// Budgets for one analysis or listing call.
///
/// Passed explicitly into every component; there is no ambient
/// configuration, so concurrent calls with different budgets are safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum number of `#id=TYPE(...);` statements scanned in the
    /// DATA section.
    pub max_entities: usize,
    /// Maximum number of entries in the entity type histogram.
    pub max_top_entity_types: usize,
    /// Maximum number of part records built from the
    /// PRODUCT_DEFINITION chain.
    pub max_parts: usize,
    /// Maximum assembly tree depth; deeper nodes become truncated
    /// leaves.
    pub max_assembly_depth: usize,
    /// Maximum assembly tree node count across the whole tree.
    pub max_assembly_nodes: usize,
    /// Maximum number of PMI example snippets retained.
    pub max_pmi_snippets: usize,
    /// Maximum number of measure items retained.
    pub max_measures: usize,
}

impl Default for Limits {
    fn default() -> Self {
        // Conservative enough for most small and mid-size exports;
        // callers with a bigger byte budget can raise max_entities to
        // match.
        Self {
            max_entities: 500_000,
            max_top_entity_types: 200,
            max_parts: 20_000,
            max_assembly_depth: 30,
            max_assembly_nodes: 10_000,
            max_pmi_snippets: 200,
            max_measures: 2_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let limits = Limits::default();
        assert_eq!(limits.max_entities, 500_000);
        assert_eq!(limits.max_top_entity_types, 200);
        assert_eq!(limits.max_parts, 20_000);
        assert_eq!(limits.max_assembly_depth, 30);
        assert_eq!(limits.max_assembly_nodes, 10_000);
        assert_eq!(limits.max_pmi_snippets, 200);
        assert_eq!(limits.max_measures, 2_000);
    }
}
