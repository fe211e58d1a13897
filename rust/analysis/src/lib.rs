// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # STEP-Lite Analysis
//!
//! Engineering-metadata extraction from STEP (ISO-10303-21) DATA
//! sections: assembly hierarchy, parts/BOM, geometry and topology
//! signals, PMI summaries, and a paginated raw-entity lister. Built
//! on the `step-lite-core` scanner.
//!
//! This is deliberately not a geometry kernel. It reads the entity
//! stream once, under hard [`Limits`] budgets, and reports what a
//! person (or a model) needs to understand a file quickly: what is in
//! it, how it is assembled, roughly how big it is, and where the
//! annotations live. For anything deeper, [`list_entities`] pages out
//! raw statements by type for targeted parsing downstream.
//!
//! ```rust
//! use step_lite_analysis::{analyze, Limits};
//!
//! let text = "DATA;\n#1=PRODUCT('P-1','Part','',(#2));\nENDSEC;";
//! let analysis = analyze(text, &Limits::default());
//! assert_eq!(analysis.entities_parsed, 1);
//! assert!(analysis.warnings.is_empty());
//! ```
//!
//! Both entry points are pure functions over the input text: no I/O,
//! no shared state, no panics on any input. Callers own charset
//! decoding and byte budgeting; this crate owns everything between
//! `DATA;` and `ENDSEC`.

mod analyze;
mod assembly;
mod bounds;
mod limits;
mod list;
mod model_info;
mod parts;
mod summary;
mod types;

pub use analyze::analyze;
pub use limits::Limits;
pub use list::list_entities;
pub use model_info::parse_model_info;
pub use types::{
    Analysis, AssemblyNode, AssemblyRelation, AssemblyTree, BoundingBox, EntityPage,
    EntitySnippet, GeometrySummary, MeasureItem, ModelInfo, PartInfo, PmiSummary,
    TopologySummary, TypeCount,
};

/// Insertion-ordered map with the fast hasher. Discovery order is part
/// of the output contract, so plain hash maps are not enough.
pub(crate) type FxIndexMap<K, V> =
    indexmap::IndexMap<K, V, std::hash::BuildHasherDefault<rustc_hash::FxHasher>>;
