// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Result records for analysis and listing.
//!
//! Everything here is plain owned data: results hold no references to
//! the scanned text and can outlive it freely. Absent information is
//! `None` or an empty list, never an error.

use serde::{Deserialize, Serialize};

/// Histogram entry: how often an entity type occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCount {
    /// Uppercased entity type name.
    pub type_name: String,
    pub count: usize,
}

/// One part record, derived from the
/// `PRODUCT_DEFINITION -> PRODUCT_DEFINITION_FORMATION -> PRODUCT`
/// chain. Broken links along the chain leave the downstream fields
/// unset rather than dropping the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartInfo {
    /// Entity id of the PRODUCT_DEFINITION.
    pub definition_id: u32,
    /// PRODUCT_DEFINITION.id (first argument).
    pub definition_identifier: Option<String>,
    /// PRODUCT_DEFINITION.description.
    pub definition_description: Option<String>,
    /// Entity id of the resolved PRODUCT, when the chain is intact.
    pub product_id: Option<u32>,
    /// PRODUCT.id; in practice the part number on most exporters.
    pub part_number: Option<String>,
    /// PRODUCT.name.
    pub name: Option<String>,
    /// PRODUCT.description.
    pub description: Option<String>,
}

/// A parent→child assembly edge between two PRODUCT_DEFINITION ids.
///
/// Endpoints may reference definitions that never appear in the file;
/// resolution is deferred to tree building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyRelation {
    /// Entity id of the relation statement itself.
    pub relation_id: u32,
    /// Uppercased relation entity type.
    pub relation_type: String,
    /// Parent PRODUCT_DEFINITION id.
    pub parent_definition: u32,
    /// Child PRODUCT_DEFINITION id.
    pub child_definition: u32,
    /// Reference designator of this occurrence, when present.
    pub reference_designator: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A node of the inferred assembly tree. Children are owned by value;
/// the structure is a tree, not a general graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyNode {
    /// PRODUCT_DEFINITION id of this occurrence.
    pub definition_id: u32,
    /// Reference designator on the edge from the parent.
    pub reference_designator: Option<String>,
    /// Part record for this definition, when resolvable.
    pub part: Option<PartInfo>,
    pub children: Vec<AssemblyNode>,
}

/// Assembly tree with the budgets it was built under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyTree {
    pub roots: Vec<AssemblyNode>,
    /// True when depth or node budgets clipped the expansion.
    pub truncated: bool,
    /// The depth budget the tree was built with.
    pub max_depth: usize,
    /// The node budget the tree was built with.
    pub max_nodes: usize,
}

/// Axis-aligned bounding box accumulated from CARTESIAN_POINT
/// entities. A coordinate-range heuristic, not a geometric bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub min_z: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub max_z: f64,
    /// Number of points that contributed.
    pub point_count: u64,
}

/// A numeric measure extracted from MEASURE_REPRESENTATION_ITEM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureItem {
    pub entity_id: u32,
    pub name: Option<String>,
    /// The typed-value name, e.g. `LENGTH_MEASURE`.
    pub measure_type: String,
    pub value: Option<f64>,
    /// Entity id of the unit reference, when present.
    pub unit_ref: Option<u32>,
}

/// A raw entity statement returned by the lister or kept as a PMI
/// example. `text` is the normalized statement (escapes decoded,
/// quotes re-escaped).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnippet {
    pub entity_id: u32,
    /// Uppercased entity type name.
    pub type_name: String,
    pub text: String,
}

/// Geometry signals: matching type counts, B-Rep/tessellation
/// detection, and the point-cloud bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometrySummary {
    pub bounding_box: Option<BoundingBox>,
    /// Any precise (B-Rep / surface / B-spline) marker type was seen.
    pub precise_geometry_detected: bool,
    /// Any tessellated/faceted marker type was seen.
    pub tessellated_geometry_detected: bool,
    pub type_counts: Vec<TypeCount>,
}

/// Topology signals: vertex/edge/face/shell/B-Rep type counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySummary {
    pub type_counts: Vec<TypeCount>,
}

/// PMI signals: dimension/tolerance/datum/annotation type counts,
/// extracted measures, and example snippets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PmiSummary {
    pub type_counts: Vec<TypeCount>,
    pub measures: Vec<MeasureItem>,
    pub snippets: Vec<EntitySnippet>,
}

/// Full DATA-section analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Number of entity statements scanned.
    pub entities_parsed: usize,
    /// True when the scan stopped at `max_entities`.
    pub entities_truncated: bool,
    /// Type histogram, count descending then name ascending, capped at
    /// `max_top_entity_types`.
    pub top_entity_types: Vec<TypeCount>,
    pub parts: Vec<PartInfo>,
    pub assembly_relations: Vec<AssemblyRelation>,
    /// Present when at least one assembly relation was found.
    pub assembly_tree: Option<AssemblyTree>,
    pub geometry: Option<GeometrySummary>,
    pub topology: Option<TopologySummary>,
    pub pmi: Option<PmiSummary>,
    /// Human-readable notes about truncation, cycles, and missing
    /// structure. Surface these to users verbatim.
    pub warnings: Vec<String>,
}

/// One page of raw entity statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityPage {
    /// Number of entity statements scanned (matching or not).
    pub scanned_entities: usize,
    /// True when the scan stopped at `max_entities`.
    pub entities_truncated: bool,
    pub offset: usize,
    pub limit: usize,
    /// True when the page filled up; pass `next_offset` to continue.
    pub has_more: bool,
    pub next_offset: Option<usize>,
    pub entities: Vec<EntitySnippet>,
    pub warnings: Vec<String>,
}

/// HEADER-section metadata plus sampled product names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// FILE_DESCRIPTION.description entries.
    pub file_descriptions: Vec<String>,
    /// FILE_DESCRIPTION.implementation_level.
    pub implementation_level: Option<String>,
    /// FILE_NAME.name.
    pub file_name: Option<String>,
    /// FILE_NAME.time_stamp.
    pub time_stamp: Option<String>,
    pub authors: Vec<String>,
    pub organizations: Vec<String>,
    pub preprocessor_version: Option<String>,
    pub originating_system: Option<String>,
    pub authorization: Option<String>,
    /// FILE_SCHEMA schema identifiers.
    pub schemas: Vec<String>,
    /// Distinct PRODUCT names sampled from the DATA section.
    pub product_names: Vec<String>,
    pub warnings: Vec<String>,
}
