// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry / topology / PMI classification and summary assembly.
//!
//! Classification is name-based. Different STEP application protocols
//! (AP203/AP214/AP242) and different exporters emit very different
//! entity vocabularies, so a fixed allowlist plus a few substring
//! families catches far more real files than any exact schema check.

use crate::types::{
    BoundingBox, EntitySnippet, GeometrySummary, MeasureItem, PmiSummary, TopologySummary,
    TypeCount,
};
use rustc_hash::FxHashMap;
use std::cmp::Reverse;

/// Cap on the per-summary type lists, independent of the caller's
/// histogram budget.
const SUMMARY_TYPE_LIMIT: usize = 200;

/// Curve/surface/point geometry entity types.
pub(crate) fn is_geometry_type(type_upper: &str) -> bool {
    match type_upper {
        "CARTESIAN_POINT"
        | "DIRECTION"
        | "VECTOR"
        | "AXIS2_PLACEMENT_3D"
        | "AXIS2_PLACEMENT_2D"
        | "LINE"
        | "CIRCLE"
        | "ELLIPSE"
        | "PLANE"
        | "CYLINDRICAL_SURFACE"
        | "CONICAL_SURFACE"
        | "SPHERICAL_SURFACE"
        | "TOROIDAL_SURFACE"
        | "B_SPLINE_CURVE_WITH_KNOTS"
        | "B_SPLINE_SURFACE_WITH_KNOTS"
        | "RATIONAL_B_SPLINE_CURVE"
        | "RATIONAL_B_SPLINE_SURFACE"
        | "TRIMMED_CURVE"
        | "SURFACE_OF_REVOLUTION"
        | "SURFACE_OF_LINEAR_EXTRUSION" => true,
        _ => type_upper.contains("B_SPLINE") || type_upper.contains("NURBS"),
    }
}

/// Vertex/edge/face/shell/B-Rep topology entity types.
pub(crate) fn is_topology_type(type_upper: &str) -> bool {
    match type_upper {
        "VERTEX_POINT"
        | "EDGE_CURVE"
        | "ORIENTED_EDGE"
        | "EDGE_LOOP"
        | "FACE_OUTER_BOUND"
        | "ADVANCED_FACE"
        | "CLOSED_SHELL"
        | "OPEN_SHELL"
        | "MANIFOLD_SOLID_BREP"
        | "BREP_WITH_VOIDS"
        | "SHELL_BASED_SURFACE_MODEL" => true,
        _ => {
            type_upper.ends_with("_BREP")
                || type_upper.contains("SHELL")
                || type_upper.contains("FACE")
                || type_upper.contains("EDGE")
        }
    }
}

/// Dimension/tolerance/datum/annotation families used for PMI
/// counting and snippet sampling.
pub(crate) fn is_pmi_type(type_upper: &str) -> bool {
    type_upper.contains("DIMENSION")
        || type_upper.contains("TOLERANCE")
        || type_upper.contains("DATUM")
        || type_upper.contains("ANNOTATION")
        || type_upper.contains("DRAUGHTING")
        || type_upper.contains("CALLOUT")
        || type_upper.contains("TEXT_LITERAL")
}

/// Marker for precise (B-Rep / analytic surface / B-spline) geometry.
pub(crate) fn is_precise_geometry_marker(type_upper: &str) -> bool {
    type_upper == "ADVANCED_BREP_SHAPE_REPRESENTATION"
        || type_upper == "MANIFOLD_SOLID_BREP"
        || type_upper.contains("B_SPLINE")
        || type_upper.contains("SURFACE")
        || type_upper.contains("BREP")
}

/// Marker for tessellated/faceted geometry.
pub(crate) fn is_tessellated_geometry_marker(type_upper: &str) -> bool {
    type_upper.contains("TESSELLATED")
        || type_upper.contains("TRIANGULATED")
        || type_upper.contains("POLYLINE")
        || type_upper.contains("FACETED")
}

/// Rank a histogram: count descending, then type name ascending, cut
/// to `max` entries. The tie-break keeps output deterministic.
pub(crate) fn top_counts(counts: &FxHashMap<String, usize>, max: usize) -> Vec<TypeCount> {
    if counts.is_empty() || max == 0 {
        return Vec::new();
    }
    let mut entries: Vec<(&String, usize)> = counts.iter().map(|(k, &v)| (k, v)).collect();
    entries.sort_unstable_by_key(|&(name, count)| (Reverse(count), name.clone()));
    entries.truncate(max);
    entries
        .into_iter()
        .map(|(name, count)| TypeCount {
            type_name: name.clone(),
            count,
        })
        .collect()
}

pub(crate) fn build_geometry_summary(
    type_counts: &FxHashMap<String, usize>,
    bounding_box: Option<BoundingBox>,
) -> Option<GeometrySummary> {
    let mut precise = false;
    let mut tessellated = false;
    let mut selected: FxHashMap<String, usize> = FxHashMap::default();
    for (type_name, &count) in type_counts {
        if is_geometry_type(type_name) {
            selected.insert(type_name.clone(), count);
        }
        if !precise && is_precise_geometry_marker(type_name) {
            precise = true;
        }
        if !tessellated && is_tessellated_geometry_marker(type_name) {
            tessellated = true;
        }
    }

    if selected.is_empty() && bounding_box.is_none() && !precise && !tessellated {
        return None;
    }
    Some(GeometrySummary {
        bounding_box,
        precise_geometry_detected: precise,
        tessellated_geometry_detected: tessellated,
        type_counts: top_counts(&selected, SUMMARY_TYPE_LIMIT),
    })
}

pub(crate) fn build_topology_summary(
    type_counts: &FxHashMap<String, usize>,
) -> Option<TopologySummary> {
    let selected: FxHashMap<String, usize> = type_counts
        .iter()
        .filter(|(type_name, _)| is_topology_type(type_name))
        .map(|(type_name, &count)| (type_name.clone(), count))
        .collect();
    if selected.is_empty() {
        return None;
    }
    Some(TopologySummary {
        type_counts: top_counts(&selected, SUMMARY_TYPE_LIMIT),
    })
}

pub(crate) fn build_pmi_summary(
    type_counts: &FxHashMap<String, usize>,
    measures: Vec<MeasureItem>,
    snippets: Vec<EntitySnippet>,
) -> Option<PmiSummary> {
    let selected: FxHashMap<String, usize> = type_counts
        .iter()
        .filter(|(type_name, _)| is_pmi_type(type_name))
        .map(|(type_name, &count)| (type_name.clone(), count))
        .collect();
    if selected.is_empty() && measures.is_empty() && snippets.is_empty() {
        return None;
    }
    Some(PmiSummary {
        type_counts: top_counts(&selected, SUMMARY_TYPE_LIMIT),
        measures,
        snippets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn histogram(entries: &[(&str, usize)]) -> FxHashMap<String, usize> {
        entries
            .iter()
            .map(|&(name, count)| (name.to_string(), count))
            .collect()
    }

    #[test]
    fn test_classification() {
        assert!(is_geometry_type("CARTESIAN_POINT"));
        assert!(is_geometry_type("QUASI_UNIFORM_B_SPLINE_SURFACE"));
        assert!(!is_geometry_type("PRODUCT"));

        assert!(is_topology_type("ADVANCED_FACE"));
        assert!(is_topology_type("FACETED_BREP"));
        assert!(is_topology_type("VERTEX_LOOP_EDGE_THING"));
        assert!(!is_topology_type("DIRECTION"));

        assert!(is_pmi_type("DIMENSIONAL_CHARACTERISTIC_REPRESENTATION"));
        assert!(is_pmi_type("GEOMETRIC_TOLERANCE"));
        assert!(is_pmi_type("DRAUGHTING_PRE_DEFINED_COLOUR"));
        assert!(is_pmi_type("TEXT_LITERAL"));
        assert!(!is_pmi_type("CLOSED_SHELL"));

        assert!(is_precise_geometry_marker("MANIFOLD_SOLID_BREP"));
        assert!(is_tessellated_geometry_marker("TRIANGULATED_FACE"));
    }

    #[test]
    fn test_top_counts_ordering() {
        let counts = histogram(&[("B", 5), ("A", 5), ("C", 9)]);
        let top = top_counts(&counts, 10);
        let names: Vec<&str> = top.iter().map(|t| t.type_name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);

        let top = top_counts(&counts, 2);
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn test_geometry_summary_none_without_data() {
        assert!(build_geometry_summary(&histogram(&[("PRODUCT", 3)]), None).is_none());
    }

    #[test]
    fn test_geometry_summary_flags() {
        let counts = histogram(&[("MANIFOLD_SOLID_BREP", 1), ("CARTESIAN_POINT", 10)]);
        let summary = build_geometry_summary(&counts, None).unwrap();
        assert!(summary.precise_geometry_detected);
        assert!(!summary.tessellated_geometry_detected);
        assert_eq!(summary.type_counts.len(), 1); // the BREP is topology, not geometry
        assert_eq!(summary.type_counts[0].type_name, "CARTESIAN_POINT");
    }

    #[test]
    fn test_topology_summary() {
        assert!(build_topology_summary(&histogram(&[("DIRECTION", 2)])).is_none());
        let summary = build_topology_summary(&histogram(&[("EDGE_CURVE", 4)])).unwrap();
        assert_eq!(summary.type_counts[0].count, 4);
    }

    #[test]
    fn test_pmi_summary_from_measures_only() {
        let measures = vec![MeasureItem {
            entity_id: 1,
            name: None,
            measure_type: "LENGTH_MEASURE".into(),
            value: Some(10.5),
            unit_ref: None,
        }];
        let summary = build_pmi_summary(&FxHashMap::default(), measures, Vec::new()).unwrap();
        assert!(summary.type_counts.is_empty());
        assert_eq!(summary.measures.len(), 1);

        assert!(build_pmi_summary(&FxHashMap::default(), Vec::new(), Vec::new()).is_none());
    }
}
