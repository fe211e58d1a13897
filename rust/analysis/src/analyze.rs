// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Single-pass DATA-section analysis.
//!
//! One scan over the entity stream feeds every extraction at once:
//! the type histogram, the PRODUCT chain tables, assembly edges,
//! measures, PMI snippets, and the bounding-box accumulator. The
//! joins and tree building run afterwards on the collected tables.
//!
//! The pass is pure and owns all of its state, so concurrent calls on
//! different inputs are safe without any locking.

use crate::assembly::{build_tree, extract_relation};
use crate::bounds::BoundsAccumulator;
use crate::limits::Limits;
use crate::parts::{
    blank_to_none, build_parts, extract_definition, extract_formation, extract_product,
    Definition, Formation, Product,
};
use crate::summary::{
    build_geometry_summary, build_pmi_summary, build_topology_summary, is_pmi_type, top_counts,
};
use crate::types::{Analysis, AssemblyRelation, EntitySnippet, MeasureItem};
use crate::FxIndexMap;
use rustc_hash::FxHashMap;
use step_lite_core::{
    find_data_section, normalize_entity_text, parse_args, ref_arg, string_arg, EntityScanner,
    StepValue,
};
use tracing::{debug, warn};

/// Analyze the DATA section of decoded STEP text.
///
/// Never fails: missing structure, malformed statements, and budget
/// exhaustion all degrade to partial results plus `warnings`.
pub fn analyze(step_text: &str, limits: &Limits) -> Analysis {
    let mut warnings = Vec::new();

    if step_text.trim().is_empty() {
        warnings.push("STEP content is empty; no DATA section to scan".to_string());
        return empty_analysis(warnings);
    }
    let Some(data_start) = find_data_section(step_text) else {
        warnings.push(
            "no DATA section found; assembly/geometry/PMI information is unavailable".to_string(),
        );
        return empty_analysis(warnings);
    };

    let mut type_counts: FxHashMap<String, usize> = FxHashMap::default();
    let mut products: FxIndexMap<u32, Product> = FxIndexMap::default();
    let mut formations: FxIndexMap<u32, Formation> = FxIndexMap::default();
    let mut definitions: FxIndexMap<u32, Definition> = FxIndexMap::default();
    let mut relations: Vec<AssemblyRelation> = Vec::new();
    let mut measures: Vec<MeasureItem> = Vec::new();
    let mut snippets: Vec<EntitySnippet> = Vec::new();
    let mut bounds = BoundsAccumulator::new();

    let mut scanner = EntityScanner::starting_at(step_text, data_start);
    let mut parsed: usize = 0;
    let mut truncated = false;

    while let Some(entity) = scanner.next_entity() {
        // Hard stop: the budget counts scanned statements, and the one
        // that would exceed it is not processed.
        if parsed >= limits.max_entities {
            truncated = true;
            warn!(max_entities = limits.max_entities, "entity scan truncated");
            warnings.push(format!(
                "entity scan truncated at max_entities={}",
                limits.max_entities
            ));
            break;
        }
        parsed += 1;

        let type_upper = entity.type_name.to_ascii_uppercase();
        *type_counts.entry(type_upper.clone()).or_insert(0) += 1;

        if type_upper == "CARTESIAN_POINT" {
            feed_cartesian_point(entity.args_text, &mut bounds);
        }

        match type_upper.as_str() {
            "PRODUCT" => {
                products.insert(entity.id, extract_product(entity.args_text));
            }
            "PRODUCT_DEFINITION_FORMATION"
            | "PRODUCT_DEFINITION_FORMATION_WITH_SPECIFIED_SOURCE" => {
                formations.insert(entity.id, extract_formation(entity.args_text));
            }
            "PRODUCT_DEFINITION" => {
                definitions.insert(entity.id, extract_definition(entity.args_text));
            }
            "NEXT_ASSEMBLY_USAGE_OCCURRENCE"
            | "ASSEMBLY_COMPONENT_USAGE"
            | "PRODUCT_DEFINITION_RELATIONSHIP" => {
                if let Some(relation) = extract_relation(entity.id, &type_upper, entity.args_text)
                {
                    relations.push(relation);
                }
            }
            "MEASURE_REPRESENTATION_ITEM" => {
                if measures.len() < limits.max_measures {
                    if let Some(measure) = extract_measure(entity.id, entity.args_text) {
                        measures.push(measure);
                    }
                }
            }
            _ => {}
        }

        // PMI entities can number in the thousands; keep a bounded set
        // of examples only.
        if snippets.len() < limits.max_pmi_snippets && is_pmi_type(&type_upper) {
            snippets.push(EntitySnippet {
                entity_id: entity.id,
                type_name: type_upper,
                text: normalize_entity_text(entity.raw_text).into_owned(),
            });
        }
    }

    debug!(
        entities = parsed,
        truncated = truncated,
        products = products.len(),
        definitions = definitions.len(),
        relations = relations.len(),
        "DATA section scan complete"
    );

    let parts = build_parts(&definitions, &formations, &products, limits, &mut warnings);
    let assembly_tree = build_tree(&parts, &relations, limits, &mut warnings);
    let bounding_box = bounds.into_bounding_box();

    let top_entity_types = top_counts(&type_counts, limits.max_top_entity_types);
    let geometry = build_geometry_summary(&type_counts, bounding_box);
    let topology = build_topology_summary(&type_counts);
    let pmi = build_pmi_summary(&type_counts, measures, snippets);

    Analysis {
        entities_parsed: parsed,
        entities_truncated: truncated,
        top_entity_types,
        parts,
        assembly_relations: relations,
        assembly_tree,
        geometry,
        topology,
        pmi,
        warnings,
    }
}

fn empty_analysis(warnings: Vec<String>) -> Analysis {
    Analysis {
        entities_parsed: 0,
        entities_truncated: false,
        top_entity_types: Vec::new(),
        parts: Vec::new(),
        assembly_relations: Vec::new(),
        assembly_tree: None,
        geometry: None,
        topology: None,
        pmi: None,
        warnings,
    }
}

/// `CARTESIAN_POINT('name',(x,y,z))`: feed the coordinate triple to
/// the bounds accumulator. Points with fewer than three numeric
/// coordinates are skipped silently.
fn feed_cartesian_point(args_text: &str, bounds: &mut BoundsAccumulator) {
    let args = parse_args(args_text);
    let Some(StepValue::List(items)) = args.get(1) else {
        return;
    };
    if items.len() < 3 {
        return;
    }
    let (Some(x), Some(y), Some(z)) = (
        items[0].as_f64(),
        items[1].as_f64(),
        items[2].as_f64(),
    ) else {
        return;
    };
    bounds.expand(x, y, z);
}

/// `MEASURE_REPRESENTATION_ITEM('name', LENGTH_MEASURE(10.5), #unit)`
fn extract_measure(entity_id: u32, args_text: &str) -> Option<MeasureItem> {
    let args = parse_args(args_text);
    let StepValue::Typed { name: measure_type, args: inner } = args.get(1)? else {
        return None;
    };
    let value = inner.first().and_then(StepValue::as_f64);
    Some(MeasureItem {
        entity_id,
        name: blank_to_none(string_arg(&args, 0)),
        measure_type: measure_type.clone(),
        value,
        unit_ref: ref_arg(&args, 2),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap_data(body: &str) -> String {
        format!("ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\n{body}\nENDSEC;\nEND-ISO-10303-21;\n")
    }

    #[test]
    fn test_empty_input() {
        let analysis = analyze("", &Limits::default());
        assert_eq!(analysis.entities_parsed, 0);
        assert!(!analysis.entities_truncated);
        assert!(analysis.geometry.is_none());
        assert_eq!(analysis.warnings.len(), 1);
    }

    #[test]
    fn test_missing_data_section() {
        let analysis = analyze("ISO-10303-21;\nHEADER;\nENDSEC;\n", &Limits::default());
        assert_eq!(analysis.entities_parsed, 0);
        assert!(analysis.warnings[0].contains("DATA"));
    }

    #[test]
    fn test_histogram_and_counts() {
        let text = wrap_data("#1=ADVANCED_FACE();\n#2=ADVANCED_FACE();\n#3=EDGE_CURVE();");
        let analysis = analyze(&text, &Limits::default());
        assert_eq!(analysis.entities_parsed, 3);
        assert_eq!(analysis.top_entity_types[0].type_name, "ADVANCED_FACE");
        assert_eq!(analysis.top_entity_types[0].count, 2);
    }

    #[test]
    fn test_entity_budget_is_exact() {
        let body: String = (1..=10).map(|i| format!("#{i}=A();\n")).collect();
        let text = wrap_data(&body);

        let limits = Limits {
            max_entities: 4,
            ..Limits::default()
        };
        let analysis = analyze(&text, &limits);
        assert!(analysis.entities_truncated);
        assert_eq!(analysis.entities_parsed, 4);
        assert!(analysis
            .warnings
            .iter()
            .any(|w| w.contains("max_entities=4")));

        // an exact fit is not a truncation
        let limits = Limits {
            max_entities: 10,
            ..Limits::default()
        };
        let analysis = analyze(&text, &limits);
        assert!(!analysis.entities_truncated);
        assert_eq!(analysis.entities_parsed, 10);
    }

    #[test]
    fn test_bounding_box() {
        let text = wrap_data(
            "#1=CARTESIAN_POINT('',(1.,2.,3.));\n\
             #2=CARTESIAN_POINT('',(-1.,5.,0.));\n\
             #3=CARTESIAN_POINT('',(7.));",
        );
        let analysis = analyze(&text, &Limits::default());
        let bbox = analysis.geometry.unwrap().bounding_box.unwrap();
        // the 1-coordinate point is skipped
        assert_eq!(bbox.point_count, 2);
        assert_eq!(bbox.min_x, -1.0);
        assert_eq!(bbox.max_y, 5.0);
        assert_eq!(bbox.max_z, 3.0);
    }

    #[test]
    fn test_measure_extraction() {
        let text = wrap_data("#1=MEASURE_REPRESENTATION_ITEM('D',LENGTH_MEASURE(10.5),#300);");
        let analysis = analyze(&text, &Limits::default());
        let pmi = analysis.pmi.unwrap();
        assert_eq!(pmi.measures.len(), 1);
        let measure = &pmi.measures[0];
        assert_eq!(measure.measure_type, "LENGTH_MEASURE");
        assert_eq!(measure.value, Some(10.5));
        assert_eq!(measure.unit_ref, Some(300));
        assert_eq!(measure.name.as_deref(), Some("D"));
    }

    #[test]
    fn test_measure_budget() {
        let body: String = (1..=5)
            .map(|i| format!("#{i}=MEASURE_REPRESENTATION_ITEM('',LENGTH_MEASURE(1.),$);\n"))
            .collect();
        let limits = Limits {
            max_measures: 2,
            ..Limits::default()
        };
        let analysis = analyze(&wrap_data(&body), &limits);
        assert_eq!(analysis.pmi.unwrap().measures.len(), 2);
    }

    #[test]
    fn test_pmi_snippets_are_normalized() {
        let text = wrap_data(
            "#1=ANNOTATION_OCCURRENCE('\\X2\\4E2D6587\\X0\\');\n#2=PLANE();",
        );
        let limits = Limits {
            max_pmi_snippets: 10,
            ..Limits::default()
        };
        let analysis = analyze(&text, &limits);
        let pmi = analysis.pmi.unwrap();
        assert_eq!(pmi.snippets.len(), 1);
        assert!(pmi.snippets[0].text.contains("中文"));
    }

    #[test]
    fn test_bom_join_end_to_end() {
        let text = wrap_data(
            "#1=PRODUCT('P-ASM','\\X2\\88C5914D\\X0\\','top level',(#9));\n\
             #2=PRODUCT_DEFINITION_FORMATION('A','',#1);\n\
             #3=PRODUCT_DEFINITION('design','',#2,#8);",
        );
        let analysis = analyze(&text, &Limits::default());
        assert_eq!(analysis.parts.len(), 1);
        let part = &analysis.parts[0];
        assert_eq!(part.definition_id, 3);
        assert_eq!(part.part_number.as_deref(), Some("P-ASM"));
        assert_eq!(part.name.as_deref(), Some("装配"));
        assert_eq!(part.description.as_deref(), Some("top level"));
    }

    #[test]
    fn test_assembly_relations_and_tree() {
        let text = wrap_data(
            "#10=PRODUCT_DEFINITION('a','',$,$);\n\
             #20=PRODUCT_DEFINITION('b','',$,$);\n\
             #50=NEXT_ASSEMBLY_USAGE_OCCURRENCE('A1','','',#10,#20,'POS-1');",
        );
        let analysis = analyze(&text, &Limits::default());
        assert_eq!(analysis.assembly_relations.len(), 1);
        let tree = analysis.assembly_tree.unwrap();
        assert_eq!(tree.roots.len(), 1);
        assert_eq!(tree.roots[0].definition_id, 10);
        assert_eq!(
            tree.roots[0].children[0].reference_designator.as_deref(),
            Some("POS-1")
        );
    }

    #[test]
    fn test_duplicate_ids_last_write_wins() {
        let text = wrap_data(
            "#1=PRODUCT('FIRST','first','',(#9));\n\
             #1=PRODUCT('SECOND','second','',(#9));\n\
             #2=PRODUCT_DEFINITION_FORMATION('A','',#1);\n\
             #3=PRODUCT_DEFINITION('design','',#2,$);",
        );
        let analysis = analyze(&text, &Limits::default());
        assert_eq!(analysis.parts[0].part_number.as_deref(), Some("SECOND"));
    }

    #[test]
    fn test_no_throw_on_garbage() {
        let inputs = [
            "DATA;",
            "DATA; #",
            "DATA; ###'''((((",
            "DATA;#1=X('unterminated",
            "data;#1=CARTESIAN_POINT('',(nonsense,1.,2.));ENDSEC;",
            "\u{0}\u{1}\u{2}DATA;#1=A(\u{fffd});",
        ];
        for input in inputs {
            let _ = analyze(input, &Limits::default());
        }
    }
}
