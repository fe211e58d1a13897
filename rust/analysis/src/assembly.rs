// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Assembly relation extraction and tree building.
//!
//! `NEXT_ASSEMBLY_USAGE_OCCURRENCE` / `ASSEMBLY_COMPONENT_USAGE` are
//! the standard parent-child occurrence relations; the generic
//! `PRODUCT_DEFINITION_RELATIONSHIP` is kept as a fallback for files
//! that carry structure only through it. Tree expansion is bounded by
//! a depth budget, a global node budget, and a per-path cycle guard;
//! exported assemblies do occasionally contain reference cycles, and
//! a single parent fanning out to thousands of children is routine.

use crate::limits::Limits;
use crate::types::{AssemblyNode, AssemblyRelation, AssemblyTree, PartInfo};
use crate::FxIndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use step_lite_core::{parse_args, ref_arg, string_arg};

use crate::parts::blank_to_none;

const NAUO: &str = "NEXT_ASSEMBLY_USAGE_OCCURRENCE";
const ACU: &str = "ASSEMBLY_COMPONENT_USAGE";
const PDR: &str = "PRODUCT_DEFINITION_RELATIONSHIP";

/// Extract a parent→child edge from a relation statement. Returns
/// `None` when either endpoint reference is missing; the entity still
/// counts in the histogram, only the edge is skipped.
pub(crate) fn extract_relation(
    entity_id: u32,
    type_upper: &str,
    args_text: &str,
) -> Option<AssemblyRelation> {
    match type_upper {
        NAUO | ACU => {
            // ( id, name, description, relating, related, reference_designator )
            let args = parse_args(args_text);
            let parent = ref_arg(&args, 3)?;
            let child = ref_arg(&args, 4)?;
            Some(AssemblyRelation {
                relation_id: entity_id,
                relation_type: type_upper.to_string(),
                parent_definition: parent,
                child_definition: child,
                reference_designator: blank_to_none(string_arg(&args, 5)),
                name: blank_to_none(string_arg(&args, 1)),
                description: blank_to_none(string_arg(&args, 2)),
            })
        }
        PDR => {
            // ( id, name, description, relating, related ), no designator
            let args = parse_args(args_text);
            let parent = ref_arg(&args, 3)?;
            let child = ref_arg(&args, 4)?;
            Some(AssemblyRelation {
                relation_id: entity_id,
                relation_type: type_upper.to_string(),
                parent_definition: parent,
                child_definition: child,
                reference_designator: None,
                name: blank_to_none(string_arg(&args, 1)),
                description: blank_to_none(string_arg(&args, 2)),
            })
        }
        _ => None,
    }
}

struct Edge {
    child: u32,
    reference_designator: Option<String>,
}

struct NodeBudget {
    max_nodes: usize,
    used: usize,
    truncated: bool,
}

impl NodeBudget {
    fn new(max_nodes: usize) -> Self {
        Self {
            max_nodes: max_nodes.max(1),
            used: 0,
            truncated: false,
        }
    }

    fn try_consume(&mut self) -> bool {
        self.used += 1;
        self.used <= self.max_nodes
    }
}

/// Infer roots and expand the relation edges into a tree.
///
/// Returns `None` when there are no relations at all. When every
/// parent also appears as a child (a pure cycle), all parents become
/// roots, a best-effort degenerate case that can duplicate subtrees,
/// kept deliberately so that cyclic files still show their structure.
pub(crate) fn build_tree(
    parts: &[PartInfo],
    relations: &[AssemblyRelation],
    limits: &Limits,
    warnings: &mut Vec<String>,
) -> Option<AssemblyTree> {
    if relations.is_empty() {
        return None;
    }

    // Prefer the standard occurrence relations; fall back to all
    // relations (including the generic PDR) when none exist.
    let primary: Vec<&AssemblyRelation> = relations
        .iter()
        .filter(|r| r.relation_type == NAUO || r.relation_type == ACU)
        .collect();
    let effective: Vec<&AssemblyRelation> = if primary.is_empty() {
        relations.iter().collect()
    } else {
        primary
    };

    let mut part_by_definition: FxHashMap<u32, &PartInfo> =
        FxHashMap::with_capacity_and_hasher(parts.len(), Default::default());
    for part in parts {
        part_by_definition.insert(part.definition_id, part);
    }

    let mut children_by_parent: FxIndexMap<u32, Vec<Edge>> = FxIndexMap::default();
    let mut child_ids: FxHashSet<u32> = FxHashSet::default();
    for relation in &effective {
        children_by_parent
            .entry(relation.parent_definition)
            .or_default()
            .push(Edge {
                child: relation.child_definition,
                reference_designator: relation.reference_designator.clone(),
            });
        child_ids.insert(relation.child_definition);
    }

    // Roots are parents that never appear as a child; if none exist,
    // every parent becomes a root.
    let mut roots: Vec<u32> = children_by_parent
        .keys()
        .copied()
        .filter(|parent| !child_ids.contains(parent))
        .collect();
    if roots.is_empty() {
        roots = children_by_parent.keys().copied().collect();
    }

    let mut budget = NodeBudget::new(limits.max_assembly_nodes);
    let mut root_nodes = Vec::with_capacity(roots.len().min(64));
    for root in roots {
        let mut path = FxHashSet::default();
        if let Some(node) = build_node(
            root,
            None,
            &children_by_parent,
            &part_by_definition,
            0,
            limits,
            &mut budget,
            &mut path,
            warnings,
        ) {
            root_nodes.push(node);
        }
        if budget.truncated {
            break;
        }
    }

    if budget.truncated {
        warnings.push(format!(
            "assembly tree truncated at max_assembly_nodes={}",
            limits.max_assembly_nodes
        ));
    }

    Some(AssemblyTree {
        roots: root_nodes,
        truncated: budget.truncated,
        max_depth: limits.max_assembly_depth,
        max_nodes: limits.max_assembly_nodes,
    })
}

#[allow(clippy::too_many_arguments)]
fn build_node(
    definition_id: u32,
    reference_designator: Option<String>,
    children_by_parent: &FxIndexMap<u32, Vec<Edge>>,
    part_by_definition: &FxHashMap<u32, &PartInfo>,
    depth: usize,
    limits: &Limits,
    budget: &mut NodeBudget,
    path: &mut FxHashSet<u32>,
    warnings: &mut Vec<String>,
) -> Option<AssemblyNode> {
    if budget.truncated {
        return None;
    }

    let leaf = |reference_designator: Option<String>| AssemblyNode {
        definition_id,
        reference_designator,
        part: part_by_definition.get(&definition_id).map(|p| (*p).clone()),
        children: Vec::new(),
    };

    // Depth budget: anything deeper becomes a truncated leaf.
    if depth > limits.max_assembly_depth {
        budget.truncated = true;
        return Some(leaf(reference_designator));
    }

    // Cycle guard: a definition revisited on its own ancestry path
    // stops expanding and stays a leaf.
    if !path.insert(definition_id) {
        warnings.push(format!(
            "assembly relation cycle detected at PRODUCT_DEFINITION #{definition_id}; branch not expanded"
        ));
        return Some(leaf(reference_designator));
    }

    // Global node budget across the whole tree, not per branch.
    if !budget.try_consume() {
        budget.truncated = true;
        path.remove(&definition_id);
        return Some(leaf(reference_designator));
    }

    let Some(edges) = children_by_parent.get(&definition_id) else {
        path.remove(&definition_id);
        return Some(leaf(reference_designator));
    };

    let mut children = Vec::with_capacity(edges.len().min(64));
    for edge in edges {
        if let Some(child) = build_node(
            edge.child,
            edge.reference_designator.clone(),
            children_by_parent,
            part_by_definition,
            depth + 1,
            limits,
            budget,
            path,
            warnings,
        ) {
            children.push(child);
        }
        if budget.truncated {
            break;
        }
    }

    path.remove(&definition_id);
    Some(AssemblyNode {
        definition_id,
        reference_designator,
        part: part_by_definition.get(&definition_id).map(|p| (*p).clone()),
        children,
    })
}
