// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parts/BOM extraction from the PRODUCT chain.
//!
//! STEP models a part as a three-entity chain:
//!
//! ```text
//! PRODUCT_DEFINITION( id, description, formation, frame_of_reference )
//! PRODUCT_DEFINITION_FORMATION( id, description, of_product )
//! PRODUCT( id, name, description, frame_of_reference_list )
//! ```
//!
//! Most exporters put the part number in `PRODUCT.id` and the display
//! name in `PRODUCT.name`, so those map to `part_number` and `name`.
//! A broken link anywhere along the chain leaves the downstream
//! fields unset; the PRODUCT_DEFINITION still yields a record.

use crate::limits::Limits;
use crate::types::PartInfo;
use crate::FxIndexMap;
use step_lite_core::{parse_args, ref_arg, string_arg};

/// Fields of a PRODUCT statement (the entity id is the table key).
#[derive(Debug, Clone)]
pub(crate) struct Product {
    pub identifier: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Fields of a PRODUCT_DEFINITION_FORMATION statement.
#[derive(Debug, Clone)]
pub(crate) struct Formation {
    pub product_ref: Option<u32>,
}

/// Fields of a PRODUCT_DEFINITION statement.
#[derive(Debug, Clone)]
pub(crate) struct Definition {
    pub identifier: Option<String>,
    pub description: Option<String>,
    pub formation_ref: Option<u32>,
}

pub(crate) fn extract_product(args_text: &str) -> Product {
    let args = parse_args(args_text);
    Product {
        identifier: blank_to_none(string_arg(&args, 0)),
        name: blank_to_none(string_arg(&args, 1)),
        description: blank_to_none(string_arg(&args, 2)),
    }
}

pub(crate) fn extract_formation(args_text: &str) -> Formation {
    let args = parse_args(args_text);
    Formation {
        product_ref: ref_arg(&args, 2),
    }
}

pub(crate) fn extract_definition(args_text: &str) -> Definition {
    let args = parse_args(args_text);
    Definition {
        identifier: blank_to_none(string_arg(&args, 0)),
        description: blank_to_none(string_arg(&args, 1)),
        formation_ref: ref_arg(&args, 2),
    }
}

/// Join every PRODUCT_DEFINITION through its formation to a PRODUCT.
/// Iteration follows discovery order; output is capped at
/// `max_parts` with a warning when definitions remain.
pub(crate) fn build_parts(
    definitions: &FxIndexMap<u32, Definition>,
    formations: &FxIndexMap<u32, Formation>,
    products: &FxIndexMap<u32, Product>,
    limits: &Limits,
    warnings: &mut Vec<String>,
) -> Vec<PartInfo> {
    if definitions.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(definitions.len().min(limits.max_parts));
    for (&definition_id, definition) in definitions {
        if out.len() >= limits.max_parts {
            warnings.push(format!(
                "parts list truncated at max_parts={}",
                limits.max_parts
            ));
            break;
        }

        let mut product_id = None;
        let mut part_number = None;
        let mut name = None;
        let mut description = None;

        if let Some(formation) = definition
            .formation_ref
            .and_then(|formation_ref| formations.get(&formation_ref))
        {
            if let Some(product_ref) = formation.product_ref {
                product_id = Some(product_ref);
                if let Some(product) = products.get(&product_ref) {
                    part_number = product.identifier.clone();
                    name = product.name.clone();
                    description = product.description.clone();
                }
            }
        }

        out.push(PartInfo {
            definition_id,
            definition_identifier: definition.identifier.clone(),
            definition_description: definition.description.clone(),
            product_id,
            part_number,
            name,
            description,
        });
    }
    out
}

/// Treat blank (empty or whitespace-only) strings as absent.
pub(crate) fn blank_to_none(value: Option<&str>) -> Option<String> {
    value
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_string())
}
