// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Paginated raw-entity listing.
//!
//! Unlike [`crate::analyze`], this path builds no tables and no tree:
//! it re-scans the DATA section, filters by type-name substring, and
//! returns raw statement snippets page by page. The intended use is a
//! follow-up read after the summary pointed somewhere interesting:
//! filter on `DIMENSION`, `B_SPLINE`, `ADVANCED_FACE`, and page
//! through the originals for precise downstream parsing.

use crate::limits::Limits;
use crate::types::{EntityPage, EntitySnippet};
use step_lite_core::{find_data_section, normalize_entity_text, EntityScanner};
use tracing::warn;

/// Page size when the caller does not pass one.
const DEFAULT_PAGE_LIMIT: usize = 50;
/// Hard page-size ceiling regardless of what the caller asks for.
const MAX_PAGE_LIMIT: usize = 500;

/// List DATA-section entities with an optional case-insensitive
/// type-name substring filter and offset/limit pagination.
///
/// `offset` counts filter-matching entities, not scanned ones. All
/// scanned entities count against `limits.max_entities` exactly as in
/// [`crate::analyze`].
pub fn list_entities(
    step_text: &str,
    limits: &Limits,
    type_contains: Option<&str>,
    offset: Option<usize>,
    limit: Option<usize>,
) -> EntityPage {
    let mut warnings = Vec::new();

    if step_text.trim().is_empty() {
        warnings.push("STEP content is empty; no DATA section to scan".to_string());
        return empty_page(warnings);
    }
    let Some(data_start) = find_data_section(step_text) else {
        warnings.push("no DATA section found".to_string());
        return empty_page(warnings);
    };

    let offset = offset.unwrap_or(0);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    // Substring match rather than equality, so families like
    // DIMENSION or GEOMETRIC_TOLERANCE can be pulled with one filter.
    let filter: Option<String> = type_contains
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_ascii_uppercase);

    let mut scanner = EntityScanner::starting_at(step_text, data_start);
    let mut scanned: usize = 0;
    let mut matched: usize = 0;
    let mut truncated = false;
    let mut has_more = false;
    let mut next_offset = None;
    let mut entities: Vec<EntitySnippet> = Vec::with_capacity(limit.min(200));

    while let Some(entity) = scanner.next_entity() {
        if scanned >= limits.max_entities {
            truncated = true;
            warn!(max_entities = limits.max_entities, "entity scan truncated");
            warnings.push(format!(
                "entity scan truncated at max_entities={}",
                limits.max_entities
            ));
            break;
        }
        scanned += 1;

        let type_upper = entity.type_name.to_ascii_uppercase();
        let matches = match &filter {
            Some(f) => type_upper.contains(f.as_str()),
            None => true,
        };
        if !matches {
            continue;
        }

        if matched >= offset && entities.len() < limit {
            entities.push(EntitySnippet {
                entity_id: entity.id,
                type_name: type_upper,
                text: normalize_entity_text(entity.raw_text).into_owned(),
            });
        }
        matched += 1;

        if entities.len() >= limit {
            has_more = true;
            next_offset = Some(offset + entities.len());
            break;
        }
    }

    EntityPage {
        scanned_entities: scanned,
        entities_truncated: truncated,
        offset,
        limit,
        has_more,
        next_offset,
        entities,
        warnings,
    }
}

fn empty_page(warnings: Vec<String>) -> EntityPage {
    EntityPage {
        scanned_entities: 0,
        entities_truncated: false,
        offset: 0,
        limit: 0,
        has_more: false,
        next_offset: None,
        entities: Vec::new(),
        warnings,
    }
}
