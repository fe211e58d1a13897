// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HEADER-section model metadata.
//!
//! A STEP physical file opens with a HEADER section holding three
//! fixed statements:
//!
//! ```text
//! FILE_DESCRIPTION( (description, ...), implementation_level )
//! FILE_NAME( name, time_stamp, (author, ...), (organization, ...),
//!            preprocessor_version, originating_system, authorization )
//! FILE_SCHEMA( (schema_identifier, ...) )
//! ```
//!
//! This extraction is statement-scoped: each statement is located by
//! keyword and its parenthesized arguments are parsed in isolation,
//! so a damaged DATA section cannot spoil the header read. A handful
//! of PRODUCT names are additionally sampled from the DATA section as
//! model-name clues without scanning the whole file.

use crate::parts::blank_to_none;
use crate::types::ModelInfo;
use step_lite_core::{matching_paren, parse_args, StepValue};

/// Sampling caps for the PRODUCT name scan. Keeps the metadata read
/// cheap even on very large files.
const MAX_UNIQUE_PRODUCT_NAMES: usize = 10;
const MAX_PRODUCT_SCAN: usize = 200;

/// Extract HEADER metadata and sampled product names. Non-throwing;
/// anything missing becomes a warning plus absent fields.
pub fn parse_model_info(step_text: &str) -> ModelInfo {
    let mut info = ModelInfo::default();

    if step_text.trim().is_empty() {
        info.warnings
            .push("STEP content is empty; nothing to parse".to_string());
        return info;
    }

    if let Some(header) = header_section(step_text, &mut info.warnings) {
        match statement_args(header, "FILE_DESCRIPTION") {
            Some(args_text) => {
                let args = parse_args(args_text);
                info.file_descriptions = strings_of(args.first());
                info.implementation_level =
                    blank_to_none(first_string(args.get(1)).as_deref());
            }
            None => info
                .warnings
                .push("FILE_DESCRIPTION not found in HEADER".to_string()),
        }

        match statement_args(header, "FILE_NAME") {
            Some(args_text) => {
                let args = parse_args(args_text);
                info.file_name = blank_to_none(first_string(args.first()).as_deref());
                info.time_stamp = blank_to_none(first_string(args.get(1)).as_deref());
                info.authors = strings_of(args.get(2));
                info.organizations = strings_of(args.get(3));
                info.preprocessor_version =
                    blank_to_none(first_string(args.get(4)).as_deref());
                info.originating_system =
                    blank_to_none(first_string(args.get(5)).as_deref());
                info.authorization = blank_to_none(first_string(args.get(6)).as_deref());
            }
            None => info
                .warnings
                .push("FILE_NAME not found in HEADER".to_string()),
        }

        match statement_args(header, "FILE_SCHEMA") {
            Some(args_text) => {
                let args = parse_args(args_text);
                info.schemas = strings_of(args.first());
            }
            None => info
                .warnings
                .push("FILE_SCHEMA not found in HEADER".to_string()),
        }
    }

    info.product_names = sample_product_names(step_text, &mut info.warnings);
    info
}

/// Slice out the HEADER section: from past `HEADER;` to the first
/// `ENDSEC`. A missing ENDSEC degrades to the rest of the file.
fn header_section<'a>(text: &'a str, warnings: &mut Vec<String>) -> Option<&'a str> {
    let Some((_, header_start)) = find_section_marker(text, 0, "HEADER") else {
        warnings.push(
            "no HEADER section found; this may not be a STEP physical file".to_string(),
        );
        return None;
    };
    match find_section_marker(text, header_start, "ENDSEC") {
        Some((endsec_start, _)) => Some(&text[header_start..endsec_start]),
        None => {
            warnings
                .push("HEADER section has no ENDSEC; extraction may be incomplete".to_string());
            Some(&text[header_start..])
        }
    }
}

/// Find `KEYWORD ;` (word-bounded, case-insensitive, optional
/// whitespace). Returns (keyword start, index past the semicolon).
fn find_section_marker(text: &str, from: usize, keyword: &str) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut pos = from;
    while let Some(start) = find_word(text, pos, keyword) {
        let i = skip_ws(bytes, start + keyword.len());
        if bytes.get(i) == Some(&b';') {
            return Some((start, i + 1));
        }
        pos = start + 1;
    }
    None
}

/// Find `KEYWORD ( ... )` inside a section and return the argument
/// span. String-aware, so quoted parentheses cannot derail it.
fn statement_args<'a>(section: &'a str, keyword: &str) -> Option<&'a str> {
    let bytes = section.as_bytes();
    let mut pos = 0;
    while let Some(start) = find_word(section, pos, keyword) {
        let i = skip_ws(bytes, start + keyword.len());
        if bytes.get(i) == Some(&b'(') {
            let close = matching_paren(section, i)?;
            return Some(&section[i + 1..close]);
        }
        pos = start + 1;
    }
    None
}

/// Sample distinct PRODUCT first-argument names from the DATA section.
fn sample_product_names(text: &str, warnings: &mut Vec<String>) -> Vec<String> {
    let bytes = text.as_bytes();
    let start = find_section_marker(text, 0, "DATA")
        .map(|(_, end)| end)
        .unwrap_or(0);

    let mut names: Vec<String> = Vec::new();
    let mut scanned = 0;
    let mut pos = start;
    while let Some(keyword_start) = find_word(text, pos, "PRODUCT") {
        pos = keyword_start + "PRODUCT".len();
        let i = skip_ws(bytes, pos);
        if bytes.get(i) != Some(&b'(') {
            continue;
        }

        scanned += 1;
        if scanned > MAX_PRODUCT_SCAN {
            warnings.push("PRODUCT name sampling stopped early at its scan cap".to_string());
            break;
        }

        let Some(close) = matching_paren(text, i) else {
            continue;
        };
        let args = parse_args(&text[i + 1..close]);
        if let Some(name) = blank_to_none(first_string(args.first()).as_deref()) {
            if !names.contains(&name) {
                names.push(name);
                if names.len() >= MAX_UNIQUE_PRODUCT_NAMES {
                    break;
                }
            }
        }
    }
    names
}

/// First string literal inside a value (descending into lists).
fn first_string(value: Option<&StepValue>) -> Option<String> {
    match value? {
        StepValue::Str(s) => Some(s.clone()),
        StepValue::List(items) => items.iter().find_map(|item| first_string(Some(item))),
        _ => None,
    }
}

/// All string literals inside a value, in order.
fn strings_of(value: Option<&StepValue>) -> Vec<String> {
    let mut out = Vec::new();
    collect_strings(value, &mut out);
    out
}

fn collect_strings(value: Option<&StepValue>, out: &mut Vec<String>) {
    match value {
        Some(StepValue::Str(s)) => out.push(s.clone()),
        Some(StepValue::List(items)) => {
            for item in items {
                collect_strings(Some(item), out);
            }
        }
        _ => {}
    }
}

/// Case-insensitive word-bounded search: the match may not be
/// preceded or followed by an identifier byte.
fn find_word(text: &str, from: usize, word: &str) -> Option<usize> {
    let hay = text.as_bytes();
    let needle = word.as_bytes();
    if needle.is_empty() || hay.len() < needle.len() {
        return None;
    }
    let limit = hay.len() - needle.len();
    let mut pos = from;
    while pos <= limit {
        let rel = memchr::memchr2(
            needle[0].to_ascii_lowercase(),
            needle[0].to_ascii_uppercase(),
            &hay[pos..=limit],
        )?;
        let start = pos + rel;
        let end = start + needle.len();
        let bounded = (start == 0 || !is_word_byte(hay[start - 1]))
            && (end >= hay.len() || !is_word_byte(hay[end]));
        if bounded && hay[start..end].eq_ignore_ascii_case(needle) {
            return Some(start);
        }
        pos = start + 1;
    }
    None
}

fn skip_ws(bytes: &[u8], from: usize) -> usize {
    let mut i = from.min(bytes.len());
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

#[inline]
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('model of a bracket','rev B'),'2;1');
FILE_NAME('bracket.stp','2024-03-18T09:30:00',('A. Mason'),('Example Corp'),
  'Preproc 4.2','ExampleCAD 2024','none');
FILE_SCHEMA(('AUTOMOTIVE_DESIGN { 1 0 10303 214 3 1 1 }'));
ENDSEC;
DATA;
#1=PRODUCT('P-100','\\X2\\652F67B6\\X0\\','bracket',(#5));
#2=PRODUCT('P-100','\\X2\\652F67B6\\X0\\','duplicate name',(#5));
#3=PRODUCT('P-200','Shaft','',(#5));
#4=PRODUCT_DEFINITION('d','',#9,#8);
ENDSEC;
END-ISO-10303-21;
";

    #[test]
    fn test_full_header() {
        let info = parse_model_info(SAMPLE);
        assert_eq!(
            info.file_descriptions,
            vec!["model of a bracket".to_string(), "rev B".to_string()]
        );
        assert_eq!(info.implementation_level.as_deref(), Some("2;1"));
        assert_eq!(info.file_name.as_deref(), Some("bracket.stp"));
        assert_eq!(info.time_stamp.as_deref(), Some("2024-03-18T09:30:00"));
        assert_eq!(info.authors, vec!["A. Mason".to_string()]);
        assert_eq!(info.organizations, vec!["Example Corp".to_string()]);
        assert_eq!(info.preprocessor_version.as_deref(), Some("Preproc 4.2"));
        assert_eq!(info.originating_system.as_deref(), Some("ExampleCAD 2024"));
        assert_eq!(info.authorization.as_deref(), Some("none"));
        assert_eq!(info.schemas.len(), 1);
        assert!(info.schemas[0].starts_with("AUTOMOTIVE_DESIGN"));
        assert!(info.warnings.is_empty());
    }

    #[test]
    fn test_product_names_are_decoded_and_distinct() {
        let info = parse_model_info(SAMPLE);
        // first argument is PRODUCT.id; duplicates collapse
        assert_eq!(info.product_names, vec!["P-100".to_string(), "P-200".to_string()]);
    }

    #[test]
    fn test_missing_header() {
        let info = parse_model_info("DATA;\n#1=PRODUCT('X','','',(#2));\nENDSEC;");
        assert!(info.file_name.is_none());
        assert!(info.warnings.iter().any(|w| w.contains("HEADER")));
        assert_eq!(info.product_names, vec!["X".to_string()]);
    }

    #[test]
    fn test_missing_statements_warn() {
        let info = parse_model_info("HEADER;\nFILE_NAME('f','t',(),(),'','','');\nENDSEC;");
        assert!(info.warnings.iter().any(|w| w.contains("FILE_DESCRIPTION")));
        assert!(info.warnings.iter().any(|w| w.contains("FILE_SCHEMA")));
        assert_eq!(info.file_name.as_deref(), Some("f"));
    }

    #[test]
    fn test_header_without_endsec() {
        let info = parse_model_info("HEADER;\nFILE_SCHEMA(('AP203'));");
        assert_eq!(info.schemas, vec!["AP203".to_string()]);
        assert!(info.warnings.iter().any(|w| w.contains("ENDSEC")));
    }

    #[test]
    fn test_product_keyword_is_word_bounded() {
        // PRODUCT_DEFINITION must not register as a PRODUCT sample
        let info = parse_model_info("DATA;\n#1=PRODUCT_DEFINITION('d','',#2,#3);\nENDSEC;");
        assert!(info.product_names.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let info = parse_model_info("   ");
        assert_eq!(info.warnings.len(), 1);
    }
}
