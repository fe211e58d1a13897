// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! DATA-section entity scanner
//!
//! Locates `#id=TYPE(...);` statements in STEP physical-file text.
//! The scan is string-aware: parentheses, commas, and semicolons
//! inside `'...'` literals (with `''` as an escaped quote) are inert,
//! and argument lists may nest arbitrarily.
//!
//! Malformed input never aborts a scan. A statement that fails to
//! parse makes the scanner advance one byte past its `#` and retry,
//! which guarantees forward progress on any byte sequence.

use memchr::memchr;

/// One raw entity statement, borrowed from the scanned text.
///
/// Spans are zero-copy; `type_name` is the identifier as written
/// (uppercasing, when needed, is the consumer's concern).
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntity<'a> {
    /// Entity instance id (the digits after `#`).
    pub id: u32,
    /// Entity type identifier as it appears in the file.
    pub type_name: &'a str,
    /// Raw argument span between the outer parentheses, unparsed.
    pub args_text: &'a str,
    /// The full statement, `#` through `;`.
    pub raw_text: &'a str,
    /// Cursor just past this statement.
    pub next_cursor: usize,
}

/// Find the `DATA;` keyword (case-insensitive) and return the cursor
/// just past it, or `None` when the text has no DATA section.
pub fn find_data_section(text: &str) -> Option<usize> {
    find_ignore_ascii_case(text, "DATA;", 0).map(|i| i + "DATA;".len())
}

/// True when the next non-whitespace bytes at `cursor` spell `ENDSEC`
/// (case-insensitive). Used as the section terminator during scans.
pub fn at_endsec(text: &str, cursor: usize) -> bool {
    let bytes = text.as_bytes();
    let i = skip_ws(bytes, cursor);
    bytes.len() >= i + 6 && bytes[i..i + 6].eq_ignore_ascii_case(b"ENDSEC")
}

/// Strictly parse one entity statement starting at the `#` at `start`.
///
/// Returns `None` on any structural failure (no digits, missing `=`,
/// missing type identifier, unmatched parenthesis). The caller is
/// expected to advance one byte and retry.
pub fn parse_entity_at(text: &str, start: usize) -> Option<RawEntity<'_>> {
    let bytes = text.as_bytes();
    if start >= bytes.len() || bytes[start] != b'#' {
        return None;
    }

    let mut i = start + 1;
    let id_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == id_start {
        return None;
    }
    // Fast integer parsing without allocation
    let mut id: u32 = 0;
    for &b in &bytes[id_start..i] {
        id = id.wrapping_mul(10).wrapping_add((b - b'0') as u32);
    }

    i = skip_ws(bytes, i);
    if i >= bytes.len() || bytes[i] != b'=' {
        return None;
    }
    i = skip_ws(bytes, i + 1);

    let type_start = i;
    while i < bytes.len() && is_ident_byte(bytes[i]) {
        i += 1;
    }
    if i == type_start {
        return None;
    }
    let type_name = &text[type_start..i];

    i = skip_ws(bytes, i);
    if i >= bytes.len() || bytes[i] != b'(' {
        return None;
    }
    let open = i;
    let close = matching_paren(text, open)?;
    let args_text = &text[open + 1..close];

    // Statement ends at the next top-level ';'; a missing semicolon
    // ends it right after the closing parenthesis.
    let end = match find_statement_end(bytes, close + 1) {
        Some(semi) => semi + 1,
        None => close + 1,
    };

    Some(RawEntity {
        id,
        type_name,
        args_text,
        raw_text: &text[start..end],
        next_cursor: end,
    })
}

/// Find the `)` matching the `(` at `open_index`, skipping string
/// literals. Returns `None` when the text has no `(` there or the
/// parenthesis never closes.
pub fn matching_paren(text: &str, open_index: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if open_index >= bytes.len() || bytes[open_index] != b'(' {
        return None;
    }

    let mut depth: usize = 0;
    let mut in_string = false;
    let mut i = open_index;
    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if b == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                in_string = false;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' => in_string = true,
            b'(' => depth += 1,
            b')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Find the statement-terminating `;` at paren depth 0, skipping
/// string literals.
fn find_statement_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut i = from;
    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if b == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                in_string = false;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' => in_string = true,
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b';' if depth == 0 => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Resumable entity scanner over STEP text.
///
/// Finds the next `#` with a SIMD-accelerated search, parses the
/// statement there, and on structural failure retries one byte
/// further. Scanning stops at a bare `ENDSEC` token at the cursor
/// position or at end of text.
pub struct EntityScanner<'a> {
    text: &'a str,
    cursor: usize,
}

impl<'a> EntityScanner<'a> {
    /// Scan from the start of `text`.
    pub fn new(text: &'a str) -> Self {
        Self { text, cursor: 0 }
    }

    /// Scan from an explicit cursor, typically the offset returned by
    /// [`find_data_section`].
    pub fn starting_at(text: &'a str, cursor: usize) -> Self {
        Self {
            text,
            cursor: cursor.min(text.len()),
        }
    }

    /// Current cursor position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Scan for the next entity. The cursor strictly advances on every
    /// call until the scan terminates.
    pub fn next_entity(&mut self) -> Option<RawEntity<'a>> {
        let bytes = self.text.as_bytes();
        while self.cursor < bytes.len() {
            if at_endsec(self.text, self.cursor) {
                return None;
            }
            let hash = self.cursor + memchr(b'#', &bytes[self.cursor..])?;
            match parse_entity_at(self.text, hash) {
                Some(entity) => {
                    self.cursor = entity.next_cursor;
                    return Some(entity);
                }
                None => {
                    self.cursor = hash + 1;
                }
            }
        }
        None
    }
}

/// Case-insensitive substring search, ASCII only.
fn find_ignore_ascii_case(text: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = text.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || hay.len() < n.len() {
        return None;
    }
    let limit = hay.len() - n.len();
    let mut pos = from;
    while pos <= limit {
        let rel = memchr::memchr2(
            n[0].to_ascii_lowercase(),
            n[0].to_ascii_uppercase(),
            &hay[pos..=limit],
        )?;
        let cand = pos + rel;
        if hay[cand..cand + n.len()].eq_ignore_ascii_case(n) {
            return Some(cand);
        }
        pos = cand + 1;
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
fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_data_section() {
        let text = "ISO-10303-21;\nHEADER;\nENDSEC;\ndata;\n#1=A();\n";
        let cursor = find_data_section(text).unwrap();
        assert_eq!(&text[cursor - 5..cursor], "data;");
        assert_eq!(find_data_section("no sections here"), None);
    }

    #[test]
    fn test_parse_simple_entity() {
        let text = "#123=ADVANCED_FACE((#10),#20,.T.);";
        let e = parse_entity_at(text, 0).unwrap();
        assert_eq!(e.id, 123);
        assert_eq!(e.type_name, "ADVANCED_FACE");
        assert_eq!(e.args_text, "(#10),#20,.T.");
        assert_eq!(e.raw_text, text);
        assert_eq!(e.next_cursor, text.len());
    }

    #[test]
    fn test_parse_entity_with_spaces() {
        let text = "#45 = CARTESIAN_POINT ( '' , ( 0. , 1. , 2. ) ) ;";
        let e = parse_entity_at(text, 0).unwrap();
        assert_eq!(e.id, 45);
        assert_eq!(e.type_name, "CARTESIAN_POINT");
    }

    #[test]
    fn test_string_hides_structure() {
        // parens, semicolons and quotes inside the literal are inert
        let text = "#7=PRODUCT('a(b;c)''d',$);#8=PRODUCT('e',$);";
        let e = parse_entity_at(text, 0).unwrap();
        assert_eq!(e.args_text, "'a(b;c)''d',$");
        assert_eq!(&text[e.next_cursor..e.next_cursor + 2], "#8");
    }

    #[test]
    fn test_structural_failures() {
        assert!(parse_entity_at("#=FOO();", 0).is_none());
        assert!(parse_entity_at("#12 FOO();", 0).is_none());
        assert!(parse_entity_at("#12=();", 0).is_none());
        assert!(parse_entity_at("#12=FOO(never closed", 0).is_none());
        assert!(parse_entity_at("", 0).is_none());
    }

    #[test]
    fn test_scanner_basic() {
        let text = "\n#1=A();\n#2=B(#1);\n#3=C('x');\nENDSEC;\n#4=D();";
        let mut scanner = EntityScanner::new(text);
        let ids: Vec<u32> = std::iter::from_fn(|| scanner.next_entity().map(|e| e.id)).collect();
        // #4 is behind ENDSEC and must not be scanned
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_scanner_recovers_from_garbage() {
        let text = "#oops=nope #5=GOOD(); junk #6=ALSO_GOOD();";
        let mut scanner = EntityScanner::new(text);
        let ids: Vec<u32> = std::iter::from_fn(|| scanner.next_entity().map(|e| e.id)).collect();
        assert_eq!(ids, vec![5, 6]);
    }

    #[test]
    fn test_scanner_always_advances() {
        let text = "###((('''#1=A(;)))";
        let mut scanner = EntityScanner::new(text);
        let mut last = 0;
        for _ in 0..text.len() + 4 {
            match scanner.next_entity() {
                Some(e) => {
                    assert!(e.next_cursor > last);
                    last = e.next_cursor;
                }
                None => return,
            }
        }
        panic!("scan did not terminate");
    }

    #[test]
    fn test_at_endsec() {
        assert!(at_endsec("  \n endsec;", 0));
        assert!(at_endsec("ENDSEC", 0));
        assert!(!at_endsec("END", 0));
        assert!(!at_endsec("#1=ENDSEC();", 0));
        assert!(!at_endsec("", 0));
    }

    #[test]
    fn test_matching_paren() {
        let text = "((a,'b)'),c)";
        assert_eq!(matching_paren(text, 0), Some(11));
        assert_eq!(matching_paren(text, 1), Some(8));
        assert_eq!(matching_paren("(open", 0), None);
        assert_eq!(matching_paren("x", 0), None);
    }

    #[test]
    fn test_missing_semicolon_ends_after_paren() {
        let text = "#1=A(1,2)  tail";
        let e = parse_entity_at(text, 0).unwrap();
        assert_eq!(e.raw_text, "#1=A(1,2)");
        assert_eq!(e.next_cursor, 9);
    }
}
