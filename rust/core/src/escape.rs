// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP string escape codec
//!
//! ISO-10303-21 encodes non-ASCII text inside string literals with
//! control-directive escapes. The forms seen in real exports are:
//!
//! - `\X2\....\X0\`: UCS-2 run, 4 hex digits per UTF-16 code unit
//! - `\X4\....\X0\`: UCS-4 run, 8 hex digits per code point
//! - `\X\hh`: a single raw byte
//!
//! Example: `'\X2\4E2D6587\X0\'` decodes to `中文`.
//!
//! Decoding is best-effort: a malformed escape (odd-length hex run,
//! missing `\X0\` terminator) passes through unchanged instead of
//! failing. Exporters disagree enough about these sequences that
//! strictness would reject otherwise usable files.

use smallvec::SmallVec;
use std::borrow::Cow;

/// Decode STEP string escapes (`\X2\`, `\X4\`, `\X\hh`) into native text.
///
/// Returns the input unchanged (borrowed) when it contains no backslash.
pub fn decode_step_escapes(value: &str) -> Cow<'_, str> {
    if !value.contains('\\') {
        return Cow::Borrowed(value);
    }

    let chars: Vec<char> = value.chars().collect();
    let len = chars.len();
    let mut out = String::with_capacity(value.len());
    let mut i = 0;

    while i < len {
        let c = chars[i];
        if c != '\\' || i + 2 >= len {
            out.push(c);
            i += 1;
            continue;
        }
        let x = chars[i + 1];
        if x != 'X' && x != 'x' {
            out.push(c);
            i += 1;
            continue;
        }

        let mode = chars[i + 2];

        // \X2\...\X0\ or \X4\...\X0\
        if (mode == '2' || mode == '4') && i + 3 < len && chars[i + 3] == '\\' {
            let seq_start = i + 4;
            if let Some(end_marker) = find_end_marker(&chars, seq_start) {
                if let Some(decoded) = decode_hex_run(&chars[seq_start..end_marker], mode) {
                    out.push_str(&decoded);
                    // land just past the "\X0\" terminator
                    i = end_marker + 4;
                    continue;
                }
            }
        }

        // \X\hh (single byte)
        if mode == '\\' && i + 4 < len {
            if let Some(b) = hex_byte(chars[i + 3], chars[i + 4]) {
                out.push(char::from(b));
                i += 5;
                continue;
            }
        }

        out.push(c);
        i += 1;
    }

    Cow::Owned(out)
}

/// Double embedded single quotes so the text is valid inside a STEP
/// string literal again.
pub fn escape_quotes(text: &str) -> Cow<'_, str> {
    if !text.contains('\'') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace('\'', "''"))
}

/// Normalize a full raw entity statement for display: re-walk every
/// single-quoted run, decode its escapes, and re-escape embedded
/// quotes by doubling. Text outside string literals is untouched.
pub fn normalize_entity_text(raw: &str) -> Cow<'_, str> {
    if !raw.contains('\'') {
        return Cow::Borrowed(raw);
    }

    let chars: Vec<char> = raw.chars().collect();
    let len = chars.len();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < len {
        let c = chars[i];
        if c != '\'' {
            out.push(c);
            i += 1;
            continue;
        }

        i += 1;
        let mut content = String::new();
        while i < len {
            let ch = chars[i];
            if ch == '\'' {
                if i + 1 < len && chars[i + 1] == '\'' {
                    content.push('\'');
                    i += 2;
                    continue;
                }
                break;
            }
            content.push(ch);
            i += 1;
        }

        let decoded = decode_step_escapes(&content);
        out.push('\'');
        out.push_str(&escape_quotes(&decoded));
        out.push('\'');
        i += 1;
    }

    Cow::Owned(out)
}

/// Find the `\X0\` terminator of a hex run, starting at `from`.
fn find_end_marker(chars: &[char], from: usize) -> Option<usize> {
    let mut i = from;
    while i + 3 < chars.len() {
        if chars[i] == '\\'
            && (chars[i + 1] == 'X' || chars[i + 1] == 'x')
            && chars[i + 2] == '0'
            && chars[i + 3] == '\\'
        {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Decode the hex digits of a `\X2\`/`\X4\` run.
///
/// Non-hex characters inside the run are skipped; a run shorter than
/// one full group yields `None` so the caller passes the escape
/// through verbatim.
fn decode_hex_run(run: &[char], mode: char) -> Option<String> {
    let hex: SmallVec<[u32; 32]> = run.iter().filter_map(|c| c.to_digit(16)).collect();

    let group = if mode == '4' { 8 } else { 4 };
    let usable = hex.len() - hex.len() % group;
    if usable == 0 {
        return None;
    }

    if mode == '4' {
        let mut out = String::with_capacity(usable / group);
        for chunk in hex[..usable].chunks(group) {
            let code_point = chunk.iter().fold(0u32, |acc, d| (acc << 4) | d);
            // invalid code points are skipped, not fatal
            if let Some(ch) = char::from_u32(code_point) {
                out.push(ch);
            }
        }
        Some(out)
    } else {
        let units: SmallVec<[u16; 16]> = hex[..usable]
            .chunks(group)
            .map(|chunk| chunk.iter().fold(0u32, |acc, d| (acc << 4) | d) as u16)
            .collect();
        Some(String::from_utf16_lossy(&units))
    }
}

fn hex_byte(hi: char, lo: char) -> Option<u8> {
    let a = hi.to_digit(16)?;
    let b = lo.to_digit(16)?;
    Some(((a << 4) | b) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ucs2_run() {
        assert_eq!(decode_step_escapes("\\X2\\4E2D6587\\X0\\"), "中文");
        assert_eq!(decode_step_escapes("pre \\X2\\00E9\\X0\\ post"), "pre é post");
    }

    #[test]
    fn test_ucs2_surrogate_pair() {
        // U+1F600 encoded as a UTF-16 surrogate pair inside a \X2\ run
        assert_eq!(decode_step_escapes("\\X2\\D83DDE00\\X0\\"), "😀");
    }

    #[test]
    fn test_ucs4_run() {
        assert_eq!(decode_step_escapes("\\X4\\00006587\\X0\\"), "文");
        assert_eq!(decode_step_escapes("\\X4\\0001F600\\X0\\"), "😀");
    }

    #[test]
    fn test_single_byte() {
        assert_eq!(decode_step_escapes("\\X\\41"), "A");
        assert_eq!(decode_step_escapes("\\X\\E9"), "\u{e9}");
    }

    #[test]
    fn test_malformed_passes_through() {
        // odd-length hex run: not even one full group
        assert_eq!(decode_step_escapes("\\X2\\4E2\\X0\\"), "\\X2\\4E2\\X0\\");
        // missing terminator
        assert_eq!(decode_step_escapes("\\X2\\4E2D6587"), "\\X2\\4E2D6587");
        // bare backslash
        assert_eq!(decode_step_escapes("a\\b"), "a\\b");
    }

    #[test]
    fn test_partial_group_is_dropped() {
        // one full group plus a trailing half group: the full group decodes
        assert_eq!(decode_step_escapes("\\X2\\4E2D65\\X0\\"), "中");
    }

    #[test]
    fn test_no_escape_borrows() {
        assert!(matches!(decode_step_escapes("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_quotes() {
        assert_eq!(escape_quotes("it's"), "it''s");
        assert!(matches!(escape_quotes("none"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_normalize_entity_text() {
        let raw = "#5=PRODUCT('\\X2\\4E2D6587\\X0\\','it''s',$);";
        assert_eq!(
            normalize_entity_text(raw),
            "#5=PRODUCT('中文','it''s',$);"
        );
    }

    #[test]
    fn test_normalize_without_strings_borrows() {
        assert!(matches!(
            normalize_entity_text("#1=CLOSED_SHELL((#2));"),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn test_normalize_unterminated_string() {
        // unterminated literal still round-trips without panicking
        assert_eq!(normalize_entity_text("#1=PRODUCT('abc"), "#1=PRODUCT('abc'");
    }
}
