// SPDX-License-Identifier: MIT OR Apache-2.0
//! Identifier substitution in node body templates.
//!
//! A body template refers to its node's ports as free identifiers. Generating
//! code rewrites those identifiers to the variables or expressions that carry
//! the values in the generated program. This is a lexical pass, not a parser.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How identifiers are located in a body template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubstitutionMode {
    /// Skip string literals, comments and member accesses (`v.x`)
    #[default]
    Tokenized,
    /// Replace every whole-word occurrence, wherever it appears
    Textual,
}

/// Replace whole identifiers of `body` found in `replacements`.
///
/// All names are replaced in a single pass, so a replacement is never itself
/// rewritten by a later one.
pub fn substitute(body: &str, replacements: &BTreeMap<&str, String>, mode: SubstitutionMode) -> String {
    let bytes = body.as_bytes();
    let mut out = String::with_capacity(body.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if mode == SubstitutionMode::Tokenized {
            if let Some(end) = skip_literal(bytes, i) {
                i = end;
                continue;
            }
        }

        let b = bytes[i];
        if is_ident_start(b) {
            let start = i;
            while i < bytes.len() && is_ident_continue(bytes[i]) {
                i += 1;
            }
            let member = mode == SubstitutionMode::Tokenized && start > 0 && bytes[start - 1] == b'.';
            if !member {
                if let Some(replacement) = replacements.get(&body[start..i]) {
                    out.push_str(&body[copied..start]);
                    out.push_str(replacement);
                    copied = i;
                }
            }
        } else if b.is_ascii_digit() {
            // Numeric literals may carry letters: 1e5, 2.0f, 0x1F
            while i < bytes.len() && (is_ident_continue(bytes[i]) || bytes[i] == b'.') {
                i += 1;
            }
        } else {
            i += 1;
        }
    }

    out.push_str(&body[copied..]);
    out
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// End of the comment or string literal starting at `i`, if one starts there
fn skip_literal(bytes: &[u8], i: usize) -> Option<usize> {
    match (bytes[i], bytes.get(i + 1)) {
        (b'/', Some(b'/')) => Some(
            bytes[i..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(bytes.len(), |p| i + p),
        ),
        (b'/', Some(b'*')) => Some(
            bytes[i + 2..]
                .windows(2)
                .position(|w| w == b"*/")
                .map_or(bytes.len(), |p| i + 2 + p + 2),
        ),
        (quote @ (b'"' | b'\''), _) => {
            let mut j = i + 1;
            while j < bytes.len() {
                match bytes[j] {
                    b'\\' => j += 2,
                    b if b == quote => return Some(j + 1),
                    _ => j += 1,
                }
            }
            Some(bytes.len())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replace(body: &str, pairs: &[(&'static str, &str)], mode: SubstitutionMode) -> String {
        let replacements = pairs.iter().map(|&(k, v)| (k, v.to_string())).collect();
        substitute(body, &replacements, mode)
    }

    #[test]
    fn replaces_whole_identifiers_only() {
        let out = replace(
            "y = x * 2.0 + xx + x_1 + max(x, 1e5);",
            &[("x", "inp_B_x")],
            SubstitutionMode::Tokenized,
        );
        assert_eq!(out, "y = inp_B_x * 2.0 + xx + x_1 + max(inp_B_x, 1e5);");
    }

    #[test]
    fn tokenized_skips_comments_strings_and_members() {
        let body = "c = v.x * x; // scale x\n/* x */ s = \"x\";";
        let out = replace(body, &[("x", "k")], SubstitutionMode::Tokenized);
        assert_eq!(out, "c = v.x * k; // scale x\n/* x */ s = \"x\";");
    }

    #[test]
    fn textual_replaces_everywhere() {
        let body = "c = v.x * x; // scale x";
        let out = replace(body, &[("x", "k")], SubstitutionMode::Textual);
        assert_eq!(out, "c = v.k * k; // scale k");
    }

    #[test]
    fn replacements_are_not_rewritten() {
        let out = replace("o = a + b;", &[("a", "b"), ("b", "a")], SubstitutionMode::Tokenized);
        assert_eq!(out, "o = b + a;");
    }

    #[test]
    fn unterminated_literals_run_to_end() {
        let out = replace("o = a; /* a", &[("a", "z")], SubstitutionMode::Tokenized);
        assert_eq!(out, "o = z; /* a");
        let out = replace("o = a; \"a\\\"a", &[("a", "z")], SubstitutionMode::Tokenized);
        assert_eq!(out, "o = z; \"a\\\"a");
    }

    #[test]
    fn non_ascii_text_passes_through() {
        let out = replace("// é\nout = a; // ü a", &[("a", "z")], SubstitutionMode::Tokenized);
        assert_eq!(out, "// é\nout = z; // ü a");
    }
}
