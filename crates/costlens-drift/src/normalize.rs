//! # Body Normalization
//!
//! Reduces a method body to a form that only changes when its tokens change:
//!
//! - `//` and `/* */` comments are removed.
//! - Whitespace runs are dropped, except for a single space where two word
//!   characters would otherwise fuse (`int x` stays distinct from `intx`).
//! - String, text-block and character literals are copied verbatim.
//!
//! Normalized bodies are compared by SHA-256 fingerprint so snapshots of
//! large documents do not need to keep every body around.
//!
//! ## Example
//!
//! ```rust
//! use costlens_drift::normalize::{fingerprint, normalize_body};
//!
//! let a = "{ return a+b; }";
//! let b = "{\n    // sum\n    return a + b;\n}";
//! assert_eq!(normalize_body(a), "{return a+b;}");
//! assert_eq!(fingerprint(a), fingerprint(b));
//! ```

use sha2::{Digest, Sha256};

/// SHA-256 digest of a normalized body.
pub type Fingerprint = [u8; 32];

/// Normalizes a body for whitespace- and comment-insensitive comparison.
pub fn normalize_body(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    let mut pending_space = false;

    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
                pending_space = true;
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = '\0';
                for next in chars.by_ref() {
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
                pending_space = true;
            }
            c if c.is_whitespace() => pending_space = true,
            '"' | '\'' => {
                push_token(&mut out, c, &mut pending_space);
                copy_literal(&mut chars, &mut out, c);
            }
            c => push_token(&mut out, c, &mut pending_space),
        }
    }

    out
}

/// Fingerprint of the normalized body.
pub fn fingerprint(body: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(normalize_body(body).as_bytes());
    hasher.finalize().into()
}

fn push_token(out: &mut String, c: char, pending_space: &mut bool) {
    if *pending_space && is_word(c) && out.chars().next_back().is_some_and(is_word) {
        out.push(' ');
    }
    *pending_space = false;
    out.push(c);
}

/// Copies a literal opened by `quote` (already pushed) through its closing
/// quote. Text blocks (`"""`) run to the next `"""`.
fn copy_literal<I>(chars: &mut std::iter::Peekable<I>, out: &mut String, quote: char)
where
    I: Iterator<Item = char>,
{
    if quote == '"' && chars.peek() == Some(&'"') {
        chars.next();
        out.push('"');
        if chars.peek() != Some(&'"') {
            // Empty string literal.
            return;
        }
        chars.next();
        out.push('"');

        let mut quotes = 0;
        for next in chars.by_ref() {
            out.push(next);
            quotes = if next == '"' { quotes + 1 } else { 0 };
            if quotes == 3 {
                return;
            }
        }
        return;
    }

    let mut escaped = false;
    for next in chars.by_ref() {
        out.push(next);
        if escaped {
            escaped = false;
        } else if next == '\\' {
            escaped = true;
        } else if next == quote {
            return;
        }
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}
