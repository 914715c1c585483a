//! Escaping for text that crosses into script or through the native ABI.

use std::fmt::Write;

/// Escape `s` for use inside a double-quoted JavaScript string literal.
///
/// Control characters get their short escapes where JSON has one and
/// `\u00xx` otherwise. Everything above ASCII is written as `\uxxxx` per
/// UTF-16 code unit, so the output is plain ASCII.
pub fn json_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => push_unit(&mut out, c as u16),
            c if (c as u32) > 127 => push_utf16(&mut out, c),
            c => out.push(c),
        }
    }
    out
}

/// Escape NUL and every non-ASCII character as `\uxxxx`, leave the rest.
///
/// Used on bind payloads and results. Unlike [`json_escape`] this does not
/// touch quotes or backslashes, so valid JSON stays valid JSON, and running
/// it twice changes nothing.
pub fn force_safe_chars(s: &str) -> String {
    if s.bytes().all(|b| b != 0 && b.is_ascii()) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '\0' => push_unit(&mut out, 0),
            c if (c as u32) > 127 => push_utf16(&mut out, c),
            c => out.push(c),
        }
    }
    out
}

fn push_utf16(out: &mut String, c: char) {
    let mut units = [0u16; 2];
    for unit in c.encode_utf16(&mut units) {
        push_unit(out, *unit);
    }
}

fn push_unit(out: &mut String, unit: u16) {
    // Writing to a String cannot fail.
    let _ = write!(out, "\\u{unit:04x}");
}
