//! Best-effort plain text extraction from styled clipboard payloads.
//!
//! RTF is walked as a token stream: control words for paragraph, tab and unicode
//! characters are translated, destination groups (font tables, pictures, document
//! info and any `{\*...}` group) are skipped, everything else is dropped. Payloads
//! that are not RTF must be valid UTF-8 or they are rejected.

/// Destinations whose text never reaches the reader.
const SKIPPED_DESTINATIONS: &[&str] = &[
    "fonttbl",
    "colortbl",
    "expandedcolortbl",
    "stylesheet",
    "info",
    "pict",
    "header",
    "footer",
    "listtable",
    "listoverridetable",
    "generator",
    "themedata",
    "datastore",
    "latentstyles",
];

pub fn decode_styled_text(bytes: &[u8]) -> Option<String> {
    if bytes.starts_with(b"{\\rtf") {
        Some(rtf_to_plain_text(bytes))
    } else {
        std::str::from_utf8(bytes).ok().map(str::to_string)
    }
}

struct Group {
    skip: bool,
    unicode_skip: usize,
}

pub fn rtf_to_plain_text(bytes: &[u8]) -> String {
    let mut out = String::new();
    let mut stack: Vec<Group> = Vec::new();
    let mut skip = false;
    let mut unicode_skip = 1usize;
    // Fallback characters still owed after a \uN escape.
    let mut pending_fallback = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'{' => {
                stack.push(Group { skip, unicode_skip });
                pending_fallback = 0;
                i += 1;
            }
            b'}' => {
                if let Some(group) = stack.pop() {
                    skip = group.skip;
                    unicode_skip = group.unicode_skip;
                }
                pending_fallback = 0;
                i += 1;
            }
            b'\\' => {
                i += 1;
                let Some(&next) = bytes.get(i) else { break };

                if next.is_ascii_alphabetic() {
                    let start = i;
                    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                        i += 1;
                    }
                    let word = std::str::from_utf8(&bytes[start..i]).unwrap_or_default();

                    let num_start = i;
                    if i < bytes.len() && bytes[i] == b'-' {
                        i += 1;
                    }
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                    let param = std::str::from_utf8(&bytes[num_start..i])
                        .ok()
                        .and_then(|s| s.parse::<i32>().ok());

                    // A single space delimits the control word and is not text.
                    if i < bytes.len() && bytes[i] == b' ' {
                        i += 1;
                    }

                    if SKIPPED_DESTINATIONS.contains(&word) {
                        skip = true;
                        continue;
                    }
                    if skip {
                        continue;
                    }

                    match word {
                        "par" | "line" | "row" => out.push('\n'),
                        "tab" | "cell" => out.push('\t'),
                        "emdash" => out.push('\u{2014}'),
                        "endash" => out.push('\u{2013}'),
                        "bullet" => out.push('\u{2022}'),
                        "lquote" => out.push('\u{2018}'),
                        "rquote" => out.push('\u{2019}'),
                        "ldblquote" => out.push('\u{201C}'),
                        "rdblquote" => out.push('\u{201D}'),
                        "uc" => unicode_skip = param.unwrap_or(1).max(0) as usize,
                        "u" => {
                            if let Some(code) = param {
                                let code = if code < 0 { code + 65536 } else { code };
                                if let Some(c) = char::from_u32(code as u32) {
                                    out.push(c);
                                }
                                pending_fallback = unicode_skip;
                            }
                        }
                        _ => {}
                    }
                    continue;
                }

                i += 1;
                match next {
                    b'*' => skip = true,
                    b'\'' => {
                        let hex = bytes.get(i..i + 2).and_then(|h| std::str::from_utf8(h).ok());
                        if let Some(value) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                            i += 2;
                            if pending_fallback > 0 {
                                pending_fallback -= 1;
                            } else if !skip {
                                // Code page bytes are read as Latin-1.
                                out.push(char::from(value));
                            }
                        }
                    }
                    b'\n' | b'\r' if !skip => out.push('\n'),
                    b'~' if !skip => out.push('\u{00A0}'),
                    b'\\' | b'{' | b'}' if !skip => {
                        if pending_fallback > 0 {
                            pending_fallback -= 1;
                        } else {
                            out.push(char::from(next));
                        }
                    }
                    _ => {}
                }
            }
            b'\r' | b'\n' => i += 1,
            _ => {
                // Consume one UTF-8 character so stray multibyte text stays intact.
                let len = utf8_len(b);
                let end = (i + len).min(bytes.len());
                if pending_fallback > 0 {
                    pending_fallback -= 1;
                } else if !skip {
                    out.push_str(&String::from_utf8_lossy(&bytes[i..end]));
                }
                i = end;
            }
        }
    }

    out
}

fn utf8_len(first: u8) -> usize {
    match first {
        0xF0..=0xF7 => 4,
        0xE0..=0xEF => 3,
        0xC0..=0xDF => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_body_text_and_skips_tables() {
        let rtf = br"{\rtf1\ansi{\fonttbl\f0\fswiss Helvetica;}{\colortbl;\red255\green0\blue0;}\f0\pard Hello \b World\b0\par Second line}";
        assert_eq!(rtf_to_plain_text(rtf), "Hello World\nSecond line");
    }

    #[test]
    fn decodes_hex_and_unicode_escapes() {
        let rtf = br"{\rtf1 caf\'e9 \u8364? na\u239\'efve}";
        assert_eq!(rtf_to_plain_text(rtf), "café € naïve");
    }

    #[test]
    fn ignored_destinations_are_dropped() {
        let rtf = br"{\rtf1 {\*\generator Riched20;}visible\tab text}";
        assert_eq!(rtf_to_plain_text(rtf), "visible\ttext");
    }

    #[test]
    fn escaped_braces_are_literal() {
        let rtf = br"{\rtf1 a \{b\} c\\d}";
        assert_eq!(rtf_to_plain_text(rtf), "a {b} c\\d");
    }

    #[test]
    fn non_rtf_payload_must_be_utf8() {
        assert_eq!(decode_styled_text(b"plain styled"), Some("plain styled".to_string()));
        assert_eq!(decode_styled_text(&[0xFF, 0xFE, 0x00]), None);
    }
}
