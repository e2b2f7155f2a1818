//! Registers a plugin identifier inside a JSON-with-comments config without
//! destroying user formatting. Two-pass strategy: tokenize the document
//! keeping byte offsets, locate the top-level `plugin` array, splice the new
//! identifier at a single insertion point, and re-emit every other byte
//! verbatim. Applying the merge twice is guaranteed to report no change.

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Str(String),
    Scalar,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    start: usize,
    end: usize,
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let byte = bytes[pos];
        match byte {
            b' ' | b'\t' | b'\r' | b'\n' => pos += 1,
            b'/' => {
                if bytes.get(pos + 1) == Some(&b'/') {
                    while pos < bytes.len() && bytes[pos] != b'\n' {
                        pos += 1;
                    }
                } else if bytes.get(pos + 1) == Some(&b'*') {
                    let close = text[pos + 2..]
                        .find("*/")
                        .ok_or_else(|| Error::validation("unterminated block comment in config"))?;
                    pos = pos + 2 + close + 2;
                } else {
                    return Err(Error::validation(format!(
                        "unexpected `/` at byte {pos} in config"
                    )));
                }
            }
            b'{' | b'}' | b'[' | b']' | b':' | b',' => {
                let kind = match byte {
                    b'{' => TokenKind::LBrace,
                    b'}' => TokenKind::RBrace,
                    b'[' => TokenKind::LBracket,
                    b']' => TokenKind::RBracket,
                    b':' => TokenKind::Colon,
                    _ => TokenKind::Comma,
                };
                tokens.push(Token {
                    kind,
                    start: pos,
                    end: pos + 1,
                });
                pos += 1;
            }
            b'"' => {
                let (value, end) = scan_string(text, pos)?;
                tokens.push(Token {
                    kind: TokenKind::Str(value),
                    start: pos,
                    end,
                });
                pos = end;
            }
            _ => {
                let start = pos;
                while pos < bytes.len()
                    && !matches!(
                        bytes[pos],
                        b' ' | b'\t'
                            | b'\r'
                            | b'\n'
                            | b'{'
                            | b'}'
                            | b'['
                            | b']'
                            | b':'
                            | b','
                            | b'"'
                            | b'/'
                    )
                {
                    pos += 1;
                }
                if pos == start {
                    return Err(Error::validation(format!(
                        "unexpected character at byte {pos} in config"
                    )));
                }
                tokens.push(Token {
                    kind: TokenKind::Scalar,
                    start,
                    end: pos,
                });
            }
        }
    }

    Ok(tokens)
}

fn scan_string(text: &str, start: usize) -> Result<(String, usize)> {
    let bytes = text.as_bytes();
    let mut value = String::new();
    let mut pos = start + 1;

    while pos < bytes.len() {
        match bytes[pos] {
            b'"' => return Ok((value, pos + 1)),
            b'\\' => {
                let escape = bytes
                    .get(pos + 1)
                    .ok_or_else(|| Error::validation("unterminated string in config"))?;
                match escape {
                    b'"' => value.push('"'),
                    b'\\' => value.push('\\'),
                    b'/' => value.push('/'),
                    b'n' => value.push('\n'),
                    b't' => value.push('\t'),
                    b'r' => value.push('\r'),
                    b'b' => value.push('\u{0008}'),
                    b'f' => value.push('\u{000C}'),
                    b'u' => {
                        let code = read_hex_escape(text, pos)?;
                        pos += 6;
                        let ch = if (0xD800..=0xDBFF).contains(&code) {
                            // High surrogate: JSON encodes astral-plane
                            // characters as a \uXXXX\uXXXX pair.
                            if !text.get(pos..).is_some_and(|rest| rest.starts_with("\\u")) {
                                return Err(Error::validation(
                                    "unpaired surrogate escape in config",
                                ));
                            }
                            let low = read_hex_escape(text, pos)?;
                            if !(0xDC00..=0xDFFF).contains(&low) {
                                return Err(Error::validation(
                                    "unpaired surrogate escape in config",
                                ));
                            }
                            pos += 6;
                            let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                            char::from_u32(combined)
                                .ok_or_else(|| Error::validation("invalid \\u escape in config"))?
                        } else {
                            char::from_u32(code)
                                .ok_or_else(|| Error::validation("invalid \\u escape in config"))?
                        };
                        value.push(ch);
                        continue;
                    }
                    _ => return Err(Error::validation("invalid escape in config string")),
                }
                pos += 2;
            }
            _ => {
                // Multi-byte UTF-8 sequences pass through untouched.
                let ch_len = utf8_len(bytes[pos]);
                value.push_str(&text[pos..pos + ch_len]);
                pos += ch_len;
            }
        }
    }

    Err(Error::validation("unterminated string in config"))
}

/// Four hex digits following a `\u` escape; `backslash` is the byte offset
/// of the backslash itself.
fn read_hex_escape(text: &str, backslash: usize) -> Result<u32> {
    let hex = text
        .get(backslash + 2..backslash + 6)
        .ok_or_else(|| Error::validation("truncated \\u escape in config"))?;
    u32::from_str_radix(hex, 16).map_err(|_| Error::validation("invalid \\u escape in config"))
}

fn utf8_len(byte: u8) -> usize {
    match byte {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}

/// Location of the top-level `plugin` array inside the token stream.
struct PluginArray {
    /// Byte just past the `[`.
    open_end: usize,
    /// End of the final element token, if the array is non-empty.
    last_element_end: Option<usize>,
    /// End of a trailing comma between the last element and `]`, if present.
    trailing_comma_end: Option<usize>,
    elements: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct ConfigMerge {
    pub(crate) changed: bool,
    pub(crate) plugins: Vec<String>,
    pub(crate) updated_text: String,
}

pub(crate) fn update_config_text(existing: Option<&str>, identifier: &str) -> Result<ConfigMerge> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(Error::validation("plugin identifier must not be empty"));
    }

    let text = match existing {
        Some(text) if !text.trim().is_empty() => text,
        _ => {
            return Ok(ConfigMerge {
                changed: true,
                plugins: vec![identifier.to_string()],
                updated_text: format!("{{\n  \"plugin\": [\n    \"{identifier}\"\n  ]\n}}\n"),
            })
        }
    };

    let tokens = tokenize(text)?;
    let Some(first) = tokens.first() else {
        return Err(Error::validation("config is empty"));
    };
    if first.kind != TokenKind::LBrace {
        return Err(Error::validation("config root is not an object"));
    }

    match find_plugin_array(&tokens)? {
        Some(array) => {
            if array.elements.iter().any(|entry| entry == identifier) {
                return Ok(ConfigMerge {
                    changed: false,
                    plugins: array.elements,
                    updated_text: text.to_string(),
                });
            }

            let (insert_at, insertion) = match (array.last_element_end, array.trailing_comma_end) {
                (Some(_), Some(comma_end)) => (comma_end, format!(" \"{identifier}\",")),
                (Some(element_end), None) => (element_end, format!(", \"{identifier}\"")),
                (None, _) => (array.open_end, format!("\"{identifier}\"")),
            };

            let mut plugins = array.elements;
            plugins.push(identifier.to_string());
            Ok(ConfigMerge {
                changed: true,
                plugins,
                updated_text: splice(text, insert_at, &insertion),
            })
        }
        None => {
            // No `plugin` key: introduce one right after the opening brace so
            // everything else keeps its original bytes.
            let open_end = first.end;
            let object_empty = matches!(tokens.get(1).map(|t| &t.kind), Some(TokenKind::RBrace));
            let insertion = if object_empty {
                format!("\n  \"plugin\": [\"{identifier}\"]\n")
            } else {
                format!("\n  \"plugin\": [\"{identifier}\"],")
            };
            Ok(ConfigMerge {
                changed: true,
                plugins: vec![identifier.to_string()],
                updated_text: splice(text, open_end, &insertion),
            })
        }
    }
}

fn splice(text: &str, at: usize, insertion: &str) -> String {
    let mut updated = String::with_capacity(text.len() + insertion.len());
    updated.push_str(&text[..at]);
    updated.push_str(insertion);
    updated.push_str(&text[at..]);
    updated
}

fn find_plugin_array(tokens: &[Token]) -> Result<Option<PluginArray>> {
    let mut depth = 0usize;
    let mut index = 0usize;

    while index < tokens.len() {
        let token = &tokens[index];
        match &token.kind {
            TokenKind::LBrace | TokenKind::LBracket => depth += 1,
            TokenKind::RBrace | TokenKind::RBracket => depth = depth.saturating_sub(1),
            TokenKind::Str(key) if depth == 1 => {
                let is_key = matches!(tokens.get(index + 1).map(|t| &t.kind), Some(TokenKind::Colon));
                if is_key && key == "plugin" {
                    let value = tokens
                        .get(index + 2)
                        .ok_or_else(|| Error::validation("config ends after `plugin` key"))?;
                    if value.kind != TokenKind::LBracket {
                        return Err(Error::InvalidPluginField);
                    }
                    return Ok(Some(collect_array(tokens, index + 2)?));
                }
                if is_key {
                    // Skip the colon so a string value is not mistaken for a key.
                    index += 1;
                }
            }
            _ => {}
        }
        index += 1;
    }

    Ok(None)
}

fn collect_array(tokens: &[Token], open_index: usize) -> Result<PluginArray> {
    let open = &tokens[open_index];
    let mut elements = Vec::new();
    let mut last_element_end = None;
    let mut trailing_comma_end = None;
    let mut index = open_index + 1;

    while index < tokens.len() {
        let token = &tokens[index];
        match &token.kind {
            TokenKind::RBracket => {
                return Ok(PluginArray {
                    open_end: open.end,
                    last_element_end,
                    trailing_comma_end,
                    elements,
                })
            }
            TokenKind::Comma => {
                trailing_comma_end = Some(token.end);
            }
            TokenKind::Str(value) => {
                elements.push(value.clone());
                last_element_end = Some(token.end);
                trailing_comma_end = None;
            }
            TokenKind::Scalar => {
                // Non-string entries are preserved but never matched against.
                last_element_end = Some(token.end);
                trailing_comma_end = None;
            }
            _ => return Err(Error::InvalidPluginField),
        }
        index += 1;
    }

    Err(Error::validation("unterminated `plugin` array in config"))
}
