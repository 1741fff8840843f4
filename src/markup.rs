//! Plain-text extraction for Directions instruction markup.
//!
//! Instructions arrive as small HTML fragments such as
//! `Turn <b>left</b> onto <b>Main St</b><div style="font-size:0.9em">Toll road</div>`.
//! Tags are dropped and block tags (`div`, `br`, `p`, `li`) separate words.
//! Common entities are decoded; whitespace runs collapse to one space.

/// Returns the text content of an instruction fragment.
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(c) = rest.chars().next() {
        match c {
            '<' => match tag_len(rest) {
                Some(len) => {
                    if is_block_tag(&rest[1..len - 1]) {
                        text.push(' ');
                    }
                    rest = &rest[len..];
                }
                None => {
                    text.push('<');
                    rest = &rest[1..];
                }
            },
            '&' => match decode_entity(rest) {
                Some((decoded, len)) => {
                    text.push(decoded);
                    rest = &rest[len..];
                }
                None => {
                    text.push('&');
                    rest = &rest[1..];
                }
            },
            _ => {
                text.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Byte length of the tag at the start of `s`, including both angle brackets.
///
/// `None` when the `<` does not open a tag (`a < b`) or the tag never closes.
fn tag_len(s: &str) -> Option<usize> {
    let mut chars = s.char_indices().skip(1);
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '/' || c == '!' => {}
        _ => return None,
    }

    let mut quote: Option<char> = None;
    for (i, c) in chars {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i + 1),
            (None, _) => {}
        }
    }
    None
}

fn is_block_tag(inner: &str) -> bool {
    let name: String = inner
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    matches!(name.as_str(), "div" | "br" | "p" | "li")
}

/// Decodes the entity at the start of `s`, returning the char and the bytes consumed.
fn decode_entity(s: &str) -> Option<(char, usize)> {
    let semi = s.char_indices().take(12).find(|&(_, c)| c == ';')?.0;
    let name = &s[1..semi];

    let decoded = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse::<u32>().ok()?,
            };
            char::from_u32(value)?
        }
    };
    Some((decoded, semi + 1))
}
