//! Line-level text helpers shared by the function scanner and the idiom
//! recognizers. Nothing here tokenizes; braces and parentheses are counted
//! character by character, skipping over string literals.

/// Count of `{` minus count of `}` on one line, ignoring string contents.
pub(crate) fn brace_delta(line: &str) -> i32 {
    let mut delta = 0;
    for_each_code_char(line, |c| match c {
        '{' => delta += 1,
        '}' => delta -= 1,
        _ => {}
    });
    delta
}

fn for_each_code_char(line: &str, mut f: impl FnMut(char)) {
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => skip_literal(&mut chars, c),
            _ => f(c),
        }
    }
}

fn skip_literal(chars: &mut std::str::Chars<'_>, quote: char) {
    while let Some(c) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == quote {
            break;
        }
    }
}

/// Given `text` and the byte index just past an opening `(`, return the
/// content up to the matching `)` and the byte index just past it.
///
/// An unterminated group yields everything up to the end of the line.
pub(crate) fn balanced_group(text: &str, open_end: usize) -> (String, usize) {
    let rest = &text[open_end..];
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in rest.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' => depth += 1,
            ')' if depth == 0 => {
                return (rest[..i].trim().to_string(), open_end + i + 1);
            }
            ')' => depth -= 1,
            _ => {}
        }
    }

    (rest.trim().to_string(), text.len())
}

/// First complete double-quoted string literal in `text`, without quotes.
pub(crate) fn first_string_literal(text: &str) -> Option<String> {
    let start = text.find('"')? + 1;
    let mut escaped = false;
    for (i, c) in text[start..].char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return Some(text[start..start + i].to_string());
        }
    }
    None
}

/// Whether a line is a `//` or block-comment continuation line.
pub(crate) fn is_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*')
}

/// Byte index of the first assignment `=` (not part of `==`, `!=`, `<=`,
/// `>=`, `=>`), ignoring string contents.
pub(crate) fn assignment_index(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 1;
            } else if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'=' => {
                let prev = if i > 0 { bytes[i - 1] } else { b' ' };
                let next = bytes.get(i + 1).copied().unwrap_or(b' ');
                if next == b'=' || next == b'>' {
                    i += 2;
                    continue;
                }
                if !matches!(prev, b'=' | b'!' | b'<' | b'>') {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}
