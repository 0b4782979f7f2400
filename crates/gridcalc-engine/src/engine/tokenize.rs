//! Argument splitting for function calls.
//!
//! Works on raw formula text: commas and operators only count when they sit
//! at parenthesis depth zero and outside a double-quoted string.

/// Byte positions of the first `(` and its matching `)`.
///
/// Returns None when the parentheses are unbalanced.
pub fn call_parens(call_text: &str) -> Option<(usize, usize)> {
    let open = call_text.find('(')?;
    let mut depth = 0usize;
    let mut in_string = false;

    for (idx, ch) in call_text[open..].char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some((open, open + idx));
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract the trimmed, top-level arguments of a call such as `F(a, G(b, c), "d,e")`.
///
/// An empty list (`F()`) and an unbalanced call both yield an empty vector.
pub fn extract_arguments(call_text: &str) -> Vec<String> {
    let Some((open, close)) = call_parens(call_text) else {
        return Vec::new();
    };
    let inner = &call_text[open + 1..close];
    if inner.trim().is_empty() {
        return Vec::new();
    }
    split_top_level(inner, ',')
        .into_iter()
        .map(|arg| arg.trim().to_string())
        .collect()
}

/// Split on `sep` wherever it appears at depth zero outside quotes.
pub fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut start = 0;

    for (idx, ch) in text.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => depth -= 1,
            c if c == sep && !in_string && depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Byte position of the first top-level occurrence of `pattern`, skipping
/// position 0 when `skip_leading` is set.
pub fn find_top_level(text: &str, pattern: &str, skip_leading: bool) -> Option<usize> {
    let mut depth = 0i32;
    let mut in_string = false;

    for (idx, ch) in text.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => depth -= 1,
            _ if !in_string && depth == 0 => {
                if (idx > 0 || !skip_leading) && text[idx..].starts_with(pattern) {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}
