//! Oracle text helpers

/// Strip parenthesized reminder text.
///
/// A space directly before an opening parenthesis goes with it. Unmatched
/// closing parentheses are ignored; an unclosed opening parenthesis drops the
/// rest of the text.
pub fn remove_parenthesized_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut start = 0;
    let mut depth: i32 = 0;

    for (i, c) in s.char_indices() {
        match c {
            '(' => {
                if depth <= 0 {
                    depth = 0;
                    let end = if s[..i].ends_with(' ') { i - 1 } else { i };
                    result.push_str(&s[start..end]);
                }
                depth += 1;
            }
            ')' => {
                depth -= 1;
                if depth <= 0 {
                    start = i + 1;
                }
            }
            _ => {}
        }
    }

    if depth == 0 {
        result.push_str(&s[start..]);
    }

    result
}
