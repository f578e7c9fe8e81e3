/// Strip ASCII control characters from text before it goes into a prompt.
///
/// Tab, line feed and carriage return are kept; everything else in
/// `\x00-\x1F` plus `\x7F` is removed.
pub fn sanitize(text: &str) -> String {
    text.chars().filter(|c| !is_stripped(*c)).collect()
}

fn is_stripped(c: char) -> bool {
    matches!(
        c,
        '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}'
    )
}
