//! Text normalizer

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Characters treated as line breaks inside a reply.
///
/// `\r\n` is folded into one break before this check.
fn is_line_terminator(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Canonicalize backend output into one console-safe line.
///
/// 1. Compatibility decomposition (NFKD): `é` becomes `e` + U+0301,
///    ligatures such as `ﬁ` become `fi`.
/// 2. Every combining mark is dropped.
/// 3. Each line break becomes a single space.
/// 4. Leading and trailing whitespace is trimmed.
///
/// # Examples
///
/// ```
/// use bridge_domain::normalize_reply;
///
/// assert_eq!(normalize_reply("café\ntest"), "cafe test");
/// ```
pub fn normalize_reply(raw: &str) -> String {
    let mut line = String::with_capacity(raw.len());
    let mut chars = raw.nfkd().filter(|c| !is_combining_mark(*c)).peekable();

    while let Some(c) = chars.next() {
        if c == '\r' && chars.peek() == Some(&'\n') {
            chars.next();
        }
        if is_line_terminator(c) {
            line.push(' ');
        } else {
            line.push(c);
        }
    }

    line.trim().to_string()
}
