//! Single-line rendering of designer-authored strings (module names, script
//! texts) for diagnostics.

use std::borrow::Cow;
use std::fmt::Write;

/// Longest preview kept before the string is cut with an ellipsis.
pub const MAX_LOG_PREVIEW: usize = 200;

/// Escapes backslashes and control characters so the result fits on one log
/// line, and truncates past [`MAX_LOG_PREVIEW`] characters. Strings that need
/// neither are returned borrowed.
pub fn escape_log(s: &str) -> Cow<'_, str> {
    let needs_work = s.chars().count() > MAX_LOG_PREVIEW || s.chars().any(|c| c == '\\' || c.is_control());
    if !needs_work {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len().min(MAX_LOG_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_LOG_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}
