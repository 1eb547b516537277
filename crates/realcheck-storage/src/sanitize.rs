//! Client filename sanitization.

use unicode_normalization::UnicodeNormalization;

/// Sanitize a client-supplied filename for use as a staging key.
///
/// The name is NFKD-folded so accented letters keep their base letter, then
/// any remaining non-ASCII is dropped. Path separators become word breaks,
/// whitespace runs collapse to `_`, anything outside `[A-Za-z0-9_.-]` is
/// dropped, and leading/trailing `.` and `_` are trimmed. The result may be
/// empty.
pub fn sanitize_filename(name: &str) -> String {
    let spaced: String = name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let filtered: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '.' || *c == '-')
        .collect();

    filtered.trim_matches(|c| c == '.' || c == '_').to_string()
}
