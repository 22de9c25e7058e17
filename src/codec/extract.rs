/// Returns the value that follows `key_marker` in `text`.
///
/// `key_marker` is the literal that precedes the value, opening quote and
/// colon included (e.g. `"state":"`). At most `max_len` characters after the
/// marker are considered. The slice is then cut at the first `,`; when there
/// is no comma it is cut at the first `"`, and when there is neither at the
/// first `}`. A comma cut is still followed by a `"` cut.
///
/// A missing marker yields an empty string. Values that legitimately contain
/// `,` or `"` are truncated; payloads handled here are flat objects with
/// numeric or enum values only.
pub fn extract<'a>(text: &'a str, key_marker: &str, max_len: usize) -> &'a str {
    let Some(found) = text.find(key_marker) else {
        return "";
    };

    let rest = &text[found + key_marker.len()..];
    let end = rest
        .char_indices()
        .nth(max_len)
        .map(|(idx, _)| idx)
        .unwrap_or(rest.len());
    let bounded = &rest[..end];

    if let Some(comma) = bounded.find(',') {
        let value = &bounded[..comma];
        return match value.find('"') {
            Some(quote) => &value[..quote],
            None => value,
        };
    }

    if let Some(quote) = bounded.find('"') {
        return &bounded[..quote];
    }

    match bounded.find('}') {
        Some(brace) => &bounded[..brace],
        None => bounded,
    }
}
