/// Normalizes a stream identifier to its URL-safe form.
///
/// The admin API and CSV input may carry either the raw base64 form or the
/// URL-safe form of the same identifier. Comparisons and API calls must only
/// ever see the URL-safe form: `+` becomes `-`, `/` becomes `_`, trailing
/// `=` padding and surrounding whitespace are stripped. Applying the
/// function twice yields the same result as applying it once.
pub fn normalize_stream_id(raw: &str) -> String {
    raw.trim()
        .replace('+', "-")
        .replace('/', "_")
        .trim_end_matches('=')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::normalize_stream_id;

    #[test]
    fn unit_normalize_replaces_unsafe_characters_and_padding() {
        let normalized = normalize_stream_id("ab+c/d==");
        assert_eq!(normalized, "ab-c_d");
        assert!(!normalized.contains('+'));
        assert!(!normalized.contains('/'));
        assert!(!normalized.ends_with('='));
    }

    #[test]
    fn unit_normalize_trims_whitespace_before_padding() {
        assert_eq!(normalize_stream_id("  ab+c/d= \n"), "ab-c_d");
    }

    #[test]
    fn unit_normalize_is_idempotent() {
        let once = normalize_stream_id("ab+c/d=");
        assert_eq!(normalize_stream_id(&once), once);
    }

    #[test]
    fn unit_normalize_leaves_safe_ids_unchanged() {
        assert_eq!(normalize_stream_id("ubaSiuUsc_j-_EeMfrmGHw"), "ubaSiuUsc_j-_EeMfrmGHw");
    }
}
