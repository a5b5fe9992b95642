//! Allowlist matching for user, channel, and guild ids.

/// Check whether `id` matches any entry of `allowlist`.
///
/// An empty allowlist means everyone is allowed (open policy).
/// Entries are matched case-insensitively and may use `*` as a wildcard for
/// any run of characters.
pub fn is_allowed(id: &str, allowlist: &[String]) -> bool {
    if allowlist.is_empty() {
        return true;
    }
    let id = id.to_lowercase();
    allowlist
        .iter()
        .any(|pattern| wildcard_match(&pattern.to_lowercase(), &id))
}

/// Match `text` against a pattern where `*` stands for any sequence.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let mut segments = pattern.split('*');
    // `split` always yields at least one item.
    let first = segments.next().unwrap_or_default();
    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };

    let tail: Vec<&str> = segments.collect();
    let Some((last, middle)) = tail.split_last() else {
        // No wildcard at all: exact match.
        return rest.is_empty();
    };

    for segment in middle.iter().filter(|s| !s.is_empty()) {
        match rest.find(segment) {
            Some(idx) => rest = &rest[idx + segment.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn empty_allowlist_allows_everyone() {
        assert!(is_allowed("anyone", &[]));
    }

    #[test]
    fn exact_match_ignores_case() {
        let list = list(&["Mod-Team", "1234"]);
        assert!(is_allowed("mod-team", &list));
        assert!(is_allowed("1234", &list));
        assert!(!is_allowed("12345", &list));
    }

    #[test]
    fn prefix_and_suffix_wildcards() {
        assert!(is_allowed("admin_alice", &list(&["admin_*"])));
        assert!(!is_allowed("user_bob", &list(&["admin_*"])));
        assert!(is_allowed("user@example.com", &list(&["*@example.com"])));
        assert!(!is_allowed("user@other.com", &list(&["*@example.com"])));
    }

    #[test]
    fn middle_wildcards() {
        let list = list(&["user_*_admin"]);
        assert!(is_allowed("user_123_admin", &list));
        assert!(!is_allowed("user_123_mod", &list));
        assert!(is_allowed("a1b2c", &["a*b*c".to_string()]));
        assert!(!is_allowed("acb", &["a*b*c".to_string()]));
    }

    #[test]
    fn lone_star_matches_anything() {
        assert!(is_allowed("whatever", &list(&["*"])));
        assert!(is_allowed("", &list(&["*"])));
    }
}
