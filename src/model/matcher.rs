//! Tuple matching rules
//!
//! Policy objects are resource paths that may carry `*` wildcards, so a
//! single namespace tuple like `/reports/*` covers every path under it, and
//! `:param` segments, so a declared route like `/report/:id` covers every
//! concrete id. Domains and actions match exactly or via a bare `*`. Subject
//! matching is not handled here: it is grouping-graph reachability, owned by
//! the enforcement engine.

/// Match a request path `value` against a policy object `pattern`.
///
/// A bare `*` matches everything. Patterns with `:param` segments are
/// matched segment by segment; plain patterns fall back to glob matching
/// where `*` absorbs any run of characters.
pub fn key_match(pattern: &str, value: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if pattern.contains(':') {
        return segment_match(pattern, value);
    }
    if !pattern.contains('*') {
        return pattern == value;
    }
    glob_match(pattern, value)
}

/// Segment-wise match for patterns with `:param` placeholders. A `:name`
/// segment matches exactly one non-empty segment; a trailing `*` segment
/// absorbs the rest of the path.
fn segment_match(pattern: &str, value: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split('/').collect();
    let value_segments: Vec<&str> = value.split('/').collect();

    for (i, p) in pattern_segments.iter().enumerate() {
        if *p == "*" && i == pattern_segments.len() - 1 {
            return value_segments.len() > i;
        }
        let Some(v) = value_segments.get(i) else {
            return false;
        };
        let matched = if p.starts_with(':') {
            !v.is_empty()
        } else if p.contains('*') {
            glob_match(p, v)
        } else {
            p == v
        };
        if !matched {
            return false;
        }
    }
    pattern_segments.len() == value_segments.len()
}

/// Glob-style match of `value` against `pattern`, where `*` matches any
/// run of characters (including none, and across `/` separators).
fn glob_match(pattern: &str, value: &str) -> bool {
    let p = pattern.as_bytes();
    let v = value.as_bytes();
    let mut pi = 0;
    let mut vi = 0;
    // Position of the last `*` seen and the value index it was anchored at,
    // so a failed literal run can fall back and let the star absorb more.
    let mut backtrack: Option<(usize, usize)> = None;

    while vi < v.len() {
        if pi < p.len() && p[pi] == b'*' {
            backtrack = Some((pi, vi));
            pi += 1;
        } else if pi < p.len() && p[pi] == v[vi] {
            pi += 1;
            vi += 1;
        } else if let Some((star_pi, star_vi)) = backtrack {
            pi = star_pi + 1;
            vi = star_vi + 1;
            backtrack = Some((star_pi, star_vi + 1));
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == b'*' {
        pi += 1;
    }
    pi == p.len()
}

/// Domain match: exact, or a `*` policy domain covering every tenant
pub fn domain_match(pattern: &str, value: &str) -> bool {
    pattern == "*" || pattern == value
}

/// Action match: exact, or a `*` policy action covering every verb
pub fn action_match(pattern: &str, value: &str) -> bool {
    pattern == "*" || pattern == value
}
