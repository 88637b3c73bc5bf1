use crate::model::{ParamHint, ParamKind};

/// A normalized path. `canonical` keeps parameter names for display;
/// `shape` anonymizes them and is the identity component. Neither ever
/// contains a query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    pub canonical: String,
    pub shape: String,
    pub params: Vec<ParamHint>,
}

pub fn normalize(raw: &str) -> PathTemplate {
    let trimmed = raw.trim();
    let (path_part, query_part) = split_query(trimmed);
    let collapsed = collapse_slashes(path_part);

    let mut canonical = String::from("/");
    let mut shape = String::from("/");
    let mut params = Vec::new();
    let mut first = true;
    for segment in collapsed.trim_matches('/').split('/') {
        if segment.is_empty() {
            continue;
        }
        if !first {
            canonical.push('/');
            shape.push('/');
        }
        first = false;
        match placeholder_name(segment) {
            Some(name) => {
                canonical.push(':');
                canonical.push_str(&name);
                shape.push_str("{}");
                params.push(ParamHint {
                    name,
                    kind: ParamKind::Path,
                    source_syntax: segment.to_string(),
                });
            }
            None => {
                canonical.push_str(segment);
                shape.push_str(segment);
            }
        }
    }

    if let Some(query) = query_part {
        params.extend(query_param_hints(query));
    }

    PathTemplate {
        canonical,
        shape,
        params,
    }
}

/// Parameter hints for a raw path, in left-to-right order. What the
/// extractors attach to candidates.
pub fn param_hints(raw: &str) -> Vec<ParamHint> {
    normalize(raw).params
}

/// Join a route prefix and a suffix with exactly one slash between them.
pub fn join_paths(prefix: &str, suffix: &str) -> String {
    let left = prefix.trim();
    let right = suffix.trim();
    let left = if left.starts_with('/') {
        left.trim_end_matches('/')
    } else {
        return join_paths(&format!("/{left}"), right);
    };
    let right = right.trim_start_matches('/');
    match (left.is_empty(), right.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{right}"),
        (false, true) => left.to_string(),
        (false, false) => format!("{left}/{right}"),
    }
}

/// Split off the query string (and drop any fragment).
fn split_query(raw: &str) -> (&str, Option<&str>) {
    let without_fragment = match raw.find('#') {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    match without_fragment.find('?') {
        Some(idx) => (
            &without_fragment[..idx],
            Some(&without_fragment[idx + 1..]),
        ),
        None => (without_fragment, None),
    }
}

fn collapse_slashes(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut last_slash = false;
    for ch in value.chars() {
        if ch == '/' {
            if !last_slash {
                out.push(ch);
                last_slash = true;
            }
        } else {
            out.push(ch);
            last_slash = false;
        }
    }
    out
}

/// The parameter name of a placeholder segment, or None for a literal.
/// `:id` and `:id?` → `id`; `{id}` and `{p:path}` → `id`/`p`;
/// `<int:id>` and `<id>` → `id`; `*` → `wildcard`.
fn placeholder_name(segment: &str) -> Option<String> {
    if segment == "*" {
        return Some("wildcard".to_string());
    }
    if let Some(rest) = segment.strip_prefix(':') {
        let name = rest.trim_end_matches('?').trim_end_matches('*');
        if !name.is_empty() {
            return Some(name.to_string());
        }
        return None;
    }
    if segment.starts_with('{') && segment.ends_with('}') && segment.len() > 2 {
        let inner = &segment[1..segment.len() - 1];
        let name = inner.split(':').next().unwrap_or(inner).trim_start_matches('*');
        if !name.is_empty() {
            return Some(name.to_string());
        }
        return None;
    }
    if segment.starts_with('<') && segment.ends_with('>') && segment.len() > 2 {
        let inner = &segment[1..segment.len() - 1];
        let name = inner.rsplit(':').next().unwrap_or(inner);
        if !name.is_empty() {
            return Some(name.to_string());
        }
        return None;
    }
    None
}

/// One QueryParam hint per `&`-separated pair, named by its key. A bare
/// placeholder token (`?:token`) is stripped to its name.
fn query_param_hints(query: &str) -> Vec<ParamHint> {
    let mut hints = Vec::new();
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let key = match pair.split_once('=') {
            Some((key, _value)) => key,
            None => pair,
        };
        let name = placeholder_name(key).unwrap_or_else(|| key.to_string());
        if name.is_empty() {
            continue;
        }
        hints.push(ParamHint {
            name,
            kind: ParamKind::Query,
            source_syntax: pair.to_string(),
        });
    }
    hints
}
