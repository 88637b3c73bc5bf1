use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
    Any,
}

impl HttpMethod {
    /// Parse a verb token as written in source: quoted or bare, any case,
    /// `all`/`any` wildcards, `getAsync`-style suffixes.
    pub fn parse(raw: &str) -> Option<HttpMethod> {
        let trimmed = raw.trim().trim_matches('"').trim_matches('\'');
        if trimmed.is_empty() {
            return None;
        }
        let mut upper = trimmed.to_ascii_uppercase();
        if upper.ends_with("ASYNC") && upper.len() > 5 {
            upper.truncate(upper.len() - 5);
        }
        match upper.as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            "OPTIONS" => Some(HttpMethod::Options),
            "HEAD" => Some(HttpMethod::Head),
            "ALL" | "ANY" => Some(HttpMethod::Any),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Any => "ANY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Path,
    Query,
    Body,
}

/// A parameter as written at the declaration site, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamHint {
    pub name: String,
    pub kind: ParamKind,
    pub source_syntax: String,
}

/// One raw route observation from one file. Transient: consumed by the
/// catalog builder, never returned to callers.
#[derive(Debug, Clone)]
pub struct RouteCandidate {
    pub method: HttpMethod,
    pub raw_path: String,
    pub params: Vec<ParamHint>,
    pub file: String,
    pub line: i64,
    pub framework: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclarationSite {
    pub file: String,
    pub line: i64,
}

/// A deduplicated catalog entry. `file`/`line` repeat the first declaration
/// site so the flat response records stay self-contained; `declared_at`
/// keeps every site in first-seen order.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedRoute {
    pub method: HttpMethod,
    pub path: String,
    pub params: Vec<ParamHint>,
    pub file: String,
    pub line: i64,
    pub framework: &'static str,
    pub declared_at: Vec<DeclarationSite>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanIssue {
    pub file: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanStats {
    pub scanned_files: usize,
    pub skipped_files: usize,
    pub errors: Vec<ScanIssue>,
}

#[derive(Debug, Serialize)]
pub struct ScanResult {
    pub routes: Vec<NormalizedRoute>,
    pub stats: ScanStats,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid project path: {}", .0.display())]
    InvalidPath(PathBuf),
    #[error("scan cancelled")]
    Cancelled,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::HttpMethod;

    #[test]
    fn parses_verb_tokens() {
        assert_eq!(HttpMethod::parse("get"), Some(HttpMethod::Get));
        assert_eq!(HttpMethod::parse("\"POST\""), Some(HttpMethod::Post));
        assert_eq!(HttpMethod::parse("Delete"), Some(HttpMethod::Delete));
        assert_eq!(HttpMethod::parse("all"), Some(HttpMethod::Any));
        assert_eq!(HttpMethod::parse("getAsync"), Some(HttpMethod::Get));
        assert_eq!(HttpMethod::parse("route"), None);
        assert_eq!(HttpMethod::parse(""), None);
    }
}
