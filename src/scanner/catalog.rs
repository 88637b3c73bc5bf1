use crate::model::{
    DeclarationSite, NormalizedRoute, ParamHint, RouteCandidate, ScanResult, ScanStats,
};
use crate::scanner::template;
use std::collections::HashMap;

#[derive(Default)]
pub struct CatalogBuilder {
    routes: Vec<NormalizedRoute>,
    index: HashMap<String, usize>,
}

impl CatalogBuilder {
    pub fn new() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Merge one candidate. Identity is method + anonymized path shape, so
    /// registrations that differ only in parameter names collapse into one
    /// entry; every declaration site is kept and params are unioned by
    /// (name, kind) — conflicting kinds survive as separate hints.
    pub fn add(&mut self, candidate: RouteCandidate) {
        let parsed = template::normalize(&candidate.raw_path);
        let key = format!("{} {}", candidate.method.as_str(), parsed.shape);
        let site = DeclarationSite {
            file: candidate.file.clone(),
            line: candidate.line,
        };
        match self.index.get(&key) {
            Some(&idx) => {
                let route = &mut self.routes[idx];
                for hint in candidate.params {
                    push_param(&mut route.params, hint);
                }
                if !route.declared_at.contains(&site) {
                    route.declared_at.push(site);
                }
            }
            None => {
                let mut params = Vec::new();
                for hint in candidate.params {
                    push_param(&mut params, hint);
                }
                self.index.insert(key, self.routes.len());
                self.routes.push(NormalizedRoute {
                    method: candidate.method,
                    path: parsed.canonical,
                    params,
                    file: candidate.file,
                    line: candidate.line,
                    framework: candidate.framework,
                    declared_at: vec![site],
                });
            }
        }
    }

    pub fn finish(self, stats: ScanStats) -> ScanResult {
        ScanResult {
            routes: self.routes,
            stats,
        }
    }
}

fn push_param(params: &mut Vec<ParamHint>, hint: ParamHint) {
    if !params
        .iter()
        .any(|existing| existing.name == hint.name && existing.kind == hint.kind)
    {
        params.push(hint);
    }
}

#[cfg(test)]
mod tests {
    use super::CatalogBuilder;
    use crate::model::{HttpMethod, ParamHint, ParamKind, RouteCandidate, ScanStats};

    fn candidate(
        method: HttpMethod,
        raw_path: &str,
        file: &str,
        line: i64,
    ) -> RouteCandidate {
        RouteCandidate {
            method,
            params: crate::scanner::template::param_hints(raw_path),
            raw_path: raw_path.to_string(),
            file: file.to_string(),
            line,
            framework: "express",
        }
    }

    #[test]
    fn merges_duplicate_registrations() {
        let mut builder = CatalogBuilder::new();
        builder.add(candidate(HttpMethod::Get, "/users/", "routes/user.js", 4));
        builder.add(candidate(HttpMethod::Get, "/users", "routes/hidden/user.js", 9));
        let result = builder.finish(ScanStats::default());
        assert_eq!(result.routes.len(), 1);
        let route = &result.routes[0];
        assert_eq!(route.path, "/users");
        assert_eq!(route.file, "routes/user.js");
        assert_eq!(route.declared_at.len(), 2);
        assert_eq!(route.declared_at[1].file, "routes/hidden/user.js");
    }

    #[test]
    fn param_names_do_not_split_identity() {
        let mut builder = CatalogBuilder::new();
        builder.add(candidate(HttpMethod::Delete, "/cars/:id", "a.js", 1));
        builder.add(candidate(HttpMethod::Delete, "/cars/{car_id}", "b.py", 2));
        let result = builder.finish(ScanStats::default());
        assert_eq!(result.routes.len(), 1);
        let route = &result.routes[0];
        // First-seen name wins for display; the union keeps both hints.
        assert_eq!(route.path, "/cars/:id");
        let names: Vec<_> = route.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["id", "car_id"]);
    }

    #[test]
    fn methods_split_identity() {
        let mut builder = CatalogBuilder::new();
        builder.add(candidate(HttpMethod::Get, "/cars", "a.js", 1));
        builder.add(candidate(HttpMethod::Delete, "/cars", "a.js", 2));
        let result = builder.finish(ScanStats::default());
        assert_eq!(result.routes.len(), 2);
    }

    #[test]
    fn conflicting_param_kinds_are_preserved() {
        let mut builder = CatalogBuilder::new();
        let mut first = candidate(HttpMethod::Post, "/users", "a.js", 1);
        first.params.push(ParamHint {
            name: "role".to_string(),
            kind: ParamKind::Body,
            source_syntax: "role".to_string(),
        });
        let second = candidate(HttpMethod::Post, "/users?role=:role", "b.js", 2);
        builder.add(first);
        builder.add(second.clone());
        // Re-adding the same site is a no-op.
        builder.add(second);
        let result = builder.finish(ScanStats::default());
        assert_eq!(result.routes.len(), 1);
        let route = &result.routes[0];
        let kinds: Vec<_> = route
            .params
            .iter()
            .filter(|p| p.name == "role")
            .map(|p| p.kind)
            .collect();
        assert_eq!(kinds, vec![ParamKind::Body, ParamKind::Query]);
        assert_eq!(route.declared_at.len(), 2);
    }

    #[test]
    fn first_seen_order_is_stable() {
        let mut builder = CatalogBuilder::new();
        builder.add(candidate(HttpMethod::Get, "/b", "x.js", 1));
        builder.add(candidate(HttpMethod::Get, "/a", "x.js", 2));
        builder.add(candidate(HttpMethod::Get, "/b", "y.js", 3));
        let result = builder.finish(ScanStats::default());
        let paths: Vec<_> = result.routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/b", "/a"]);
    }
}
