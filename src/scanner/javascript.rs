use crate::model::{HttpMethod, RouteCandidate};
use crate::scanner::matcher::FrameworkMatcher;
use crate::scanner::template;
use crate::scanner::walk::SourceFile;
use anyhow::{Result, anyhow};
use tree_sitter::{Node, Parser};

const HTTP_VERB_NAMES: &[&str] = &[
    "get", "post", "put", "patch", "delete", "options", "head", "all",
];
const EXPRESS_RECEIVERS: &[&str] = &["app", "router", "server", "api"];
const FASTIFY_RECEIVERS: &[&str] = &["fastify", "app", "server"];

pub(crate) struct JsParsers {
    javascript: Parser,
    typescript: Parser,
    tsx: Parser,
}

impl JsParsers {
    pub(crate) fn new() -> Result<JsParsers> {
        let mut javascript = Parser::new();
        javascript.set_language(&tree_sitter_javascript::LANGUAGE.into())?;
        let mut typescript = Parser::new();
        typescript.set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())?;
        let mut tsx = Parser::new();
        tsx.set_language(&tree_sitter_typescript::LANGUAGE_TSX.into())?;
        Ok(JsParsers {
            javascript,
            typescript,
            tsx,
        })
    }

    pub(crate) fn parse(&mut self, language: &str, source: &str) -> Result<tree_sitter::Tree> {
        let parser = match language {
            "typescript" => &mut self.typescript,
            "tsx" => &mut self.tsx,
            _ => &mut self.javascript,
        };
        parser
            .parse(source, None)
            .ok_or_else(|| anyhow!("tree-sitter produced no {language} tree"))
    }
}

pub struct ExpressMatcher {
    parsers: JsParsers,
}

impl ExpressMatcher {
    pub fn new() -> Result<ExpressMatcher> {
        Ok(ExpressMatcher {
            parsers: JsParsers::new()?,
        })
    }
}

impl FrameworkMatcher for ExpressMatcher {
    fn framework(&self) -> &'static str {
        "express"
    }

    fn languages(&self) -> &'static [&'static str] {
        &["javascript", "typescript", "tsx"]
    }

    // Also the generic JS fallback: files that register on a bare router
    // receiver without importing express are claimed here.
    fn detect(&self, source: &str) -> bool {
        has_module_ref(source, "express")
            || source.contains("express.Router(")
            || has_router_verb_call(source, EXPRESS_RECEIVERS)
    }

    fn extract(&mut self, file: &SourceFile, source: &str) -> Result<Vec<RouteCandidate>> {
        let tree = self.parsers.parse(file.language, source)?;
        let mut candidates = Vec::new();
        collect_express(tree.root_node(), source, file, &mut candidates);
        Ok(candidates)
    }
}

pub struct FastifyMatcher {
    parsers: JsParsers,
}

impl FastifyMatcher {
    pub fn new() -> Result<FastifyMatcher> {
        Ok(FastifyMatcher {
            parsers: JsParsers::new()?,
        })
    }
}

impl FrameworkMatcher for FastifyMatcher {
    fn framework(&self) -> &'static str {
        "fastify"
    }

    fn languages(&self) -> &'static [&'static str] {
        &["javascript", "typescript"]
    }

    fn detect(&self, source: &str) -> bool {
        has_module_ref(source, "fastify")
    }

    fn extract(&mut self, file: &SourceFile, source: &str) -> Result<Vec<RouteCandidate>> {
        let tree = self.parsers.parse(file.language, source)?;
        let mut candidates = Vec::new();
        collect_fastify(tree.root_node(), source, file, &mut candidates);
        Ok(candidates)
    }
}

fn collect_express(
    node: Node<'_>,
    source: &str,
    file: &SourceFile,
    out: &mut Vec<RouteCandidate>,
) {
    if node.kind() == "call_expression" {
        if let Some(candidate) =
            direct_route_candidate(node, source, file, EXPRESS_RECEIVERS, "express")
        {
            out.push(candidate);
        } else if let Some(candidate) = route_chain_candidate(node, source, file) {
            out.push(candidate);
        }
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_express(child, source, file, out);
    }
}

fn collect_fastify(
    node: Node<'_>,
    source: &str,
    file: &SourceFile,
    out: &mut Vec<RouteCandidate>,
) {
    if node.kind() == "call_expression" {
        if let Some(candidate) =
            direct_route_candidate(node, source, file, FASTIFY_RECEIVERS, "fastify")
        {
            out.push(candidate);
        } else {
            out.extend(fastify_config_candidates(node, source, file));
        }
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_fastify(child, source, file, out);
    }
}

/// `app.get("/users/:id", handler)` and friends.
fn direct_route_candidate(
    node: Node<'_>,
    source: &str,
    file: &SourceFile,
    receivers: &[&str],
    framework: &'static str,
) -> Option<RouteCandidate> {
    let target = call_target_node(node)?;
    let (receiver, method_name) = member_receiver_and_method(target, source)?;
    if !HTTP_VERB_NAMES.contains(&method_name.as_str()) {
        return None;
    }
    if !is_router_receiver(&receiver, receivers) {
        return None;
    }
    let args = call_arguments(node);
    let raw_path = args
        .first()
        .and_then(|arg| extract_string_literal(*arg, source))?;
    if !raw_path.starts_with('/') {
        // Filters axios-style client calls on an `api` receiver.
        return None;
    }
    let method = HttpMethod::parse(&method_name)?;
    Some(candidate(method, raw_path, file, node, framework))
}

/// `router.route("/cars").get(handler).post(handler)` — each verb link in
/// the chain is its own call_expression, so each yields one candidate.
fn route_chain_candidate(
    node: Node<'_>,
    source: &str,
    file: &SourceFile,
) -> Option<RouteCandidate> {
    let target = call_target_node(node)?;
    let (object, method_name) = member_object_and_method(target, source)?;
    if !HTTP_VERB_NAMES.contains(&method_name.as_str()) {
        return None;
    }
    let route_call = innermost_route_call(object, source)?;
    let route_args = call_arguments(route_call);
    let raw_path = route_args
        .first()
        .and_then(|arg| extract_string_literal(*arg, source))?;
    if !raw_path.starts_with('/') {
        return None;
    }
    let method = HttpMethod::parse(&method_name)?;
    Some(candidate(method, raw_path, file, node, "express"))
}

/// Walk down a verb chain to the `x.route(path)` call at its base.
fn innermost_route_call<'a>(node: Node<'a>, source: &str) -> Option<Node<'a>> {
    if node.kind() != "call_expression" {
        return None;
    }
    let target = call_target_node(node)?;
    let (object, method_name) = member_object_and_method(target, source)?;
    if method_name == "route" {
        let receiver = node_text(object, source);
        if is_router_receiver(&receiver, EXPRESS_RECEIVERS) {
            return Some(node);
        }
        return None;
    }
    if HTTP_VERB_NAMES.contains(&method_name.as_str()) {
        return innermost_route_call(object, source);
    }
    None
}

/// `fastify.route({method: "POST", url: "/cars", handler})`. The method
/// property may be a single string or an array; absent means any verb.
fn fastify_config_candidates(
    node: Node<'_>,
    source: &str,
    file: &SourceFile,
) -> Vec<RouteCandidate> {
    let mut out = Vec::new();
    let Some(target) = call_target_node(node) else {
        return out;
    };
    let Some((receiver, method_name)) = member_receiver_and_method(target, source) else {
        return out;
    };
    if method_name != "route" || !is_router_receiver(&receiver, FASTIFY_RECEIVERS) {
        return out;
    }
    let args = call_arguments(node);
    let Some(config) = args.first().copied() else {
        return out;
    };
    if config.kind() != "object" {
        return out;
    }
    let raw_path = object_property_string(config, "url", source)
        .or_else(|| object_property_string(config, "path", source));
    let Some(raw_path) = raw_path else {
        return out;
    };
    for method in config_methods(config, source) {
        out.push(candidate(method, raw_path.clone(), file, node, "fastify"));
    }
    out
}

fn config_methods(config: Node<'_>, source: &str) -> Vec<HttpMethod> {
    let mut methods = Vec::new();
    let Some(value) = object_property_node(config, "method", source) else {
        return vec![HttpMethod::Any];
    };
    if value.kind() == "array" {
        let mut cursor = value.walk();
        for child in value.named_children(&mut cursor) {
            if let Some(raw) = extract_string_literal(child, source) {
                if let Some(method) = HttpMethod::parse(&raw) {
                    methods.push(method);
                }
            }
        }
    } else if let Some(raw) = extract_string_literal(value, source) {
        if let Some(method) = HttpMethod::parse(&raw) {
            methods.push(method);
        }
    }
    if methods.is_empty() {
        methods.push(HttpMethod::Any);
    }
    methods
}

fn candidate(
    method: HttpMethod,
    raw_path: String,
    file: &SourceFile,
    node: Node<'_>,
    framework: &'static str,
) -> RouteCandidate {
    RouteCandidate {
        method,
        params: template::param_hints(&raw_path),
        raw_path,
        file: file.rel_path.clone(),
        line: start_line(node),
        framework,
    }
}

fn has_module_ref(source: &str, module: &str) -> bool {
    let require_double = format!("require(\"{module}\")");
    let require_single = format!("require('{module}')");
    let from_double = format!("from \"{module}\"");
    let from_single = format!("from '{module}'");
    source.contains(&require_double)
        || source.contains(&require_single)
        || source.contains(&from_double)
        || source.contains(&from_single)
}

fn has_router_verb_call(source: &str, receivers: &[&str]) -> bool {
    for receiver in receivers {
        for verb in HTTP_VERB_NAMES.iter().chain(std::iter::once(&"route")) {
            let needle = format!("{receiver}.{verb}(");
            if source.contains(&needle) {
                return true;
            }
        }
    }
    false
}

fn is_router_receiver(raw: &str, receivers: &[&str]) -> bool {
    let head = raw.split('.').next().unwrap_or(raw);
    receivers.contains(&head)
}

pub(crate) fn call_target_node(node: Node<'_>) -> Option<Node<'_>> {
    node.child_by_field_name("function")
        .or_else(|| node.child_by_field_name("callee"))
}

pub(crate) fn member_receiver_and_method(node: Node<'_>, source: &str) -> Option<(String, String)> {
    let (object, method) = member_object_and_method(node, source)?;
    Some((node_text(object, source), method))
}

pub(crate) fn member_object_and_method<'a>(
    node: Node<'a>,
    source: &str,
) -> Option<(Node<'a>, String)> {
    if node.kind() != "member_expression" && node.kind() != "optional_member_expression" {
        return None;
    }
    let object = node.child_by_field_name("object")?;
    let method = node
        .child_by_field_name("property")
        .map(|prop| node_text(prop, source))?;
    Some((object, method))
}

pub(crate) fn call_arguments(node: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let Some(args) = node.child_by_field_name("arguments") else {
        return out;
    };
    let mut cursor = args.walk();
    for child in args.named_children(&mut cursor) {
        out.push(child);
    }
    out
}

/// Template strings are not route literals: their path is not static.
pub(crate) fn extract_string_literal(node: Node<'_>, source: &str) -> Option<String> {
    if node.kind() == "template_string" {
        return None;
    }
    unquote_string_literal(&node_text(node, source))
}

pub(crate) fn unquote_string_literal(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.len() < 2 {
        return None;
    }
    let first = trimmed.chars().next()?;
    if first == '"' || first == '\'' {
        let last = trimmed.chars().last()?;
        if last == first {
            return Some(trimmed[1..trimmed.len() - 1].to_string());
        }
    }
    None
}

pub(crate) fn object_property_node<'a>(
    node: Node<'a>,
    key: &str,
    source: &str,
) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "pair" {
            continue;
        }
        let Some(key_node) = child.child_by_field_name("key") else {
            continue;
        };
        let key_text = node_text(key_node, source);
        if key_text.trim_matches('"').trim_matches('\'') != key {
            continue;
        }
        return child.child_by_field_name("value");
    }
    None
}

pub(crate) fn object_property_string(node: Node<'_>, key: &str, source: &str) -> Option<String> {
    object_property_node(node, key, source).and_then(|value| extract_string_literal(value, source))
}

pub(crate) fn node_text(node: Node<'_>, source: &str) -> String {
    source
        .get(node.start_byte()..node.end_byte())
        .unwrap_or("")
        .trim()
        .to_string()
}

pub(crate) fn start_line(node: Node<'_>) -> i64 {
    node.start_position().row as i64 + 1
}
