use crate::model::{HttpMethod, RouteCandidate};
use crate::scanner::matcher::FrameworkMatcher;
use crate::scanner::template;
use crate::scanner::walk::SourceFile;
use anyhow::{Result, anyhow};
use tree_sitter::{Node, Parser};

pub struct FastapiMatcher {
    parser: Parser,
}

impl FastapiMatcher {
    pub fn new() -> Result<FastapiMatcher> {
        Ok(FastapiMatcher {
            parser: python_parser()?,
        })
    }
}

impl FrameworkMatcher for FastapiMatcher {
    fn framework(&self) -> &'static str {
        "fastapi"
    }

    fn languages(&self) -> &'static [&'static str] {
        &["python"]
    }

    fn detect(&self, source: &str) -> bool {
        has_python_import(source, "fastapi")
            || source.contains("FastAPI(")
            || source.contains("APIRouter(")
    }

    fn extract(&mut self, file: &SourceFile, source: &str) -> Result<Vec<RouteCandidate>> {
        let tree = parse(&mut self.parser, source)?;
        let mut candidates = Vec::new();
        collect(tree.root_node(), source, file, "fastapi", true, &mut candidates);
        Ok(candidates)
    }
}

pub struct FlaskMatcher {
    parser: Parser,
}

impl FlaskMatcher {
    pub fn new() -> Result<FlaskMatcher> {
        Ok(FlaskMatcher {
            parser: python_parser()?,
        })
    }
}

impl FrameworkMatcher for FlaskMatcher {
    fn framework(&self) -> &'static str {
        "flask"
    }

    fn languages(&self) -> &'static [&'static str] {
        &["python"]
    }

    fn detect(&self, source: &str) -> bool {
        has_python_import(source, "flask")
            || source.contains("Flask(")
            || source.contains("Blueprint(")
    }

    fn extract(&mut self, file: &SourceFile, source: &str) -> Result<Vec<RouteCandidate>> {
        let tree = parse(&mut self.parser, source)?;
        let mut candidates = Vec::new();
        collect(tree.root_node(), source, file, "flask", false, &mut candidates);
        Ok(candidates)
    }
}

fn python_parser() -> Result<Parser> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_python::LANGUAGE.into())?;
    Ok(parser)
}

fn parse(parser: &mut Parser, source: &str) -> Result<tree_sitter::Tree> {
    parser
        .parse(source, None)
        .ok_or_else(|| anyhow!("tree-sitter produced no python tree"))
}

fn collect(
    node: Node<'_>,
    source: &str,
    file: &SourceFile,
    framework: &'static str,
    imperative: bool,
    out: &mut Vec<RouteCandidate>,
) {
    if node.kind() == "decorated_definition" {
        decorator_candidates(node, source, file, framework, out);
    }
    if imperative && node.kind() == "call" {
        out.extend(add_api_route_candidates(node, source, file, framework));
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect(child, source, file, framework, imperative, out);
    }
}

fn decorator_candidates(
    node: Node<'_>,
    source: &str,
    file: &SourceFile,
    framework: &'static str,
    out: &mut Vec<RouteCandidate>,
) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "decorator" {
            continue;
        }
        let Some((name, args)) = decorator_call_info(child, source) else {
            continue;
        };
        let name = name.to_ascii_lowercase();
        if let Some(method) = HttpMethod::parse(&name) {
            // Verb decorator: @app.get("/p"), Flask 2.x shortcuts included.
            if let Some(raw_path) = positional_path(&args, source) {
                out.push(candidate(method, raw_path, file, child, framework));
            }
            continue;
        }
        if name == "route" || name == "api_route" {
            let Some(raw_path) = positional_path(&args, source) else {
                continue;
            };
            let mut methods = methods_from_keywords(&args, source);
            if methods.is_empty() {
                methods.push(if name == "route" {
                    HttpMethod::Get
                } else {
                    HttpMethod::Any
                });
            }
            for method in methods {
                out.push(candidate(method, raw_path.clone(), file, child, framework));
            }
        }
    }
}

/// `router.add_api_route("/p", handler, methods=["GET"])`.
fn add_api_route_candidates(
    node: Node<'_>,
    source: &str,
    file: &SourceFile,
    framework: &'static str,
) -> Vec<RouteCandidate> {
    let mut out = Vec::new();
    let Some(name) = call_target_name(node, source) else {
        return out;
    };
    if name != "add_api_route" {
        return out;
    }
    let args = parse_call_arguments(node, source);
    let Some(raw_path) = args
        .positional
        .first()
        .and_then(|arg| extract_string_literal(*arg, source))
    else {
        return out;
    };
    let mut methods = methods_from_keywords(&args, source);
    if methods.is_empty() {
        methods.push(HttpMethod::Any);
    }
    for method in methods {
        out.push(candidate(method, raw_path.clone(), file, node, framework));
    }
    out
}

fn candidate(
    method: HttpMethod,
    raw_path: String,
    file: &SourceFile,
    node: Node<'_>,
    framework: &'static str,
) -> RouteCandidate {
    // Flask allows registering without the leading slash.
    let raw_path = if raw_path.starts_with('/') {
        raw_path
    } else {
        format!("/{raw_path}")
    };
    RouteCandidate {
        method,
        params: template::param_hints(&raw_path),
        raw_path,
        file: file.rel_path.clone(),
        line: node.start_position().row as i64 + 1,
        framework,
    }
}

/// The literal first positional argument. Dynamic paths (f-strings,
/// variables) have no static template and produce no candidate.
fn positional_path(args: &CallArgs<'_>, source: &str) -> Option<String> {
    args.positional
        .first()
        .and_then(|arg| extract_string_literal(*arg, source))
}

struct CallArgs<'a> {
    positional: Vec<Node<'a>>,
    keywords: Vec<(String, Node<'a>)>,
}

fn decorator_call_info<'a>(node: Node<'a>, source: &str) -> Option<(String, CallArgs<'a>)> {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "call" {
            let name = call_target_name(child, source)?;
            let args = parse_call_arguments(child, source);
            return Some((name, args));
        }
    }
    None
}

fn parse_call_arguments<'a>(node: Node<'a>, source: &str) -> CallArgs<'a> {
    let mut positional = Vec::new();
    let mut keywords = Vec::new();
    let Some(args) = node.child_by_field_name("arguments") else {
        return CallArgs {
            positional,
            keywords,
        };
    };
    let mut cursor = args.walk();
    for child in args.named_children(&mut cursor) {
        if child.kind() == "keyword_argument" {
            if let (Some(name_node), Some(value_node)) = (
                child.child_by_field_name("name"),
                child.child_by_field_name("value"),
            ) {
                keywords.push((node_text(name_node, source), value_node));
            }
            continue;
        }
        positional.push(child);
    }
    CallArgs {
        positional,
        keywords,
    }
}

fn methods_from_keywords(args: &CallArgs<'_>, source: &str) -> Vec<HttpMethod> {
    for (name, value) in &args.keywords {
        if name == "methods" {
            return extract_string_list(*value, source)
                .into_iter()
                .filter_map(|raw| HttpMethod::parse(&raw))
                .collect();
        }
    }
    Vec::new()
}

fn call_target_name(node: Node<'_>, source: &str) -> Option<String> {
    let function = node.child_by_field_name("function")?;
    if function.kind() == "attribute" {
        if let Some(attr) = function.child_by_field_name("attribute") {
            return Some(node_text(attr, source));
        }
    }
    Some(node_text(function, source))
}

/// Plain quoted strings only; f-strings have no static path.
fn extract_string_literal(node: Node<'_>, source: &str) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let raw = node_text(node, source);
    let trimmed = raw.trim();
    if trimmed.len() < 2 {
        return None;
    }
    let first = trimmed.chars().next()?;
    if first != '"' && first != '\'' {
        return None;
    }
    if trimmed.chars().last()? != first {
        return None;
    }
    Some(trimmed[1..trimmed.len() - 1].to_string())
}

fn extract_string_list(node: Node<'_>, source: &str) -> Vec<String> {
    let mut out = Vec::new();
    if matches!(node.kind(), "list" | "tuple" | "set") {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if let Some(value) = extract_string_literal(child, source) {
                out.push(value);
            }
        }
        return out;
    }
    if let Some(value) = extract_string_literal(node, source) {
        out.push(value);
    }
    out
}

fn has_python_import(source: &str, module: &str) -> bool {
    for line in source.lines() {
        let line = line.trim_start();
        for prefix in ["from ", "import "] {
            if let Some(rest) = line.strip_prefix(prefix) {
                if let Some(tail) = rest.strip_prefix(module) {
                    if tail.is_empty()
                        || tail.starts_with(' ')
                        || tail.starts_with('.')
                        || tail.starts_with(',')
                    {
                        return true;
                    }
                }
            }
        }
    }
    false
}

fn node_text(node: Node<'_>, source: &str) -> String {
    source
        .get(node.start_byte()..node.end_byte())
        .unwrap_or("")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::{FastapiMatcher, FlaskMatcher};
    use crate::model::{HttpMethod, ParamKind};
    use crate::scanner::matcher::FrameworkMatcher;
    use crate::scanner::walk::SourceFile;

    fn py_file(rel_path: &str) -> SourceFile {
        SourceFile {
            rel_path: rel_path.to_string(),
            abs_path: rel_path.into(),
            language: "python",
        }
    }

    #[test]
    fn extracts_flask_route_decorators() {
        let source = r#"
from flask import Flask

app = Flask(__name__)


@app.route("/users", methods=["GET", "POST"])
def users():
    return []


@app.route("/users/<int:user_id>")
def user(user_id):
    return {}
"#;
        let mut matcher = FlaskMatcher::new().unwrap();
        assert!(matcher.detect(source));
        let candidates = matcher.extract(&py_file("app.py"), source).unwrap();
        let methods: Vec<_> = candidates.iter().map(|c| c.method).collect();
        assert_eq!(
            methods,
            vec![HttpMethod::Get, HttpMethod::Post, HttpMethod::Get]
        );
        assert_eq!(candidates[2].raw_path, "/users/<int:user_id>");
        assert_eq!(candidates[2].params.len(), 1);
        assert_eq!(candidates[2].params[0].name, "user_id");
        assert_eq!(candidates[2].params[0].kind, ParamKind::Path);
        assert_eq!(candidates[2].params[0].source_syntax, "<int:user_id>");
    }

    #[test]
    fn extracts_fastapi_verbs_and_api_routes() {
        let source = r#"
from fastapi import FastAPI

app = FastAPI()


@app.get("/items/{item_id}")
def read_item(item_id):
    return item_id


@app.api_route("/legacy", methods=["PUT"])
def legacy():
    return None


app.add_api_route("/imperative", legacy, methods=["DELETE"])
"#;
        let mut matcher = FastapiMatcher::new().unwrap();
        assert!(matcher.detect(source));
        let candidates = matcher.extract(&py_file("main.py"), source).unwrap();
        let observed: Vec<_> = candidates
            .iter()
            .map(|c| (c.method, c.raw_path.as_str()))
            .collect();
        assert_eq!(
            observed,
            vec![
                (HttpMethod::Get, "/items/{item_id}"),
                (HttpMethod::Put, "/legacy"),
                (HttpMethod::Delete, "/imperative"),
            ]
        );
        assert_eq!(candidates[0].params[0].name, "item_id");
    }

    #[test]
    fn fstring_paths_are_skipped() {
        let source = r#"
from flask import Flask

app = Flask(__name__)

prefix = "/v1"


@app.route(f"{prefix}/users")
def users():
    return []
"#;
        let mut matcher = FlaskMatcher::new().unwrap();
        let candidates = matcher.extract(&py_file("app.py"), source).unwrap();
        assert!(candidates.is_empty());
    }
}
