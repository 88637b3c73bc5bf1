use crate::model::{HttpMethod, RouteCandidate};
use crate::scanner::javascript::{
    JsParsers, call_arguments, call_target_node, extract_string_literal, node_text, start_line,
};
use crate::scanner::matcher::FrameworkMatcher;
use crate::scanner::template;
use crate::scanner::walk::SourceFile;
use anyhow::Result;
use tree_sitter::Node;

pub struct NestMatcher {
    parsers: JsParsers,
}

impl NestMatcher {
    pub fn new() -> Result<NestMatcher> {
        Ok(NestMatcher {
            parsers: JsParsers::new()?,
        })
    }
}

impl FrameworkMatcher for NestMatcher {
    fn framework(&self) -> &'static str {
        "nestjs"
    }

    fn languages(&self) -> &'static [&'static str] {
        &["typescript", "tsx"]
    }

    fn detect(&self, source: &str) -> bool {
        source.contains("@nestjs/") || source.contains("@Controller(")
    }

    fn extract(&mut self, file: &SourceFile, source: &str) -> Result<Vec<RouteCandidate>> {
        let tree = self.parsers.parse(file.language, source)?;
        let mut candidates = Vec::new();
        collect_controllers(tree.root_node(), source, file, &mut candidates);
        Ok(candidates)
    }
}

fn collect_controllers(
    node: Node<'_>,
    source: &str,
    file: &SourceFile,
    out: &mut Vec<RouteCandidate>,
) {
    if node.kind() == "class_declaration" || node.kind() == "abstract_class_declaration" {
        if let Some(prefix) = controller_prefix(node, source) {
            collect_controller_routes(node, &prefix, source, file, out);
        }
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_controllers(child, source, file, out);
    }
}

fn controller_prefix(class_node: Node<'_>, source: &str) -> Option<String> {
    for decorator in decorator_nodes(class_node) {
        let Some((name, args)) = decorator_name_and_args(decorator, source) else {
            continue;
        };
        if name == "Controller" {
            let raw = args
                .first()
                .and_then(|arg| extract_string_literal(*arg, source))
                .unwrap_or_else(|| "/".to_string());
            return Some(raw);
        }
    }
    None
}

fn collect_controller_routes(
    class_node: Node<'_>,
    prefix: &str,
    source: &str,
    file: &SourceFile,
    out: &mut Vec<RouteCandidate>,
) {
    let Some(body) = class_node.child_by_field_name("body") else {
        return;
    };
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        if member.kind() != "method_definition" {
            continue;
        }
        for decorator in decorator_nodes(member) {
            let Some((name, args)) = decorator_name_and_args(decorator, source) else {
                continue;
            };
            let Some(method) = HttpMethod::parse(&name) else {
                continue;
            };
            // @Get() means the controller root; a dynamic path argument
            // has no static template and is skipped.
            let raw = match args.first() {
                Some(arg) => match extract_string_literal(*arg, source) {
                    Some(value) => value,
                    None => continue,
                },
                None => "/".to_string(),
            };
            let raw_path = template::join_paths(prefix, &raw);
            out.push(RouteCandidate {
                method,
                params: template::param_hints(&raw_path),
                raw_path,
                file: file.rel_path.clone(),
                line: start_line(member),
                framework: "nestjs",
            });
        }
    }
}

/// Decorators of a node. Exported classes may carry their decorators on the
/// surrounding export statement, so that parent is checked too.
fn decorator_nodes(node: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "decorator" {
            out.push(child);
        }
    }
    if out.is_empty() {
        if let Some(parent) = node.parent() {
            if parent.kind() == "export_statement" {
                let mut cursor = parent.walk();
                for child in parent.named_children(&mut cursor) {
                    if child.kind() == "decorator" {
                        out.push(child);
                    }
                }
            }
        }
    }
    out
}

fn decorator_name_and_args<'a>(node: Node<'a>, source: &str) -> Option<(String, Vec<Node<'a>>)> {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "call_expression" {
            let Some(target) = call_target_node(child) else {
                continue;
            };
            let raw = node_text(target, source);
            let name = raw.split('.').next_back().unwrap_or(raw.as_str()).to_string();
            return Some((name, call_arguments(child)));
        }
    }
    let raw = node_text(node, source);
    let name = raw
        .trim_start_matches('@')
        .split('.')
        .next_back()
        .unwrap_or(raw.as_str())
        .to_string();
    if name.is_empty() {
        None
    } else {
        Some((name, Vec::new()))
    }
}
