use anyhow::{Context, Result};
use std::fs;
use std::path::{Component, Path};

pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

pub fn normalize_rel_path(project_root: &Path, path: &Path) -> Result<String> {
    let rel = path.strip_prefix(project_root).with_context(|| {
        format!(
            "strip prefix {} from {}",
            project_root.display(),
            path.display()
        )
    })?;
    Ok(normalize_path(rel))
}

/// Forward-slash form of a relative path, `.` components dropped.
pub fn normalize_path(path: &Path) -> String {
    let mut parts = Vec::new();
    for comp in path.components() {
        match comp {
            Component::Normal(os) => parts.push(os.to_string_lossy().to_string()),
            Component::ParentDir => parts.push("..".to_string()),
            Component::CurDir => {}
            _ => {}
        }
    }
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_path;
    use std::path::Path;

    #[test]
    fn normalizes_components() {
        assert_eq!(normalize_path(Path::new("./a/b.js")), "a/b.js");
        assert_eq!(normalize_path(Path::new("a/./b/c.py")), "a/b/c.py");
        assert_eq!(normalize_path(Path::new("")), ".");
    }
}
