use crate::model::{ScanError, ScanIssue};
use crate::util;
use ignore::WalkBuilder;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub rel_path: String,
    pub abs_path: PathBuf,
    pub language: &'static str,
}

#[derive(Debug, Clone)]
pub struct LanguageSpec {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
}

static LANGUAGE_SPECS: &[LanguageSpec] = &[
    LanguageSpec {
        name: "javascript",
        extensions: &["js", "jsx", "mjs", "cjs"],
    },
    LanguageSpec {
        name: "typescript",
        extensions: &["ts", "mts", "cts"],
    },
    LanguageSpec {
        name: "tsx",
        extensions: &["tsx"],
    },
    LanguageSpec {
        name: "python",
        extensions: &["py"],
    },
];

static IGNORED_DIRS: &[&str] = &[
    "node_modules",
    "__pycache__",
    ".git",
    "dist",
    "build",
    "out",
    "coverage",
    ".nyc_output",
    ".next",
    ".nuxt",
    "target",
    "vendor",
    "venv",
    ".venv",
    "logs",
    "tmp",
    "temp",
];

#[derive(Debug, Clone, Copy)]
pub struct WalkOptions {
    pub no_ignore: bool,
    pub max_file_bytes: u64,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            no_ignore: false,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub files: Vec<SourceFile>,
    pub skipped: usize,
    pub errors: Vec<ScanIssue>,
}

pub fn language_specs() -> &'static [LanguageSpec] {
    LANGUAGE_SPECS
}

/// Walk the project, collecting recognized source files sorted by relative
/// path. The sorted order is the scan's first-seen order, so re-walking an
/// unchanged tree is deterministic.
pub fn walk_project(project_root: &Path, options: &WalkOptions) -> Result<WalkOutcome, ScanError> {
    if !project_root.is_dir() {
        return Err(ScanError::InvalidPath(project_root.to_path_buf()));
    }
    let project_root = fs::canonicalize(project_root).unwrap_or_else(|_| project_root.to_path_buf());

    let mut outcome = WalkOutcome::default();
    let mut builder = WalkBuilder::new(&project_root);
    if options.no_ignore {
        builder
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .parents(false);
    } else {
        builder
            .ignore(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .parents(true)
            .require_git(false);
    }
    let walker = builder
        .hidden(true)
        .follow_links(false)
        .filter_entry(|entry| !is_ignored_entry(entry))
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "walk error");
                outcome.errors.push(ScanIssue {
                    file: String::new(),
                    message: err.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }
        let path = entry.path();
        let Some(language) = detect_language(path) else {
            outcome.skipped += 1;
            continue;
        };
        let rel_path = match util::normalize_rel_path(&project_root, path) {
            Ok(value) => value,
            Err(_) => continue,
        };
        match fs::metadata(path) {
            Ok(metadata) if metadata.len() > options.max_file_bytes => {
                debug!(file = %rel_path, bytes = metadata.len(), "skipping large file");
                outcome.skipped += 1;
                continue;
            }
            Ok(_) => {}
            Err(err) => {
                outcome.errors.push(ScanIssue {
                    file: rel_path,
                    message: err.to_string(),
                });
                continue;
            }
        }
        outcome.files.push(SourceFile {
            rel_path,
            abs_path: path.to_path_buf(),
            language,
        });
    }
    outcome.files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(outcome)
}

fn is_ignored_entry(entry: &ignore::DirEntry) -> bool {
    if !entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
        return false;
    }
    match entry.file_name() {
        name if IGNORED_DIRS.iter().any(|dir| OsStr::new(dir) == name) => true,
        _ => false,
    }
}

fn detect_language(path: &Path) -> Option<&'static str> {
    let ext = path.extension().and_then(|ext| ext.to_str())?;
    for spec in LANGUAGE_SPECS {
        if spec.extensions.iter().any(|candidate| *candidate == ext) {
            return Some(spec.name);
        }
    }
    None
}

pub fn language_for_path(path: &Path) -> Option<&'static str> {
    detect_language(path)
}

#[cfg(test)]
mod tests {
    use super::{WalkOptions, walk_project};
    use crate::model::ScanError;
    use std::fs;
    use std::path::Path;

    #[test]
    fn missing_root_is_invalid_path() {
        let err = walk_project(Path::new("/no/such/project"), &WalkOptions::default())
            .expect_err("missing root must fail");
        assert!(matches!(err, ScanError::InvalidPath(_)));
    }

    #[test]
    fn collects_recognized_files_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("routes")).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/express")).unwrap();
        fs::write(dir.path().join("routes/user.js"), "// b").unwrap();
        fs::write(dir.path().join("app.js"), "// a").unwrap();
        fs::write(dir.path().join("README.md"), "# docs").unwrap();
        fs::write(dir.path().join("node_modules/express/index.js"), "// dep").unwrap();

        let outcome = walk_project(dir.path(), &WalkOptions::default()).unwrap();
        let rels: Vec<_> = outcome.files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(rels, vec!["app.js", "routes/user.js"]);
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn size_bound_skips_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("big.js"), "x".repeat(64)).unwrap();
        fs::write(dir.path().join("small.js"), "y").unwrap();
        let options = WalkOptions {
            no_ignore: false,
            max_file_bytes: 16,
        };
        let outcome = walk_project(dir.path(), &options).unwrap();
        let rels: Vec<_> = outcome.files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(rels, vec!["small.js"]);
        assert_eq!(outcome.skipped, 1);
    }
}
