use crate::model::{RouteCandidate, ScanError, ScanIssue, ScanResult, ScanStats};
use crate::util;
use anyhow::Result;
use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub mod catalog;
pub mod javascript;
pub mod matcher;
pub mod nestjs;
pub mod python;
pub mod template;
pub mod walk;

#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    pub no_ignore: bool,
    pub max_file_bytes: u64,
    /// Wall-clock bound for the whole scan; exceeding it yields
    /// `ScanError::Cancelled`.
    pub timeout: Option<Duration>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            no_ignore: false,
            max_file_bytes: walk::DEFAULT_MAX_FILE_BYTES,
            timeout: None,
        }
    }
}

/// Cooperative cancellation: an atomic flag shared with the caller plus an
/// optional deadline. In-flight file tasks observe it between files; a
/// cancelled scan returns no partial catalog.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn with_deadline(timeout: Duration) -> CancelToken {
        CancelToken {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::Relaxed) {
            return true;
        }
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Stateless scan entry point; safe to share across threads and reuse for
/// any number of projects. All per-scan state is local to one invocation.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    options: ScanOptions,
}

struct FileReport {
    candidates: Vec<RouteCandidate>,
    error: Option<ScanIssue>,
    scanned: bool,
}

impl Scanner {
    pub fn new(options: ScanOptions) -> Scanner {
        Scanner { options }
    }

    pub fn scan(&self, project_root: &Path) -> Result<ScanResult, ScanError> {
        let cancel = match self.options.timeout {
            Some(timeout) => CancelToken::with_deadline(timeout),
            None => CancelToken::new(),
        };
        self.scan_with_cancel(project_root, &cancel)
    }

    pub fn scan_with_cancel(
        &self,
        project_root: &Path,
        cancel: &CancelToken,
    ) -> Result<ScanResult, ScanError> {
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        let walk_options = walk::WalkOptions {
            no_ignore: self.options.no_ignore,
            max_file_bytes: self.options.max_file_bytes,
        };
        let outcome = walk::walk_project(project_root, &walk_options)?;
        debug!(
            files = outcome.files.len(),
            skipped = outcome.skipped,
            "walk complete"
        );

        // map_init keeps one matcher set per worker; ordered collect restores
        // walk order no matter which worker finished first.
        let reports: Vec<Option<FileReport>> = outcome
            .files
            .par_iter()
            .map_init(matcher::MatcherSet::new, |matchers, file| {
                if cancel.is_cancelled() {
                    return None;
                }
                Some(extract_file(matchers, file))
            })
            .collect();
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let mut stats = ScanStats {
            scanned_files: 0,
            skipped_files: outcome.skipped,
            errors: outcome.errors,
        };
        let mut builder = catalog::CatalogBuilder::new();
        for report in reports {
            let Some(report) = report else {
                return Err(ScanError::Cancelled);
            };
            if report.scanned {
                stats.scanned_files += 1;
            }
            if let Some(issue) = report.error {
                stats.errors.push(issue);
            }
            for candidate in report.candidates {
                builder.add(candidate);
            }
        }
        Ok(builder.finish(stats))
    }
}

fn extract_file(matchers: &mut Result<matcher::MatcherSet>, file: &walk::SourceFile) -> FileReport {
    let matchers = match matchers {
        Ok(matchers) => matchers,
        Err(err) => {
            return FileReport {
                candidates: Vec::new(),
                error: Some(ScanIssue {
                    file: file.rel_path.clone(),
                    message: format!("matcher init: {err:#}"),
                }),
                scanned: false,
            };
        }
    };
    let source = match util::read_to_string(&file.abs_path) {
        Ok(source) => source,
        Err(err) => {
            warn!(file = %file.rel_path, error = %err, "read failed");
            return FileReport {
                candidates: Vec::new(),
                error: Some(ScanIssue {
                    file: file.rel_path.clone(),
                    message: format!("{err:#}"),
                }),
                scanned: false,
            };
        }
    };
    match matchers.extract(file, &source) {
        Ok(Some((framework, candidates))) => {
            debug!(
                file = %file.rel_path,
                framework,
                count = candidates.len(),
                "extracted"
            );
            FileReport {
                candidates,
                error: None,
                scanned: true,
            }
        }
        Ok(None) => FileReport {
            candidates: Vec::new(),
            error: None,
            scanned: true,
        },
        Err(err) => {
            warn!(file = %file.rel_path, error = %err, "extract failed");
            FileReport {
                candidates: Vec::new(),
                error: Some(ScanIssue {
                    file: file.rel_path.clone(),
                    message: format!("{err:#}"),
                }),
                scanned: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CancelToken, ScanOptions, Scanner};
    use crate::model::ScanError;
    use std::fs;
    use std::time::Duration;

    #[test]
    fn cancelled_token_aborts_before_walking() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.js"), "").unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let scanner = Scanner::new(ScanOptions::default());
        let err = scanner
            .scan_with_cancel(dir.path(), &cancel)
            .expect_err("cancelled scan must not return a result");
        assert!(matches!(err, ScanError::Cancelled));
    }

    #[test]
    fn expired_deadline_cancels() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.js"), "").unwrap();
        let options = ScanOptions {
            timeout: Some(Duration::from_millis(0)),
            ..ScanOptions::default()
        };
        let scanner = Scanner::new(options);
        let err = scanner.scan(dir.path()).expect_err("deadline must cancel");
        assert!(matches!(err, ScanError::Cancelled));
    }
}
