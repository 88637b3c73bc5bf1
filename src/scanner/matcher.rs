use crate::model::RouteCandidate;
use crate::scanner::walk::SourceFile;
use crate::scanner::{javascript, nestjs, python};
use anyhow::Result;

/// One recognized framework idiom. Matchers are tried in priority order and
/// the first whose file-level signature matches claims the file, so a
/// registration is never counted under two interpretations.
pub trait FrameworkMatcher: Send {
    fn framework(&self) -> &'static str;
    fn languages(&self) -> &'static [&'static str];
    /// Cheap file-level signature check; no parsing.
    fn detect(&self, source: &str) -> bool;
    fn extract(&mut self, file: &SourceFile, source: &str) -> Result<Vec<RouteCandidate>>;
}

pub struct MatcherSet {
    matchers: Vec<Box<dyn FrameworkMatcher>>,
}

impl MatcherSet {
    /// The declared framework set, most specific signatures first. Express
    /// goes last among the JS matchers: its detection doubles as the
    /// generic router-receiver fallback.
    pub fn new() -> Result<MatcherSet> {
        Ok(MatcherSet {
            matchers: vec![
                Box::new(nestjs::NestMatcher::new()?),
                Box::new(javascript::FastifyMatcher::new()?),
                Box::new(javascript::ExpressMatcher::new()?),
                Box::new(python::FastapiMatcher::new()?),
                Box::new(python::FlaskMatcher::new()?),
            ],
        })
    }

    /// Attribute `file` to the first matching framework and extract its
    /// candidates. `None` when no matcher claims the file.
    pub fn extract(
        &mut self,
        file: &SourceFile,
        source: &str,
    ) -> Result<Option<(&'static str, Vec<RouteCandidate>)>> {
        for matcher in &mut self.matchers {
            if !matcher.languages().contains(&file.language) {
                continue;
            }
            if !matcher.detect(source) {
                continue;
            }
            let candidates = matcher.extract(file, source)?;
            return Ok(Some((matcher.framework(), candidates)));
        }
        Ok(None)
    }
}
