//! Name-based include/exclude filtering of candidate files

use crate::error::{Error, Result};
use crate::files::File;
use regex::Regex;

/// Names that are never uploaded (OS metadata files).
pub const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// A list of compiled regular expressions with find-anywhere semantics.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    /// Compile every pattern, naming `field` in the error on failure.
    pub fn compile<S: AsRef<str>>(field: &'static str, patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|source| Error::InvalidPattern {
                    field,
                    pattern: p.as_ref().to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True when any pattern matches somewhere in `name`.
    pub fn matches_any(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(name))
    }
}

/// Include, exclude and ignore predicates, compiled once at configuration time.
#[derive(Debug, Clone)]
pub struct FileFilter {
    include: PatternSet,
    exclude: PatternSet,
    ignored: PatternSet,
}

impl FileFilter {
    pub fn new<S: AsRef<str>, T: AsRef<str>, U: AsRef<str>>(
        include: &[S],
        exclude: &[T],
        ignored: &[U],
    ) -> Result<Self> {
        Ok(Self {
            include: PatternSet::compile("include", include)?,
            exclude: PatternSet::compile("exclude", exclude)?,
            ignored: PatternSet::compile("ignored", ignored)?,
        })
    }

    /// Filter with the built-in ignored list.
    pub fn with_default_ignores<S: AsRef<str>, T: AsRef<str>>(
        include: &[S],
        exclude: &[T],
    ) -> Result<Self> {
        Self::new(include, exclude, IGNORED_FILES)
    }

    pub fn is_included(&self, name: &str) -> bool {
        // An empty include list keeps everything.
        self.include.is_empty() || self.include.matches_any(name)
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.matches_any(name)
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.matches_any(name)
    }

    pub fn retains(&self, file: &File) -> bool {
        self.is_included(&file.name) && !self.is_excluded(&file.name) && !self.is_ignored(&file.name)
    }

    pub fn apply(&self, files: Vec<File>) -> Vec<File> {
        files.into_iter().filter(|f| self.retains(f)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: &[&str] = &[];

    fn file(name: &str) -> File {
        File::new(name, format!("dist/{}", name))
    }

    fn names(files: &[File]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_empty_include_matches_everything() {
        let filter = FileFilter::with_default_ignores(NONE, &["\\.css$"]).unwrap();
        let files = vec![file("a.js"), file(".DS_Store"), file("b.css")];
        assert_eq!(names(&filter.apply(files)), vec!["a.js"]);
    }

    #[test]
    fn test_include_restricts_by_name() {
        let filter = FileFilter::new(&["^img/"], NONE, NONE).unwrap();
        let files = vec![file("img/logo.png"), file("js/img/x.png"), file("main.js")];
        assert_eq!(names(&filter.apply(files)), vec!["img/logo.png"]);
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let filter = FileFilter::with_default_ignores(&["\\.js"], &["\\.map$"]).unwrap();
        let files = vec![file("app.js"), file("app.js.map")];
        assert_eq!(names(&filter.apply(files)), vec!["app.js"]);
    }

    #[test]
    fn test_patterns_match_name_not_path() {
        let filter = FileFilter::with_default_ignores(NONE, &["^dist"]).unwrap();
        assert!(filter.retains(&file("app.js")));
    }

    #[test]
    fn test_patterns_match_anywhere_in_name() {
        let filter = FileFilter::new(&["vendor"], NONE, NONE).unwrap();
        assert!(filter.is_included("js/vendor.bundle.js"));
        assert!(!filter.is_included("main.js"));
    }

    #[test]
    fn test_invalid_pattern_names_field() {
        let err = FileFilter::with_default_ignores(NONE, &["("]).unwrap_err();
        match err {
            Error::InvalidPattern { field, pattern, .. } => {
                assert_eq!(field, "exclude");
                assert_eq!(pattern, "(");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_pattern_set_len() {
        let set = PatternSet::compile("include", &["a", "b"]).unwrap();
        assert_eq!(set.len(), 2);
        assert!(!set.is_empty());
    }
}
