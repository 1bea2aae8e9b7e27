use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use glob::Pattern;

/// Shell-glob patterns matched against the joined relative path of a record.
///
/// `*` also matches `/`, so `*.tmp` excludes temporary files at any depth.
#[derive(Debug, Clone, Default)]
pub struct Excludes {
    patterns: Vec<Pattern>,
}

impl Excludes {
    pub fn new<S: AsRef<str>>(patterns: impl IntoIterator<Item = S>) -> Result<Self> {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Pattern::new(p).or_raise(|| ErrorKind::InvalidPattern(p.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Pattern::as_str)
    }

    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("*.tmp", "cache/deep/file.tmp", true)]
    #[case("*.tmp", "file.tmp.bak", false)]
    #[case("build/*", "build/out/bin", true)]
    #[case("build/*", "src/build/out", false)]
    #[case("*/.git/*", "repo/.git/HEAD", true)]
    #[case("photo?.jpg", "photo1.jpg", true)]
    #[case("[abc].txt", "d.txt", false)]
    fn test_matches(#[case] pattern: &str, #[case] path: &str, #[case] expected: bool) {
        let excludes = Excludes::new([pattern]).unwrap();
        assert_eq!(excludes.matches(path), expected);
    }

    #[test]
    fn test_any_pattern_matches() {
        let excludes = Excludes::new(["*.tmp", "*.log"]).unwrap();
        assert!(excludes.matches("var/app.log"));
        assert!(!excludes.matches("var/app.txt"));
        assert_eq!(excludes.patterns().collect::<Vec<_>>(), vec!["*.tmp", "*.log"]);
    }

    #[test]
    fn test_invalid_pattern() {
        let err = Excludes::new(["ok/*", "[unclosed"]).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPattern(p) if p == "[unclosed"));
    }

    #[test]
    fn test_empty() {
        let excludes = Excludes::new(Vec::<String>::new()).unwrap();
        assert!(excludes.is_empty());
        assert!(!excludes.matches("anything"));
    }
}
