use std::{borrow::Borrow, collections::BTreeSet, fmt::Display, path::PathBuf};

use super::ParseError;
use crate::imports::SyntaxError;

/// Import of the cgo pseudo-package. It never resolves to a directory.
pub const CGO_PSEUDO_IMPORT: &str = "C";

const FORBIDDEN_CHARACTERS: &str = "!\"#$%&'()*,:;<=>?[\\]^`{|}\u{FFFD}";

/// Canonical path identifying a Go package, e.g. `github.com/user/proj`.
#[derive(Clone, Hash, Debug, PartialEq, Eq, Ord, PartialOrd)]
pub struct ImportPath(String);

impl ImportPath {
    pub fn new(value: impl Into<String>) -> Result<Self, ParseError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ParseError::EmptyImportPath);
        }
        if value == "." || value == ".." || value.starts_with("./") || value.starts_with("../") {
            return Err(ParseError::RelativeImportPath(value));
        }
        if value.starts_with('/') || value.ends_with('/') {
            return Err(ParseError::InvalidImportPath(
                value,
                "leading or trailing slash",
            ));
        }
        if value
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_CHARACTERS.contains(c))
        {
            return Err(ParseError::InvalidImportPath(value, "forbidden character"));
        }
        for element in value.split('/') {
            match element {
                "" => return Err(ParseError::InvalidImportPath(value, "empty path element")),
                "." | ".." => {
                    return Err(ParseError::InvalidImportPath(value, "dot path element"))
                }
                _ => {}
            }
        }
        Ok(ImportPath(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn elements(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Element-aware prefix test: `a/b` is a prefix of `a/b` and `a/b/c` but
    /// not of `a/bc`. A prefix ending with `/` matches as a raw string prefix.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        if prefix.is_empty() || !self.0.starts_with(prefix) {
            return false;
        }
        self.0.len() == prefix.len()
            || prefix.ends_with('/')
            || self.0.as_bytes()[prefix.len()] == b'/'
    }

    pub fn join(&self, other: &ImportPath) -> ImportPath {
        ImportPath(format!("{}/{}", self.0, other.0))
    }

    pub fn is_cgo(&self) -> bool {
        self.0 == CGO_PSEUDO_IMPORT
    }

    /// Standard library paths have no dot in their first element.
    pub fn looks_standard(&self) -> bool {
        self.elements()
            .next()
            .is_some_and(|first| !first.contains('.'))
    }

    /// Relative filesystem path of the package below a `src` directory.
    pub fn to_path(&self) -> PathBuf {
        self.elements().collect()
    }
}

impl Display for ImportPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ImportPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Role a source file plays inside its package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Go,
    Cgo,
    Test,
    XTest,
}

/// A source file whose header could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidFile {
    pub name: String,
    pub error: SyntaxError,
}

/// A resolved Go package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub import_path: ImportPath,
    pub name: String,
    pub dir: PathBuf,
    /// Part of the standard distribution under GOROOT.
    pub goroot: bool,
    pub go_files: Vec<String>,
    pub cgo_files: Vec<String>,
    pub test_go_files: Vec<String>,
    pub xtest_go_files: Vec<String>,
    pub imports: BTreeSet<ImportPath>,
    pub test_imports: BTreeSet<ImportPath>,
    pub xtest_imports: BTreeSet<ImportPath>,
    pub invalid_go_files: Vec<InvalidFile>,
}

impl Package {
    pub fn new(import_path: ImportPath, dir: PathBuf, goroot: bool) -> Self {
        Package {
            import_path,
            name: String::new(),
            dir,
            goroot,
            go_files: Vec::new(),
            cgo_files: Vec::new(),
            test_go_files: Vec::new(),
            xtest_go_files: Vec::new(),
            imports: BTreeSet::new(),
            test_imports: BTreeSet::new(),
            xtest_imports: BTreeSet::new(),
            invalid_go_files: Vec::new(),
        }
    }

    pub fn add_file(
        &mut self,
        role: FileRole,
        file_name: String,
        imports: impl IntoIterator<Item = ImportPath>,
    ) {
        let (files, set) = match role {
            FileRole::Go => (&mut self.go_files, &mut self.imports),
            FileRole::Cgo => (&mut self.cgo_files, &mut self.imports),
            FileRole::Test => (&mut self.test_go_files, &mut self.test_imports),
            FileRole::XTest => (&mut self.xtest_go_files, &mut self.xtest_imports),
        };
        files.push(file_name);
        set.extend(imports);
    }

    /// All source files in role order: regular, cgo, test, external test.
    pub fn source_files(&self) -> impl Iterator<Item = &str> {
        self.go_files
            .iter()
            .chain(&self.cgo_files)
            .chain(&self.test_go_files)
            .chain(&self.xtest_go_files)
            .map(String::as_str)
    }

    pub fn has_source_files(&self) -> bool {
        self.source_files().next().is_some()
    }

    /// Union of regular, test and external test imports, without the cgo
    /// pseudo-import and without the package itself.
    pub fn dependencies(&self) -> BTreeSet<ImportPath> {
        self.imports
            .iter()
            .chain(&self.test_imports)
            .chain(&self.xtest_imports)
            .filter(|import| !import.is_cgo() && **import != self.import_path)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn path(s: &str) -> ImportPath {
        ImportPath::new(s).unwrap()
    }

    #[test]
    fn parse_valid_import_paths() {
        for valid in ["fmt", "net/http", "github.com/user/proj", "gopkg.in/yaml.v2", "C"] {
            assert_eq!(ImportPath::new(valid).unwrap().as_str(), valid);
        }
    }

    #[test]
    fn reject_invalid_import_paths() {
        assert_eq!(ImportPath::new(""), Err(ParseError::EmptyImportPath));
        assert_eq!(
            ImportPath::new("./foo"),
            Err(ParseError::RelativeImportPath("./foo".to_owned()))
        );
        for invalid in ["/abs", "trailing/", "a//b", "a/../b", "a b", "a\\b", "a\"b"] {
            assert!(
                matches!(
                    ImportPath::new(invalid),
                    Err(ParseError::InvalidImportPath(_, _))
                ),
                "{invalid} should be rejected"
            );
        }
    }

    #[test]
    fn prefix_is_element_aware() {
        let p = path("github.com/user/proj");
        assert!(p.has_prefix("github.com/user/proj"));
        assert!(p.has_prefix("github.com/user"));
        assert!(p.has_prefix("github.com/"));
        assert!(!p.has_prefix("github.com/use"));
        assert!(!p.has_prefix("github.com/user/proj/sub"));
        assert!(!p.has_prefix(""));
    }

    #[test]
    fn join_and_to_path() {
        let joined = path("example.com/me/vendor").join(&path("github.com/dep/lib"));
        assert_eq!(joined.as_str(), "example.com/me/vendor/github.com/dep/lib");
        assert_eq!(
            joined.to_path(),
            ["example.com", "me", "vendor", "github.com", "dep", "lib"]
                .iter()
                .collect::<PathBuf>()
        );
    }

    #[test]
    fn standard_heuristic() {
        assert!(path("fmt").looks_standard());
        assert!(path("net/http").looks_standard());
        assert!(!path("github.com/user/proj").looks_standard());
    }

    #[test]
    fn dependencies_are_deduplicated_union() {
        let mut package = Package::new(path("example.com/a"), PathBuf::from("/src/a"), false);
        package.add_file(
            FileRole::Cgo,
            "a.go".to_owned(),
            [path("C"), path("example.com/b")],
        );
        package.add_file(
            FileRole::Test,
            "a_test.go".to_owned(),
            [path("example.com/b"), path("testing")],
        );
        package.add_file(
            FileRole::XTest,
            "x_test.go".to_owned(),
            [path("example.com/a"), path("example.com/c")],
        );

        let deps: Vec<String> = package
            .dependencies()
            .into_iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(deps, vec!["example.com/b", "example.com/c", "testing"]);
        assert_eq!(
            package.source_files().collect::<Vec<_>>(),
            vec!["a.go", "a_test.go", "x_test.go"]
        );
    }
}
