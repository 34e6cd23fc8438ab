//! Scanner for the package clause and import declarations of Go source files.
//!
//! Only the header of a file is examined: scanning stops at the first
//! top-level declaration that is not an import. Every recognised element keeps
//! its byte span so callers can splice replacements into the original text
//! without disturbing comments or formatting.

use std::{ops::Range, sync::OnceLock};

use regex_lite::Regex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{line}:{column}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// One import spec, e.g. `name "path"` inside an import declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    pub name: Option<String>,
    pub path: String,
    /// Span of the quoted literal, quotes included.
    pub literal: Range<usize>,
}

/// A `// import "path"` comment attached to the package clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportComment {
    /// Span of the `import` keyword inside the comment.
    pub keyword: Range<usize>,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceHeader {
    pub package: String,
    pub imports: Vec<ImportSpec>,
    pub import_comment: Option<ImportComment>,
    /// The file carries an `ignore` build constraint.
    pub build_ignored: bool,
}

/// Decodes file contents, reporting the position of the first invalid byte.
pub fn decode(bytes: &[u8]) -> Result<&str, SyntaxError> {
    std::str::from_utf8(bytes).map_err(|err| {
        let valid = &bytes[..err.valid_up_to()];
        let line = valid.iter().filter(|b| **b == b'\n').count() + 1;
        let line_start = valid.iter().rposition(|b| *b == b'\n').map_or(0, |i| i + 1);
        let column = valid.len() - line_start + 1;
        SyntaxError {
            line,
            column,
            message: "invalid UTF-8 encoding".to_owned(),
        }
    })
}

pub fn parse_header(source: &str) -> Result<SourceHeader, SyntaxError> {
    let mut scanner = Scanner::new(source);
    scanner.eat('\u{feff}');

    let leading = scanner.skip_trivia()?;
    let build_ignored = leading.iter().any(|comment| is_ignore_constraint(comment));

    let start = scanner.pos;
    if scanner.ident() != Some("package") {
        return Err(scanner.error_at(start, "expected 'package' clause"));
    }
    scanner.skip_trivia()?;
    let start = scanner.pos;
    let package = match scanner.ident() {
        Some(name) => name.to_owned(),
        None => return Err(scanner.error_at(start, "expected package name")),
    };
    let import_comment = scanner.import_comment();

    let mut imports = Vec::new();
    loop {
        scanner.skip_trivia_and_semicolons()?;
        let save = scanner.pos;
        if scanner.ident() != Some("import") {
            scanner.pos = save;
            break;
        }
        scanner.skip_trivia()?;
        if scanner.eat('(') {
            loop {
                scanner.skip_trivia_and_semicolons()?;
                if scanner.eat(')') {
                    break;
                }
                if scanner.peek().is_none() {
                    return Err(scanner.error_at(scanner.pos, "unterminated import group"));
                }
                imports.push(scanner.import_spec()?);
            }
        } else {
            imports.push(scanner.import_spec()?);
        }
    }

    Ok(SourceHeader {
        package,
        imports,
        import_comment,
        build_ignored,
    })
}

/// Formats `value` as an interpreted Go string literal.
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            c if (c as u32) < 0x80 && c.is_control() => {
                quoted.push_str(&format!("\\x{:02x}", c as u32))
            }
            c if c.is_control() => quoted.push_str(&format!("\\u{:04x}", c as u32)),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

fn is_ignore_constraint(comment: &str) -> bool {
    static CONSTRAINT: OnceLock<Regex> = OnceLock::new();
    CONSTRAINT
        .get_or_init(|| Regex::new(r"^//(?:go:build|\s*\+build)\s+ignore\s*$").unwrap())
        .is_match(comment)
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Scanner { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn error_at(&self, at: usize, message: impl Into<String>) -> SyntaxError {
        let before = &self.src[..at];
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        SyntaxError {
            line: before.matches('\n').count() + 1,
            column: before[line_start..].chars().count() + 1,
            message: message.into(),
        }
    }

    /// Skips whitespace and comments, returning the text of line comments.
    fn skip_trivia(&mut self) -> Result<Vec<&'a str>, SyntaxError> {
        let mut comments = Vec::new();
        loop {
            let rest = self.rest();
            if let Some(c) = rest.chars().next().filter(|c| c.is_ascii_whitespace()) {
                self.pos += c.len_utf8();
            } else if rest.starts_with("//") {
                let end = rest.find('\n').unwrap_or(rest.len());
                comments.push(rest[..end].trim_end_matches('\r'));
                self.pos += end;
            } else if rest.starts_with("/*") {
                match rest[2..].find("*/") {
                    Some(end) => self.pos += end + 4,
                    None => return Err(self.error_at(self.pos, "comment not terminated")),
                }
            } else {
                return Ok(comments);
            }
        }
    }

    fn skip_trivia_and_semicolons(&mut self) -> Result<(), SyntaxError> {
        loop {
            self.skip_trivia()?;
            if !self.eat(';') {
                return Ok(());
            }
        }
    }

    fn ident(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let first = rest.chars().next()?;
        if !(first.is_alphabetic() || first == '_') {
            return None;
        }
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
            .map_or(rest.len(), |(i, _)| i);
        self.pos += len;
        Some(&rest[..len])
    }

    fn import_spec(&mut self) -> Result<ImportSpec, SyntaxError> {
        let name = if self.eat('.') {
            Some(".".to_owned())
        } else {
            self.ident().map(str::to_owned)
        };
        if name.is_some() {
            self.skip_trivia()?;
        }
        let start = self.pos;
        if !matches!(self.peek(), Some('"') | Some('`')) {
            return Err(self.error_at(start, "expected import path string"));
        }
        let path = self.string_literal()?;
        Ok(ImportSpec {
            name,
            path,
            literal: start..self.pos,
        })
    }

    fn string_literal(&mut self) -> Result<String, SyntaxError> {
        let start = self.pos;
        let (value, len) = scan_string(self.rest()).map_err(|(offset, message)| {
            self.error_at(start + offset, message)
        })?;
        self.pos += len;
        Ok(value)
    }

    /// Looks for `// import "path"` or `/* import "path" */` on the rest of
    /// the package clause line. Never fails: anything else is an ordinary
    /// comment.
    fn import_comment(&self) -> Option<ImportComment> {
        let rest = self.rest();
        let blanks = rest.len() - rest.trim_start_matches([' ', '\t']).len();
        let comment = &rest[blanks..];
        let body = if comment.starts_with("//") {
            &comment[2..comment.find('\n').unwrap_or(comment.len())]
        } else if comment.starts_with("/*") {
            &comment[2..2 + comment[2..].find("*/")?]
        } else {
            return None;
        };
        let trimmed = body.trim_start();
        let after = trimmed.strip_prefix("import")?;
        if !after.starts_with([' ', '\t']) {
            return None;
        }
        let (path, _) = scan_string(after.trim_start()).ok()?;
        let keyword_start = self.pos + blanks + 2 + (body.len() - trimmed.len());
        Some(ImportComment {
            keyword: keyword_start..keyword_start + "import".len(),
            path,
        })
    }
}

/// Scans a Go string literal at the start of `s`, returning its value and
/// length in bytes. Errors carry the byte offset of the problem.
fn scan_string(s: &str) -> Result<(String, usize), (usize, &'static str)> {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, '`')) => {
            let end = s[1..]
                .find('`')
                .ok_or((0, "raw string literal not terminated"))?;
            Ok((s[1..1 + end].replace('\r', ""), end + 2))
        }
        Some((_, '"')) => {
            let mut bytes = Vec::new();
            while let Some((i, c)) = chars.next() {
                match c {
                    '"' => {
                        let value = String::from_utf8(bytes)
                            .map_err(|_| (0, "invalid UTF-8 in string literal"))?;
                        return Ok((value, i + 1));
                    }
                    '\n' => break,
                    '\\' => push_escape(&mut chars, &mut bytes, i)?,
                    c => {
                        let mut buf = [0; 4];
                        bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                    }
                }
            }
            Err((0, "string literal not terminated"))
        }
        _ => Err((0, "expected string literal")),
    }
}

/// Decodes the escape sequence following a backslash at byte offset `at`.
fn push_escape(
    chars: &mut std::str::CharIndices<'_>,
    bytes: &mut Vec<u8>,
    at: usize,
) -> Result<(), (usize, &'static str)> {
    let (_, escape) = chars.next().ok_or((at, "unterminated escape sequence"))?;
    match escape {
        'a' => bytes.push(0x07),
        'b' => bytes.push(0x08),
        'f' => bytes.push(0x0c),
        'n' => bytes.push(b'\n'),
        'r' => bytes.push(b'\r'),
        't' => bytes.push(b'\t'),
        'v' => bytes.push(0x0b),
        '\\' => bytes.push(b'\\'),
        '"' => bytes.push(b'"'),
        'x' => bytes.push(hex_escape(chars, 2, at)? as u8),
        'u' | 'U' => {
            let digits = if escape == 'u' { 4 } else { 8 };
            let code = hex_escape(chars, digits, at)?;
            let c = char::from_u32(code).ok_or((at, "invalid Unicode code point"))?;
            let mut buf = [0; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
        '0'..='7' => {
            let mut value = escape as u32 - '0' as u32;
            for _ in 0..2 {
                let (_, digit) = chars.next().ok_or((at, "invalid octal escape"))?;
                let digit = digit.to_digit(8).ok_or((at, "invalid octal escape"))?;
                value = value * 8 + digit;
            }
            if value > 255 {
                return Err((at, "octal escape value out of range"));
            }
            bytes.push(value as u8);
        }
        _ => return Err((at, "unknown escape sequence")),
    }
    Ok(())
}

fn hex_escape(
    chars: &mut std::str::CharIndices<'_>,
    digits: usize,
    at: usize,
) -> Result<u32, (usize, &'static str)> {
    let mut value = 0;
    for _ in 0..digits {
        let (_, digit) = chars.next().ok_or((at, "invalid hex escape"))?;
        value = value * 16 + digit.to_digit(16).ok_or((at, "invalid hex escape"))?;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn paths(header: &SourceHeader) -> Vec<&str> {
        header.imports.iter().map(|spec| spec.path.as_str()).collect()
    }

    #[test]
    fn parse_single_and_grouped_imports() {
        let source = r#"// Copyright notice.

// Package app does things.
package app

import "fmt"

import (
	"os"
	str "strings"
	. "math"
	_ "embed" // side effects

	"github.com/user/lib"
)

func main() {}
"#;
        let header = parse_header(source).unwrap();
        assert_eq!(header.package, "app");
        assert_eq!(
            paths(&header),
            vec!["fmt", "os", "strings", "math", "embed", "github.com/user/lib"]
        );
        let names: Vec<Option<&str>> = header.imports.iter().map(|s| s.name.as_deref()).collect();
        assert_eq!(
            names,
            vec![None, None, Some("str"), Some("."), Some("_"), None]
        );
        assert_eq!(header.import_comment, None);
        assert!(!header.build_ignored);
        for spec in &header.imports {
            assert_eq!(&source[spec.literal.clone()], quote(&spec.path));
        }
    }

    #[test]
    fn parse_semicolons_and_comments_between_tokens() {
        let source = "package p; import /* a */ \"a\"; import ( \"b\"; `c` ); var x = 1";
        let header = parse_header(source).unwrap();
        assert_eq!(paths(&header), vec!["a", "b", "c"]);
    }

    #[test]
    fn stop_at_first_declaration() {
        let source =
            "package p\n\nimport \"a\"\n\nconst importantName = \"x\"\n\nimport \"late\"\n";
        let header = parse_header(source).unwrap();
        assert_eq!(paths(&header), vec!["a"]);
    }

    #[test]
    fn parse_import_comment() {
        let source = "package lib // import \"example.com/lib\"\n\nimport \"fmt\"\n";
        let header = parse_header(source).unwrap();
        let comment = header.import_comment.unwrap();
        assert_eq!(comment.path, "example.com/lib");
        assert_eq!(&source[comment.keyword], "import");

        let source = "package lib /* import \"example.com/lib\" */\n";
        let comment = parse_header(source).unwrap().import_comment.unwrap();
        assert_eq!(comment.path, "example.com/lib");
        assert_eq!(&source[comment.keyword], "import");
    }

    #[test]
    fn ignore_comment_on_next_line() {
        let source = "package lib\n// import \"example.com/lib\"\n";
        assert_eq!(parse_header(source).unwrap().import_comment, None);
        let source = "package lib // imported \"example.com/lib\"\n";
        assert_eq!(parse_header(source).unwrap().import_comment, None);
    }

    #[test]
    fn detect_ignore_build_constraint() {
        for constraint in ["//go:build ignore", "// +build ignore"] {
            let source = format!("{constraint}\n\npackage main\n\nimport \"os\"\n");
            assert!(parse_header(&source).unwrap().build_ignored, "{constraint}");
        }
        let source = "//go:build linux\n\npackage main\n";
        assert!(!parse_header(source).unwrap().build_ignored);
    }

    #[test]
    fn unquote_escapes() {
        let source = r#"package p; import "a\x2fbé\101\\""#;
        let header = parse_header(source).unwrap();
        assert_eq!(paths(&header), vec!["a/béA\\"]);
    }

    #[test]
    fn report_syntax_errors() {
        let cases = [
            ("func main() {}", 1, 1, "expected 'package' clause"),
            ("package\n", 2, 1, "expected package name"),
            ("package p\nimport (\n\t\"a\"\n", 4, 1, "unterminated import group"),
            ("package p\nimport \"a\n", 2, 8, "string literal not terminated"),
            ("package p\nimport 42\n", 2, 8, "expected import path string"),
            ("/* open\npackage p\n", 1, 1, "comment not terminated"),
        ];
        for (source, line, column, message) in cases {
            let err = parse_header(source).unwrap_err();
            assert_eq!(
                err,
                SyntaxError {
                    line,
                    column,
                    message: message.to_owned()
                },
                "{source:?}"
            );
        }
    }

    #[test]
    fn decode_reports_position_of_invalid_byte() {
        let err = decode(b"package p\nimport \"\xff\"").unwrap_err();
        assert_eq!((err.line, err.column), (2, 9));
    }

    #[test]
    fn quote_escapes_special_characters() {
        assert_eq!(quote("github.com/a/b"), "\"github.com/a/b\"");
        assert_eq!(quote("a\"b\\c"), "\"a\\\"b\\\\c\"");
    }
}
