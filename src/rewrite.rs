use std::{
    collections::BTreeMap,
    fs::Permissions,
    io::Write,
    ops::Range,
    path::{Path, PathBuf},
};

use log::info;
use thiserror::Error;

use crate::{
    imports::{self, SyntaxError},
    model::package::ImportPath,
};

/// Maps a dependency's original import path to its path inside the
/// destination tree. Scoped to a single package.
pub type RewriteMap = BTreeMap<ImportPath, ImportPath>;

/// Word that replaces `import` in a neutralized import comment.
const NEUTRALIZED_KEYWORD: &str = "vendored from";

#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("{}: {source}", path.display())]
    Syntax { path: PathBuf, source: SyntaxError },
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

pub struct Rewriter<'a> {
    rewrites: &'a RewriteMap,
    neutralize_import_comment: bool,
}

impl<'a> Rewriter<'a> {
    pub fn new(rewrites: &'a RewriteMap, neutralize_import_comment: bool) -> Self {
        Rewriter {
            rewrites,
            neutralize_import_comment,
        }
    }

    /// Replaces every import literal found in the rewrite map. All other
    /// text, comments and whitespace included, is left as it was.
    pub fn rewrite_source(&self, source: &str) -> Result<String, SyntaxError> {
        let header = imports::parse_header(source)?;

        let mut edits: Vec<(Range<usize>, String)> = header
            .imports
            .iter()
            .filter_map(|spec| {
                self.rewrites.get(spec.path.as_str()).map(|replacement| {
                    (spec.literal.clone(), imports::quote(replacement.as_str()))
                })
            })
            .collect();
        if self.neutralize_import_comment {
            if let Some(comment) = header.import_comment {
                edits.push((comment.keyword, NEUTRALIZED_KEYWORD.to_owned()));
            }
        }
        edits.sort_by_key(|(range, _)| range.start);

        let mut rewritten = String::with_capacity(source.len());
        let mut last = 0;
        for (range, replacement) in edits {
            rewritten.push_str(&source[last..range.start]);
            rewritten.push_str(&replacement);
            last = range.end;
        }
        rewritten.push_str(&source[last..]);
        Ok(rewritten)
    }

    /// Rewrites `source` into `target`. Returns whether the text changed;
    /// unchanged files are not written. In dry-run mode nothing is written.
    pub fn rewrite_file(
        &self,
        source: &Path,
        target: &Path,
        dry_run: bool,
    ) -> Result<bool, RewriteError> {
        let bytes = std::fs::read(source)?;
        let text = imports::decode(&bytes).map_err(|err| RewriteError::Syntax {
            path: source.to_path_buf(),
            source: err,
        })?;
        let rewritten = self
            .rewrite_source(text)
            .map_err(|err| RewriteError::Syntax {
                path: source.to_path_buf(),
                source: err,
            })?;

        // The target is either the source itself or a fresh copy of it.
        if rewritten == text {
            return Ok(false);
        }

        info!("Rewriting imports in {}", target.display());
        if !dry_run {
            let permissions = std::fs::metadata(source)?.permissions();
            write_atomically(target, &rewritten, permissions)?;
        }
        Ok(true)
    }
}

/// Writes through a temporary file in the target directory that is then
/// renamed over `target`, so readers never observe a partial file.
fn write_atomically(
    target: &Path,
    contents: &str,
    permissions: Permissions,
) -> std::io::Result<()> {
    let dir = target.parent().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} has no parent directory", target.display()),
        )
    })?;
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;
    file.as_file().set_permissions(permissions)?;
    file.persist(target).map_err(|err| err.error)?;
    Ok(())
}
