use thiserror::Error;

pub mod package;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Import path is empty")]
    EmptyImportPath,
    #[error("Invalid import path `{0}`: {1}")]
    InvalidImportPath(String, &'static str),
    #[error("Relative import paths are not supported: `{0}`")]
    RelativeImportPath(String),
}
