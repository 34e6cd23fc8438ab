use std::{
    fs::{File, OpenOptions, Permissions},
    path::{Path, PathBuf},
};

use log::{info, trace};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CopyError {
    #[error("Destination file {} already exists", .0.display())]
    AlreadyExists(PathBuf),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedFile {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Copies the files of one package directory. Subdirectories are separate
/// packages and are never descended into.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryCopier {
    dry_run: bool,
}

impl DirectoryCopier {
    pub fn new(dry_run: bool) -> Self {
        DirectoryCopier { dry_run }
    }

    pub fn copy(
        &self,
        destination_dir: &Path,
        source_dir: &Path,
    ) -> Result<Vec<CopiedFile>, CopyError> {
        let mut files: Vec<(CopiedFile, Permissions)> = Vec::new();
        for entry in std::fs::read_dir(source_dir)? {
            let entry = entry?;
            let from = entry.path();
            let metadata = std::fs::metadata(&from)?;
            if !metadata.is_file() {
                trace!("Skipping {}: not a regular file", from.display());
                continue;
            }
            let to = destination_dir.join(entry.file_name());
            files.push((CopiedFile { from, to }, metadata.permissions()));
        }
        files.sort_by(|(a, _), (b, _)| a.from.cmp(&b.from));

        // Refuse before touching anything so a conflict never leaves a
        // half-copied package behind.
        if let Some((file, _)) = files
            .iter()
            .find(|(file, _)| file.to.symlink_metadata().is_ok())
        {
            return Err(CopyError::AlreadyExists(file.to.clone()));
        }

        if !self.dry_run {
            std::fs::create_dir_all(destination_dir)?;
        }
        for (file, permissions) in &files {
            info!("Copying {} to {}", file.from.display(), file.to.display());
            if !self.dry_run {
                copy_file(&file.to, &file.from, permissions.clone())?;
            }
        }

        Ok(files.into_iter().map(|(file, _)| file).collect())
    }
}

fn copy_file(to: &Path, from: &Path, permissions: Permissions) -> Result<(), CopyError> {
    let mut input = File::open(from)?;
    let mut output = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(to)
        .map_err(|err| match err.kind() {
            std::io::ErrorKind::AlreadyExists => CopyError::AlreadyExists(to.to_path_buf()),
            _ => CopyError::IO(err),
        })?;
    std::io::copy(&mut input, &mut output)?;
    output.set_permissions(permissions)?;
    Ok(())
}
