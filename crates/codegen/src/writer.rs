use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::CodegenResult;

/// Result of writing one migration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Created(PathBuf),
    /// A file with the same name already existed and was left untouched
    Skipped(PathBuf),
}

impl GenerationOutcome {
    pub fn path(&self) -> &Path {
        match self {
            GenerationOutcome::Created(path) | GenerationOutcome::Skipped(path) => path,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, GenerationOutcome::Created(_))
    }
}

pub struct CodeWriter;

impl CodeWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write `content` unless `path` exists. Parent directories are created.
    pub fn write_if_absent(&self, path: &Path, content: &str) -> CodegenResult<GenerationOutcome> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().write(true).create_new(true).open(path);
        match file {
            Ok(mut file) => {
                file.write_all(content.as_bytes())?;
                Ok(GenerationOutcome::Created(path.to_path_buf()))
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(GenerationOutcome::Skipped(path.to_path_buf())),
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new()
    }
}
