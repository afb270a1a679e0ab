use crate::dockerfile::Dockerfile;
use log::debug;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Where the Dockerfile is written, relative to the source directory.
pub const DEFAULT_DESTINATION: &str = "build/docker/DockerfileNative";

#[derive(Error, Debug)]
pub enum Error {
    #[error("create directory {path}: {err}")]
    CreateDir { err: std::io::Error, path: String },

    #[error("write {path}: {err}")]
    Write { err: std::io::Error, path: String },

    #[error(transparent)]
    IOError(#[from] std::io::Error),
}

/// Write `dockerfile` to `path`, creating parent directories as needed.
///
/// Returns the absolute path of the written file.
pub fn write_dockerfile(path: &Path, dockerfile: &Dockerfile) -> Result<PathBuf, Error> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|err| Error::CreateDir {
            err,
            path: parent.display().to_string(),
        })?;
    }

    debug!("Writing Dockerfile to {}", path.display());
    std::fs::write(path, dockerfile.to_string()).map_err(|err| Error::Write {
        err,
        path: path.display().to_string(),
    })?;

    Ok(std::path::absolute(path)?)
}
