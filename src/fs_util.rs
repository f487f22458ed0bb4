use std::fmt;
use std::fs;

use camino::Utf8Path;
use serde::Serialize;

use crate::error::KiraError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputDirStatus {
    Ready,
    ExistsNonEmpty,
    ExistsAsFile,
    DoesNotExist,
}

impl fmt::Display for OutputDirStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputDirStatus::Ready => write!(f, "ready"),
            OutputDirStatus::ExistsNonEmpty => write!(f, "exists-non-empty"),
            OutputDirStatus::ExistsAsFile => write!(f, "exists-as-file"),
            OutputDirStatus::DoesNotExist => write!(f, "does-not-exist"),
        }
    }
}

pub fn output_dir_status(path: &Utf8Path) -> Result<OutputDirStatus, KiraError> {
    let std_path = path.as_std_path();
    if !std_path.exists() {
        return Ok(OutputDirStatus::DoesNotExist);
    }
    if !std_path.is_dir() {
        return Ok(OutputDirStatus::ExistsAsFile);
    }
    let mut entries =
        fs::read_dir(std_path).map_err(|err| KiraError::Filesystem(err.to_string()))?;
    if entries.next().is_some() {
        return Ok(OutputDirStatus::ExistsNonEmpty);
    }
    Ok(OutputDirStatus::Ready)
}

/// Creates `path` when missing; refuses files and non-empty directories.
pub fn prepare_output_dir(path: &Utf8Path) -> Result<(), KiraError> {
    match output_dir_status(path)? {
        OutputDirStatus::Ready => Ok(()),
        OutputDirStatus::DoesNotExist => fs::create_dir_all(path.as_std_path())
            .map_err(|err| KiraError::Filesystem(err.to_string())),
        status => Err(KiraError::InvalidOutputDir {
            path: path.to_path_buf(),
            status: status.to_string(),
        }),
    }
}

pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), KiraError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| KiraError::Filesystem(err.to_string()))?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(tmp_path.as_std_path(), content)
        .map_err(|err| KiraError::Filesystem(err.to_string()))?;
    fs::rename(tmp_path.as_std_path(), path.as_std_path())
        .map_err(|err| KiraError::Filesystem(err.to_string()))?;
    Ok(())
}
