//! Reading uploads from and writing downloads to the local filesystem.

use std::io::Read as _;
use std::path::Path;

use cap_std::{ambient_authority, fs::Dir};

use super::error::CliError;
use crate::domain::endpoints::Upload;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Load `path` as a multipart upload, guessing its content type.
pub(crate) fn read_upload(path: &Path) -> Result<Upload, CliError> {
    let (directory, file_name) = open_parent(path, "read")?;
    let mut file = directory
        .open(Path::new(&file_name))
        .map_err(|error| CliError::file("read", path, error))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|error| CliError::file("read", path, error))?;
    Ok(Upload {
        content_type: Some(content_type_for(path).to_owned()),
        file_name,
        bytes,
    })
}

/// Write `bytes` to `path`, replacing any existing file.
pub(crate) fn write_output(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    let (directory, file_name) = open_parent(path, "write")?;
    directory
        .write(Path::new(&file_name), bytes)
        .map_err(|error| CliError::file("write", path, error))
}

fn open_parent(path: &Path, action: &'static str) -> Result<(Dir, String), CliError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            CliError::file(
                action,
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "path must name a file"),
            )
        })?;
    let directory = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|error| CliError::file(action, parent, error))?;
    Ok((directory, file_name))
}

/// MIME type inferred from the file extension.
pub(crate) fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => FALLBACK_CONTENT_TYPE,
    }
}
