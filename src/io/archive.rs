use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};
use zip::CompressionMethod;
use zip::write::FileOptions;

use crate::error::{Result, ToolError};

/// Zips every regular file located directly inside `source_dir` into
/// `destination`. Entries are stored under their file name, sorted.
/// Returns the archived entry names.
#[instrument(
    level = "info",
    skip_all,
    fields(source = %source_dir.display(), destination = %destination.display())
)]
pub fn archive_directory(source_dir: &Path, destination: &Path) -> Result<Vec<String>> {
    if !source_dir.is_dir() {
        return Err(ToolError::NothingToArchive(source_dir.to_path_buf()));
    }

    let skip = fs::canonicalize(destination).ok();
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(source_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if skip.is_some() && fs::canonicalize(&path).ok() == skip {
            continue;
        }
        files.push(path);
    }
    files.sort();

    if files.is_empty() {
        return Err(ToolError::NothingToArchive(source_dir.to_path_buf()));
    }

    if let Some(parent) = destination.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut zip = zip::ZipWriter::new(File::create(destination)?);
    let options: FileOptions<'_, ()> =
        FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut names = Vec::with_capacity(files.len());
    for path in files {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        zip.start_file(name.as_str(), options)?;
        io::copy(&mut File::open(&path)?, &mut zip)?;
        debug!(entry = %name, "added file to archive");
        names.push(name);
    }
    zip.finish()?;

    info!(file_count = names.len(), "archive written");
    Ok(names)
}
