use log::{debug, info};
use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::{InsertionError, Result};

/// Collects the projection files of one exam, ordered by projection index
///
/// Files ending in `.dcm` or `.dicom` are accepted directly; files without an
/// extension are accepted when they carry the `DICM` magic. Files whose stem
/// has no trailing index sort after indexed ones, by name.
///
/// # Errors
///
/// Returns `PreconditionViolation` if `directory` is not a directory.
pub fn collect_projection_files(directory: &Path) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(InsertionError::precondition(format!(
            "{} is not a directory",
            directory.display()
        )));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        match path.extension() {
            Some(ext) => {
                if ext.eq_ignore_ascii_case("dcm") || ext.eq_ignore_ascii_case("dicom") {
                    files.push(path);
                }
            }
            None => {
                if is_dicom_file(&path) {
                    debug!("Found headerless DICOM file: {}", path.display());
                    files.push(path);
                }
            }
        }
    }

    files.sort_by_cached_key(|p| {
        let index = projection_index(p);
        (index.is_none(), index, p.clone())
    });
    info!(
        "Found {} projection files in {}",
        files.len(),
        directory.display()
    );
    Ok(files)
}

/// Trailing integer of the file stem, e.g. `proj_012.dcm` -> 12
pub fn projection_index(path: &Path) -> Option<usize> {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    let re = REGEX.get_or_init(|| Regex::new(r"(\d+)$").expect("Failed to compile regex"));

    let stem = path.file_stem()?.to_str()?;
    re.captures(stem)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Checks for the 4-byte "DICM" magic after the 128-byte preamble
pub fn is_dicom_file(path: &Path) -> bool {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    let mut buffer = [0u8; 132];
    match file.read_exact(&mut buffer) {
        Ok(()) => &buffer[128..132] == b"DICM",
        Err(_) => false,
    }
}
