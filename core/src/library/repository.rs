use log::debug;
use ndarray::Array3;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{InsertionError, Result};
use crate::types::ShapeRecord;

/// Source of calcification voxel payloads
pub trait ShapeRepository {
    /// Loads the `u8` voxel volume of a record, shaped `(Y, X, Z)`
    fn load(&self, record: &ShapeRecord) -> Result<Array3<u8>>;
}

/// Shapes stored as `<root>/<name>.zip`, each holding `<name>/<name>.raw`
#[derive(Debug, Clone)]
pub struct ZipShapeRepository {
    root: PathBuf,
}

impl ZipShapeRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the archive holding a record
    pub fn archive_path(&self, record: &ShapeRecord) -> PathBuf {
        self.root.join(format!("{}.zip", record.archive_name()))
    }
}

impl ShapeRepository for ZipShapeRepository {
    fn load(&self, record: &ShapeRecord) -> Result<Array3<u8>> {
        let path = self.archive_path(record);
        let file = File::open(&path).map_err(|e| {
            InsertionError::ShapeArchiveError(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let mut archive = zip::ZipArchive::new(file)?;

        let name = record.archive_name();
        let entry_name = format!("{}/{}.raw", name, name);
        let mut bytes = Vec::new();
        {
            let mut entry = archive.by_name(&entry_name).map_err(|e| {
                InsertionError::ShapeArchiveError(format!(
                    "{} in {}: {}",
                    entry_name,
                    path.display(),
                    e
                ))
            })?;
            entry.read_to_end(&mut bytes).map_err(|e| {
                InsertionError::ShapeArchiveError(format!(
                    "Failed to extract {} from {}: {}",
                    entry_name,
                    path.display(),
                    e
                ))
            })?;
        }

        debug!("Read {} bytes for {}", bytes.len(), name);
        decode_raw(record, bytes)
    }
}

/// Shapes already extracted as `<root>/<name>/<name>.raw`
#[derive(Debug, Clone)]
pub struct RawShapeRepository {
    root: PathBuf,
}

impl RawShapeRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn raw_path(&self, record: &ShapeRecord) -> PathBuf {
        let name = record.archive_name();
        self.root.join(&name).join(format!("{}.raw", name))
    }
}

impl ShapeRepository for RawShapeRepository {
    fn load(&self, record: &ShapeRecord) -> Result<Array3<u8>> {
        let path = self.raw_path(record);
        let bytes = read_file(&path)?;
        decode_raw(record, bytes)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        InsertionError::ShapeArchiveError(format!("Failed to read {}: {}", path.display(), e))
    })
}

/// Reshapes a raw `u8` payload into the record's `(Y, X, Z)` volume
///
/// # Errors
///
/// Returns `ShapeArchiveError` if the payload length does not match the
/// bounding box or the bounding box is empty.
pub fn decode_raw(record: &ShapeRecord, bytes: Vec<u8>) -> Result<Array3<u8>> {
    if !record.extent.is_non_empty() {
        return Err(InsertionError::ShapeArchiveError(format!(
            "{} has an empty bounding box",
            record.archive_name()
        )));
    }
    let expected = record.extent.voxel_count();
    let found = bytes.len();
    Array3::from_shape_vec(record.volume_shape(), bytes).map_err(|_| {
        InsertionError::ShapeArchiveError(format!(
            "{} holds {} bytes, expected {}",
            record.archive_name(),
            found,
            expected
        ))
    })
}
