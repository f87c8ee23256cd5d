use calamine::{open_workbook_auto, Data, Reader};
use log::debug;
use rand::Rng;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

use crate::error::{InsertionError, Result};
use crate::types::{ShapeRecord, Window3};

const COLUMNS: [&str; 5] = ["Type", "FileName", "BB_CountX", "BB_CountY", "BB_CountZ"];

/// Extensions read as spreadsheets rather than CSV
const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// One catalog line; columns other than these are ignored
#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "FileName")]
    file_name: String,
    #[serde(rename = "BB_CountX")]
    count_x: usize,
    #[serde(rename = "BB_CountY")]
    count_y: usize,
    #[serde(rename = "BB_CountZ")]
    count_z: usize,
}

impl From<CatalogRow> for ShapeRecord {
    fn from(row: CatalogRow) -> Self {
        ShapeRecord::new(
            row.kind,
            row.file_name,
            Window3::new(row.count_x, row.count_y, row.count_z),
        )
    }
}

/// In-memory shape catalog
///
/// # Example
///
/// ```
/// use mcinsert_core::ShapeCatalog;
///
/// let csv = "Type,FileName,BB_CountX,BB_CountY,BB_CountZ\n\
///            calc,c1,7,5,4\n\
///            mass,m1,40,38,20\n\
///            calc,c2,9,9,14\n";
/// let catalog = ShapeCatalog::from_reader(csv.as_bytes()).unwrap();
/// assert_eq!(catalog.len(), 3);
///
/// let usable = catalog.filter("calc", 10);
/// assert_eq!(usable.len(), 1);
/// assert_eq!(usable.records()[0].archive_name(), "c1_7x5x4");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeCatalog {
    records: Vec<ShapeRecord>,
}

impl ShapeCatalog {
    /// Creates a catalog from already parsed records
    pub fn new(records: Vec<ShapeRecord>) -> Self {
        Self { records }
    }

    /// Reads a catalog file with a header row
    ///
    /// Spreadsheets (`.xlsx`, `.xls`, `.ods`, ...) are read from their first
    /// sheet; any other extension is parsed as CSV.
    ///
    /// # Errors
    ///
    /// Returns `Catalog` if the file cannot be opened, a required column is
    /// missing or a bounding-box count is not a non-negative integer.
    pub fn from_path(path: &Path) -> Result<Self> {
        let catalog = if is_workbook(path) {
            Self::from_workbook(path)?
        } else {
            let reader = csv::Reader::from_path(path).map_err(|e| {
                InsertionError::Catalog(format!("Failed to open {}: {}", path.display(), e))
            })?;
            Self::collect(reader)?
        };
        debug!(
            "Loaded {} shape records from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Reads the first sheet of a spreadsheet catalog
    pub fn from_workbook(path: &Path) -> Result<Self> {
        let mut workbook = open_workbook_auto(path).map_err(|e| {
            InsertionError::Catalog(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| InsertionError::Catalog(format!("{} has no sheets", path.display())))?
            .map_err(|e| {
                InsertionError::Catalog(format!("Failed to read {}: {}", path.display(), e))
            })?;

        let mut rows = range.rows();
        let header = rows
            .next()
            .ok_or_else(|| InsertionError::Catalog(format!("{} is empty", path.display())))?;
        let mut index = [0usize; 5];
        for (slot, column) in index.iter_mut().zip(COLUMNS) {
            *slot = header
                .iter()
                .position(|cell| cell_text(cell).as_deref() == Some(column))
                .ok_or_else(|| {
                    InsertionError::Catalog(format!(
                        "{} has no '{}' column",
                        path.display(),
                        column
                    ))
                })?;
        }

        let mut records = Vec::new();
        for (i, row) in rows.enumerate() {
            if row.iter().all(|cell| matches!(cell, Data::Empty)) {
                continue;
            }
            // header is sheet row 1
            let line = i + 2;
            let text = |col: usize| {
                row.get(index[col]).and_then(cell_text).ok_or_else(|| {
                    InsertionError::Catalog(format!("row {}: bad {} value", line, COLUMNS[col]))
                })
            };
            let count = |col: usize| {
                row.get(index[col]).and_then(cell_count).ok_or_else(|| {
                    InsertionError::Catalog(format!(
                        "row {}: {} is not a non-negative integer",
                        line, COLUMNS[col]
                    ))
                })
            };
            records.push(ShapeRecord::new(
                text(0)?,
                text(1)?,
                Window3::new(count(2)?, count(3)?, count(4)?),
            ));
        }
        Ok(Self { records })
    }

    /// Reads a catalog from any CSV source with a header line
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        Self::collect(csv::Reader::from_reader(source))
    }

    fn collect<R: Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let records = reader
            .deserialize::<CatalogRow>()
            .map(|row| row.map(ShapeRecord::from))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { records })
    }

    /// Records of the given kind whose native Z extent is at most `max_z`
    pub fn filter(&self, kind: &str, max_z: usize) -> ShapeCatalog {
        let records = self
            .records
            .iter()
            .filter(|r| r.kind == kind && r.extent.z <= max_z)
            .cloned()
            .collect();
        ShapeCatalog { records }
    }

    /// Picks one record uniformly, with replacement
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&ShapeRecord> {
        if self.records.is_empty() {
            return None;
        }
        self.records.get(rng.gen_range(0..self.records.len()))
    }

    pub fn records(&self) -> &[ShapeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            WORKBOOK_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => Some(s.trim().to_string()),
        Data::Int(v) => Some(v.to_string()),
        Data::Float(v) => Some(v.to_string()),
        _ => None,
    }
}

fn cell_count(cell: &Data) -> Option<usize> {
    match cell {
        Data::Int(v) => usize::try_from(*v).ok(),
        Data::Float(v) if *v >= 0.0 && v.fract() == 0.0 => Some(*v as usize),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use rust_xlsxwriter::Workbook;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    const CATALOG: &str = "\
Type,FileName,BB_CountX,BB_CountY,BB_CountZ,Volume
calc,patient1_calc1,12,10,6,402
calc,patient1_calc2,8,8,10,210
calc,patient2_calc1,14,12,11,820
mass,patient3_mass1,60,58,24,31000
";

    #[test]
    fn test_from_path_ignores_extra_columns() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();

        let catalog = ShapeCatalog::from_path(file.path()).unwrap();
        assert_eq!(catalog.len(), 4);
        assert_eq!(
            catalog.records()[0],
            ShapeRecord::new("calc", "patient1_calc1", Window3::new(12, 10, 6))
        );
    }

    fn write_workbook(path: &Path, rows: &[[&str; 6]]) {
        let mut workbook = Workbook::new();
        {
            let sheet = workbook.add_worksheet();
            for (r, row) in rows.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    // counts go in as numbers, the way spreadsheet tools store them
                    match cell.parse::<f64>() {
                        Ok(n) if r > 0 => sheet.write_number(r as u32, c as u16, n).unwrap(),
                        _ => sheet.write_string(r as u32, c as u16, *cell).unwrap(),
                    };
                }
            }
        }
        workbook.save(path).unwrap();
    }

    #[test]
    fn test_from_path_reads_xlsx_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("calcifications_report.xlsx");
        write_workbook(
            &path,
            &[
                ["Volume", "Type", "FileName", "BB_CountX", "BB_CountY", "BB_CountZ"],
                ["402", "calc", "patient1_calc1", "12", "10", "6"],
                ["31000", "mass", "patient3_mass1", "60", "58", "24"],
                ["210", "calc", "patient1_calc2", "8", "8", "10"],
            ],
        );

        let catalog = ShapeCatalog::from_path(&path).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.records()[0],
            ShapeRecord::new("calc", "patient1_calc1", Window3::new(12, 10, 6))
        );
        let from_csv = ShapeCatalog::from_reader(CATALOG.as_bytes()).unwrap();
        assert_eq!(catalog.filter("calc", 10), from_csv.filter("calc", 10));
    }

    #[test]
    fn test_xlsx_missing_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.xlsx");
        write_workbook(
            &path,
            &[
                ["Volume", "Type", "FileName", "BB_CountX", "BB_CountY", "Depth"],
                ["402", "calc", "c1", "1", "2", "3"],
            ],
        );

        let err = ShapeCatalog::from_path(&path).unwrap_err();
        assert!(matches!(err, InsertionError::Catalog(_)));
        assert!(err.to_string().contains("BB_CountZ"));
    }

    #[test]
    fn test_xlsx_fractional_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.xlsx");
        write_workbook(
            &path,
            &[
                ["Volume", "Type", "FileName", "BB_CountX", "BB_CountY", "BB_CountZ"],
                ["402", "calc", "c1", "1.5", "2", "3"],
            ],
        );
        assert!(matches!(
            ShapeCatalog::from_path(&path),
            Err(InsertionError::Catalog(_))
        ));
    }

    #[test]
    fn test_filter_by_kind_and_depth() {
        let catalog = ShapeCatalog::from_reader(CATALOG.as_bytes()).unwrap();
        let calcs = catalog.filter("calc", 10);
        let names: Vec<_> = calcs.records().iter().map(|r| r.file_name.as_str()).collect();
        // Z = 10 is kept, Z = 11 is not
        assert_eq!(names, vec!["patient1_calc1", "patient1_calc2"]);
        assert!(catalog.filter("calc", 5).is_empty());
    }

    #[test]
    fn test_missing_column() {
        let csv = "Type,FileName,BB_CountX,BB_CountY\ncalc,c1,1,2\n";
        assert!(matches!(
            ShapeCatalog::from_reader(csv.as_bytes()),
            Err(InsertionError::Catalog(_))
        ));
    }

    #[test]
    fn test_bad_count() {
        let csv = "Type,FileName,BB_CountX,BB_CountY,BB_CountZ\ncalc,c1,1,two,3\n";
        assert!(ShapeCatalog::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_workbook_extension_detection() {
        assert!(is_workbook(Path::new("report.xlsx")));
        assert!(is_workbook(Path::new("Report.XLS")));
        assert!(!is_workbook(Path::new("catalog.csv")));
        assert!(!is_workbook(Path::new("catalog")));
    }

    #[test]
    fn test_missing_file() {
        let err = ShapeCatalog::from_path(Path::new("/nonexistent/catalog.csv")).unwrap_err();
        assert!(err.to_string().contains("catalog.csv"));
    }

    #[test]
    fn test_choose_with_replacement() {
        let catalog = ShapeCatalog::from_reader(CATALOG.as_bytes()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let seen: HashSet<_> = (0..200)
            .map(|_| catalog.choose(&mut rng).unwrap().file_name.clone())
            .collect();
        assert_eq!(seen.len(), 4);
        assert!(ShapeCatalog::default().choose(&mut rng).is_none());
    }
}
