use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::types::{Position, Window3};

/// Positions sampled for one cluster
#[derive(Debug, Clone, Serialize)]
pub struct LayoutSummary {
    pub seed: u64,
    pub cluster_window: Window3,
    pub calc_window: Window3,
    pub positions: Vec<Position>,
}

/// Composited cluster ROI
#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    pub layout: LayoutSummary,
    pub contrasts: Vec<f64>,
    pub shapes: Vec<String>,
    pub roi_sum: f64,
    pub roi_max: f64,
    pub output: Option<PathBuf>,
}

/// One projection file of an exam
#[derive(Debug, Clone, Serialize)]
pub struct ProjectionEntry {
    pub path: PathBuf,
    pub index: Option<usize>,
    pub rows: Option<usize>,
    pub columns: Option<usize>,
}

/// Projection files of an exam directory
#[derive(Debug, Clone, Serialize)]
pub struct ExamListing {
    pub directory: PathBuf,
    pub projections: Vec<ProjectionEntry>,
}

/// Text report formatter for command summaries
pub struct TextReport<'a, T> {
    summary: &'a T,
}

impl<'a, T> TextReport<'a, T> {
    /// Creates a new text report
    pub fn new(summary: &'a T) -> Self {
        Self { summary }
    }
}

fn write_positions(f: &mut fmt::Formatter<'_>, positions: &[Position]) -> fmt::Result {
    for (i, p) in positions.iter().enumerate() {
        writeln!(f, "  {:>3}  {}", i + 1, p)?;
    }
    Ok(())
}

impl<'a> fmt::Display for TextReport<'a, LayoutSummary> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.summary;
        writeln!(f, "Cluster Layout")?;
        writeln!(f, "==============")?;
        writeln!(f)?;
        writeln!(f, "Seed:           {}", s.seed)?;
        writeln!(f, "Cluster Window: {}", s.cluster_window)?;
        writeln!(f, "Calc Window:    {}", s.calc_window)?;
        writeln!(f, "Calcifications: {}", s.positions.len())?;
        writeln!(f)?;
        write_positions(f, &s.positions)
    }
}

impl<'a> fmt::Display for TextReport<'a, ClusterSummary> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.summary;
        writeln!(f, "Cluster ROI")?;
        writeln!(f, "===========")?;
        writeln!(f)?;
        writeln!(f, "Seed:           {}", s.layout.seed)?;
        writeln!(f, "ROI Window:     {}", s.layout.cluster_window)?;
        writeln!(f, "Calc Window:    {}", s.layout.calc_window)?;
        writeln!(f, "ROI Sum:        {:.3}", s.roi_sum)?;
        writeln!(f, "ROI Max:        {:.3}", s.roi_max)?;
        match &s.output {
            Some(path) => writeln!(f, "Output:         {}", path.display())?,
            None => writeln!(f, "Output:         none")?,
        }
        writeln!(f)?;

        writeln!(f, "Calcifications")?;
        writeln!(f, "--------------")?;
        for (i, ((p, c), shape)) in s
            .layout
            .positions
            .iter()
            .zip(s.contrasts.iter())
            .zip(s.shapes.iter())
            .enumerate()
        {
            writeln!(f, "  {:>3}  {}  contrast {:.3}  {}", i + 1, p, c, shape)?;
        }
        Ok(())
    }
}

impl<'a> fmt::Display for TextReport<'a, ExamListing> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.summary;
        writeln!(f, "Exam: {}", s.directory.display())?;
        writeln!(f, "Projections: {}", s.projections.len())?;
        writeln!(f)?;
        for entry in &s.projections {
            let index = entry
                .index
                .map(|i| i.to_string())
                .unwrap_or_else(|| "-".to_string());
            let dims = match (entry.rows, entry.columns) {
                (Some(r), Some(c)) => format!("{}x{}", r, c),
                _ => "unreadable".to_string(),
            };
            let name = entry
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            writeln!(f, "  {:>4}  {:<12}  {}", index, dims, name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> LayoutSummary {
        LayoutSummary {
            seed: 42,
            cluster_window: Window3::new(200, 200, 28),
            calc_window: Window3::new(80, 80, 10),
            positions: vec![Position::new(100, 90, 14), Position::new(60, 120, 9)],
        }
    }

    #[test]
    fn test_layout_report_format() {
        let summary = layout();
        let output = format!("{}", TextReport::new(&summary));
        assert!(output.contains("Cluster Layout"));
        assert!(output.contains("Seed:           42"));
        assert!(output.contains("Cluster Window: 200x200x28"));
        assert!(output.contains("Calcifications: 2"));
        assert!(output.contains("    2  (60, 120, 9)"));
    }

    #[test]
    fn test_cluster_report_format() {
        let summary = ClusterSummary {
            layout: layout(),
            contrasts: vec![1.0, 0.625],
            shapes: vec!["p1_c1_7x5x4".to_string(), "p2_c3_9x9x6".to_string()],
            roi_sum: 12.5,
            roi_max: 1.0,
            output: None,
        };
        let output = format!("{}", TextReport::new(&summary));
        assert!(output.contains("ROI Sum:        12.500"));
        assert!(output.contains("Output:         none"));
        assert!(output.contains("contrast 0.625  p2_c3_9x9x6"));
    }

    #[test]
    fn test_exam_listing_format() {
        let listing = ExamListing {
            directory: PathBuf::from("/data/exam1"),
            projections: vec![
                ProjectionEntry {
                    path: PathBuf::from("/data/exam1/proj_003.dcm"),
                    index: Some(3),
                    rows: Some(2457),
                    columns: Some(1890),
                },
                ProjectionEntry {
                    path: PathBuf::from("/data/exam1/broken.dcm"),
                    index: None,
                    rows: None,
                    columns: None,
                },
            ],
        };
        let output = format!("{}", TextReport::new(&listing));
        assert!(output.contains("Projections: 2"));
        assert!(output.contains("2457x1890"));
        assert!(output.contains("unreadable"));
    }

    #[test]
    fn test_json_serialization() {
        let json = serde_json::to_string(&layout()).unwrap();
        assert!(json.contains(r#""cluster_window":{"x":200,"y":200,"z":28}"#));
        assert!(json.contains(r#""positions":[{"x":100,"y":90,"z":14}"#));
    }
}
