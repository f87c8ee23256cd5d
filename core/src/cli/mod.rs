pub mod report;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::types::Window3;

/// Command-line arguments for mcinsert
#[derive(Parser, Debug)]
#[command(name = "mcinsert")]
#[command(about = "Synthetic microcalcification cluster placement and compositing")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sample a layout and composite a cluster ROI from the shape library
    Cluster(ClusterArgs),
    /// Sample calcification positions only
    Layout(SamplingArgs),
    /// List the projection files of an exam directory
    Exam(ExamArgs),
}

/// Options shared by every sampling command
#[derive(Args, Debug, Clone)]
pub struct SamplingArgs {
    /// JSON engine configuration
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of calcifications in the cluster
    #[arg(short, long)]
    pub num_calc: Option<usize>,

    /// Random seed; a fresh one is drawn and reported when omitted
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Cluster window, e.g. 200x200x28
    #[arg(long, value_parser = Window3::parse)]
    pub cluster_window: Option<Window3>,

    /// Calcification window, e.g. 80x80x10
    #[arg(long, value_parser = Window3::parse)]
    pub calc_window: Option<Window3>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

impl SamplingArgs {
    /// Loads the configuration file (or defaults) and applies command-line overrides
    pub fn resolve_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_json_file(path)?,
            None => EngineConfig::default(),
        };
        if let Some(n) = self.num_calc {
            config.num_calc = n;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(w) = self.cluster_window {
            config.cluster_window = w;
        }
        if let Some(w) = self.calc_window {
            config.calc_window = w;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ClusterArgs {
    #[command(flatten)]
    pub sampling: SamplingArgs,

    /// Shape catalog (CSV or the .xlsx library report)
    #[arg(long, value_name = "FILE")]
    pub catalog: PathBuf,

    /// Directory holding the shape archives
    #[arg(long, value_name = "DIR")]
    pub shapes: PathBuf,

    /// Shapes are extracted `<name>/<name>.raw` files instead of zip archives
    #[arg(long)]
    pub raw: bool,

    /// Write the ROI as raw little-endian f64 voxels
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ExamArgs {
    /// Directory containing the projection files of one exam
    #[arg(value_name = "DIRECTORY")]
    pub directory: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_layout_overrides() {
        let cli = Cli::parse_from([
            "mcinsert",
            "layout",
            "-n",
            "5",
            "--seed",
            "11",
            "--cluster-window",
            "60x60x12",
            "--calc-window",
            "20,20,6",
        ]);
        let Command::Layout(args) = cli.command else {
            panic!("expected layout");
        };
        let config = args.resolve_config().unwrap();
        assert_eq!(config.num_calc, 5);
        assert_eq!(config.seed, Some(11));
        assert_eq!(config.cluster_window, Window3::new(60, 60, 12));
        assert_eq!(config.calc_window, Window3::new(20, 20, 6));
    }

    #[test]
    fn test_overrides_apply_on_top_of_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "num_calc": 4, "seed": 1 }}"#).unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let cli = Cli::parse_from(["mcinsert", "-v", "layout", "--config", &path, "-s", "2"]);
        assert!(cli.verbose);
        let Command::Layout(args) = cli.command else {
            panic!("expected layout");
        };
        let config = args.resolve_config().unwrap();
        assert_eq!(config.num_calc, 4);
        assert_eq!(config.seed, Some(2));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let cli = Cli::parse_from(["mcinsert", "layout", "--calc-window", "500x80x10"]);
        let Command::Layout(args) = cli.command else {
            panic!("expected layout");
        };
        assert!(args.resolve_config().is_err());
    }

    #[test]
    fn test_parse_cluster() {
        let cli = Cli::parse_from([
            "mcinsert",
            "cluster",
            "--catalog",
            "shapes.csv",
            "--shapes",
            "zips",
            "--raw",
            "-f",
            "json",
        ]);
        let Command::Cluster(args) = cli.command else {
            panic!("expected cluster");
        };
        assert!(args.raw);
        assert_eq!(args.catalog, PathBuf::from("shapes.csv"));
        assert!(matches!(args.sampling.format, OutputFormat::Json));
    }

    #[test]
    fn test_bad_window_is_a_parse_error() {
        assert!(Cli::try_parse_from(["mcinsert", "layout", "--cluster-window", "60x60"]).is_err());
    }
}
