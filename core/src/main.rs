use clap::Parser;
use dicom_object::open_file;
use log::{error, info, warn};
use mcinsert_core::cli::report::{
    ClusterSummary, ExamListing, LayoutSummary, ProjectionEntry, TextReport,
};
use mcinsert_core::cli::{ClusterArgs, Command, ExamArgs, OutputFormat, SamplingArgs};
use mcinsert_core::{
    collect_projection_files, dimensions, projection_index, sample_layout,
    CalcificationCompositor, ClusterLayout, EngineConfig, RawShapeRepository, Result,
    ShapeCatalog, ShapeRepository, ZipShapeRepository,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::fmt;
use std::process;

fn main() {
    let cli = mcinsert_core::Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    let outcome = match &cli.command {
        Command::Layout(args) => run_layout(args),
        Command::Cluster(args) => run_cluster(args),
        Command::Exam(args) => run_exam(args),
    };

    if let Err(e) = outcome {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn setup_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
}

/// Resolves the configuration and the seed actually used
fn prepare(args: &SamplingArgs) -> Result<(EngineConfig, u64)> {
    let config = args.resolve_config()?;
    let seed = config.seed.unwrap_or_else(rand::random);
    info!("Using seed {}", seed);
    Ok((config, seed))
}

fn sample(config: &EngineConfig, rng: &mut StdRng) -> Result<ClusterLayout> {
    sample_layout(
        config.num_calc,
        config.cluster_window,
        config.calc_window,
        &config.layout,
        rng,
    )
}

fn run_layout(args: &SamplingArgs) -> Result<()> {
    let (config, seed) = prepare(args)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let layout = sample(&config, &mut rng)?;

    let summary = LayoutSummary {
        seed,
        cluster_window: config.cluster_window,
        calc_window: config.calc_window,
        positions: layout.positions,
    };
    emit(&summary, TextReport::new(&summary), args.format)
}

fn run_cluster(args: &ClusterArgs) -> Result<()> {
    let (config, seed) = prepare(&args.sampling)?;
    let mut rng = StdRng::seed_from_u64(seed);

    let catalog = ShapeCatalog::from_path(&args.catalog)?;
    info!("Loaded {} catalog records", catalog.len());

    let repository: Box<dyn ShapeRepository> = if args.raw {
        Box::new(RawShapeRepository::new(&args.shapes))
    } else {
        Box::new(ZipShapeRepository::new(&args.shapes))
    };
    let compositor = CalcificationCompositor::new(
        &catalog,
        repository.as_ref(),
        config.cluster_window,
        config.compositor.clone(),
    )?;

    let layout = sample(&config, &mut rng)?;
    let composite = compositor.composite(config.num_calc, &layout.positions, &mut rng)?;

    if let Some(path) = &args.output {
        let bytes: Vec<u8> = composite
            .roi
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        std::fs::write(path, bytes)?;
        info!("Wrote {} ROI to {}", config.cluster_window, path.display());
    }

    let summary = ClusterSummary {
        layout: LayoutSummary {
            seed,
            cluster_window: config.cluster_window,
            calc_window: config.calc_window,
            positions: layout.positions,
        },
        roi_sum: composite.roi.sum(),
        roi_max: composite.roi.fold(0.0, |m: f64, &v| m.max(v)),
        contrasts: composite.contrasts,
        shapes: composite
            .shapes
            .iter()
            .map(|record| record.archive_name())
            .collect(),
        output: args.output.clone(),
    };
    emit(&summary, TextReport::new(&summary), args.sampling.format)
}

fn run_exam(args: &ExamArgs) -> Result<()> {
    info!("Processing directory: {}", args.directory.display());
    let files = collect_projection_files(&args.directory)?;

    let projections = files
        .into_iter()
        .map(|path| {
            let dims = match open_file(&path) {
                Ok(dcm) => match dimensions(&dcm) {
                    Ok(dims) => Some(dims),
                    Err(e) => {
                        warn!("Skipping {}: {}", path.display(), e);
                        None
                    }
                },
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    None
                }
            };
            ProjectionEntry {
                index: projection_index(&path),
                rows: dims.map(|d| d.0),
                columns: dims.map(|d| d.1),
                path,
            }
        })
        .collect();

    let listing = ExamListing {
        directory: args.directory.clone(),
        projections,
    };
    emit(&listing, TextReport::new(&listing), args.format)
}

fn emit<T: Serialize>(summary: &T, report: impl fmt::Display, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{}", report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(summary)?),
    }
    Ok(())
}
