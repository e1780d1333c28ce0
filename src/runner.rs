//! Command-line entry points and pipeline orchestration.

use std::path::Path;

use clap::{Args, Command, FromArgMatches as _};

use crate::error::VaxlineError;
use crate::log::{info, set_log_level, warn, LevelFilter};
use crate::params::Parameters;
use crate::projector::project;
use crate::report::{write_long_csv, write_monthly_csv, write_wide_csv};
use crate::supply::{load_supply_dir, monthly_totals, SupplySeries};
use crate::timeline::{DoseGrid, MergedTimeline};

/// Default cli arguments for the vaxline runner
#[derive(Args, Debug)]
pub struct BaseArgs {
    /// Optional path to a JSON parameters file
    #[arg(short, long, default_value = "")]
    pub config: String,

    /// Optional directory of per-manufacturer supply CSVs
    #[arg(short, long, default_value = "")]
    pub supply_dir: String,

    /// Path for the wide campaign table
    #[arg(short, long, default_value = "timeline.csv")]
    pub output: String,

    /// Optional path for the long-format table
    #[arg(long)]
    pub long_output: Option<String>,

    /// Optional path for the monthly supply summary
    #[arg(long)]
    pub monthly_output: Option<String>,

    /// Overrides the configured first-dose fraction
    #[arg(short, long)]
    pub fraction: Option<f64>,

    /// Overrides the configured allocation policy: `remainder` or `independent-cap`
    #[arg(short, long)]
    pub policy: Option<String>,

    /// Enables console logging at the given level
    #[arg(short, long)]
    pub log_level: Option<LevelFilter>,
}

fn create_vaxline_cli() -> Command {
    let cli = Command::new("vaxline");
    BaseArgs::augment_args(cli)
}

/// Runs the full projection pipeline on in-memory inputs: integrate the
/// compartmental model, merge and accumulate the supply series, and
/// assemble the campaign-window table.
///
/// # Errors
/// Propagates validation, integration, and merge errors.
pub fn run_pipeline(
    parameters: &Parameters,
    series: &[SupplySeries],
) -> Result<MergedTimeline, VaxlineError> {
    let trajectory = project(parameters)?;
    let grid = DoseGrid::merge(parameters, series)?.accumulate();
    MergedTimeline::assemble(parameters, &trajectory, grid)
}

/// Parses command line arguments, runs the pipeline, and writes the
/// requested output tables.
///
/// # Errors
/// Returns an error if argument parsing, input loading, the pipeline, or
/// output writing fails.
pub fn run_with_args() -> Result<MergedTimeline, Box<dyn std::error::Error>> {
    let cli = create_vaxline_cli();
    let matches = cli.get_matches();
    let args = BaseArgs::from_arg_matches(&matches)?;
    run_with_args_internal(args)
}

fn run_with_args_internal(args: BaseArgs) -> Result<MergedTimeline, Box<dyn std::error::Error>> {
    if let Some(level) = args.log_level {
        set_log_level(level);
    }

    let mut parameters = if args.config.is_empty() {
        Parameters::default()
    } else {
        info!("loading parameters from: {}", args.config);
        Parameters::from_json_file(Path::new(&args.config))?
    };
    if let Some(fraction) = args.fraction {
        parameters.first_dose_fraction = fraction;
    }
    if let Some(policy) = &args.policy {
        parameters.allocation_policy = policy.parse()?;
    }
    parameters.validate()?;

    let series: Vec<SupplySeries> = if args.supply_dir.is_empty() {
        warn!("no supply directory given; supply columns will be zero");
        Vec::new()
    } else {
        load_supply_dir(Path::new(&args.supply_dir))?
    };

    let timeline = run_pipeline(&parameters, &series)?;

    write_wide_csv(Path::new(&args.output), &timeline)?;
    info!(
        "wrote {} campaign rows to {}",
        timeline.rows.len(),
        args.output
    );
    if let Some(path) = &args.long_output {
        write_long_csv(Path::new(path), &timeline.melt())?;
    }
    if let Some(path) = &args.monthly_output {
        write_monthly_csv(Path::new(path), &monthly_totals(&series))?;
    }

    Ok(timeline)
}
