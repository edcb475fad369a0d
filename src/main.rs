use clap::{Parser, Subcommand};
use std::path::PathBuf;
use yield_forge::cli;
use yield_forge::types::RowInputs;

#[derive(Parser)]
#[command(name = "yield-forge")]
#[command(about = "Recognize and validate crop-planning yield formulas")]
#[command(long_about = "Yield Forge - crop-planning yield formula recognition

Turns legacy workbook 'Units Per Harvest' formulas into structured yield
models and checks every model against the workbook's own cached totals.

COMMANDS:
  recognize  - Classify one formula and show its yield model
  validate   - Recompute every row of a rows file and report mismatches
  export     - Write yield-model records or the yieldFormula shim
  patterns   - List the recognized formula shapes

EXAMPLES:
  yield-forge recognize '=[@[Plantings Per Bed]]*3' --spacing 6 --rows 4 --harvests 5
  yield-forge validate crops.yaml --json report.json
  yield-forge export crops.yaml --output yield-models.json

LOGGING:
  RUST_LOG=yield_forge=debug shows every template decision on stderr.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Classify one workbook formula.

Normalizes the formula, finds the first matching template and prints the
resulting yield model and its target formula. With --spacing, --rows and
--harvests the total yield for that row is computed as well.

Exits non-zero when the formula is not recognized.

EXAMPLE:
  yield-forge recognize '=PlantingsPerBed*3/Harvests' --spacing 6 --rows 4 --harvests 5")]
    /// Classify one formula and show its yield model
    Recognize {
        /// Workbook formula text (leading '=')
        formula: String,

        /// In-row spacing in inches
        #[arg(long, default_value = "0")]
        spacing: f64,

        /// Rows per bed
        #[arg(long, default_value = "0")]
        rows: f64,

        /// Bed length in feet
        #[arg(long, default_value = "50")]
        bed_length: f64,

        /// Number of harvests
        #[arg(long, default_value = "0")]
        harvests: f64,

        /// Days between harvests
        #[arg(long, default_value = "7")]
        dbh: f64,

        /// Seeds per bed
        #[arg(long, default_value = "0")]
        seeds: f64,

        /// Seeding safety factor
        #[arg(long, default_value = "1")]
        safety_factor: f64,
    },

    #[command(long_about = "Validate every row of a rows file.

Each row's formula is recognized and re-evaluated; the result is compared
with the row's expected_total. A row whose relative error exceeds the
tolerance is a mismatch. Rows without an expected total, or with zero
spacing/rows/harvests, are recognized but not checked.

ROWS FILE (YAML, or JSON with a .json extension):
  - row: 12
    crop: Lettuce
    identifier: lettuce-heads
    formula: \"=PlantingsPerBed*3\"
    spacing: 6
    rows: 4
    bed_length: 50
    harvests: 5
    expected_total: 6000

Exits non-zero on mismatched or errored rows, and with --strict also on
unmatched formulas.")]
    /// Recompute every row and report mismatches
    Validate {
        /// Rows file (YAML or JSON)
        rows: PathBuf,

        /// Harness config file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Mismatch threshold in percent (overrides the config file)
        #[arg(short, long, env = "YIELD_FORGE_TOLERANCE")]
        tolerance: Option<f64>,

        /// Also write the full report as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Fail when any formula is not recognized
        #[arg(long)]
        strict: bool,

        /// List every recognized row
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write yield-model records or the yieldFormula shim as JSON
    Export {
        /// Rows file (YAML or JSON)
        rows: PathBuf,

        /// Output JSON file
        #[arg(short, long)]
        output: PathBuf,

        /// What to write
        #[arg(short, long, value_enum, default_value = "models")]
        format: cli::ExportFormat,

        /// Harness config file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the recognized formula shapes in match order
    Patterns,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yield_forge=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Recognize {
            formula,
            spacing,
            rows,
            bed_length,
            harvests,
            dbh,
            seeds,
            safety_factor,
        } => {
            let inputs = RowInputs {
                spacing,
                rows,
                bed_length,
                harvests,
                days_between_harvest: dbh,
                seeds,
                safety_factor,
            };
            cli::recognize(formula, inputs)?
        }

        Commands::Validate {
            rows,
            config,
            tolerance,
            json,
            strict,
            verbose,
        } => cli::validate(rows, config, tolerance, json, strict, verbose)?,

        Commands::Export {
            rows,
            output,
            format,
            config,
        } => cli::export(rows, output, format, config)?,

        Commands::Patterns => cli::patterns()?,
    }

    Ok(())
}
