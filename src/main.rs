use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use stratus_export::config::{self, Config};
use stratus_export::export::{self, ExportOutcome, Exporter};
use stratus_export::io::{archive, excel_read, json_input};
use stratus_export::model::ExportJob;
use stratus_export::{Result, ToolError, UNKNOWN_ACCOUNT, naming};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging(cli.verbose).and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    match cli.command {
        Command::Export(args) => execute_export(args, &config_path),
        Command::Filename(args) => {
            println!(
                "{}",
                naming::build_filename(
                    &args.account_label,
                    &args.resource_type,
                    args.suffix.as_deref().unwrap_or_default(),
                    args.date.as_deref(),
                )
            );
            Ok(())
        }
        Command::Resolve(args) => execute_resolve(args, &config_path),
        Command::Inspect(args) => execute_inspect(&args.input),
        Command::Archive(args) => execute_archive(args, &config_path),
        Command::InitConfig => execute_init_config(&config_path),
    }
}

fn load_config(path: &Path) -> Config {
    match Config::load_or_bootstrap(path) {
        Ok(config) => config,
        Err(error) => {
            warn!(%error, "could not load account mappings, using defaults");
            Config::default()
        }
    }
}

fn account_label(config: &Config, account_id: Option<&str>, explicit: Option<String>) -> String {
    explicit.unwrap_or_else(|| {
        let resolver = config.resolver();
        match account_id {
            Some(account_id) => resolver.resolve(account_id, UNKNOWN_ACCOUNT).to_string(),
            None => UNKNOWN_ACCOUNT.to_string(),
        }
    })
}

fn execute_export(args: ExportArgs, config_path: &Path) -> Result<()> {
    let config = load_config(config_path);
    let label = account_label(&config, args.account_id.as_deref(), args.account_label);
    let default_sheet = args.sheet.as_deref().unwrap_or(&args.resource_type);
    let job = ExportJob {
        filename: naming::build_filename(
            &label,
            &args.resource_type,
            args.suffix.as_deref().unwrap_or_default(),
            args.date.as_deref(),
        ),
        sheets: json_input::read_sheets_from_json(&args.input, default_sheet)?,
    };
    let exporter = Exporter::new(args.output_dir.unwrap_or_else(config::default_output_dir));

    let outcome = match job.sheets.as_slice() {
        [(sheet_name, table)] => exporter.export_single(table, &job.filename, sheet_name),
        _ => exporter.export_job(&job),
    };
    export::log_export_summary(&job, &outcome);

    if let ExportOutcome::Fallback { cause, .. } = &outcome {
        warn!(error = %cause, "spreadsheet could not be written");
    }
    for path in outcome.into_result()? {
        println!("{}", path.display());
    }
    Ok(())
}

fn execute_resolve(args: ResolveArgs, config_path: &Path) -> Result<()> {
    let resolver = load_config(config_path).resolver();
    let resolved = if args.formatted {
        resolver.resolve_formatted(&args.account_id)
    } else {
        let default = args.default.as_deref().unwrap_or(&args.account_id);
        resolver.resolve(&args.account_id, default).to_string()
    };
    println!("{resolved}");
    Ok(())
}

fn execute_inspect(input: &Path) -> Result<()> {
    for sheet in excel_read::read_sheets(input)? {
        println!("{}\t{} columns\t{} rows", sheet.name, sheet.header.len(), sheet.row_count());
    }
    Ok(())
}

fn execute_archive(args: ArchiveArgs, config_path: &Path) -> Result<()> {
    let config = load_config(config_path);
    let label = account_label(&config, args.account_id.as_deref(), args.account_label);
    let output_dir = args.output_dir.unwrap_or_else(config::default_output_dir);
    let destination = args.destination.unwrap_or_else(|| {
        config::program_root().join(naming::build_archive_filename(&label, args.date.as_deref()))
    });

    let entries = archive::archive_directory(&output_dir, &destination)?;
    info!(entries = entries.len(), "archive complete");
    println!("{}", destination.display());
    Ok(())
}

fn execute_init_config(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        info!(path = %config_path.display(), "configuration already present");
        Config::load(config_path)?;
    } else {
        Config::default().save(config_path)?;
        info!(path = %config_path.display(), "wrote default configuration");
    }
    println!("{}", config_path.display());
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Write collected cloud inventory records to spreadsheet exports."
)]
struct Cli {
    /// Configuration file with account mappings. Defaults to config.json at the program root.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export a JSON record set to a spreadsheet.
    Export(ExportArgs),
    /// Print the export filename for the given parts.
    Filename(FilenameArgs),
    /// Resolve an account id to its configured label.
    Resolve(ResolveArgs),
    /// List the worksheets of an existing export.
    Inspect(InspectArgs),
    /// Zip the output directory.
    Archive(ArchiveArgs),
    /// Write the default configuration file if it does not exist.
    InitConfig,
}

#[derive(clap::Args)]
struct ExportArgs {
    /// JSON file holding an array of records or an object of sheet arrays.
    #[arg(long)]
    input: PathBuf,

    /// Resource type used in the filename, e.g. ec2.
    #[arg(long)]
    resource_type: String,

    /// Optional filename suffix, e.g. running.
    #[arg(long)]
    suffix: Option<String>,

    /// Date stamp in MM.DD.YYYY form. Defaults to today.
    #[arg(long)]
    date: Option<String>,

    /// Account id resolved through the configured mappings.
    #[arg(long)]
    account_id: Option<String>,

    /// Account label used as-is, bypassing the mappings.
    #[arg(long, conflicts_with = "account_id")]
    account_label: Option<String>,

    /// Sheet name for a single record array. Defaults to the resource type.
    #[arg(long)]
    sheet: Option<String>,

    /// Output directory. Defaults to output/ at the program root.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[derive(clap::Args)]
struct FilenameArgs {
    #[arg(long)]
    account_label: String,

    #[arg(long)]
    resource_type: String,

    #[arg(long)]
    suffix: Option<String>,

    #[arg(long)]
    date: Option<String>,
}

#[derive(clap::Args)]
struct ResolveArgs {
    account_id: String,

    /// Print "LABEL (ID)" instead of the bare label.
    #[arg(long)]
    formatted: bool,

    /// Value printed when the account is unmapped. Defaults to the id itself.
    #[arg(long, conflicts_with = "formatted")]
    default: Option<String>,
}

#[derive(clap::Args)]
struct InspectArgs {
    input: PathBuf,
}

#[derive(clap::Args)]
struct ArchiveArgs {
    #[arg(long)]
    account_id: Option<String>,

    #[arg(long, conflicts_with = "account_id")]
    account_label: Option<String>,

    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Archive path. Defaults to {label}-export-{date}.zip at the program root.
    #[arg(long)]
    destination: Option<PathBuf>,

    #[arg(long)]
    date: Option<String>,
}
