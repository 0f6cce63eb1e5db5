use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use isa_dataset_finder::app::{App, AttachMode, LoadedDocument};
use isa_dataset_finder::config::{ConfigLoader, ResolvedConfig};
use isa_dataset_finder::error::IsaError;
use isa_dataset_finder::filter::Filter;
use isa_dataset_finder::output::{JsonOutput, OutputMode, Report, TextOutput};
use isa_dataset_finder::table::ConverterRegistry;

#[derive(Parser)]
#[command(name = "isa-find")]
#[command(about = "Find datasets in ISA metadata by key/value and load their data files as tables")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    document: Option<Utf8PathBuf>,

    #[arg(long, global = true)]
    data_root: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List data files of assays matching the filter")]
    Match(FilterArgs),
    #[command(about = "Show every value bound to a field in matching assays")]
    Collect(CollectArgs),
    #[command(about = "Load matching data files as tables")]
    Table(TableArgs),
    #[command(about = "List registered data file types")]
    Types,
}

#[derive(Args, Clone)]
struct FilterArgs {
    /// Required field value, written as key=value. Repeat to require several.
    #[arg(long = "where", value_name = "KEY=VALUE")]
    filters: Vec<String>,
}

#[derive(Args)]
struct CollectArgs {
    field: String,

    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Args)]
struct TableArgs {
    #[command(flatten)]
    filter: FilterArgs,

    /// Only load the match at this position of the `match` listing.
    #[arg(long)]
    index: Option<usize>,

    /// Assay field to carry onto each table.
    #[arg(long)]
    attach: Vec<String>,

    #[arg(long, value_enum, default_value_t = AttachMode::Attribute)]
    attach_as: AttachMode,

    /// Rows shown per table in interactive output.
    #[arg(long, default_value_t = 10)]
    rows: usize,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<IsaError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &IsaError) -> u8 {
    match error {
        IsaError::MalformedDocument(_)
        | IsaError::DocumentRead { .. }
        | IsaError::DocumentParse(_)
        | IsaError::MissingConfig
        | IsaError::ConfigRead(_)
        | IsaError::ConfigParse(_) => 2,
        IsaError::UnknownFileType(_)
        | IsaError::DataFileRead { .. }
        | IsaError::TableFormat { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let mut config = ConfigLoader::resolve_or_default(cli.config.as_deref())?;
    if let Some(document) = cli.document {
        config.document = document;
    }
    if let Some(data_root) = cli.data_root {
        config.data_root = Some(data_root);
    }

    let app = App::from_config(&config, ConverterRegistry::with_defaults());

    match cli.command {
        Commands::Match(args) => run_match(&app, &config, args, output_mode),
        Commands::Collect(args) => run_collect(&app, &config, args, output_mode),
        Commands::Table(args) => run_table(&app, &config, args, output_mode),
        Commands::Types => {
            let types = app.registry().types();
            match output_mode {
                OutputMode::NonInteractive => JsonOutput::print_types(&types).into_diagnostic(),
                OutputMode::Interactive => {
                    TextOutput::print_types(&types);
                    Ok(())
                }
            }
        }
    }
}

fn load(
    app: &App,
    config: &ResolvedConfig,
    args: &FilterArgs,
) -> miette::Result<(LoadedDocument, Filter)> {
    let filter = config
        .filter
        .clone()
        .merged(Filter::parse_pairs(&args.filters)?);
    let loaded = app.load(&config.document)?;
    Ok((loaded, filter))
}

fn run_match(
    app: &App,
    config: &ResolvedConfig,
    args: FilterArgs,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let (loaded, filter) = load(app, config, &args)?;
    let results = app.find(&loaded, &filter)?;
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_matches(&Report::new(
            loaded.path.as_str(),
            &filter,
            results.as_slice(),
        ))
        .into_diagnostic(),
        OutputMode::Interactive => {
            TextOutput::print_matches(&filter, &results);
            Ok(())
        }
    }
}

fn run_collect(
    app: &App,
    config: &ResolvedConfig,
    args: CollectArgs,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let (loaded, filter) = load(app, config, &args.filter)?;
    let collected = app.collect(&loaded, &filter, &args.field)?;
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_collected(&Report::new(
            loaded.path.as_str(),
            &filter,
            collected.as_slice(),
        ))
        .into_diagnostic(),
        OutputMode::Interactive => {
            TextOutput::print_collected(&args.field, &collected);
            Ok(())
        }
    }
}

fn run_table(
    app: &App,
    config: &ResolvedConfig,
    args: TableArgs,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let (loaded, filter) = load(app, config, &args.filter)?;
    let results = app.find(&loaded, &filter)?;
    let selected = match args.index {
        Some(index) => {
            let result = results.get(index).ok_or_else(|| {
                miette::Report::msg(format!(
                    "no match at index {index} ({} matches)",
                    results.len()
                ))
            })?;
            vec![result]
        }
        None => results.iter().collect(),
    };

    let tables = selected
        .into_iter()
        .map(|result| app.materialize_annotated(&loaded, result, &args.attach, args.attach_as))
        .collect::<Result<Vec<_>, IsaError>>()?;

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_tables(&Report::new(
            loaded.path.as_str(),
            &filter,
            tables.as_slice(),
        ))
        .into_diagnostic(),
        OutputMode::Interactive => {
            for table in &tables {
                TextOutput::print_table(table, args.rows);
            }
            Ok(())
        }
    }
}
