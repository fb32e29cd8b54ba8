use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use geneviz::access::UploadTarget;
use geneviz::app::App;
use geneviz::config::ConfigLoader;
use geneviz::domain::{Caller, DatasetId, NameList, ProjectId};
use geneviz::error::GenevizError;
use geneviz::output::{JsonOutput, OutputMode, TextOutput};
use geneviz::store::{MemoryStore, StoreLock};

#[derive(Parser)]
#[command(name = "geneviz")]
#[command(about = "Per-tenant gene datasets: upload FASTA/TSV, query sequences and expression")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    /// Authenticated caller identity; defaults to `caller` from the config file.
    #[arg(long, global = true)]
    caller: Option<String>,

    /// Store snapshot path; defaults to `store_path` from the config file.
    #[arg(long, global = true)]
    store: Option<Utf8PathBuf>,

    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(subcommand, about = "List or create projects")]
    Project(ProjectCommand),
    #[command(subcommand, about = "List or create datasets")]
    Dataset(DatasetCommand),
    #[command(subcommand, about = "Upload FASTA or TSV files")]
    Upload(UploadCommand),
    #[command(subcommand, about = "Query a dataset")]
    Query(QueryCommand),
    #[command(subcommand, about = "Export sequences")]
    Export(ExportCommand),
    #[command(subcommand, about = "Administrative dataset maintenance")]
    Admin(AdminCommand),
}

#[derive(Subcommand)]
enum ProjectCommand {
    List,
    Create { name: String },
}

#[derive(Subcommand)]
enum DatasetCommand {
    List {
        #[arg(long)]
        project: Option<ProjectId>,
    },
    Create {
        #[arg(long)]
        project: ProjectId,
        name: String,
    },
}

#[derive(Subcommand)]
enum UploadCommand {
    Fasta(UploadArgs),
    Tsv(UploadArgs),
}

#[derive(Args)]
struct UploadArgs {
    file: Utf8PathBuf,

    #[arg(long)]
    project: Option<ProjectId>,

    #[arg(long)]
    dataset: Option<DatasetId>,

    #[arg(long)]
    dataset_name: Option<String>,
}

#[derive(Args)]
struct DatasetArgs {
    #[arg(long)]
    dataset: DatasetId,

    #[arg(long)]
    project: Option<ProjectId>,
}

#[derive(Subcommand)]
enum QueryCommand {
    Sequences {
        #[command(flatten)]
        target: DatasetArgs,
        #[arg(long)]
        genes: Option<String>,
    },
    Expression {
        #[command(flatten)]
        target: DatasetArgs,
        #[arg(long)]
        genes: Option<String>,
        #[arg(long)]
        samples: Option<String>,
    },
    Genes {
        #[arg(long)]
        dataset: DatasetId,
        #[arg(long)]
        q: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    Samples {
        #[command(flatten)]
        target: DatasetArgs,
    },
    Matrix {
        #[command(flatten)]
        target: DatasetArgs,
        #[arg(long)]
        genes: Option<String>,
    },
}

#[derive(Subcommand)]
enum ExportCommand {
    Fasta {
        #[command(flatten)]
        target: DatasetArgs,
        #[arg(long)]
        genes: Option<String>,
        /// Output file, or a directory receiving the suggested file name.
        #[arg(long)]
        out: Option<Utf8PathBuf>,
    },
}

#[derive(Subcommand)]
enum AdminCommand {
    SetDefault {
        dataset: DatasetId,
        #[arg(long)]
        off: bool,
    },
    DeleteDataset {
        dataset: DatasetId,
    },
}

impl Commands {
    fn mutates_store(&self) -> bool {
        matches!(
            self,
            Commands::Upload(_)
                | Commands::Admin(_)
                | Commands::Project(ProjectCommand::Create { .. })
                | Commands::Dataset(DatasetCommand::Create { .. })
        )
    }
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<GenevizError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &GenevizError) -> u8 {
    match error.category() {
        "invalid_request" | "decode_error" | "empty_file" | "invalid_header" => 2,
        "not_found" | "no_data" => 4,
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
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let store_path = cli.store.clone().unwrap_or(config.store_path.clone());
    let mutates = cli.command.mutates_store();
    // Held until the snapshot is saved so concurrent invocations serialize.
    let _lock = mutates
        .then(|| StoreLock::acquire(&store_path))
        .transpose()?;
    let store = MemoryStore::open(&store_path)?;
    let app = App::new(store).with_gene_list_limit(config.gene_list_limit);
    let caller = cli
        .caller
        .as_deref()
        .map(str::parse::<Caller>)
        .transpose()?
        .or(config.caller);

    let result = run_command(&app, caller.as_ref(), cli.command, output_mode);
    if mutates {
        // Rows flushed before a failure stay committed, so save either way.
        if let Err(err) = app.store().save(&store_path) {
            if result.is_ok() {
                return Err(err.into());
            }
            tracing::warn!(error = %err, "failed to save store after failed command");
        }
    }
    result
}

fn require_caller(caller: Option<&Caller>) -> Result<&Caller, GenevizError> {
    caller.ok_or_else(|| {
        GenevizError::InvalidRequest("caller identity required (--caller)".to_string())
    })
}

fn run_command(
    app: &App<MemoryStore>,
    caller: Option<&Caller>,
    command: Commands,
    output_mode: OutputMode,
) -> miette::Result<()> {
    match command {
        Commands::Project(command) => {
            run_project(app, require_caller(caller)?, command, output_mode)
        }
        Commands::Dataset(command) => {
            run_dataset(app, require_caller(caller)?, command, output_mode)
        }
        Commands::Upload(command) => run_upload(app, require_caller(caller)?, command, output_mode),
        Commands::Query(command) => run_query(app, require_caller(caller)?, command, output_mode),
        Commands::Export(command) => run_export(app, require_caller(caller)?, command, output_mode),
        Commands::Admin(command) => run_admin(app, command, output_mode),
    }
}

fn run_project(
    app: &App<MemoryStore>,
    caller: &Caller,
    command: ProjectCommand,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let projects = match command {
        ProjectCommand::List => app.list_projects(caller)?,
        ProjectCommand::Create { name } => vec![app.create_project(caller, &name)?],
    };
    let printed = match output_mode {
        OutputMode::Json => JsonOutput::print(&projects),
        OutputMode::Text => TextOutput::print_projects(&projects),
    };
    printed.into_diagnostic()
}

fn run_dataset(
    app: &App<MemoryStore>,
    caller: &Caller,
    command: DatasetCommand,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let datasets = match command {
        DatasetCommand::List { project } => app.list_datasets(caller, project)?,
        DatasetCommand::Create { project, name } => {
            vec![app.create_dataset(caller, project, &name)?]
        }
    };
    let printed = match output_mode {
        OutputMode::Json => JsonOutput::print(&datasets),
        OutputMode::Text => TextOutput::print_datasets(&datasets),
    };
    printed.into_diagnostic()
}

fn run_upload(
    app: &App<MemoryStore>,
    caller: &Caller,
    command: UploadCommand,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let (args, is_fasta) = match command {
        UploadCommand::Fasta(args) => (args, true),
        UploadCommand::Tsv(args) => (args, false),
    };
    let bytes = std::fs::read(args.file.as_std_path()).map_err(|err| {
        GenevizError::Filesystem(format!("read {}: {err}", args.file))
    })?;
    let target = UploadTarget {
        project_id: args.project,
        dataset_id: args.dataset,
        dataset_name: args.dataset_name,
    };
    let summary = if is_fasta {
        app.upload_fasta(caller, &target, &bytes)?
    } else {
        app.upload_tsv(caller, &target, &bytes)?
    };
    let printed = match output_mode {
        OutputMode::Json => JsonOutput::print(&summary),
        OutputMode::Text => TextOutput::print_upload(&summary),
    };
    printed.into_diagnostic()
}

fn run_query(
    app: &App<MemoryStore>,
    caller: &Caller,
    command: QueryCommand,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let printed = match command {
        QueryCommand::Sequences { target, genes } => {
            let genes = NameList::required(genes.as_deref(), "--genes")?;
            let records = app.sequences(caller, target.dataset, target.project, &genes)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print(&records),
                OutputMode::Text => TextOutput::print_sequences(&records),
            }
        }
        QueryCommand::Expression {
            target,
            genes,
            samples,
        } => {
            let genes = NameList::required(genes.as_deref(), "--genes")?;
            let samples = samples.as_deref().map(NameList::parse);
            let entries = app.expression(
                caller,
                target.dataset,
                target.project,
                &genes,
                samples.as_ref(),
            )?;
            match output_mode {
                OutputMode::Json => JsonOutput::print(&entries),
                OutputMode::Text => TextOutput::print_expression(&entries),
            }
        }
        QueryCommand::Genes { dataset, q, limit } => {
            let names = app.genes(caller, dataset, q.as_deref(), limit)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print(&names),
                OutputMode::Text => TextOutput::print_names(&names),
            }
        }
        QueryCommand::Samples { target } => {
            let names = app.samples(caller, target.dataset, target.project)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print(&names),
                OutputMode::Text => TextOutput::print_names(&names),
            }
        }
        QueryCommand::Matrix { target, genes } => {
            let genes = NameList::required(genes.as_deref(), "--genes")?;
            let matrix = app.matrix(caller, target.dataset, target.project, &genes)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print(&matrix),
                OutputMode::Text => TextOutput::print_matrix(&matrix),
            }
        }
    };
    printed.into_diagnostic()
}

fn run_export(
    app: &App<MemoryStore>,
    caller: &Caller,
    command: ExportCommand,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let ExportCommand::Fasta { target, genes, out } = command;
    let genes = NameList::required(genes.as_deref(), "--genes")?;
    let export = app.export_fasta(caller, target.dataset, target.project, &genes)?;

    let Some(out) = out else {
        return match output_mode {
            OutputMode::Json => JsonOutput::print(&export),
            OutputMode::Text => TextOutput::print_raw(&export.content),
        }
        .into_diagnostic();
    };

    let path = if out.as_std_path().is_dir() {
        out.join(&export.filename)
    } else {
        out
    };
    std::fs::write(path.as_std_path(), export.content.as_bytes())
        .map_err(|err| GenevizError::Filesystem(format!("write {path}: {err}")))?;
    tracing::info!(path = %path, "fasta written");
    let printed = match output_mode {
        OutputMode::Json => JsonOutput::print(&serde_json::json!({
            "filename": export.filename,
            "path": path,
        })),
        OutputMode::Text => TextOutput::print_raw(&format!("{path}\n")),
    };
    printed.into_diagnostic()
}

fn run_admin(
    app: &App<MemoryStore>,
    command: AdminCommand,
    output_mode: OutputMode,
) -> miette::Result<()> {
    match command {
        AdminCommand::SetDefault { dataset, off } => {
            let summary = app.mark_default(dataset, !off)?;
            let printed = match output_mode {
                OutputMode::Json => JsonOutput::print(&summary),
                OutputMode::Text => TextOutput::print_datasets(std::slice::from_ref(&summary)),
            };
            printed.into_diagnostic()
        }
        AdminCommand::DeleteDataset { dataset } => {
            app.delete_dataset(dataset)?;
            let printed = match output_mode {
                OutputMode::Json => JsonOutput::print(&serde_json::json!({ "deleted": dataset })),
                OutputMode::Text => TextOutput::print_raw(&format!("deleted dataset {dataset}\n")),
            };
            printed.into_diagnostic()
        }
    }
}
