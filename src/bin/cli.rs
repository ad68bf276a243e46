use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dqcheck::checkpoint::{ActionConfig, CheckpointConfig, CheckpointResult};
use dqcheck::dataset::{read_csv, CsvReadOptions, DataFrame};
use dqcheck::datasource::{AssetKind, BatchRequest};
use dqcheck::expectation::{ExpectationSuite, ExpectationValidationResult, ValidationResult};
use dqcheck::pipeline::PipelineConfig;
use dqcheck::profile::{render_profiling_page, BasicDatasetProfiler};
use dqcheck::store::write_bytes_atomic;
use dqcheck::validator::validate_batch;
use dqcheck::{format_suite_diff, has_changes, DataContext, DqError};
use tabled::{settings::Style, Table, Tabled};

#[derive(Parser)]
#[command(name = "dqcheck")]
#[command(about = "Expectation-based data quality checks for CSV datasets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data context directory
    #[arg(short, long, env = "DQCHECK_CONTEXT_ROOT", default_value = "./dqcheck")]
    context_root: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data context directory layout
    Init,

    /// Print the first rows of a CSV file
    Head {
        /// CSV or gzip CSV file
        path: PathBuf,

        /// Number of rows to show
        #[arg(short = 'n', long, default_value = "5")]
        rows: usize,

        #[command(flatten)]
        csv: CsvArgs,
    },

    /// Manage datasources and their assets
    Datasource {
        #[command(subcommand)]
        action: DatasourceAction,
    },

    /// Manage expectation suites
    Suite {
        #[command(subcommand)]
        action: SuiteAction,
    },

    /// Manage and run checkpoints
    Checkpoint {
        #[command(subcommand)]
        action: CheckpointAction,
    },

    /// Validate an asset against a suite without running a checkpoint
    Validate {
        #[command(flatten)]
        batch: BatchArgs,

        /// Expectation suite name
        #[arg(short, long)]
        suite: String,

        /// Store the validation result
        #[arg(long)]
        store: bool,

        /// Output format: table, yaml, json
        #[arg(short, long, default_value = "table")]
        output: OutputFormat,
    },

    /// Manage data docs
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },

    /// Profile a CSV file and write an HTML profiling report
    Profile {
        /// CSV or gzip CSV file
        path: PathBuf,

        /// Output HTML file
        #[arg(short, long, default_value = "profile.html")]
        output: PathBuf,

        #[command(flatten)]
        csv: CsvArgs,
    },

    /// Run a pipeline definition end to end
    Run {
        /// Pipeline YAML file
        pipeline: PathBuf,
    },
}

#[derive(Subcommand)]
enum DatasourceAction {
    /// Create or replace a datasource
    Add {
        name: String,
    },
    /// Register a CSV file as an asset of a datasource
    AddCsv {
        /// Datasource name
        datasource: String,

        /// Asset name
        asset: String,

        /// CSV or gzip CSV file
        path: PathBuf,

        #[command(flatten)]
        csv: CsvArgs,
    },
    /// List datasources and assets
    List {
        /// Output format: table, yaml, json
        #[arg(short, long, default_value = "table")]
        output: OutputFormat,
    },
}

#[derive(Subcommand)]
enum SuiteAction {
    /// Create an empty suite
    New {
        name: String,

        /// Replace an existing suite of the same name
        #[arg(long)]
        overwrite: bool,
    },
    /// List suites
    List {
        /// Output format: table, yaml, json
        #[arg(short, long, default_value = "table")]
        output: OutputFormat,
    },
    /// Show a suite's expectations
    Show {
        name: String,

        /// Output format: table, yaml, json
        #[arg(short, long, default_value = "table")]
        output: OutputFormat,
    },
    /// Import a suite from a JSON or YAML file
    Import {
        file: PathBuf,

        /// Show the diff against the stored suite without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Delete a suite
    Delete {
        name: String,
    },
}

#[derive(Subcommand)]
enum CheckpointAction {
    /// Create or replace a checkpoint
    Add {
        name: String,

        #[command(flatten)]
        batch: BatchArgs,

        /// Expectation suite name
        #[arg(short, long)]
        suite: String,

        /// strftime template for run names
        #[arg(long)]
        run_name_template: Option<String>,

        /// Leave out the store_validation_result action
        #[arg(long)]
        no_store: bool,

        /// Leave out the update_data_docs action
        #[arg(long)]
        no_docs: bool,
    },
    /// List checkpoints
    List {
        /// Output format: table, yaml, json
        #[arg(short, long, default_value = "table")]
        output: OutputFormat,
    },
    /// Print a checkpoint's configuration as YAML
    Show {
        name: String,
    },
    /// Run a checkpoint
    Run {
        name: String,

        /// Output format: table, yaml, json
        #[arg(short, long, default_value = "table")]
        output: OutputFormat,
    },
}

#[derive(Subcommand)]
enum DocsAction {
    /// Render every suite and stored validation result
    Build,
}

#[derive(Args)]
struct CsvArgs {
    /// The file has no header row
    #[arg(long)]
    no_header: bool,

    /// Infer column types instead of reading everything as strings
    #[arg(long)]
    infer_schema: bool,

    /// Field delimiter
    #[arg(long, default_value = ",")]
    delimiter: char,
}

impl CsvArgs {
    fn options(&self) -> CsvReadOptions {
        CsvReadOptions::new()
            .header(!self.no_header)
            .infer_schema(self.infer_schema)
            .delimiter(self.delimiter)
    }
}

#[derive(Args)]
struct BatchArgs {
    /// Datasource name
    #[arg(short, long)]
    datasource: String,

    /// Data asset name
    #[arg(short, long)]
    asset: String,

    /// Only validate the first N rows
    #[arg(long)]
    limit: Option<usize>,
}

impl BatchArgs {
    fn request(&self) -> BatchRequest {
        let request = BatchRequest::new(&self.datasource, &self.asset);
        match self.limit {
            Some(limit) => request.with_limit(limit),
            None => request,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Yaml,
    Json,
}

#[derive(Tabled)]
struct AssetRow {
    datasource: String,
    asset: String,
    #[tabled(rename = "type")]
    kind: String,
    location: String,
}

#[derive(Tabled)]
struct SuiteRow {
    suite: String,
    expectations: usize,
}

#[derive(Tabled)]
struct ExpectationRow {
    column: String,
    expectation_type: String,
    description: String,
}

#[derive(Tabled)]
struct CheckpointRow {
    name: String,
    suite: String,
    batch: String,
    actions: String,
}

#[derive(Tabled)]
struct ResultRow {
    status: String,
    expectation_type: String,
    column: String,
    unexpected: String,
    observed: String,
}

impl From<&ExpectationValidationResult> for ResultRow {
    fn from(r: &ExpectationValidationResult) -> Self {
        let status = if r.raised_exception() {
            "error"
        } else if r.success {
            "✓"
        } else {
            "✗"
        };
        let unexpected = match (r.result.unexpected_count, r.result.unexpected_percent) {
            (Some(count), Some(percent)) => format!("{} ({:.2}%)", count, percent),
            _ => String::new(),
        };
        let observed = if r.raised_exception() {
            r.exception_info.exception_message.clone().unwrap_or_default()
        } else {
            r.result.observed_value.as_ref().map(|v| v.to_string()).unwrap_or_default()
        };
        Self {
            status: status.to_string(),
            expectation_type: r.expectation_config.expectation_type().to_string(),
            column: r.expectation_config.column().unwrap_or("-").to_string(),
            unexpected,
            observed,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("dqcheck=debug,info")
    } else {
        EnvFilter::new("dqcheck=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(e);
            ExitCode::FAILURE
        }
    }
}

fn print_error(err: Box<dyn std::error::Error>) {
    if let Some(DqError::Action { name, message }) = err.downcast_ref::<DqError>() {
        eprintln!("\x1b[31m✗ Action '{}' failed:\x1b[0m {}", name, message);
        return;
    }

    eprintln!("\x1b[31m✗ Error:\x1b[0m {}", err);
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let root = cli.context_root;

    match cli.command {
        Commands::Init => {
            let context = DataContext::get_context(&root)?;
            println!("✓ {}", context);
        }

        Commands::Head { path, rows, csv } => {
            let frame = read_csv(&path, &csv.options())?;
            print_frame(&frame, rows);
        }

        Commands::Datasource { action } => {
            let mut context = DataContext::get_context(&root)?;
            cmd_datasource(&mut context, action)?;
        }

        Commands::Suite { action } => {
            let context = DataContext::get_context(&root)?;
            cmd_suite(&context, action)?;
        }

        Commands::Checkpoint { action } => {
            let context = DataContext::get_context(&root)?;
            cmd_checkpoint(&context, action)?;
        }

        Commands::Validate { batch, suite, store, output } => {
            let context = DataContext::get_context(&root)?;
            cmd_validate(&context, &batch.request(), &suite, store, output)?;
        }

        Commands::Docs { action: DocsAction::Build } => {
            let context = DataContext::get_context(&root)?;
            let report = context.build_data_docs()?;
            println!("✓ Built {} data docs pages", report.page_count());
            println!("  {}", report.index.display());
        }

        Commands::Profile { path, output, csv } => {
            cmd_profile(&path, &output, &csv.options())?;
        }

        Commands::Run { pipeline } => {
            let mut context = DataContext::get_context(&root)?;
            cmd_run_pipeline(&mut context, &pipeline)?;
        }
    }

    Ok(())
}

fn print_frame(frame: &DataFrame, rows: usize) {
    println!("root");
    for field in &frame.schema().fields {
        println!(
            " |-- {}: {} (nullable = {})",
            field.name,
            field.column_type,
            field.nullable
        );
    }
    println!();
    println!("{}", frame.render_table(rows));
    println!(
        "\n{} rows x {} columns",
        frame.row_count(),
        frame.column_count()
    );
}

fn cmd_datasource(context: &mut DataContext, action: DatasourceAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        DatasourceAction::Add { name } => {
            context.add_or_update_datasource(&name)?;
            println!("✓ Datasource '{}' saved", name);
        }

        DatasourceAction::AddCsv { datasource, asset, path, csv } => {
            if context.get_datasource(&datasource).is_err() {
                context.add_or_update_datasource(&datasource)?;
            }
            let request = context.add_csv_asset(&datasource, &asset, path, csv.options())?;
            println!("✓ Asset '{}.{}' registered", request.datasource_name, request.data_asset_name);
        }

        DatasourceAction::List { output } => {
            let datasources = context.list_datasources();
            if datasources.is_empty() {
                println!("No datasources in {}", context.root().display());
                return Ok(());
            }

            let rows: Vec<AssetRow> = datasources
                .iter()
                .flat_map(|ds| {
                    let assets: Vec<AssetRow> = ds
                        .assets()
                        .map(|a| AssetRow {
                            datasource: ds.name.clone(),
                            asset: a.name.clone(),
                            kind: match &a.kind {
                                AssetKind::Dataframe => "dataframe".to_string(),
                                AssetKind::Csv { .. } => "csv".to_string(),
                            },
                            location: match &a.kind {
                                AssetKind::Dataframe => "(in memory)".to_string(),
                                AssetKind::Csv { path, .. } => path.display().to_string(),
                            },
                        })
                        .collect();
                    if assets.is_empty() {
                        vec![AssetRow {
                            datasource: ds.name.clone(),
                            asset: "-".to_string(),
                            kind: "-".to_string(),
                            location: "-".to_string(),
                        }]
                    } else {
                        assets
                    }
                })
                .collect();

            match output {
                OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&context.config().datasources)?),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&context.config().datasources)?),
                OutputFormat::Table => print_table(rows),
            }
        }
    }
    Ok(())
}

fn cmd_suite(context: &DataContext, action: SuiteAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SuiteAction::New { name, overwrite } => {
            if overwrite {
                context.add_or_update_expectation_suite(&name)?;
            } else {
                context.add_expectation_suite(&name)?;
            }
            let path = context.expectations_store().path_for(&name)?;
            println!("✓ Suite '{}' saved to {}", name, path.display());
        }

        SuiteAction::List { output } => {
            let suites = context.expectations_store().load_all()?;
            if suites.is_empty() {
                println!("No expectation suites in {}", context.root().display());
                return Ok(());
            }
            match output {
                OutputFormat::Yaml => {
                    let names: Vec<&str> = suites.iter().map(|s| s.name()).collect();
                    println!("{}", serde_yaml::to_string(&names)?);
                }
                OutputFormat::Json => {
                    let names: Vec<&str> = suites.iter().map(|s| s.name()).collect();
                    println!("{}", serde_json::to_string_pretty(&names)?);
                }
                OutputFormat::Table => print_table(
                    suites
                        .iter()
                        .map(|s| SuiteRow {
                            suite: s.name().to_string(),
                            expectations: s.len(),
                        })
                        .collect(),
                ),
            }
        }

        SuiteAction::Show { name, output } => {
            let suite = context.get_expectation_suite(&name)?;
            match output {
                OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&suite)?),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&suite)?),
                OutputFormat::Table => {
                    println!("{} ({} expectations)\n", suite.name(), suite.len());
                    print_table(
                        suite
                            .expectations
                            .iter()
                            .map(|e| ExpectationRow {
                                column: e.column().unwrap_or("-").to_string(),
                                expectation_type: e.expectation_type().to_string(),
                                description: e.expectation.describe(),
                            })
                            .collect(),
                    );
                }
            }
        }

        SuiteAction::Import { file, dry_run } => {
            let content = std::fs::read_to_string(&file)?;
            let suite: ExpectationSuite = match file.extension().and_then(|e| e.to_str()) {
                Some("yml") | Some("yaml") => serde_yaml::from_str(&content)?,
                _ => serde_json::from_str(&content)?,
            };
            for config in &suite.expectations {
                config.expectation.validate()?;
            }

            if let Ok(existing) = context.get_expectation_suite(suite.name()) {
                if !has_changes(&existing, &suite) {
                    println!("✓ Suite '{}' is unchanged", suite.name());
                    return Ok(());
                }
                println!("Changes to '{}':", suite.name());
                println!("{}", format_suite_diff(&existing, &suite)?);
            }

            if dry_run {
                println!("Dry run: nothing written");
                return Ok(());
            }

            let path = context.save_expectation_suite(&suite)?;
            println!("✓ Suite '{}' saved to {}", suite.name(), path.display());
        }

        SuiteAction::Delete { name } => {
            context.delete_expectation_suite(&name)?;
            println!("✓ Suite '{}' deleted", name);
        }
    }
    Ok(())
}

fn cmd_checkpoint(context: &DataContext, action: CheckpointAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        CheckpointAction::Add { name, batch, suite, run_name_template, no_store, no_docs } => {
            let mut actions = Vec::new();
            if !no_store {
                actions.push(ActionConfig::store_validation_result());
            }
            if !no_docs {
                actions.push(ActionConfig::update_data_docs());
            }

            let mut config = CheckpointConfig::new(&name)
                .with_batch_request(batch.request())
                .with_expectation_suite_name(&suite)
                .with_action_list(actions);
            if let Some(template) = run_name_template {
                config = config.with_run_name_template(template);
            }

            let path = context.add_or_update_checkpoint(&config)?;
            println!("✓ Checkpoint '{}' saved to {}\n", name, path.display());
            print!("{}", config.to_yaml_str()?);
        }

        CheckpointAction::List { output } => {
            let names = context.list_checkpoints()?;
            if names.is_empty() {
                println!("No checkpoints in {}", context.root().display());
                return Ok(());
            }
            let configs = names
                .iter()
                .map(|n| context.checkpoint_store().load(n))
                .collect::<Result<Vec<_>, _>>()?;

            match output {
                OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&configs)?),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&configs)?),
                OutputFormat::Table => print_table(
                    configs
                        .iter()
                        .map(|c| CheckpointRow {
                            name: c.name.clone(),
                            suite: c.expectation_suite_name.clone().unwrap_or_else(|| "-".to_string()),
                            batch: c
                                .batch_request
                                .as_ref()
                                .map(|b| format!("{}.{}", b.datasource_name, b.data_asset_name))
                                .unwrap_or_else(|| "-".to_string()),
                            actions: c
                                .action_list
                                .iter()
                                .map(|a| a.name.as_str())
                                .collect::<Vec<_>>()
                                .join(", "),
                        })
                        .collect(),
                ),
            }
        }

        CheckpointAction::Show { name } => {
            let checkpoint = context.get_checkpoint(&name)?;
            print!("{}", checkpoint.config().to_yaml_str()?);
        }

        CheckpointAction::Run { name, output } => {
            let result = context.run_checkpoint(&name)?;
            print_checkpoint_result(&result, output)?;
            if !result.success {
                return Err(format!("Checkpoint '{}' failed", name).into());
            }
        }
    }
    Ok(())
}

fn cmd_validate(
    context: &DataContext,
    request: &BatchRequest,
    suite_name: &str,
    store: bool,
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let batch = context.get_batch(request)?;
    let suite = context.get_expectation_suite(suite_name)?;
    let result = validate_batch(&batch, &suite);

    if store {
        let (id, _) = context.store_validation_result(&result)?;
        info!("Stored validation result {}", id);
    }

    print_validation_result(&result, output)?;

    if !result.success {
        return Err(format!(
            "Validation failed: {} of {} expectations unsuccessful",
            result.failed_count(),
            result.statistics.evaluated_expectations
        )
        .into());
    }
    Ok(())
}

fn cmd_profile(path: &PathBuf, output: &PathBuf, options: &CsvReadOptions) -> Result<(), Box<dyn std::error::Error>> {
    let frame = read_csv(path, options)?;
    let stem = path
        .file_name()
        .map(|n| n.to_string_lossy().split('.').next().unwrap_or_default().to_string())
        .unwrap_or_else(|| "dataset".to_string());
    let result = BasicDatasetProfiler::profile(&frame, &format!("{}.profile", stem), &stem);

    write_bytes_atomic(output, render_profiling_page(&result).as_bytes())?;
    println!(
        "✓ Profiled {} rows x {} columns ({} expectations)",
        result.profile.row_count,
        result.profile.column_count,
        result.suite.len()
    );
    println!("  {}", output.display());
    Ok(())
}

fn cmd_run_pipeline(context: &mut DataContext, path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = PipelineConfig::load(path)?;
    let report = pipeline.run(context)?;

    println!("{}", report.preview);
    println!("\n{} rows x {} columns\n", report.row_count, report.column_count);

    for r in &report.expectation_results {
        let mark = if r.success { "\x1b[32m✓\x1b[0m" } else { "\x1b[31m✗\x1b[0m" };
        println!("{} {}", mark, r.expectation_config.expectation.describe());
    }
    println!("\nSuite saved to {}\n", report.suite_path.display());

    print!("{}", report.checkpoint_yaml);
    println!();
    print_checkpoint_result(&report.checkpoint_result, OutputFormat::Table)?;

    if let Some(index) = &report.docs_index {
        println!("\nData docs: {}", index.display());
    }
    if let Some(profile) = &report.profile_path {
        println!("Profiling report: {}", profile.display());
    }

    if !report.success() {
        return Err("Pipeline checkpoint failed".into());
    }
    Ok(())
}

fn print_checkpoint_result(result: &CheckpointResult, output: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(result)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Table => {
            println!("Checkpoint '{}' run {}\n", result.name(), result.run_id);
            for run in &result.run_results {
                print_validation_result(&run.validation_result, OutputFormat::Table)?;
                for action in &run.actions_results {
                    for path in action.paths() {
                        println!("  {} → {}", action.name, path.display());
                    }
                }
            }
            let status = if result.success {
                "\x1b[32m✓ Checkpoint succeeded\x1b[0m"
            } else {
                "\x1b[31m✗ Checkpoint failed\x1b[0m"
            };
            println!("\n{}: {} expectations evaluated, {} failed", status, result.evaluated_count(), result.failed_count());
        }
    }
    Ok(())
}

fn print_validation_result(result: &ValidationResult, output: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(result)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Table => {
            println!(
                "Suite '{}' on batch '{}'\n",
                result.meta.expectation_suite_name, result.meta.batch_id
            );
            print_table(result.results.iter().map(ResultRow::from).collect());
            println!(
                "\n  ✓ {} passed\n  ✗ {} failed",
                result.passed_count(),
                result.failed_count()
            );
        }
    }
    Ok(())
}

fn print_table<T: Tabled>(rows: Vec<T>) {
    let mut table = Table::new(rows);
    table.with(Style::markdown());
    println!("{}", table);
}
