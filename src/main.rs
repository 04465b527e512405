use aiexplain::assets::{EnvFileOutcome, write_env_template};
use aiexplain::config::{Config, DEFAULT_ENV_FILE};
use aiexplain::pipeline::{self, AnalysisRequest};
use aiexplain::report;
use aiexplain::services::agent::{CompletionClient, build_prompt};
use aiexplain::services::database::DatabaseManager;
use aiexplain::services::sql::{extract_table_names, single_statement, strip_explain_prefix};
use anyhow::{Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Explain a MySQL query and ask a language model how to make it faster.
#[derive(Debug, Parser)]
#[command(name = "aiexplain", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// SQL statement to analyze; a leading EXPLAIN is ignored
    sql: Option<String>,

    /// Settings file
    #[arg(long, global = true, default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// Only print the analysis, not the collected schema and plan
    #[arg(short, long)]
    quiet: bool,

    /// Print the analysis in one block once it is complete
    #[arg(long)]
    no_stream: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a settings template to the env file
    Env,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(Command::Env) = cli.command {
        return create_env_file(&cli.env_file);
    }

    let Some(raw_sql) = cli.sql.as_deref() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = Config::load(&cli.env_file)?;
    tracing::debug!("Loaded settings: {:?}", config);

    let sql = single_statement(strip_explain_prefix(raw_sql))?;
    if sql.is_empty() {
        bail!("empty query");
    }

    let tables = extract_table_names(sql);
    if tables.is_empty() {
        bail!("no table names detected in query");
    }
    tracing::info!("Tables referenced: {}", tables.join(", "));

    let request = smol::block_on(collect(&config, sql, &tables))?;

    if !cli.quiet {
        print!("{}", report::render_request(&request));
    }

    let prompt = build_prompt(&request)?;
    let client = CompletionClient::from_settings(&config.ai)?;

    println!("\nAI analysis:");
    if cli.no_stream {
        let answer = client.complete(&prompt, None)?;
        println!("{}", answer);
    } else {
        let mut stdout = io::stdout().lock();
        client.complete(&prompt, Some(&mut stdout))?;
        writeln!(stdout)?;
    }

    Ok(())
}

/// Connect, gather metadata, and always disconnect before returning.
async fn collect(config: &Config, sql: &str, tables: &[String]) -> Result<AnalysisRequest> {
    let db = DatabaseManager::new();
    db.connect(&config.database).await?;

    let result = pipeline::gather(&db, sql, tables).await;

    if let Err(e) = db.disconnect().await {
        tracing::warn!("Failed to close database connection: {:#}", e);
    }

    result
}

fn create_env_file(path: &Path) -> Result<()> {
    match write_env_template(path)? {
        EnvFileOutcome::Created => println!("Created {}", path.display()),
        EnvFileOutcome::AlreadyExists => {
            println!("{} already exists, leaving it unchanged", path.display())
        }
    }
    Ok(())
}
