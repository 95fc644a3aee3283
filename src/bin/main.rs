//! entity-sql CLI - Compile catalog queries to SQL
//!
//! Usage:
//!   entity-sql compile <catalog.toml> [--query <name>] [--dialect <dialect>] [--output sql|json]
//!   entity-sql list <catalog.toml>
//!   entity-sql validate <catalog.toml>
//!
//! Settings are read from `$ENTITY_SQL_CONFIG`, `./entity-sql.toml` or the user
//! config directory; command-line flags override them.

use clap::{Parser, Subcommand, ValueEnum};
use entity_sql::compile::{compile_all, compile_query, Catalog, CompileOutput};
use entity_sql::config::Settings;
use entity_sql::logging::init_logging;
use entity_sql::sql::Dialect;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "entity-sql")]
#[command(about = "Compile entity query models to dialect-specific SQL")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile catalog queries to SQL
    Compile {
        /// Path to the catalog (.toml or .json); defaults to the configured catalog
        file: Option<PathBuf>,

        /// Name of the query to compile (compiles every query if not specified)
        #[arg(short, long)]
        query: Option<String>,

        /// SQL dialect to generate (defaults to the configured dialect)
        #[arg(short, long)]
        dialect: Option<DialectArg>,

        /// Quote every identifier
        #[arg(long)]
        escape_identifiers: bool,

        /// Output format
        #[arg(short, long, default_value = "sql")]
        output: OutputFormat,
    },

    /// List entities and queries in a catalog
    List {
        /// Path to the catalog (.toml or .json)
        file: Option<PathBuf>,
    },

    /// Validate a catalog and compile every query without printing SQL
    Validate {
        /// Path to the catalog (.toml or .json)
        file: Option<PathBuf>,
    },
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Ansi,
    Postgres,
    Mysql,
    Tsql,
    Duckdb,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Ansi => Dialect::Ansi,
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Mysql => Dialect::MySql,
            DialectArg::Tsql => Dialect::TSql,
            DialectArg::Duckdb => Dialect::DuckDb,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Output SQL only
    Sql,
    /// Output SQL with its parameter bindings as JSON
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(&settings.logging) {
        eprintln!("Error initializing logging: {}", e);
        return ExitCode::FAILURE;
    }

    match cli.command {
        Commands::Compile {
            file,
            query,
            dialect,
            escape_identifiers,
            output,
        } => cmd_compile(settings, file, query, dialect, escape_identifiers, output),
        Commands::List { file } => cmd_list(&settings, file),
        Commands::Validate { file } => cmd_validate(&settings, file),
    }
}

/// Load the catalog named on the command line, or the configured one.
fn load_catalog(settings: &Settings, file: Option<PathBuf>) -> Option<(PathBuf, Catalog)> {
    let path = match file {
        Some(path) => path,
        None => match settings.catalog_path() {
            Ok(Some(path)) => path,
            Ok(None) => {
                eprintln!("No catalog given and none configured");
                return None;
            }
            Err(e) => {
                eprintln!("Error resolving configured catalog: {}", e);
                return None;
            }
        },
    };

    match Catalog::from_file(&path) {
        Ok(catalog) => Some((path, catalog)),
        Err(e) => {
            eprintln!("Error loading catalog '{}': {}", path.display(), e);
            None
        }
    }
}

fn cmd_compile(
    mut settings: Settings,
    file: Option<PathBuf>,
    query: Option<String>,
    dialect: Option<DialectArg>,
    escape_identifiers: bool,
    output: OutputFormat,
) -> ExitCode {
    let Some((_, catalog)) = load_catalog(&settings, file) else {
        return ExitCode::FAILURE;
    };

    if let Some(dialect) = dialect {
        settings.builder.dialect = dialect.into();
    }
    if escape_identifiers {
        settings.builder.escape_identifiers = true;
    }

    let result = match &query {
        Some(name) => compile_query(&catalog, name, &settings.builder).map(|o| vec![o]),
        None => compile_all(&catalog, &settings.builder),
    };

    match result {
        Ok(outputs) => {
            match output {
                OutputFormat::Sql => print_sql(&outputs),
                OutputFormat::Json => match serde_json::to_string_pretty(&outputs) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error serializing output: {}", e);
                        return ExitCode::FAILURE;
                    }
                },
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Compilation error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_sql(outputs: &[CompileOutput]) {
    for (i, output) in outputs.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("-- {} ({}, {})", output.name, output.statement, output.dialect);
        println!("{};", output.result.query);
    }
}

fn cmd_list(settings: &Settings, file: Option<PathBuf>) -> ExitCode {
    let Some((path, catalog)) = load_catalog(settings, file) else {
        return ExitCode::FAILURE;
    };

    println!("File: {}", path.display());
    println!();

    if !catalog.entities.is_empty() {
        println!("Entities:");
        for entity in &catalog.entities {
            println!("  - {} (table: {})", entity.name, entity.table_name());
        }
        println!();
    }

    if catalog.queries.is_empty() {
        println!("No queries defined.");
    } else {
        println!("Queries:");
        for (name, definition) in &catalog.queries {
            println!(
                "  - {} ({} on {})",
                name, definition.statement, definition.query.entity
            );
        }
    }

    ExitCode::SUCCESS
}

fn cmd_validate(settings: &Settings, file: Option<PathBuf>) -> ExitCode {
    let Some((path, catalog)) = load_catalog(settings, file) else {
        return ExitCode::FAILURE;
    };

    if let Err(e) = catalog.registry() {
        eprintln!("Validation error: {}", e);
        return ExitCode::FAILURE;
    }
    if catalog.queries.is_empty() {
        println!(
            "OK: {} is valid ({} entities, no queries)",
            path.display(),
            catalog.entities.len()
        );
        return ExitCode::SUCCESS;
    }

    match compile_all(&catalog, &settings.builder) {
        Ok(outputs) => {
            println!(
                "OK: {} is valid ({} entities, {} queries)",
                path.display(),
                catalog.entities.len(),
                outputs.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Validation error: {}", e);
            ExitCode::FAILURE
        }
    }
}
