//! GrainDB command-line shell
//!
//! An interactive statement shell over a file-backed database directory.
//!
//! ```bash
//! # Start an interactive session against ./data
//! graindb-cli
//!
//! # Use another data directory
//! graindb-cli --data-dir /tmp/mydb
//!
//! # Execute a single statement and exit
//! graindb-cli -c "SELECT * FROM users"
//! ```

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use graindb::{Database, FileStorage, StatementResult};

/// GrainDB interactive shell
#[derive(Parser, Debug)]
#[command(
    name = "graindb",
    version,
    about = "Shell for the GrainDB embedded data store"
)]
struct Args {
    /// Directory holding the schema and table documents
    #[arg(short, long, default_value = "data")]
    data_dir: String,

    /// Execute a single statement and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut db = Database::open(FileStorage::new(&args.data_dir)?)?;

    if let Some(statement) = &args.command {
        print_result(&db.execute(statement)?);
        return Ok(());
    }
    repl(&mut db)
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("graindb=debug")
    } else {
        EnvFilter::from_default_env()
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn repl(db: &mut Database<FileStorage>) -> Result<()> {
    println!("GrainDB shell - type 'exit' to quit");
    let mut editor = DefaultEditor::new()?;

    loop {
        match editor.readline("graindb> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
                    break;
                }
                let _ = editor.add_history_entry(line);

                match db.execute(line) {
                    Ok(result) => print_result(&result),
                    Err(e) => println!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn print_result(result: &StatementResult) {
    if matches!(result, StatementResult::Empty) {
        return;
    }
    println!("{}", render(result));
}

/// Renders a result for the terminal
///
/// Row sets get a header, a dash rule, and one pipe-separated line per
/// row; everything else prints its status text.
fn render(result: &StatementResult) -> String {
    match result {
        StatementResult::Rows { columns, rows } => {
            if rows.is_empty() {
                return "Empty set".to_string();
            }
            let mut out = columns.join(" | ");
            out.push('\n');
            out.push_str(&"-".repeat(columns.len() * 15));
            for row in rows {
                let fields: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                out.push('\n');
                out.push_str(&fields.join(" | "));
            }
            out
        }
        other => other.to_string(),
    }
}
