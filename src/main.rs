use std::{io::Write, process::ExitCode};

use lembar::{
    config::EngineConfig,
    executor::meta_command::Command,
    storage::database::Database,
    types::error::DatabaseError,
};
use rustyline::{DefaultEditor, error::ReadlineError};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "Usage: lembar <database file> [command]";

fn read_multiline_command(rl: &mut DefaultEditor) -> rustyline::Result<String> {
    let mut input = String::new();
    let mut prompt = "lembar> ".to_string();

    loop {
        let line = rl.readline(&prompt)?;
        let trimmed_line = line.trim_end();

        // trailing backslash continues the command on the next line
        if let Some(continued) = trimmed_line.strip_suffix('\\') {
            input.push_str(continued);
            input.push(' ');
            prompt = "     -> ".to_string();
        } else {
            input.push_str(trimmed_line);
            break;
        }
    }

    Ok(input)
}

fn run_command(database: &mut Database, input: &str) -> Result<String, DatabaseError> {
    Command::parse(input)?.execute(database)
}

/// Returns false when the shell should exit.
fn process_command(database: &mut Database, command: &str) -> bool {
    let cmd = command.trim();

    match cmd.to_lowercase().as_str() {
        "exit" | "quit" | ".exit" | ".quit" => return false,
        "help" | ".help" => {
            println!(
                r#"
Available commands:
  .dbinfo          - Show page size and catalog size
  .tables          - List user tables
  .schema          - Print the CREATE statements of the catalog
  SELECT ...       - Run a query
  exit, quit       - Leave the shell

Use '\' at the end of a line for multiline input.
"#
            );
        }
        "clear" => {
            print!("\x1B[2J\x1B[1;1H");
            let _ = std::io::stdout().flush();
        }
        "" => {}
        _ => match run_command(database, cmd) {
            Ok(output) => println!("{}", output),
            Err(e) => eprintln!("Error: {}", e),
        },
    }

    true
}

fn repl(database: &mut Database, config: &EngineConfig) -> rustyline::Result<()> {
    let mut rl = DefaultEditor::new()?;
    if rl.load_history(&config.history_file).is_err() {
        tracing::debug!(path = %config.history_file.display(), "no history loaded");
    }

    loop {
        match read_multiline_command(&mut rl) {
            Ok(input) => {
                let command = input.trim().to_string();
                if command.is_empty() {
                    continue;
                }
                rl.add_history_entry(&command)?;
                if !process_command(database, &command) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    if let Err(e) = rl.save_history(&config.history_file) {
        tracing::warn!("failed to save history: {e}");
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lembar=warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("{}", USAGE);
        return ExitCode::FAILURE;
    };
    let command = args.collect::<Vec<_>>().join(" ");

    let mut database = match Database::open(&path, &config) {
        Ok(database) => database,
        Err(e) => {
            eprintln!("Failed to open {}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    if command.trim().is_empty() {
        return match repl(&mut database, &config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    match run_command(&mut database, &command) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(DatabaseError::UnknownCommand(name)) => {
            println!("Unknown command {}", name);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
