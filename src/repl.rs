use crate::config::Config;
use crate::core::{CommandResult, Connection, DynamicConnection, DynconnError, Result};
use crate::session::{DynamicSession, EntitySession, SwitchTarget};
use std::io::{BufRead, Write};
use tracing::debug;

/// Session type driven by the REPL.
pub type ReplSession = DynamicSession<EntitySession<DynamicConnection>>;

/// Represents a parsed REPL command.
#[derive(Debug, PartialEq)]
pub enum Command {
    Switch(SwitchTarget),
    Use(String),
    Target(String),
    Status,
    Begin,
    Commit,
    Rollback,
    Help,
    Quit,
    Sql(String),
    Unknown(String),
}

/// Parses a user input string into a corresponding `Command`.
///
/// If the input starts with a colon (`:`), it is interpreted as a command.
/// Otherwise, it is treated as SQL.
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    if !input.starts_with(':') {
        return Command::Sql(input.to_string());
    }
    let trimmed = &input[1..];
    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    if parts.is_empty() {
        return Command::Unknown(input.to_string());
    }
    match parts[0] {
        "switch" => match parse_switch_args(&parts[1..]) {
            Some(target) => Command::Switch(target),
            None => Command::Unknown(input.to_string()),
        },
        "use" => {
            if parts.len() >= 2 {
                Command::Use(parts[1].to_string())
            } else {
                Command::Unknown(input.to_string())
            }
        }
        "target" => {
            if parts.len() >= 2 {
                Command::Target(parts[1].to_string())
            } else {
                Command::Unknown(input.to_string())
            }
        }
        "status" => Command::Status,
        "begin" => Command::Begin,
        "commit" => Command::Commit,
        "rollback" => Command::Rollback,
        "help" => Command::Help,
        "quit" => Command::Quit,
        _ => Command::Unknown(input.to_string()),
    }
}

fn parse_switch_args(args: &[&str]) -> Option<SwitchTarget> {
    if args.is_empty() {
        return None;
    }
    let mut target = SwitchTarget::new();
    for arg in args {
        let (key, value) = arg.split_once('=')?;
        target = match key {
            "database" | "dbname" | "dbName" => target.database(value),
            "user" | "username" => target.username(value),
            "password" => target.password(value),
            "host" => target.host(value),
            "port" => target.port(value.parse().ok()?),
            _ => return None,
        };
    }
    Some(target)
}

/// Executes one command against the session.
pub fn execute(session: &mut ReplSession, config: Option<&Config>, command: Command) -> CommandResult {
    debug!(?command, "Executing REPL command");
    match command {
        Command::Switch(target) => {
            session.switch_target(target)?;
            Ok(Some(status(session)))
        }
        Command::Use(database) => {
            session.switch_database(&database)?;
            Ok(Some(status(session)))
        }
        Command::Target(name) => {
            let config = config.ok_or_else(|| {
                DynconnError::Command("No configuration loaded; named targets unavailable".to_string())
            })?;
            session.switch_target(config.target(&name)?)?;
            Ok(Some(status(session)))
        }
        Command::Status => Ok(Some(status(session))),
        Command::Begin => {
            session.begin_transaction()?;
            Ok(Some("Transaction started".to_string()))
        }
        Command::Commit => {
            session.commit()?;
            Ok(Some("Transaction committed".to_string()))
        }
        Command::Rollback => {
            session.get_connection_mut().rollback()?;
            Ok(Some("Transaction rolled back".to_string()))
        }
        Command::Help => Ok(Some(help_text().to_string())),
        Command::Quit => Ok(None),
        Command::Sql(sql) => {
            if sql.trim().is_empty() {
                return Ok(None);
            }
            session.execute_batch(&sql)?;
            Ok(Some("OK".to_string()))
        }
        Command::Unknown(input) => Err(DynconnError::Command(format!("Unknown command: {}", input))),
    }
}

/// One-line summary of the session's connection.
pub fn status(session: &ReplSession) -> String {
    let conn = session.get_connection();
    format!(
        "database={} connected={} transaction={:?} generation={} handle={}",
        conn.database_name().unwrap_or("-"),
        conn.is_connected(),
        conn.transaction_state(),
        conn.generation(),
        conn.id()
    )
}

fn help_text() -> &'static str {
    "Available commands:
  :switch key=value ... - Redirect the connection (database, user, password, host, port)
  :use <database> - Switch to another database, keeping the other parameters
  :target <name> - Switch to a named target from the configuration
  :status - Show the current connection target
  :begin - Start a transaction
  :commit - Commit the current transaction
  :rollback - Roll back the current transaction
  :help - List all available commands
  :quit - Exit

Or enter SQL statements directly without any prefix."
}

/// Runs a line-oriented shell until `:quit` or end of input.
pub fn run_repl<R: BufRead, W: Write>(
    session: &mut ReplSession,
    config: Option<&Config>,
    input: R,
    mut output: W,
) -> Result<()> {
    writeln!(output, "Welcome to the dynconn REPL! Type :quit to exit.")?;
    writeln!(output, "{}", status(session))?;

    for line in input.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let command = parse_command(trimmed);
        if command == Command::Quit {
            break;
        }
        match execute(session, config, command) {
            Ok(Some(message)) => writeln!(output, "{}", message)?,
            Ok(None) => {}
            Err(e) => writeln!(output, "Error: {}", e)?,
        }
    }
    Ok(())
}
