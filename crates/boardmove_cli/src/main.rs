//! CLI entry point.
//!
//! # Responsibility
//! - Without arguments, print a linkage probe for `boardmove_core`.
//! - With `<config.toml> <operation> <payload-json>`, run one move operation
//!   against the configured store and print the reply and published events.

use boardmove_core::db::open_configured;
use boardmove_core::{
    init_logging_from_config, CoreConfig, MoveGateway, MoveService, RecordingNotifier,
    SqliteBoardRepository, SqliteCommentRepository,
};
use log::info;
use std::process::ExitCode;

const USAGE: &str = "usage: boardmove_cli [<config.toml> <move-card|move-list> <payload-json>]";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => {
            println!("boardmove_core ping={}", boardmove_core::ping());
            println!("boardmove_core version={}", boardmove_core::core_version());
            ExitCode::SUCCESS
        }
        [config_path, operation, payload] => match run(config_path, operation, payload) {
            Ok(true) => ExitCode::SUCCESS,
            Ok(false) => ExitCode::from(1),
            Err(message) => {
                eprintln!("error: {message}");
                ExitCode::from(2)
            }
        },
        _ => {
            eprintln!("{USAGE}");
            ExitCode::from(2)
        }
    }
}

/// Runs one operation. Returns the reply's `ok` flag.
fn run(config_path: &str, operation: &str, payload: &str) -> Result<bool, String> {
    let config = CoreConfig::load(config_path).map_err(|err| err.to_string())?;
    init_logging_from_config(&config)?;
    let conn = open_configured(&config).map_err(|err| err.to_string())?;

    let gateway = MoveGateway::new(
        MoveService::new(SqliteBoardRepository::try_new(&conn).map_err(|err| err.to_string())?),
        SqliteCommentRepository::try_new(&conn).map_err(|err| err.to_string())?,
        RecordingNotifier::new(),
    );

    let reply = gateway.handle_json(operation, payload);
    let events = gateway.notifier().take();
    info!(
        "event=cli_run module=cli status={} operation={} published={}",
        if reply.ok { "ok" } else { "error" },
        operation,
        events.len()
    );

    println!(
        "{}",
        serde_json::to_string(&reply).map_err(|err| err.to_string())?
    );
    for event in &events {
        println!(
            "{}",
            serde_json::to_string(event).map_err(|err| err.to_string())?
        );
    }
    Ok(reply.ok)
}
