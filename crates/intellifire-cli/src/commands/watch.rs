//! `firectl watch` -- stream snapshots until interrupted.

use intellifire_core::Coordinator;

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    coordinator: &Coordinator,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut rx = coordinator.subscribe();
    let mut remaining = args.count;

    // Show the snapshot setup already published before waiting for changes.
    emit(&rx.borrow_and_update().clone(), global)?;
    if decrement(&mut remaining) {
        return Ok(());
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                emit(&rx.borrow_and_update().clone(), global)?;
                if decrement(&mut remaining) {
                    break;
                }
            }
        }
    }
    Ok(())
}

fn emit(data: &intellifire_api::PollData, global: &GlobalOpts) -> Result<(), CliError> {
    match global.output {
        OutputFormat::Text => output::print_watch_line(data),
        OutputFormat::Json => println!("{}", serde_json::to_string(data)?),
    }
    Ok(())
}

fn decrement(remaining: &mut Option<u32>) -> bool {
    match remaining {
        Some(n) => {
            *n = n.saturating_sub(1);
            *n == 0
        }
        None => false,
    }
}
