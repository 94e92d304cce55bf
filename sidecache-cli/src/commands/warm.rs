//! `warm` subcommand: preload the store and activate the current version.

use sidecache::agent::Agent;

use crate::error::CliError;

pub async fn run(agent: &Agent) -> Result<(), CliError> {
    let startup = agent.on_startup().await?;
    println!(
        "startup: {} asset(s) warmed, {} failed",
        startup.warmed, startup.failed
    );

    let activation = agent.on_activate().await;
    println!(
        "activation: {} stale partition(s) removed, {} skipped",
        activation.removed.len(),
        activation.skipped.len()
    );
    for skipped in &activation.skipped {
        println!("  left behind: {skipped}");
    }

    Ok(())
}
