//! `clear` subcommand: send a CLEAR_CACHE control message.

use serde_json::json;
use tokio::sync::oneshot;

use sidecache::agent::Agent;

use crate::error::CliError;

pub async fn run(agent: &Agent) -> Result<(), CliError> {
    let (reply_tx, reply_rx) = oneshot::channel();
    agent.on_control(json!({"type": "CLEAR_CACHE"}), reply_tx).await;

    let reply = reply_rx.await.map_err(|_| CliError::NoReply)?;
    if reply.success {
        println!("cache cleared");
    } else {
        println!("cache clear failed, see logs");
    }

    Ok(())
}
