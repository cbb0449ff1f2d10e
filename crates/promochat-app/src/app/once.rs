use anyhow::Result;
use colored::Colorize;

use promochat_chat::{Orchestrator, ReplyTier};

/// Send one message and print the settled reply with its suggestions
pub async fn run_once_mode(orchestrator: &Orchestrator, text: &str) -> Result<()> {
    let outcome = match orchestrator.send_message(text).await {
        Some(outcome) => outcome,
        None => anyhow::bail!("Nothing to send: the message is blank"),
    };

    let snapshot = orchestrator.snapshot();
    let reply = snapshot
        .messages
        .iter()
        .find(|m| m.id == outcome.message_id)
        .map(|m| m.content.as_str())
        .unwrap_or_default();

    println!("{}", reply);
    for (i, suggestion) in snapshot.suggestions.iter().enumerate() {
        println!("{}", format!("[{}] {}", i + 1, suggestion).bright_yellow());
    }

    if outcome.tier != ReplyTier::Streamed {
        eprintln!("{}", format!("(answered by {:?} tier)", outcome.tier).bright_black());
    }

    Ok(())
}
