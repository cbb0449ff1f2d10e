use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::future::Future;
use std::io::Write;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use promochat_chat::{ChatEvent, Orchestrator};
use promochat_types::{BackendMode, Role};

use crate::app::printer::EventPrinter;
use crate::app::setup::{parse_mode, AppConfig};
use crate::cli::Cli;

/// One line of REPL input
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Send(String),
    /// Send quick-reply number N (1-based)
    Pick(usize),
    Open(Option<String>),
    Close,
    Clear,
    /// Set a mode, or toggle when none is given
    Mode(Option<BackendMode>),
    History,
    Help,
    Quit,
    Invalid(String),
}

/// Parse a REPL line; `None` for blank input
pub fn parse_command(line: &str) -> Option<ReplCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Ok(n) = line.parse::<usize>() {
        if (1..=promochat_types::MAX_SUGGESTIONS).contains(&n) {
            return Some(ReplCommand::Pick(n));
        }
    }

    let Some(command) = line.strip_prefix('/') else {
        return Some(ReplCommand::Send(line.to_string()));
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (command, None),
    };

    let parsed = match name {
        "open" => ReplCommand::Open(arg.map(str::to_string)),
        "close" => ReplCommand::Close,
        "clear" => ReplCommand::Clear,
        "mode" => match arg {
            None => ReplCommand::Mode(None),
            Some(value) => match parse_mode(value) {
                Ok(mode) => ReplCommand::Mode(Some(mode)),
                Err(e) => ReplCommand::Invalid(e.to_string()),
            },
        },
        "history" => ReplCommand::History,
        "help" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        other => ReplCommand::Invalid(format!("Unknown command '/{}'", other)),
    };
    Some(parsed)
}

/// Run interactive REPL mode
pub async fn run_repl_mode(cli: &Cli, app_config: AppConfig) -> Result<()> {
    let orchestrator = app_config.orchestrator;
    let mut feed = EventFeed::new(orchestrator.clone());

    println!("{}", "PromoChat assistant".bright_cyan().bold());
    match &app_config.data_dir {
        Some(dir) => println!("{}", format!("History stored in {}", dir.display()).bright_black()),
        None => println!("{}", "Ephemeral session: history is not saved".bright_black()),
    }

    let snapshot = orchestrator.snapshot();
    println!(
        "{}",
        format!(
            "Backend: {} • {} restored messages • type /help for commands\n",
            snapshot.backend_mode,
            snapshot.messages.len()
        )
        .bright_black()
    );

    feed.drive(orchestrator.open_chat(cli.trigger.as_deref(), None)).await;

    let mut rl = DefaultEditor::new()?;

    loop {
        let mode = orchestrator.snapshot().backend_mode;
        let prompt = format!("{} {} ", format!("[{}]", mode).bright_magenta(), "You:".bright_green().bold());

        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".bright_black());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".bright_cyan());
                break;
            }
            Err(err) => {
                eprintln!("{} {}", "Error:".bright_red().bold(), err);
                break;
            }
        };

        let Some(command) = parse_command(&line) else {
            continue;
        };
        rl.add_history_entry(line.trim())?;

        match command {
            ReplCommand::Send(text) => {
                feed.drive(orchestrator.send_message(&text)).await;
            }
            ReplCommand::Pick(n) => {
                let suggestions = orchestrator.snapshot().suggestions;
                match suggestions.get(n - 1) {
                    Some(text) => {
                        println!("{} {}", "You:".bright_green().bold(), text);
                        feed.drive(orchestrator.send_message(text)).await;
                    }
                    None => eprintln!("{} No suggestion number {}", "⚠️".yellow(), n),
                }
            }
            ReplCommand::Open(trigger) => {
                feed.drive(orchestrator.open_chat(trigger.as_deref(), None)).await;
            }
            ReplCommand::Close => {
                orchestrator.close_chat();
                feed.flush();
            }
            ReplCommand::Clear => {
                orchestrator.clear_chat();
                feed.flush();
            }
            ReplCommand::Mode(Some(mode)) => {
                orchestrator.set_backend_mode(mode);
                feed.flush();
            }
            ReplCommand::Mode(None) => {
                orchestrator.toggle_backend_mode();
                feed.flush();
            }
            ReplCommand::History => print_history(&orchestrator),
            ReplCommand::Help => print_help(),
            ReplCommand::Quit => {
                println!("{}", "Goodbye!".bright_cyan());
                break;
            }
            ReplCommand::Invalid(message) => eprintln!("{} {}", "❌".bright_red(), message),
        }
    }

    Ok(())
}

/// Prints the orchestrator's events while commands run.
struct EventFeed {
    orchestrator: Orchestrator,
    events: broadcast::Receiver<ChatEvent>,
    printer: EventPrinter,
}

impl EventFeed {
    fn new(orchestrator: Orchestrator) -> Self {
        let events = orchestrator.subscribe();
        Self {
            orchestrator,
            events,
            printer: EventPrinter::new(),
        }
    }

    /// Run `task` while printing the events it produces, then drain the rest.
    async fn drive<F, T>(&mut self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        tokio::pin!(task);

        let result = loop {
            tokio::select! {
                result = &mut task => break result,
                event = self.events.recv() => match event {
                    Ok(event) => emit(&mut self.printer, &event),
                    Err(RecvError::Lagged(skipped)) => self.catch_up(skipped),
                    Err(RecvError::Closed) => {}
                },
            }
        };

        self.flush();
        result
    }

    fn flush(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => emit(&mut self.printer, &event),
                Err(TryRecvError::Lagged(skipped)) => self.catch_up(skipped),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    /// Events were dropped; redraw the reply in progress from current state.
    fn catch_up(&mut self, skipped: u64) {
        log::debug!("Printer skipped {} events, resyncing", skipped);
        let text = self.printer.resync(&self.orchestrator.snapshot());
        if !text.is_empty() {
            print!("{}", text);
            let _ = std::io::stdout().flush();
        }
    }
}

fn emit(printer: &mut EventPrinter, event: &ChatEvent) {
    let text = printer.render(event);
    if !text.is_empty() {
        print!("{}", text);
        let _ = std::io::stdout().flush();
    }
}

fn print_history(orchestrator: &Orchestrator) {
    let snapshot = orchestrator.snapshot();
    if snapshot.messages.is_empty() {
        println!("{}", "No messages yet".bright_black());
        return;
    }

    for message in &snapshot.messages {
        let time = message.timestamp.format("%Y-%m-%d %H:%M");
        let who = match message.role {
            Role::User => "You".bright_green().bold(),
            Role::Ai => "Assistant".bright_cyan().bold(),
            Role::System => "System".bright_black().bold(),
        };
        println!("{} {}: {}", time.to_string().bright_black(), who, message.content);
    }
}

fn print_help() {
    println!("{}", "Commands:".bright_cyan().bold());
    println!("  <text>            send a message");
    println!("  1-3               send the numbered quick-reply");
    println!("  /open [subject]   open the chat, optionally greeting about a subject");
    println!("  /close            close the chat (history is kept)");
    println!("  /clear            forget the conversation");
    println!("  /mode [remote|local]  switch backend (toggles without an argument)");
    println!("  /history          show the conversation so far");
    println!("  /help             show this help");
    println!("  /quit             exit");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_text_is_sent() {
        assert_eq!(parse_command("  你好  "), Some(ReplCommand::Send("你好".to_string())));
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn test_numbers_pick_suggestions() {
        assert_eq!(parse_command("2"), Some(ReplCommand::Pick(2)));
        assert_eq!(parse_command("4"), Some(ReplCommand::Send("4".to_string())));
        assert_eq!(parse_command("0"), Some(ReplCommand::Send("0".to_string())));
    }

    #[test]
    fn test_commands() {
        assert_eq!(parse_command("/open"), Some(ReplCommand::Open(None)));
        assert_eq!(
            parse_command("/open 游戏机制"),
            Some(ReplCommand::Open(Some("游戏机制".to_string())))
        );
        assert_eq!(parse_command("/close"), Some(ReplCommand::Close));
        assert_eq!(parse_command("/clear"), Some(ReplCommand::Clear));
        assert_eq!(parse_command("/history"), Some(ReplCommand::History));
        assert_eq!(parse_command("/help"), Some(ReplCommand::Help));
        assert_eq!(parse_command("/quit"), Some(ReplCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ReplCommand::Quit));
    }

    #[test]
    fn test_mode_command() {
        assert_eq!(parse_command("/mode"), Some(ReplCommand::Mode(None)));
        assert_eq!(parse_command("/mode local"), Some(ReplCommand::Mode(Some(BackendMode::Local))));
        assert_eq!(parse_command("/mode  remote "), Some(ReplCommand::Mode(Some(BackendMode::Remote))));
        assert!(matches!(parse_command("/mode cloud"), Some(ReplCommand::Invalid(_))));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse_command("/dance"),
            Some(ReplCommand::Invalid("Unknown command '/dance'".to_string()))
        );
    }
}
