//! Console presentation — reads lines from stdin, submits them through the
//! exchange coordinator, prints the resulting turns to stdout.
//!
//! This layer renders whatever the conversation log contains and owns no
//! dialogue state of its own beyond the pending-input field. Runs until
//! the `shutdown` token is cancelled (Ctrl-C) or stdin is closed.
//!
//! Input handling:
//! - `/demo` reprints the example questions
//! - `/demo N` copies question N into the pending input without sending it
//! - an empty line sends the pending input, if any; otherwise it is ignored
//! - anything else is sent as the question

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ConsoleConfig;
use crate::conversation::{Message, Role, Source};
use crate::coordinator::{ExchangeCoordinator, SubmitOutcome};
use crate::demo::{self, PendingInput};
use crate::error::AppError;

/// What one input line asks the console to do.
#[derive(Debug, PartialEq, Eq)]
enum LineAction {
    /// Empty after trimming — send the pending input, if any.
    Blank,
    /// `/demo` with no number.
    ListDemos,
    /// `/demo N`.
    PickDemo(usize),
    /// A question to submit as-is.
    Text(String),
}

fn parse_line(line: &str) -> LineAction {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineAction::Blank;
    }
    if let Some(rest) = trimmed.strip_prefix("/demo") {
        let rest = rest.trim();
        if rest.is_empty() {
            return LineAction::ListDemos;
        }
        if let Ok(n) = rest.parse::<usize>() {
            return LineAction::PickDemo(n);
        }
    }
    LineAction::Text(trimmed.to_string())
}

// ── Rendering ────────────────────────────────────────────────────────────────

/// Similarity as a rounded percentage, e.g. `0.87` -> `87%`.
fn format_similarity(similarity: f64) -> String {
    format!("{:.0}%", similarity * 100.0)
}

fn render_source(source: &Source) -> String {
    format!(
        "    - {} (similarity: {})",
        source.document_name,
        format_similarity(source.similarity)
    )
}

fn render_message(message: &Message) -> String {
    match message.role {
        Role::User => format!("you> {}", message.content),
        Role::Error => format!("error> {}", message.content),
        Role::Assistant => {
            let mut out = format!("assistant> {}", message.content);
            if !message.sources.is_empty() {
                out.push_str("\n  Sources:");
                for source in &message.sources {
                    out.push('\n');
                    out.push_str(&render_source(source));
                }
            }
            out
        }
    }
}

fn print_banner(config: &ConsoleConfig) {
    println!("─────────────────────────────────");
    println!(" {} chat  (Ctrl-C to quit)", config.title);
    println!("─────────────────────────────────");
    println!("Ask me anything about our company.");
    print_demos();
}

fn print_demos() {
    println!("Try these questions (`/demo N` to prefill one):");
    for (i, question) in demo::DEMO_QUESTIONS.iter().enumerate() {
        println!("  {}. {question}", i + 1);
    }
}

// ── Console loop ─────────────────────────────────────────────────────────────

pub async fn run(
    coordinator: Arc<ExchangeCoordinator>,
    config: &ConsoleConfig,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    info!("console started");
    print_banner(config);

    let mut pending = PendingInput::new();
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    loop {
        if pending.is_empty() {
            print!("> ");
        } else {
            print!("> [{}] (Enter to send) ", pending.peek());
        }
        use std::io::Write as _;
        let _ = std::io::stdout().flush();

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                println!("\nshutting down");
                info!("console shutting down");
                break;
            }

            line = lines.next_line() => {
                match line {
                    Err(e) => {
                        warn!("stdin read error: {e}");
                        break;
                    }
                    Ok(None) => {
                        info!("stdin closed");
                        break;
                    }
                    Ok(Some(line)) => {
                        debug!(line = %line, "console received line");
                        handle_line(&coordinator, &mut pending, &line).await;
                    }
                }
            }
        }
    }

    Ok(())
}

async fn handle_line(
    coordinator: &ExchangeCoordinator,
    pending: &mut PendingInput,
    line: &str,
) {
    let input = match parse_line(line) {
        LineAction::ListDemos => {
            print_demos();
            return;
        }
        LineAction::PickDemo(n) => {
            match demo::pick(n) {
                Some(question) => pending.set(question),
                None => println!("no demo question {n} (1-{})", demo::DEMO_QUESTIONS.len()),
            }
            return;
        }
        LineAction::Blank => {
            if pending.is_empty() {
                return;
            }
            pending.take()
        }
        LineAction::Text(text) => {
            // Typed text replaces whatever was prefilled.
            pending.take();
            text
        }
    };

    let before = coordinator.len();
    println!("…");
    match coordinator.submit(&input).await {
        SubmitOutcome::Ignored => {}
        SubmitOutcome::Busy => println!("still waiting on the previous question"),
        SubmitOutcome::Completed => {
            // The user turn and its outcome both landed during submit.
            for message in coordinator.snapshot().iter().skip(before) {
                println!("{}", render_message(message));
            }
        }
    }
}
