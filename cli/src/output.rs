//! Console rendering of council events and results.

use colored::Colorize;
use council_domain::{CouncilEvent, CouncilOutcome, Stage};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;

/// Output format for the finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Stream events and print the final answer
    Text,
    /// Print the complete outcome as JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Renders the event stream as it arrives.
pub struct EventPrinter {
    spinner: Option<ProgressBar>,
    show_answers: bool,
    streaming_final: bool,
}

impl EventPrinter {
    pub fn new(show_answers: bool) -> Self {
        Self {
            spinner: None,
            show_answers,
            streaming_final: false,
        }
    }

    fn start_spinner(&mut self, message: String) {
        self.finish_spinner();
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(120));
        self.spinner = Some(pb);
    }

    fn finish_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    fn println(&self, line: String) {
        match &self.spinner {
            Some(pb) => pb.println(line),
            None => println!("{line}"),
        }
    }

    pub fn handle(&mut self, event: &CouncilEvent) {
        match event {
            CouncilEvent::StageUpdate { stage, message } => {
                if *stage == Stage::FinalResponse {
                    self.finish_spinner();
                    println!("{}", format!("== {stage} ==").bold().cyan());
                    println!("{}", message.dimmed());
                    println!();
                } else {
                    self.println(format!("{}", format!("== {stage} ==").bold().cyan()));
                    self.start_spinner(message.clone());
                }
            }
            CouncilEvent::ModelResponse { answer } => {
                self.println(format!(
                    "  {} {} answered ({} chars)",
                    "v".green(),
                    answer.model.short_name().bold(),
                    answer.content.len()
                ));
                if self.show_answers {
                    self.println(format!("{}\n", answer.content.dimmed()));
                }
            }
            CouncilEvent::Review { ranking } => {
                self.println(format!(
                    "  {} {} ranked {} answers (top choice: {})",
                    "v".green(),
                    ranking.reviewer.short_name().bold(),
                    ranking.entries.len(),
                    ranking.top_choice().short_name()
                ));
            }
            CouncilEvent::RagContext { stats } => {
                self.println(format!(
                    "  {} {} chunks from {} source(s) in {}ms",
                    "k".blue(),
                    stats.chunks_retrieved,
                    stats.sources.len(),
                    stats.retrieval_ms
                ));
            }
            CouncilEvent::ConflictDetected { conflict } => {
                self.println(format!(
                    "  {} {} conflict between {} and {} ({:.0}%): {}",
                    "!".yellow().bold(),
                    conflict.conflict_type.to_string().to_uppercase().yellow(),
                    conflict.side_a.source_name,
                    conflict.side_b.source_name,
                    conflict.confidence * 100.0,
                    conflict.explanation
                ));
            }
            CouncilEvent::FinalResponse { content } => {
                self.finish_spinner();
                self.streaming_final = true;
                print!("{content}");
                let _ = std::io::stdout().flush();
            }
            CouncilEvent::Error {
                model,
                message,
                fatal,
            } => {
                let prefix = if *fatal { "FATAL" } else { "warn" };
                let line = match model {
                    Some(model) => format!("  {} {}: {}", "x".red(), model.short_name(), message),
                    None => format!("  {} {prefix}: {}", "x".red(), message),
                };
                self.println(line);
            }
            CouncilEvent::Complete { stats } => {
                self.finish_spinner();
                if self.streaming_final {
                    println!();
                }
                println!();
                println!(
                    "{}",
                    format!(
                        "Council complete: {} answers, {} reviews{}",
                        stats.answers_received,
                        stats.reviews_received,
                        match &stats.rag {
                            Some(rag) => format!(
                                ", {} chunks, {} conflicts",
                                rag.chunks_retrieved, rag.conflicts_detected
                            ),
                            None => String::new(),
                        }
                    )
                    .dimmed()
                );
            }
        }
    }

    pub fn finish(&mut self) {
        self.finish_spinner();
    }
}

/// Print the complete outcome in the requested format.
pub fn print_outcome(outcome: &CouncilOutcome, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            // The event stream already printed everything
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(outcome)?);
        }
    }
    Ok(())
}
