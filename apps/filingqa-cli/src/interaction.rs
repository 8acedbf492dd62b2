//! The `question>` prompt loop.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use filingqa_core::traits::QuestionAnswerer;
use filingqa_core::types::is_blank_question;

use crate::wrap::fill;

pub const EXAMPLE_QUESTIONS: [&str; 5] = [
    "What is Netflix's primary business?",
    "Where is Apple headquartered?",
    "What are the top risks mentioned in Johnson & Johnson's 10-K?",
    "Where are the primary suppliers for Tesla?",
    "How is ExxonMobil addressing climate change and the energy transition?",
];

/// What [`InteractionLoop::handle`] did with one line of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Skipped,
    Answered,
    Failed,
}

pub struct InteractionLoop {
    answerer: Arc<dyn QuestionAnswerer>,
    wrap_width: usize,
    spinner: bool,
}

impl InteractionLoop {
    pub fn new(answerer: Arc<dyn QuestionAnswerer>, wrap_width: usize) -> Self {
        Self { answerer, wrap_width, spinner: true }
    }

    /// Disable the progress spinner (tests, piped input).
    pub fn without_spinner(mut self) -> Self {
        self.spinner = false;
        self
    }

    fn progress(&self) -> ProgressBar {
        if !self.spinner {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Searching for relevant information...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Answer one question. Failures are printed and reported as
    /// [`Outcome::Failed`]; only a broken output stream is an error.
    pub async fn handle<W: Write>(&self, question: &str, out: &mut W) -> io::Result<Outcome> {
        if is_blank_question(question) {
            return Ok(Outcome::Skipped);
        }
        let pb = self.progress();
        let result = self.answerer.answer(question.trim()).await;
        pb.finish_and_clear();

        match result {
            Ok(answer) => {
                writeln!(out, "### Answer:")?;
                writeln!(out, "{}", fill(&answer.text, self.wrap_width))?;
                if answer.has_sources() {
                    writeln!(out)?;
                    writeln!(out, "Sources: {}", answer.sources.join(", "))?;
                }
                Ok(Outcome::Answered)
            }
            Err(e) => {
                tracing::debug!(error = %e, "question failed");
                writeln!(out, "❌ Error getting answer: {e}")?;
                Ok(Outcome::Failed)
            }
        }
    }

    pub async fn run<R: BufRead, W: Write>(&self, mut input: R, out: &mut W) -> io::Result<()> {
        writeln!(out, "📊 Financial Document Q&A System")?;
        writeln!(out, "================================")?;
        writeln!(out, "Ask questions about companies based on their SEC 10-K filings.")?;
        writeln!(out)?;
        show_examples(out)?;
        show_help(out)?;

        loop {
            write!(out, "question> ")?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                break;
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match line {
                "/help" | "/h" => show_help(out)?,
                "/examples" | "/e" => show_examples(out)?,
                "/quit" | "/q" | "quit" | "exit" => {
                    writeln!(out, "👋 Goodbye!")?;
                    break;
                }
                question => {
                    self.handle(question, out).await?;
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

fn show_examples<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "### Example Questions:")?;
    for q in EXAMPLE_QUESTIONS {
        writeln!(out, "- {q}")?;
    }
    writeln!(out)
}

fn show_help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "Commands:")?;
    writeln!(out, "  /help      - Show this help message")?;
    writeln!(out, "  /examples  - List example questions")?;
    writeln!(out, "  /quit      - Exit")?;
    writeln!(out, "  <question> - Ask about any company")?;
    writeln!(out)
}
