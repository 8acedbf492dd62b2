use async_trait::async_trait;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use filingqa_cli::{InteractionLoop, Outcome, EXAMPLE_QUESTIONS};
use filingqa_core::traits::QuestionAnswerer;
use filingqa_core::types::Answer;
use filingqa_core::{Error, Result};

/// Fails every question containing "fail", otherwise echoes a long answer.
#[derive(Default)]
struct CountingAnswerer {
    calls: AtomicUsize,
}

#[async_trait]
impl QuestionAnswerer for CountingAnswerer {
    async fn answer(&self, question: &str) -> Result<Answer> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if question.contains("fail") {
            return Err(Error::upstream("database unreachable: connection refused"));
        }
        Ok(Answer::new(
            "Acme Corp is headquartered in Springfield, where it has designed and sold anvils to coyotes for well over fifty years.",
            vec!["acme-item1-chunk0000".to_string()],
        ))
    }
}

fn setup() -> (Arc<CountingAnswerer>, InteractionLoop) {
    let answerer = Arc::new(CountingAnswerer::default());
    let repl = InteractionLoop::new(answerer.clone(), 40).without_spinner();
    (answerer, repl)
}

#[tokio::test]
async fn blank_questions_make_no_calls() {
    let (answerer, repl) = setup();
    let mut out = Vec::new();
    for q in ["", "   ", "\t\n"] {
        assert_eq!(repl.handle(q, &mut out).await.expect("handle"), Outcome::Skipped);
    }
    assert_eq!(answerer.calls.load(Ordering::SeqCst), 0);
    assert!(out.is_empty());
}

#[tokio::test]
async fn answer_is_wrapped_with_sources() {
    let (answerer, repl) = setup();
    let mut out = Vec::new();
    let outcome = repl.handle("Where is Acme headquartered?", &mut out).await.expect("handle");
    assert_eq!(outcome, Outcome::Answered);
    let text = String::from_utf8(out).expect("utf8");

    assert_eq!(answerer.calls.load(Ordering::SeqCst), 1);
    assert!(text.starts_with("### Answer:\n"));
    assert!(text.lines().all(|l| l.chars().count() <= 40 || l.starts_with("Sources:")), "{text}");
    assert!(text.contains("Sources: acme-item1-chunk0000"));
}

#[tokio::test]
async fn errors_are_shown_and_loop_continues() {
    let (answerer, repl) = setup();
    let input = Cursor::new("please fail\nWhere is Acme headquartered?\n/quit\nnever asked\n");
    let mut out = Vec::new();
    repl.run(input, &mut out).await.expect("run");
    let text = String::from_utf8(out).expect("utf8");

    assert_eq!(answerer.calls.load(Ordering::SeqCst), 2);
    assert!(text.contains("❌ Error getting answer: "), "{text}");
    assert!(text.contains("connection refused"));
    assert!(text.contains("### Answer:"));
    assert!(text.contains("👋 Goodbye!"));
}

#[tokio::test]
async fn commands_are_not_questions() {
    let (answerer, repl) = setup();
    let input = Cursor::new("/help\n\n   \n/examples\n");
    let mut out = Vec::new();
    repl.run(input, &mut out).await.expect("run until EOF");
    let text = String::from_utf8(out).expect("utf8");

    assert_eq!(answerer.calls.load(Ordering::SeqCst), 0);
    for q in EXAMPLE_QUESTIONS {
        assert!(text.contains(q), "missing example {q}");
    }
    assert!(text.matches("/examples").count() >= 2);
}

#[tokio::test]
async fn failed_answer_is_reported_to_the_caller() {
    let (answerer, repl) = setup();
    let mut out = Vec::new();
    let outcome = repl.handle("this one should fail", &mut out).await.expect("handle");
    assert_eq!(outcome, Outcome::Failed);
    assert_eq!(answerer.calls.load(Ordering::SeqCst), 1);
    assert!(String::from_utf8(out).expect("utf8").starts_with("❌ Error getting answer: "));
}
