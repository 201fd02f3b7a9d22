use std::sync::Mutex;

use lead_map::assistant::{MAX_CONTEXT_CHARS, TRUNCATION_NOTE};
use lead_map::{SuggestionProvider, Unavailable, answer_question, build_question_prompt};

/// Records the prompt it was sent and replies with fixed text.
struct EchoProvider {
    reply: String,
    prompt: Mutex<Option<String>>,
}

impl EchoProvider {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompt: Mutex::new(None),
        }
    }
}

impl SuggestionProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    fn complete(&self, prompt: &str) -> Result<String, Unavailable> {
        *self.prompt.lock().unwrap() = Some(prompt.to_string());
        Ok(self.reply.clone())
    }
}

#[test]
fn question_prompt_frames_the_context() {
    let context = "=== Buyers Data ===\nTotal Records: 3";
    let prompt = build_question_prompt("  How many buyers?  ", context);
    insta::assert_snapshot!(prompt, @r"
    You are a helpful data analyst assistant. Answer the user's question based on the provided data context.

    USER QUESTION: How many buyers?

    DATA CONTEXT:
    === Buyers Data ===
    Total Records: 3

    INSTRUCTIONS:
    - Answer based ONLY on the data provided above
    - Include specific numbers and statistics when relevant
    - If the data doesn't contain information to answer the question, say so clearly
    - Be concise but informative
    - Format numbers with commas for readability

    ANSWER:
    ");
}

#[test]
fn long_context_is_cut() {
    let context = "x".repeat(MAX_CONTEXT_CHARS + 500);
    let prompt = build_question_prompt("why?", &context);
    assert!(prompt.contains(&format!("{}…\n\n{TRUNCATION_NOTE}", "x".repeat(MAX_CONTEXT_CHARS))));
    assert!(!prompt.contains(&"x".repeat(MAX_CONTEXT_CHARS + 1)));
}

#[test]
fn answer_is_trimmed_and_prompt_sent_once() {
    let provider = EchoProvider::new("\n  You have 3 buyers.  \n");
    let answer = answer_question(&provider, "How many buyers?", "Total Records: 3").unwrap();
    assert_eq!(answer, "You have 3 buyers.");
    let sent = provider.prompt.lock().unwrap().clone().expect("prompt sent");
    assert!(sent.contains("USER QUESTION: How many buyers?"));
    assert!(sent.contains("DATA CONTEXT:\nTotal Records: 3\n"));
}

#[test]
fn blank_answer_is_unavailable() {
    let provider = EchoProvider::new("   ");
    assert_eq!(
        answer_question(&provider, "q", "ctx"),
        Err(Unavailable::EmptyResponse)
    );
}
