use std::sync::Arc;
use weave_context::{cost_function, HistoryTrimmer, MessageCost, MessageCount};
use weave_llm::{Message, ToolCall};
use weave_types::CostFunction;

/// Cost equal to the character length of the text
struct CharCost;

impl MessageCost for CharCost {
    fn cost(&self, message: &Message) -> usize {
        message.content().to_plain_text().chars().count()
    }
}

fn conversation(turns: usize) -> Vec<Message> {
    let mut history = vec![Message::system("You are helpful.")];
    for i in 0..turns {
        history.push(Message::human(format!("question {}", i)));
        history.push(Message::ai(format!("answer {}", i)));
    }
    history
}

#[test]
fn test_system_kept_and_suffix_retained() {
    let history = conversation(10);
    let trimmer = HistoryTrimmer::new(5, Arc::new(MessageCount));

    let trimmed = trimmer.trim(&history);

    assert_eq!(trimmed.len(), 5);
    assert_eq!(trimmed[0], history[0]);
    assert_eq!(&trimmed[1..], &history[history.len() - 4..]);
}

#[test]
fn test_system_kept_when_budget_exhausted() {
    let history = conversation(3);
    let trimmer = HistoryTrimmer::new(1, Arc::new(MessageCount));

    let trimmed = trimmer.trim(&history);

    assert_eq!(trimmed.len(), 2);
    assert!(matches!(trimmed[0], Message::System { .. }));
    assert_eq!(trimmed[1], *history.last().unwrap());
}

#[test]
fn test_oversized_latest_message_is_not_truncated() {
    let huge = "x".repeat(500);
    let history = vec![Message::human("short"), Message::human(huge.clone())];
    let trimmer = HistoryTrimmer::new(10, Arc::new(CharCost));

    let trimmed = trimmer.trim(&history);

    assert_eq!(trimmed.len(), 1);
    assert_eq!(trimmed[0].content().as_text(), Some(huge.as_str()));
}

#[test]
fn test_cumulative_cost_within_budget() {
    let history = conversation(20);
    let budget = 60;
    let trimmer = HistoryTrimmer::new(budget, Arc::new(CharCost));

    let trimmed = trimmer.trim(&history);
    let total: usize = trimmed.iter().map(|m| CharCost.cost(m)).sum();

    assert!(total <= budget);
    assert!(trimmed.len() > 2);
}

#[test]
fn test_deterministic_and_idempotent() {
    let history = conversation(15);
    let trimmer = HistoryTrimmer::new(7, Arc::new(MessageCount));

    let once = trimmer.trim(&history);
    let again = trimmer.trim(&history);
    let twice = trimmer.trim(&once);

    assert_eq!(once, again);
    assert_eq!(once, twice);
}

#[test]
fn test_tool_exchange_is_never_split() {
    let mut history = conversation(2);
    history.push(Message::human("look it up"));
    history.push(Message::ai_with_tools(
        "",
        vec![
            ToolCall::new("c1", "web_search", "{}"),
            ToolCall::new("c2", "web_search", "{}"),
        ],
    ));
    history.push(Message::tool_result("c1", "web_search", "one"));
    history.push(Message::tool_result("c2", "web_search", "two"));
    history.push(Message::ai("done"));

    // Budget lands inside the two tool results
    let trimmer = HistoryTrimmer::new(3, Arc::new(MessageCount));
    let trimmed = trimmer.trim(&history);

    assert!(matches!(trimmed[0], Message::System { .. }));
    assert!(trimmed[1].has_tool_calls());
    assert_eq!(trimmed.len(), 5);
}

#[test]
fn test_token_cost_function() {
    let history = conversation(50);
    let trimmer = HistoryTrimmer::new(100, cost_function(CostFunction::Tokens).unwrap());

    let trimmed = trimmer.trim(&history);

    assert!(trimmed.len() < history.len());
    assert!(matches!(trimmed[0], Message::System { .. }));
    assert_eq!(trimmed.last(), history.last());
}
