use std::sync::Arc;
use weave_llm::Message;

use crate::cost::MessageCost;

/// Keeps the most recent suffix of a history that fits a cost budget
///
/// Guarantees:
/// - a leading system message is always kept, at position 0
/// - the most recent message is always kept, even when it alone exceeds the budget
/// - messages are never truncated
/// - the window never opens on a `ToolResult` whose requesting AI message was cut
pub struct HistoryTrimmer {
    budget: usize,
    cost: Arc<dyn MessageCost>,
}

impl HistoryTrimmer {
    pub fn new(budget: usize, cost: Arc<dyn MessageCost>) -> Self {
        Self { budget, cost }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn trim(&self, messages: &[Message]) -> Vec<Message> {
        let (system, rest) = match messages.split_first() {
            Some((first @ Message::System { .. }, rest)) => (Some(first), rest),
            _ => (None, messages),
        };

        let mut remaining = self
            .budget
            .saturating_sub(system.map_or(0, |m| self.cost.cost(m)));

        let mut start = rest.len();
        for (index, message) in rest.iter().enumerate().rev() {
            let cost = self.cost.cost(message);
            if start < rest.len() && cost > remaining {
                break;
            }
            remaining = remaining.saturating_sub(cost);
            start = index;
        }

        let start = Self::repair_tool_boundary(rest, start);

        let mut trimmed = Vec::with_capacity(rest.len() - start + 1);
        if let Some(system) = system {
            trimmed.push(system.clone());
        }
        trimmed.extend_from_slice(&rest[start..]);

        tracing::debug!(
            input = messages.len(),
            kept = trimmed.len(),
            budget = self.budget,
            "trimmed history"
        );

        trimmed
    }

    /// Move `start` back to the AI message owning a leading tool result, or
    /// forward past results whose request no longer exists
    fn repair_tool_boundary(messages: &[Message], start: usize) -> usize {
        if !matches!(messages.get(start), Some(Message::ToolResult { .. })) {
            return start;
        }

        let owner = messages[..start]
            .iter()
            .rposition(|m| !matches!(m, Message::ToolResult { .. }));

        match owner {
            Some(index) if messages[index].has_tool_calls() => index,
            _ => {
                let skip = messages[start..]
                    .iter()
                    .take_while(|m| matches!(m, Message::ToolResult { .. }))
                    .count();
                // Never drop the most recent message
                (start + skip).min(messages.len().saturating_sub(1))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::MessageCount;

    fn trimmer(budget: usize) -> HistoryTrimmer {
        HistoryTrimmer::new(budget, Arc::new(MessageCount))
    }

    #[test]
    fn test_under_budget_keeps_everything() {
        let history = vec![Message::system("s"), Message::human("a"), Message::ai("b")];
        assert_eq!(trimmer(10).trim(&history), history);
    }

    #[test]
    fn test_empty_history() {
        assert!(trimmer(3).trim(&[]).is_empty());
    }

    #[test]
    fn test_zero_budget_keeps_latest() {
        let history = vec![Message::human("a"), Message::ai("b")];
        let trimmed = trimmer(0).trim(&history);
        assert_eq!(trimmed, vec![history[1].clone()]);
    }

    #[test]
    fn test_orphan_tool_result_extends_to_request() {
        use weave_llm::ToolCall;

        let history = vec![
            Message::human("search"),
            Message::ai_with_tools("", vec![ToolCall::new("c1", "web_search", "{}")]),
            Message::tool_result("c1", "web_search", "r"),
            Message::ai("answer"),
        ];

        let trimmed = trimmer(2).trim(&history);
        assert_eq!(trimmed, history[1..].to_vec());
    }
}
