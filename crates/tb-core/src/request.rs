//! Inference requests and prompt rendering.

use crate::instruction::Instruction;
use crate::message::{ChatMessage, ConversationMemory};

/// Instruction text plus the conversation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceRequest {
    instruction: String,
    history: Vec<ChatMessage>,
}

impl InferenceRequest {
    /// Request without history.
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            history: Vec::new(),
        }
    }

    /// Request with history, oldest message first.
    pub fn with_history(instruction: impl Into<String>, history: Vec<ChatMessage>) -> Self {
        Self {
            instruction: instruction.into(),
            history,
        }
    }

    /// Build from the library's instruction object and optional memory.
    pub fn from_parts<I, M>(instruction: &I, memory: Option<&M>) -> Self
    where
        I: Instruction + ?Sized,
        M: ConversationMemory + ?Sized,
    {
        let history = memory.map(|m| m.to_messages()).unwrap_or_default();
        Self::with_history(instruction.render().into_owned(), history)
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Prior conversation, oldest first.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Render the prompt sent across the host boundary.
    ///
    /// Without history this is exactly the instruction. With history, each
    /// message becomes `"{role}: {content}"`, followed by a blank line and
    /// `"user: {instruction}"`.
    pub fn render_prompt(&self) -> String {
        if self.history.is_empty() {
            return self.instruction.clone();
        }

        let context = self
            .history
            .iter()
            .map(ChatMessage::render_line)
            .collect::<Vec<_>>()
            .join("\n");

        format!("{}\n\nuser: {}", context, self.instruction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::AugmentedInstruction;

    #[test]
    fn test_empty_history_is_instruction_verbatim() {
        for text in ["", "Which country sells most?", "line one\nline two\n", "user: already prefixed"] {
            let req = InferenceRequest::new(text);
            assert_eq!(req.render_prompt(), text);
        }

        let req = InferenceRequest::with_history("q", Vec::new());
        assert_eq!(req.render_prompt(), "q");
    }

    #[test]
    fn test_history_rendered_in_order() {
        let history = vec![
            ChatMessage::system("You analyse tables."),
            ChatMessage::user("Top 5 rows?"),
            ChatMessage::assistant("Here they are."),
        ];
        let req = InferenceRequest::with_history("Now plot them", history);
        let prompt = req.render_prompt();

        let lines: Vec<&str> = prompt.split('\n').collect();
        assert_eq!(
            lines,
            vec![
                "system: You analyse tables.",
                "user: Top 5 rows?",
                "assistant: Here they are.",
                "",
                "user: Now plot them",
            ]
        );
    }

    #[test]
    fn test_history_line_count_matches() {
        for n in 1..8 {
            let history: Vec<ChatMessage> = (0..n)
                .map(|i| ChatMessage::user(format!("message {}", i)))
                .collect();
            let prompt = InferenceRequest::with_history("final", history).render_prompt();
            let (context, tail) = prompt.split_once("\n\n").unwrap();

            let context_lines: Vec<&str> = context.lines().collect();
            assert_eq!(context_lines.len(), n);
            for (i, line) in context_lines.iter().enumerate() {
                assert_eq!(*line, format!("user: message {}", i));
            }
            assert_eq!(tail, "user: final");
        }
    }

    #[test]
    fn test_from_parts_uses_rendered_instruction() {
        let instruction = AugmentedInstruction::new("base", " + hints");
        let memory = vec![ChatMessage::user("earlier")];

        let req = InferenceRequest::from_parts(&instruction, Some(&memory));
        assert_eq!(req.instruction(), "base + hints");
        assert_eq!(req.history().len(), 1);

        let req = InferenceRequest::from_parts::<_, Vec<ChatMessage>>(&instruction, None);
        assert!(req.history().is_empty());
        assert_eq!(req.render_prompt(), "base + hints");
    }
}
