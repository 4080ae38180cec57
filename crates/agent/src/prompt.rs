//! Prompt assembly.
//!
//! Builds the ordered message sequence sent to the model: system
//! instruction (with the retrieved-context block appended), a bounded
//! window of prior history, and the new user message last. A pure
//! transform — nothing here can fail.

use chatarbor_core::document::KnowledgeDocument;
use chatarbor_core::message::{ChatMessage, Message, Role};

/// Fallback persona when no system instruction is configured.
const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are ChatArbor, a helpful assistant for job seekers. \
Use the provided context from the knowledge base to answer questions accurately. \
If the context is not relevant, say you don't have information on that topic.";

/// Assembles the model-facing conversation for one turn.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    system_instruction: String,
    history_window: usize,
}

impl PromptAssembler {
    pub fn new(system_instruction: impl Into<String>, history_window: usize) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            history_window,
        }
    }

    /// Render retrieved documents into the context block injected into the
    /// system instruction and echoed back through the stream sentinel.
    /// Empty when nothing was retrieved.
    pub fn render_context(&self, documents: &[KnowledgeDocument]) -> String {
        if documents.is_empty() {
            return String::new();
        }

        let mut block =
            String::from("Use the following knowledge base context when answering:\n");
        for doc in documents {
            block.push_str(&format!("- {} (Source: {})\n", doc.content, doc.title));
        }
        block
    }

    /// Build the ordered message sequence for one model invocation.
    pub fn assemble(
        &self,
        retrieved: &[KnowledgeDocument],
        history: &[Message],
        user_message: &str,
    ) -> Vec<ChatMessage> {
        let instruction = if self.system_instruction.trim().is_empty() {
            DEFAULT_SYSTEM_INSTRUCTION
        } else {
            self.system_instruction.as_str()
        };

        let context = self.render_context(retrieved);
        let system = if context.is_empty() {
            instruction.to_string()
        } else {
            format!("{instruction}\n\n{context}")
        };

        let mut messages = vec![ChatMessage::system(system)];

        // Only clean user/assistant turns are replayed; the window drops the
        // oldest entries first.
        let window: Vec<&Message> = history
            .iter()
            .filter(|m| !m.is_error && matches!(m.role, Role::User | Role::Assistant))
            .collect();
        let start = window.len().saturating_sub(self.history_window);
        for msg in &window[start..] {
            messages.push(ChatMessage {
                role: msg.role,
                content: msg.content.clone(),
                tool_calls: Vec::new(),
                tool_call_id: None,
            });
        }

        messages.push(ChatMessage::user(user_message));
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembler() -> PromptAssembler {
        PromptAssembler::new("You are a test assistant.", 5)
    }

    fn doc(title: &str, content: &str) -> KnowledgeDocument {
        KnowledgeDocument::new(title, content)
    }

    #[test]
    fn system_first_user_last() {
        let history = vec![Message::user("earlier"), Message::assistant("reply")];
        let messages = assembler().assemble(&[], &history, "new question");

        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages.last().unwrap().role, Role::User);
        assert_eq!(messages.last().unwrap().content, "new question");
        assert_eq!(messages.len(), 4);
    }

    #[test]
    fn blank_instruction_falls_back_to_default() {
        let assembler = PromptAssembler::new("   ", 5);
        let messages = assembler.assemble(&[], &[], "hi");
        assert!(messages[0].content.contains("ChatArbor"));
    }

    #[test]
    fn context_block_lands_in_system_message() {
        let docs = vec![doc("Job search basics", "Update your resume before applying.")];
        let messages = assembler().assemble(&docs, &[], "how do I apply?");

        let system = &messages[0].content;
        assert!(system.contains("Update your resume before applying."));
        assert!(system.contains("(Source: Job search basics)"));
        assert!(system.starts_with("You are a test assistant."));
    }

    #[test]
    fn no_context_block_without_documents() {
        let messages = assembler().assemble(&[], &[], "hello");
        assert!(!messages[0].content.contains("knowledge base context"));
    }

    #[test]
    fn history_truncated_to_window_newest_kept() {
        let history: Vec<Message> = (0..9)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("user {i}"))
                } else {
                    Message::assistant(format!("assistant {i}"))
                }
            })
            .collect();

        let messages = assembler().assemble(&[], &history, "latest");

        // system + 5 history + user
        assert_eq!(messages.len(), 7);
        assert_eq!(messages[1].content, "user 4");
        assert_eq!(messages[5].content, "user 8");
    }

    #[test]
    fn short_history_passes_through_in_order() {
        let history = vec![Message::user("one"), Message::assistant("two")];
        let messages = assembler().assemble(&[], &history, "three");
        assert_eq!(messages[1].content, "one");
        assert_eq!(messages[2].content, "two");
    }

    #[test]
    fn error_messages_not_replayed() {
        let history = vec![
            Message::user("question"),
            Message::error("Sorry, I encountered an error. Please try again."),
        ];
        let messages = assembler().assemble(&[], &history, "retry");
        assert_eq!(messages.len(), 3); // system + "question" + new user
        assert!(messages.iter().all(|m| !m.content.contains("error")));
    }

    #[test]
    fn render_context_lists_every_document() {
        let docs = vec![doc("A", "first body"), doc("B", "second body")];
        let block = assembler().render_context(&docs);
        assert!(block.contains("- first body (Source: A)"));
        assert!(block.contains("- second body (Source: B)"));
    }

    #[test]
    fn render_context_empty_for_no_documents() {
        assert!(assembler().render_context(&[]).is_empty());
    }
}
