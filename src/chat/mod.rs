//! FAQ chatbot: keyword classification plus canned answers.

mod classifier;
mod delay;
mod replies;

use serde::{Deserialize, Serialize};

pub use classifier::{IntentClassifier, IntentRule, ResponseCategory, classify};
pub use delay::ReplyDelay;
pub use replies::{ContactInfo, KnowledgeBase, QUICK_REPLIES, reply};

/// A classified answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub category: ResponseCategory,
    pub lines: Vec<String>,
}

impl ChatReply {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

#[derive(Debug, Clone, Default)]
pub struct Chatbot {
    classifier: IntentClassifier,
    knowledge: KnowledgeBase,
    delay: ReplyDelay,
}

impl Chatbot {
    pub fn new(classifier: IntentClassifier, knowledge: KnowledgeBase) -> Self {
        Self {
            classifier,
            knowledge,
            delay: ReplyDelay::default(),
        }
    }

    pub fn with_delay(mut self, delay: ReplyDelay) -> Self {
        self.delay = delay;
        self
    }

    pub fn delay(&self) -> &ReplyDelay {
        &self.delay
    }

    pub fn respond(&self, utterance: &str) -> ChatReply {
        let category = self.classifier.classify(utterance.trim());
        tracing::debug!(%category, "Classified chat message");
        ChatReply {
            category,
            lines: self.knowledge.reply(category),
        }
    }
}
