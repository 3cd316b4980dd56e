use std::path::PathBuf;

use serde::Serialize;

use crate::pipeline::Answer;

/// One question and the answer it got.
#[derive(Debug, Clone, Serialize)]
pub struct Exchange {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<PathBuf>,
    pub answer: Answer,
}

/// Append-only history of a chat session, kept by the caller.
#[derive(Debug, Default, Serialize)]
pub struct Conversation {
    exchanges: Vec<Exchange>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        query: impl Into<String>,
        image: Option<PathBuf>,
        answer: Answer,
    ) -> &Exchange {
        self.exchanges.push(Exchange {
            query: query.into(),
            image,
            answer,
        });
        &self.exchanges[self.exchanges.len() - 1]
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }
}
