use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tokio::task::JoinError;
use tracing::{debug, info, warn};

use crate::actions::{self, Action};
use crate::config::{Config, ConfigError};
use crate::llm::{self, ChatModel, ImageInput, OpenAiClient, VisionJudgment};
use crate::planner;
use crate::search::aggregate::aggregate;
use crate::search::{Recency, SearchClient, SearchResult, TavilyClient};

pub const MAX_SOURCES: usize = 5;

const DEFAULT_TITLE: &str = "Travel Information";
const ERROR_TITLE: &str = "Error";
const ERROR_ANSWER: &str =
    "I apologize, but I encountered an error processing your request. Please try again.";

/// Stages one request passes through, in order. `AnalyzingImage` is skipped
/// without a photo; every stage absorbs its own failures, so `Done` is always reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    AnalyzingImage,
    Planning,
    Searching,
    Generating,
    DerivingActions,
    Done,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("search task failed: {0}")]
    SearchTask(#[from] JoinError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    pub number: usize,
    pub title: String,
    pub url: String,
}

/// What the caller renders for one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub title: String,
    pub answer: String,
    pub sources: Vec<Source>,
    pub actions: Vec<Action>,
}

impl Answer {
    fn error() -> Self {
        Self {
            title: ERROR_TITLE.to_string(),
            answer: ERROR_ANSWER.to_string(),
            sources: Vec::new(),
            actions: Vec::new(),
        }
    }
}

/// The question-answering pipeline: identify photo, plan searches, search in
/// parallel, generate a cited answer, and suggest follow-up actions.
pub struct Pipeline<S, M> {
    search: Arc<S>,
    model: M,
}

impl Pipeline<TavilyClient, OpenAiClient> {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let http = config.http_client()?;
        Ok(Self::new(
            TavilyClient::new(http.clone(), config),
            OpenAiClient::new(http, config),
        ))
    }
}

impl<S: SearchClient, M: ChatModel> Pipeline<S, M> {
    pub fn new(search: S, model: M) -> Self {
        Self {
            search: Arc::new(search),
            model,
        }
    }

    /// Answers one question. Never fails; errors become readable text.
    pub async fn ask(&self, query: &str, image: Option<&ImageInput>) -> Answer {
        info!(query, has_image = image.is_some(), "processing request");
        let today = Local::now().date_naive();
        match self.run(query, image, today).await {
            Ok(answer) => {
                info!(
                    sources = answer.sources.len(),
                    actions = answer.actions.len(),
                    "request complete"
                );
                answer
            }
            Err(e) => {
                warn!(error = %e, "request failed");
                Answer::error()
            }
        }
    }

    async fn run(
        &self,
        query: &str,
        image: Option<&ImageInput>,
        today: NaiveDate,
    ) -> Result<Answer, PipelineError> {
        enter(Stage::Idle);

        let judgment = match image {
            Some(image) => {
                enter(Stage::AnalyzingImage);
                Some(self.analyze(image).await)
            }
            None => None,
        };

        enter(Stage::Planning);
        let queries = planner::plan(query, judgment.as_ref(), today);
        debug!(?queries, "planned searches");

        enter(Stage::Searching);
        let results = aggregate(&self.search, &queries, Recency::for_query(query)).await?;

        enter(Stage::Generating);
        let answer = llm::answer::generate(&self.model, query, &results).await;

        enter(Stage::DerivingActions);
        let actions = actions::derive(query, judgment.as_ref(), &results);

        enter(Stage::Done);
        Ok(Answer {
            title: title(judgment.as_ref()),
            answer,
            sources: sources(&results),
            actions,
        })
    }

    async fn analyze(&self, image: &ImageInput) -> VisionJudgment {
        match llm::vision::classify(&self.model, image).await {
            Ok(judgment) => {
                debug!(
                    landmark = %judgment.landmark,
                    confidence = judgment.confidence,
                    "image analyzed"
                );
                judgment
            }
            Err(e) => {
                warn!(error = %e, "image analysis failed");
                VisionJudgment::failed()
            }
        }
    }
}

fn enter(stage: Stage) {
    debug!(?stage, "pipeline stage");
}

fn title(judgment: Option<&VisionJudgment>) -> String {
    match judgment {
        Some(j) if j.is_landmark && j.confidence > 0.6 => format!("About {}", j.landmark),
        Some(j) => format!("Image Analysis: {}", j.location),
        None => DEFAULT_TITLE.to_string(),
    }
}

fn sources(results: &[SearchResult]) -> Vec<Source> {
    results
        .iter()
        .take(MAX_SOURCES)
        .enumerate()
        .map(|(i, r)| Source {
            number: i + 1,
            title: r.title.clone(),
            url: r.url.clone(),
        })
        .collect()
}
