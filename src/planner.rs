//! Turns a user query and an optional photo judgment into search queries.

use chrono::NaiveDate;

use crate::llm::VisionJudgment;

const LANDMARK_CONFIDENCE: f64 = 0.6;
const USABLE_CONFIDENCE: f64 = 0.3;

const CURRENT_EVENT_KEYWORDS: [&str; 3] = ["now", "today", "this week"];

/// How much a vision judgment can be trusted, decided once.
#[derive(Debug, Clone, Copy)]
pub enum Judgment<'a> {
    NoJudgment,
    LowConfidence(&'a VisionJudgment),
    HighConfidenceLandmark(&'a VisionJudgment),
}

impl<'a> Judgment<'a> {
    pub fn resolve(judgment: Option<&'a VisionJudgment>) -> Self {
        match judgment {
            Some(j) if j.is_landmark && j.confidence >= LANDMARK_CONFIDENCE => {
                Judgment::HighConfidenceLandmark(j)
            }
            Some(j) if j.confidence >= USABLE_CONFIDENCE => Judgment::LowConfidence(j),
            _ => Judgment::NoJudgment,
        }
    }
}

/// Search queries in fan-out order. Never empty.
pub fn plan(query: &str, judgment: Option<&VisionJudgment>, today: NaiveDate) -> Vec<String> {
    match Judgment::resolve(judgment) {
        Judgment::HighConfidenceLandmark(j) => vec![
            format!("{} history visitor information tickets", j.landmark),
            format!("{} attractions near {}", j.location, j.landmark),
            format!("{} travel guide tips", j.landmark),
        ],
        Judgment::LowConfidence(j) => vec![
            format!("{} tourist attractions travel guide", j.location),
            format!("{} travel destination information", j.description),
        ],
        Judgment::NoJudgment => text_queries(query, today),
    }
}

fn text_queries(query: &str, today: NaiveDate) -> Vec<String> {
    let lower = query.to_lowercase();
    let mut queries = vec![query.to_string()];

    if lower.contains("itinerary") {
        queries.push(format!("{query} cultural activities recommendations"));
    }
    if CURRENT_EVENT_KEYWORDS.iter().any(|k| lower.contains(k)) {
        queries.push(format!("{query} events {}", today.format("%-m/%-d/%Y")));
    }
    queries
}
