use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;

use crate::llm::VisionJudgment;
use crate::llm::vision::UNKNOWN_LANDMARK;
use crate::search::SearchResult;

pub const MAX_ACTIONS: usize = 3;

const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/";
const SAVE_ITINERARY_URL: &str = "#save";

/// Characters left unescaped by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub label: String,
    pub url: String,
}

impl Action {
    fn new(label: &str, url: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            url: url.into(),
        }
    }
}

/// Follow-up actions in priority order: maps, itinerary, tickets.
pub fn derive(
    query: &str,
    judgment: Option<&VisionJudgment>,
    results: &[SearchResult],
) -> Vec<Action> {
    let mut actions = Vec::new();

    if let Some(j) = judgment
        && !j.landmark.is_empty()
        && j.landmark != UNKNOWN_LANDMARK
    {
        let term = if j.is_landmark { &j.landmark } else { &j.location };
        actions.push(Action::new("Open in Maps", maps_url(term)));
    }

    if query.to_lowercase().contains("itinerary") {
        actions.push(Action::new("Save Itinerary", SAVE_ITINERARY_URL));
    }

    if let Some(hit) = results.iter().find(|r| {
        let title = r.title.to_lowercase();
        title.contains("ticket") || title.contains("book")
    }) {
        actions.push(Action::new("Book Tickets", hit.url.clone()));
    }

    actions.truncate(MAX_ACTIONS);
    actions
}

pub fn maps_url(term: &str) -> String {
    format!("{MAPS_SEARCH_URL}{}", utf8_percent_encode(term, URI_COMPONENT))
}
