use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinError;
use tracing::debug;

use super::client::{SearchClient, SearchOptions};
use super::types::SearchResult;

const RECENT_WINDOW_DAYS: u32 = 7;

/// Recency filter applied to every query of one fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Recency {
    #[default]
    Any,
    PastWeek,
}

impl Recency {
    /// `PastWeek` when the user asked about "this week".
    pub fn for_query(user_query: &str) -> Self {
        if user_query.to_lowercase().contains("this week") {
            Recency::PastWeek
        } else {
            Recency::Any
        }
    }

    fn days(self) -> Option<u32> {
        match self {
            Recency::Any => None,
            Recency::PastWeek => Some(RECENT_WINDOW_DAYS),
        }
    }
}

/// Runs every query as its own task and waits for all of them.
///
/// Output keeps query order, then per-query order, with duplicate URLs removed
/// (first occurrence wins). Failed searches contribute nothing; a panicked
/// task is returned as an error.
pub async fn aggregate<S: SearchClient>(
    client: &Arc<S>,
    queries: &[String],
    recency: Recency,
) -> Result<Vec<SearchResult>, JoinError> {
    let options = SearchOptions {
        days: recency.days(),
        ..SearchOptions::default()
    };

    let handles = queries.iter().cloned().map(|query| {
        let client = Arc::clone(client);
        tokio::spawn(async move { client.search(&query, options).await })
    });

    let mut batches = Vec::with_capacity(queries.len());
    for outcome in join_all(handles).await {
        batches.push(outcome?);
    }

    let total: usize = batches.iter().map(Vec::len).sum();
    let unique = dedupe_by_url(batches.into_iter().flatten());
    debug!(queries = queries.len(), total, unique = unique.len(), "search fan-out joined");
    Ok(unique)
}

pub fn dedupe_by_url(results: impl IntoIterator<Item = SearchResult>) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|r| seen.insert(r.url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    struct MockSearch {
        responses: HashMap<String, Vec<SearchResult>>,
        calls: Mutex<Vec<(String, SearchOptions)>>,
    }

    impl MockSearch {
        fn new(responses: Vec<(&str, Vec<SearchResult>)>) -> Arc<Self> {
            Arc::new(Self {
                responses: responses
                    .into_iter()
                    .map(|(q, r)| (q.to_string(), r))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, SearchOptions)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl SearchClient for MockSearch {
        async fn search(&self, query: &str, options: SearchOptions) -> Vec<SearchResult> {
            self.calls.lock().unwrap().push((query.to_string(), options));
            // Later queries answer first; output order must not depend on completion order.
            if query == "first" {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            self.responses.get(query).cloned().unwrap_or_default()
        }
    }

    struct PanickingSearch;

    impl SearchClient for PanickingSearch {
        async fn search(&self, _query: &str, _options: SearchOptions) -> Vec<SearchResult> {
            panic!("search task exploded");
        }
    }

    fn r(title: &str, url: &str) -> SearchResult {
        SearchResult::new(title, url)
    }

    fn queries(qs: &[&str]) -> Vec<String> {
        qs.iter().map(|q| q.to_string()).collect()
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let mut dup = r("A second", "https://a.com");
        dup.extra.insert("content".into(), "later".into());

        let out = dedupe_by_url(vec![
            r("A", "https://a.com"),
            r("B", "https://b.com"),
            dup,
            r("C", "https://c.com"),
            r("B again", "https://b.com"),
        ]);

        let urls: Vec<_> = out.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, ["https://a.com", "https://b.com", "https://c.com"]);
        assert_eq!(out[0].title, "A");
        assert!(out[0].extra.is_empty());
    }

    #[test]
    fn dedupe_output_has_no_equal_urls() {
        let input: Vec<_> = (0..50)
            .map(|i| r(&format!("t{i}"), &format!("https://x.com/{}", i % 7)))
            .collect();
        let out = dedupe_by_url(input);
        let unique: HashSet<_> = out.iter().map(|r| &r.url).collect();
        assert_eq!(unique.len(), out.len());
        assert_eq!(out.len(), 7);
        assert_eq!(out[3].title, "t3");
    }

    #[test]
    fn recency_detects_this_week() {
        assert_eq!(
            Recency::for_query("What's happening in Paris THIS WEEK?"),
            Recency::PastWeek
        );
        assert_eq!(Recency::for_query("Paris this weekend"), Recency::PastWeek);
        assert_eq!(Recency::for_query("Paris today"), Recency::Any);
    }

    #[tokio::test]
    async fn aggregate_preserves_query_order() {
        let mock = MockSearch::new(vec![
            ("first", vec![r("A", "https://a.com"), r("B", "https://b.com")]),
            ("second", vec![r("B dup", "https://b.com"), r("C", "https://c.com")]),
        ]);

        let out = aggregate(&mock, &queries(&["first", "second"]), Recency::Any)
            .await
            .unwrap();

        let urls: Vec<_> = out.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, ["https://a.com", "https://b.com", "https://c.com"]);
        assert_eq!(out[1].title, "B");
    }

    #[tokio::test]
    async fn aggregate_applies_recency_to_every_query() {
        let mock = MockSearch::new(vec![]);

        aggregate(&mock, &queries(&["x", "y"]), Recency::PastWeek)
            .await
            .unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|(_, o)| o.days == Some(7) && o.max_results == 10));
    }

    #[tokio::test]
    async fn aggregate_with_all_empty_is_empty() {
        let mock = MockSearch::new(vec![]);
        let out = aggregate(&mock, &queries(&["a", "b", "c"]), Recency::Any)
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn aggregate_surfaces_panicked_task() {
        let client = Arc::new(PanickingSearch);
        let err = aggregate(&client, &queries(&["boom"]), Recency::Any)
            .await
            .unwrap_err();
        assert!(err.is_panic());
    }
}

#[cfg(test)]
mod http_tests {
    use super::*;
    use crate::search::client::TavilyClient;
    use reqwest::Client;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_query(server: &MockServer, query: &str, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_partial_json(serde_json::json!({"query": query})))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn one_failing_query_does_not_abort_fan_out() {
        let server = MockServer::start().await;
        mount_query(
            &server,
            "louvre",
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {"title": "Louvre", "url": "https://louvre.fr"},
                    {"title": "Paris guide", "url": "https://paris.example"}
                ]
            })),
        )
        .await;
        mount_query(&server, "broken", ResponseTemplate::new(500)).await;
        mount_query(
            &server,
            "orsay",
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {"title": "Paris guide again", "url": "https://paris.example"},
                    {"title": "Orsay", "url": "https://orsay.fr"}
                ]
            })),
        )
        .await;

        let client = Arc::new(TavilyClient::with_base_url(
            Client::new(),
            &server.uri(),
            Duration::from_secs(5),
        ));
        let qs: Vec<String> = ["louvre", "broken", "orsay"].map(String::from).to_vec();

        let out = aggregate(&client, &qs, Recency::Any).await.unwrap();

        let urls: Vec<_> = out.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            ["https://louvre.fr", "https://paris.example", "https://orsay.fr"]
        );
        assert_eq!(out[1].title, "Paris guide");
    }
}
