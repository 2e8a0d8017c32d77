//! Integration tests for the aggregation pipeline.
//!
//! These exercise fan-out, failure isolation, dedup and truncation through
//! the public API with fake sources and wiremock-backed real sources (no
//! external network). Live source tests are marked `#[ignore]` for manual
//! validation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jobhunt_search::orchestrator::dedup::deduplicate;
use jobhunt_search::sources::{GitHubJobsSource, RemoteOkSource};
use jobhunt_search::{
    Aggregator, JobListing, JobSource, SearchConfig, SearchError, SearchQuery, SourceStatus,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct FakeSource {
    name: &'static str,
    listings: Vec<JobListing>,
    delay: Duration,
}

impl FakeSource {
    fn with_urls(name: &'static str, urls: &[&str]) -> Arc<dyn JobSource> {
        Arc::new(Self {
            name,
            listings: urls
                .iter()
                .map(|url| JobListing::new(format!("{name} job"), "Acme", *url, name))
                .collect(),
            delay: Duration::ZERO,
        })
    }

    fn delayed(name: &'static str, urls: &[&str], delay: Duration) -> Arc<dyn JobSource> {
        Arc::new(Self {
            name,
            listings: urls
                .iter()
                .map(|url| JobListing::new(format!("{name} job"), "Acme", *url, name))
                .collect(),
            delay,
        })
    }
}

#[async_trait]
impl JobSource for FakeSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(
        &self,
        _query: &SearchQuery,
        _config: &SearchConfig,
    ) -> Result<Vec<JobListing>, SearchError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.listings.clone())
    }
}

struct AlwaysFailing;

#[async_trait]
impl JobSource for AlwaysFailing {
    fn name(&self) -> &str {
        "always-failing"
    }

    async fn fetch(
        &self,
        _query: &SearchQuery,
        _config: &SearchConfig,
    ) -> Result<Vec<JobListing>, SearchError> {
        Err(SearchError::Http("connection refused".into()))
    }
}

fn test_config() -> SearchConfig {
    SearchConfig {
        cache_ttl_seconds: 0,
        deadline_seconds: 0,
        request_delay_ms: (0, 0),
        timeout_seconds: 5,
        ..Default::default()
    }
}

fn urls(listings: &[JobListing]) -> Vec<&str> {
    listings.iter().map(|l| l.url.as_str()).collect()
}

#[tokio::test]
async fn failing_source_does_not_reduce_other_results() {
    let a = FakeSource::with_urls("a", &["https://a.dev/1", "https://a.dev/2"]);
    let b = FakeSource::with_urls("b", &["https://b.dev/1"]);

    let baseline = Aggregator::with_sources(vec![a.clone(), b.clone()], test_config())
        .expect("aggregator")
        .search_all(&SearchQuery::new("engineer"))
        .await
        .expect("baseline");

    let with_failure =
        Aggregator::with_sources(vec![a, Arc::new(AlwaysFailing), b], test_config())
            .expect("aggregator")
            .search_all(&SearchQuery::new("engineer"))
            .await
            .expect("search must not fail");

    assert_eq!(urls(&baseline), urls(&with_failure));
}

#[tokio::test]
async fn all_sources_failing_is_empty_success() {
    let aggregator = Aggregator::with_sources(
        vec![Arc::new(AlwaysFailing), Arc::new(AlwaysFailing)],
        test_config(),
    )
    .expect("aggregator");
    let report = aggregator
        .search_all_with_report(&SearchQuery::new("engineer"))
        .await
        .expect("partial results are not an error");
    assert!(report.listings.is_empty());
    assert!(report
        .sources
        .iter()
        .all(|s| matches!(s.status, SourceStatus::Failed(_))));
}

#[tokio::test(start_paused = true)]
async fn completion_order_does_not_change_result_order() {
    let slow = FakeSource::delayed("slow", &["https://slow.dev/1"], Duration::from_secs(2));
    let fast = FakeSource::with_urls("fast", &["https://fast.dev/1"]);

    let listings = Aggregator::with_sources(vec![slow, fast], test_config())
        .expect("aggregator")
        .search_all(&SearchQuery::new("engineer"))
        .await
        .expect("search");

    assert_eq!(urls(&listings), vec!["https://slow.dev/1", "https://fast.dev/1"]);
}

#[tokio::test(start_paused = true)]
async fn timed_out_source_reported() {
    let stuck = FakeSource::delayed("stuck", &["https://stuck.dev/1"], Duration::from_secs(600));
    let fine = FakeSource::with_urls("fine", &["https://fine.dev/1"]);

    let report = Aggregator::with_sources(vec![stuck, fine], test_config())
        .expect("aggregator")
        .search_all_with_report(&SearchQuery::new("engineer"))
        .await
        .expect("search");

    assert_eq!(report.sources[0].status, SourceStatus::TimedOut);
    assert_eq!(urls(&report.listings), vec!["https://fine.dev/1"]);
}

#[tokio::test]
async fn cross_source_duplicates_first_wins() {
    let first = FakeSource::with_urls("first", &["https://acme.dev/jobs/1?utm_source=feed"]);
    let second = FakeSource::with_urls("second", &["https://acme.dev/jobs/1", "https://acme.dev/jobs/2"]);

    let listings = Aggregator::with_sources(vec![first, second], test_config())
        .expect("aggregator")
        .search_all(&SearchQuery::new("engineer"))
        .await
        .expect("search");

    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].source, "first");
    assert_eq!(listings[1].url, "https://acme.dev/jobs/2");

    // Dedup of an already deduplicated set changes nothing.
    assert_eq!(deduplicate(listings.clone()), listings);
}

#[tokio::test]
async fn wiremock_sources_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/positions.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"id":"gh1","title":"Machine Learning Engineer","company":"Octo",
                "location":"Remote","description":"remote ml role",
                "url":"https://jobs.example.com/shared"}]"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"legal":"terms"},
                {"id":1,"position":"Senior ML Engineer","company":"Feedly","location":"Worldwide",
                 "tags":["python"],"url":"https://jobs.example.com/shared"},
                {"id":2,"position":"Machine Learning Engineer","company":"Deep Co","location":"",
                 "tags":["pytorch"],"url":"https://jobs.example.com/remoteok-only"}]"#,
        ))
        .mount(&server)
        .await;

    let sources: Vec<Arc<dyn JobSource>> = vec![
        Arc::new(GitHubJobsSource::with_base_url(server.uri())),
        Arc::new(RemoteOkSource::with_base_url(server.uri())),
    ];
    let report = Aggregator::with_sources(sources, test_config())
        .expect("aggregator")
        .search_all_with_report(&SearchQuery::new("ml engineer").with_location("Bangalore"))
        .await
        .expect("search");

    assert_eq!(report.sources[0].name, "github");
    assert_eq!(report.sources[1].count, 2);
    assert_eq!(
        urls(&report.listings),
        vec![
            "https://jobs.example.com/shared",
            "https://jobs.example.com/remoteok-only"
        ]
    );
    assert_eq!(report.listings[0].source, "github");
    assert!(report.listings.iter().all(|l| l.id.is_some()));
}

#[tokio::test]
#[ignore]
async fn live_default_sources() {
    let config = SearchConfig::default();
    let aggregator = Aggregator::new(config).expect("aggregator");
    let report = aggregator
        .search_all_with_report(&SearchQuery::new("rust developer").with_limit(10))
        .await
        .expect("search");
    for source in &report.sources {
        println!("{}: {:?} ({})", source.name, source.status, source.count);
    }
    assert!(report.listings.len() <= 10);
}
