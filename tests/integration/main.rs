//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small Dice-like job board and run the
//! full harvest cycle end-to-end through the HTTP browser.

use job_harvest::browser::HttpBrowser;
use job_harvest::config::{load_config_with_hash, Config};
use job_harvest::crawler::{Coordinator, CrawlReport};
use job_harvest::output::{export_latest_run, write_run_outputs};
use job_harvest::storage::{RunStatus, SqliteStorage, Storage};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Search<'a> {
    query: &'a str,
    tag: &'a str,
}

/// Writes a harvest config pointing at the mock board and returns its path
fn write_config(dir: &TempDir, base_url: &str, searches: &[Search<'_>]) -> PathBuf {
    let mut toml = format!(
        r#"
[crawler]
backoff-base-ms = 0
detail-timeout-ms = 150
poll-interval-ms = 25
page-delay = {{ min-ms = 0, max-ms = 0 }}
detail-delay = {{ min-ms = 0, max-ms = 0 }}
target-delay = {{ min-ms = 0, max-ms = 0 }}

[browser]
navigation-timeout-secs = 5

[output]
csv-path = "{csv}"
database-path = "{db}"
summary-path = "{summary}"

[site]
preset = "dice"
expected-domain = "127.0.0.1"
"#,
        csv = dir.path().join("jobs.csv").display(),
        db = dir.path().join("harvest.db").display(),
        summary = dir.path().join("summary.md").display(),
    );

    for search in searches {
        toml.push_str(&format!(
            "\n[[target]]\nurl = \"{}/jobs?q={}\"\ntag = \"{}\"\nmax-pages = 5\n",
            base_url, search.query, search.tag
        ));
    }

    let config_path = dir.path().join("harvest.toml");
    std::fs::write(&config_path, toml).unwrap();
    config_path
}

/// Runs a full harvest and writes its outputs, like the binary does
async fn harvest(config_path: &Path) -> (Config, CrawlReport) {
    let (config, hash) = load_config_with_hash(config_path).unwrap();
    let db_path = PathBuf::from(&config.output.database_path);

    let coordinator = Coordinator::new(
        config.clone(),
        &hash,
        Box::new(HttpBrowser::new(&config.browser).unwrap()),
        Box::new(SqliteStorage::new(&db_path).unwrap()),
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();
    let report = coordinator.run().await;

    let storage = SqliteStorage::new(&db_path).unwrap();
    write_run_outputs(&config, &report, &storage).unwrap();

    (config, report)
}

fn card(id: Option<&str>, title: &str, company: &str) -> String {
    let link = id
        .map(|id| {
            format!(
                r#"<a data-testid="job-search-job-card-link" href="/job-detail/{}"></a>"#,
                id
            )
        })
        .unwrap_or_default();
    format!(
        r#"<div role="listitem">
            {}
            <a data-testid="job-search-job-detail-link">{}</a>
            <p class="mb-0 line-clamp-2 text-sm sm:line-clamp-1">{}</p>
            <p class="text-sm font-normal text-zinc-600">Remote</p>
        </div>"#,
        link, title, company
    )
}

fn results_page(cards: &[String]) -> String {
    format!("<html><body><main>{}</main></body></html>", cards.concat())
}

fn detail_page(title: &str, company: &str) -> String {
    format!(
        r#"<html><body>
            <h1>{}</h1>
            <a data-cy="companyNameLink">{}</a>
            <ul><li data-cy="location">Austin, TX</li></ul>
            <p data-testid="recruiterName">Pat Lee</p>
            <div class="chip_chip__cYJs6"><span id="employmentDetailChip:0">Contract</span></div>
            <div class="chip_chip__cYJs6"><span id="employmentDetailChip:1">6 Months</span></div>
            <div class="chip_chip__cYJs6"><span id="payChip:0">$80/hr</span></div>
            <div class="chip_chip__cYJs6"><span id="location:0">Remote</span></div>
            <div class="job-description">Own the integration layer.</div>
        </body></html>"#,
        title, company
    )
}

async fn mount_results(server: &MockServer, query: &str, page: u32, html: String) {
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("q", query))
        .and(query_param("page", page.to_string().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, id: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(format!("/job-detail/{}", id).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(server)
        .await;
}

fn read_rows(path: &str) -> Vec<Vec<String>> {
    csv::Reader::from_path(path)
        .unwrap()
        .records()
        .map(|row| row.unwrap().iter().map(str::to_string).collect())
        .collect()
}

async fn requested_queries(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|request| request.url.query().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn test_full_harvest_writes_dataset_and_summary() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_results(
        &server,
        "sap",
        1,
        results_page(&[
            card(Some("a1"), "SAP Basis Admin", "Initech"),
            card(None, "SAP Analyst", "Hooli"),
        ]),
    )
    .await;
    mount_results(
        &server,
        "sap",
        2,
        results_page(&[card(Some("a2"), "SAP FICO Lead", "Globex")]),
    )
    .await;
    mount_results(&server, "sap", 3, results_page(&[])).await;
    mount_detail(&server, "a1", detail_page("Senior SAP Basis Administrator", "Initech")).await;
    mount_detail(&server, "a2", detail_page("SAP FICO Lead", "Globex Corp")).await;

    let config_path = write_config(&dir, &server.uri(), &[Search { query: "sap", tag: "Jose" }]);
    let (config, report) = harvest(&config_path).await;

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.counters.pages, 2);
    assert_eq!(report.counters.extracted, 2);
    assert_eq!(report.counters.listing_only, 1);

    let rows = read_rows(&config.output.csv_path);
    assert_eq!(rows.len(), 3);

    // Emission order follows page order
    assert_eq!(rows[0][1], "Senior SAP Basis Administrator");
    assert_eq!(rows[0][0], "Jose");
    assert_eq!(rows[0][3], "Pat Lee");
    assert_eq!(rows[0][4], "Austin, TX");
    assert_eq!(rows[0][5], "Contract");
    assert_eq!(rows[0][11], "6 Months");
    assert_eq!(rows[0][13], "$80/hr");
    assert_eq!(rows[0][14], "Remote");
    assert!(rows[0][16].ends_with("/job-detail/a1"));

    // Card without a detail link keeps its preview fields
    assert_eq!(rows[1][1], "SAP Analyst");
    assert_eq!(rows[1][2], "Hooli");
    assert!(rows[1][16].contains("page=1#card-2"));

    assert_eq!(rows[2][2], "Globex Corp");

    let summary = std::fs::read_to_string(&config.output.summary_path).unwrap();
    assert!(summary.contains("- **Status**: completed"));
    assert!(summary.contains("| Extracted | 2 |"));
}

#[tokio::test]
async fn test_block_page_halts_run_and_keeps_partial_output() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_results(
        &server,
        "sap",
        1,
        results_page(&[card(Some("a1"), "SAP Developer", "Initech")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("q", "sap"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_string("<html><body><h1>Access Denied</h1></body></html>"),
        )
        .mount(&server)
        .await;
    mount_results(
        &server,
        "oracle",
        1,
        results_page(&[card(Some("b1"), "Oracle DBA", "Globex")]),
    )
    .await;
    mount_detail(&server, "a1", detail_page("SAP Developer", "Initech")).await;

    let config_path = write_config(
        &dir,
        &server.uri(),
        &[
            Search { query: "sap", tag: "Jose" },
            Search { query: "oracle", tag: "Ana" },
        ],
    );
    let (config, report) = harvest(&config_path).await;

    assert_eq!(report.status, RunStatus::Blocked);
    assert!(report.block.is_some());
    assert_eq!(report.results.len(), 1);

    let queries = requested_queries(&server).await;
    assert!(!queries.iter().any(|q| q.contains("oracle")));

    let rows = read_rows(&config.output.csv_path);
    assert_eq!(rows.len(), 1);

    let summary = std::fs::read_to_string(&config.output.summary_path).unwrap();
    assert!(summary.contains("- **Status**: blocked"));
    assert!(summary.contains("access denied"));

    let storage = SqliteStorage::new(Path::new(&config.output.database_path)).unwrap();
    let run = storage.get_run(report.run_id).unwrap();
    assert_eq!(run.status, RunStatus::Blocked);
}

#[tokio::test]
async fn test_server_errors_escalate_to_blocked() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config_path = write_config(
        &dir,
        &server.uri(),
        &[
            Search { query: "one", tag: "A" },
            Search { query: "two", tag: "B" },
            Search { query: "three", tag: "C" },
            Search { query: "four", tag: "D" },
        ],
    );
    let (_, report) = harvest(&config_path).await;

    assert_eq!(report.status, RunStatus::Blocked);
    assert_eq!(report.counters.failures, 3);
    assert_eq!(report.state.backoff_multiplier(), 8.0);
    assert!(report.results.is_empty());

    let queries = requested_queries(&server).await;
    assert_eq!(queries.len(), 3);
    assert!(!queries.iter().any(|q| q.contains("four")));
}

#[tokio::test]
async fn test_duplicate_posting_across_searches_merges_tags() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let shared = results_page(&[card(Some("shared"), "Integration Architect", "Initech")]);
    mount_results(&server, "mulesoft", 1, shared.clone()).await;
    mount_results(&server, "mulesoft", 2, results_page(&[])).await;
    mount_results(&server, "boomi", 1, shared).await;
    mount_results(&server, "boomi", 2, results_page(&[])).await;
    mount_detail(&server, "shared", detail_page("Integration Architect", "Initech")).await;

    let config_path = write_config(
        &dir,
        &server.uri(),
        &[
            Search { query: "mulesoft", tag: "Raj" },
            Search { query: "boomi", tag: "Ana" },
        ],
    );
    let (config, report) = harvest(&config_path).await;

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.counters.records_emitted, 2);

    let rows = read_rows(&config.output.csv_path);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "Ana, Raj");
}

#[tokio::test]
async fn test_detail_timeout_falls_back_to_preview() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_results(
        &server,
        "abap",
        1,
        results_page(&[card(Some("slow"), "ABAP Developer", "Umbrella")]),
    )
    .await;
    mount_results(&server, "abap", 2, results_page(&[])).await;
    mount_detail(
        &server,
        "slow",
        "<html><body><div id=\"app\">Loading...</div></body></html>".to_string(),
    )
    .await;

    let config_path = write_config(&dir, &server.uri(), &[Search { query: "abap", tag: "Jose" }]);
    let (config, report) = harvest(&config_path).await;

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.counters.timed_out, 1);
    assert_eq!(report.state.consecutive_failures(), 0);

    let rows = read_rows(&config.output.csv_path);
    assert_eq!(rows[0][1], "ABAP Developer");
    assert_eq!(rows[0][2], "Umbrella");
    assert_eq!(rows[0][3], "");
}

#[tokio::test]
async fn test_export_rebuilds_dataset_from_database() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_results(
        &server,
        "sap",
        1,
        results_page(&[
            card(Some("a1"), "SAP Basis Admin", "Initech"),
            card(Some("a2"), "SAP MM Consultant", "Globex"),
        ]),
    )
    .await;
    mount_results(&server, "sap", 2, results_page(&[])).await;
    mount_detail(&server, "a1", detail_page("SAP Basis Admin", "Initech")).await;
    mount_detail(&server, "a2", detail_page("SAP MM Consultant", "Globex")).await;

    let config_path = write_config(&dir, &server.uri(), &[Search { query: "sap", tag: "Jose" }]);
    let (config, _) = harvest(&config_path).await;

    let original = std::fs::read_to_string(&config.output.csv_path).unwrap();
    std::fs::remove_file(&config.output.csv_path).unwrap();

    let storage = SqliteStorage::new(Path::new(&config.output.database_path)).unwrap();
    let exported = export_latest_run(&storage, Path::new(&config.output.csv_path)).unwrap();

    assert_eq!(exported.map(|(_, rows)| rows), Some(2));
    let rebuilt = std::fs::read_to_string(&config.output.csv_path).unwrap();
    assert_eq!(rebuilt, original);
}
