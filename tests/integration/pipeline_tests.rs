//! Export pipelines and configuration files driving whole runs

use std::io::Write;
use std::sync::Arc;
use sumi_spider::config::{build_export, load_config, ExportSection, LogTarget};
use sumi_spider::export::{combine, ExportSink, FileSink, SqliteSink};
use sumi_spider::{SpiderBuilder, StopReason};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn jobs_site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<h3 class="job">Graduate "Rust" Developer</h3>
               <h3 class="job">Senior Developer</h3>
               <a class="next" href="/jobs/2">next</a>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<h3 class="job">Graduate Analyst</h3>"#,
        ))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_csv_and_sqlite_receive_every_match() {
    let server = jobs_site().await;
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("results.csv");
    let db_path = dir.path().join("results.db");

    let csv = Arc::new(FileSink::create(Some(csv_path.as_path())).await.unwrap());
    let sqlite = Arc::new(SqliteSink::new(&db_path, true));
    let sinks: Vec<Arc<dyn ExportSink>> = vec![
        csv.clone() as Arc<dyn ExportSink>,
        sqlite.clone() as Arc<dyn ExportSink>,
    ];

    let spider = SpiderBuilder::new(format!("{}/jobs", server.uri()))
        .content_selector(".job")
        .link_selector("a.next")
        .info_log(LogTarget::File(dir.path().join("info.log")))
        .error_log(LogTarget::File(dir.path().join("error.log")))
        .export(combine(sinks))
        .build()
        .unwrap();

    let report = spider.run().await.unwrap();
    assert_eq!(report.reason, StopReason::QueueEmpty);
    assert_eq!(report.matches_exported, 3);

    let lines = std::fs::read_to_string(&csv_path).unwrap();
    let seed = format!("{}/jobs", server.uri());
    assert_eq!(lines.lines().count(), 3);
    assert!(lines.contains(&format!(
        "\"{}\",\".job\",\"Graduate 'Rust' Developer\"",
        seed
    )));

    assert_eq!(sqlite.count().await.unwrap(), 3);
    let stored = sqlite.load_results().await.unwrap();
    assert!(stored
        .iter()
        .any(|m| m.text == "Graduate Analyst" && m.address.ends_with("/jobs/2")));
}

#[tokio::test]
async fn test_sqlite_keeps_rows_across_runs_unless_fresh() {
    let server = jobs_site().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("results.db");
    let seed = format!("{}/jobs", server.uri());

    // A database that does not exist yet starts empty even without `fresh`
    for (fresh, expected) in [(false, 2), (false, 4), (true, 2)] {
        let spider = SpiderBuilder::new(seed.as_str())
            .content_selector(".job")
            .info_log(LogTarget::Console)
            .error_log(LogTarget::Console)
            .export(SqliteSink::new(&db_path, fresh))
            .build()
            .unwrap();
        spider.run().await.unwrap();

        let rows = SqliteSink::new(&db_path, false).count().await.unwrap();
        assert_eq!(rows, expected);
    }
}

#[tokio::test]
async fn test_config_file_drives_a_run() {
    let server = jobs_site().await;
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("graduates.csv");
    let info_path = dir.path().join("spider.log");

    let config_path = dir.path().join("spider.toml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    write!(
        file,
        r#"
[crawl]
seed = "{seed}"
selectors = [".job"]
follow = ["a.next"]

[limits]
pages = 5
concurrency = 2

[logging]
info-log = "{info}"
error-log = "-"

[export]
console = false
csv = "{csv}"

[filter]
include = "raduate"
"#,
        seed = format!("{}/jobs", server.uri()),
        info = info_path.display(),
        csv = csv_path.display(),
    )
    .unwrap();
    drop(file);

    let config = load_config(&config_path).unwrap();
    let spider = SpiderBuilder::from_file(config)
        .await
        .unwrap()
        .build()
        .unwrap();
    let report = spider.run().await.unwrap();

    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.matches_exported, 2);

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert!(csv.contains("Graduate 'Rust' Developer"));
    assert!(csv.contains("Graduate Analyst"));
    assert!(!csv.contains("Senior"));

    let info = std::fs::read_to_string(&info_path).unwrap();
    assert!(info.contains("filtered match"));
    assert!(info.contains("new url: "));
}

#[tokio::test]
async fn test_export_section_builds_combined_sink() {
    let dir = tempfile::tempdir().unwrap();
    let section = ExportSection {
        console: false,
        csv: Some(dir.path().join("out.csv")),
        sqlite: Some(dir.path().join("out.db")),
        sqlite_fresh: false,
    };

    let sink = build_export(&section).await.unwrap();
    assert_eq!(sink.len(), 2);
    assert!(dir.path().join("out.csv").exists());
}
