//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small paginated directory and run
//! both phases end-to-end.

use directory_harvester::config::{Config, OutputFormat, PaginationMode, SiteVariant};
use directory_harvester::crawler::{
    Harvester, NullProgress, PagePlan, Phase, ProgressSink, ProgressUpdate,
};
use directory_harvester::output::{export_records, RecordCollection};
use directory_harvester::state::PageOutcome;
use directory_harvester::{CrawlJob, FetchError, HarvestError};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING_PATH: &str = "/funcionariospublicos";
const LINK_CLASS: &str = "link-transition flex hover:no-underline justify-between items-center mt-8";

/// Captures progress events for assertions
#[derive(Default)]
struct CapturingProgress {
    started: Mutex<Vec<(Phase, Option<usize>)>>,
    updates: Mutex<Vec<ProgressUpdate>>,
    failures: Mutex<Vec<(Phase, String)>>,
    finished: Mutex<Vec<(Phase, usize, usize)>>,
}

impl ProgressSink for CapturingProgress {
    fn phase_started(&self, phase: Phase, total: Option<usize>) {
        self.started.lock().unwrap().push((phase, total));
    }

    fn unit_completed(&self, update: &ProgressUpdate) {
        self.updates.lock().unwrap().push(update.clone());
    }

    fn unit_failed(&self, phase: Phase, error: &FetchError) {
        self.failures
            .lock()
            .unwrap()
            .push((phase, error.url().to_string()));
    }

    fn phase_finished(&self, phase: Phase, done: usize, failed: usize, _elapsed: Duration) {
        self.finished.lock().unwrap().push((phase, done, failed));
    }
}

/// Creates a test configuration pointing at the mock server
fn create_test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.site.base_url = server.uri();
    config.crawler.workers = 4;
    config.crawler.timeout_secs = 5;
    config.crawler.retry_times = 0;
    config
}

fn detail_path(id: usize) -> String {
    format!("/institucion/minsa/funcionarios/{}-funcionario", id)
}

fn detail_url(server: &MockServer, id: usize) -> String {
    format!("{}{}", server.uri(), detail_path(id))
}

fn listing_html(ids: &[usize], last_page: Option<u32>) -> String {
    let links: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<a class="{}" href="{}"><span>Funcionario {}</span></a>"#,
                LINK_CLASS,
                detail_path(*id),
                id
            )
        })
        .collect();

    let pagination = last_page
        .map(|page| {
            format!(
                r#"<nav><a aria-label="Página siguiente" href="?sheet=2">›</a><a aria-label="Última página" href="?sheet={0}">{0}</a></nav>"#,
                page
            )
        })
        .unwrap_or_default();

    format!(
        "<html><body><main>{}</main>{}</body></html>",
        links, pagination
    )
}

fn detail_html(id: usize) -> String {
    format!(
        r#"<html><body>
          <h2 class="text-base font-bold"><a href="/institucion/minsa">Ministerio de Salud</a></h2>
          <h1 class="text-2xl leading-8">Funcionario {id}</h1>
          <div class="mt-2">Director de Área {id}</div>
          <p>Desde <span class="ml-1">0{day} jun 2021</span></p>
          <span>funcionario{id}@minsa.gob.pe</span>
          <a aria-label="Llamar al número 01 315 660{id}" href="tel:0131566{id}">01 315 660{id}</a>
          <div class="mt-3 font-bold"><div>Resolución Ministerial</div><div>N° {id}-2021-MINSA</div></div>
          <div class="leading-6"><p>Biografía del funcionario {id}.</p></div>
        </body></html>"#,
        id = id,
        day = id % 9 + 1
    )
}

async fn mount_listing(server: &MockServer, page: u32, body: String, expected: u64) {
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("sheet", page.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, id: usize, expected: u64) {
    Mock::given(method("GET"))
        .and(path(detail_path(id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_html(id))
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .expect(expected)
        .mount(server)
        .await;
}

/// Three listing pages with two details each, indicator says three pages
async fn mount_three_page_directory(server: &MockServer) {
    mount_listing(server, 1, listing_html(&[1, 2], Some(3)), 1).await;
    mount_listing(server, 2, listing_html(&[3, 4], Some(3)), 1).await;
    mount_listing(server, 3, listing_html(&[5, 6], Some(3)), 1).await;
    for id in 1..=6 {
        mount_detail(server, id, 1).await;
    }
}

async fn run(config: Config) -> Result<CrawlJob, HarvestError> {
    Harvester::new(config, Arc::new(NullProgress))
        .expect("Failed to create harvester")
        .run()
        .await
}

#[tokio::test]
async fn test_known_page_count_harvest() {
    let server = MockServer::start().await;
    mount_three_page_directory(&server).await;

    let job = run(create_test_config(&server)).await.expect("Harvest failed");

    assert_eq!(job.plan, PagePlan::Known(3));
    assert_eq!(job.page_tasks.len(), 3);
    assert_eq!(job.detail_urls.len(), 6);
    assert_eq!(job.records.len(), 6);
    assert_eq!(job.stats.pages_fetched, 3);
    assert_eq!(job.stats.pages_failed, 0);
    assert_eq!(job.stats.records_failed, 0);
    assert_eq!(job.incomplete_records(), 0);

    for record in &job.records {
        assert!(record.resolution_ref.is_some(), "{:?}", record);
        assert!(record.biography.is_some(), "{:?}", record);
        assert!(record.start_date.is_some(), "{:?}", record);
    }

    let record = job
        .records
        .iter()
        .find(|r| r.source_url == detail_url(&server, 4))
        .expect("record 4 missing");
    assert_eq!(record.name.as_deref(), Some("Funcionario 4"));
    assert_eq!(record.institution.as_deref(), Some("Ministerio de Salud"));
    assert_eq!(record.email.as_deref(), Some("funcionario4@minsa.gob.pe"));
    assert_eq!(
        record.resolution_ref.as_deref(),
        Some("Resolución Ministerial N° 4-2021-MINSA")
    );
}

#[tokio::test]
async fn test_failed_detail_keeps_record_count() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, listing_html(&[1, 2], Some(3)), 1).await;
    mount_listing(&server, 2, listing_html(&[3, 4], Some(3)), 1).await;
    mount_listing(&server, 3, listing_html(&[5, 6], Some(3)), 1).await;
    for id in [1, 2, 3, 4, 6] {
        mount_detail(&server, id, 1).await;
    }

    // One retry: the failing detail is requested exactly twice
    Mock::given(method("GET"))
        .and(path(detail_path(5)))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server);
    config.crawler.retry_times = 1;
    let progress = Arc::new(CapturingProgress::default());
    let job = Harvester::new(config, progress.clone())
        .unwrap()
        .run()
        .await
        .expect("Harvest failed");

    assert_eq!(job.records.len(), 6);
    assert_eq!(job.stats.records_failed, 1);
    assert_eq!(job.stats.records_fetched, 5);

    let failed = job
        .records
        .iter()
        .find(|r| r.source_url == detail_url(&server, 5))
        .expect("placeholder missing");
    assert!(failed.is_empty());

    let failures = progress.failures.lock().unwrap();
    assert_eq!(
        *failures,
        vec![(Phase::Extraction, detail_url(&server, 5))]
    );
}

#[tokio::test]
async fn test_discovery_stops_after_first_empty_page() {
    let server = MockServer::start().await;

    // No indicator anywhere: pages 1..=3 have links, page 4 is empty
    mount_listing(&server, 1, listing_html(&[1, 2], None), 1).await;
    mount_listing(&server, 2, listing_html(&[3, 4], None), 1).await;
    mount_listing(&server, 3, listing_html(&[5], None), 1).await;
    mount_listing(&server, 4, listing_html(&[], None), 1).await;
    mount_listing(&server, 5, listing_html(&[6], None), 0).await;
    for id in 1..=5 {
        mount_detail(&server, id, 1).await;
    }

    let job = run(create_test_config(&server)).await.expect("Harvest failed");

    assert_eq!(job.plan, PagePlan::Discovery);
    assert_eq!(job.page_tasks.len(), 4);
    assert_eq!(job.detail_urls.len(), 5);
    assert_eq!(job.records.len(), 5);

    let pages: Vec<u32> = job.pages_in_order().iter().map(|t| t.page).collect();
    assert_eq!(pages, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_discovery_mode_ignores_indicator() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, listing_html(&[1], Some(9)), 1).await;
    mount_listing(&server, 2, listing_html(&[], Some(9)), 1).await;
    mount_detail(&server, 1, 1).await;

    let mut config = create_test_config(&server);
    config.crawler.pagination = PaginationMode::Discovery;
    let job = run(config).await.expect("Harvest failed");

    assert_eq!(job.plan, PagePlan::Discovery);
    assert_eq!(job.records.len(), 1);
}

#[tokio::test]
async fn test_discovery_stops_when_page_redirects_to_first() {
    let server = MockServer::start().await;

    // Out-of-range pages bounce back to the first page
    mount_listing(&server, 1, listing_html(&[1, 2], None), 2).await;
    mount_listing(&server, 2, listing_html(&[3, 4], None), 1).await;
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("sheet", "3"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}?sheet=1", LISTING_PATH).as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;
    for id in 1..=4 {
        mount_detail(&server, id, 1).await;
    }

    let job = tokio::time::timeout(Duration::from_secs(10), run(create_test_config(&server)))
        .await
        .expect("Discovery did not terminate")
        .expect("Harvest failed");

    assert_eq!(job.plan, PagePlan::Discovery);
    assert_eq!(job.page_tasks.len(), 3);
    assert_eq!(job.detail_urls.len(), 4);
    assert_eq!(job.records.len(), 4);
    assert_eq!(job.stats.records_failed, 0);
}

#[tokio::test]
async fn test_page_count_override() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, listing_html(&[1], Some(50)), 1).await;
    mount_listing(&server, 2, listing_html(&[2], Some(50)), 1).await;
    mount_listing(&server, 3, listing_html(&[3], Some(50)), 0).await;
    mount_detail(&server, 1, 1).await;
    mount_detail(&server, 2, 1).await;

    let mut config = create_test_config(&server);
    config.crawler.page_count = Some(2);
    let job = run(config).await.expect("Harvest failed");

    assert_eq!(job.plan, PagePlan::Known(2));
    assert_eq!(job.records.len(), 2);
}

#[tokio::test]
async fn test_worker_count_does_not_change_results() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, listing_html(&[1, 2], Some(3)), 2).await;
    mount_listing(&server, 2, listing_html(&[3, 4], Some(3)), 2).await;
    mount_listing(&server, 3, listing_html(&[5, 6], Some(3)), 2).await;
    for id in 1..=6 {
        mount_detail(&server, id, 2).await;
    }

    let mut serial = create_test_config(&server);
    serial.crawler.workers = 1;
    let mut wide = create_test_config(&server);
    wide.crawler.workers = 20;

    let serial = run(serial).await.expect("Serial harvest failed");
    let wide = run(wide).await.expect("Wide harvest failed");

    assert_eq!(serial.detail_urls, wide.detail_urls);

    let sources = |job: &CrawlJob| -> BTreeSet<String> {
        job.records.iter().map(|r| r.source_url.clone()).collect()
    };
    assert_eq!(sources(&serial), sources(&wide));

    let mut serial_records = serial.records.clone();
    let mut wide_records = wide.records.clone();
    serial_records.sort_by(|a, b| a.source_url.cmp(&b.source_url));
    wide_records.sort_by(|a, b| a.source_url.cmp(&b.source_url));
    assert_eq!(serial_records, wide_records);
}

#[tokio::test]
async fn test_duplicate_links_fetched_once() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, listing_html(&[1, 2], Some(2)), 1).await;
    mount_listing(&server, 2, listing_html(&[2, 3], Some(2)), 1).await;
    for id in 1..=3 {
        mount_detail(&server, id, 1).await;
    }

    let job = run(create_test_config(&server)).await.expect("Harvest failed");

    assert_eq!(job.detail_urls.len(), 3);
    assert_eq!(job.records.len(), 3);
    assert_eq!(job.stats.duplicate_links, 1);
}

#[tokio::test]
async fn test_failed_listing_page_is_contained() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, listing_html(&[1], Some(3)), 1).await;
    mount_listing(&server, 3, listing_html(&[3], Some(3)), 1).await;
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("sheet", "2"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    mount_detail(&server, 1, 1).await;
    mount_detail(&server, 3, 1).await;

    let job = run(create_test_config(&server)).await.expect("Harvest failed");

    assert_eq!(job.stats.pages_fetched, 2);
    assert_eq!(job.stats.pages_failed, 1);
    assert_eq!(job.records.len(), 2);

    let failed = job
        .page_tasks
        .iter()
        .find(|task| task.page == 2)
        .expect("page 2 missing");
    assert_eq!(failed.outcome, PageOutcome::Failed { status: Some(503) });
}

#[tokio::test]
async fn test_initial_page_failure_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let result = run(create_test_config(&server)).await;

    match result {
        Err(HarvestError::InitialPage { url, source }) => {
            assert!(url.ends_with("/funcionariospublicos?sheet=1"), "{}", url);
            assert_eq!(source.status(), Some(404));
        }
        other => panic!("expected initial page failure, got {:?}", other.map(|j| j.records.len())),
    }
}

#[tokio::test]
async fn test_progress_reports_every_unit() {
    let server = MockServer::start().await;
    mount_three_page_directory(&server).await;

    let progress = Arc::new(CapturingProgress::default());
    let job = Harvester::new(create_test_config(&server), progress.clone())
        .unwrap()
        .run()
        .await
        .expect("Harvest failed");
    assert_eq!(job.records.len(), 6);

    assert_eq!(
        *progress.started.lock().unwrap(),
        vec![(Phase::Discovery, Some(3)), (Phase::Extraction, Some(6))]
    );
    assert_eq!(
        *progress.finished.lock().unwrap(),
        vec![(Phase::Discovery, 3, 0), (Phase::Extraction, 6, 0)]
    );

    let updates = progress.updates.lock().unwrap();
    let detail: Vec<usize> = updates
        .iter()
        .filter(|u| u.phase == Phase::Extraction)
        .map(|u| u.done)
        .collect();
    assert_eq!(detail, (1..=6).collect::<Vec<_>>());

    // Every listing update precedes every detail update
    let first_detail = updates
        .iter()
        .position(|u| u.phase == Phase::Extraction)
        .unwrap();
    assert!(updates[..first_detail]
        .iter()
        .all(|u| u.phase == Phase::Discovery));
    assert!(updates[first_detail..]
        .iter()
        .all(|u| u.phase == Phase::Extraction));
}

#[tokio::test]
async fn test_legacy_variant_keeps_unfiltered_links() {
    let server = MockServer::start().await;
    let body = format!(
        r#"<html><body>
            <a class="{0}" href="/institucion/mef/perfil/7">Uno</a>
            <a class="{0}" href="/directorio/8">Dos</a>
        </body></html>"#,
        LINK_CLASS
    );
    mount_listing(&server, 1, body, 1).await;
    mount_listing(&server, 2, listing_html(&[], None), 1).await;

    for detail in ["/institucion/mef/perfil/7", "/directorio/8"] {
        Mock::given(method("GET"))
            .and(path(detail))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<h2 class="md:text-4xl mt-3">Luis Torres</h2><div class="mt-4">Jefe</div>"#,
            ))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut config = create_test_config(&server);
    config.site.variant = SiteVariant::Legacy;
    let job = run(config).await.expect("Harvest failed");

    assert_eq!(job.records.len(), 2);
    assert!(job
        .records
        .iter()
        .all(|r| r.name.as_deref() == Some("Luis Torres")));
}

#[tokio::test]
async fn test_harvest_exports_csv() {
    let server = MockServer::start().await;
    mount_three_page_directory(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&server);
    config.output.path = dir
        .path()
        .join("funcionarios")
        .join("funcionarios_publicos_{date}.csv")
        .to_string_lossy()
        .into_owned();
    let output = config.output.clone();

    let job = run(config).await.expect("Harvest failed");
    let collection = RecordCollection::new(job.records);
    let path = export_records(&collection, &output).expect("Export failed");

    let written = std::fs::read_to_string(&path).unwrap();
    let written = written
        .strip_prefix('\u{feff}')
        .expect("CSV export should start with a BOM");
    let mut lines = written.lines();
    assert_eq!(
        lines.next(),
        Some("name;institution;role;start_date;email;phone;resolution_ref;source_url;biography")
    );
    assert_eq!(lines.count(), 6);
    assert!(written.contains("Resolución Ministerial N° 1-2021-MINSA"));
}

#[tokio::test]
async fn test_harvest_exports_json_lines() {
    let server = MockServer::start().await;
    mount_three_page_directory(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&server);
    config.output.format = OutputFormat::Jsonl;
    config.output.path = dir.path().join("out.jsonl").to_string_lossy().into_owned();
    let output = config.output.clone();

    let job = run(config).await.expect("Harvest failed");
    let path = export_records(&RecordCollection::new(job.records), &output).unwrap();

    let written = std::fs::read_to_string(path).unwrap();
    let names: BTreeSet<String> = written
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["name"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(names.len(), 6);
    assert!(names.contains("Funcionario 6"));
}
