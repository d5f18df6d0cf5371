//! Integration tests against a mock Jikan API.

use std::time::{Duration, Instant};

use anime_collector::{ApiError, Collector, CsvExporter, JikanClient};
use serde_json::{json, Value};
use shared::config::CollectorConfig;
use shared::ExportPaths;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RETRY_DELAY: Duration = Duration::from_millis(20);
const RATE_LIMIT_DELAY: Duration = Duration::from_millis(10);

fn test_client(base_url: String) -> JikanClient {
    JikanClient::new(base_url, 3, RETRY_DELAY, RATE_LIMIT_DELAY).expect("client builds")
}

fn anime_json(mal_id: u32) -> Value {
    json!({
        "mal_id": mal_id,
        "url": format!("https://myanimelist.net/anime/{}", mal_id),
        "title": format!("Anime {}", mal_id),
        "title_english": format!("Anime {} (EN)", mal_id),
        "title_japanese": null,
        "type": "TV",
        "source": "Manga",
        "episodes": 12,
        "status": "Finished Airing",
        "airing": false,
        "aired": {"from": "2009-04-05T00:00:00+00:00", "to": "2010-07-04T00:00:00+00:00"},
        "duration": "24 min per ep",
        "rating": "PG-13",
        "score": 8.25,
        "scored_by": 1000,
        "rank": mal_id,
        "popularity": mal_id * 2,
        "members": 5000,
        "favorites": 100,
        "synopsis": "A synopsis.",
        "background": null,
        "season": "spring",
        "year": 2009,
        "genres": [{"mal_id": 1, "type": "anime", "name": "Action"}],
        "studios": [{"mal_id": 4, "type": "anime", "name": "Bones"}]
    })
}

fn page_json(items: Vec<Value>, page: u32, has_next_page: bool) -> Value {
    let count = items.len();
    json!({
        "data": items,
        "pagination": {
            "last_visible_page": 10,
            "has_next_page": has_next_page,
            "current_page": page,
            "items": {"count": count, "total": 100, "per_page": 25}
        }
    })
}

fn review_json(mal_id: u32, anime_id: u32) -> Value {
    json!({
        "mal_id": mal_id,
        "url": format!("https://myanimelist.net/reviews.php?id={}", mal_id),
        "type": "anime",
        "date": "2010-07-29T11:04:00+00:00",
        "review": "Good.\nVery good.",
        "score": 9,
        "tags": ["Recommended"],
        "is_spoiler": false,
        "user": {
            "username": "reviewer1",
            "url": "https://myanimelist.net/profile/reviewer1",
            "images": {"jpg": {"image_url": null}}
        },
        "anime": {
            "mal_id": anime_id,
            "url": format!("https://myanimelist.net/anime/{}", anime_id),
            "title": format!("Anime {}", anime_id)
        }
    })
}

#[tokio::test]
async fn fetcher_retries_through_rate_limiting() {
    let server = MockServer::start().await;

    // 429 twice, then success
    Mock::given(method("GET"))
        .and(path("/top/anime"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/top/anime"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![], 1, false)))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let url = format!("{}/top/anime", server.uri());

    let start = Instant::now();
    let body = client.fetch_bytes(&url).await.expect("third attempt succeeds");
    let elapsed = start.elapsed();

    assert!(!body.is_empty());
    // Two extended backoffs (2x the rate-limit delay each), two retry
    // delays, plus the post-success throttle.
    let expected_floor = 2 * (RATE_LIMIT_DELAY * 2) + 2 * RETRY_DELAY + RATE_LIMIT_DELAY;
    assert!(
        elapsed >= expected_floor,
        "elapsed {:?} below expected floor {:?}",
        elapsed,
        expected_floor
    );
}

#[tokio::test]
async fn fetcher_exhausts_retry_budget() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/top/anime"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let url = format!("{}/top/anime", server.uri());

    let err = client.fetch_bytes(&url).await.unwrap_err();
    match err {
        ApiError::Exhausted { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*source, ApiError::Http(status) if status.as_u16() == 500));
        }
        other => panic!("expected Exhausted, got {:?}", other),
    }
}

#[tokio::test]
async fn fetcher_reports_connection_errors() {
    // Nothing is listening on this port
    let client = test_client("http://127.0.0.1:9".to_string());

    let err = client
        .fetch_bytes("http://127.0.0.1:9/top/anime")
        .await
        .unwrap_err();
    match err {
        ApiError::Exhausted { source, .. } => {
            assert!(matches!(*source, ApiError::Network(_)));
        }
        other => panic!("expected Exhausted, got {:?}", other),
    }
}

#[tokio::test]
async fn paginator_truncates_to_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/top/anime"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![anime_json(1), anime_json(2)],
            1,
            true,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/top/anime"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![anime_json(3), anime_json(4)],
            2,
            true,
        )))
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let anime = client.get_top_anime(3).await.expect("paginated fetch");

    assert_eq!(anime.len(), 3);
    assert_eq!(anime[2].mal_id, 3);
}

#[tokio::test]
async fn paginator_stops_on_terminal_page() {
    let server = MockServer::start().await;

    // The page that reports no next page does not contribute items
    Mock::given(method("GET"))
        .and(path("/top/anime"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![anime_json(1), anime_json(2)],
            1,
            true,
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/top/anime"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![anime_json(3)],
            2,
            false,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let anime = client.get_top_anime(100).await.expect("paginated fetch");

    assert_eq!(anime.len(), 2);
}

#[tokio::test]
async fn paginator_stops_on_empty_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/top/anime"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![], 1, true)))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let anime = client.get_top_anime(100).await.expect("paginated fetch");

    assert!(anime.is_empty());
}

#[tokio::test]
async fn paginator_aborts_on_malformed_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/top/anime"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let err = client.get_top_anime(100).await.unwrap_err();

    // Decode failures are not retried
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn detail_fetch_carries_statistics() {
    let server = MockServer::start().await;

    let mut detail = anime_json(5114);
    detail["statistics"] = json!({
        "watching": 100,
        "completed": 900,
        "on_hold": 10,
        "dropped": 5,
        "plan_to_watch": 50,
        "total": 1065,
        "scores": {"10": {"votes": 400, "percentage": 44.44}}
    });

    Mock::given(method("GET"))
        .and(path("/anime/5114/full"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": detail})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let anime = client.get_anime_full(5114).await.expect("detail fetch");

    let stats = anime.statistics.expect("statistics present");
    assert_eq!(stats.completed, 900);
    assert_eq!(stats.scores["10"].votes, 400);
}

fn test_settings(base_url: String, output_dir: String) -> CollectorConfig {
    CollectorConfig {
        base_url,
        max_retries: 3,
        retry_delay_ms: 5,
        rate_limit_delay_ms: 2,
        page_size: 25,
        top_anime_limit: 10,
        detail_limit: 10,
        review_anime_limit: 10,
        reviews_per_anime: 5,
        output_dir,
    }
}

async fn mount_collection_api(server: &MockServer) {
    // Ranked list: one full page, then a terminal page
    Mock::given(method("GET"))
        .and(path("/top/anime"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            vec![anime_json(1), anime_json(2)],
            1,
            true,
        )))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/top/anime"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![], 2, false)))
        .mount(server)
        .await;

    // Entry 1 details carry a snapshot; entry 2's detail fetch always fails
    let mut detail = anime_json(1);
    detail["statistics"] = json!({
        "watching": 10,
        "completed": 20,
        "on_hold": 3,
        "dropped": 1,
        "plan_to_watch": 6,
        "total": 40,
        "scores": {
            "1": {"votes": 5, "percentage": 12.34},
            "7": {"votes": 2, "percentage": 3.0}
        }
    });
    Mock::given(method("GET"))
        .and(path("/anime/1/full"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": detail})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/anime/2/full"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;

    // Reviews: one for entry 1, none for entry 2
    Mock::given(method("GET"))
        .and(path("/anime/1/reviews"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page_json(vec![review_json(77, 1)], 1, true)),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/anime/1/reviews"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![], 2, false)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/anime/2/reviews"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![], 1, false)))
        .mount(server)
        .await;
}

async fn run_collection(server: &MockServer, output_dir: &std::path::Path) -> anime_collector::CollectorStats {
    let settings = test_settings(
        server.uri(),
        output_dir.to_string_lossy().to_string(),
    );
    let client = JikanClient::new(
        settings.base_url.clone(),
        settings.max_retries,
        Duration::from_millis(settings.retry_delay_ms),
        Duration::from_millis(settings.rate_limit_delay_ms),
    )
    .expect("client builds");
    let exporter = CsvExporter::new(ExportPaths::new(output_dir));

    Collector::new(client, exporter, settings)
        .run()
        .await
        .expect("collection run succeeds")
}

#[tokio::test]
async fn collection_run_tolerates_enrichment_failures() {
    let server = MockServer::start().await;
    mount_collection_api(&server).await;

    let dir = tempfile::TempDir::new().unwrap();
    let stats = run_collection(&server, dir.path()).await;

    assert_eq!(stats.entries_fetched, 2);
    assert_eq!(stats.details_enriched, 1);
    assert_eq!(stats.detail_failures, 1);
    assert_eq!(stats.statistics_rows, 1);
    assert_eq!(stats.reviews_fetched, 1);
    assert_eq!(stats.review_failures, 0);

    let paths = ExportPaths::new(dir.path());
    let basic = std::fs::read_to_string(paths.basic_csv()).unwrap();
    assert_eq!(basic.lines().count(), 3); // header + 2 entries

    let stats_table = std::fs::read_to_string(paths.statistics_csv()).unwrap();
    let row = stats_table.lines().nth(1).expect("one statistics row");
    let fields: Vec<&str> = row.split(',').collect();
    assert_eq!(fields[0], "1");
    // scores 1 and 7 projected, the rest at defaults
    assert_eq!(&fields[7..9], &["5", "12.34"]);
    assert_eq!(&fields[19..21], &["2", "3.00"]);
    assert_eq!(&fields[9..11], &["0", "0"]);

    let reviews = std::fs::read_to_string(paths.reviews_csv()).unwrap();
    assert_eq!(reviews.lines().count(), 2);
    assert!(reviews.contains("Good. Very good."));
}

#[tokio::test]
async fn collection_runs_are_byte_identical() {
    let server = MockServer::start().await;
    mount_collection_api(&server).await;

    let first_dir = tempfile::TempDir::new().unwrap();
    let second_dir = tempfile::TempDir::new().unwrap();

    run_collection(&server, first_dir.path()).await;
    run_collection(&server, second_dir.path()).await;

    let first_paths = ExportPaths::new(first_dir.path());
    let second_paths = ExportPaths::new(second_dir.path());

    for (a, b) in [
        (first_paths.basic_csv(), second_paths.basic_csv()),
        (first_paths.genres_csv(), second_paths.genres_csv()),
        (first_paths.studios_csv(), second_paths.studios_csv()),
        (first_paths.statistics_csv(), second_paths.statistics_csv()),
        (first_paths.reviews_csv(), second_paths.reviews_csv()),
    ] {
        let first = std::fs::read(&a).unwrap();
        let second = std::fs::read(&b).unwrap();
        assert_eq!(first, second, "{} differs between runs", a.display());
    }
}

#[tokio::test]
async fn top_level_failure_aborts_before_any_rows() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/top/anime"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let settings = test_settings(server.uri(), dir.path().to_string_lossy().to_string());
    let client = JikanClient::new(
        settings.base_url.clone(),
        settings.max_retries,
        Duration::from_millis(settings.retry_delay_ms),
        Duration::from_millis(settings.rate_limit_delay_ms),
    )
    .unwrap();
    let exporter = CsvExporter::new(ExportPaths::new(dir.path()));

    let err = Collector::new(client, exporter, settings)
        .run()
        .await
        .unwrap_err();
    assert!(err.to_string().contains("top anime"));

    // The ranked-list fetch failed, so no table was written
    let paths = ExportPaths::new(dir.path());
    assert!(!paths.basic_csv().exists());
}
