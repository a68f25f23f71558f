mod common;

use mockall::Sequence;
use serde_json::json;
use tracing::Level;

use common::{capture_events, config_from, repos};
use task_collect_core::collect::SyncCollector;
use task_collect_core::config::CollectConfig;
use task_collect_core::contract::{FeedRequest, MockRawFeeder};
use task_collect_core::error::CollectError;
use task_collect_core::report::RepoOutcome;

fn local_config() -> CollectConfig {
    config_from(json!({
        "general": { "es_collection": "http://es:9200" },
        "backends": {
            "git": { "raw_index": "git_raw", "enriched_index": "git_enriched", "fetch-cache": true },
            "github": { "raw_index": "github_raw", "enriched_index": "github", "api-token": "t0k3n" },
            "mbox": { "collect": false },
            "gerrit": { "enriched_index": "gerrit" }
        }
    }))
}

#[tokio::test]
async fn disabled_backend_makes_no_collection_call() {
    let config = local_config();
    let mut feeder = MockRawFeeder::new();
    feeder.expect_feed_backend().never();

    let (events, _guard) = capture_events();
    let report = SyncCollector::new(&config, &feeder)
        .collect("mbox", &repos(&["list-a /srv/mbox/a", "list-b /srv/mbox/b"]))
        .await
        .expect("disabled backend is not an error");

    assert_eq!(report.count(RepoOutcome::SkippedDisabled), 2);
    let events = events.lock().unwrap();
    assert!(
        events
            .iter()
            .any(|e| e.level == Level::INFO && e.message.contains("mbox collect disabled")),
        "expected a 'collect disabled' info event, got: {events:?}"
    );
}

#[tokio::test]
async fn every_repository_is_fed_in_listed_order() {
    let config = local_config();
    let mut feeder = MockRawFeeder::new();
    let mut seq = Sequence::new();

    for url in ["https://example.com/a.git", "https://example.com/b.git"] {
        feeder
            .expect_feed_backend()
            .times(1)
            .in_sequence(&mut seq)
            .withf(move |req: &FeedRequest| {
                req.url == url
                    && req.endpoint == "http://es:9200"
                    && !req.clean
                    && req.fetch_cache
                    && req.backend_name == "git"
                    && req.raw_index == "git_raw"
                    && req.enriched_index == "git_enriched"
                    && req.backend_args.get("uri") == Some(&json!(url))
            })
            .returning(|_| Ok(()));
    }

    let report = SyncCollector::new(&config, &feeder)
        .collect(
            "git",
            &repos(&["https://example.com/a.git", "https://example.com/b.git"]),
        )
        .await
        .expect("collection should succeed");

    assert_eq!(report.count(RepoOutcome::Collected), 2);
    assert_eq!(report.repos[0].repo, "https://example.com/a.git");
    assert!(report.repos.iter().all(|r| r.task_id.is_none()));
}

#[tokio::test]
async fn filter_raw_repository_is_skipped_and_the_loop_continues() {
    let config = local_config();
    let mut feeder = MockRawFeeder::new();
    feeder
        .expect_feed_backend()
        .times(1)
        .withf(|req: &FeedRequest| req.url == "http://y")
        .returning(|_| Ok(()));

    let (events, _guard) = capture_events();
    let report = SyncCollector::new(&config, &feeder)
        .collect("git", &repos(&["http://x --filter-raw=some-index", "http://y"]))
        .await
        .expect("collection should succeed");

    assert_eq!(
        report.outcome_of("http://x --filter-raw=some-index"),
        Some(RepoOutcome::SkippedFilterRaw)
    );
    assert_eq!(report.outcome_of("http://y"), Some(RepoOutcome::Collected));
    let events = events.lock().unwrap();
    assert!(
        events
            .iter()
            .any(|e| e.level == Level::WARN && e.message.contains("Not collecting filter raw repository")),
        "expected a filter-raw warning, got: {events:?}"
    );
}

#[tokio::test]
async fn feeder_failure_aborts_the_remaining_repositories() {
    let config = local_config();
    let mut feeder = MockRawFeeder::new();
    let mut seq = Sequence::new();
    feeder
        .expect_feed_backend()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|req: &FeedRequest| req.backend_args.get("repository") == Some(&json!("one")))
        .returning(|_| Ok(()));
    feeder
        .expect_feed_backend()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|req: &FeedRequest| req.backend_args.get("repository") == Some(&json!("two")))
        .returning(|_| Err("index unavailable".into()));

    let err = SyncCollector::new(&config, &feeder)
        .collect(
            "github",
            &repos(&[
                "https://github.com/chaoss/one",
                "https://github.com/chaoss/two",
                "https://github.com/chaoss/three",
            ]),
        )
        .await
        .expect_err("second repository fails");

    match err {
        CollectError::Collection { backend, repo, message } => {
            assert_eq!(backend, "github");
            assert_eq!(repo, "https://github.com/chaoss/two");
            assert!(message.contains("index unavailable"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn perceval_arguments_reach_the_feeder() {
    let config = local_config();
    let mut feeder = MockRawFeeder::new();
    feeder
        .expect_feed_backend()
        .times(1)
        .withf(|req: &FeedRequest| {
            !req.fetch_cache
                && req.backend_args.get("owner") == Some(&json!("chaoss"))
                && req.backend_args.get("repository") == Some(&json!("grimoirelab"))
                && req.backend_args.get("api-token") == Some(&json!("t0k3n"))
        })
        .returning(|_| Ok(()));

    SyncCollector::new(&config, &feeder)
        .collect("github", &repos(&["https://github.com/chaoss/grimoirelab"]))
        .await
        .expect("collection should succeed");
}

#[tokio::test]
async fn missing_raw_index_is_a_configuration_error() {
    let config = local_config();
    let mut feeder = MockRawFeeder::new();
    feeder.expect_feed_backend().never();

    let err = SyncCollector::new(&config, &feeder)
        .collect("gerrit", &repos(&["review.example.org"]))
        .await
        .expect_err("raw_index is required");
    assert!(
        matches!(err, CollectError::Configuration { ref message, .. } if message.contains("raw_index")),
        "got {err:?}"
    );
}

#[tokio::test]
async fn missing_backend_section_is_a_configuration_error() {
    let config = local_config();
    let mut feeder = MockRawFeeder::new();
    feeder.expect_feed_backend().never();

    let err = SyncCollector::new(&config, &feeder)
        .collect("slack", &repos(&["C0123"]))
        .await
        .expect_err("no section for slack");
    assert!(matches!(err, CollectError::Configuration { .. }));
}

#[tokio::test]
async fn mailing_list_entry_with_filter_raw_is_not_collected() {
    let mut config = local_config();
    config.backends.insert(
        "pipermail".to_string(),
        serde_json::from_value(json!({ "raw_index": "pm_raw", "enriched_index": "pm" })).unwrap(),
    );
    let mut feeder = MockRawFeeder::new();
    feeder
        .expect_feed_backend()
        .times(1)
        .withf(|req: &FeedRequest| {
            req.url == "list-b"
                && req.backend_args.get("dirpath") == Some(&json!("/srv/mbox/b"))
        })
        .returning(|_| Ok(()));

    let report = SyncCollector::new(&config, &feeder)
        .collect(
            "pipermail",
            &repos(&[
                "list-a /srv/mbox/a --filter-raw=data.project:x",
                "list-b /srv/mbox/b",
            ]),
        )
        .await
        .expect("collection should succeed");

    assert_eq!(
        report.outcome_of("list-a /srv/mbox/a --filter-raw=data.project:x"),
        Some(RepoOutcome::SkippedFilterRaw)
    );
    assert_eq!(report.outcome_of("list-b /srv/mbox/b"), Some(RepoOutcome::Collected));
}

#[tokio::test]
async fn enrichment_only_backend_needs_no_indexes() {
    let config = config_from(json!({
        "backends": { "jira": { "enriched_index": "jira" } }
    }));
    let mut feeder = MockRawFeeder::new();
    feeder.expect_feed_backend().never();

    let report = SyncCollector::new(&config, &feeder)
        .collect("jira", &repos(&["https://jira.example.com --filter-raw=data.project:x"]))
        .await
        .expect("skipped repositories never read the indexes");
    assert_eq!(report.count(RepoOutcome::SkippedFilterRaw), 1);
}

#[tokio::test]
async fn collector_logs_name_arguments_without_their_values() {
    let config = local_config();
    let mut feeder = MockRawFeeder::new();
    feeder.expect_feed_backend().times(1).returning(|_| Ok(()));

    let (events, _guard) = capture_events();
    SyncCollector::new(&config, &feeder)
        .collect("github", &repos(&["https://github.com/chaoss/grimoirelab"]))
        .await
        .expect("collection should succeed");

    let events = events.lock().unwrap();
    assert!(
        events.iter().any(|e| e.fields.iter().any(|f| f.contains("api-token"))),
        "argument names are traced: {events:?}"
    );
    assert!(
        events
            .iter()
            .all(|e| !e.message.contains("t0k3n") && e.fields.iter().all(|f| !f.contains("t0k3n"))),
        "argument values leaked: {events:?}"
    );
}
