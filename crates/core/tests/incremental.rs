mod common;

use codegraph_api::{CodeIndexer, QueryDefinitionOptions, VisitPattern, WorkspaceState};
use codegraph_core::IndexerConfig;
use common::*;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

async fn query_b5(indexer: &codegraph_core::Indexer, root: &std::path::Path) -> Vec<String> {
    indexer
        .query_definitions(
            &QueryDefinitionOptions::new(root, "b.src", 5, 5),
            CancellationToken::new(),
        )
        .await
        .unwrap()
        .into_iter()
        .map(|d| format!("{}@{}:{}", d.name, d.path, d.range[0]))
        .collect()
}

#[tokio::test]
async fn test_unchanged_files_are_skipped() {
    let ws = scenario_workspace();
    let indexer = memory_indexer();

    let first = indexer
        .index_workspace(ws.path(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.files_indexed, 2);

    let second = indexer
        .index_workspace(ws.path(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(second.files_indexed, 0);
    assert_eq!(second.files_unchanged, 2);

    write_files(ws.path(), &[("a.src", &lines(&[(12, "def foo")]))]);
    let third = indexer
        .index_workspace(ws.path(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(third.files_indexed, 1);
    assert_eq!(third.files_unchanged, 1);
    assert_eq!(query_b5(&indexer, ws.path()).await, vec!["foo@a.src:12"]);
}

#[tokio::test]
async fn test_reindexing_identical_content_is_query_equivalent() {
    let ws = scenario_workspace();
    let indexer = memory_indexer();
    indexer
        .index_workspace(ws.path(), CancellationToken::new())
        .await
        .unwrap();
    let index = indexer.workspace_index(ws.path()).await.unwrap();
    let stats = index.stats().unwrap();
    let answer = query_b5(&indexer, ws.path()).await;

    indexer.remove_all_indexes(ws.path()).await.unwrap();
    indexer
        .index_workspace(ws.path(), CancellationToken::new())
        .await
        .unwrap();
    indexer
        .index_files(ws.path(), &[PathBuf::from("a.src")], CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(index.stats().unwrap(), stats);
    assert_eq!(query_b5(&indexer, ws.path()).await, answer);
}

#[tokio::test]
async fn test_vanished_files_are_removed_on_reindex() {
    let ws = scenario_workspace();
    let indexer = memory_indexer();
    indexer
        .index_workspace(ws.path(), CancellationToken::new())
        .await
        .unwrap();

    std::fs::remove_file(ws.path().join("a.src")).unwrap();
    let summary = indexer
        .index_workspace(ws.path(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(summary.files_removed, 1);
    assert_eq!(summary.files_unchanged, 1);
    assert!(query_b5(&indexer, ws.path()).await.is_empty());
}

#[tokio::test]
async fn test_index_survives_restart() {
    let ws = scenario_workspace();
    let store = tempfile::tempdir().unwrap();
    let config = IndexerConfig::default().with_index_dir(store.path());

    {
        let indexer = mock_indexer(config.clone());
        indexer
            .index_workspace(ws.path(), CancellationToken::new())
            .await
            .unwrap();
    }

    let indexer = mock_indexer(config);
    assert_eq!(indexer.workspace_state(ws.path()), WorkspaceState::Unindexed);
    assert_eq!(query_b5(&indexer, ws.path()).await, vec!["foo@a.src:10"]);
    assert_eq!(indexer.workspace_state(ws.path()), WorkspaceState::Indexed);

    let summary = indexer
        .index_workspace(ws.path(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(summary.files_unchanged, 2);
    assert_eq!(summary.files_indexed, 0);
}

#[tokio::test]
async fn test_remove_all_clears_persisted_records() {
    let ws = scenario_workspace();
    let store = tempfile::tempdir().unwrap();
    let config = IndexerConfig::default().with_index_dir(store.path());

    let indexer = mock_indexer(config.clone());
    indexer
        .index_workspace(ws.path(), CancellationToken::new())
        .await
        .unwrap();
    indexer.remove_all_indexes(ws.path()).await.unwrap();
    drop(indexer);

    let reopened = mock_indexer(config);
    assert!(query_b5(&reopened, ws.path()).await.is_empty());
    let index = reopened.workspace_index(ws.path()).await.unwrap();
    assert!(index.file_paths().unwrap().is_empty());
}

#[tokio::test]
async fn test_index_files_updates_changed_and_drops_deleted() {
    let ws = workspace(&[
        ("a.src", &lines(&[(10, "def foo")])),
        ("b.src", &lines(&[(0, "import a.src"), (5, "call foo")])),
        ("c.src", &lines(&[(1, "def foo")])),
    ]);
    let indexer = memory_indexer();
    indexer
        .index_workspace(ws.path(), CancellationToken::new())
        .await
        .unwrap();
    // c.src is not imported, so its foo ranks behind the imported one.
    assert_eq!(
        query_b5(&indexer, ws.path()).await,
        vec!["foo@a.src:10", "foo@c.src:1"]
    );

    std::fs::remove_file(ws.path().join("a.src")).unwrap();
    write_files(
        ws.path(),
        &[("b.src", &lines(&[(0, "import c.src"), (5, "call foo")]))],
    );

    let summary = indexer
        .index_files(
            ws.path(),
            &[
                PathBuf::from("a.src"),
                ws.path().join("b.src"),
                PathBuf::from("/elsewhere/x.src"),
            ],
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(summary.files_indexed, 1);
    assert_eq!(summary.files_removed, 1);
    assert_eq!(query_b5(&indexer, ws.path()).await, vec!["foo@c.src:1"]);
}

#[tokio::test]
async fn test_visit_pattern_excludes_directories() {
    let ws = workspace(&[
        ("src/a.src", &lines(&[(0, "def foo")])),
        ("generated/b.src", &lines(&[(0, "def foo")])),
        ("build-out/c.src", &lines(&[(0, "def foo")])),
    ]);
    let pattern = VisitPattern::new([".src"], ["generated", "build-*"]);
    let indexer = mock_indexer(IndexerConfig::in_memory().with_visit_pattern(pattern));

    let summary = indexer
        .index_workspace(ws.path(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(summary.files_indexed, 1);
    let index = indexer.workspace_index(ws.path()).await.unwrap();
    assert_eq!(index.file_paths().unwrap(), vec!["src/a.src"]);

    // A targeted update of an excluded file does not bring it back.
    indexer
        .index_files(
            ws.path(),
            &[PathBuf::from("generated/b.src")],
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(index.file_paths().unwrap(), vec!["src/a.src"]);
}

#[tokio::test]
async fn test_oversized_files_are_reported() {
    let ws = workspace(&[
        ("a.src", &lines(&[(0, "def foo")])),
        ("huge.src", &"def big\n".repeat(512)),
    ]);
    let indexer = mock_indexer(IndexerConfig::in_memory().with_max_file_bytes(256));

    let summary = indexer
        .index_workspace(ws.path(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(summary.files_indexed, 1);
    assert_eq!(summary.files_failed, 1);
    assert_eq!(summary.errors[0].path, PathBuf::from("huge.src"));
}

#[tokio::test]
async fn test_file_that_stops_parsing_loses_its_elements() {
    let ws = scenario_workspace();
    let indexer = memory_indexer();
    indexer
        .index_workspace(ws.path(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(query_b5(&indexer, ws.path()).await, vec!["foo@a.src:10"]);

    write_files(ws.path(), &[("a.src", &lines(&[(10, "def foo"), (11, "!!")]))]);
    let summary = indexer
        .index_workspace(ws.path(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(summary.files_failed, 1);
    assert_eq!(summary.files_unchanged, 1);
    assert!(query_b5(&indexer, ws.path()).await.is_empty());

    let index = indexer.workspace_index(ws.path()).await.unwrap();
    assert_eq!(index.file_paths().unwrap(), vec!["b.src"]);
    assert!(index.lookup("foo", None).unwrap().is_empty());
}
