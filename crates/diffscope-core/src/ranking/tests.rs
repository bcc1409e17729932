use std::sync::Arc;

use super::*;
use crate::embedding::HashEmbedder;
use crate::index::{HunkIndex, HunkMeta};
use crate::scoring::{HeuristicScorer, Scorer};

fn file(filename: &str, patch: &str, additions: u64, deletions: u64) -> FileChange {
    FileChange {
        filename: filename.to_string(),
        patch: Some(patch.to_string()),
        additions,
        deletions,
    }
}

fn engine_without_index() -> RankingEngine {
    RankingEngine::new(
        Arc::new(Scorer::Heuristic(HeuristicScorer)),
        Arc::new(HashEmbedder::new(64)),
        None,
    )
}

#[tokio::test]
async fn empty_files_is_not_an_error() {
    let engine = engine_without_index();
    let result = engine.rank_pr("7", "acme/widgets", &[]).await;

    assert_eq!(result.pr_id, "7");
    assert!(result.ranked_files.is_empty());
    assert_eq!(result.processing_ms, 0);
}

#[tokio::test]
async fn every_file_is_ranked_exactly_once() {
    let engine = engine_without_index();
    let files = vec![
        file("src/auth/token.rs", "+validate()", 10, 2),
        file("docs/changelog.md", "+entry", 1, 0),
        file("tests/auth_test.rs", "+assert", 5, 5),
    ];

    let result = engine.rank_pr("7", "acme/widgets", &files).await;

    assert_eq!(result.ranked_files.len(), files.len());
    let mut ranks: Vec<usize> = result.ranked_files.iter().map(|f| f.rank).collect();
    ranks.sort_unstable();
    assert_eq!(ranks, vec![1, 2, 3]);
}

#[tokio::test]
async fn output_is_sorted_by_final_score_descending() {
    let engine = engine_without_index();
    let files = vec![
        file("docs/a.md", "+x", 1, 0),
        file("src/auth/login.rs", "+token check", 80, 30),
        file("README.md", "+badge", 1, 1),
    ];

    let result = engine.rank_pr("9", "acme/widgets", &files).await;

    let scores: Vec<f32> = result.ranked_files.iter().map(|f| f.final_score).collect();
    for pair in scores.windows(2) {
        assert!(pair[0] >= pair[1]);
    }
    assert_eq!(result.ranked_files[0].filename, "src/auth/login.rs");
}

#[tokio::test]
async fn final_score_is_weighted_blend_rounded() {
    let engine = engine_without_index();
    let files = vec![file("src/main.rs", "+fn main()", 3, 1)];

    let result = engine.rank_pr("1", "acme/widgets", &files).await;
    let ranked = &result.ranked_files[0];

    let expected = crate::types::round4(
        RERANK_WEIGHT * ranked.reranker_score + RETRIEVAL_WEIGHT * ranked.retrieval_score,
    );
    assert!((ranked.final_score - expected).abs() < 1e-6);
    // No index: the retrieval term contributes nothing.
    assert_eq!(ranked.retrieval_score, 0.0);
}

#[tokio::test]
async fn retrieval_score_reflects_best_index_match() {
    let embedder = Arc::new(HashEmbedder::new(64));
    let files = vec![file("src/auth/session.rs", "+fn refresh_session()", 4, 0)];

    // Index a vector for the exact composite text the engine will score.
    let text = score_text(&files[0]);
    let vectors = embedder.embed(&[text]).await.unwrap();
    let mut index = HunkIndex::new(64);
    index
        .build(
            &vectors,
            vec![HunkMeta {
                filename: "src/auth/session.rs".to_string(),
                importance: 0.8,
                hunk_preview: "+fn refresh_session()".to_string(),
                pr_id: 3,
                repo: "acme/widgets".to_string(),
            }],
        )
        .unwrap();

    let engine = RankingEngine::new(
        Arc::new(Scorer::Heuristic(HeuristicScorer)),
        embedder,
        Some(Arc::new(index)),
    );

    let result = engine.rank_pr("3", "acme/widgets", &files).await;
    let ranked = &result.ranked_files[0];

    assert!(
        ranked.retrieval_score > 0.99,
        "exact match should score ~1.0, got {}",
        ranked.retrieval_score
    );
}

#[tokio::test]
async fn explanations_follow_fixed_reason_order() {
    let engine = engine_without_index();
    let files = vec![
        file("src/auth/keys.rs", "+rotate", 90, 20),
        file("lib/parser.rs", "+peek", 2, 1),
        file("config/settings.yml", "+flag", 200, 0),
        file("docs/notes.md", "+note", 1, 0),
    ];

    let result = engine.rank_pr("5", "acme/widgets", &files).await;
    let by_name = |name: &str| {
        result
            .ranked_files
            .iter()
            .find(|f| f.filename == name)
            .unwrap()
    };

    assert_eq!(
        by_name("src/auth/keys.rs").explanation,
        "security-sensitive path, large change, core source → high priority"
    );
    assert_eq!(by_name("lib/parser.rs").explanation, "core source → high priority");
    assert_eq!(
        by_name("config/settings.yml").explanation,
        "large change → high priority"
    );
    assert_eq!(by_name("docs/notes.md").explanation, "standard change");
}

#[tokio::test]
async fn scores_are_rounded_to_four_decimals() {
    let engine = engine_without_index();
    let files = vec![file("src/engine.rs", "+tick", 1, 0)];

    let result = engine.rank_pr("2", "acme/widgets", &files).await;
    for ranked in &result.ranked_files {
        for score in [
            ranked.reranker_score,
            ranked.retrieval_score,
            ranked.final_score,
        ] {
            assert_eq!(score, crate::types::round4(score));
        }
    }
}

#[test]
fn score_text_bounds_patch_length() {
    let long_patch = "+".repeat(2000);
    let f = file("src/big.rs", &long_patch, 100, 0);
    let text = score_text(&f);

    assert!(text.starts_with("<file>src/big.rs</file><diff>"));
    assert!(text.len() < 600);
}

#[test]
fn score_text_handles_missing_patch() {
    let f = FileChange {
        filename: "image.png".to_string(),
        patch: None,
        additions: 0,
        deletions: 0,
    };
    assert_eq!(score_text(&f), "<file>image.png</file><diff></diff>");
}
