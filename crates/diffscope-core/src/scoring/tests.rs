use serde_json::json;

use super::*;

fn score_one(text: &str) -> f32 {
    HeuristicScorer.score_one(text)
}

#[test]
fn baseline_score_for_plain_text() {
    assert!((score_one("<file>docs/guide.md</file><diff>+hello</diff>") - 0.4).abs() < 1e-6);
}

#[test]
fn security_keywords_raise_score() {
    let score = score_one("<file>docs/password_policy.md</file><diff>+rotate</diff>");
    assert!((score - 0.75).abs() < 1e-6);
}

#[test]
fn source_root_raises_score() {
    let score = score_one("<file>src/engine.rs</file><diff>+loop</diff>");
    assert!((score - 0.55).abs() < 1e-6);
}

#[test]
fn test_paths_lower_score() {
    let score = score_one("<file>benchmarks/test_runner.md</file><diff>+x</diff>");
    assert!((score - 0.25).abs() < 1e-6);
}

#[test]
fn long_text_gets_size_bonus() {
    let diff = "x".repeat(600);
    let score = score_one(&format!("<file>docs/notes.md</file><diff>{diff}</diff>"));
    assert!((score - 0.45).abs() < 1e-6);
}

#[test]
fn size_bonus_counts_characters_not_bytes() {
    // 300 two-byte characters: over 500 bytes but under 500 characters,
    // so no size bonus.
    let diff = "é".repeat(300);
    let text = format!("<file>docs/notes.md</file><diff>{diff}</diff>");
    assert!(text.len() > LONG_TEXT_THRESHOLD);
    assert!(text.chars().count() <= LONG_TEXT_THRESHOLD);
    assert!((score_one(&text) - 0.4).abs() < 1e-6);
}

#[test]
fn score_is_clamped_to_unit_interval() {
    // Security + source + long text stacks to 0.95, still within [0, 1].
    let diff = "y".repeat(600);
    let score = score_one(&format!("<file>src/auth/login.rs</file><diff>{diff}</diff>"));
    assert!((0.0..=1.0).contains(&score));
    assert!((score - 0.95).abs() < 1e-6);

    // Test-path penalty alone cannot go below zero.
    assert!(score_one("test") >= 0.0);
}

#[tokio::test]
async fn empty_input_yields_empty_output() {
    let scorer = Scorer::Heuristic(HeuristicScorer);
    assert!(scorer.score(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn heuristic_is_selected_without_endpoint() {
    let config = crate::config::Config::default();
    let scorer = Scorer::init(&config, reqwest::Client::new()).await;
    assert!(!scorer.is_model_backed());
}

#[tokio::test]
async fn rank_sorts_descending_and_attaches_scores() {
    let scorer = Scorer::Heuristic(HeuristicScorer);
    let items = vec![
        json!({"name": "docs", "diff": "<file>docs/a.md</file><diff>+x</diff>"}),
        json!({"name": "auth", "diff": "<file>src/auth.rs</file><diff>+token</diff>"}),
    ];

    let ranked = scorer.rank(items, "diff").await.unwrap();

    assert_eq!(ranked[0]["name"], "auth");
    assert_eq!(ranked[1]["name"], "docs");
    for item in &ranked {
        let score = item[RERANKER_SCORE_KEY].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&score));
    }
}

#[tokio::test]
async fn rank_is_stable_on_ties() {
    let scorer = Scorer::Heuristic(HeuristicScorer);
    let items = vec![
        json!({"name": "first", "diff": "<file>docs/a.md</file><diff>+x</diff>"}),
        json!({"name": "second", "diff": "<file>docs/b.md</file><diff>+y</diff>"}),
    ];

    let ranked = scorer.rank(items, "diff").await.unwrap();

    assert_eq!(ranked[0]["name"], "first");
    assert_eq!(ranked[1]["name"], "second");
}

#[tokio::test]
async fn rank_treats_missing_text_key_as_empty() {
    let scorer = Scorer::Heuristic(HeuristicScorer);
    let items = vec![json!({"name": "no_diff"})];

    let ranked = scorer.rank(items, "diff").await.unwrap();
    let score = ranked[0][RERANKER_SCORE_KEY].as_f64().unwrap() as f32;
    assert!((score - 0.4).abs() < 1e-6);
}

#[test]
fn sigmoid_squashes_into_unit_interval() {
    assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
    assert!(sigmoid(10.0) > 0.99);
    assert!(sigmoid(-10.0) < 0.01);
}
