//! Tests for the cypherlats binary support modules: output formatting, config overrides

use chrono::Utc;
use cypherlats::logging::default_directives;
use cypherlats::*;
use cypherlats_core::ProviderKind;
use cypherlats_search::{SearchOutcome, SearchStatus, INITIAL_FAILURE};
use std::io::Write;

fn solved_outcome() -> SearchOutcome {
    SearchOutcome {
        run_id: "0f8fad5b-d9cb-469f-a165-70867728950e".into(),
        question: "Which services depend on auth?".into(),
        status: SearchStatus::Solved,
        answer: "MATCH (s:Service)-[:DEPENDS_ON]->(:Service {name: 'auth'}) RETURN s.name".into(),
        trajectory: vec![
            "Map 'services' to the :Service label".into(),
            "MATCH (s:Service)-[:DEPENDS_ON]->(:Service {name: 'auth'}) RETURN s.name".into(),
        ],
        rounds: 1,
        nodes: 4,
        tree_height: 2,
        best_value: 0.9,
        started: Utc::now(),
        elapsed_ms: 1500,
    }
}

// ===========================================================================
// Output formatting
// ===========================================================================

#[test]
fn plain_format_is_answer_only() {
    let outcome = solved_outcome();
    let out = format_outcome(&outcome, OutputFormat::Plain).unwrap();
    assert_eq!(out, outcome.answer);
}

#[test]
fn json_format_round_trips_outcome() {
    let outcome = solved_outcome();
    let out = format_outcome(&outcome, OutputFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["status"], "solved");
    assert_eq!(value["rounds"], 1);
    assert_eq!(value["trajectory"].as_array().unwrap().len(), 2);
}

#[test]
fn detailed_format_lists_summary_and_steps() {
    let out = format_outcome(&solved_outcome(), OutputFormat::Detailed).unwrap();
    assert!(out.starts_with("═══ Run 0f8fad5b ═══"));
    assert!(out.contains("Status: solved | rounds: 1 | nodes: 4 | height: 2 | value: 0.90 | 1.5s"));
    assert!(out.contains("── Step 1 ──\nMap 'services' to the :Service label"));
    assert!(out.contains("── Step 2 ──"));
    assert!(out.trim_end().ends_with("RETURN s.name"));
}

#[test]
fn detailed_format_skips_steps_on_failure() {
    let outcome = SearchOutcome::failed("run-1", "q", INITIAL_FAILURE, Utc::now());
    let out = format_outcome(&outcome, OutputFormat::Detailed).unwrap();
    assert!(out.contains("Status: failed"));
    assert!(!out.contains("── Step"));
    assert!(out.contains(INITIAL_FAILURE));
}

#[test]
fn detailed_format_shortens_non_ascii_run_id() {
    let mut outcome = solved_outcome();
    outcome.run_id = "运行-城市-查询-0001".into();
    let out = format_outcome(&outcome, OutputFormat::Detailed).unwrap();
    assert!(out.starts_with("═══ Run 运行-城市-查询 ═══"));
}

#[test]
fn detailed_format_truncates_long_steps() {
    let mut outcome = solved_outcome();
    outcome.trajectory = vec![(0..30).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n")];
    let out = format_outcome(&outcome, OutputFormat::Detailed).unwrap();
    assert!(out.contains("line 19"));
    assert!(!out.contains("line 20\n"));
    assert!(out.contains("... (10 more lines)"));
}

// ===========================================================================
// Config resolution
// ===========================================================================

#[test]
fn overrides_replace_file_values() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[search]\nsearch_depth = 8\nexpand_num = 4\n\n[model]\ngenerator_model = \"from-file\""
    )
    .unwrap();

    let overrides = Overrides {
        expand_num: Some(2),
        timeout_secs: Some(30),
        provider: Some(ProviderKind::Openai),
        ..Default::default()
    };
    let config = resolve(Some(file.path()), &overrides).unwrap();

    assert_eq!(config.search.search_depth, 8);
    assert_eq!(config.search.expand_num, 2);
    assert_eq!(config.search.oracle_timeout_secs, Some(30));
    assert_eq!(config.model.provider, ProviderKind::Openai);
    assert_eq!(config.model.generator_model, "from-file");
}

#[test]
fn invalid_override_is_rejected() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let overrides = Overrides {
        search_depth: Some(0),
        ..Default::default()
    };
    assert!(resolve(Some(file.path()), &overrides).is_err());
}

#[test]
fn explicit_missing_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(load_config(Some(&missing)).is_err());
}

#[test]
fn default_directives_cover_every_crate() {
    let info = default_directives(false);
    assert!(info.contains("cypherlats=info"));
    assert!(info.contains("cypherlats_search=info"));
    assert!(info.contains("cypherlats_llm=info"));
    assert!(default_directives(true).contains("cypherlats_core=debug"));
}
