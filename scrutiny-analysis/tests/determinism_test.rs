//! Determinism tests (spec §8 property 4: identical inputs and config
//! always produce identical `Violation` ids and counts). Non-determinism in
//! `FxHashMap` iteration order is the classic footgun here — both the
//! name-index build and the per-rule grouping in the orchestrator iterate
//! hash maps, so this guards against either leaking into the final report.

use scrutiny_analysis::orchestrator::Orchestrator;
use scrutiny_core::config::AnalysisConfig;

fn write_fixture(dir: &std::path::Path) {
    std::fs::write(
        dir.join("service.py"),
        "import shared\n\ndef handle(a, b, c, d, e):\n    if shared.flag is True:\n        return a\n    return b\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("client.py"),
        "import shared\n\nclass Client:\n    def call(self):\n        return shared.flag\n",
    )
    .unwrap();
}

fn run_once(dir: &std::path::Path) -> Vec<(String, u64)> {
    let orchestrator = Orchestrator::new(AnalysisConfig::default(), dir.to_path_buf()).unwrap();
    let report = orchestrator.run().unwrap();
    let mut ids: Vec<(String, u64)> = report.violations.iter().map(|v| (v.rule_id.as_str().to_string(), v.id)).collect();
    ids.sort();
    ids
}

#[test]
fn repeated_runs_over_the_same_tree_produce_the_same_violation_ids() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    let mut all_runs = Vec::new();
    for _ in 0..5 {
        all_runs.push(run_once(dir.path()));
    }

    for (i, run) in all_runs.iter().enumerate().skip(1) {
        assert_eq!(&all_runs[0], run, "run 0 vs run {i} produced different violation sets");
    }
}

#[test]
fn repeated_runs_agree_on_the_gate_verdict_and_summary_counts() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    let mut fingerprints = Vec::new();
    for _ in 0..5 {
        let orchestrator = Orchestrator::new(AnalysisConfig::default(), dir.path().to_path_buf()).unwrap();
        let report = orchestrator.run().unwrap();
        fingerprints.push(format!(
            "{}:{}:{}:{:?}",
            report.summary.files_analyzed, report.summary.god_object_count, report.gate.verdict, report.summary.violations_by_rule
        ));
    }

    for (i, fp) in fingerprints.iter().enumerate().skip(1) {
        assert_eq!(&fingerprints[0], fp, "fingerprint differs between run 0 and run {i}");
    }
}
