//! Quality-gate evaluation (C10 slice, spec §4.10): five independent
//! thresholds, each producing its own `GateFailure` so a CI consumer can see
//! exactly which gate tripped rather than a single opaque boolean.

use scrutiny_core::config::Thresholds;

use crate::types::{GateFailure, GateVerdict, Summary};

pub fn evaluate_gate(thresholds: &Thresholds, summary: &Summary) -> GateVerdict {
    let mut failures = Vec::new();

    let nasa_min = thresholds.effective_nasa_compliance();
    if summary.nasa_compliance < nasa_min {
        failures.push(GateFailure {
            gate: "nasa_compliance".to_string(),
            actual: serde_json::json!(summary.nasa_compliance),
            threshold: serde_json::json!(nasa_min),
        });
    }

    let mece_min = thresholds.effective_mece_score();
    if summary.mece_score < mece_min {
        failures.push(GateFailure {
            gate: "mece_score".to_string(),
            actual: serde_json::json!(summary.mece_score),
            threshold: serde_json::json!(mece_min),
        });
    }

    let god_objects_max = thresholds.effective_god_objects();
    if summary.god_object_count > god_objects_max {
        failures.push(GateFailure {
            gate: "god_objects".to_string(),
            actual: serde_json::json!(summary.god_object_count),
            threshold: serde_json::json!(god_objects_max),
        });
    }

    let critical_count = summary.violations_by_severity.get("critical").copied().unwrap_or(0);
    let critical_max = thresholds.effective_critical();
    if critical_count > critical_max {
        failures.push(GateFailure {
            gate: "critical".to_string(),
            actual: serde_json::json!(critical_count),
            threshold: serde_json::json!(critical_max),
        });
    }

    let high_count = summary.violations_by_severity.get("high").copied().unwrap_or(0);
    let high_max = thresholds.effective_high();
    if high_count > high_max {
        failures.push(GateFailure {
            gate: "high".to_string(),
            actual: serde_json::json!(high_count),
            threshold: serde_json::json!(high_max),
        });
    }

    let verdict = if failures.is_empty() { "pass" } else { "fail" };
    GateVerdict { verdict, failures }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passing_summary() -> Summary {
        Summary {
            files_analyzed: 10,
            nasa_compliance: 0.95,
            mece_score: 0.9,
            god_object_count: 0,
            violations_by_severity: Default::default(),
            violations_by_rule: Default::default(),
        }
    }

    #[test]
    fn clean_summary_passes() {
        let verdict = evaluate_gate(&Thresholds::default(), &passing_summary());
        assert_eq!(verdict.verdict, "pass");
        assert!(verdict.failures.is_empty());
    }

    #[test]
    fn low_nasa_compliance_fails_its_own_gate_only() {
        let mut summary = passing_summary();
        summary.nasa_compliance = 0.5;
        let verdict = evaluate_gate(&Thresholds::default(), &summary);
        assert_eq!(verdict.verdict, "fail");
        assert_eq!(verdict.failures.len(), 1);
        assert_eq!(verdict.failures[0].gate, "nasa_compliance");
    }

    #[test]
    fn any_critical_violation_fails_the_gate() {
        let mut summary = passing_summary();
        summary.violations_by_severity.insert("critical".to_string(), 1);
        let verdict = evaluate_gate(&Thresholds::default(), &summary);
        assert!(verdict.failures.iter().any(|f| f.gate == "critical"));
    }

    #[test]
    fn multiple_gates_can_fail_at_once() {
        let mut summary = passing_summary();
        summary.mece_score = 0.1;
        summary.god_object_count = 100;
        let verdict = evaluate_gate(&Thresholds::default(), &summary);
        assert_eq!(verdict.failures.len(), 2);
    }
}
