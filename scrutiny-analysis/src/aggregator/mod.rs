//! Quality-Gate Aggregator (C10 slice, spec §4.10): turns a `RepoReport`'s
//! flat violation list into SARIF 2.1.0, the secondary output format. Rollup
//! and gate evaluation live on the orchestrator (they need the repo-wide
//! `Summary` as it's assembled); this module only ever reads a finished
//! `RepoReport`.
//!
//! Ground: `drift_analysis::graph::taint::sarif`, flattened from one
//! multi-hop `codeFlow` per taint path to one `result` per `Violation` —
//! connascence and NASA findings are single-location, so `codeFlows` has no
//! counterpart here.

use serde::{Deserialize, Serialize};

use crate::types::{RepoReport, Violation};

pub fn generate_sarif(report: &RepoReport) -> SarifReport {
    let results = report.violations.iter().map(build_sarif_result).collect();
    SarifReport {
        schema: "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/main/sarif-2.1/schema/sarif-schema-2.1.0.json".to_string(),
        version: "2.1.0".to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: "scrutiny".to_string(),
                    version: report.analyzer_version.clone(),
                    rules: build_rules(&report.violations),
                },
            },
            results,
        }],
    }
}

fn build_sarif_result(violation: &Violation) -> SarifResult {
    SarifResult {
        rule_id: violation.rule_id.as_str().to_string(),
        level: violation.severity.sarif_level().to_string(),
        message: SarifMessage { text: violation.message.clone() },
        locations: vec![SarifLocation {
            physical_location: SarifPhysicalLocation {
                artifact_location: SarifArtifactLocation { uri: violation.span.file.clone() },
                region: SarifRegion {
                    start_line: violation.span.line,
                    start_column: Some(violation.span.col),
                },
            },
        }],
    }
}

/// One SARIF rule per distinct `rule_id` seen in the run, in first-seen
/// order so the driver's rule table stays deterministic across runs with the
/// same violations.
fn build_rules(violations: &[Violation]) -> Vec<SarifRule> {
    let mut seen = std::collections::HashSet::new();
    let mut rules = Vec::new();
    for v in violations {
        if seen.insert(v.rule_id.as_str().to_string()) {
            rules.push(SarifRule {
                id: v.rule_id.as_str().to_string(),
                name: format!("{:?}", v.kind),
                short_description: SarifMessage { text: rule_description(v.rule_id.as_str()).to_string() },
            });
        }
    }
    rules
}

fn rule_description(rule_id: &str) -> &'static str {
    match rule_id {
        "CoN" => "Connascence of Name: shared identifiers coupling two locations",
        "CoT" => "Connascence of Type: shared assumptions about a value's type",
        "CoM" => "Connascence of Meaning: magic values whose interpretation is implicit",
        "CoP" => "Connascence of Position: positional arguments coupling call order",
        "CoA" => "Connascence of Algorithm: duplicated algorithmic logic",
        "CoE" => "Connascence of Execution: order-dependent side effects",
        "CoV" => "Connascence of Value: correlated values that must change together",
        "CoI" => "Connascence of Identity: identity comparison where equality is meant",
        "CoC" => "Connascence of Convention: implicit naming or structural conventions",
        "GOD_OBJECT" => "A class or module with excessive responsibility",
        "DUPLICATION" => "Duplicated logic across files (MECE violation)",
        "NASA" => "NASA POT10 safety-rule violation",
        _ => "Scrutiny finding",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifReport {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub version: String,
    pub runs: Vec<SarifRun>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifRun {
    pub tool: SarifTool,
    pub results: Vec<SarifResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifTool {
    pub driver: SarifDriver,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifDriver {
    pub name: String,
    pub version: String,
    pub rules: Vec<SarifRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifRule {
    pub id: String,
    pub name: String,
    #[serde(rename = "shortDescription")]
    pub short_description: SarifMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifResult {
    #[serde(rename = "ruleId")]
    pub rule_id: String,
    pub level: String,
    pub message: SarifMessage,
    pub locations: Vec<SarifLocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifMessage {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    pub physical_location: SarifPhysicalLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    pub artifact_location: SarifArtifactLocation,
    pub region: SarifRegion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifArtifactLocation {
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifRegion {
    #[serde(rename = "startLine")]
    pub start_line: u32,
    #[serde(rename = "startColumn", skip_serializing_if = "Option::is_none")]
    pub start_column: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrutiny_core::types::severity::Severity;
    use scrutiny_core::types::span::Span;
    use crate::types::{GateVerdict, Summary, ViolationKind};

    fn sample_report() -> RepoReport {
        let violation = Violation::new(ViolationKind::ConnascenceOfName, Severity::High, Span::point("a.py", 10, 2), "shared name across files", serde_json::json!({}));
        RepoReport {
            analyzer_version: "0.1.0".to_string(),
            run_id: "deadbeef".to_string(),
            partial: false,
            summary: Summary {
                files_analyzed: 1,
                nasa_compliance: 1.0,
                mece_score: 1.0,
                god_object_count: 0,
                violations_by_severity: Default::default(),
                violations_by_rule: Default::default(),
            },
            gate: GateVerdict { verdict: "pass", failures: Vec::new() },
            violations: vec![violation],
            god_objects: Vec::new(),
            duplication_clusters: Vec::new(),
        }
    }

    #[test]
    fn emits_one_result_per_violation_with_mapped_severity() {
        let sarif = generate_sarif(&sample_report());
        assert_eq!(sarif.version, "2.1.0");
        let run = &sarif.runs[0];
        assert_eq!(run.results.len(), 1);
        assert_eq!(run.results[0].rule_id, "CoN");
        assert_eq!(run.results[0].level, "error");
        assert_eq!(run.results[0].locations[0].physical_location.artifact_location.uri, "a.py");
    }

    #[test]
    fn rule_table_has_one_entry_per_distinct_rule() {
        let sarif = generate_sarif(&sample_report());
        assert_eq!(sarif.runs[0].tool.driver.rules.len(), 1);
        assert_eq!(sarif.runs[0].tool.driver.rules[0].id, "CoN");
    }

    #[test]
    fn empty_violations_still_produce_a_valid_empty_run() {
        let mut report = sample_report();
        report.violations.clear();
        let sarif = generate_sarif(&report);
        assert!(sarif.runs[0].results.is_empty());
        assert!(sarif.runs[0].tool.driver.rules.is_empty());
    }
}
