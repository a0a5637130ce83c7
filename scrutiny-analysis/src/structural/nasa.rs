//! NASA POT10 Rule Engine (C6, spec §4.6). Encodes rules R1, R2, R4, R5, R6,
//! R7 as predicates evaluated over the unified visitor's event sequence,
//! one state machine per function body, rather than a second AST walk.
//! Ground: the predicate-over-events style of
//! `drift_analysis::detectors::security::SecurityDetector`.

use scrutiny_core::config::AnalysisConfig;
use scrutiny_core::types::collections::{FxHashMap, FxHashSet};
use scrutiny_core::types::severity::Severity;
use scrutiny_core::types::span::Span;

use crate::engine::DetectionContext;
use crate::types::{CallSite, FunctionInfo, Violation, ViolationKind, VisitorEvent};

const ASSERTION_CALLEES: &[&str] = &[
    "assert", "assert_eq", "assert_ne", "assertTrue", "assertEqual", "assertIsNotNone", "static_assert",
];
const GUARD_CALLEES: &[&str] = &["isinstance", "assert", "type", "hasattr"];

#[derive(Default)]
struct FunctionScratch {
    info: FunctionInfo,
    assertion_count: usize,
    statement_count: usize,
    first_control_flow_line: Option<u32>,
    assignment_lines: FxHashMap<String, Vec<u32>>,
    guarded_params: FxHashSet<String>,
    referenced_params: FxHashSet<String>,
    calls_self: bool,
}

impl FunctionScratch {
    fn new(info: FunctionInfo) -> Self {
        Self { info, ..Default::default() }
    }
}

pub struct NasaRuleEngine {
    function_line_budget: usize,
    min_assertion_density: f64,
    weights: FxHashMap<&'static str, f64>,
    evaluable_sites: usize,
    weighted_violations: f64,
    current: Option<FunctionScratch>,
    found: Vec<Violation>,
}

impl Default for NasaRuleEngine {
    fn default() -> Self {
        let mut weights = FxHashMap::default();
        for rule in ["R1", "R2", "R4", "R5", "R6", "R7"] {
            weights.insert(rule, 1.0);
        }
        Self {
            function_line_budget: scrutiny_core::constants::NASA_FUNCTION_LINE_BUDGET,
            min_assertion_density: scrutiny_core::constants::NASA_MIN_ASSERTION_DENSITY,
            weights,
            evaluable_sites: 0,
            weighted_violations: 0.0,
            current: None,
            found: Vec::new(),
        }
    }
}

impl NasaRuleEngine {
    pub fn configure(&mut self, config: &AnalysisConfig) {
        self.function_line_budget = config.detectors.threshold_usize_or("NASA", "function_line_budget", scrutiny_core::constants::NASA_FUNCTION_LINE_BUDGET);
        self.min_assertion_density = config.detectors.threshold_or("NASA", "min_assertion_density", scrutiny_core::constants::NASA_MIN_ASSERTION_DENSITY);
    }

    /// Cumulative across every file this engine has seen; feeds the
    /// repo-wide `nasa_compliance = 1 - weighted_violations / evaluable_sites`.
    pub fn evaluable_sites(&self) -> usize {
        self.evaluable_sites
    }

    pub fn weighted_violations(&self) -> f64 {
        self.weighted_violations
    }

    fn flag(&mut self, ctx: &DetectionContext, rule: &'static str, line: u32, message: String, evidence: serde_json::Value) {
        let weight = *self.weights.get(rule).unwrap_or(&1.0);
        self.weighted_violations += weight;
        let mut merged = evidence;
        if let serde_json::Value::Object(map) = &mut merged {
            map.insert("rule".into(), serde_json::json!(rule));
            map.insert("weight".into(), serde_json::json!(weight));
        }
        self.found.push(Violation::new(ViolationKind::NasaRuleViolation, Severity::High, Span::point(ctx.file, line, 0), message, merged));
    }

    pub fn consume(&mut self, ctx: &DetectionContext, event: &VisitorEvent) {
        match event {
            VisitorEvent::FunctionDef { info } => {
                self.flush_current(ctx);
                self.current = Some(FunctionScratch::new(info.clone()));
                self.evaluable_sites += 1;
            }
            VisitorEvent::FunctionEnd { .. } => self.flush_current(ctx),
            VisitorEvent::Call { call } => self.on_call(ctx, call),
            VisitorEvent::ControlFlow { line, .. } => {
                if let Some(state) = &mut self.current {
                    state.first_control_flow_line.get_or_insert(*line);
                    state.statement_count += 1;
                }
            }
            VisitorEvent::Assignment { target, line, .. } => {
                if let Some(state) = &mut self.current {
                    state.assignment_lines.entry(target.clone()).or_default().push(*line);
                    state.statement_count += 1;
                    if state.info.params.iter().any(|p| &p.name == target) {
                        state.referenced_params.insert(target.clone());
                    }
                }
            }
            VisitorEvent::Return { .. } => {
                if let Some(state) = &mut self.current {
                    state.statement_count += 1;
                }
            }
            VisitorEvent::IdentityComparison { comparison } => {
                if let Some(state) = &mut self.current {
                    for param in state.info.params.iter().map(|p| p.name.clone()).collect::<Vec<_>>() {
                        if comparison.lhs == param || comparison.rhs == param {
                            state.referenced_params.insert(param.clone());
                            state.guarded_params.insert(param);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn on_call(&mut self, ctx: &DetectionContext, call: &CallSite) {
        let Some(state) = &mut self.current else { return };
        state.statement_count += 1;
        if ASSERTION_CALLEES.contains(&call.callee_name.as_str()) {
            state.assertion_count += 1;
        }
        if GUARD_CALLEES.contains(&call.callee_name.as_str()) {
            if let Some(receiver) = &call.receiver {
                if state.info.params.iter().any(|p| &p.name == receiver) {
                    state.guarded_params.insert(receiver.clone());
                    state.referenced_params.insert(receiver.clone());
                }
            }
        }
        if call.enclosing_function.as_deref() == Some(state.info.name.as_str()) && call.callee_name == state.info.name {
            state.calls_self = true;
        }
        if !call.result_used && ctx.unit.file.language.strategy().is_must_check_call(call) {
            self.evaluable_sites += 1;
            self.flag(
                ctx,
                "R7",
                call.line,
                format!("return value of `{}` is discarded without being checked", call.callee_name),
                serde_json::json!({ "callee": call.callee_name }),
            );
        }
    }

    fn flush_current(&mut self, ctx: &DetectionContext) {
        let Some(state) = self.current.take() else { return };
        let info = &state.info;

        if state.calls_self {
            self.evaluable_sites += 1;
            self.flag(
                ctx,
                "R1",
                info.span.line,
                format!("function `{}` recurses; POT10 bars unbounded recursion", info.name),
                serde_json::json!({ "function": info.name }),
            );
        }

        let lines = info.body_lines() as usize;
        self.evaluable_sites += 1;
        if lines > self.function_line_budget {
            self.flag(
                ctx,
                "R2",
                info.span.line,
                format!("function `{}` is {lines} lines, over the {}-line budget", info.name, self.function_line_budget),
                serde_json::json!({ "function": info.name, "lines": lines }),
            );
        }

        self.evaluable_sites += 1;
        let density = state.assertion_count as f64 / (state.statement_count.max(1) as f64);
        if density < self.min_assertion_density {
            self.flag(
                ctx,
                "R4",
                info.span.line,
                format!("function `{}` has assertion density {density:.4}, below the {:.2} minimum", info.name, self.min_assertion_density),
                serde_json::json!({ "function": info.name, "density": density }),
            );
        }

        for param in &info.params {
            self.evaluable_sites += 1;
            if !state.guarded_params.contains(&param.name) {
                self.flag(
                    ctx,
                    "R5",
                    info.span.line,
                    format!("parameter `{}` of `{}` is never validated before use", param.name, info.name),
                    serde_json::json!({ "function": info.name, "parameter": param.name }),
                );
            }
        }

        if let Some(first_block_line) = state.first_control_flow_line {
            for (name, lines) in &state.assignment_lines {
                if info.params.iter().any(|p| &p.name == name) {
                    continue;
                }
                let first = lines.first().copied().unwrap_or(0);
                let last = lines.last().copied().unwrap_or(0);
                self.evaluable_sites += 1;
                if first < first_block_line && last > first_block_line {
                    self.flag(
                        ctx,
                        "R6",
                        first,
                        format!("variable `{name}` in `{}` is declared at function scope but only used inside a nested block", info.name),
                        serde_json::json!({ "function": info.name, "variable": name }),
                    );
                }
            }
        }
    }

    pub fn finalize(&mut self, ctx: &DetectionContext) -> Vec<Violation> {
        self.flush_current(ctx);
        std::mem::take(&mut self.found)
    }
}
