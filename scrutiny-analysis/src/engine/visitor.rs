//! The unified traversal (spec §4.2). Walks a tree-sitter tree exactly once
//! per `ParsedUnit`, emitting the depth-first pre-order `VisitorEvent`
//! sequence plus the flat fact tables (`functions`, `classes`, `calls`, …)
//! that detectors read directly (ground: teacher's
//! `SecurityDetector::detect` reading `ctx.call_sites` /
//! `ctx.parse_result.string_literals` rather than re-deriving them).
//!
//! Ground: `drift_analysis::engine::visitor::{DetectionEngine,
//! VisitorRegistry}` for the single-pass-amortizes-cost shape; the node-kind
//! lookup table here (`language::NodeKinds`) plays the role the teacher's
//! `FxHashMap<String, Vec<usize>>` dispatch table plays, keyed by node type
//! name instead of by handler index.

use tree_sitter::{Node, Tree};

use scrutiny_core::types::span::Span;

use crate::language::{self, LanguageStrategy};
use crate::types::{
    AttributeAccess, CallSite, ClassInfo, FunctionInfo, IdentityComparison, ImportInfo, LiteralInfo, LiteralKind,
    Parameter, VisitorEvent,
};

pub struct VisitResult {
    pub events: Vec<VisitorEvent>,
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    pub calls: Vec<CallSite>,
    pub imports: Vec<ImportInfo>,
    pub string_literals: Vec<LiteralInfo>,
    pub numeric_literals: Vec<LiteralInfo>,
    pub attribute_accesses: Vec<AttributeAccess>,
    pub identity_comparisons: Vec<IdentityComparison>,
}

struct Walker<'a> {
    source: &'a [u8],
    path: &'a str,
    kinds: &'a language::NodeKinds,
    strategy: &'a dyn LanguageStrategy,
    function_stack: Vec<String>,
    class_stack: Vec<String>,
    predicate_depth: u32,
    result: VisitResult,
}

/// Builds the event sequence and fact tables for a parsed file. When `tree`
/// is `None` (parse failure, or the `Generic` strategy never had one) falls
/// back to the strategy's regex-based function extraction so the pipeline
/// still produces partial results (spec §4.1).
pub fn build_events(
    tree: Option<&Tree>,
    source: &str,
    path: &str,
    strategy: &dyn LanguageStrategy,
) -> VisitResult {
    let kinds = strategy.node_kinds();
    match tree {
        Some(tree) => {
            let mut walker = Walker {
                source: source.as_bytes(),
                path,
                kinds,
                strategy,
                function_stack: Vec::new(),
                class_stack: Vec::new(),
                predicate_depth: 0,
                result: VisitResult {
                    events: vec![VisitorEvent::ModuleStart { file: path.to_string() }],
                    functions: Vec::new(),
                    classes: Vec::new(),
                    calls: Vec::new(),
                    imports: Vec::new(),
                    string_literals: Vec::new(),
                    numeric_literals: Vec::new(),
                    attribute_accesses: Vec::new(),
                    identity_comparisons: Vec::new(),
                },
            };
            walker.walk(tree.root_node());
            walker.result.events.push(VisitorEvent::ModuleEnd { file: path.to_string() });
            walker.result
        }
        None => {
            let functions = strategy.extract_functions_regex(source);
            let mut events = vec![VisitorEvent::ModuleStart { file: path.to_string() }];
            for f in &functions {
                events.push(VisitorEvent::FunctionDef { info: f.clone() });
                events.push(VisitorEvent::FunctionEnd { name: f.name.clone() });
            }
            events.push(VisitorEvent::ModuleEnd { file: path.to_string() });
            VisitResult {
                events,
                functions,
                classes: Vec::new(),
                calls: Vec::new(),
                imports: Vec::new(),
                string_literals: Vec::new(),
                numeric_literals: Vec::new(),
                attribute_accesses: Vec::new(),
                identity_comparisons: Vec::new(),
            }
        }
    }
}

impl<'a> Walker<'a> {
    fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source).unwrap_or("")
    }

    fn span_of(&self, node: Node) -> Span {
        let start = node.start_position();
        let end = node.end_position();
        Span::range(self.path, start.row as u32 + 1, end.row as u32 + 1, start.column as u32, end.column as u32)
    }

    fn current_function(&self) -> Option<String> {
        self.function_stack.last().cloned()
    }

    fn walk(&mut self, node: Node<'a>) {
        let kind = node.kind();

        if self.kinds.function_def.contains(&kind) {
            self.enter_function(node);
            self.walk_children(node);
            self.exit_function();
            return;
        }
        if self.kinds.class_def.contains(&kind) {
            self.enter_class(node);
            self.walk_children(node);
            self.exit_class();
            return;
        }
        if self.kinds.call.contains(&kind) {
            self.on_call(node);
        } else if self.kinds.string_literal.contains(&kind) {
            self.on_literal(node, LiteralKind::String);
        } else if self.kinds.numeric_literal.contains(&kind) {
            self.on_literal(node, LiteralKind::Numeric);
        } else if self.kinds.assignment.contains(&kind) {
            self.on_assignment(node);
        } else if self.kinds.return_stmt.contains(&kind) {
            self.result.events.push(VisitorEvent::Return {
                line: node.start_position().row as u32 + 1,
                enclosing_function: self.current_function(),
            });
        } else if self.kinds.import.contains(&kind) {
            self.on_import(node);
        } else if self.kinds.attribute.contains(&kind) {
            self.on_attribute(node);
        } else if self.kinds.identity_comparison.contains(&kind) {
            self.on_comparison(node);
        }

        let is_predicate_holder = self.kinds.control_flow.contains(&kind);
        if is_predicate_holder {
            self.result.events.push(VisitorEvent::ControlFlow {
                kind: kind.to_string(),
                line: node.start_position().row as u32 + 1,
                enclosing_function: self.current_function(),
            });
            if let Some(condition) = node.child_by_field_name("condition") {
                self.predicate_depth += 1;
                self.walk(condition);
                self.predicate_depth -= 1;
                self.walk_children_except(node, condition.id());
                return;
            }
        }

        self.walk_children(node);
    }

    fn walk_children(&mut self, node: Node<'a>) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(child);
        }
    }

    fn walk_children_except(&mut self, node: Node<'a>, skip_id: usize) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.id() != skip_id {
                self.walk(child);
            }
        }
    }

    fn enter_function(&mut self, node: Node<'a>) {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_else(|| "<anonymous>".to_string());
        let params = node
            .child_by_field_name("parameters")
            .map(|p| self.collect_params(p))
            .unwrap_or_default();
        let body_span = node
            .child_by_field_name("body")
            .map(|b| self.span_of(b))
            .unwrap_or_else(|| self.span_of(node));
        let info = FunctionInfo {
            name: name.clone(),
            span: self.span_of(node),
            body_span,
            params: params.clone(),
            enclosing_class: self.class_stack.last().cloned(),
            is_method: !self.class_stack.is_empty(),
        };
        self.result.events.push(VisitorEvent::FunctionDef { info: info.clone() });
        for param in &params {
            self.result.events.push(VisitorEvent::Parameter { function: name.clone(), param: param.clone() });
        }
        self.result.functions.push(info);
        self.function_stack.push(name);
    }

    fn exit_function(&mut self) {
        if let Some(name) = self.function_stack.pop() {
            self.result.events.push(VisitorEvent::FunctionEnd { name });
        }
    }

    fn collect_params(&self, params_node: Node<'a>) -> Vec<Parameter> {
        let mut out = Vec::new();
        let mut cursor = params_node.walk();
        for (position, child) in params_node.children(&mut cursor).enumerate() {
            if matches!(child.kind(), "(" | ")" | ",") {
                continue;
            }
            let name = child
                .child_by_field_name("name")
                .or_else(|| if child.kind() == "identifier" { Some(child) } else { None })
                .map(|n| self.text(n).to_string())
                .unwrap_or_else(|| self.text(child).to_string());
            let has_default = child.kind().contains("default") || self.text(child).contains('=');
            out.push(Parameter { name, has_default, position: out.len().max(position.saturating_sub(0)) });
        }
        for (i, p) in out.iter_mut().enumerate() {
            p.position = i;
        }
        out
    }

    fn enter_class(&mut self, node: Node<'a>) {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_else(|| "<anonymous>".to_string());
        let info = ClassInfo {
            name: name.clone(),
            span: self.span_of(node),
            methods: Vec::new(),
            public_fields: Vec::new(),
        };
        self.result.events.push(VisitorEvent::ClassDef { info: info.clone() });
        self.result.classes.push(info);
        self.class_stack.push(name);
    }

    fn exit_class(&mut self) {
        if let Some(name) = self.class_stack.pop() {
            self.result.events.push(VisitorEvent::ClassEnd { name });
        }
    }

    fn on_call(&mut self, node: Node<'a>) {
        let callee = node.child_by_field_name("function").unwrap_or(node);
        let (callee_name, receiver) = self.split_callee(callee);
        let arg_count = node
            .child_by_field_name("arguments")
            .map(|a| a.named_child_count())
            .unwrap_or(0);
        let result_used = node
            .parent()
            .map(|p| p.kind() != "expression_statement")
            .unwrap_or(true);
        let start = node.start_position();
        let call = CallSite {
            callee_name,
            receiver,
            arg_count,
            line: start.row as u32 + 1,
            column: start.column as u32,
            enclosing_function: self.current_function(),
            result_used,
        };
        self.result.events.push(VisitorEvent::Call { call: call.clone() });
        self.result.calls.push(call);
    }

    fn split_callee(&self, callee: Node<'a>) -> (String, Option<String>) {
        if self.kinds.attribute.contains(&callee.kind()) {
            let object = callee.child_by_field_name("object").or_else(|| callee.child(0));
            let attr = callee
                .child_by_field_name("attribute")
                .or_else(|| callee.child_by_field_name("field"))
                .or_else(|| callee.child(callee.child_count().saturating_sub(1)));
            let receiver = object.map(|o| self.text(o).to_string());
            let name = attr.map(|a| self.text(a).to_string()).unwrap_or_else(|| self.text(callee).to_string());
            (name, receiver)
        } else {
            (self.text(callee).to_string(), None)
        }
    }

    fn on_literal(&mut self, node: Node<'a>, kind: LiteralKind) {
        let raw = self.text(node).to_string();
        let (classified_kind, canonical) = self.strategy.classify_literal(&raw);
        let kind = if classified_kind == LiteralKind::Other { kind } else { classified_kind };
        let start = node.start_position();
        let in_declaration = node
            .parent()
            .and_then(|p| p.child_by_field_name("left").or_else(|| p.child_by_field_name("name")))
            .map(|n| {
                let text = self.text(n);
                text.chars().all(|c| c.is_uppercase() || c == '_' || c.is_numeric())
            })
            .unwrap_or(false);
        let literal = LiteralInfo {
            kind,
            raw,
            canonical_value: canonical,
            line: start.row as u32 + 1,
            column: start.column as u32,
            in_predicate: self.predicate_depth > 0,
            in_declaration,
            enclosing_function: self.current_function(),
        };
        match kind {
            LiteralKind::String => {
                self.result.events.push(VisitorEvent::LiteralString { literal: literal.clone() });
                self.result.string_literals.push(literal);
            }
            _ => {
                self.result.events.push(VisitorEvent::LiteralNumber { literal: literal.clone() });
                self.result.numeric_literals.push(literal);
            }
        }
    }

    fn on_assignment(&mut self, node: Node<'a>) {
        let target = node
            .child_by_field_name("left")
            .or_else(|| node.child_by_field_name("name"))
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        self.result.events.push(VisitorEvent::Assignment {
            target,
            line: node.start_position().row as u32 + 1,
            enclosing_function: self.current_function(),
        });
    }

    fn on_import(&mut self, node: Node<'a>) {
        let info = ImportInfo {
            imported_name: self.text(node).to_string(),
            source_module: self.text(node).to_string(),
            line: node.start_position().row as u32 + 1,
        };
        self.result.events.push(VisitorEvent::Import { info: info.clone() });
        self.result.imports.push(info);
    }

    fn on_attribute(&mut self, node: Node<'a>) {
        let object = node.child_by_field_name("object").or_else(|| node.child(0));
        let attr = node
            .child_by_field_name("attribute")
            .or_else(|| node.child_by_field_name("field"));
        if let (Some(object), Some(attr)) = (object, attr) {
            let start = node.start_position();
            let access = AttributeAccess {
                object: self.text(object).to_string(),
                attribute: self.text(attr).to_string(),
                line: start.row as u32 + 1,
                column: start.column as u32,
            };
            self.result.events.push(VisitorEvent::AttributeAccess { access: access.clone() });
            self.result.attribute_accesses.push(access);
        }
    }

    fn on_comparison(&mut self, node: Node<'a>) {
        let operator = node.child_by_field_name("operator").map(|n| self.text(n).to_string()).unwrap_or_default();
        if operator == "is" || operator == "==" {
            let lhs = node.child_by_field_name("left").map(|n| self.text(n).to_string()).unwrap_or_default();
            let rhs = node.child_by_field_name("right").map(|n| self.text(n).to_string()).unwrap_or_default();
            let comparison = IdentityComparison { lhs, rhs, line: node.start_position().row as u32 + 1 };
            self.result.events.push(VisitorEvent::IdentityComparison { comparison: comparison.clone() });
            self.result.identity_comparisons.push(comparison);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use tree_sitter::Parser;

    fn parse(source: &str) -> Tree {
        let mut parser = Parser::new();
        parser.set_language(&Language::Python.ts_language().unwrap()).unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn module_start_and_end_bracket_the_sequence() {
        let source = "x = 1\n";
        let tree = parse(source);
        let result = build_events(Some(&tree), source, "a.py", Language::Python.strategy());
        assert!(matches!(result.events.first(), Some(VisitorEvent::ModuleStart { .. })));
        assert!(matches!(result.events.last(), Some(VisitorEvent::ModuleEnd { .. })));
    }

    #[test]
    fn function_def_precedes_its_body_events() {
        let source = "def f(a, b):\n    return a + b\n";
        let tree = parse(source);
        let result = build_events(Some(&tree), source, "a.py", Language::Python.strategy());
        assert_eq!(result.functions.len(), 1);
        assert_eq!(result.functions[0].name, "f");
        assert_eq!(result.functions[0].params.len(), 2);
        let def_idx = result.events.iter().position(|e| matches!(e, VisitorEvent::FunctionDef { .. })).unwrap();
        let ret_idx = result.events.iter().position(|e| matches!(e, VisitorEvent::Return { .. })).unwrap();
        assert!(def_idx < ret_idx);
    }

    #[test]
    fn falls_back_to_regex_functions_with_no_tree() {
        let result = build_events(None, "def f(a):\n    pass\n", "a.py", Language::Python.strategy());
        assert_eq!(result.functions.len(), 1);
        assert!(result.classes.is_empty());
    }
}
