//! Unified AST Visitor (spec §4.2, C2). One traversal per `ParsedUnit`;
//! the result is materialized as a finite `Vec<VisitorEvent>` (spec §9)
//! so every detector, the NASA rule engine, and the MECE chunker can all
//! scan it independently without re-walking the tree-sitter tree.

pub mod context;
pub mod visitor;

pub use context::DetectionContext;
pub use visitor::build_events;
