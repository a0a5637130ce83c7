//! Ground: `drift_analysis::parsers::manager::ParserManager`. Owns one
//! `tree_sitter::Parser` per language (parsers are not `Send`-shared, so
//! each worker thread gets its own `ParserManager` rather than a pooled
//! singleton — see `pool` module for the detector-side equivalent).

use std::sync::Arc;

use scrutiny_core::errors::ParseError;
use scrutiny_core::types::identifiers::FileId;

use crate::engine::visitor::build_events;
use crate::language::Language;
use crate::types::{ParsedUnit, SourceFile};

pub struct ParserManager {
    python: tree_sitter::Parser,
    javascript: tree_sitter::Parser,
    typescript: tree_sitter::Parser,
    c: tree_sitter::Parser,
    cpp: tree_sitter::Parser,
}

impl ParserManager {
    pub fn new() -> Self {
        let make = |lang: Language| {
            let mut parser = tree_sitter::Parser::new();
            if let Some(ts_lang) = lang.ts_language() {
                let _ = parser.set_language(&ts_lang);
            }
            parser
        };
        Self {
            python: make(Language::Python),
            javascript: make(Language::JavaScript),
            typescript: make(Language::TypeScript),
            c: make(Language::C),
            cpp: make(Language::Cpp),
        }
    }

    fn parser_for(&mut self, language: Language) -> Option<&mut tree_sitter::Parser> {
        match language {
            Language::Python => Some(&mut self.python),
            Language::JavaScript => Some(&mut self.javascript),
            Language::TypeScript => Some(&mut self.typescript),
            Language::C => Some(&mut self.c),
            Language::Cpp => Some(&mut self.cpp),
            Language::Other => None,
        }
    }

    /// Parses `content` and runs the unified visitor once, producing a
    /// fully populated `ParsedUnit`. A tree-sitter failure degrades to the
    /// language strategy's regex extraction rather than returning `Err` —
    /// per spec §4.1 the `Generic`/degraded path must never raise, it only
    /// ever yields a `PARSE_DEGRADED` info violation upstream.
    pub fn parse(&mut self, id: FileId, path: String, content: &[u8], mtime: u64) -> Result<ParsedUnit, ParseError> {
        let language = Language::from_extension(path.rsplit('.').next().unwrap_or(""));
        let source = String::from_utf8(content.to_vec()).map_err(|_| ParseError::Encoding { file: path.clone() })?;

        let strategy = language.strategy();
        let stripped_source = strategy.strip_comments(&source);
        let file = SourceFile::new(id, path.clone(), language, content, mtime);

        let tree = self.parser_for(language).and_then(|p| p.parse(&source, None));
        let result = build_events(tree.as_ref(), &source, &path, strategy);

        Ok(ParsedUnit {
            file,
            source,
            stripped_source,
            tree,
            events: Arc::new(result.events),
            functions: result.functions,
            classes: result.classes,
            calls: result.calls,
            imports: result.imports,
            string_literals: result.string_literals,
            numeric_literals: result.numeric_literals,
            attribute_accesses: result.attribute_accesses,
            identity_comparisons: result.identity_comparisons,
        })
    }
}

impl Default for ParserManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_python_and_populates_functions() {
        let mut manager = ParserManager::new();
        let unit = manager
            .parse(FileId::new(1), "a.py".to_string(), b"def f(a, b):\n    return a + b\n", 0)
            .unwrap();
        assert!(unit.parsed_ok());
        assert_eq!(unit.functions.len(), 1);
    }

    #[test]
    fn non_utf8_content_is_an_encoding_error() {
        let mut manager = ParserManager::new();
        let err = manager.parse(FileId::new(1), "a.py".to_string(), &[0xff, 0xfe, 0x00], 0).unwrap_err();
        assert!(matches!(err, ParseError::Encoding { .. }));
    }

    #[test]
    fn unrecognized_extension_falls_back_to_generic_without_panicking() {
        let mut manager = ParserManager::new();
        let unit = manager.parse(FileId::new(1), "a.xyz".to_string(), b"not really code {{{", 0).unwrap();
        assert!(!unit.parsed_ok());
    }
}
