//! Structural analyzers that look across an entire unit or an entire repo
//! rather than at individual events: god-object scoring (C4), MECE
//! duplication clustering (C5), and the NASA POT10 rule engine (C6).

pub mod god_object;
pub mod mece;
pub mod nasa;

pub use god_object::detect_god_objects;
pub use mece::MeceAnalyzer;
pub use nasa::NasaRuleEngine;
