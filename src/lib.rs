extern crate wasm_bindgen;

use std::fmt::Display;

use serde_json::json;
use wasm_bindgen::prelude::*;

pub mod codegen;
pub mod example_grammars;
pub mod grammar;

pub use codegen::Backend;
pub use grammar::{
    derivation::{Derivation, DerivationTree, ParseStep},
    error::{GenerateError, GrammarError, ParseError, ValidationError},
    ll1_parsing_table::LL1Table,
    Analysis, Grammar,
};

/// Validates grammar text and builds its model. Every problem found is
/// reported at once.
pub fn validate_and_model(text: &str) -> Result<Grammar, ValidationError> {
    Grammar::parse(text)
}

/// Nullable, FIRST and FOLLOW sets, the LL(1) table and its conflicts.
/// Conflicts never abort the analysis.
pub fn analyze(g: &Grammar) -> Analysis {
    Analysis::new(g)
}

pub fn generate_parser(
    table: &LL1Table,
    g: &Grammar,
    backend: Backend,
) -> Result<String, GenerateError> {
    codegen::generate_parser(table, g, backend)
}

/// The derivation tree of `sentence` and the predictive parser's steps.
pub fn parse_sentence(
    table: &LL1Table,
    g: &Grammar,
    sentence: &str,
) -> Result<Derivation, ParseError> {
    g.parse_sentence(table, sentence)
}

fn error_json(message: impl Display) -> String {
    json!({ "error": message.to_string() }).to_string()
}

#[wasm_bindgen]
pub fn analyze_to_json(grammar: &str) -> String {
    match validate_and_model(grammar) {
        Ok(g) => {
            let analysis = analyze(&g);
            serde_json::to_string(&g.to_analysis_report(&analysis)).unwrap_or_else(error_json)
        }
        Err(e) => e.to_json().to_string(),
    }
}

#[wasm_bindgen]
pub fn generate_parser_to_json(grammar: &str, backend: &str) -> String {
    let backend: Backend = match backend.parse() {
        Ok(backend) => backend,
        Err(e) => return error_json(e),
    };
    let g = match validate_and_model(grammar) {
        Ok(g) => g,
        Err(e) => return e.to_json().to_string(),
    };
    let analysis = analyze(&g);
    match generate_parser(&analysis.table, &g, backend) {
        Ok(code) => json!({ "backend": backend.name(), "code": code }).to_string(),
        Err(e) => {
            let conflicts: Vec<_> = analysis
                .conflicts
                .iter()
                .map(|c| g.to_conflict_output(c))
                .collect();
            json!({ "error": e.to_string(), "conflicts": conflicts }).to_string()
        }
    }
}

#[wasm_bindgen]
pub fn parse_to_json(grammar: &str, sentence: &str) -> String {
    let g = match validate_and_model(grammar) {
        Ok(g) => g,
        Err(e) => return e.to_json().to_string(),
    };
    let analysis = analyze(&g);
    let (steps, result) = g.trace_sentence(&analysis.table, sentence);
    match result {
        Ok(tree) => serde_json::to_string(&Derivation { tree, steps }).unwrap_or_else(error_json),
        Err(e) => json!({ "error": e.to_string(), "steps": steps }).to_string(),
    }
}

#[wasm_bindgen]
pub fn example_grammars_to_json() -> String {
    serde_json::to_string(&example_grammars::ExampleGrammars::default())
        .unwrap_or_else(error_json)
}
