// Copyright 2025 Cornell University
// released under MIT License

use crate::automaton_parser::parse_automaton;
use crate::diagnostic::{DiagnosticHandler, Level};
use crate::emit::emit_to_string;
use crate::errors::Result;
use crate::rules_parser::parse_rules;
use crate::uppaal::serialize_to_string;

/// Stage 1: declarative rules to an imperative script
pub fn translate(filename: &str, input: &str, handler: &mut DiagnosticHandler) -> Result<String> {
    let graph = parse_rules(filename, input, handler)?;
    if graph.num_edges() == 0 {
        let msg = format!("{}: no edges to translate", filename);
        handler.emit_general_message(&msg, Level::Warning);
    }
    Ok(emit_to_string(&graph))
}

/// Stage 2: imperative script to a flat system document
pub fn compile(filename: &str, input: &str, handler: &mut DiagnosticHandler) -> Result<String> {
    let automaton = parse_automaton(filename, input, handler)?;
    if automaton.transitions.is_empty() {
        let msg = format!("{}: no transitions to compile", filename);
        handler.emit_general_message(&msg, Level::Warning);
    }
    serialize_to_string(&automaton)
}

/// Both stages. Returns the intermediate script along with the document.
pub fn build(
    filename: &str,
    input: &str,
    handler: &mut DiagnosticHandler,
) -> Result<(String, String)> {
    let script = translate(filename, input, handler)?;
    let document = compile(&format!("{}.ta", filename), &script, handler)?;
    Ok((script, document))
}
