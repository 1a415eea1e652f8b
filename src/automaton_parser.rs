// Copyright 2025 Cornell University
// released under MIT License

use log::{debug, info};
use pest::error::InputLocation;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::diagnostic::{DiagnosticHandler, Level};
use crate::errors::{Error, Result};
use crate::ir::{Automaton, Declaration, Transition};

#[derive(Parser)]
#[grammar = "automaton.pest"]
struct AutomatonParser;

/// Reads the imperative script stored at `filepath`.
pub fn parse_automaton_file(
    filepath: impl AsRef<std::path::Path>,
    handler: &mut DiagnosticHandler,
) -> Result<Automaton> {
    let filename = filepath.as_ref().to_string_lossy().to_string();
    let input = std::fs::read_to_string(filepath)?;
    parse_automaton(&filename, &input, handler)
}

/// Parses an imperative script into declarations, the initial state and
/// transitions. Declarations are only recognized before the `init` line.
/// Anything unrecognized is reported as a warning and skipped.
pub fn parse_automaton(
    filename: &str,
    input: &str,
    handler: &mut DiagnosticHandler,
) -> Result<Automaton> {
    let fileid = handler.add_file(filename.to_string(), input.to_string());

    let file = match AutomatonParser::parse(Rule::file, input) {
        Ok(mut pairs) => pairs.next().expect("`file` always produces one pair"),
        Err(err) => {
            let (start, end) = match err.location {
                InputLocation::Pos(start) => (start, start),
                InputLocation::Span(span) => span,
            };
            let msg = format!("Lexing failed: {}", err.variant.message());
            handler.emit_diagnostic_lexing(&msg, fileid, start, end, Level::Error);
            return Err(Error::Lexing { message: msg });
        }
    };

    let mut automaton = Automaton::default();
    for pair in file.into_inner() {
        match pair.as_rule() {
            Rule::decl => automaton
                .declarations
                .push(parse_decl(pair, fileid, handler)),
            Rule::init => {
                automaton.init = pair
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::ident)
                    .map(|p| p.as_str().to_string());
            }
            Rule::transition => automaton.transitions.push(parse_transition(pair)),
            Rule::skipped => {
                debug!("skipping `{}`", pair.as_str());
                handler.emit_diagnostic_parsing(
                    "Unrecognized declaration or transition, skipping this line",
                    fileid,
                    &pair,
                    Level::Warning,
                );
            }
            _ => {}
        }
    }

    if automaton.init.is_none() {
        debug!("{}: no initial state", filename);
    }
    info!(
        "{}: {} declarations, {} transitions",
        filename,
        automaton.declarations.len(),
        automaton.transitions.len()
    );
    Ok(automaton)
}

/// Literals outside the `i64` range saturate, with a warning.
fn parse_decl(pair: Pair<'_, Rule>, fileid: usize, handler: &mut DiagnosticHandler) -> Declaration {
    let mut name = "";
    let mut value = 0;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = inner.as_str(),
            // the grammar only admits digits here, so parsing fails on overflow only
            Rule::integer => match inner.as_str().parse::<i64>() {
                Ok(parsed) => value = parsed,
                Err(_) => {
                    value = if inner.as_str().starts_with('-') {
                        i64::MIN
                    } else {
                        i64::MAX
                    };
                    let msg = format!("Integer literal is out of range, using {}", value);
                    handler.emit_diagnostic_parsing(&msg, fileid, &inner, Level::Warning);
                }
            },
            _ => {}
        }
    }
    Declaration {
        name: name.to_string(),
        value,
    }
}

fn parse_transition(pair: Pair<'_, Rule>) -> Transition {
    let mut transition = Transition::default();
    let mut endpoints = 0;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident if endpoints == 0 => {
                transition.source = inner.as_str().to_string();
                endpoints += 1;
            }
            Rule::ident => transition.target = inner.as_str().to_string(),
            Rule::event => transition.event = inner.as_str().trim().to_string(),
            Rule::guard => transition.guard = inner.as_str().trim().to_string(),
            Rule::update => {
                transition.update = inner
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::body)
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default();
            }
            _ => {}
        }
    }
    transition
}

/// A primed assignment `name' := expr` found in one line of an update body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimedAssignment<'a> {
    /// text on the line before the assignment
    pub prefix: &'a str,
    pub name: &'a str,
    pub rhs: &'a str,
}

/// Finds the first primed assignment in `line`. Everything after `:=` up to
/// the end of the line is taken as the expression.
pub fn parse_primed_assignment(line: &str) -> Option<PrimedAssignment<'_>> {
    let pair = AutomatonParser::parse(Rule::update_line, line).ok()?.next()?;
    let mut inner = pair.into_inner();
    let prefix = inner.next()?.as_str();
    let mut assign = inner.next()?.into_inner();
    let name = assign.next()?.as_str();
    let rhs = assign.next()?.as_str();
    Some(PrimedAssignment { prefix, name, rhs })
}
