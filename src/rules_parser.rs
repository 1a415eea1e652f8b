// Copyright 2025 Cornell University
// released under MIT License

use log::{debug, info};
use pest::error::InputLocation;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::diagnostic::{DiagnosticHandler, Level};
use crate::errors::{Error, Result};
use crate::ir::{self, Edge, RuleGraph, RuleKind};

#[derive(Parser)]
#[grammar = "rules.pest"]
struct RulesParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    /// `-->`
    Edge,
    /// `->>`
    Enable,
    /// `--!`
    Disable,
}

/// `source op target[: name] [disabled]`
#[derive(Debug, Clone)]
struct Arrow<'a> {
    source: &'a str,
    op: Op,
    target: &'a str,
    name: Option<&'a str>,
    disabled: bool,
    span: (usize, usize),
    /// span of ignored text after a named rule
    trailing: Option<(usize, usize)>,
}

impl<'a> Arrow<'a> {
    /// The actor this line declares. The shorthand form is named after its target.
    fn actor(&self) -> &'a str {
        self.name.unwrap_or(self.target)
    }
}

#[derive(Debug, Clone)]
enum Line<'a> {
    Init(&'a str, (usize, usize)),
    Arrow(Arrow<'a>),
}

/// Reads the declarative rules stored at `filepath` and builds a `RuleGraph`.
pub fn parse_rules_file(
    filepath: impl AsRef<std::path::Path>,
    handler: &mut DiagnosticHandler,
) -> Result<RuleGraph> {
    let filename = filepath.as_ref().to_string_lossy().to_string();
    let input = std::fs::read_to_string(filepath)?;
    parse_rules(&filename, &input, handler)
}

/// Builds a `RuleGraph` from declarative input. Lines that match no known
/// form are reported as warnings and dropped.
pub fn parse_rules(
    filename: &str,
    input: &str,
    handler: &mut DiagnosticHandler,
) -> Result<RuleGraph> {
    let fileid = handler.add_file(filename.to_string(), input.to_string());

    let file = match RulesParser::parse(Rule::file, input) {
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

    let mut lines = vec![];
    for pair in file.into_inner() {
        match pair.as_rule() {
            Rule::init_line => {
                let span = pair.as_span();
                let state = pair
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::ident)
                    .map(|p| p.as_str())
                    .expect("`init_line` always names a state");
                lines.push(Line::Init(state, (span.start(), span.end())));
            }
            Rule::arrow_line => {
                let arrow = parse_arrow(pair);
                if let Some((start, end)) = arrow.trailing {
                    handler.emit_diagnostic_lexing(
                        "Ignoring trailing text after the rule name",
                        fileid,
                        start,
                        end,
                        Level::Warning,
                    );
                }
                lines.push(Line::Arrow(arrow));
            }
            Rule::skipped => {
                debug!("skipping line `{}`", pair.as_str());
                handler.emit_diagnostic_parsing(
                    "Unrecognized rule, skipping this line",
                    fileid,
                    &pair,
                    Level::Warning,
                );
            }
            _ => {}
        }
    }

    let graph = build_graph(&lines, fileid, handler);
    info!(
        "{}: {} edges, {} rules",
        filename,
        graph.num_edges(),
        graph.num_rules()
    );
    Ok(graph)
}

fn parse_arrow(pair: Pair<'_, Rule>) -> Arrow<'_> {
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let source = inner.next().expect("arrow source").as_str();
    let op = match inner.next().expect("arrow operator").as_rule() {
        Rule::edge_op => Op::Edge,
        Rule::enable_op => Op::Enable,
        Rule::disable_op => Op::Disable,
        rule => unreachable!("expected an arrow operator, found {:?}", rule),
    };
    let target = inner.next().expect("arrow target").as_str();

    let mut name = None;
    let mut disabled = false;
    let mut trailing = None;
    for rest in inner {
        match rest.as_rule() {
            Rule::name => name = rest.into_inner().next().map(|id| id.as_str()),
            Rule::disabled => disabled = true,
            Rule::trailing => {
                let span = rest.as_span();
                trailing = Some((span.start(), span.end()));
            }
            rule => unreachable!("unexpected {:?} in arrow", rule),
        }
    }

    Arrow {
        source,
        op,
        target,
        name,
        disabled,
        span: (span.start(), span.end()),
        trailing,
    }
}

/// Two passes: actors first, so that a name marked `disabled` on a later
/// line is already final when edges and rules are built.
fn build_graph(lines: &[Line<'_>], fileid: usize, handler: &mut DiagnosticHandler) -> RuleGraph {
    let mut graph = RuleGraph::default();

    for line in lines {
        if let Line::Arrow(arrow) = line {
            if arrow.disabled {
                graph.disable_actor(arrow.actor());
            } else {
                graph.declare_actor(arrow.actor());
            }
        }
    }

    for line in lines {
        match line {
            Line::Init(state, (start, end)) => {
                if let Some(previous) = graph.init.replace(state.to_string()) {
                    let msg = format!("Initial state `{}` is overridden by `{}`", previous, state);
                    handler.emit_diagnostic_lexing(&msg, fileid, *start, *end, Level::Warning);
                }
            }
            Line::Arrow(arrow) => {
                let kind = match arrow.op {
                    Op::Edge => {
                        debug!("edge {} --> {}: {}", arrow.source, arrow.target, arrow.actor());
                        graph.add_edge(Edge {
                            source: arrow.source.to_string(),
                            target: arrow.target.to_string(),
                            action: arrow.actor().to_string(),
                        });
                        continue;
                    }
                    Op::Enable => RuleKind::Enable,
                    Op::Disable => RuleKind::Disable,
                };

                if !graph.has_actor(arrow.target) {
                    let msg = format!(
                        "`{}` is never declared as an actor, dropping this rule",
                        arrow.target
                    );
                    let (start, end) = arrow.span;
                    handler.emit_diagnostic_lexing(&msg, fileid, start, end, Level::Warning);
                    continue;
                }

                debug!("{} rule {} -> {} ({})", kind, arrow.source, arrow.target, arrow.actor());
                graph.add_rule(ir::Rule {
                    kind,
                    trigger: arrow.source.to_string(),
                    target: arrow.target.to_string(),
                    name: arrow.actor().to_string(),
                });
            }
        }
    }

    graph
}
