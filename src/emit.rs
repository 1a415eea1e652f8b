// Copyright 2025 Cornell University
// released under MIT License

use itertools::Itertools;
use log::info;
use std::io::Write;

use crate::cascade::{resolve, sort_effects};
use crate::ir::{active_var, Rule, RuleGraph};

/// Serializes a `RuleGraph` as an imperative script to a `String`
pub fn emit_to_string(graph: &RuleGraph) -> String {
    script_lines(graph).join("\n")
}

/// Writes the imperative script for `graph` to the output buffer `out`
pub fn emit(out: &mut impl Write, graph: &RuleGraph) -> std::io::Result<()> {
    write!(out, "{}", emit_to_string(graph))
}

/// Renders one effect of a transition, indented by `indent` levels.
/// Self-referential rules assign directly, all others are guarded by the
/// rule's own actor.
fn effect_lines(rule: &Rule, indent: usize) -> Vec<String> {
    let pad = "    ".repeat(indent);
    let assignment = format!("{}' := {}", active_var(&rule.target), rule.kind.value());
    if rule.is_self_referential() {
        vec![format!("{pad}{assignment}")]
    } else {
        vec![
            format!("{pad}if ({} == 1) then {{", active_var(&rule.name)),
            format!("{pad}    {assignment}"),
            format!("{pad}}}"),
        ]
    }
}

fn script_lines(graph: &RuleGraph) -> Vec<String> {
    let mut lines = vec![];

    // actors are sorted by name to keep the output canonical
    for actor in graph.actors().sorted_by(|a, b| a.name().cmp(b.name())) {
        lines.push(format!("int {} = {}", actor.var(), u8::from(actor.active())));
    }
    lines.push(String::new());

    if let Some(init) = &graph.init {
        lines.push(format!("init {}", init));
        lines.push(String::new());
    }

    for edge in graph.edges() {
        let header = format!(
            "{} --> {}: {} if ({} == 1)",
            edge.source,
            edge.target,
            edge.action,
            active_var(&edge.action)
        );

        let mut effects = resolve(graph, &edge.action);
        if effects.is_empty() {
            lines.push(header);
            continue;
        }

        sort_effects(graph, &mut effects);
        info!("{} cascades into {} effects", edge.action, effects.len());
        lines.push(format!("{} then {{", header));
        for effect in &effects {
            lines.extend(effect_lines(&graph[effect.rule], 1));
        }
        lines.push("}".to_string());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticHandler;
    use crate::ir::RuleKind;
    use crate::rules_parser::{parse_rules, parse_rules_file};

    fn translate(input: &str) -> String {
        let mut handler = DiagnosticHandler::default();
        let graph = parse_rules("test.rules", input, &mut handler).unwrap();
        emit_to_string(&graph)
    }

    #[test]
    fn test_cascade_example() {
        let mut handler = DiagnosticHandler::default();
        let graph = parse_rules_file("tests/cascade.rules", &mut handler).unwrap();
        insta::assert_snapshot!(emit_to_string(&graph), @r"
        int act_active = 1
        int offAct_active = 0
        int on1_active = 0

        init s0

        s0 --> s0: act if (act_active == 1) then {
            if (offAct_active == 1) then {
                act_active' := 0
            }
            if (on1_active == 1) then {
                offAct_active' := 1
            }
            on1_active' := 1
        }
        ");
    }

    #[test]
    fn test_coffee_machine() {
        let mut handler = DiagnosticHandler::default();
        let graph = parse_rules_file("tests/coffee.rules", &mut handler).unwrap();
        insta::assert_snapshot!(emit_to_string(&graph), @r"
        int GetChoc_active = 1
        int GetCoffee_active = 1
        int ct50_active = 1
        int eur1_active = 1
        int lastct50_active = 0

        init Insert

        Insert --> Coffee: ct50 if (ct50_active == 1) then {
            eur1_active' := 0
            lastct50_active' := 1
            if (lastct50_active == 1) then {
                ct50_active' := 0
            }
        }
        Insert --> Chocolate: eur1 if (eur1_active == 1) then {
            ct50_active' := 0
            eur1_active' := 0
        }
        Coffee --> Insert: GetCoffee if (GetCoffee_active == 1)
        Chocolate --> Insert: GetChoc if (GetChoc_active == 1)
        ");
    }

    #[test]
    fn test_edge_without_effects_stands_alone() {
        assert_eq!(
            translate("s0 --> s1: go"),
            "int go_active = 1\n\ns0 --> s1: go if (go_active == 1)"
        );
    }

    #[test]
    fn test_missing_init_is_omitted() {
        let output = translate("s0 --> s1: go\ns1 --> s0: back disabled");
        assert!(!output.contains("init"));
        assert!(output.starts_with("int back_active = 0\nint go_active = 1\n\ns0 --> s1"));
    }

    #[test]
    fn test_deeper_effect_follows_shallower_one() {
        let output = translate(
            "s0 --> s1: a\n\
             a ->> b\n\
             b --! aa\n\
             a --! zz\n\
             s1 --> s1: aa\n\
             s1 --> s1: zz\n",
        );
        let first = output.find("zz_active' := 0").unwrap();
        let second = output.find("aa_active' := 0").unwrap();
        assert!(first < second, "{output}");
    }

    #[test]
    fn test_self_referential_rendering() {
        let enable = Rule {
            kind: RuleKind::Enable,
            trigger: "a".to_string(),
            target: "b".to_string(),
            name: "b".to_string(),
        };
        assert_eq!(effect_lines(&enable, 1), vec!["    b_active' := 1"]);

        let guarded = Rule {
            name: "lock".to_string(),
            kind: RuleKind::Disable,
            ..enable
        };
        assert_eq!(
            effect_lines(&guarded, 0),
            vec!["if (lock_active == 1) then {", "    b_active' := 0", "}"]
        );
    }

    #[test]
    fn test_output_is_deterministic() {
        let input = std::fs::read_to_string("tests/coffee.rules").unwrap();
        let first = translate(&input);
        for _ in 0..5 {
            assert_eq!(translate(&input), first);
        }
    }
}
