// Copyright 2025 Cornell University
// released under MIT License

use std::collections::VecDeque;

use log::debug;
use rustc_hash::FxHashSet;

use crate::ir::{RuleGraph, RuleId, RuleKind};

/// A rule reached from some action, `depth` enable-hops away from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effect {
    pub rule: RuleId,
    pub depth: u32,
}

/// Collects every rule reachable from `start` by chaining `enable` rules,
/// breadth first. Each trigger is expanded at most once, so cyclic enable
/// chains terminate. Disable rules are leaves.
///
/// Effects are returned in discovery order; see [`sort_effects`] for the
/// canonical order.
pub fn resolve(graph: &RuleGraph, start: &str) -> Vec<Effect> {
    let mut queue = VecDeque::from([(start, 0u32)]);
    let mut visited = FxHashSet::default();
    visited.insert(start);
    let mut effects = vec![];

    while let Some((trigger, depth)) = queue.pop_front() {
        for &rule_id in graph.rules_for(trigger) {
            effects.push(Effect {
                rule: rule_id,
                depth,
            });

            let rule = &graph[rule_id];
            if rule.kind == RuleKind::Enable && visited.insert(rule.name.as_str()) {
                debug!("{} enables trigger {} at depth {}", trigger, rule.name, depth + 1);
                queue.push_back((rule.name.as_str(), depth + 1));
            }
        }
    }

    effects
}

/// Orders effects by depth, then by rule name. The sort is stable, so
/// effects that tie keep their discovery order.
pub fn sort_effects(graph: &RuleGraph, effects: &mut [Effect]) {
    effects.sort_by(|a, b| {
        a.depth
            .cmp(&b.depth)
            .then_with(|| graph[a.rule].name.cmp(&graph[b.rule].name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Rule;

    fn rule(graph: &mut RuleGraph, kind: RuleKind, trigger: &str, target: &str, name: &str) {
        graph.declare_actor(target);
        graph.declare_actor(name);
        graph.add_rule(Rule {
            kind,
            trigger: trigger.to_string(),
            target: target.to_string(),
            name: name.to_string(),
        });
    }

    fn describe(graph: &RuleGraph, effects: &[Effect]) -> Vec<(String, u32)> {
        effects
            .iter()
            .map(|e| (graph[e.rule].name.clone(), e.depth))
            .collect()
    }

    #[test]
    fn test_no_rules_no_effects() {
        let graph = RuleGraph::default();
        assert!(resolve(&graph, "act").is_empty());
    }

    #[test]
    fn test_enable_chains_are_layered() {
        let mut graph = RuleGraph::default();
        rule(&mut graph, RuleKind::Enable, "a", "b", "b");
        rule(&mut graph, RuleKind::Enable, "b", "c", "c");
        rule(&mut graph, RuleKind::Disable, "c", "a", "a");

        let effects = resolve(&graph, "a");
        assert_eq!(
            describe(&graph, &effects),
            vec![
                ("b".to_string(), 0),
                ("c".to_string(), 1),
                ("a".to_string(), 2)
            ]
        );
    }

    #[test]
    fn test_disable_rules_are_not_expanded() {
        let mut graph = RuleGraph::default();
        rule(&mut graph, RuleKind::Disable, "a", "b", "b");
        rule(&mut graph, RuleKind::Enable, "b", "c", "c");

        let effects = resolve(&graph, "a");
        assert_eq!(describe(&graph, &effects), vec![("b".to_string(), 0)]);
    }

    #[test]
    fn test_cycles_terminate() {
        let mut graph = RuleGraph::default();
        rule(&mut graph, RuleKind::Enable, "a", "b", "b");
        rule(&mut graph, RuleKind::Enable, "b", "a", "a");

        let effects = resolve(&graph, "a");
        // `a` is expanded once at depth 0 and `b` once at depth 1
        assert_eq!(
            describe(&graph, &effects),
            vec![("b".to_string(), 0), ("a".to_string(), 1)]
        );
    }

    #[test]
    fn test_trigger_reached_twice_is_expanded_once() {
        let mut graph = RuleGraph::default();
        rule(&mut graph, RuleKind::Enable, "a", "x", "b");
        rule(&mut graph, RuleKind::Enable, "a", "y", "b");
        rule(&mut graph, RuleKind::Disable, "b", "z", "z");

        let effects = resolve(&graph, "a");
        assert_eq!(
            describe(&graph, &effects),
            vec![
                ("b".to_string(), 0),
                ("b".to_string(), 0),
                ("z".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_sort_by_depth_then_name() {
        let mut graph = RuleGraph::default();
        rule(&mut graph, RuleKind::Enable, "a", "zeta", "zeta");
        rule(&mut graph, RuleKind::Disable, "zeta", "alpha", "alpha");
        rule(&mut graph, RuleKind::Disable, "a", "mid", "mid");

        let mut effects = resolve(&graph, "a");
        sort_effects(&graph, &mut effects);
        assert_eq!(
            describe(&graph, &effects),
            vec![
                ("mid".to_string(), 0),
                ("zeta".to_string(), 0),
                ("alpha".to_string(), 1)
            ]
        );
    }
}
