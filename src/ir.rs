// Copyright 2025 Cornell University
// released under MIT License

use cranelift_entity::{entity_impl, PrimaryMap};
use rustc_hash::FxHashMap;
use std::fmt;
use std::ops::Index;

/// A named boolean condition variable. Rendered as `<name>_active`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    name: String,
    active: bool,
}

impl Actor {
    pub fn new(name: String, active: bool) -> Self {
        Self { name, active }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn active(&self) -> bool {
        self.active
    }

    /// name of the guard variable backing this actor
    pub fn var(&self) -> String {
        active_var(&self.name)
    }
}

/// Name of the integer variable that tracks whether `name` is enabled
pub fn active_var(name: &str) -> String {
    format!("{}_active", name)
}

#[derive(Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct EdgeId(u32);
entity_impl!(EdgeId, "edge");

/// A primary transition `source --> target: action`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub action: String,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum RuleKind {
    /// `->>`
    Enable,
    /// `--!`
    Disable,
}

impl RuleKind {
    /// value assigned to the target's variable when the rule fires
    pub fn value(&self) -> u8 {
        match self {
            RuleKind::Enable => 1,
            RuleKind::Disable => 0,
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::Enable => write!(f, "enable"),
            RuleKind::Disable => write!(f, "disable"),
        }
    }
}

#[derive(Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct RuleId(u32);
entity_impl!(RuleId, "rule");

/// A conditional cascade directive. When `trigger` fires, `target` is
/// enabled or disabled, guarded by the rule's own actor `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub kind: RuleKind,
    pub trigger: String,
    pub target: String,
    pub name: String,
}

impl Rule {
    /// A rule named after its own target applies unconditionally.
    pub fn is_self_referential(&self) -> bool {
        self.name == self.target
    }
}

/// Result of building the declarative input: actors, edges in input order
/// and rules indexed by their trigger.
#[derive(Debug, Clone, Default)]
pub struct RuleGraph {
    pub init: Option<String>,
    actors: FxHashMap<String, Actor>,
    edges: PrimaryMap<EdgeId, Edge>,
    rules: PrimaryMap<RuleId, Rule>,
    by_trigger: FxHashMap<String, Vec<RuleId>>,
}

impl RuleGraph {
    /// Declares `name` as active unless it is already known.
    pub fn declare_actor(&mut self, name: &str) {
        self.actors
            .entry(name.to_string())
            .or_insert_with(|| Actor::new(name.to_string(), true));
    }

    /// Marks `name` as disabled, declaring it first if needed.
    /// A disabled actor never goes back to active.
    pub fn disable_actor(&mut self, name: &str) {
        self.actors
            .entry(name.to_string())
            .and_modify(|actor| actor.active = false)
            .or_insert_with(|| Actor::new(name.to_string(), false));
    }

    pub fn actor(&self, name: &str) -> Option<&Actor> {
        self.actors.get(name)
    }

    pub fn has_actor(&self, name: &str) -> bool {
        self.actors.contains_key(name)
    }

    /// Actors in no particular order
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    pub fn add_edge(&mut self, edge: Edge) -> EdgeId {
        self.declare_actor(&edge.action);
        self.edges.push(edge)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn add_rule(&mut self, rule: Rule) -> RuleId {
        let trigger = rule.trigger.clone();
        let rule_id = self.rules.push(rule);
        self.by_trigger.entry(trigger).or_default().push(rule_id);
        rule_id
    }

    /// Rules keyed by `trigger`, in insertion order
    pub fn rules_for(&self, trigger: &str) -> &[RuleId] {
        self.by_trigger
            .get(trigger)
            .map(|ids| ids.as_slice())
            .unwrap_or_default()
    }

    pub fn num_rules(&self) -> usize {
        self.rules.len()
    }
}

impl Index<RuleId> for RuleGraph {
    type Output = Rule;

    fn index(&self, index: RuleId) -> &Self::Output {
        &self.rules[index]
    }
}

impl Index<&RuleId> for RuleGraph {
    type Output = Rule;

    fn index(&self, index: &RuleId) -> &Self::Output {
        &self.rules[*index]
    }
}

impl Index<EdgeId> for RuleGraph {
    type Output = Edge;

    fn index(&self, index: EdgeId) -> &Self::Output {
        &self.edges[index]
    }
}

/// `int <name> = <value>` in the imperative script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: i64,
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "int {} = {}", self.name, self.value)
    }
}

/// A parsed transition block. `guard` and `update` are free text and are
/// empty when absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transition {
    pub source: String,
    pub target: String,
    pub event: String,
    pub guard: String,
    pub update: String,
}

/// The typed model of an imperative script.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Automaton {
    pub declarations: Vec<Declaration>,
    pub init: Option<String>,
    pub transitions: Vec<Transition>,
}

impl Automaton {
    /// Every transition endpoint plus the initial state, sorted by name.
    pub fn states(&self) -> Vec<&str> {
        let mut states: Vec<&str> = self
            .transitions
            .iter()
            .flat_map(|tr| [tr.source.as_str(), tr.target.as_str()])
            .chain(self.init.as_deref())
            .collect();
        states.sort_unstable();
        states.dedup();
        states
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_actor_stays_disabled() {
        let mut graph = RuleGraph::default();
        graph.disable_actor("on1");
        graph.declare_actor("on1");
        assert!(!graph.actor("on1").unwrap().active());

        graph.declare_actor("act");
        assert!(graph.actor("act").unwrap().active());
        graph.disable_actor("act");
        assert!(!graph.actor("act").unwrap().active());
    }

    #[test]
    fn rules_are_indexed_by_trigger_in_insertion_order() {
        let mut graph = RuleGraph::default();
        let first = graph.add_rule(Rule {
            kind: RuleKind::Disable,
            trigger: "act".to_string(),
            target: "act".to_string(),
            name: "offAct".to_string(),
        });
        let second = graph.add_rule(Rule {
            kind: RuleKind::Enable,
            trigger: "act".to_string(),
            target: "on1".to_string(),
            name: "on1".to_string(),
        });
        assert_eq!(graph.rules_for("act"), &[first, second]);
        assert!(graph.rules_for("on1").is_empty());
        assert!(!graph[first].is_self_referential());
        assert!(graph[second].is_self_referential());
    }

    #[test]
    fn edges_register_their_action() {
        let mut graph = RuleGraph::default();
        let edge = graph.add_edge(Edge {
            source: "s0".to_string(),
            target: "s1".to_string(),
            action: "go".to_string(),
        });
        assert_eq!(graph[edge].target, "s1");
        assert!(graph.has_actor("go"));
        assert!(!graph.has_actor("s0"));
        assert_eq!(graph.num_edges(), 1);
    }

    #[test]
    fn states_include_init_and_are_sorted() {
        let automaton = Automaton {
            declarations: vec![],
            init: Some("idle".to_string()),
            transitions: vec![
                Transition {
                    source: "s1".to_string(),
                    target: "s0".to_string(),
                    ..Default::default()
                },
                Transition {
                    source: "s0".to_string(),
                    target: "s1".to_string(),
                    ..Default::default()
                },
            ],
        };
        assert_eq!(automaton.states(), vec!["idle", "s0", "s1"]);
    }
}
