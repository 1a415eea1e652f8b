// Copyright 2025 Cornell University
// released under MIT License

use itertools::Itertools;
use log::debug;

use crate::automaton_parser::parse_primed_assignment;
use crate::ir::Transition;

/// A procedure synthesized from a transition's update block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateFunction {
    pub name: String,
    pub body: String,
}

impl UpdateFunction {
    /// `void name() { ... }` as it appears in the global declarations
    pub fn definition(&self) -> String {
        format!("void {}() {{\n\t{}\n}}", self.name, self.body)
    }

    /// expression used as the transition's assignment label
    pub fn call(&self) -> String {
        format!("{}()", self.name)
    }
}

/// Accumulates the procedures generated while building one document. The
/// ordinal in each name is the number of procedures generated before it,
/// which keeps names unique even for repeated source/target pairs.
#[derive(Debug, Clone, Default)]
pub struct UpdateFunctions {
    functions: Vec<UpdateFunction>,
}

impl UpdateFunctions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a procedure for `transition` and returns the call
    /// expression, or `None` when its update block is empty.
    pub fn generate(&mut self, transition: &Transition) -> Option<String> {
        let update = transition.update.trim();
        if update.is_empty() {
            return None;
        }

        let function = UpdateFunction {
            name: format!(
                "update_{}_to_{}_{}",
                transition.source,
                transition.target,
                self.functions.len()
            ),
            body: format_update_body(update),
        };
        debug!("generated {}", function.name);
        let call = function.call();
        self.functions.push(function);
        Some(call)
    }

    /// Procedures in generation order
    pub fn functions(&self) -> &[UpdateFunction] {
        &self.functions
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// All definitions, separated by a blank line
    pub fn definitions(&self) -> String {
        self.functions.iter().map(|f| f.definition()).join("\n\n")
    }
}

/// Rewrites an update block into statement syntax: the first primed
/// assignment on each line becomes `name = expr;`, the `then` keyword is dropped and every
/// non-empty line is trimmed.
pub fn format_update_body(block: &str) -> String {
    block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let line = match parse_primed_assignment(line) {
                Some(assign) => format!("{}{} = {};", assign.prefix, assign.name, assign.rhs),
                None => line.to_string(),
            };
            strip_then(&line)
        })
        .join("\n\t")
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Removes whole-word `then` tokens, leaving the surrounding spacing as is.
fn strip_then(line: &str) -> String {
    let tokens = line.chars().chunk_by(|c| is_word_char(*c));
    let stripped: String = tokens
        .into_iter()
        .map(|(_, chunk)| chunk.collect::<String>())
        .filter(|token| token != "then")
        .collect();
    stripped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(source: &str, target: &str, update: &str) -> Transition {
        Transition {
            source: source.to_string(),
            target: target.to_string(),
            update: update.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_update_generates_nothing() {
        let mut functions = UpdateFunctions::new();
        assert_eq!(functions.generate(&transition("s0", "s1", "")), None);
        assert_eq!(functions.generate(&transition("s0", "s1", " \n\t ")), None);
        assert!(functions.is_empty());
    }

    #[test]
    fn test_single_assignment() {
        let mut functions = UpdateFunctions::new();
        let call = functions.generate(&transition("s0", "s1", "\n a_active' := 0\n"));
        assert_eq!(call.as_deref(), Some("update_s0_to_s1_0()"));
        assert_eq!(
            functions.definitions(),
            "void update_s0_to_s1_0() {\n\ta_active = 0;\n}"
        );
    }

    #[test]
    fn test_names_stay_unique_for_repeated_endpoints() {
        let mut functions = UpdateFunctions::new();
        let calls: Vec<_> = (0..3)
            .filter_map(|_| functions.generate(&transition("s0", "s0", "x' := 1")))
            .collect();
        assert_eq!(
            calls,
            vec!["update_s0_to_s0_0()", "update_s0_to_s0_1()", "update_s0_to_s0_2()"]
        );
        assert!(functions.functions().iter().map(|f| &f.name).all_unique());
    }

    #[test]
    fn test_nested_block() {
        let body = format_update_body(
            "if (offA_active == 1) then {\n        a_active' := 0\n    }\n",
        );
        assert_eq!(body, "if (offA_active == 1)  {\n\ta_active = 0;\n\t}");
    }

    #[test]
    fn test_single_line_nested_block() {
        let body = format_update_body("if (lock_active == 1) then { a_active' := 0 }");
        assert_eq!(body, "if (lock_active == 1)  { a_active = 0 };");
    }

    #[test]
    fn test_then_is_only_stripped_as_a_keyword() {
        assert_eq!(strip_then("if (thenValue == 1) then {"), "if (thenValue == 1)  {");
        assert_eq!(
            format_update_body("then_count' := then_count + 1"),
            "then_count = then_count + 1;"
        );
    }
}
