// Copyright 2025 Cornell University
// released under MIT License

use itertools::Itertools;
use log::info;
use rustc_hash::FxHashMap;
use std::io::Write;

use crate::errors::{Error, Result};
use crate::ir::{Automaton, Transition};
use crate::markup::Element;
use crate::update::UpdateFunctions;

/// Public identifier of the flat system 1.6 document type
pub const DOCTYPE_PUBLIC_ID: &str = "-//Uppaal Team//DTD Flat System 1.6//EN";
/// Schema location of the flat system 1.6 document type
pub const DOCTYPE_SYSTEM_ID: &str =
    "http://www.it.uu.se/research/group/darts/uppaal/flat-1_6.dtd";

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>";

const GLOBAL_HEADER: &str = "// Place global declarations here.";
const FUNCTIONS_HEADER: &str = "// Auto-generated functions for transition logic";
const LOCAL_DECLARATIONS: &str = "// Place local declarations here.\n";
const SYSTEM: &str = "// Place template instantiations here.\n\
                      Process = Template();\n\
                      // List one or more processes to be composed into a system.\n\
                      system Process;\n";

// layout, in canvas coordinates
const LOCATION_X: i32 = -600;
const LOCATION_STEP: i32 = 250;
const LOCATION_Y: i32 = -150;
const NAME_DX: i32 = -20;
const NAME_Y: i32 = -180;
const LABEL_X: i32 = -550;
const LABEL_Y: i32 = -120;
const LABEL_STEP: i32 = 25;
const NAIL: (i32, i32) = (-550, -100);

/// Builds the document tree for `automaton`. Update procedures are
/// generated into a fresh accumulator, so repeated builds are identical.
pub fn build_document(automaton: &Automaton) -> Result<Element> {
    let mut functions = UpdateFunctions::new();
    let assignments: Vec<Option<String>> = automaton
        .transitions
        .iter()
        .map(|tr| functions.generate(tr))
        .collect();

    let states = automaton.states();
    let ids: FxHashMap<&str, String> = states
        .iter()
        .enumerate()
        .map(|(ii, state)| (*state, format!("id{}", ii)))
        .collect();
    let id_of = |name: &str| location_id(&ids, name);

    let mut template = Element::new("template")
        .child(Element::new("name").attr("x", 5).attr("y", 5).text("Template"))
        .child(Element::new("declaration").text(LOCAL_DECLARATIONS));

    let mut x = LOCATION_X;
    for state in &states {
        template.push(
            Element::new("location")
                .attr("id", id_of(state)?)
                .attr("x", x)
                .attr("y", LOCATION_Y)
                .child(
                    Element::new("name")
                        .attr("x", x + NAME_DX)
                        .attr("y", NAME_Y)
                        .text(*state),
                ),
        );
        x += LOCATION_STEP;
    }

    if let Some(init) = &automaton.init {
        template.push(Element::new("init").attr("ref", id_of(init)?));
    }

    for (ii, (tr, assignment)) in automaton.transitions.iter().zip(&assignments).enumerate() {
        let id = format!("id{}", states.len() + ii);
        template.push(build_transition(
            &id,
            id_of(&tr.source)?,
            id_of(&tr.target)?,
            tr,
            assignment.as_deref(),
        ));
    }

    info!(
        "document: {} locations, {} transitions, {} update functions",
        states.len(),
        automaton.transitions.len(),
        functions.functions().len()
    );

    let query = Element::new("query")
        .child(Element::new("formula"))
        .child(Element::new("comment"));

    Ok(Element::new("nta")
        .child(Element::new("declaration").text(global_declarations(automaton, &functions)))
        .child(template)
        .child(Element::new("system").text(SYSTEM))
        .child(Element::new("queries").child(query)))
}

fn location_id<'a>(ids: &'a FxHashMap<&str, String>, name: &str) -> Result<&'a str> {
    ids.get(name)
        .map(|id| id.as_str())
        .ok_or_else(|| Error::UnknownLocation {
            name: name.to_string(),
        })
}

fn global_declarations(automaton: &Automaton, functions: &UpdateFunctions) -> String {
    let variables = automaton
        .declarations
        .iter()
        .map(|decl| format!("{};", decl))
        .join("\n");
    let mut text = format!("{}\n\n{}", GLOBAL_HEADER, variables);
    if !functions.is_empty() {
        text.push_str(&format!("\n\n{}\n{}", FUNCTIONS_HEADER, functions.definitions()));
    }
    text
}

/// The assignment label sits below the guard label, or takes its place
/// when there is no guard.
fn build_transition(
    id: &str,
    source: &str,
    target: &str,
    tr: &Transition,
    assignment: Option<&str>,
) -> Element {
    let mut transition = Element::new("transition")
        .attr("id", id)
        .child(Element::new("source").attr("ref", source))
        .child(Element::new("target").attr("ref", target));

    let mut y = LABEL_Y;
    if !tr.guard.is_empty() {
        transition.push(
            Element::new("label")
                .attr("kind", "guard")
                .attr("x", LABEL_X)
                .attr("y", y)
                .text(tr.guard.as_str()),
        );
        y += LABEL_STEP;
    }
    if let Some(assignment) = assignment {
        transition.push(
            Element::new("label")
                .attr("kind", "assignment")
                .attr("x", LABEL_X)
                .attr("y", y)
                .text(assignment),
        );
    }

    transition.child(Element::new("nail").attr("x", NAIL.0).attr("y", NAIL.1))
}

/// Serializes `automaton` as a flat system document to the output buffer `out`
pub fn serialize(out: &mut impl Write, automaton: &Automaton) -> Result<()> {
    let document = build_document(automaton)?;
    writeln!(out, "{}", XML_DECLARATION)?;
    writeln!(
        out,
        "<!DOCTYPE nta PUBLIC '{}' '{}'>",
        DOCTYPE_PUBLIC_ID, DOCTYPE_SYSTEM_ID
    )?;
    document.write(out, 0)?;
    Ok(())
}

/// Serializes `automaton` as a flat system document to a `String`
pub fn serialize_to_string(automaton: &Automaton) -> Result<String> {
    let mut out = Vec::new();
    serialize(&mut out, automaton)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}
