// Copyright 2025 Cornell University
// released under MIT License

use std::io::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// A markup element with ordered attributes and children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: vec![],
            children: vec![],
        }
    }

    pub fn attr(mut self, key: &str, value: impl ToString) -> Self {
        self.attrs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn child(mut self, element: Element) -> Self {
        self.push(element);
        self
    }

    pub fn push(&mut self, element: Element) {
        self.children.push(Node::Element(element));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// Pretty-prints this element to `out`, one tab per level of `indent`.
    /// An element whose only child is text is kept on a single line.
    pub fn write(&self, out: &mut impl Write, indent: usize) -> std::io::Result<()> {
        let pad = "\t".repeat(indent);
        write!(out, "{}<{}", pad, self.name)?;
        for (key, value) in &self.attrs {
            write!(out, " {}=\"{}\"", key, escape(value))?;
        }

        match self.children.as_slice() {
            [] => writeln!(out, "/>")?,
            [Node::Text(text)] => writeln!(out, ">{}</{}>", escape(text), self.name)?,
            children => {
                writeln!(out, ">")?;
                for child in children {
                    match child {
                        Node::Element(element) => element.write(out, indent + 1)?,
                        Node::Text(text) => writeln!(out, "{}\t{}", pad, escape(text))?,
                    }
                }
                writeln!(out, "{}</{}>", pad, self.name)?;
            }
        }
        Ok(())
    }
}

/// Escapes character data and attribute values
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}
