// Copyright 2025 Cornell University
// released under MIT License

use std::io::Write;

use clap::ColorChoice;
use codespan_reporting::diagnostic::{
    Diagnostic as CodespanDiagnostic, Label as CodespanLabel, LabelStyle, Severity,
};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{Buffer, Color, ColorSpec, WriteColor};
use pest::iterators::Pair;
use pest::RuleType;

/// Severity of diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
}

/// A label representing a part of the source code
#[derive(Debug, Clone, PartialEq, Eq)]
struct Label {
    message: Option<String>,
    range: (usize, usize),
}

impl Label {
    fn to_codespan_label(&self, fileid: usize) -> CodespanLabel<usize> {
        CodespanLabel::new(LabelStyle::Primary, fileid, self.range.0..self.range.1)
            .with_message(self.message.clone().unwrap_or_default())
    }
}

/// Diagnostic of a particular part of source code
struct Diagnostic {
    title: String,
    message: String,
    level: Level,
    location: Option<(usize, Label)>,
}

impl Diagnostic {
    fn emit(&self, buffer: &mut Buffer, files: &SimpleFiles<String, String>) {
        if let Some((fileid, label)) = &self.location {
            let severity = match self.level {
                Level::Error => Severity::Error,
                Level::Warning => Severity::Warning,
            };

            let diagnostic = CodespanDiagnostic::new(severity)
                .with_message(&self.message)
                .with_labels(vec![label.to_codespan_label(*fileid)]);

            let config = term::Config::default();
            term::emit(buffer, &config, files, &diagnostic).expect("Failed to write diagnostic");
        } else {
            let color = match self.level {
                Level::Error => Color::Red,
                Level::Warning => Color::Yellow,
            };

            buffer
                .set_color(ColorSpec::new().set_bold(true).set_fg(Some(color)))
                .expect("Failed to set color");
            write!(buffer, "{}", self.title).expect("Failed to write title");
            buffer
                .set_color(&ColorSpec::new())
                .expect("Failed to reset color");
            writeln!(buffer, ": {}", self.message).expect("Failed to write message");
        }
    }
}

/// Collects and prints diagnostics for every input file handed to the
/// parsers. Everything is echoed to stderr so that generated output on
/// stdout stays clean.
pub struct DiagnosticHandler {
    files: SimpleFiles<String, String>,
    error_string: String,
    /// `color_choice` indicates whether to emit error messages w/ ANSI colors
    color_choice: ColorChoice,
    /// warnings are always recorded but only printed when this is set
    emit_warnings: bool,
    num_errors: usize,
    num_warnings: usize,
}

impl Default for DiagnosticHandler {
    /// Default `DiagnosticHandler` does not emit colored error messages
    fn default() -> Self {
        Self::new(ColorChoice::Never, true)
    }
}

impl DiagnosticHandler {
    pub fn new(color_choice: ColorChoice, emit_warnings: bool) -> Self {
        Self {
            files: SimpleFiles::new(),
            error_string: String::new(),
            color_choice,
            emit_warnings,
            num_errors: 0,
            num_warnings: 0,
        }
    }

    fn create_buffer(&self) -> Buffer {
        if self.color_choice == ColorChoice::Never {
            Buffer::no_color()
        } else {
            Buffer::ansi()
        }
    }

    pub fn add_file(&mut self, name: String, content: String) -> usize {
        self.files.add(name, content)
    }

    /// Everything emitted so far, in order
    pub fn error_string(&self) -> &str {
        &self.error_string
    }

    pub fn num_errors(&self) -> usize {
        self.num_errors
    }

    pub fn num_warnings(&self) -> usize {
        self.num_warnings
    }

    fn record(&mut self, diagnostic: Diagnostic) {
        let mut buffer = self.create_buffer();
        diagnostic.emit(&mut buffer, &self.files);
        let msg = String::from_utf8_lossy(buffer.as_slice()).into_owned();
        self.error_string.push_str(&msg);

        match diagnostic.level {
            Level::Error => self.num_errors += 1,
            Level::Warning => self.num_warnings += 1,
        }
        if diagnostic.level == Level::Error || self.emit_warnings {
            eprint!("{}", msg);
        }
    }

    /// Note: we make this function parametric over any type `R`
    /// that implements Pest's `RuleType` trait
    /// so that we can call this function from both parsers
    pub fn emit_diagnostic_parsing<R: RuleType>(
        &mut self,
        message: &str,
        fileid: usize,
        pair: &Pair<'_, R>,
        level: Level,
    ) {
        let span = pair.as_span();
        self.emit_diagnostic_lexing(message, fileid, span.start(), span.end(), level);
    }

    pub fn emit_diagnostic_lexing(
        &mut self,
        message: &str,
        fileid: usize,
        start: usize,
        end: usize,
        level: Level,
    ) {
        let label = Label {
            message: Some(message.to_string()),
            range: (start, end),
        };
        self.record(Diagnostic {
            title: format!("{:?} in file {}", level, fileid),
            message: message.to_string(),
            level,
            location: Some((fileid, label)),
        });
    }

    pub fn emit_general_message(&mut self, message: &str, level: Level) {
        self.record(Diagnostic {
            title: format!("{:?}", level),
            message: message.to_string(),
            level,
            location: None,
        });
    }
}
