// Copyright 2025 Cornell University
// released under MIT License

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::Context;
use cascades::diagnostic::DiagnosticHandler;
use cascades::pipeline;
use cascades::sink::{FileSink, Sink, StdoutSink};
use clap::{ColorChoice, Parser, Subcommand};
use clap_verbosity_flag::{log::LevelFilter, Verbosity, WarnLevel};

/// Translates cascade rules into guarded automata and flat system documents
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Users can specify `-v` or `--verbose` to toggle logging
    #[command(flatten)]
    verbosity: Verbosity<WarnLevel>,

    /// Pass in `--color never` to suppress colored diagnostics
    #[arg(long, value_name = "COLOR_CHOICE", default_value = "auto", global = true)]
    color: ColorChoice,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Expand declarative rules into an imperative script
    Translate {
        /// Path to a rules file
        rules: PathBuf,
        /// Where to write the script (stdout if omitted)
        #[arg(short, long, value_name = "SCRIPT_FILE")]
        output: Option<PathBuf>,
    },
    /// Compile an imperative script into a flat system document
    Compile {
        /// Path to a script file
        script: PathBuf,
        /// Where to write the document (stdout if omitted)
        #[arg(short, long, value_name = "XML_FILE")]
        output: Option<PathBuf>,
    },
    /// Run both stages
    Build {
        /// Path to a rules file
        rules: PathBuf,
        /// Where to write the document (stdout if omitted)
        #[arg(short, long, value_name = "XML_FILE")]
        output: Option<PathBuf>,
        /// Also save the intermediate script
        #[arg(long, value_name = "SCRIPT_FILE")]
        script: Option<PathBuf>,
    },
}

/// Resolves `-o` into a sink and the name to write under
fn open_sink(output: Option<&Path>) -> (Box<dyn Sink>, String) {
    match output {
        Some(path) => {
            let root = path.parent().unwrap_or(Path::new(""));
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            (Box::new(FileSink::new(root)), name)
        }
        None => (Box::new(StdoutSink), "stdout".to_string()),
    }
}

fn write_output(output: Option<&Path>, text: &str) -> anyhow::Result<()> {
    let (mut sink, name) = open_sink(output);
    sink.write_text(&name, text)
        .with_context(|| format!("failed to write {}", name))
}

fn read_input(path: &Path) -> anyhow::Result<(String, String)> {
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok((path.to_string_lossy().to_string(), input))
}

/// Examples:
/// ```
/// $ cargo run -- translate tests/cascade.rules
/// $ cargo run -- compile tests/coffee.ta -o coffee.xml
/// $ cargo run -- build tests/coffee.rules -o coffee.xml --script coffee.ta -v
/// ```
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // For concision, we disable timestamps in the log
    env_logger::Builder::new()
        .format_timestamp(None)
        .filter_level(cli.verbosity.log_level_filter())
        .init();

    let color_choice = match cli.color {
        ColorChoice::Auto if !std::io::stderr().is_terminal() => ColorChoice::Never,
        choice => choice,
    };
    // skipped lines are reported unless `-q` lowers the level below warnings
    let emit_warnings = cli.verbosity.log_level_filter() >= LevelFilter::Warn;
    let handler = &mut DiagnosticHandler::new(color_choice, emit_warnings);

    if let Err(err) = run(cli.command, handler) {
        // failures already rendered as diagnostics only need the exit status
        if handler.num_errors() == 0 {
            return Err(err);
        }
        std::process::exit(1);
    }

    Ok(())
}

fn run(command: Command, handler: &mut DiagnosticHandler) -> anyhow::Result<()> {
    match command {
        Command::Translate { rules, output } => {
            let (filename, input) = read_input(&rules)?;
            let script = pipeline::translate(&filename, &input, handler)?;
            write_output(output.as_deref(), &script)?;
        }
        Command::Compile { script, output } => {
            let (filename, input) = read_input(&script)?;
            let document = pipeline::compile(&filename, &input, handler)?;
            write_output(output.as_deref(), &document)?;
        }
        Command::Build {
            rules,
            output,
            script,
        } => {
            let (filename, input) = read_input(&rules)?;
            let (script_text, document) = pipeline::build(&filename, &input, handler)?;
            if let Some(script) = script {
                write_output(Some(&script), &script_text)?;
            }
            write_output(output.as_deref(), &document)?;
        }
    }
    Ok(())
}
