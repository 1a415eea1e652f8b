// Copyright 2025 Cornell University
// released under MIT License

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;

/// A destination for generated text, addressed by name
pub trait Sink {
    fn write_text(&mut self, name: &str, text: &str) -> std::io::Result<()>;
}

/// Writes each named output to a file below `root`
#[derive(Debug, Clone)]
pub struct FileSink {
    root: PathBuf,
}

impl FileSink {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl Sink for FileSink {
    fn write_text(&mut self, name: &str, text: &str) -> std::io::Result<()> {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, text)?;
        info!("wrote {}", path.display());
        Ok(())
    }
}

/// Ignores the name and prints to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn write_text(&mut self, _name: &str, text: &str) -> std::io::Result<()> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        if !text.ends_with('\n') {
            writeln!(stdout)?;
        }
        stdout.flush()
    }
}
