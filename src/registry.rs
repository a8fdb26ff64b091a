//! Definitions registry
//!
//! Branching nodes register a wiring call (`f_<name>()`) that a later
//! assembly pass runs once every task is declared. Two sinks:
//! - [`DefinitionsRegistry`]: in memory, one entry per node, written once
//! - [`AppendFile`]: appends on every call, repeats included

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use tracing::debug;

use crate::node::NodeKey;

/// Destination for registration statements, shared across a build
pub trait DefinitionSink: Send + Sync {
    fn record(&self, key: NodeKey, statement: &str) -> io::Result<()>;
}

#[derive(Debug, Default)]
struct Entries {
    seen: HashSet<NodeKey>,
    statements: Vec<String>,
}

/// Deduplicating in-memory registry
#[derive(Debug, Default)]
pub struct DefinitionsRegistry {
    entries: Mutex<Entries>,
}

impl DefinitionsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Statements in first-registration order
    pub fn statements(&self) -> Vec<String> {
        self.entries.lock().statements.clone()
    }

    /// Append every statement to `path` in a single write
    ///
    /// Returns the number of statements written.
    pub fn flush(&self, path: &Utf8Path) -> io::Result<usize> {
        let entries = self.entries.lock();
        if entries.statements.is_empty() {
            return Ok(0);
        }

        let mut buf = String::new();
        for statement in &entries.statements {
            buf.push_str(statement);
            buf.push('\n');
        }

        let mut file = open_append(path)?;
        file.write_all(buf.as_bytes())?;
        file.flush()?;
        debug!(path = %path, count = entries.statements.len(), "flushed definitions");
        Ok(entries.statements.len())
    }
}

impl DefinitionSink for DefinitionsRegistry {
    fn record(&self, key: NodeKey, statement: &str) -> io::Result<()> {
        let mut entries = self.entries.lock();
        if entries.seen.insert(key) {
            entries.statements.push(statement.to_string());
        } else {
            debug!(?key, "definition already registered");
        }
        Ok(())
    }
}

/// Streams every registration straight to a file
#[derive(Debug)]
pub struct AppendFile {
    path: Utf8PathBuf,
    lock: Mutex<()>,
}

impl AppendFile {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl DefinitionSink for AppendFile {
    fn record(&self, _key: NodeKey, statement: &str) -> io::Result<()> {
        let _guard = self.lock.lock();
        let mut file = open_append(&self.path)?;
        writeln!(file, "{}", statement)
    }
}

fn open_append(path: &Utf8Path) -> io::Result<fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    fn key(id: u32) -> NodeKey {
        NodeKey {
            kind: NodeKind::DataQuality,
            id,
        }
    }

    #[test]
    fn registry_keeps_one_entry_per_node() {
        let registry = DefinitionsRegistry::new();
        registry.record(key(7), "f_a()").unwrap();
        registry.record(key(7), "f_a()").unwrap();
        registry.record(key(8), "f_b()").unwrap();

        assert_eq!(registry.statements(), vec!["f_a()", "f_b()"]);
    }

    #[test]
    fn flush_appends_in_one_pass() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("nested/defFile.txt")).unwrap();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "f_existing()\n").unwrap();

        let registry = DefinitionsRegistry::new();
        registry.record(key(1), "f_one()").unwrap();
        registry.record(key(2), "f_two()").unwrap();

        assert_eq!(registry.flush(&path).unwrap(), 2);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "f_existing()\nf_one()\nf_two()\n"
        );
    }

    #[test]
    fn empty_registry_does_not_touch_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("defFile.txt")).unwrap();
        assert_eq!(DefinitionsRegistry::new().flush(&path).unwrap(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn append_file_keeps_repeats() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("defFile.txt")).unwrap();
        let sink = AppendFile::new(path.clone());
        sink.record(key(7), "f_a()").unwrap();
        sink.record(key(7), "f_a()").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "f_a()\nf_a()\n");
    }
}
