//! Shared-state logs written by tasks at run time
//!
//! Each file is a newline-delimited list of `key::value` records. Only the
//! first `::` separates key from value, so values may contain `::` themselves.
//! Generated code merges the parent-scoped log and the shared driver log into
//! one table; [`SharedState`] performs the same merge for inspection.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, BufReader};

use camino::Utf8Path;
use tracing::debug;

use crate::error::Result;

/// Written by the list-of-files step, read by data-quality
pub const FILE_LIST_KEY: &str = "getETLDriverInfo.getFileList()";

/// Written when a pipeline instance starts
pub const INSTANCE_EXEC_ID_KEY: &str = "initJobInfo.getInstanceExecId()";

/// Record separator
pub const SEPARATOR: &str = "::";

/// Split one record; `None` when the line has no separator
pub fn parse_record(line: &str) -> Option<(&str, &str)> {
    line.trim_end_matches(['\n', '\r']).split_once(SEPARATOR)
}

/// Merged key/value table; later records win
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedState {
    entries: BTreeMap<String, String>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `paths` in order, skipping files that don't exist yet
    pub fn load<P: AsRef<Utf8Path>>(paths: &[P]) -> Result<Self> {
        let mut state = Self::new();
        for path in paths {
            let path = path.as_ref();
            match fs::File::open(path) {
                Ok(file) => state.merge(BufReader::new(file))?,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(path = %path, "shared state log not found, skipping");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(state)
    }

    /// Merge every record of `reader`
    pub fn merge<R: BufRead>(&mut self, reader: R) -> Result<()> {
        for line in reader.lines() {
            let line = line?;
            if let Some((key, value)) = parse_record(&line) {
                self.entries.insert(key.to_string(), value.to_string());
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
