//! Process metadata for one pipeline step

use serde::{Deserialize, Serialize};

/// Immutable description of a pipeline step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    id: u32,
    parent_process_id: u32,
    process_name: String,
}

impl ProcessInfo {
    pub fn new(id: u32, parent_process_id: u32, process_name: impl Into<String>) -> Self {
        Self {
            id,
            parent_process_id,
            process_name: process_name.into(),
        }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn parent_process_id(&self) -> u32 {
        self.parent_process_id
    }

    #[inline]
    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    /// A process without a parent is the pipeline itself
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent_process_id == 0
    }
}
