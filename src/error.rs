//! Error types with fix suggestions
//!
//! Error code ranges:
//! - WGEN-000-009: Input errors (I/O, YAML, config)
//! - WGEN-010-019: Pipeline shape errors
//! - WGEN-020-029: Generation preconditions

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WgenError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum WgenError {
    #[error("WGEN-000: IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WGEN-001: YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("WGEN-002: Config error: {reason}")]
    Config { reason: String },

    // ─────────────────────────────────────────────────────────────
    // Pipeline shape (WGEN-010 to WGEN-019)
    // ─────────────────────────────────────────────────────────────

    #[error("WGEN-010: Pipeline has no root process (parent_process_id: 0)")]
    NoRootProcess,

    #[error("WGEN-011: Pipeline has more than one root process: {first} and {second}")]
    MultipleRoots { first: u32, second: u32 },

    #[error("WGEN-012: Process {from} references unknown process {target}")]
    UnknownProcess { from: u32, target: u32 },

    #[error("WGEN-013: Duplicate node name '{name}'")]
    DuplicateName { name: String },

    #[error("WGEN-014: Cycle in success chain: {path}")]
    Cycle { path: String },

    #[error("WGEN-015: Unknown node kind '{kind}'")]
    UnknownKind { kind: String },

    #[error("WGEN-016: Node '{node}' is already wired")]
    AlreadyWired { node: String },

    #[error("WGEN-017: Node '{node}' is not an action node")]
    NotAnAction { node: String },

    #[error("WGEN-018: Kind '{kind}' is not a control kind (end, halt)")]
    NotAControl { kind: String },

    #[error("WGEN-019: Duplicate process id {id}")]
    DuplicateProcess { id: u32 },

    // ─────────────────────────────────────────────────────────────
    // Generation preconditions (WGEN-020 to WGEN-029)
    // ─────────────────────────────────────────────────────────────

    #[error("WGEN-020: Node '{node}' requires a '{kind}' peer but none exists")]
    MissingPeer { node: String, kind: &'static str },

    #[error("WGEN-021: Node '{node}' has no success successor assigned")]
    MissingSuccessor { node: String },

    #[error("WGEN-022: Node '{node}' has no terminal node assigned")]
    MissingTerminal { node: String },

    #[error("WGEN-023: Node '{node}' branches to pipeline root '{target}', which declares no task")]
    RootTarget { node: String, target: String },
}

impl WgenError {
    /// Precondition violations abort the whole build
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            WgenError::MissingPeer { .. }
                | WgenError::MissingSuccessor { .. }
                | WgenError::MissingTerminal { .. }
                | WgenError::RootTarget { .. }
        )
    }
}

impl FixSuggestion for WgenError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            WgenError::Io(_) => Some("Check file path and permissions"),
            WgenError::YamlParse(_) => Some("Check YAML syntax: indentation and quoting"),
            WgenError::Config { .. } => Some("Fix or remove ~/.config/wgen/config.toml"),
            WgenError::NoRootProcess => {
                Some("Add the pipeline process itself with parent_process_id: 0")
            }
            WgenError::MultipleRoots { .. } => {
                Some("Keep exactly one process with parent_process_id: 0")
            }
            WgenError::UnknownProcess { .. } => {
                Some("Point next: at a process id declared in the same pipeline")
            }
            WgenError::DuplicateName { .. } => {
                Some("Rename one of the processes so their derived names differ")
            }
            WgenError::DuplicateProcess { .. } => Some("Use unique process ids"),
            WgenError::Cycle { .. } => Some("Remove the loop between next: references"),
            WgenError::UnknownKind { .. } => {
                Some("Use one of: import, lof, data_quality, action")
            }
            WgenError::AlreadyWired { .. } => Some("Wire each node exactly once"),
            WgenError::NotAnAction { .. } => {
                Some("Only import, lof, data_quality and action nodes take a successor")
            }
            WgenError::NotAControl { .. } => Some("Use add_process for action kinds"),
            WgenError::MissingPeer { .. } => {
                Some("Add a list-of-files (kind: lof) step to the pipeline")
            }
            WgenError::MissingSuccessor { .. } | WgenError::MissingTerminal { .. } => {
                Some("Wire the node before generating (GraphBuilder::wire)")
            }
            WgenError::RootTarget { .. } => {
                Some("Point next: at a child process, or omit it to finish the pipeline")
            }
        }
    }
}
