//! DAG nodes
//!
//! Every node reports an id, a derived name and a text fragment for the
//! generated script. Action nodes (`import`, `lof`, `data_quality`, `action`)
//! are bound to a [`ProcessInfo`] and follow the branching protocol in
//! [`task`]; control nodes (`end`, `halt`) only declare a no-op task.

pub mod control;
pub mod kinds;
pub mod name;
pub mod task;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WgenError};
use crate::generator::GenerationContext;
use crate::ir::Fragment;

pub use control::ControlNode;
pub use kinds::ActionKind;
pub use name::{derive_name, identifier, MAX_NAME_LEN};
pub use task::TaskNode;

/// Node kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Import,
    Lof,
    DataQuality,
    Action,
    End,
    Halt,
}

impl NodeKind {
    /// Prefix used in derived names
    pub fn tag(self) -> &'static str {
        match self {
            NodeKind::Import => "import",
            NodeKind::Lof => "lof",
            NodeKind::DataQuality => "data_quality",
            NodeKind::Action => "action",
            NodeKind::End => "end",
            NodeKind::Halt => "halt",
        }
    }

    pub fn is_control(self) -> bool {
        matches!(self, NodeKind::End | NodeKind::Halt)
    }

    /// Kind-specific behavior for action kinds
    pub fn action(self) -> Option<&'static dyn ActionKind> {
        kinds::behavior(self)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for NodeKind {
    type Err = WgenError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "import" => Ok(NodeKind::Import),
            "lof" => Ok(NodeKind::Lof),
            "data_quality" => Ok(NodeKind::DataQuality),
            "action" => Ok(NodeKind::Action),
            "end" => Ok(NodeKind::End),
            "halt" => Ok(NodeKind::Halt),
            other => Err(WgenError::UnknownKind {
                kind: other.to_string(),
            }),
        }
    }
}

/// Node identity: control nodes share the root process id, so the kind is
/// part of the key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    pub kind: NodeKind,
    pub id: u32,
}

/// Capability shared by every node in the graph
pub trait DagNode {
    fn id(&self) -> u32;

    fn kind(&self) -> NodeKind;

    /// Derived name, recomputed on every call
    fn name(&self) -> String;

    /// Structured contribution to the script; `None` for inert nodes
    fn fragment(&self, ctx: &GenerationContext<'_>) -> Result<Option<Fragment>>;

    fn key(&self) -> NodeKey {
        NodeKey {
            kind: self.kind(),
            id: self.id(),
        }
    }

    /// Name as it appears in generated code
    fn ident(&self) -> String {
        identifier(&self.name())
    }

    /// Render the fragment and record its wiring registration
    ///
    /// The returned text is the same on every call. The registration goes
    /// through the context's sink, which decides whether repeats are kept.
    fn generate(&self, ctx: &GenerationContext<'_>) -> Result<String> {
        let Some(fragment) = self.fragment(ctx)? else {
            return Ok(String::new());
        };

        let text = ctx.renderer().fragment(&fragment);
        if let Some(wiring) = &fragment.wiring {
            ctx.register(self.key(), &ctx.renderer().registration(wiring));
        }
        Ok(text)
    }
}

/// Any node stored in a [`crate::graph::Graph`]
#[derive(Debug, Clone)]
pub enum Node {
    Task(TaskNode),
    Control(ControlNode),
}

impl Node {
    pub fn as_task(&self) -> Option<&TaskNode> {
        match self {
            Node::Task(task) => Some(task),
            Node::Control(_) => None,
        }
    }

    /// The pipeline process itself; generates nothing
    pub fn is_root(&self) -> bool {
        self.as_task().is_some_and(|task| task.process().is_root())
    }
}

impl DagNode for Node {
    fn id(&self) -> u32 {
        match self {
            Node::Task(n) => n.id(),
            Node::Control(n) => n.id(),
        }
    }

    fn kind(&self) -> NodeKind {
        match self {
            Node::Task(n) => n.kind(),
            Node::Control(n) => n.kind(),
        }
    }

    fn name(&self) -> String {
        match self {
            Node::Task(n) => n.name(),
            Node::Control(n) => n.name(),
        }
    }

    fn fragment(&self, ctx: &GenerationContext<'_>) -> Result<Option<Fragment>> {
        match self {
            Node::Task(n) => n.fragment(ctx),
            Node::Control(n) => n.fragment(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_its_tag() {
        for kind in [
            NodeKind::Import,
            NodeKind::Lof,
            NodeKind::DataQuality,
            NodeKind::Action,
            NodeKind::End,
            NodeKind::Halt,
        ] {
            assert_eq!(kind.tag().parse::<NodeKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = "sqoop".parse::<NodeKind>().unwrap_err();
        assert!(matches!(err, WgenError::UnknownKind { .. }));
    }

    #[test]
    fn only_action_kinds_have_behavior() {
        assert!(NodeKind::DataQuality.action().is_some());
        assert!(NodeKind::Halt.action().is_none());
        assert!(NodeKind::End.is_control());
    }
}
