//! Pipeline definition parsing and graph assembly
//!
//! ```yaml
//! dag_id: orders
//! processes:
//!   - id: 3
//!     parent_process_id: 0
//!     name: Orders
//!   - id: 5
//!     parent_process_id: 3
//!     name: List Files
//!     kind: lof
//!     next: 7
//!   - id: 7
//!     parent_process_id: 3
//!     name: Load Orders
//!     kind: data_quality
//! ```
//!
//! Every child process branches to `next` on success (the pipeline's `end`
//! node when omitted) and to the pipeline's `halt` node after failure.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, WgenError};
use crate::graph::{Graph, GraphBuilder, NodeRef};
use crate::node::{identifier, DagNode, NodeKind};
use crate::process::ProcessInfo;

#[derive(Debug, Clone, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub dag_id: Option<String>,
    pub processes: Vec<ProcessDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessDef {
    pub id: u32,
    #[serde(default)]
    pub parent_process_id: u32,
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    /// Success successor (process id)
    #[serde(default)]
    pub next: Option<u32>,
}

fn default_kind() -> String {
    NodeKind::Action.tag().to_string()
}

impl ProcessDef {
    pub fn info(&self) -> ProcessInfo {
        ProcessInfo::new(self.id, self.parent_process_id, self.name.clone())
    }
}

impl Pipeline {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// The single process with `parent_process_id: 0`
    pub fn root(&self) -> Result<&ProcessDef> {
        let mut roots = self.processes.iter().filter(|p| p.parent_process_id == 0);
        let root = roots.next().ok_or(WgenError::NoRootProcess)?;
        if let Some(second) = roots.next() {
            return Err(WgenError::MultipleRoots {
                first: root.id,
                second: second.id,
            });
        }
        Ok(root)
    }

    /// Explicit `dag_id`, or the root process name as an identifier
    pub fn dag_id(&self) -> Result<String> {
        match &self.dag_id {
            Some(id) => Ok(id.clone()),
            None => Ok(identifier(&self.root()?.name)),
        }
    }

    /// Build and wire the node graph
    pub fn to_graph(&self) -> Result<Graph> {
        let root = self.root()?.info();
        let mut builder = GraphBuilder::new();
        let mut refs: HashMap<u32, NodeRef> = HashMap::with_capacity(self.processes.len());

        for process in &self.processes {
            let kind: NodeKind = process.kind.parse()?;
            if kind.is_control() {
                return Err(WgenError::UnknownKind {
                    kind: process.kind.clone(),
                });
            }
            if process.parent_process_id != 0 && process.parent_process_id != root.id() {
                return Err(WgenError::UnknownProcess {
                    from: process.id,
                    target: process.parent_process_id,
                });
            }
            let node = builder.add_process(kind, process.info())?;
            if refs.insert(process.id, node).is_some() {
                return Err(WgenError::DuplicateProcess { id: process.id });
            }
        }

        let end = builder.add_control(NodeKind::End, &root)?;
        let halt = builder.add_control(NodeKind::Halt, &root)?;

        for process in self.processes.iter().filter(|p| p.parent_process_id != 0) {
            if process.next == Some(root.id()) {
                let name_of = |id: u32| {
                    builder
                        .get(refs[&id])
                        .map(|n| n.name())
                        .unwrap_or_default()
                };
                return Err(WgenError::RootTarget {
                    node: name_of(process.id),
                    target: name_of(root.id()),
                });
            }
            let successor = match process.next {
                Some(next) => *refs.get(&next).ok_or(WgenError::UnknownProcess {
                    from: process.id,
                    target: next,
                })?,
                None => end,
            };
            builder.wire(refs[&process.id], successor, halt)?;
        }

        debug!(processes = self.processes.len(), "assembled pipeline graph");
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDERS: &str = r#"
processes:
  - id: 3
    parent_process_id: 0
    name: Orders Pipeline
  - id: 5
    parent_process_id: 3
    name: List Files
    kind: lof
    next: 7
  - id: 7
    parent_process_id: 3
    name: Load Orders
    kind: data_quality
"#;

    #[test]
    fn dag_id_defaults_to_root_name() {
        let pipeline = Pipeline::from_yaml(ORDERS).unwrap();
        assert_eq!(pipeline.dag_id().unwrap(), "Orders_Pipeline");
    }

    #[test]
    fn graph_wires_next_and_end() {
        let graph = Pipeline::from_yaml(ORDERS).unwrap().to_graph().unwrap();
        let names: Vec<String> = graph.iter().map(|(_, n)| n.name()).collect();
        assert_eq!(
            names,
            [
                "action3_Orders_Pipeline",
                "lof5_List_Files",
                "data_quality7_Load_Orders",
                "end3_Orders_Pipeline",
                "halt3_Orders_Pipeline"
            ]
        );

        let dq = graph.iter().find(|(_, n)| n.id() == 7).unwrap().1.as_task().unwrap();
        let end = graph.find_peer(NodeKind::End).unwrap();
        let halt = graph.find_peer(NodeKind::Halt).unwrap();
        assert_eq!(dq.successor(), Some(end));
        assert_eq!(dq.terminal(), Some(halt));
        graph.validate().unwrap();
    }

    #[test]
    fn missing_root_is_rejected() {
        let pipeline = Pipeline::from_yaml(
            "processes:\n  - id: 5\n    parent_process_id: 3\n    name: a\n",
        )
        .unwrap();
        assert!(matches!(pipeline.to_graph(), Err(WgenError::NoRootProcess)));
    }

    #[test]
    fn two_roots_are_rejected() {
        let pipeline = Pipeline::from_yaml(
            "processes:\n  - id: 1\n    name: a\n  - id: 2\n    name: b\n",
        )
        .unwrap();
        assert!(matches!(
            pipeline.root(),
            Err(WgenError::MultipleRoots { first: 1, second: 2 })
        ));
    }

    #[test]
    fn unknown_next_is_rejected() {
        let pipeline = Pipeline::from_yaml(
            "processes:\n  - id: 1\n    name: a\n  - id: 2\n    parent_process_id: 1\n    name: b\n    next: 9\n",
        )
        .unwrap();
        assert!(matches!(
            pipeline.to_graph(),
            Err(WgenError::UnknownProcess { from: 2, target: 9 })
        ));
    }

    #[test]
    fn next_pointing_at_root_is_rejected() {
        let pipeline = Pipeline::from_yaml(
            "processes:\n  - id: 3\n    name: Orders\n  - id: 4\n    parent_process_id: 3\n    name: Pull\n    kind: import\n    next: 3\n",
        )
        .unwrap();
        assert!(matches!(
            pipeline.to_graph(),
            Err(WgenError::RootTarget { ref node, ref target })
                if node == "import4_Pull" && target == "action3_Orders"
        ));
    }

    #[test]
    fn root_kind_lof_does_not_satisfy_data_quality() {
        let pipeline = Pipeline::from_yaml(
            "processes:\n  - id: 3\n    name: Orders\n    kind: lof\n  - id: 7\n    parent_process_id: 3\n    name: Load Orders\n    kind: data_quality\n",
        )
        .unwrap();
        let err = pipeline.to_graph().unwrap().validate().unwrap_err();
        assert!(matches!(err, WgenError::MissingPeer { kind: "lof", .. }));
    }

    #[test]
    fn duplicate_process_ids_are_rejected() {
        let pipeline = Pipeline::from_yaml(
            "processes:\n  - id: 1\n    name: a\n  - id: 2\n    parent_process_id: 1\n    name: b\n  - id: 2\n    parent_process_id: 1\n    name: c\n",
        )
        .unwrap();
        assert!(matches!(
            pipeline.to_graph(),
            Err(WgenError::DuplicateProcess { id: 2 })
        ));
    }

    #[test]
    fn control_kinds_are_not_process_kinds() {
        let pipeline = Pipeline::from_yaml(
            "processes:\n  - id: 1\n    name: a\n  - id: 2\n    parent_process_id: 1\n    name: b\n    kind: halt\n",
        )
        .unwrap();
        assert!(matches!(pipeline.to_graph(), Err(WgenError::UnknownKind { .. })));
    }
}
