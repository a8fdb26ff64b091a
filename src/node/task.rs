//! Action node bound to a process
//!
//! Root processes are inert. Every other action node generates:
//! 1. a state lookup function over the parent-scoped and shared logs
//! 2. a branch callable running the worker (exit 0 -> successor, else dummy)
//! 3. a wiring function: node -> successor, node -> dummy, dummy -> terminal
//! 4. the branch task and its dummy fallback task
//!
//! and registers the wiring function with the definitions sink.

use tracing::debug;

use crate::error::{Result, WgenError};
use crate::generator::GenerationContext;
use crate::graph::{Graph, NodeRef};
use crate::ir::{BranchCallable, Edge, Fragment, StateLookup, TaskDecl, WiringFn, WorkerCommand};
use crate::process::ProcessInfo;

use super::{derive_name, ActionKind, DagNode, Node, NodeKind};

/// Prefix of the fallback task taken when the worker fails
pub const DUMMY_PREFIX: &str = "dummy_";

#[derive(Debug, Clone)]
pub struct TaskNode {
    kind: NodeKind,
    process: ProcessInfo,
    successor: Option<NodeRef>,
    terminal: Option<NodeRef>,
}

impl TaskNode {
    /// `kind` must be an action kind; checked by the graph builder
    pub(crate) fn new(kind: NodeKind, process: ProcessInfo) -> Self {
        Self {
            kind,
            process,
            successor: None,
            terminal: None,
        }
    }

    pub fn process(&self) -> &ProcessInfo {
        &self.process
    }

    pub fn successor(&self) -> Option<NodeRef> {
        self.successor
    }

    pub fn terminal(&self) -> Option<NodeRef> {
        self.terminal
    }

    pub(crate) fn set_successor(&mut self, successor: NodeRef) -> Result<()> {
        if self.successor.is_some() {
            return Err(WgenError::AlreadyWired { node: self.name() });
        }
        self.successor = Some(successor);
        Ok(())
    }

    pub(crate) fn set_terminal(&mut self, terminal: NodeRef) -> Result<()> {
        if self.terminal.is_some() {
            return Err(WgenError::AlreadyWired { node: self.name() });
        }
        self.terminal = Some(terminal);
        Ok(())
    }

    pub fn behavior(&self) -> Option<&'static dyn ActionKind> {
        self.kind.action()
    }

    /// Fallback task name for this node
    pub fn dummy_ident(&self) -> String {
        format!("{}{}", DUMMY_PREFIX, self.ident())
    }

    /// Resolve the required peer, successor and terminal of a non-root node
    fn resolve<'g>(&self, graph: &'g Graph) -> Result<(&'g Node, &'g Node)> {
        if let Some(peer) = self.behavior().and_then(|b| b.required_peer()) {
            if graph.find_peer(peer).is_none() {
                return Err(WgenError::MissingPeer {
                    node: self.name(),
                    kind: peer.tag(),
                });
            }
        }
        let successor = self
            .successor
            .and_then(|r| graph.get(r))
            .ok_or_else(|| WgenError::MissingSuccessor { node: self.name() })?;
        let terminal = self
            .terminal
            .and_then(|r| graph.get(r))
            .ok_or_else(|| WgenError::MissingTerminal { node: self.name() })?;
        for target in [successor, terminal] {
            if target.is_root() {
                return Err(WgenError::RootTarget {
                    node: self.name(),
                    target: target.name(),
                });
            }
        }
        Ok((successor, terminal))
    }

    /// Fail the same way `fragment` would, without building anything
    pub(crate) fn check_preconditions(&self, graph: &Graph) -> Result<()> {
        if self.process.is_root() {
            return Ok(());
        }
        self.resolve(graph).map(|_| ())
    }
}

impl DagNode for TaskNode {
    fn id(&self) -> u32 {
        self.process.id()
    }

    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn name(&self) -> String {
        derive_name(self.kind.tag(), self.process.id(), self.process.process_name())
    }

    fn fragment(&self, ctx: &GenerationContext<'_>) -> Result<Option<Fragment>> {
        if self.process.is_root() {
            return Ok(None);
        }
        let (successor, terminal) = self.resolve(ctx.graph())?;

        let ident = self.ident();
        let dummy = self.dummy_ident();
        let layout = ctx.layout();
        let args = self
            .behavior()
            .map(|b| b.worker_args(&self.process))
            .unwrap_or_default();

        let lookup = StateLookup {
            fn_name: format!("{ident}_state"),
            sources: vec![
                layout.job_info_path(self.process.parent_process_id()),
                layout.driver_info_path(),
            ],
        };

        let callable = BranchCallable {
            fn_name: format!("{ident}_pc"),
            state_fn: lookup.fn_name.clone(),
            command: WorkerCommand {
                program: layout.worker_program(self.kind),
                args,
            },
            on_success: successor.ident(),
            on_failure: dummy.clone(),
        };

        let wiring = WiringFn {
            fn_name: format!("f_{ident}"),
            edges: vec![
                Edge::new(&ident, successor.ident()),
                Edge::new(&ident, &dummy),
                Edge::new(&dummy, terminal.ident()),
            ],
        };

        debug!(node = %ident, successor = %callable.on_success, "generated branching node");

        Ok(Some(Fragment {
            tasks: vec![
                TaskDecl::branch(&ident, &callable.fn_name),
                TaskDecl::dummy(&dummy),
            ],
            lookup: Some(lookup),
            callable: Some(callable),
            wiring: Some(wiring),
        }))
    }
}
