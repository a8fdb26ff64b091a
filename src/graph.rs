//! Node graph, built in two phases
//!
//! [`GraphBuilder`] collects nodes and assigns successor/terminal references
//! (each at most once). [`GraphBuilder::build`] freezes it into a [`Graph`],
//! which is read-only from then on.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{Result, WgenError};
use crate::node::{ControlNode, DagNode, Node, NodeKind, TaskNode};
use crate::process::ProcessInfo;

/// Index of a node in the graph that created it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(usize);

impl NodeRef {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action node for `process`
    pub fn add_process(&mut self, kind: NodeKind, process: ProcessInfo) -> Result<NodeRef> {
        if kind.is_control() {
            return Err(WgenError::NotAnAction {
                node: crate::node::derive_name(kind.tag(), process.id(), process.process_name()),
            });
        }
        Ok(self.push(Node::Task(TaskNode::new(kind, process))))
    }

    /// Add an `end` or `halt` node bound to the root process
    pub fn add_control(&mut self, kind: NodeKind, root: &ProcessInfo) -> Result<NodeRef> {
        if !kind.is_control() {
            return Err(WgenError::NotAControl {
                kind: kind.to_string(),
            });
        }
        Ok(self.push(Node::Control(ControlNode::new(kind, root))))
    }

    /// Assign both references of an action node, or neither
    pub fn wire(&mut self, node: NodeRef, successor: NodeRef, terminal: NodeRef) -> Result<()> {
        let task = self.task_mut(node)?;
        if task.successor().is_some() || task.terminal().is_some() {
            return Err(WgenError::AlreadyWired { node: task.name() });
        }
        task.set_successor(successor)?;
        task.set_terminal(terminal)
    }

    pub fn set_successor(&mut self, node: NodeRef, successor: NodeRef) -> Result<()> {
        self.task_mut(node)?.set_successor(successor)
    }

    pub fn set_terminal(&mut self, node: NodeRef, terminal: NodeRef) -> Result<()> {
        self.task_mut(node)?.set_terminal(terminal)
    }

    #[inline]
    pub fn get(&self, node: NodeRef) -> Option<&Node> {
        self.nodes.get(node.0)
    }

    pub fn build(self) -> Graph {
        Graph { nodes: self.nodes }
    }

    fn push(&mut self, node: Node) -> NodeRef {
        self.nodes.push(node);
        NodeRef(self.nodes.len() - 1)
    }

    fn task_mut(&mut self, node: NodeRef) -> Result<&mut TaskNode> {
        match self.nodes.get_mut(node.0) {
            Some(Node::Task(task)) => Ok(task),
            Some(other) => Err(WgenError::NotAnAction { node: other.name() }),
            None => Err(WgenError::NotAnAction {
                node: format!("#{}", node.0),
            }),
        }
    }
}

/// Frozen node set
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn get(&self, node: NodeRef) -> Option<&Node> {
        self.nodes.get(node.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeRef, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeRef(i), n))
    }

    /// First node of `kind` that generates a task, in insertion order
    ///
    /// Root processes never run, so they never count as a peer.
    pub fn find_peer(&self, kind: NodeKind) -> Option<NodeRef> {
        self.iter()
            .find(|(_, node)| node.kind() == kind && !node.is_root())
            .map(|(r, _)| r)
    }

    /// Check every generation precondition up front
    ///
    /// Rejects duplicate identifiers, unwired action nodes, missing required
    /// peers and cycles in the success chain.
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashSet<String> = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let ident = node.ident();
            if !seen.insert(ident.clone()) {
                return Err(WgenError::DuplicateName { name: ident });
            }
        }

        for task in self.nodes.iter().filter_map(Node::as_task) {
            task.check_preconditions(self)?;
        }

        self.traversal().map(|_| ())
    }

    /// Generation order: root processes, then action nodes ordered along the
    /// success chain, then control nodes
    pub fn traversal(&self) -> Result<Vec<NodeRef>> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut actions: Vec<NodeRef> = Vec::new();
        let mut controls: Vec<NodeRef> = Vec::new();

        for (r, node) in self.iter() {
            match node {
                node if node.is_root() => order.push(r),
                Node::Task(_) => actions.push(r),
                Node::Control(_) => controls.push(r),
            }
        }

        let is_action: HashSet<NodeRef> = actions.iter().copied().collect();
        let mut in_degree: HashMap<NodeRef, usize> = actions.iter().map(|r| (*r, 0)).collect();
        for r in &actions {
            if let Some(next) = self.action_successor(*r, &is_action) {
                *in_degree.entry(next).or_default() += 1;
            }
        }

        let mut queue: VecDeque<NodeRef> =
            actions.iter().copied().filter(|r| in_degree[r] == 0).collect();
        let mut visited = 0;

        while let Some(current) = queue.pop_front() {
            order.push(current);
            visited += 1;
            if let Some(next) = self.action_successor(current, &is_action) {
                if let Some(degree) = in_degree.get_mut(&next) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(next);
                    }
                }
            }
        }

        if visited < actions.len() {
            let path = actions
                .iter()
                .filter(|r| in_degree[*r] > 0)
                .filter_map(|r| self.get(*r))
                .map(|n| n.name())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(WgenError::Cycle { path });
        }

        order.extend(controls);
        Ok(order)
    }

    fn action_successor(&self, node: NodeRef, actions: &HashSet<NodeRef>) -> Option<NodeRef> {
        self.get(node)
            .and_then(Node::as_task)
            .and_then(|t| t.successor())
            .filter(|next| actions.contains(next))
    }
}
