//! Generation pass
//!
//! Validates the graph, then renders the header and every node in traversal
//! order. Any precondition failure aborts the build before text is returned.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, info, warn};

use crate::config::{DagConfig, RuntimeLayout};
use crate::error::Result;
use crate::graph::Graph;
use crate::ir::DagHeader;
use crate::node::{DagNode, NodeKey};
use crate::registry::DefinitionSink;
use crate::render::{AirflowRenderer, Render};

/// Everything a node sees while generating
pub struct GenerationContext<'a> {
    graph: &'a Graph,
    layout: &'a RuntimeLayout,
    renderer: &'a dyn Render,
    sink: &'a dyn DefinitionSink,
    dropped: AtomicUsize,
}

impl<'a> GenerationContext<'a> {
    pub fn new(
        graph: &'a Graph,
        layout: &'a RuntimeLayout,
        renderer: &'a dyn Render,
        sink: &'a dyn DefinitionSink,
    ) -> Self {
        Self {
            graph,
            layout,
            renderer,
            sink,
            dropped: AtomicUsize::new(0),
        }
    }

    pub fn graph(&self) -> &'a Graph {
        self.graph
    }

    pub fn layout(&self) -> &'a RuntimeLayout {
        self.layout
    }

    pub fn renderer(&self) -> &'a dyn Render {
        self.renderer
    }

    /// Best effort: a failed record is logged and counted, never returned
    pub fn register(&self, key: NodeKey, statement: &str) {
        match self.sink.record(key, statement) {
            Ok(()) => debug!(?key, statement, "registered definition"),
            Err(e) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(?key, statement, error = %e, "failed to register definition");
            }
        }
    }

    /// Registrations lost to sink failures so far
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Result of one build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    pub script: String,
    pub nodes: usize,
    pub dropped_registrations: usize,
}

pub struct Generator {
    layout: RuntimeLayout,
    dag: DagConfig,
    renderer: Box<dyn Render>,
}

impl Generator {
    /// Generator emitting Airflow Python
    pub fn new(layout: RuntimeLayout, dag: DagConfig) -> Self {
        Self::with_renderer(layout, dag, Box::new(AirflowRenderer))
    }

    pub fn with_renderer(layout: RuntimeLayout, dag: DagConfig, renderer: Box<dyn Render>) -> Self {
        Self {
            layout,
            dag,
            renderer,
        }
    }

    pub fn layout(&self) -> &RuntimeLayout {
        &self.layout
    }

    /// Render `graph` as one script, registering wiring calls with `sink`
    pub fn build(&self, dag_id: &str, graph: &Graph, sink: &dyn DefinitionSink) -> Result<BuildOutput> {
        graph.validate()?;
        let order = graph.traversal()?;

        let ctx = GenerationContext::new(graph, &self.layout, self.renderer.as_ref(), sink);
        let mut script = self.renderer.header(&DagHeader {
            dag_id: dag_id.to_string(),
            owner: self.dag.owner.clone(),
            schedule_interval: self.dag.schedule_interval.clone(),
            start_date: self.dag.start_date.clone(),
        });

        for node in order.iter().filter_map(|r| graph.get(*r)) {
            script.push_str(&node.generate(&ctx)?);
        }

        let dropped = ctx.dropped();
        if dropped > 0 {
            warn!(dropped, "some definitions were not registered");
        }
        info!(dag_id, nodes = order.len(), "generated workflow");

        Ok(BuildOutput {
            script,
            nodes: order.len(),
            dropped_registrations: dropped,
        })
    }

    /// Script followed by the registered wiring calls
    pub fn assemble(&self, output: &BuildOutput, registrations: &[String]) -> String {
        let mut script = output.script.clone();
        script.push_str(&self.renderer.trailer(registrations));
        script
    }
}
