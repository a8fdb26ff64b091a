//! wgen - workflow DAG generator for orchestration engines

pub mod config;
pub mod error;
pub mod generator;
pub mod graph;
pub mod ir;
pub mod node;
pub mod pipeline;
pub mod process;
pub mod registry;
pub mod render;
pub mod shared_state;

pub use config::{GeneratorConfig, RegistryMode, RuntimeLayout};
pub use error::{FixSuggestion, Result, WgenError};
pub use generator::{BuildOutput, GenerationContext, Generator};
pub use graph::{Graph, GraphBuilder, NodeRef};
pub use node::{DagNode, Node, NodeKey, NodeKind};
pub use pipeline::Pipeline;
pub use process::ProcessInfo;
pub use registry::{AppendFile, DefinitionSink, DefinitionsRegistry};
pub use render::{AirflowRenderer, Render};
pub use shared_state::SharedState;
