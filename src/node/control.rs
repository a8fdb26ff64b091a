//! Control nodes: the success sink (`end`) and the failure convergence
//! point (`halt`). Both are bound to the pipeline's root process.

use crate::error::Result;
use crate::generator::GenerationContext;
use crate::ir::{Fragment, TaskDecl};
use crate::process::ProcessInfo;

use super::{derive_name, DagNode, NodeKind};

#[derive(Debug, Clone)]
pub struct ControlNode {
    kind: NodeKind,
    id: u32,
    label: String,
}

impl ControlNode {
    /// `kind` must be a control kind; checked by the graph builder
    pub(crate) fn new(kind: NodeKind, root: &ProcessInfo) -> Self {
        Self {
            kind,
            id: root.id(),
            label: root.process_name().to_string(),
        }
    }
}

impl DagNode for ControlNode {
    fn id(&self) -> u32 {
        self.id
    }

    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn name(&self) -> String {
        derive_name(self.kind.tag(), self.id, &self.label)
    }

    fn fragment(&self, _ctx: &GenerationContext<'_>) -> Result<Option<Fragment>> {
        Ok(Some(Fragment::declarations(vec![TaskDecl::dummy(self.ident())])))
    }
}
