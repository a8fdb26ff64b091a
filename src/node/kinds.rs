//! Per-kind behavior of action nodes

use crate::ir::WorkerArg;
use crate::process::ProcessInfo;
use crate::shared_state::{FILE_LIST_KEY, INSTANCE_EXEC_ID_KEY};

use super::NodeKind;

/// What differs between action kinds; the branching protocol is shared
pub trait ActionKind: Send + Sync {
    fn kind(&self) -> NodeKind;

    /// Peer that must exist in the graph before this node can be generated
    fn required_peer(&self) -> Option<NodeKind> {
        None
    }

    /// Flags passed to the worker after the program
    fn worker_args(&self, process: &ProcessInfo) -> Vec<WorkerArg>;
}

/// Loads data for the current run
pub struct Import;

/// Lists the files a run will process
pub struct ListOfFiles;

/// Checks the listed files and stages good records under `/raw/<instance>`
pub struct DataQuality;

/// Runs a worker with only its process id
pub struct GenericAction;

impl ActionKind for Import {
    fn kind(&self) -> NodeKind {
        NodeKind::Import
    }

    fn worker_args(&self, process: &ProcessInfo) -> Vec<WorkerArg> {
        vec![
            WorkerArg::literal("--process-id", process.id()),
            WorkerArg::lookup("--instance-exec-id", INSTANCE_EXEC_ID_KEY, ""),
        ]
    }
}

impl ActionKind for ListOfFiles {
    fn kind(&self) -> NodeKind {
        NodeKind::Lof
    }

    fn worker_args(&self, process: &ProcessInfo) -> Vec<WorkerArg> {
        vec![
            WorkerArg::literal("--process-id", process.id()),
            WorkerArg::literal("--parent-process-id", process.parent_process_id()),
        ]
    }
}

impl ActionKind for DataQuality {
    fn kind(&self) -> NodeKind {
        NodeKind::DataQuality
    }

    fn required_peer(&self) -> Option<NodeKind> {
        Some(NodeKind::Lof)
    }

    fn worker_args(&self, process: &ProcessInfo) -> Vec<WorkerArg> {
        vec![
            WorkerArg::literal("--process-id", process.id()),
            WorkerArg::lookup("--source-file-path", FILE_LIST_KEY, ""),
            WorkerArg::lookup("--destination-directory", INSTANCE_EXEC_ID_KEY, "/raw/"),
        ]
    }
}

impl ActionKind for GenericAction {
    fn kind(&self) -> NodeKind {
        NodeKind::Action
    }

    fn worker_args(&self, process: &ProcessInfo) -> Vec<WorkerArg> {
        vec![WorkerArg::literal("--process-id", process.id())]
    }
}

pub(super) fn behavior(kind: NodeKind) -> Option<&'static dyn ActionKind> {
    match kind {
        NodeKind::Import => Some(&Import),
        NodeKind::Lof => Some(&ListOfFiles),
        NodeKind::DataQuality => Some(&DataQuality),
        NodeKind::Action => Some(&GenericAction),
        NodeKind::End | NodeKind::Halt => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ArgValue;

    #[test]
    fn behavior_matches_its_kind() {
        for kind in [
            NodeKind::Import,
            NodeKind::Lof,
            NodeKind::DataQuality,
            NodeKind::Action,
        ] {
            assert_eq!(behavior(kind).unwrap().kind(), kind);
        }
    }

    #[test]
    fn data_quality_reads_file_list_and_instance() {
        let args = DataQuality.worker_args(&ProcessInfo::new(7, 3, "Load Orders"));
        let flags: Vec<_> = args.iter().map(|a| a.flag).collect();
        assert_eq!(
            flags,
            ["--process-id", "--source-file-path", "--destination-directory"]
        );
        assert_eq!(args[0].value, ArgValue::Literal("7".into()));
        assert_eq!(
            args[2].value,
            ArgValue::Lookup {
                key: INSTANCE_EXEC_ID_KEY,
                prefix: "/raw/".into()
            }
        );
        assert_eq!(DataQuality.required_peer(), Some(NodeKind::Lof));
    }

    #[test]
    fn only_data_quality_needs_a_peer() {
        assert!(Import.required_peer().is_none());
        assert!(ListOfFiles.required_peer().is_none());
        assert!(GenericAction.required_peer().is_none());
    }
}
