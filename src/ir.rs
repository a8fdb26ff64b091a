//! Structured records emitted by nodes, rendered by [`crate::render`]

use camino::Utf8PathBuf;

/// Script-level settings for the DAG declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DagHeader {
    pub dag_id: String,
    pub owner: String,
    pub schedule_interval: String,
    pub start_date: String,
}

/// Runtime function that merges the shared-state logs into one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLookup {
    pub fn_name: String,
    /// Read in order; later keys overwrite earlier ones
    pub sources: Vec<Utf8PathBuf>,
}

/// Value of a worker flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Literal(String),
    /// `prefix + state[key]`, resolved when the task runs
    Lookup { key: &'static str, prefix: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerArg {
    pub flag: &'static str,
    pub value: ArgValue,
}

impl WorkerArg {
    pub fn literal(flag: &'static str, value: impl ToString) -> Self {
        Self {
            flag,
            value: ArgValue::Literal(value.to_string()),
        }
    }

    pub fn lookup(flag: &'static str, key: &'static str, prefix: impl Into<String>) -> Self {
        Self {
            flag,
            value: ArgValue::Lookup {
                key,
                prefix: prefix.into(),
            },
        }
    }
}

/// External worker invocation, blocking, both output streams captured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    /// Program and its fixed leading arguments
    pub program: Vec<String>,
    pub args: Vec<WorkerArg>,
}

impl WorkerCommand {
    pub fn lookups(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.args.iter().filter_map(|arg| match &arg.value {
            ArgValue::Lookup { key, .. } => Some(*key),
            ArgValue::Literal(_) => None,
        })
    }
}

/// Callable that runs the worker and picks the next task by exit status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchCallable {
    pub fn_name: String,
    pub state_fn: String,
    pub command: WorkerCommand,
    /// Exit status 0
    pub on_success: String,
    /// Any other exit status
    pub on_failure: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Deferred edge registration, called once every task is declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WiringFn {
    pub fn_name: String,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    Branch { callable: String },
    Dummy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDecl {
    pub var: String,
    pub task_id: String,
    pub operator: Operator,
}

impl TaskDecl {
    pub fn dummy(ident: impl Into<String>) -> Self {
        let ident = ident.into();
        Self {
            var: ident.clone(),
            task_id: ident,
            operator: Operator::Dummy,
        }
    }

    pub fn branch(ident: impl Into<String>, callable: impl Into<String>) -> Self {
        let ident = ident.into();
        Self {
            var: ident.clone(),
            task_id: ident,
            operator: Operator::Branch {
                callable: callable.into(),
            },
        }
    }
}

/// Everything one node contributes, in render order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub lookup: Option<StateLookup>,
    pub callable: Option<BranchCallable>,
    pub wiring: Option<WiringFn>,
    pub tasks: Vec<TaskDecl>,
}

impl Fragment {
    /// Fragment that only declares tasks
    pub fn declarations(tasks: Vec<TaskDecl>) -> Self {
        Self {
            tasks,
            ..Self::default()
        }
    }
}
