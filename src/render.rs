//! Renderers turning [`crate::ir`] records into orchestration source text

use crate::ir::{
    ArgValue, BranchCallable, DagHeader, Fragment, Operator, StateLookup, TaskDecl, WiringFn,
    WorkerCommand,
};

/// Target syntax for the generated script
pub trait Render: Send + Sync {
    /// Imports and DAG declaration
    fn header(&self, header: &DagHeader) -> String;

    /// One node's contribution
    fn fragment(&self, fragment: &Fragment) -> String;

    /// Statement registered for a wiring function
    fn registration(&self, wiring: &WiringFn) -> String;

    /// Assembly section running the registered statements
    fn trailer(&self, registrations: &[String]) -> String;
}

/// Airflow 1.x Python DAG files, tab indented
#[derive(Debug, Clone, Copy, Default)]
pub struct AirflowRenderer;

impl AirflowRenderer {
    fn lookup(&self, out: &mut String, lookup: &StateLookup) {
        let sources = lookup
            .sources
            .iter()
            .map(|p| py_str(p.as_str()))
            .collect::<Vec<_>>()
            .join(", ");

        out.push_str(&format!("def {}():\n", lookup.fn_name));
        out.push_str("\tstate = {}\n");
        out.push_str(&format!("\tfor path in [{}]:\n", sources));
        out.push_str("\t\tif not os.path.exists(path):\n");
        out.push_str("\t\t\tcontinue\n");
        out.push_str("\t\twith open(path) as log:\n");
        out.push_str("\t\t\tfor line in log:\n");
        out.push_str("\t\t\t\tkey, sep, value = line.rstrip('\\r\\n').partition('::')\n");
        out.push_str("\t\t\t\tif sep:\n");
        out.push_str("\t\t\t\t\tstate[key] = value\n");
        out.push_str("\treturn state\n\n");
    }

    fn callable(&self, out: &mut String, callable: &BranchCallable) {
        out.push_str(&format!("def {}():\n", callable.fn_name));
        out.push_str(&format!("\tstate = {}()\n", callable.state_fn));
        out.push_str(&format!("\tcommand = {}\n", command_list(&callable.command)));
        out.push_str(
            "\tworker = subprocess.Popen(command, stdout=subprocess.PIPE, stderr=subprocess.PIPE)\n",
        );
        out.push_str("\tout, err = worker.communicate()\n");
        out.push_str("\tprint('out is ', out)\n");
        out.push_str("\tprint('err is ', err)\n");
        out.push_str("\tif worker.returncode != 0:\n");
        out.push_str(&format!("\t\treturn {}\n", py_str(&callable.on_failure)));
        out.push_str(&format!("\treturn {}\n\n", py_str(&callable.on_success)));
    }

    fn wiring(&self, out: &mut String, wiring: &WiringFn) {
        out.push_str(&format!("def {}():\n", wiring.fn_name));
        for edge in &wiring.edges {
            out.push_str(&format!("\t{}.set_downstream({})\n", edge.from, edge.to));
        }
        out.push('\n');
    }

    fn task(&self, out: &mut String, task: &TaskDecl) {
        match &task.operator {
            Operator::Branch { callable } => out.push_str(&format!(
                "{} = BranchPythonOperator(task_id={}, python_callable={}, dag=dag)\n",
                task.var,
                py_str(&task.task_id),
                callable
            )),
            Operator::Dummy => out.push_str(&format!(
                "{} = DummyOperator(task_id={}, dag=dag)\n",
                task.var,
                py_str(&task.task_id)
            )),
        }
    }
}

impl Render for AirflowRenderer {
    fn header(&self, header: &DagHeader) -> String {
        let mut out = String::new();
        out.push_str("# Generated by wgen. Do not edit.\n");
        out.push_str("import os\n");
        out.push_str("import subprocess\n");
        out.push_str("from datetime import datetime\n\n");
        out.push_str("from airflow import DAG\n");
        out.push_str("from airflow.operators.dummy_operator import DummyOperator\n");
        out.push_str("from airflow.operators.python_operator import BranchPythonOperator\n\n");
        out.push_str("default_args = {\n");
        out.push_str(&format!("\t'owner': {},\n", py_str(&header.owner)));
        out.push_str(&format!(
            "\t'start_date': datetime.strptime({}, '%Y-%m-%d'),\n",
            py_str(&header.start_date)
        ));
        out.push_str("}\n\n");
        out.push_str(&format!(
            "dag = DAG({}, default_args=default_args, schedule_interval={})\n\n",
            py_str(&header.dag_id),
            py_str(&header.schedule_interval)
        ));
        out
    }

    fn fragment(&self, fragment: &Fragment) -> String {
        let mut out = String::new();
        if let Some(lookup) = &fragment.lookup {
            self.lookup(&mut out, lookup);
        }
        if let Some(callable) = &fragment.callable {
            self.callable(&mut out, callable);
        }
        if let Some(wiring) = &fragment.wiring {
            self.wiring(&mut out, wiring);
        }
        for task in &fragment.tasks {
            self.task(&mut out, task);
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    fn registration(&self, wiring: &WiringFn) -> String {
        format!("{}()", wiring.fn_name)
    }

    fn trailer(&self, registrations: &[String]) -> String {
        if registrations.is_empty() {
            return String::new();
        }
        let mut out = String::from("# Deferred wiring\n");
        for statement in registrations {
            out.push_str(statement);
            out.push('\n');
        }
        out
    }
}

/// `['java', '-cp', ..., '--flag', state.get('key', '')]`
fn command_list(command: &WorkerCommand) -> String {
    let mut parts: Vec<String> = command.program.iter().map(|p| py_str(p)).collect();
    for arg in &command.args {
        parts.push(py_str(arg.flag));
        parts.push(match &arg.value {
            ArgValue::Literal(value) => py_str(value),
            ArgValue::Lookup { key, prefix } if prefix.is_empty() => {
                format!("state.get({}, '')", py_str(key))
            }
            ArgValue::Lookup { key, prefix } => {
                format!("{} + state.get({}, '')", py_str(prefix), py_str(key))
            }
        });
    }
    format!("[{}]", parts.join(", "))
}

/// Single-quoted Python string literal
pub fn py_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}
