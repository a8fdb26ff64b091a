//! Quick benchmark for name derivation and a full build

use std::time::Instant;

use wgen::node::derive_name;
use wgen::{DefinitionsRegistry, Generator, GeneratorConfig, Pipeline};

fn pipeline(steps: u32) -> Pipeline {
    let mut yaml = String::from("dag_id: bench\nprocesses:\n  - id: 1\n    name: Bench Pipeline\n");
    yaml.push_str("  - id: 2\n    parent_process_id: 1\n    name: List Files\n    kind: lof\n    next: 3\n");
    for id in 3..3 + steps {
        yaml.push_str(&format!(
            "  - id: {id}\n    parent_process_id: 1\n    name: Quality check number {id} for the nightly load\n    kind: data_quality\n"
        ));
        if id + 1 < 3 + steps {
            yaml.push_str(&format!("    next: {}\n", id + 1));
        }
    }
    Pipeline::from_yaml(&yaml).unwrap()
}

fn main() {
    println!("Name Derivation Performance Test");
    println!("================================\n");

    let names = [
        "Load Orders",
        "Nightly customer orders reconciliation for every region",
    ];
    let iterations = 100_000;
    for name in names {
        let start = Instant::now();
        for id in 0..iterations {
            let _ = derive_name("data_quality", id, name);
        }
        let elapsed = start.elapsed();
        println!("Name: {:60}", format!("\"{}\"", name));
        println!("  Time for {} iterations: {:?}", iterations, elapsed);
        println!("  Per operation: {:?}\n", elapsed / iterations);
    }

    println!("Full Build Performance Test");
    println!("===========================\n");

    let mut config = GeneratorConfig::default();
    config.layout.home = Some("/home/bench".into());
    let generator = Generator::new(config.layout().unwrap(), config.dag.clone());

    for steps in [10, 100, 1_000] {
        let pipeline = pipeline(steps);
        let graph = pipeline.to_graph().unwrap();
        let registry = DefinitionsRegistry::new();

        let start = Instant::now();
        let output = generator.build("bench", &graph, &registry).unwrap();
        let elapsed = start.elapsed();

        println!("{} steps: {} bytes in {:?}", steps, output.script.len(), elapsed);
    }
}
