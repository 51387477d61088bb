// demos/basic_usage.rs
//! Basic usage of the AIR toolchain

use pregel_air::ast::SExpr;
use pregel_air::program::{single_source_shortest_path, vertex_degrees};
use pregel_air::{ErrorReport, ProgramSpecBuilder, Source, Toolchain};
use serde_json::json;

fn main() {
    println!("=== Pregel AIR - Basic Usage ===\n");

    let toolchain = Toolchain::new();

    // Example 1: imperative source, already parsed to ESTree
    println!("Example 1: if (a == b) {{ return 15; }} else {{ return 16; }}");
    let source = Source::Estree(json!({
        "type": "IfStatement",
        "test": {
            "type": "BinaryExpression",
            "operator": "==",
            "left": { "type": "Identifier", "name": "a" },
            "right": { "type": "Identifier", "name": "b" }
        },
        "consequent": {
            "type": "BlockStatement",
            "body": [{ "type": "ReturnStatement", "argument": { "type": "Literal", "value": 15 } }]
        },
        "alternate": {
            "type": "BlockStatement",
            "body": [{ "type": "ReturnStatement", "argument": { "type": "Literal", "value": 16 } }]
        }
    }));

    match toolchain.compile(&source) {
        Ok(air) => println!("AIR: {}\n", air.to_value().unwrap_or_default()),
        Err(e) => println!("Error: {}\n", e),
    }

    // Example 2: unsupported construct
    println!("Example 2: try {{ ... }} catch (e) {{ ... }}");
    let source = Source::Estree(json!({
        "type": "TryStatement",
        "block": { "type": "BlockStatement", "body": [] },
        "handler": null,
        "finalizer": null
    }));

    if let Err(e) = toolchain.compile(&source) {
        let report = ErrorReport::from(&e);
        println!("Rejected: {}\n", serde_json::to_string(&report).unwrap_or_default());
    }

    // Example 3: S-expression program assembled into a spec
    println!("Example 3: S-expression vertex program");
    let init = SExpr::from_value(&json!(["seq",
        ["accum-set!", "outDegree", ["this-outbound-edges-count"]],
        ["accum-set!", "inDegree", 0],
        ["send-to-all-neighbours", "inDegree", 1]]))
    .expect("valid S-expression");

    let spec = toolchain
        .single_phase(
            ProgramSpecBuilder::new("degree")
                .max_gss(2)
                .accumulator("outDegree", "sum", "ints")
                .accumulator("inDegree", "sum", "ints"),
            "main",
            &Source::SExpression(init),
            None,
        )
        .expect("valid program");

    println!("Payload: {}\n", spec.to_json().unwrap_or_default());

    // Example 4: stock programs
    println!("Example 4: stock programs");
    for spec in [vertex_degrees("degree"), single_source_shortest_path("distance", "vertices/A")] {
        match spec {
            Ok(spec) => println!(
                "{}: {} accumulator(s), {} phase(s), maxGSS {}",
                spec.result_field,
                spec.vertex_accumulators.len(),
                spec.phases.len(),
                spec.max_gss
            ),
            Err(e) => println!("Invalid: {}", e),
        }
    }
}
