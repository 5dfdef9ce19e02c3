//! Example: run optimization passes until the output converges
//!
//! Drives a `Multipass` session directly, without a worker thread, and
//! prints the size of every pass.
//!
//! Usage: cargo run --example multipass <input.svg> [--pretty]

use std::env;

use svgpass::{
    parse_file, Multipass, OptimizationSettings, Pipeline, Plugin, PluginKind, PluginParams,
    XmlNode,
};

/// Drops `metadata` elements.
struct RemoveMetadata;

impl Plugin for RemoveMetadata {
    fn name(&self) -> &str {
        "removeMetadata"
    }

    fn kind(&self) -> PluginKind {
        PluginKind::PerItem
    }

    fn visit(&self, node: &mut XmlNode, _params: &PluginParams) -> svgpass::Result<bool> {
        Ok(!node.is_element_named("metadata"))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <input.svg> [--pretty]", args[0]);
        std::process::exit(1);
    }

    let document = parse_file(&args[1])?;
    let settings = OptimizationSettings {
        pretty: args.iter().any(|a| a == "--pretty"),
        ..OptimizationSettings::default()
    };

    let pipeline = Pipeline::new().with_plugin(RemoveMetadata);
    let mut session = Multipass::new(&document, &settings);

    let mut last = None;
    while let Some(result) = session.advance(&pipeline)? {
        eprintln!("Pass {}: {} chars", session.passes(), result.data.chars().count());
        last = Some(result);
    }

    if let Some(result) = last {
        print!("{}", result.data);
    }
    Ok(())
}
