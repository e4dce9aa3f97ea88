//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - Semantics-preserving quantum circuit obfuscation",
        style("Obfusq").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  obfusq-ir     Circuit intermediate representation");
    println!("  obfusq-qasm   OpenQASM 2/3 ingestion and serialization");
    println!("  obfusq-core   Equivalence library and rewrite strategies");
    println!("  obfusq-hal    Execution capability");
    println!("  obfusq-eval   Semantic accuracy validation and reports");
    println!("  obfusq-cli    Command-line interface");
    println!();
    println!("License:    {}", style("Apache-2.0").dim());
}
