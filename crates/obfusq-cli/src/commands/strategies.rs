//! Strategies command implementation.

use console::style;

use obfusq_core::Strategy;

/// Execute the strategies command.
pub fn execute() {
    println!("{}", style("Available strategies:").bold());
    println!();

    for strategy in Strategy::ALL {
        let alias = strategy
            .alias()
            .map(|alias| format!(" (alias: {alias})"))
            .unwrap_or_default();
        let default = if strategy == Strategy::default() {
            style(" [default]").dim().to_string()
        } else {
            String::new()
        };

        println!(
            "  {:<14}{}{}",
            style(strategy.name()).cyan().bold(),
            style(alias).dim(),
            default
        );
        println!("      {}", strategy.description());
    }
}
