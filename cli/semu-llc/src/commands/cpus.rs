//! `semu-llc cpus`: processor and feature tables.

use anyhow::Result;

use semu_target::features::{self, CPUS, DEFAULT_CPU, FEATURES};

/// Print every CPU with its default features, then the feature table.
pub fn run() -> Result<()> {
    println!("Available CPUs:");
    println!();
    for cpu in CPUS {
        let marker = if cpu.name == DEFAULT_CPU { " (default)" } else { "" };
        println!("  {:<12} {}{marker}", cpu.name, cpu.description);
        let defaults = features::to_feature_string(cpu.defaults);
        if !defaults.is_empty() {
            println!("  {:<12} features: {defaults}", "");
        }
    }
    println!();

    println!("Available features:");
    println!();
    for feature in FEATURES {
        println!("  {:<12} {}", feature.name, feature.description);
    }
    println!();
    println!("Use +name / -name in --features to toggle on top of the CPU defaults.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_succeeds() {
        assert!(run().is_ok());
    }

    #[test]
    fn default_cpu_is_listed() {
        assert!(CPUS.iter().any(|c| c.name == DEFAULT_CPU));
    }
}
