//! `semu-llc targets`: registered target listing.

use anyhow::Result;

use semu_target::registry::RegisteredTarget;
use semu_target::TargetRegistry;

/// One listing line for a registered target.
fn line(entry: &RegisteredTarget) -> String {
    let d = &entry.descriptor;
    let mut flags = Vec::new();
    if entry.has_machine_factory {
        flags.push("machine");
    }
    if entry.has_machine_code {
        flags.push("mc");
    }
    if d.has_jit {
        flags.push("jit");
    }
    format!("  {:<12} {:<20} [{}]", d.name, d.short_description, flags.join(", "))
}

/// List all registered targets.
pub fn run(registry: &TargetRegistry) -> Result<()> {
    println!("Registered targets:");
    println!();
    for entry in registry.targets() {
        println!("{}", line(&entry));
    }
    println!();
    println!("Use 'semu-llc describe' for details.");
    Ok(())
}
