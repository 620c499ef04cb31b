//! `semu-llc describe`: target identity, ISA and instruction table.

use anyhow::{bail, Context, Result};
use serde::Serialize;

use semu_target::capability::instr_info::{InstrDesc, INSTRUCTIONS};
use semu_target::features::{self, CPUS};
use semu_target::isa::IsaModel;
use semu_target::{semu, TargetDescriptor, TargetRegistry};

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct CpuSummary {
    name: &'static str,
    description: &'static str,
    features: Vec<&'static str>,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct TargetDescription<'a> {
    target: &'a TargetDescriptor,
    data_layout: &'static str,
    isa: IsaModel,
    cpus: Vec<CpuSummary>,
    instructions: &'static [InstrDesc],
}

fn description(target: &TargetDescriptor) -> TargetDescription<'_> {
    TargetDescription {
        target,
        data_layout: semu::DATA_LAYOUT,
        isa: IsaModel::semu(),
        cpus: CPUS
            .iter()
            .map(|c| CpuSummary {
                name: c.name,
                description: c.description,
                features: features::feature_names(c.defaults),
            })
            .collect(),
        instructions: INSTRUCTIONS,
    }
}

/// Describe the Semu target in the requested format.
pub fn run(registry: &TargetRegistry, format: Option<&str>) -> Result<()> {
    let target = registry.lookup_by_name(semu::TARGET_NAME)?;
    let desc = description(&target);

    match format {
        Some("toml") => {
            let text = toml::to_string_pretty(&desc).context("failed to render TOML")?;
            print!("{text}");
        }
        Some("json") => {
            let text = serde_json::to_string_pretty(&desc).context("failed to render JSON")?;
            println!("{text}");
        }
        Some(other) => bail!("unknown format '{other}' (expected 'toml' or 'json')"),
        None => print_human(&desc),
    }
    Ok(())
}

fn print_human(desc: &TargetDescription<'_>) {
    let target = desc.target;
    println!("=== Target: {} ===", target.name);
    println!("{}", target.long_description);
    println!("JIT: {}", if target.has_jit { "yes" } else { "no" });
    println!("Data layout: {}", desc.data_layout);
    println!();

    let isa = &desc.isa;
    println!("--- ISA ---");
    println!("  Word size:  {} bits", isa.word_size);
    println!("  Endianness: {:?}", isa.endianness);
    println!("  Memory:     {} bytes", isa.memory_size);
    println!("  Interrupts: {} lines", isa.interrupt_lines);
    println!("  Registers:");
    for rc in &isa.register_classes {
        println!(
            "    {}: {} x {} bits ({}0..{}{})",
            rc.name,
            rc.count,
            rc.width_bits,
            rc.prefix,
            rc.prefix,
            rc.count.saturating_sub(1)
        );
    }
    let specials: Vec<&str> = isa.special_registers.iter().map(|r| r.name.as_str()).collect();
    println!("    special: {}", specials.join(", "));
    println!("  Memory regions:");
    for region in &isa.memory_regions {
        match region.size_bytes {
            Some(size) => println!(
                "    {}: 0x{:04X} ({} bytes)",
                region.name, region.base_address, size
            ),
            None => println!("    {}: 0x{:04X}", region.name, region.base_address),
        }
    }
    println!();

    println!("--- CPUs ---");
    for cpu in &desc.cpus {
        println!("  {:<12} [{}]", cpu.name, cpu.features.join(", "));
    }
    println!();

    println!("--- Instructions ({}) ---", desc.instructions.len());
    for instr in desc.instructions {
        let requires = features::feature_names(instr.requires);
        let suffix = if requires.is_empty() {
            String::new()
        } else {
            format!("  (requires {})", requires.join(", "))
        };
        println!(
            "  0x{:02X} {:<5} {} bytes{suffix}",
            instr.opcode,
            instr.mnemonic,
            instr.size_bytes()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TargetRegistry {
        let registry = TargetRegistry::new();
        semu::initialize(&registry).unwrap();
        registry
    }

    #[test]
    fn describe_all_formats() {
        let registry = registry();
        assert!(run(&registry, None).is_ok());
        assert!(run(&registry, Some("toml")).is_ok());
        assert!(run(&registry, Some("json")).is_ok());
        assert!(run(&registry, Some("yaml")).is_err());
    }

    #[test]
    fn describe_requires_registration() {
        assert!(run(&TargetRegistry::new(), None).is_err());
    }

    #[test]
    fn json_carries_identity_and_layout() {
        let target = semu::the_semu_target();
        let value = serde_json::to_value(description(&target)).unwrap();
        assert_eq!(value["target"]["name"], "Semu");
        assert_eq!(value["data-layout"], "E-p:32:32-a:32-m:e-n32");
        assert_eq!(value["instructions"][0]["mnemonic"], "HLT");
    }
}
