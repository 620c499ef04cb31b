//! ISA (Instruction Set Architecture) model of the Semu machine.
//!
//! Describes the register file, word size, byte order and fixed memory
//! map. The capability objects in [`crate::capability`] are derived from
//! this model.

use serde::{Deserialize, Serialize};

/// Byte ordering of the target architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Endianness {
    Little,
    Big,
}

/// A class of registers (e.g., general-purpose).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RegisterClass {
    /// Name of the register class (e.g., "gpr").
    pub name: String,
    /// Register name prefix; registers are `{prefix}{index}`.
    pub prefix: String,
    /// Number of registers in this class.
    pub count: u32,
    /// Width of each register in bits.
    pub width_bits: u32,
}

/// A register outside the general-purpose file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SpecialRegister {
    /// Assembly name (e.g., "sp").
    pub name: String,
    /// What the register holds.
    pub role: String,
    /// Value after reset, if fixed.
    pub reset_value: Option<u32>,
}

/// A fixed region of the machine's address space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MemoryRegion {
    /// Region name.
    pub name: String,
    /// First byte address.
    pub base_address: u32,
    /// Size in bytes (`None` for regions that run to the end of memory).
    pub size_bytes: Option<u32>,
}

/// Model of the Semu instruction set architecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IsaModel {
    /// Architecture name.
    pub name: String,
    /// Byte ordering.
    pub endianness: Endianness,
    /// Native word size in bits.
    pub word_size: u32,
    /// Addressable memory in bytes.
    pub memory_size: u32,
    /// Number of interrupt lines.
    pub interrupt_lines: u32,
    /// General-purpose register classes.
    pub register_classes: Vec<RegisterClass>,
    /// Instruction, stack and frame pointers and the interrupt-inhibit flag.
    pub special_registers: Vec<SpecialRegister>,
    /// Fixed memory map.
    pub memory_regions: Vec<MemoryRegion>,
}

/// Size of one machine word in bytes.
pub const WORD_SIZE: u32 = 4;

/// Number of peripheral interrupt lines.
pub const INTERRUPT_LINES: u32 = 16;

/// Start of the interrupt vector table.
pub const INT_VECT_BASE: u32 = 0x0000_0000;

/// Start of the memory-mapped serial device word.
pub const SERIAL_MM_BASE: u32 = INT_VECT_BASE + INTERRUPT_LINES * WORD_SIZE;

/// First instruction executed after reset.
pub const ROM_BASE: u32 = SERIAL_MM_BASE + WORD_SIZE;

impl IsaModel {
    /// Word size in bytes.
    pub fn word_size_bytes(&self) -> u32 {
        self.word_size / 8
    }

    /// Total number of general-purpose registers (class name "gpr").
    pub fn gp_register_count(&self) -> u32 {
        self.register_classes
            .iter()
            .filter(|rc| rc.name == "gpr")
            .map(|rc| rc.count)
            .sum()
    }

    /// Look up a memory region by name.
    pub fn memory_region(&self, name: &str) -> Option<&MemoryRegion> {
        self.memory_regions.iter().find(|r| r.name == name)
    }

    /// Construct the model for the Semu machine.
    pub fn semu() -> Self {
        Self {
            name: "semu".into(),
            endianness: Endianness::Big,
            word_size: WORD_SIZE * 8,
            memory_size: 0xFFFF,
            interrupt_lines: INTERRUPT_LINES,
            register_classes: vec![RegisterClass {
                name: "gpr".into(),
                prefix: "r".into(),
                count: 8,
                width_bits: 32,
            }],
            special_registers: vec![
                SpecialRegister {
                    name: "ip".into(),
                    role: "instruction pointer".into(),
                    reset_value: Some(ROM_BASE),
                },
                SpecialRegister {
                    name: "sp".into(),
                    role: "stack pointer (grows up)".into(),
                    reset_value: Some(0),
                },
                SpecialRegister {
                    name: "fp".into(),
                    role: "frame pointer".into(),
                    reset_value: Some(0),
                },
                SpecialRegister {
                    name: "ii".into(),
                    role: "interrupt inhibit".into(),
                    reset_value: Some(1),
                },
            ],
            memory_regions: vec![
                MemoryRegion {
                    name: "int-vectors".into(),
                    base_address: INT_VECT_BASE,
                    size_bytes: Some(INTERRUPT_LINES * WORD_SIZE),
                },
                MemoryRegion {
                    name: "serial".into(),
                    base_address: SERIAL_MM_BASE,
                    size_bytes: Some(WORD_SIZE),
                },
                MemoryRegion {
                    name: "rom".into(),
                    base_address: ROM_BASE,
                    size_bytes: None,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semu_defaults() {
        let isa = IsaModel::semu();
        assert_eq!(isa.word_size, 32);
        assert_eq!(isa.word_size_bytes(), 4);
        assert_eq!(isa.endianness, Endianness::Big);
        assert_eq!(isa.gp_register_count(), 8);
    }

    #[test]
    fn memory_map_layout() {
        let isa = IsaModel::semu();
        assert_eq!(isa.memory_region("serial").unwrap().base_address, 0x40);
        assert_eq!(isa.memory_region("rom").unwrap().base_address, 0x44);
        assert!(isa.memory_region("heap").is_none());
        let ip = isa
            .special_registers
            .iter()
            .find(|r| r.name == "ip")
            .unwrap();
        assert_eq!(ip.reset_value, Some(ROM_BASE));
    }
}
