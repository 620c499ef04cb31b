//! Instruction descriptions.
//!
//! Every Semu instruction is an opcode word followed by one word per
//! operand. Register operands hold the index of a general-purpose register.

use std::fmt;

use serde::Serialize;

use crate::features::{feature_names, FeatureSet};
use crate::isa::WORD_SIZE;

/// Kind of an instruction operand word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperandKind {
    /// General-purpose register index.
    Reg,
    /// Unsigned 32-bit immediate.
    Imm,
    /// Signed 32-bit immediate.
    SImm,
}

/// Static description of one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct InstrDesc {
    /// Assembly mnemonic.
    pub mnemonic: &'static str,
    /// Opcode word.
    pub opcode: u32,
    /// Operand words, in encoding order.
    pub operands: &'static [OperandKind],
    /// Features required to use the instruction (empty for the base set).
    #[serde(serialize_with = "serialize_features")]
    pub requires: FeatureSet,
}

fn serialize_features<S: serde::Serializer>(
    features: &FeatureSet,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(feature_names(*features))
}

impl InstrDesc {
    /// Encoded size in bytes.
    pub fn size_bytes(&self) -> u32 {
        (1 + self.operands.len() as u32) * WORD_SIZE
    }

    /// Whether the instruction is usable with `features` enabled.
    pub fn is_available(&self, features: FeatureSet) -> bool {
        features.contains(self.requires)
    }
}

use OperandKind::{Imm, Reg, SImm};

const fn instr(
    mnemonic: &'static str,
    opcode: u32,
    operands: &'static [OperandKind],
    requires: FeatureSet,
) -> InstrDesc {
    InstrDesc {
        mnemonic,
        opcode,
        operands,
        requires,
    }
}

const BASE: FeatureSet = FeatureSet::empty();
const INT: FeatureSet = FeatureSet::INTERRUPTS;
const MULDIV: FeatureSet = FeatureSet::MULDIV;
const BIT: FeatureSet = FeatureSet::BITOPS;
const EMU: FeatureSet = FeatureSet::EMULATED;

/// The Semu instruction table, sorted by opcode.
pub const INSTRUCTIONS: &[InstrDesc] = &[
    instr("HLT", 0x00, &[], BASE),
    instr("NOP", 0x01, &[], BASE),
    instr("JMP", 0x03, &[Reg], BASE),
    instr("LDC", 0x04, &[Imm, Reg], BASE),
    instr("MRM", 0x05, &[Reg, Reg], BASE),
    instr("MMR", 0x06, &[Reg, Reg], BASE),
    instr("OUT", 0x07, &[Reg], BASE),
    instr("JGT", 0x08, &[Reg, Reg], BASE),
    instr("OPN", 0x09, &[], INT),
    instr("CLS", 0x0A, &[], INT),
    instr("LDR", 0x0B, &[SImm, Reg], BASE),
    instr("LSP", 0x0C, &[Reg], BASE),
    instr("PSH", 0x0D, &[Reg], BASE),
    instr("POP", 0x0E, &[Reg], BASE),
    instr("INT", 0x0F, &[], INT),
    instr("CLL", 0x10, &[Reg], BASE),
    instr("RET", 0x11, &[], BASE),
    instr("IRX", 0x12, &[], INT),
    instr("SSP", 0x13, &[Reg], BASE),
    instr("MRR", 0x14, &[Reg, Reg], BASE),
    instr("LLA", 0x15, &[Imm, Reg], BASE),
    instr("INV", 0x20, &[Reg, Reg], BIT),
    instr("ADD", 0x21, &[Reg, Reg, Reg], BASE),
    instr("SUB", 0x22, &[Reg, Reg, Reg], BASE),
    instr("MUL", 0x23, &[Reg, Reg, Reg], MULDIV),
    instr("DIV", 0x24, &[Reg, Reg, Reg], MULDIV),
    instr("MOD", 0x25, &[Reg, Reg, Reg], MULDIV),
    instr("RSH", 0x26, &[Reg, Reg, Reg], BIT),
    instr("LSH", 0x27, &[Reg, Reg, Reg], BIT),
    instr("BOR", 0x28, &[Reg, Reg, Reg], BIT),
    instr("BAND", 0x29, &[Reg, Reg, Reg], BIT),
    instr("XOR", 0x2A, &[Reg, Reg, Reg], BIT),
    instr("CPT", 0xF0, &[Imm], EMU),
    instr("AEQ", 0xF1, &[Reg, Imm], EMU),
];

/// Instruction information queried by selection and scheduling passes.
pub trait InstrInfo: fmt::Debug + Send + Sync {
    /// Every instruction the ISA defines.
    fn instructions(&self) -> &[InstrDesc];

    /// Whether this subtarget may emit `desc`.
    fn is_legal(&self, desc: &InstrDesc) -> bool;

    /// Look up an instruction by mnemonic (case-insensitive).
    fn by_mnemonic(&self, mnemonic: &str) -> Option<&InstrDesc> {
        self.instructions()
            .iter()
            .find(|i| i.mnemonic.eq_ignore_ascii_case(mnemonic))
    }

    /// Look up an instruction by opcode word.
    fn by_opcode(&self, opcode: u32) -> Option<&InstrDesc> {
        self.instructions().iter().find(|i| i.opcode == opcode)
    }

    /// Instructions legal on this subtarget.
    fn legal_instructions(&self) -> Vec<&InstrDesc> {
        self.instructions()
            .iter()
            .filter(|i| self.is_legal(i))
            .collect()
    }
}

/// Semu instruction info bound to a resolved feature set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemuInstrInfo {
    features: FeatureSet,
}

impl SemuInstrInfo {
    pub fn new(features: FeatureSet) -> Self {
        Self { features }
    }
}

impl InstrInfo for SemuInstrInfo {
    fn instructions(&self) -> &[InstrDesc] {
        INSTRUCTIONS
    }

    fn is_legal(&self, desc: &InstrDesc) -> bool {
        desc.is_available(self.features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcodes_unique_and_sorted() {
        for pair in INSTRUCTIONS.windows(2) {
            assert!(
                pair[0].opcode < pair[1].opcode,
                "{} and {} out of order",
                pair[0].mnemonic,
                pair[1].mnemonic
            );
        }
    }

    #[test]
    fn lookup() {
        let info = SemuInstrInfo::new(FeatureSet::empty());
        let cll = info.by_mnemonic("cll").unwrap();
        assert_eq!(cll.opcode, 0x10);
        assert_eq!(cll.size_bytes(), 8);
        assert_eq!(info.by_opcode(0x21).unwrap().mnemonic, "ADD");
        assert!(info.by_opcode(0x02).is_none());
    }

    #[test]
    fn legality_follows_features() {
        let min = SemuInstrInfo::new(FeatureSet::empty());
        let mul = min.by_mnemonic("MUL").unwrap();
        assert!(!min.is_legal(mul));
        assert!(min.is_legal(min.by_mnemonic("ADD").unwrap()));

        let full = SemuInstrInfo::new(FeatureSet::all());
        assert_eq!(full.legal_instructions().len(), INSTRUCTIONS.len());
        assert!(min.legal_instructions().len() < INSTRUCTIONS.len());
    }
}
