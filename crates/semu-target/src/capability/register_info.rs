//! Register file description.

use std::fmt;

use serde::Serialize;

use crate::isa::IsaModel;

/// What a register is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegisterKind {
    General,
    InstructionPointer,
    StackPointer,
    FramePointer,
    InterruptInhibit,
}

/// One architectural register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RegisterDesc {
    /// Assembly name.
    pub name: String,
    /// Register role.
    pub kind: RegisterKind,
    /// Operand encoding for general-purpose registers.
    pub encoding: Option<u32>,
    /// Width in bits.
    pub width_bits: u32,
}

/// Register information queried by allocation and frame passes.
pub trait RegisterInfo: fmt::Debug + Send + Sync {
    /// All registers, general-purpose first.
    fn registers(&self) -> &[RegisterDesc];

    /// Look up a register by assembly name.
    fn find(&self, name: &str) -> Option<&RegisterDesc> {
        self.registers().iter().find(|r| r.name == name)
    }

    /// General-purpose registers, in encoding order.
    fn general_purpose(&self) -> Vec<&RegisterDesc> {
        self.registers()
            .iter()
            .filter(|r| r.kind == RegisterKind::General)
            .collect()
    }

    /// The stack pointer register.
    fn stack_pointer(&self) -> &RegisterDesc;

    /// The frame pointer register.
    fn frame_pointer(&self) -> &RegisterDesc;
}

/// Semu register file: `r0`..`r7` plus `ip`, `sp`, `fp`, `ii`.
#[derive(Debug, Clone)]
pub struct SemuRegisterInfo {
    registers: Vec<RegisterDesc>,
    sp: usize,
    fp: usize,
}

impl SemuRegisterInfo {
    /// Build the register table from an ISA model.
    pub fn new(isa: &IsaModel) -> Self {
        let mut registers = Vec::new();
        for rc in &isa.register_classes {
            for i in 0..rc.count {
                registers.push(RegisterDesc {
                    name: format!("{}{}", rc.prefix, i),
                    kind: RegisterKind::General,
                    encoding: Some(i),
                    width_bits: rc.width_bits,
                });
            }
        }

        let mut sp = 0;
        let mut fp = 0;
        for special in &isa.special_registers {
            let kind = match special.name.as_str() {
                "ip" => RegisterKind::InstructionPointer,
                "sp" => {
                    sp = registers.len();
                    RegisterKind::StackPointer
                }
                "fp" => {
                    fp = registers.len();
                    RegisterKind::FramePointer
                }
                _ => RegisterKind::InterruptInhibit,
            };
            registers.push(RegisterDesc {
                name: special.name.clone(),
                kind,
                encoding: None,
                width_bits: isa.word_size,
            });
        }

        Self { registers, sp, fp }
    }
}

impl RegisterInfo for SemuRegisterInfo {
    fn registers(&self) -> &[RegisterDesc] {
        &self.registers
    }

    fn stack_pointer(&self) -> &RegisterDesc {
        &self.registers[self.sp]
    }

    fn frame_pointer(&self) -> &RegisterDesc {
        &self.registers[self.fp]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semu_register_file() {
        let info = SemuRegisterInfo::new(&IsaModel::semu());
        assert_eq!(info.registers().len(), 12);
        let gprs = info.general_purpose();
        assert_eq!(gprs.len(), 8);
        assert_eq!(gprs[0].name, "r0");
        assert_eq!(gprs[7].encoding, Some(7));
        assert_eq!(info.stack_pointer().name, "sp");
        assert_eq!(info.frame_pointer().name, "fp");
        assert_eq!(info.find("ii").unwrap().kind, RegisterKind::InterruptInhibit);
        assert!(info.find("r8").is_none());
    }
}
