//! Capability interfaces that downstream code-generation passes query.
//!
//! Each subsystem is a trait. A subtarget either owns a concrete
//! implementation or reports [`TargetError::CapabilityUnavailable`] for it;
//! callers check the result before use.
//!
//! [`TargetError::CapabilityUnavailable`]: crate::error::TargetError::CapabilityUnavailable

pub mod frame_lowering;
pub mod instr_info;
pub mod register_info;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use frame_lowering::{FrameLowering, SemuFrameLowering};
pub use instr_info::{InstrDesc, InstrInfo, OperandKind, SemuInstrInfo};
pub use register_info::{RegisterDesc, RegisterInfo, RegisterKind, SemuRegisterInfo};

/// The closed set of subsystems a subtarget can provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    InstrInfo,
    FrameLowering,
    RegisterInfo,
    TargetLowering,
    InstrItineraries,
    CallLowering,
    Legalizer,
    RegisterBankInfo,
    InstructionSelector,
}

impl Capability {
    /// Every capability, in query order.
    pub const ALL: [Capability; 9] = [
        Capability::InstrInfo,
        Capability::FrameLowering,
        Capability::RegisterInfo,
        Capability::TargetLowering,
        Capability::InstrItineraries,
        Capability::CallLowering,
        Capability::Legalizer,
        Capability::RegisterBankInfo,
        Capability::InstructionSelector,
    ];

    /// Whether this capability belongs to the GlobalISel pipeline.
    pub fn is_global_isel(self) -> bool {
        matches!(
            self,
            Capability::CallLowering
                | Capability::Legalizer
                | Capability::RegisterBankInfo
                | Capability::InstructionSelector
        )
    }

    /// Stable kebab-case name.
    pub fn name(self) -> &'static str {
        match self {
            Capability::InstrInfo => "instr-info",
            Capability::FrameLowering => "frame-lowering",
            Capability::RegisterInfo => "register-info",
            Capability::TargetLowering => "target-lowering",
            Capability::InstrItineraries => "instr-itineraries",
            Capability::CallLowering => "call-lowering",
            Capability::Legalizer => "legalizer",
            Capability::RegisterBankInfo => "register-bank-info",
            Capability::InstructionSelector => "instruction-selector",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// SelectionDAG lowering hooks.
pub trait TargetLowering: fmt::Debug + Send + Sync {}

/// Instruction scheduling itineraries.
pub trait InstrItineraryData: fmt::Debug + Send + Sync {}

/// GlobalISel call lowering.
pub trait CallLowering: fmt::Debug + Send + Sync {}

/// GlobalISel legalization rules.
pub trait LegalizerInfo: fmt::Debug + Send + Sync {}

/// GlobalISel register bank mapping.
pub trait RegisterBankInfo: fmt::Debug + Send + Sync {}

/// GlobalISel instruction selector.
pub trait InstructionSelector: fmt::Debug + Send + Sync {}
