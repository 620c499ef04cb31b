//! Per-compilation subtarget descriptor.
//!
//! A [`Subtarget`] holds the resolved CPU, feature set and stack alignment
//! for one [`TargetMachine`], plus the capability objects it owns. It is
//! immutable after construction.

use std::sync::{Arc, Weak};

use tracing::debug;

use crate::capability::{
    CallLowering, Capability, FrameLowering, InstrInfo, InstrItineraryData, InstructionSelector,
    LegalizerInfo, RegisterBankInfo, RegisterInfo, SemuFrameLowering, SemuInstrInfo,
    SemuRegisterInfo, TargetLowering,
};
use crate::error::{Result, TargetError};
use crate::features::{self, FeatureSet};
use crate::isa::{IsaModel, WORD_SIZE};
use crate::machine::TargetMachine;
use crate::triple::Triple;

/// Resolved, immutable configuration for one compilation unit's target.
///
/// Only [`SubtargetConfig::resolve`] builds one, so every instance names a
/// known CPU, a well-formed feature string and a valid stack alignment.
///
/// ```compile_fail
/// use semu_target::{FeatureSet, SubtargetConfig, Triple};
///
/// let config = SubtargetConfig {
///     triple: Triple::semu(),
///     cpu: "no-such-cpu".into(),
///     feature_string: "garbage".into(),
///     features: FeatureSet::empty(),
///     little_endian: true,
///     stack_alignment: 0,
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtargetConfig {
    /// Target triple the subtarget was requested for.
    pub(crate) triple: Triple,
    /// CPU name after defaulting (never empty).
    pub(crate) cpu: String,
    /// Feature string exactly as supplied.
    pub(crate) feature_string: String,
    /// CPU defaults with the feature string applied.
    pub(crate) features: FeatureSet,
    /// Byte order; always `false` for Semu.
    pub(crate) little_endian: bool,
    /// Stack alignment in bytes.
    pub(crate) stack_alignment: u32,
}

impl SubtargetConfig {
    /// Resolve CPU, features and stack alignment.
    ///
    /// `stack_align_override` is in bytes and must be a power of two no
    /// smaller than a machine word. Semu is big-endian, so `little_endian`
    /// must be `false`.
    pub fn resolve(
        triple: Triple,
        cpu: &str,
        feature_string: &str,
        little_endian: bool,
        stack_align_override: Option<u32>,
    ) -> Result<Self> {
        let features = features::parse_subtarget_features(cpu, feature_string)?;

        if little_endian {
            return Err(TargetError::InvalidOption {
                detail: "Semu is big-endian; little-endian subtargets are not supported".into(),
            });
        }

        let stack_alignment = match stack_align_override {
            None => WORD_SIZE,
            Some(align) if align.is_power_of_two() && align >= WORD_SIZE => align,
            Some(align) => {
                return Err(TargetError::InvalidOption {
                    detail: format!(
                        "stack alignment override {align} must be a power of two >= {WORD_SIZE}"
                    ),
                })
            }
        };

        let cpu = if cpu.is_empty() {
            features::DEFAULT_CPU
        } else {
            cpu
        };
        Ok(Self {
            triple,
            cpu: cpu.to_string(),
            feature_string: feature_string.to_string(),
            features,
            little_endian,
            stack_alignment,
        })
    }

    pub fn triple(&self) -> &Triple {
        &self.triple
    }

    pub fn cpu(&self) -> &str {
        &self.cpu
    }

    pub fn feature_string(&self) -> &str {
        &self.feature_string
    }

    pub fn features(&self) -> FeatureSet {
        self.features
    }

    pub fn is_little_endian(&self) -> bool {
        self.little_endian
    }

    /// Stack alignment in bytes.
    pub fn stack_alignment(&self) -> u32 {
        self.stack_alignment
    }
}

/// Subtarget descriptor: resolved configuration plus owned capabilities.
#[derive(Debug)]
pub struct Subtarget {
    machine: Weak<TargetMachine>,
    config: SubtargetConfig,
    isa: IsaModel,

    instr_info: SemuInstrInfo,
    frame_lowering: SemuFrameLowering,
    register_info: SemuRegisterInfo,
    target_lowering: Option<Box<dyn TargetLowering>>,
    instr_itineraries: Option<Box<dyn InstrItineraryData>>,
    call_lowering: Option<Box<dyn CallLowering>>,
    legalizer: Option<Box<dyn LegalizerInfo>>,
    reg_bank_info: Option<Box<dyn RegisterBankInfo>>,
    instruction_selector: Option<Box<dyn InstructionSelector>>,
}

impl Subtarget {
    /// Build a subtarget owned by `machine`.
    pub fn new(
        triple: Triple,
        cpu: &str,
        feature_string: &str,
        little_endian: bool,
        machine: Weak<TargetMachine>,
        stack_align_override: Option<u32>,
    ) -> Result<Self> {
        let config = SubtargetConfig::resolve(
            triple,
            cpu,
            feature_string,
            little_endian,
            stack_align_override,
        )?;
        Ok(Self::from_config(config, machine))
    }

    /// Build a subtarget from an already resolved configuration.
    pub(crate) fn from_config(config: SubtargetConfig, machine: Weak<TargetMachine>) -> Self {
        let isa = IsaModel::semu();
        debug!(
            triple = %config.triple,
            cpu = %config.cpu,
            stack_alignment = config.stack_alignment,
            "constructed subtarget"
        );
        Self {
            machine,
            instr_info: SemuInstrInfo::new(config.features),
            frame_lowering: SemuFrameLowering::new(&isa, config.stack_alignment),
            register_info: SemuRegisterInfo::new(&isa),
            config,
            isa,
            target_lowering: None,
            instr_itineraries: None,
            call_lowering: None,
            legalizer: None,
            reg_bank_info: None,
            instruction_selector: None,
        }
    }

    /// Resolve `cpu` + `fs` into the enabled feature set.
    ///
    /// CPU defaults apply first, then `+name`/`-name` toggles left to right.
    pub fn parse_subtarget_features(cpu: &str, fs: &str) -> Result<FeatureSet> {
        features::parse_subtarget_features(cpu, fs)
    }

    /// The owning machine, while it is alive.
    pub fn machine(&self) -> Option<Arc<TargetMachine>> {
        self.machine.upgrade()
    }

    pub fn config(&self) -> &SubtargetConfig {
        &self.config
    }

    pub fn triple(&self) -> &Triple {
        &self.config.triple
    }

    /// CPU name after defaulting (never empty).
    pub fn cpu(&self) -> &str {
        &self.config.cpu
    }

    /// Feature string exactly as supplied.
    pub fn feature_string(&self) -> &str {
        &self.config.feature_string
    }

    pub fn features(&self) -> FeatureSet {
        self.config.features
    }

    pub fn has_feature(&self, feature: FeatureSet) -> bool {
        self.config.features.contains(feature)
    }

    pub fn is_little_endian(&self) -> bool {
        self.config.little_endian
    }

    /// Stack alignment in bytes.
    pub fn stack_alignment(&self) -> u32 {
        self.config.stack_alignment
    }

    pub fn isa(&self) -> &IsaModel {
        &self.isa
    }

    /// XRay instrumentation is not supported on Semu.
    pub fn is_xray_supported(&self) -> bool {
        false
    }

    fn unavailable(&self, capability: Capability) -> TargetError {
        let target = self
            .machine()
            .map(|m| m.target().name.clone())
            .unwrap_or_else(|| crate::semu::TARGET_NAME.to_string());
        TargetError::CapabilityUnavailable { capability, target }
    }

    fn provided<'a, T: ?Sized>(
        &'a self,
        slot: &'a Option<Box<T>>,
        capability: Capability,
    ) -> Result<&'a T> {
        slot.as_deref().ok_or_else(|| self.unavailable(capability))
    }

    pub fn instr_info(&self) -> Result<&dyn InstrInfo> {
        Ok(&self.instr_info)
    }

    pub fn frame_lowering(&self) -> Result<&dyn FrameLowering> {
        Ok(&self.frame_lowering)
    }

    pub fn register_info(&self) -> Result<&dyn RegisterInfo> {
        Ok(&self.register_info)
    }

    pub fn target_lowering(&self) -> Result<&dyn TargetLowering> {
        self.provided(&self.target_lowering, Capability::TargetLowering)
    }

    pub fn instr_itinerary_data(&self) -> Result<&dyn InstrItineraryData> {
        self.provided(&self.instr_itineraries, Capability::InstrItineraries)
    }

    pub fn call_lowering(&self) -> Result<&dyn CallLowering> {
        self.provided(&self.call_lowering, Capability::CallLowering)
    }

    pub fn legalizer_info(&self) -> Result<&dyn LegalizerInfo> {
        self.provided(&self.legalizer, Capability::Legalizer)
    }

    pub fn reg_bank_info(&self) -> Result<&dyn RegisterBankInfo> {
        self.provided(&self.reg_bank_info, Capability::RegisterBankInfo)
    }

    pub fn instruction_selector(&self) -> Result<&dyn InstructionSelector> {
        self.provided(&self.instruction_selector, Capability::InstructionSelector)
    }

    /// Whether querying `capability` would succeed.
    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::InstrInfo | Capability::FrameLowering | Capability::RegisterInfo => true,
            Capability::TargetLowering => self.target_lowering.is_some(),
            Capability::InstrItineraries => self.instr_itineraries.is_some(),
            Capability::CallLowering => self.call_lowering.is_some(),
            Capability::Legalizer => self.legalizer.is_some(),
            Capability::RegisterBankInfo => self.reg_bank_info.is_some(),
            Capability::InstructionSelector => self.instruction_selector.is_some(),
        }
    }

    /// Capabilities this subtarget provides.
    pub fn capabilities(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| self.supports(*c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detached(cpu: &str, fs: &str) -> Result<Subtarget> {
        Subtarget::new(Triple::semu(), cpu, fs, false, Weak::new(), None)
    }

    #[test]
    fn defaults() {
        let st = detached("", "").unwrap();
        assert_eq!(st.cpu(), "generic");
        assert_eq!(st.stack_alignment(), 4);
        assert!(!st.is_little_endian());
        assert!(!st.is_xray_supported());
        assert!(st.machine().is_none());
        assert!(st.has_feature(FeatureSet::MULDIV));
    }

    #[test]
    fn stack_alignment_override() {
        let st = Subtarget::new(Triple::semu(), "generic", "", false, Weak::new(), Some(16))
            .unwrap();
        assert_eq!(st.stack_alignment(), 16);
        assert_eq!(st.frame_lowering().unwrap().stack_alignment(), 16);

        for bad in [0, 2, 12] {
            let err = Subtarget::new(Triple::semu(), "generic", "", false, Weak::new(), Some(bad))
                .unwrap_err();
            assert!(matches!(err, TargetError::InvalidOption { .. }));
        }
    }

    #[test]
    fn descriptive_capabilities_available() {
        let st = detached("semu-min", "+muldiv").unwrap();
        let ii = st.instr_info().unwrap();
        assert!(ii.is_legal(ii.by_mnemonic("MUL").unwrap()));
        assert!(!ii.is_legal(ii.by_mnemonic("XOR").unwrap()));
        assert_eq!(st.register_info().unwrap().general_purpose().len(), 8);
        assert_eq!(
            st.capabilities(),
            vec![
                Capability::InstrInfo,
                Capability::FrameLowering,
                Capability::RegisterInfo
            ]
        );
    }

    #[test]
    fn missing_capabilities_are_typed_errors() {
        let st = detached("generic", "").unwrap();
        match st.call_lowering().unwrap_err() {
            TargetError::CapabilityUnavailable { capability, target } => {
                assert_eq!(capability, Capability::CallLowering);
                assert_eq!(target, "Semu");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(st.target_lowering().is_err());
        assert!(st.instr_itinerary_data().is_err());
        assert!(st.legalizer_info().is_err());
        assert!(st.reg_bank_info().is_err());
        assert!(st.instruction_selector().is_err());
        assert!(!st.supports(Capability::Legalizer));
    }

    #[test]
    fn invalid_configurations_never_reach_a_subtarget() {
        let resolve = |cpu: &str, fs: &str, le: bool, align: Option<u32>| {
            SubtargetConfig::resolve(Triple::semu(), cpu, fs, le, align)
        };
        assert!(matches!(
            resolve("no-such-cpu", "", false, None),
            Err(TargetError::UnknownCpu { .. })
        ));
        assert!(matches!(
            resolve("generic", "garbage", false, None),
            Err(TargetError::InvalidFeatureSpec { .. })
        ));
        assert!(matches!(
            resolve("generic", "", false, Some(0)),
            Err(TargetError::InvalidOption { .. })
        ));
        assert!(matches!(
            resolve("generic", "", true, None),
            Err(TargetError::InvalidOption { .. })
        ));

        let config = resolve("semu-min", "+muldiv", false, Some(8)).unwrap();
        assert_eq!(config.cpu(), "semu-min");
        assert_eq!(config.features(), FeatureSet::MULDIV);
        assert_eq!(config.stack_alignment(), 8);
        let st = Subtarget::from_config(config, Weak::new());
        assert_eq!(st.frame_lowering().unwrap().align_stack_size(u32::MAX), None);
    }

    #[test]
    fn invalid_features_rejected() {
        assert!(matches!(
            detached("generic", "+fpu"),
            Err(TargetError::InvalidFeatureSpec { .. })
        ));
        assert!(matches!(
            detached("z80", ""),
            Err(TargetError::UnknownCpu { .. })
        ));
    }
}
