//! Subtarget feature and processor tables, and feature-string resolution.
//!
//! A feature string is a comma-separated list of `+name` / `-name` toggles.
//! Resolution starts from the CPU's default feature set and applies the
//! toggles left to right, so the last occurrence of a feature wins.

use std::fmt;

use bitflags::bitflags;
use tracing::debug;

use crate::error::{Result, TargetError};

bitflags! {
    /// Set of enabled Semu subtarget features.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FeatureSet: u32 {
        /// Interrupt control instructions (OPN, CLS, INT, IRX).
        const INTERRUPTS = 1 << 0;
        /// Multiply, divide and modulo.
        const MULDIV = 1 << 1;
        /// Bitwise and shift instructions.
        const BITOPS = 1 << 2;
        /// Emulator-only checkpoint and assertion instructions.
        const EMULATED = 1 << 3;
    }
}

/// One entry of the feature table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureInfo {
    /// Name used in feature strings.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// The bit this feature controls.
    pub bit: FeatureSet,
}

/// One entry of the processor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuInfo {
    /// Name accepted as the CPU argument.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Features enabled before any explicit toggles are applied.
    pub defaults: FeatureSet,
}

/// CPU used when the CPU name is empty.
pub const DEFAULT_CPU: &str = "generic";

/// All features known to the Semu target, sorted by name.
pub const FEATURES: &[FeatureInfo] = &[
    FeatureInfo {
        name: "bitops",
        description: "Bitwise and shift instructions (INV, RSH, LSH, BOR, XOR, BAND)",
        bit: FeatureSet::BITOPS,
    },
    FeatureInfo {
        name: "emulated",
        description: "Emulator-only checkpoint and assertion instructions (CPT, AEQ)",
        bit: FeatureSet::EMULATED,
    },
    FeatureInfo {
        name: "interrupts",
        description: "Interrupt control instructions (OPN, CLS, INT, IRX)",
        bit: FeatureSet::INTERRUPTS,
    },
    FeatureInfo {
        name: "muldiv",
        description: "Multiply, divide and modulo (MUL, DIV, MOD)",
        bit: FeatureSet::MULDIV,
    },
];

/// All processors known to the Semu target.
pub const CPUS: &[CpuInfo] = &[
    CpuInfo {
        name: "generic",
        description: "Semu core with interrupts and full integer ALU",
        defaults: FeatureSet::INTERRUPTS
            .union(FeatureSet::MULDIV)
            .union(FeatureSet::BITOPS),
    },
    CpuInfo {
        name: "semu-emu",
        description: "Semu running under the emulator, with checkpoint/assert support",
        defaults: FeatureSet::all(),
    },
    CpuInfo {
        name: "semu-min",
        description: "Minimal Semu core: control flow, memory, stack, ADD/SUB",
        defaults: FeatureSet::empty(),
    },
];

/// Look up a feature by name.
pub fn feature_info(name: &str) -> Option<&'static FeatureInfo> {
    FEATURES.iter().find(|f| f.name == name)
}

/// Look up a processor by name. An empty name selects [`DEFAULT_CPU`].
pub fn cpu_info(name: &str) -> Option<&'static CpuInfo> {
    let name = if name.is_empty() { DEFAULT_CPU } else { name };
    CPUS.iter().find(|c| c.name == name)
}

/// A single `+name` or `-name` toggle from a feature string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureToggle {
    /// The feature being toggled.
    pub feature: &'static FeatureInfo,
    /// `true` for `+name`, `false` for `-name`.
    pub enable: bool,
}

impl fmt::Display for FeatureToggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.enable { '+' } else { '-' };
        write!(f, "{sign}{}", self.feature.name)
    }
}

/// Split a feature string into validated toggles, preserving order.
pub fn parse_feature_string(fs: &str) -> Result<Vec<FeatureToggle>> {
    let mut toggles = Vec::new();
    for raw in fs.split(',') {
        let token = raw.trim();
        if token.is_empty() {
            continue;
        }

        let (enable, name) = if let Some(rest) = token.strip_prefix('+') {
            (true, rest)
        } else if let Some(rest) = token.strip_prefix('-') {
            (false, rest)
        } else {
            return Err(TargetError::InvalidFeatureSpec {
                token: token.into(),
                reason: "expected '+' or '-' prefix".into(),
            });
        };
        if name.is_empty() {
            return Err(TargetError::InvalidFeatureSpec {
                token: token.into(),
                reason: "missing feature name".into(),
            });
        }

        let feature = feature_info(name).ok_or_else(|| TargetError::InvalidFeatureSpec {
            token: token.into(),
            reason: format!("unknown feature '{name}'"),
        })?;
        toggles.push(FeatureToggle { feature, enable });
    }
    Ok(toggles)
}

/// Resolve `cpu` + `fs` into a concrete feature set.
///
/// CPU defaults are applied first, then each toggle in order.
pub fn parse_subtarget_features(cpu: &str, fs: &str) -> Result<FeatureSet> {
    let info = cpu_info(cpu).ok_or_else(|| TargetError::UnknownCpu {
        cpu: cpu.into(),
        target: crate::semu::TARGET_NAME.into(),
    })?;

    let mut features = info.defaults;
    for toggle in parse_feature_string(fs)? {
        features.set(toggle.feature.bit, toggle.enable);
    }

    debug!(cpu = info.name, fs, resolved = %feature_names(features).join(","), "resolved subtarget features");
    Ok(features)
}

/// Names of the enabled features, in table order.
pub fn feature_names(features: FeatureSet) -> Vec<&'static str> {
    FEATURES
        .iter()
        .filter(|f| features.contains(f.bit))
        .map(|f| f.name)
        .collect()
}

/// Render a feature set as a canonical feature string (`+a,+b`).
pub fn to_feature_string(features: FeatureSet) -> String {
    feature_names(features)
        .iter()
        .map(|n| format!("+{n}"))
        .collect::<Vec<_>>()
        .join(",")
}
