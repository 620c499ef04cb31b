//! Target machine: one fully configured target for one compilation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::data_layout::DataLayout;
use crate::error::{Result, TargetError};
use crate::registry::TargetDescriptor;
use crate::semu::DATA_LAYOUT;
use crate::subtarget::{Subtarget, SubtargetConfig};
use crate::triple::Triple;

/// Relocation model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelocModel {
    #[default]
    Static,
    Pic,
    DynamicNoPic,
}

/// Code model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodeModel {
    #[default]
    Small,
    Medium,
    Large,
}

/// Code generation optimization level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptLevel {
    None,
    Less,
    #[default]
    Default,
    Aggressive,
}

macro_rules! kebab_enum_str {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// Kebab-case name, as accepted by `FromStr`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = TargetError;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    _ => Err(TargetError::InvalidOption {
                        detail: format!(
                            "unknown {} '{s}' (expected one of: {})",
                            stringify!($ty),
                            [$($text),+].join(", ")
                        ),
                    }),
                }
            }
        }
    };
}

kebab_enum_str!(RelocModel { Static => "static", Pic => "pic", DynamicNoPic => "dynamic-no-pic" });
kebab_enum_str!(CodeModel { Small => "small", Medium => "medium", Large => "large" });
kebab_enum_str!(OptLevel { None => "none", Less => "less", Default => "default", Aggressive => "aggressive" });

/// Resolve an optional relocation model; unspecified means `Static`.
pub fn effective_reloc_model(rm: Option<RelocModel>) -> RelocModel {
    rm.unwrap_or(RelocModel::Static)
}

/// Resolve an optional code model; unspecified means `Small`.
pub fn effective_code_model(cm: Option<CodeModel>) -> CodeModel {
    cm.unwrap_or(CodeModel::Small)
}

/// Target-independent code generation options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TargetOptions {
    /// Stack alignment in bytes, overriding the target default.
    #[serde(default)]
    pub stack_alignment_override: Option<u32>,
}

/// Everything needed to construct a target machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineParams {
    /// Target triple.
    pub triple: Triple,
    /// CPU name (empty selects the default CPU).
    pub cpu: String,
    /// Feature string (`+a,-b`).
    pub features: String,
    /// Target-specific options.
    pub options: TargetOptions,
    /// Relocation model; `None` selects [`RelocModel::Static`].
    pub reloc_model: Option<RelocModel>,
    /// Code model; `None` selects [`CodeModel::Small`].
    pub code_model: Option<CodeModel>,
    /// Optimization level.
    pub opt_level: OptLevel,
    /// Whether the machine is used for JIT compilation.
    pub jit: bool,
}

impl MachineParams {
    /// Parameters for `triple` with every other field defaulted.
    pub fn new(triple: Triple) -> Self {
        Self {
            triple,
            ..Self::default()
        }
    }

    pub fn cpu(mut self, cpu: impl Into<String>) -> Self {
        self.cpu = cpu.into();
        self
    }

    pub fn features(mut self, features: impl Into<String>) -> Self {
        self.features = features.into();
        self
    }

    pub fn reloc_model(mut self, rm: RelocModel) -> Self {
        self.reloc_model = Some(rm);
        self
    }

    pub fn code_model(mut self, cm: CodeModel) -> Self {
        self.code_model = Some(cm);
        self
    }

    pub fn opt_level(mut self, ol: OptLevel) -> Self {
        self.opt_level = ol;
        self
    }

    pub fn stack_alignment(mut self, bytes: u32) -> Self {
        self.options.stack_alignment_override = Some(bytes);
        self
    }
}

/// Resolved, read-only machine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct MachineConfig {
    /// Effective relocation model.
    pub reloc_model: RelocModel,
    /// Effective code model.
    pub code_model: CodeModel,
    /// Optimization level.
    pub opt_level: OptLevel,
    /// Whether JIT compilation was requested.
    pub jit: bool,
    /// Data layout string.
    pub data_layout: String,
}

/// A function as seen by subtarget lookup: a name and string attributes
/// such as `target-cpu` / `target-features`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// One configured Semu target machine.
///
/// Owns exactly one [`Subtarget`]; shared read-only behind an `Arc`.
#[derive(Debug)]
pub struct TargetMachine {
    target: Arc<TargetDescriptor>,
    triple: Triple,
    cpu: String,
    feature_string: String,
    options: TargetOptions,
    config: MachineConfig,
    data_layout: DataLayout,
    subtarget: Subtarget,
}

impl TargetMachine {
    /// Construct a machine and its subtarget.
    ///
    /// Fails if the CPU is unknown, the feature string is malformed, or an
    /// option is out of range.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        target: Arc<TargetDescriptor>,
        triple: Triple,
        cpu: &str,
        feature_string: &str,
        options: TargetOptions,
        reloc_model: Option<RelocModel>,
        code_model: Option<CodeModel>,
        opt_level: OptLevel,
        jit: bool,
    ) -> Result<Arc<Self>> {
        let config = MachineConfig {
            reloc_model: effective_reloc_model(reloc_model),
            code_model: effective_code_model(code_model),
            opt_level,
            jit,
            data_layout: DATA_LAYOUT.to_string(),
        };
        let data_layout = DataLayout::parse(DATA_LAYOUT)?;

        // Semu is big-endian regardless of triple.
        let little_endian = false;

        if !triple.is_semu() {
            warn!(triple = %triple, "triple architecture is not semu; treating it as semu");
        }
        if jit && !target.has_jit {
            warn!(target_name = %target.name, "JIT requested but target has no JIT support");
        }

        let resolved = SubtargetConfig::resolve(
            triple.clone(),
            cpu,
            feature_string,
            little_endian,
            options.stack_alignment_override,
        )?;

        let machine = Arc::new_cyclic(|weak| Self {
            target,
            triple,
            cpu: resolved.cpu.clone(),
            feature_string: feature_string.to_string(),
            options,
            config,
            data_layout,
            subtarget: Subtarget::from_config(resolved, weak.clone()),
        });

        debug!(
            target_name = %machine.target.name,
            triple = %machine.triple,
            cpu = %machine.cpu,
            reloc = %machine.config.reloc_model,
            code_model = %machine.config.code_model,
            "constructed target machine"
        );
        Ok(machine)
    }

    /// Construct from bundled parameters.
    pub fn from_params(target: Arc<TargetDescriptor>, params: MachineParams) -> Result<Arc<Self>> {
        Self::new(
            target,
            params.triple,
            &params.cpu,
            &params.features,
            params.options,
            params.reloc_model,
            params.code_model,
            params.opt_level,
            params.jit,
        )
    }

    /// The subtarget for `function`.
    ///
    /// Semu has no per-function specialization: every function, whatever its
    /// attributes, gets the machine's single subtarget.
    pub fn get_subtarget_for(&self, _function: &Function) -> &Subtarget {
        &self.subtarget
    }

    /// The machine's subtarget.
    pub fn subtarget(&self) -> &Subtarget {
        &self.subtarget
    }

    pub fn target(&self) -> &Arc<TargetDescriptor> {
        &self.target
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

    pub fn options(&self) -> &TargetOptions {
        &self.options
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn reloc_model(&self) -> RelocModel {
        self.config.reloc_model
    }

    pub fn code_model(&self) -> CodeModel {
        self.config.code_model
    }

    pub fn opt_level(&self) -> OptLevel {
        self.config.opt_level
    }

    pub fn is_jit(&self) -> bool {
        self.config.jit
    }

    /// The data layout string, `"E-p:32:32-a:32-m:e-n32"`.
    pub fn data_layout_str(&self) -> &str {
        &self.config.data_layout
    }

    pub fn data_layout(&self) -> &DataLayout {
        &self.data_layout
    }
}
