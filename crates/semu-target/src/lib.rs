//! Target registration, subtarget and target machine model for the Semu
//! ("Slow EMUlator") backend.
//!
//! Three layers, leaves first:
//! - **Registry:** target names mapped to descriptors and machine factories
//! - **Subtarget:** resolved CPU, features and stack alignment, plus the
//!   capability objects the code generator queries
//! - **Target machine:** owns one subtarget and the machine-wide settings
//!   (relocation model, code model, data layout)
//!
//! ```
//! use semu_target::{semu, MachineParams, TargetRegistry, Triple};
//!
//! let registry = TargetRegistry::new();
//! semu::initialize(&registry).unwrap();
//! let tm = registry
//!     .create_target_machine("Semu", MachineParams::new(Triple::semu()))
//!     .unwrap();
//! assert_eq!(tm.data_layout_str(), "E-p:32:32-a:32-m:e-n32");
//! ```

pub mod capability;
pub mod config;
pub mod data_layout;
pub mod error;
pub mod features;
pub mod isa;
pub mod machine;
pub mod registry;
pub mod semu;
pub mod subtarget;
pub mod triple;

pub use capability::Capability;
pub use error::{Result, TargetError};
pub use features::FeatureSet;
pub use machine::{
    CodeModel, Function, MachineConfig, MachineParams, OptLevel, RelocModel, TargetMachine,
    TargetOptions,
};
pub use registry::{ArchMatch, TargetDescriptor, TargetRegistry};
pub use subtarget::{Subtarget, SubtargetConfig};
pub use triple::Triple;
