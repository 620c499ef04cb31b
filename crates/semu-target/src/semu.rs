//! The Semu ("Slow EMUlator") target and its registration entry points.
//!
//! Hosts call [`initialize`] once at load time, or the three steps
//! individually: target info, target machine factory, machine code.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::error::Result;
use crate::machine::{MachineParams, TargetMachine};
use crate::registry::{ArchMatch, TargetDescriptor, TargetRegistry};

/// Registry key of the Semu target.
pub const TARGET_NAME: &str = "Semu";

/// Short description shown in target listings.
pub const SHORT_DESCRIPTION: &str = "Slow EMUlator";

/// Long description.
pub const LONG_DESCRIPTION: &str = "Slow EMUlator 32-bit big-endian virtual machine";

/// Data layout: big endian, 32-bit pointers aligned to 32 bits, 32-bit
/// aggregate alignment, ELF mangling, native integer width 32.
pub const DATA_LAYOUT: &str = "E-p:32:32-a:32-m:e-n32";

static THE_SEMU_TARGET: OnceCell<Arc<TargetDescriptor>> = OnceCell::new();

/// The process-wide Semu target descriptor, created on first use.
pub fn the_semu_target() -> Arc<TargetDescriptor> {
    THE_SEMU_TARGET
        .get_or_init(|| {
            Arc::new(TargetDescriptor {
                name: TARGET_NAME.into(),
                short_description: SHORT_DESCRIPTION.into(),
                long_description: LONG_DESCRIPTION.into(),
                arch_match: ArchMatch::Any,
                has_jit: false,
            })
        })
        .clone()
}

/// Register the Semu target descriptor.
pub fn initialize_target_info(registry: &TargetRegistry) -> Result<()> {
    registry.register_target(the_semu_target())
}

/// Register the Semu target machine factory.
pub fn initialize_target(registry: &TargetRegistry) -> Result<()> {
    registry.register_target_machine(TARGET_NAME, create_semu_target_machine)
}

/// Register machine-code objects. Semu has none yet.
pub fn initialize_target_mc(registry: &TargetRegistry) -> Result<()> {
    debug!(target_name = TARGET_NAME, "no machine-code objects to register");
    registry.register_machine_code(TARGET_NAME)
}

/// Run all three registration steps.
pub fn initialize(registry: &TargetRegistry) -> Result<()> {
    initialize_target_info(registry)?;
    initialize_target(registry)?;
    initialize_target_mc(registry)
}

fn create_semu_target_machine(
    target: Arc<TargetDescriptor>,
    params: MachineParams,
) -> Result<Arc<TargetMachine>> {
    TargetMachine::from_params(target, params)
}
