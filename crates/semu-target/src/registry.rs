//! Target registry: maps target names to descriptors and machine factories.
//!
//! The registry is an explicit object owned by the host and passed by
//! reference to the per-target initialization functions (see
//! [`crate::semu::initialize`]). It is safe to share between threads.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, TargetError};
use crate::machine::{MachineParams, TargetMachine};
use crate::triple::Triple;

/// Which triples a target accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchMatch {
    /// Accept every triple.
    Any,
    /// Accept triples whose architecture equals this name (case-insensitive).
    Arch(String),
}

impl ArchMatch {
    pub fn matches(&self, triple: &Triple) -> bool {
        match self {
            ArchMatch::Any => true,
            ArchMatch::Arch(arch) => triple.arch.eq_ignore_ascii_case(arch),
        }
    }
}

/// Identity of a registered target. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TargetDescriptor {
    /// Lookup key (e.g. "Semu").
    pub name: String,
    /// One-line description shown in target listings.
    pub short_description: String,
    /// Longer description.
    pub long_description: String,
    /// Triples this target accepts.
    pub arch_match: ArchMatch,
    /// Whether the target supports JIT compilation.
    pub has_jit: bool,
}

/// Builds a target machine for a registered target.
pub type MachineFactory = fn(Arc<TargetDescriptor>, MachineParams) -> Result<Arc<TargetMachine>>;

#[derive(Debug, Clone)]
struct TargetEntry {
    descriptor: Arc<TargetDescriptor>,
    machine_factory: Option<MachineFactory>,
    machine_code_registered: bool,
}

/// Snapshot of one registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredTarget {
    pub descriptor: Arc<TargetDescriptor>,
    pub has_machine_factory: bool,
    pub has_machine_code: bool,
}

/// Thread-safe table of registered targets, keyed by name.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    entries: RwLock<BTreeMap<String, TargetEntry>>,
}

impl TargetRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `descriptor` under its name.
    ///
    /// Registering the same descriptor again is a no-op; a different
    /// descriptor under an existing name is rejected.
    pub fn register_target(&self, descriptor: Arc<TargetDescriptor>) -> Result<()> {
        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(&descriptor.name) {
            if Arc::ptr_eq(&existing.descriptor, &descriptor) {
                return Ok(());
            }
            return Err(TargetError::DuplicateRegistration {
                name: descriptor.name.clone(),
            });
        }

        debug!(target_name = %descriptor.name, "registered target");
        entries.insert(
            descriptor.name.clone(),
            TargetEntry {
                descriptor,
                machine_factory: None,
                machine_code_registered: false,
            },
        );
        Ok(())
    }

    /// Attach a target machine factory to a registered target.
    pub fn register_target_machine(&self, name: &str, factory: MachineFactory) -> Result<()> {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(name)
            .ok_or_else(|| TargetError::UnknownTarget { name: name.into() })?;

        match entry.machine_factory {
            Some(existing) if existing as usize == factory as usize => Ok(()),
            Some(_) => Err(TargetError::DuplicateRegistration { name: name.into() }),
            None => {
                debug!(target_name = name, "registered target machine factory");
                entry.machine_factory = Some(factory);
                Ok(())
            }
        }
    }

    /// Record machine-code registration for a target.
    ///
    /// No assembler, disassembler or encoder objects exist yet; this only
    /// marks the target as having gone through MC initialization.
    pub fn register_machine_code(&self, name: &str) -> Result<()> {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(name)
            .ok_or_else(|| TargetError::UnknownTarget { name: name.into() })?;
        entry.machine_code_registered = true;
        Ok(())
    }

    /// Look up a target by name.
    pub fn lookup_by_name(&self, name: &str) -> Result<Arc<TargetDescriptor>> {
        self.entries
            .read()
            .get(name)
            .map(|e| Arc::clone(&e.descriptor))
            .ok_or_else(|| TargetError::UnknownTarget { name: name.into() })
    }

    /// First target, in name order, that accepts `triple`.
    pub fn lookup_for_triple(&self, triple: &Triple) -> Result<Arc<TargetDescriptor>> {
        self.entries
            .read()
            .values()
            .find(|e| e.descriptor.arch_match.matches(triple))
            .map(|e| Arc::clone(&e.descriptor))
            .ok_or_else(|| TargetError::NoTargetForTriple {
                triple: triple.to_string(),
            })
    }

    /// Build a target machine using the factory registered for `name`.
    pub fn create_target_machine(
        &self,
        name: &str,
        params: MachineParams,
    ) -> Result<Arc<TargetMachine>> {
        let (descriptor, factory) = {
            let entries = self.entries.read();
            let entry = entries
                .get(name)
                .ok_or_else(|| TargetError::UnknownTarget { name: name.into() })?;
            let factory = entry
                .machine_factory
                .ok_or_else(|| TargetError::NoMachineFactory { name: name.into() })?;
            (Arc::clone(&entry.descriptor), factory)
        };
        factory(descriptor, params)
    }

    /// Snapshot of all registered targets, sorted by name.
    pub fn targets(&self) -> Vec<RegisteredTarget> {
        self.entries
            .read()
            .values()
            .map(|e| RegisteredTarget {
                descriptor: Arc::clone(&e.descriptor),
                has_machine_factory: e.machine_factory.is_some(),
                has_machine_code: e.machine_code_registered,
            })
            .collect()
    }

    /// Number of registered targets.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no targets are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every entry. Machines already built keep their descriptors.
    pub fn shutdown(&self) {
        let mut entries = self.entries.write();
        debug!(count = entries.len(), "target registry shut down");
        entries.clear();
    }
}
