//! Registration through target machine construction, as a host would drive it.

use std::sync::Arc;
use std::thread;

use semu_target::capability::{FrameLowering, InstrInfo, RegisterInfo};
use semu_target::config::{generate_template, parse_machine_toml};
use semu_target::{
    semu, Capability, CodeModel, FeatureSet, Function, MachineParams, OptLevel, RelocModel,
    TargetError, TargetRegistry, Triple,
};

fn registry() -> TargetRegistry {
    let registry = TargetRegistry::new();
    semu::initialize(&registry).unwrap();
    registry
}

#[test]
fn default_machine_for_semu_triple() {
    let registry = registry();
    let triple = Triple::parse("semu-unknown-unknown").unwrap();
    let target = registry.lookup_for_triple(&triple).unwrap();
    assert_eq!(target.name, "Semu");
    assert_eq!(target.short_description, "Slow EMUlator");

    let tm = registry
        .create_target_machine(&target.name, MachineParams::new(triple).cpu("generic"))
        .unwrap();

    assert_eq!(tm.reloc_model(), RelocModel::Static);
    assert_eq!(tm.code_model(), CodeModel::Small);
    assert_eq!(tm.opt_level(), OptLevel::Default);
    assert_eq!(tm.data_layout_str(), "E-p:32:32-a:32-m:e-n32");
    assert!(!tm.is_jit());

    let st = tm.get_subtarget_for(&Function::new("main"));
    assert!(!st.is_xray_supported());
    assert!(!st.is_little_endian());
    assert_eq!(st.cpu(), "generic");
    assert!(Arc::ptr_eq(&st.machine().unwrap(), &tm));
}

#[test]
fn one_subtarget_for_every_function() {
    let registry = registry();
    let tm = registry
        .create_target_machine("Semu", MachineParams::new(Triple::semu()))
        .unwrap();

    let plain = Function::new("f");
    let tuned = Function::new("g")
        .with_attribute("target-cpu", "semu-min")
        .with_attribute("target-features", "-muldiv");
    assert!(std::ptr::eq(
        tm.get_subtarget_for(&plain),
        tm.get_subtarget_for(&tuned)
    ));
    assert!(tm.get_subtarget_for(&tuned).has_feature(FeatureSet::MULDIV));
}

#[test]
fn codegen_queries_through_the_subtarget() {
    let registry = registry();
    let params = MachineParams::new(Triple::semu())
        .cpu("semu-min")
        .features("+muldiv,+bitops,-bitops")
        .stack_alignment(8);
    let tm = registry.create_target_machine("Semu", params).unwrap();
    let st = tm.subtarget();

    let ii = st.instr_info().unwrap();
    assert!(ii.is_legal(ii.by_mnemonic("DIV").unwrap()));
    assert!(!ii.is_legal(ii.by_mnemonic("BAND").unwrap()));

    let frame = st.frame_lowering().unwrap();
    assert!(frame.stack_grows_up());
    assert_eq!(frame.stack_alignment(), 8);
    assert_eq!(frame.align_stack_size(13), Some(16));
    assert_eq!(frame.align_stack_size(u32::MAX), None);

    let regs = st.register_info().unwrap();
    assert_eq!(regs.stack_pointer().name, "sp");
    assert_eq!(regs.general_purpose().len(), 8);

    for cap in Capability::ALL.into_iter().filter(|c| c.is_global_isel()) {
        assert!(!st.supports(cap));
    }
    assert!(matches!(
        st.legalizer_info(),
        Err(TargetError::CapabilityUnavailable { .. })
    ));
}

#[test]
fn bad_requests_fail_before_a_machine_exists() {
    let registry = registry();
    let base = || MachineParams::new(Triple::semu());

    assert!(matches!(
        registry.create_target_machine("Semu", base().cpu("pdp11")),
        Err(TargetError::UnknownCpu { .. })
    ));
    assert!(matches!(
        registry.create_target_machine("Semu", base().features("muldiv")),
        Err(TargetError::InvalidFeatureSpec { .. })
    ));
    assert!(matches!(
        registry.create_target_machine("Semu", base().stack_alignment(6)),
        Err(TargetError::InvalidOption { .. })
    ));
    assert!(matches!(
        registry.create_target_machine("Mips", base()),
        Err(TargetError::UnknownTarget { .. })
    ));
}

#[test]
fn machine_from_config_file() {
    let registry = registry();
    let mut machine = parse_machine_toml(&generate_template("board").unwrap()).unwrap();
    machine.cpu = "semu-emu".into();
    machine.reloc_model = Some(RelocModel::Pic);

    let tm = registry
        .create_target_machine(&machine.target, machine.to_params())
        .unwrap();
    assert_eq!(tm.reloc_model(), RelocModel::Pic);
    assert!(tm.subtarget().has_feature(FeatureSet::EMULATED));
}

#[test]
fn machines_outlive_registry_shutdown() {
    let registry = registry();
    let tm = registry
        .create_target_machine("Semu", MachineParams::new(Triple::semu()))
        .unwrap();
    registry.shutdown();
    assert!(registry.is_empty());
    assert_eq!(tm.target().name, "Semu");
}

#[test]
fn concurrent_construction_and_queries() {
    let registry = Arc::new(registry());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let cpu = if i % 2 == 0 { "generic" } else { "semu-min" };
                let tm = registry
                    .create_target_machine("Semu", MachineParams::new(Triple::semu()).cpu(cpu))
                    .unwrap();
                tm.subtarget().features()
            })
        })
        .collect();

    let results: Vec<FeatureSet> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results[0], results[2]);
    assert_eq!(results[1], FeatureSet::empty());
}
