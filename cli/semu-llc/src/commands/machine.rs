//! `semu-llc machine`: construct a target machine and report what it resolved.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::debug;

use semu_target::capability::InstrInfo;
use semu_target::config::load_machine_toml;
use semu_target::features;
use semu_target::{
    Capability, CodeModel, MachineParams, OptLevel, RelocModel, TargetMachine, TargetRegistry,
    Triple,
};

/// What to build: a registered target name plus construction parameters.
#[derive(Debug, Clone)]
pub struct MachineRequest {
    pub target: String,
    pub params: MachineParams,
}

impl MachineRequest {
    /// Build a request from command-line flags. Unset flags take the
    /// target defaults.
    #[allow(clippy::too_many_arguments)]
    pub fn from_flags(
        triple: Option<&str>,
        cpu: Option<&str>,
        features: Option<&str>,
        reloc: Option<&str>,
        code_model: Option<&str>,
        opt_level: Option<&str>,
        jit: bool,
        stack_align: Option<u32>,
    ) -> Result<Self> {
        let triple = match triple {
            Some(t) => Triple::parse(t)?,
            None => Triple::semu(),
        };
        let mut params = MachineParams::new(triple)
            .cpu(cpu.unwrap_or_default())
            .features(features.unwrap_or_default());
        if let Some(rm) = reloc {
            params = params.reloc_model(rm.parse::<RelocModel>()?);
        }
        if let Some(cm) = code_model {
            params = params.code_model(cm.parse::<CodeModel>()?);
        }
        if let Some(ol) = opt_level {
            params = params.opt_level(ol.parse::<OptLevel>()?);
        }
        if let Some(bytes) = stack_align {
            params = params.stack_alignment(bytes);
        }
        params.jit = jit;

        Ok(Self {
            target: semu_target::semu::TARGET_NAME.to_string(),
            params,
        })
    }

    /// Build a request from a `.machine.toml` file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let machine = load_machine_toml(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        debug!(path = %path.display(), config = %machine.name, "loaded machine configuration");
        Ok(Self {
            target: machine.target.clone(),
            params: machine.to_params(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct MachineReport {
    target: String,
    triple: String,
    cpu: String,
    feature_string: String,
    features: Vec<&'static str>,
    reloc_model: RelocModel,
    code_model: CodeModel,
    opt_level: OptLevel,
    jit: bool,
    data_layout: String,
    stack_alignment: u32,
    capabilities: Vec<Capability>,
    legal_instructions: usize,
}

fn report(tm: &TargetMachine) -> Result<MachineReport> {
    let st = tm.subtarget();
    Ok(MachineReport {
        target: tm.target().name.clone(),
        triple: tm.triple().to_string(),
        cpu: tm.cpu().to_string(),
        feature_string: tm.feature_string().to_string(),
        features: features::feature_names(st.features()),
        reloc_model: tm.reloc_model(),
        code_model: tm.code_model(),
        opt_level: tm.opt_level(),
        jit: tm.is_jit(),
        data_layout: tm.data_layout_str().to_string(),
        stack_alignment: st.stack_alignment(),
        capabilities: st.capabilities(),
        legal_instructions: st.instr_info()?.legal_instructions().len(),
    })
}

/// Construct the requested machine and print its configuration.
pub fn run(registry: &TargetRegistry, request: MachineRequest, format: Option<&str>) -> Result<()> {
    let tm = registry
        .create_target_machine(&request.target, request.params)
        .with_context(|| format!("failed to construct a '{}' target machine", request.target))?;
    let report = report(&tm)?;

    match format {
        Some("json") => println!("{}", serde_json::to_string_pretty(&report)?),
        Some(other) => bail!("unknown format '{other}' (expected 'json')"),
        None => {
            println!("=== Target machine: {} ===", report.target);
            println!("  Triple:         {}", report.triple);
            println!("  CPU:            {}", report.cpu);
            println!("  Feature string: {:?}", report.feature_string);
            println!("  Features:       {}", report.features.join(", "));
            println!("  Reloc model:    {}", report.reloc_model);
            println!("  Code model:     {}", report.code_model);
            println!("  Opt level:      {}", report.opt_level);
            println!("  JIT:            {}", report.jit);
            println!("  Data layout:    {}", report.data_layout);
            println!("  Stack align:    {} bytes", report.stack_alignment);
            println!("  Legal instrs:   {}", report.legal_instructions);
            let caps: Vec<&str> = report.capabilities.iter().map(|c| c.name()).collect();
            println!("  Capabilities:   {}", caps.join(", "));
        }
    }
    Ok(())
}
