//! TOML machine configuration files.
//!
//! A machine configuration records everything needed to construct a target
//! machine. Files are named `<name>.machine.toml` and live in the `targets/`
//! directory of a project. This module loads, validates, serializes and
//! discovers them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TargetError};
use crate::features::{self, cpu_info, parse_feature_string};
use crate::isa::WORD_SIZE;
use crate::machine::{CodeModel, MachineParams, OptLevel, RelocModel, TargetOptions};
use crate::semu;
use crate::triple::Triple;

const FILE_SUFFIX: &str = ".machine.toml";

/// A machine configuration as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MachineFile {
    /// Configuration name.
    pub name: String,
    /// Registered target name.
    #[serde(default = "default_target")]
    pub target: String,
    /// Target triple.
    pub triple: Triple,
    /// CPU name (empty selects the default CPU).
    #[serde(default)]
    pub cpu: String,
    /// Feature string (`+a,-b`).
    #[serde(default)]
    pub features: String,
    #[serde(default)]
    pub reloc_model: Option<RelocModel>,
    #[serde(default)]
    pub code_model: Option<CodeModel>,
    #[serde(default)]
    pub opt_level: OptLevel,
    #[serde(default)]
    pub jit: bool,
    #[serde(default)]
    pub options: TargetOptions,
}

fn default_target() -> String {
    semu::TARGET_NAME.to_string()
}

impl MachineFile {
    /// Construction parameters described by this file.
    pub fn to_params(&self) -> MachineParams {
        MachineParams {
            triple: self.triple.clone(),
            cpu: self.cpu.clone(),
            features: self.features.clone(),
            options: self.options.clone(),
            reloc_model: self.reloc_model,
            code_model: self.code_model,
            opt_level: self.opt_level,
            jit: self.jit,
        }
    }
}

/// Severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A validation issue found in a machine configuration.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
}

/// Load a machine configuration from a `.machine.toml` file.
pub fn load_machine_toml(path: &Path) -> Result<MachineFile> {
    if !path.exists() {
        return Err(TargetError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    parse_machine_toml(&content)
}

/// Parse a machine configuration from a TOML string.
pub fn parse_machine_toml(toml_str: &str) -> Result<MachineFile> {
    let machine: MachineFile = toml::from_str(toml_str)?;
    Ok(machine)
}

/// Serialize a machine configuration to pretty TOML.
pub fn machine_to_toml(machine: &MachineFile) -> Result<String> {
    let toml_str = toml::to_string_pretty(machine)?;
    Ok(toml_str)
}

/// Validate a machine configuration against the Semu target.
///
/// Returns `Ok(())` if valid, or `Err(issues)`. Warnings alone also produce
/// `Err`; callers decide whether to treat them as fatal.
pub fn validate_machine_config(
    machine: &MachineFile,
) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    let mut error = |message: String| {
        issues.push(ValidationIssue {
            severity: Severity::Error,
            message,
        })
    };

    // 1. Target must be one this crate provides
    if machine.target != semu::TARGET_NAME {
        error(format!("unknown target '{}'", machine.target));
    }

    // 2. CPU is in the processor table
    if cpu_info(&machine.cpu).is_none() {
        error(format!("unknown CPU '{}'", machine.cpu));
    }

    // 3. Feature string is well formed
    let toggles = match parse_feature_string(&machine.features) {
        Ok(toggles) => toggles,
        Err(e) => {
            error(e.to_string());
            Vec::new()
        }
    };

    // 4. Stack alignment override is a power of two >= word size
    if let Some(align) = machine.options.stack_alignment_override {
        if !align.is_power_of_two() || align < WORD_SIZE {
            error(format!(
                "stack-alignment-override {align} must be a power of two >= {WORD_SIZE}"
            ));
        }
    }

    // 5. JIT requested on a target without JIT support
    if machine.jit && !semu::the_semu_target().has_jit {
        error(format!("target '{}' does not support JIT", machine.target));
    }

    // 6. Triple names a foreign architecture (accepted, but suspicious)
    if !machine.triple.is_semu() {
        issues.push(ValidationIssue {
            severity: Severity::Warning,
            message: format!(
                "triple architecture '{}' is not 'semu'",
                machine.triple.arch
            ),
        });
    }

    // 7. Features toggled more than once (only the last toggle counts)
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    for t in &toggles {
        *seen.entry(t.feature.name).or_default() += 1;
    }
    for (name, count) in seen.into_iter().filter(|(_, c)| *c > 1) {
        issues.push(ValidationIssue {
            severity: Severity::Warning,
            message: format!("feature '{name}' toggled {count} times; the last toggle wins"),
        });
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Generate a template `.machine.toml` for a new configuration.
///
/// Seeds from the generic CPU with the given name.
pub fn generate_template(name: &str) -> Result<String> {
    let machine = MachineFile {
        name: name.into(),
        target: default_target(),
        triple: Triple::semu(),
        cpu: features::DEFAULT_CPU.into(),
        features: String::new(),
        reloc_model: Some(RelocModel::Static),
        code_model: Some(CodeModel::Small),
        opt_level: OptLevel::Default,
        jit: false,
        options: TargetOptions::default(),
    };
    machine_to_toml(&machine)
}

/// Discover all `.machine.toml` files in a project's `targets/` directory.
///
/// Returns a list of (config_name, file_path) pairs sorted by name.
pub fn discover_machines(project_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let targets_dir = project_dir.join("targets");
    if !targets_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut machines = Vec::new();
    for entry in std::fs::read_dir(&targets_dir)? {
        let path = entry?.path();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(FILE_SUFFIX))
            .map(str::to_string);
        if let Some(name) = name {
            machines.push((name, path));
        }
    }
    machines.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(machines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_toml() {
        let machine = parse_machine_toml(
            r#"
name = "bare"
triple = "semu-unknown-unknown"
"#,
        )
        .unwrap();
        assert_eq!(machine.target, "Semu");
        assert_eq!(machine.cpu, "");
        assert!(machine.reloc_model.is_none());
        assert_eq!(machine.opt_level, OptLevel::Default);
        assert!(validate_machine_config(&machine).is_ok());
    }

    #[test]
    fn parse_full_toml() {
        let machine = parse_machine_toml(
            r#"
name = "emu-debug"
target = "Semu"
triple = "semu-acme-none"
cpu = "semu-emu"
features = "-bitops"
reloc-model = "dynamic-no-pic"
code-model = "medium"
opt-level = "none"
jit = false

[options]
stack-alignment-override = 16
"#,
        )
        .unwrap();
        assert_eq!(machine.triple.vendor, "acme");
        assert_eq!(machine.reloc_model, Some(RelocModel::DynamicNoPic));
        assert_eq!(machine.code_model, Some(CodeModel::Medium));
        assert_eq!(machine.opt_level, OptLevel::None);
        assert_eq!(machine.options.stack_alignment_override, Some(16));

        let params = machine.to_params();
        assert_eq!(params.cpu, "semu-emu");
        assert_eq!(params.features, "-bitops");
    }

    #[test]
    fn parse_invalid_returns_error() {
        assert!(parse_machine_toml("this is not valid toml [[[").is_err());
        assert!(parse_machine_toml("name = \"no-triple\"").is_err());
        assert!(parse_machine_toml("name = \"x\"\ntriple = \"\"").is_err());
        assert!(parse_machine_toml("name = \"x\"\ntriple = \"semu\"\nreloc-model = \"ropi\"").is_err());
    }

    #[test]
    fn validate_reports_each_problem() {
        let mut machine = parse_machine_toml(&generate_template("bad").unwrap()).unwrap();
        machine.target = "Mips".into();
        machine.cpu = "r4000".into();
        machine.features = "+muldiv,fpu".into();
        machine.options.stack_alignment_override = Some(3);
        machine.jit = true;

        let issues = validate_machine_config(&machine).unwrap_err();
        let errors: Vec<_> = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 5);
        assert!(issues.iter().any(|i| i.message.contains("unknown target")));
        assert!(issues.iter().any(|i| i.message.contains("unknown CPU")));
        assert!(issues.iter().any(|i| i.message.contains("'fpu'")));
        assert!(issues.iter().any(|i| i.message.contains("power of two")));
        assert!(issues.iter().any(|i| i.message.contains("JIT")));
    }

    #[test]
    fn validate_warnings() {
        let mut machine = parse_machine_toml(&generate_template("warn").unwrap()).unwrap();
        machine.triple = Triple::parse("mips-unknown-linux").unwrap();
        machine.features = "+muldiv,-muldiv".into();
        let issues = validate_machine_config(&machine).unwrap_err();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.severity == Severity::Warning));
        assert!(issues.iter().any(|i| i.message.contains("toggled 2 times")));
    }

    #[test]
    fn generate_template_is_valid() {
        let toml_str = generate_template("my-board").unwrap();
        let machine = parse_machine_toml(&toml_str).unwrap();
        assert_eq!(machine.name, "my-board");
        assert_eq!(machine.cpu, "generic");
        assert_eq!(machine.triple, Triple::semu());
        assert!(validate_machine_config(&machine).is_ok());
    }

    #[test]
    fn discover_machines_finds_files() {
        let dir = tempfile::tempdir().unwrap();
        let targets_dir = dir.path().join("targets");
        std::fs::create_dir_all(&targets_dir).unwrap();

        let template = generate_template("a").unwrap();
        std::fs::write(targets_dir.join("zeta.machine.toml"), &template).unwrap();
        std::fs::write(targets_dir.join("alpha.machine.toml"), &template).unwrap();
        std::fs::write(targets_dir.join("notes.toml"), "ignore me").unwrap();

        let machines = discover_machines(dir.path()).unwrap();
        assert_eq!(machines.len(), 2);
        assert_eq!(machines[0].0, "alpha");
        assert_eq!(machines[1].0, "zeta");
    }

    #[test]
    fn discover_without_targets_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_machines(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn load_not_found() {
        let result = load_machine_toml(Path::new("/nonexistent/x.machine.toml"));
        assert!(matches!(result.unwrap_err(), TargetError::NotFound { .. }));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file-test.machine.toml");
        std::fs::write(&path, generate_template("file-test").unwrap()).unwrap();
        let machine = load_machine_toml(&path).unwrap();
        assert_eq!(machine.name, "file-test");
    }
}
