//! `semu-llc config`: machine configuration files in `targets/`.

use std::path::Path;

use anyhow::{bail, Context, Result};

use semu_target::config::{
    discover_machines, generate_template, load_machine_toml, validate_machine_config, Severity,
};

/// Print a template configuration, or write it to
/// `<project_dir>/targets/<name>.machine.toml` when `project_dir` is given.
pub fn template(name: &str, project_dir: Option<&Path>) -> Result<()> {
    if name.is_empty() || name.contains(['/', '\\']) {
        bail!("invalid configuration name '{name}'");
    }
    let text = generate_template(name)?;

    let Some(project_dir) = project_dir else {
        print!("{text}");
        return Ok(());
    };

    let targets_dir = project_dir.join("targets");
    let path = targets_dir.join(format!("{name}.machine.toml"));
    if path.exists() {
        bail!("'{}' already exists", path.display());
    }
    std::fs::create_dir_all(&targets_dir)
        .with_context(|| format!("failed to create {}", targets_dir.display()))?;
    std::fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Created {}", path.display());
    Ok(())
}

/// Validate a configuration file. Warnings are printed; errors fail.
pub fn validate(path: &Path) -> Result<()> {
    let machine =
        load_machine_toml(path).with_context(|| format!("failed to load {}", path.display()))?;

    let issues = match validate_machine_config(&machine) {
        Ok(()) => {
            println!("{}: ok", machine.name);
            return Ok(());
        }
        Err(issues) => issues,
    };

    let mut errors = 0;
    for issue in &issues {
        let label = match issue.severity {
            Severity::Error => {
                errors += 1;
                "error"
            }
            Severity::Warning => "warning",
        };
        println!("  {label}: {}", issue.message);
    }
    if errors > 0 {
        bail!("{}: {errors} error(s)", machine.name);
    }
    println!("{}: ok ({} warning(s))", machine.name, issues.len());
    Ok(())
}

/// List configurations found under `<project_dir>/targets/`.
pub fn list(project_dir: &Path) -> Result<()> {
    let machines = discover_machines(project_dir)?;
    if machines.is_empty() {
        println!("No machine configurations in {}", project_dir.join("targets").display());
        println!("Use 'semu-llc config template <name> --write' to create one.");
        return Ok(());
    }

    println!("Machine configurations:");
    println!();
    for (name, path) in machines {
        match load_machine_toml(&path) {
            Ok(m) => {
                let cpu = if m.cpu.is_empty() { "generic" } else { m.cpu.as_str() };
                println!("  {name:<20} {} cpu={cpu}", m.triple);
            }
            Err(e) => println!("  {name:<20} (unreadable: {e})"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_print_and_write() {
        assert!(template("board", None).is_ok());

        let dir = tempfile::tempdir().unwrap();
        template("board", Some(dir.path())).unwrap();
        assert!(dir.path().join("targets/board.machine.toml").is_file());
        assert!(template("board", Some(dir.path())).is_err());
    }

    #[test]
    fn template_rejects_path_names() {
        assert!(template("../escape", None).is_err());
        assert!(template("", None).is_err());
    }

    #[test]
    fn validate_errors_and_warnings() {
        let dir = tempfile::tempdir().unwrap();

        let bad = dir.path().join("bad.machine.toml");
        std::fs::write(&bad, "name = \"bad\"\ntriple = \"semu\"\ncpu = \"z80\"\n").unwrap();
        assert!(validate(&bad).is_err());

        let warn = dir.path().join("warn.machine.toml");
        std::fs::write(&warn, "name = \"warn\"\ntriple = \"mips-unknown-linux\"\n").unwrap();
        assert!(validate(&warn).is_ok());

        assert!(validate(&dir.path().join("missing.machine.toml")).is_err());
    }

    #[test]
    fn list_empty_and_populated() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list(dir.path()).is_ok());

        template("alpha", Some(dir.path())).unwrap();
        std::fs::write(dir.path().join("targets/broken.machine.toml"), "[[[").unwrap();
        assert!(list(dir.path()).is_ok());
    }
}
