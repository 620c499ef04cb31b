//! semu-llc: command-line driver for the Semu target backend.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use semu_target::{semu, TargetRegistry};

use commands::machine::MachineRequest;

#[derive(Parser)]
#[command(name = "semu-llc", version, about = "Semu (Slow EMUlator) target backend driver")]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered targets
    Targets,
    /// List CPUs and subtarget features
    Cpus,
    /// Describe the Semu target: identity, ISA, instructions, data layout
    Describe {
        /// Output format (default: human-readable, "toml" or "json")
        #[arg(long)]
        format: Option<String>,
    },
    /// Construct a target machine and print its resolved configuration
    Machine {
        /// Target triple (default: semu-unknown-unknown)
        #[arg(long)]
        triple: Option<String>,
        /// CPU name (default: generic)
        #[arg(long)]
        cpu: Option<String>,
        /// Feature string, e.g. "+muldiv,-bitops"
        #[arg(long)]
        features: Option<String>,
        /// Relocation model (static, pic, dynamic-no-pic)
        #[arg(long)]
        reloc: Option<String>,
        /// Code model (small, medium, large)
        #[arg(long)]
        code_model: Option<String>,
        /// Optimization level (none, less, default, aggressive)
        #[arg(long)]
        opt_level: Option<String>,
        /// Request JIT compilation
        #[arg(long)]
        jit: bool,
        /// Stack alignment override in bytes
        #[arg(long)]
        stack_align: Option<u32>,
        /// Read machine parameters from a .machine.toml file instead
        #[arg(long, conflicts_with_all = ["triple", "cpu", "features", "reloc", "code_model", "opt_level", "jit", "stack_align"])]
        config: Option<PathBuf>,
        /// Output format (default: human-readable, "json")
        #[arg(long)]
        format: Option<String>,
    },
    /// Manage machine configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

impl Commands {
    /// Subcommand name as typed on the command line.
    fn name(&self) -> &'static str {
        match self {
            Commands::Targets => "targets",
            Commands::Cpus => "cpus",
            Commands::Describe { .. } => "describe",
            Commands::Machine { .. } => "machine",
            Commands::Config { action } => match action {
                ConfigAction::Template { .. } => "config template",
                ConfigAction::Validate { .. } => "config validate",
                ConfigAction::List => "config list",
            },
        }
    }
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print a template configuration, or write it into targets/
    Template {
        /// Configuration name
        name: String,
        /// Write targets/<name>.machine.toml instead of printing
        #[arg(long)]
        write: bool,
    },
    /// Validate a configuration file
    Validate {
        /// Path to a .machine.toml file
        file: PathBuf,
    },
    /// List configurations in targets/
    List,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let registry = TargetRegistry::new();
    semu::initialize(&registry)?;
    debug!(command = cli.command.name(), cwd = %cwd.display(), "dispatching");

    let result = match cli.command {
        Commands::Targets => commands::targets::run(&registry),

        Commands::Cpus => commands::cpus::run(),

        Commands::Describe { format } => commands::describe::run(&registry, format.as_deref()),

        Commands::Machine {
            triple,
            cpu,
            features,
            reloc,
            code_model,
            opt_level,
            jit,
            stack_align,
            config,
            format,
        } => {
            let request = match config {
                Some(path) => MachineRequest::from_file(&path)?,
                None => MachineRequest::from_flags(
                    triple.as_deref(),
                    cpu.as_deref(),
                    features.as_deref(),
                    reloc.as_deref(),
                    code_model.as_deref(),
                    opt_level.as_deref(),
                    jit,
                    stack_align,
                )?,
            };
            commands::machine::run(&registry, request, format.as_deref())
        }

        Commands::Config { action } => match action {
            ConfigAction::Template { name, write } => {
                commands::config::template(&name, write.then_some(cwd.as_path()))
            }
            ConfigAction::Validate { file } => commands::config::validate(&file),
            ConfigAction::List => commands::config::list(&cwd),
        },
    };

    registry.shutdown();
    result
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    fn registry() -> TargetRegistry {
        let registry = TargetRegistry::new();
        semu::initialize(&registry).unwrap();
        registry
    }

    /// Full workflow: template → validate → list → machine.
    #[test]
    fn template_validate_list_machine_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry();

        // 1. Template written into targets/
        commands::config::template("board", Some(dir.path())).unwrap();
        let path = dir.path().join("targets/board.machine.toml");
        assert!(path.is_file());

        // 2. Validate
        commands::config::validate(&path).unwrap();

        // 3. List
        commands::config::list(dir.path()).unwrap();

        // 4. Build a machine from it
        let request = MachineRequest::from_file(&path).unwrap();
        commands::machine::run(&registry, request, None).unwrap();
    }

    #[test]
    fn listing_commands_succeed() {
        let registry = registry();
        commands::targets::run(&registry).unwrap();
        commands::cpus::run().unwrap();
        commands::describe::run(&registry, None).unwrap();
    }

    #[test]
    fn cli_parses_machine_flags() {
        let cli = Cli::try_parse_from([
            "semu-llc",
            "-v",
            "machine",
            "--cpu",
            "semu-min",
            "--features",
            "+muldiv",
            "--reloc",
            "pic",
            "--stack-align",
            "8",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Machine {
                cpu,
                reloc,
                stack_align,
                ..
            } => {
                assert_eq!(cpu.as_deref(), Some("semu-min"));
                assert_eq!(reloc.as_deref(), Some("pic"));
                assert_eq!(stack_align, Some(8));
            }
            _ => panic!("expected machine command"),
        }
    }

    #[test]
    fn command_names_match_the_command_line() {
        let name = |args: &[&str]| Cli::try_parse_from(args).unwrap().command.name();
        assert_eq!(name(&["semu-llc", "targets"]), "targets");
        assert_eq!(name(&["semu-llc", "describe", "--format", "json"]), "describe");
        assert_eq!(name(&["semu-llc", "config", "validate", "x.machine.toml"]), "config validate");
        assert_eq!(name(&["semu-llc", "config", "list"]), "config list");
    }

    #[test]
    fn cli_rejects_config_with_flags() {
        let parsed = Cli::try_parse_from([
            "semu-llc",
            "machine",
            "--config",
            "a.machine.toml",
            "--cpu",
            "generic",
        ]);
        assert!(parsed.is_err());
    }
}
