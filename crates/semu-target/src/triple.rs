//! Structured target triples (`arch-vendor-os[-environment]`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TargetError};

const UNKNOWN: &str = "unknown";

/// A target triple split into its components.
///
/// Components absent from the textual form are recorded as `"unknown"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Triple {
    /// Architecture name (e.g. "semu").
    pub arch: String,
    /// Vendor name.
    pub vendor: String,
    /// Operating system.
    pub os: String,
    /// Environment / ABI, if the triple carried a fourth component.
    pub environment: Option<String>,
}

impl Triple {
    /// Build a triple from an architecture name with unknown vendor and OS.
    pub fn from_arch(arch: impl Into<String>) -> Self {
        Self {
            arch: arch.into(),
            vendor: UNKNOWN.into(),
            os: UNKNOWN.into(),
            environment: None,
        }
    }

    /// The default triple for the Semu target.
    pub fn semu() -> Self {
        Self::from_arch("semu")
    }

    /// Parse a triple string.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(TargetError::InvalidTriple {
                triple: s.into(),
                reason: "triple is empty".into(),
            });
        }

        let parts: Vec<&str> = trimmed.split('-').collect();
        if parts.len() > 4 {
            return Err(TargetError::InvalidTriple {
                triple: s.into(),
                reason: format!("expected at most 4 components, found {}", parts.len()),
            });
        }
        if let Some(pos) = parts.iter().position(|p| p.is_empty()) {
            return Err(TargetError::InvalidTriple {
                triple: s.into(),
                reason: format!("component {} is empty", pos + 1),
            });
        }

        let component = |i: usize| parts.get(i).map_or(UNKNOWN, |p| *p).to_string();
        Ok(Self {
            arch: component(0),
            vendor: component(1),
            os: component(2),
            environment: parts.get(3).map(|p| p.to_string()),
        })
    }

    /// Whether the architecture component names the Semu machine.
    pub fn is_semu(&self) -> bool {
        self.arch.eq_ignore_ascii_case("semu")
    }
}

impl Default for Triple {
    fn default() -> Self {
        Self::semu()
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.arch, self.vendor, self.os)?;
        if let Some(env) = &self.environment {
            write!(f, "-{env}")?;
        }
        Ok(())
    }
}

impl FromStr for Triple {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Triple {
    type Error = TargetError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Triple> for String {
    fn from(t: Triple) -> Self {
        t.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_three_components() {
        let t = Triple::parse("semu-unknown-unknown").unwrap();
        assert_eq!(t.arch, "semu");
        assert_eq!(t.vendor, "unknown");
        assert_eq!(t.os, "unknown");
        assert!(t.environment.is_none());
        assert!(t.is_semu());
    }

    #[test]
    fn parse_with_environment() {
        let t = Triple::parse("semu-acme-none-elf").unwrap();
        assert_eq!(t.vendor, "acme");
        assert_eq!(t.os, "none");
        assert_eq!(t.environment.as_deref(), Some("elf"));
        assert_eq!(t.to_string(), "semu-acme-none-elf");
    }

    #[test]
    fn arch_only_fills_unknown() {
        let t: Triple = "semu".parse().unwrap();
        assert_eq!(t, Triple::semu());
        assert_eq!(t.to_string(), "semu-unknown-unknown");
    }

    #[test]
    fn reject_empty_and_overlong() {
        assert!(matches!(
            Triple::parse("  "),
            Err(TargetError::InvalidTriple { .. })
        ));
        assert!(Triple::parse("a-b-c-d-e").is_err());
        assert!(Triple::parse("semu--linux").is_err());
    }

    #[test]
    fn foreign_arch_is_not_semu() {
        let t = Triple::parse("x86_64-pc-linux-gnu").unwrap();
        assert!(!t.is_semu());
    }
}
