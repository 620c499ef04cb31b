//! Data layout descriptor strings.
//!
//! A layout string is a `-`-separated list of specifications:
//!
//! | spec                     | meaning                                   |
//! |--------------------------|-------------------------------------------|
//! | `E` / `e`                | big / little endian                       |
//! | `p[AS]:size:abi[:pref]`  | pointer size and alignment (bits)         |
//! | `i<size>:abi[:pref]`     | integer alignment                         |
//! | `a:abi[:pref]`           | aggregate alignment                       |
//! | `m:<e|o|m|w|x|l>`        | symbol mangling style                     |
//! | `n<w>[:<w>]*`            | native integer widths                     |
//! | `S<align>`               | natural stack alignment (bits)            |
//!
//! The original text is kept so [`DataLayout`] displays bit-exact.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Result, TargetError};
use crate::isa::Endianness;

/// Alignment pair in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Align {
    pub abi: u32,
    pub preferred: u32,
}

/// Pointer specification for one address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PointerSpec {
    pub address_space: u32,
    pub size_bits: u32,
    pub align: Align,
}

/// Integer alignment specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct IntSpec {
    pub size_bits: u32,
    pub align: Align,
}

/// Symbol mangling style (`m:` spec).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mangling {
    Elf,
    MachO,
    Mips,
    WinCoff,
    WinCoffX86,
    XCoff,
}

impl Mangling {
    fn from_code(code: &str) -> Option<Self> {
        Some(match code {
            "e" => Mangling::Elf,
            "o" => Mangling::MachO,
            "m" => Mangling::Mips,
            "w" => Mangling::WinCoff,
            "x" => Mangling::WinCoffX86,
            "l" => Mangling::XCoff,
            _ => return None,
        })
    }
}

/// A parsed data layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DataLayout {
    #[serde(skip)]
    source: String,
    pub endianness: Endianness,
    pub pointers: Vec<PointerSpec>,
    pub integers: Vec<IntSpec>,
    pub aggregate_align: Option<Align>,
    pub mangling: Option<Mangling>,
    pub native_integer_widths: Vec<u32>,
    pub stack_align_bits: Option<u32>,
}

fn layout_error(spec: &str, reason: impl Into<String>) -> TargetError {
    TargetError::InvalidDataLayout {
        spec: spec.into(),
        reason: reason.into(),
    }
}

fn parse_bits(spec: &str, field: &str) -> Result<u32> {
    field
        .parse::<u32>()
        .map_err(|_| layout_error(spec, format!("'{field}' is not a bit count")))
}

fn parse_align(spec: &str, fields: &[&str]) -> Result<Align> {
    let abi = match fields.first() {
        Some(f) => parse_bits(spec, f)?,
        None => return Err(layout_error(spec, "missing ABI alignment")),
    };
    let preferred = match fields.get(1) {
        Some(f) => parse_bits(spec, f)?,
        None => abi,
    };
    if fields.len() > 2 {
        return Err(layout_error(spec, "too many alignment fields"));
    }
    if preferred < abi {
        return Err(layout_error(spec, "preferred alignment below ABI alignment"));
    }
    Ok(Align { abi, preferred })
}

impl DataLayout {
    /// Parse a layout string. Endianness defaults to little when absent.
    pub fn parse(s: &str) -> Result<Self> {
        let mut layout = DataLayout {
            source: s.to_string(),
            endianness: Endianness::Little,
            pointers: Vec::new(),
            integers: Vec::new(),
            aggregate_align: None,
            mangling: None,
            native_integer_widths: Vec::new(),
            stack_align_bits: None,
        };
        if s.is_empty() {
            return Ok(layout);
        }

        for spec in s.split('-') {
            let fields: Vec<&str> = spec.split(':').collect();
            let head = fields[0];
            match head.chars().next() {
                Some('E') if spec == "E" => layout.endianness = Endianness::Big,
                Some('e') if spec == "e" => layout.endianness = Endianness::Little,
                Some('p') => {
                    let address_space = if head.len() > 1 {
                        parse_bits(spec, &head[1..])?
                    } else {
                        0
                    };
                    let size_bits = match fields.get(1) {
                        Some(f) => parse_bits(spec, f)?,
                        None => return Err(layout_error(spec, "missing pointer size")),
                    };
                    let align = parse_align(spec, &fields[2..])?;
                    layout.pointers.push(PointerSpec {
                        address_space,
                        size_bits,
                        align,
                    });
                }
                Some('i') => {
                    let size_bits = parse_bits(spec, &head[1..])?;
                    let align = parse_align(spec, &fields[1..])?;
                    layout.integers.push(IntSpec { size_bits, align });
                }
                Some('a') if head == "a" => {
                    layout.aggregate_align = Some(parse_align(spec, &fields[1..])?);
                }
                Some('m') if head == "m" => {
                    let code = fields
                        .get(1)
                        .ok_or_else(|| layout_error(spec, "missing mangling code"))?;
                    layout.mangling = Some(
                        Mangling::from_code(code)
                            .ok_or_else(|| layout_error(spec, "unknown mangling code"))?,
                    );
                }
                Some('n') => {
                    let mut widths = vec![parse_bits(spec, &head[1..])?];
                    for f in &fields[1..] {
                        widths.push(parse_bits(spec, f)?);
                    }
                    layout.native_integer_widths = widths;
                }
                Some('S') => {
                    layout.stack_align_bits = Some(parse_bits(spec, &head[1..])?);
                }
                _ => return Err(layout_error(spec, "unrecognized specification")),
            }
        }
        Ok(layout)
    }

    /// Pointer spec for `address_space`, if declared.
    pub fn pointer(&self, address_space: u32) -> Option<&PointerSpec> {
        self.pointers
            .iter()
            .find(|p| p.address_space == address_space)
    }

    /// Whether `bits` is a native integer width.
    pub fn is_legal_integer(&self, bits: u32) -> bool {
        self.native_integer_widths.contains(&bits)
    }

    /// The layout string this was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for DataLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for DataLayout {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
