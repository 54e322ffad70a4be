//! Named enumerations carried by the engine snapshot.
//!
//! Every enumeration can be written by name through an edit. Names match
//! case-insensitively against the canonical name, the Rust variant name and a
//! short list of aliases used by older engine files.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ModelError, ModelResult};

/// Enumeration that can be looked up by a human-readable name.
pub trait NamedVariant: Sized + Copy + 'static {
    /// Short label used in error messages.
    const KIND: &'static str;
    /// Every variant, in declaration order.
    const ALL: &'static [Self];

    /// Canonical display name.
    fn name(self) -> &'static str;

    /// Extra accepted spellings (variant identifier included).
    fn aliases(self) -> &'static [&'static str];

    fn parse_name(text: &str) -> ModelResult<Self> {
        let wanted = text.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|v| {
                v.name().eq_ignore_ascii_case(wanted)
                    || v.aliases().iter().any(|a| a.eq_ignore_ascii_case(wanted))
            })
            .ok_or_else(|| ModelError::UnknownVariant {
                kind: Self::KIND,
                name: wanted.to_string(),
            })
    }

    /// Canonical names of all variants.
    fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|v| v.name()).collect()
    }
}

macro_rules! named_variant_traits {
    ($ty:ty) => {
        impl FromStr for $ty {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty as NamedVariant>::parse_name(s)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

/// Cylinder arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Architecture {
    #[default]
    I4,
    V6,
    V8,
    Boxer4,
    Boxer6,
    I3,
    I5,
    Other,
}

impl NamedVariant for Architecture {
    const KIND: &'static str = "architecture";
    const ALL: &'static [Self] = &[
        Self::I4,
        Self::V6,
        Self::V8,
        Self::Boxer4,
        Self::Boxer6,
        Self::I3,
        Self::I5,
        Self::Other,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::I4 => "I4",
            Self::V6 => "V6",
            Self::V8 => "V8",
            Self::Boxer4 => "Boxer4",
            Self::Boxer6 => "Boxer6",
            Self::I3 => "I3",
            Self::I5 => "I5",
            Self::Other => "Other",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Boxer4 => &["flat4", "h4"],
            Self::Boxer6 => &["flat6", "h6"],
            _ => &[],
        }
    }
}

named_variant_traits!(Architecture);

/// Fuel delivery method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InjectionType {
    Carb,
    Tbi,
    #[default]
    Port,
    Direct,
}

impl NamedVariant for InjectionType {
    const KIND: &'static str = "injection type";
    const ALL: &'static [Self] = &[Self::Carb, Self::Tbi, Self::Port, Self::Direct];

    fn name(self) -> &'static str {
        match self {
            Self::Carb => "Carb",
            Self::Tbi => "TBI",
            Self::Port => "Port",
            Self::Direct => "Direct",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Carb => &["carburetor"],
            Self::Tbi => &["throttlebody"],
            Self::Port => &["pfi", "mpfi"],
            Self::Direct => &["di", "gdi"],
        }
    }
}

named_variant_traits!(InjectionType);

/// Fuel grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FuelType {
    PumpRegular,
    #[default]
    PumpPremium,
    E85,
    Race100,
    Other,
}

impl NamedVariant for FuelType {
    const KIND: &'static str = "fuel type";
    const ALL: &'static [Self] = &[
        Self::PumpRegular,
        Self::PumpPremium,
        Self::E85,
        Self::Race100,
        Self::Other,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::PumpRegular => "PumpRegular",
            Self::PumpPremium => "PumpPremium",
            Self::E85 => "E85",
            Self::Race100 => "Race100",
            Self::Other => "Other",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::PumpRegular => &["regular"],
            Self::PumpPremium => &["premium"],
            Self::Race100 => &["race"],
            _ => &[],
        }
    }
}

named_variant_traits!(FuelType);

/// Exhaust header layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HeaderLayout {
    #[serde(alias = "_41")]
    FourIntoOne,
    #[default]
    #[serde(alias = "_421")]
    FourTwoOne,
    #[serde(alias = "UEL")]
    UnequalLength,
    #[serde(alias = "EL")]
    EqualLength,
    Stock,
    Other,
}

impl NamedVariant for HeaderLayout {
    const KIND: &'static str = "header layout";
    const ALL: &'static [Self] = &[
        Self::FourIntoOne,
        Self::FourTwoOne,
        Self::UnequalLength,
        Self::EqualLength,
        Self::Stock,
        Self::Other,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::FourIntoOne => "4-1",
            Self::FourTwoOne => "4-2-1",
            Self::UnequalLength => "UEL",
            Self::EqualLength => "EL",
            Self::Stock => "Stock",
            Self::Other => "Other",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::FourIntoOne => &["FourIntoOne", "_41", "41"],
            Self::FourTwoOne => &["FourTwoOne", "_421", "421"],
            Self::UnequalLength => &["UnequalLength"],
            Self::EqualLength => &["EqualLength"],
            _ => &[],
        }
    }
}

named_variant_traits!(HeaderLayout);

/// Where the compression ratio comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompressionBehavior {
    /// The ratio is an input and chamber geometry is ignored.
    FixedCr,
    /// The ratio is recomputed from chamber geometry whenever it is present.
    #[default]
    GeometryDefinesCr,
}

impl NamedVariant for CompressionBehavior {
    const KIND: &'static str = "compression behavior";
    const ALL: &'static [Self] = &[Self::FixedCr, Self::GeometryDefinesCr];

    fn name(self) -> &'static str {
        match self {
            Self::FixedCr => "FixedCR",
            Self::GeometryDefinesCr => "GeometryDefinesCR",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::FixedCr => &["fixed"],
            Self::GeometryDefinesCr => &["geometry"],
        }
    }
}

named_variant_traits!(CompressionBehavior);
