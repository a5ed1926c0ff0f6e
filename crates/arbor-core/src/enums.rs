//! Enumerations shared by the data model, the warning system and callers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Neurite section classification
///
/// Numeric codes follow the SWC convention and are used for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    #[default]
    Undefined = 0,
    Soma = 1,
    Axon = 2,
    BasalDendrite = 3,
    ApicalDendrite = 4,
    Custom5 = 5,
    Custom6 = 6,
    Custom7 = 7,
    Custom8 = 8,
    Custom9 = 9,
    Custom10 = 10,
    GliaPerivascularProcess = 11,
    GliaProcess = 12,
    SpineHead = 13,
    SpineNeck = 14,
    All = 32,
}

impl SectionType {
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        let ty = match code {
            0 => Self::Undefined,
            1 => Self::Soma,
            2 => Self::Axon,
            3 => Self::BasalDendrite,
            4 => Self::ApicalDendrite,
            5 => Self::Custom5,
            6 => Self::Custom6,
            7 => Self::Custom7,
            8 => Self::Custom8,
            9 => Self::Custom9,
            10 => Self::Custom10,
            11 => Self::GliaPerivascularProcess,
            12 => Self::GliaProcess,
            13 => Self::SpineHead,
            14 => Self::SpineNeck,
            32 => Self::All,
            _ => return None,
        };
        Some(ty)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Soma => "soma",
            Self::Axon => "axon",
            Self::BasalDendrite => "basal_dendrite",
            Self::ApicalDendrite => "apical_dendrite",
            Self::Custom5 => "custom5",
            Self::Custom6 => "custom6",
            Self::Custom7 => "custom7",
            Self::Custom8 => "custom8",
            Self::Custom9 => "custom9",
            Self::Custom10 => "custom10",
            Self::GliaPerivascularProcess => "glia_perivascular_process",
            Self::GliaProcess => "glia_process",
            Self::SpineHead => "spine_head",
            Self::SpineNeck => "spine_neck",
            Self::All => "all",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Soma representation; drives which geometry formulas apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SomaType {
    #[default]
    Undefined,
    SinglePoint,
    ThreePointCylinders,
    Cylinders,
    SimpleContour,
}

impl SomaType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::SinglePoint => "single_point",
            Self::ThreePointCylinders => "three_point_cylinders",
            Self::Cylinders => "cylinders",
            Self::SimpleContour => "simple_contour",
        }
    }
}

impl fmt::Display for SomaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vessel classification for vasculature sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VascularSectionType {
    #[default]
    Undefined = 0,
    Vein = 1,
    Artery = 2,
    Venule = 3,
    Arteriole = 4,
    VenousCapillary = 5,
    ArterialCapillary = 6,
    Transitional = 7,
}

impl VascularSectionType {
    pub const ALL: [VascularSectionType; 8] = [
        Self::Undefined,
        Self::Vein,
        Self::Artery,
        Self::Venule,
        Self::Arteriole,
        Self::VenousCapillary,
        Self::ArterialCapillary,
        Self::Transitional,
    ];

    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|ty| ty.code() == code)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Vein => "vein",
            Self::Artery => "artery",
            Self::Venule => "venule",
            Self::Arteriole => "arteriole",
            Self::VenousCapillary => "venous_capillary",
            Self::ArterialCapillary => "arterial_capillary",
            Self::Transitional => "transitional",
        }
    }
}

impl fmt::Display for VascularSectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellFamily {
    #[default]
    Neuron,
    Glia,
    Spine,
}

/// Recoverable anomaly kinds routed through the warning handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Warning {
    Undefined,
    MitochondriaWriteNotSupported,
    WriteNoSoma,
    WriteEmptyMorphology,
    SomaNonConform,
    NoSomaFound,
    DisconnectedNeurite,
    WrongDuplicate,
    AppendingEmptySection,
    WrongRootPoint,
    OnlyChild,
    ZeroDiameter,
    ShortSection,
}

impl Warning {
    pub const ALL: [Warning; 13] = [
        Warning::Undefined,
        Warning::MitochondriaWriteNotSupported,
        Warning::WriteNoSoma,
        Warning::WriteEmptyMorphology,
        Warning::SomaNonConform,
        Warning::NoSomaFound,
        Warning::DisconnectedNeurite,
        Warning::WrongDuplicate,
        Warning::AppendingEmptySection,
        Warning::WrongRootPoint,
        Warning::OnlyChild,
        Warning::ZeroDiameter,
        Warning::ShortSection,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::MitochondriaWriteNotSupported => "mitochondria_write_not_supported",
            Self::WriteNoSoma => "write_no_soma",
            Self::WriteEmptyMorphology => "write_empty_morphology",
            Self::SomaNonConform => "soma_non_conform",
            Self::NoSomaFound => "no_soma_found",
            Self::DisconnectedNeurite => "disconnected_neurite",
            Self::WrongDuplicate => "wrong_duplicate",
            Self::AppendingEmptySection => "appending_empty_section",
            Self::WrongRootPoint => "wrong_root_point",
            Self::OnlyChild => "only_child",
            Self::ZeroDiameter => "zero_diameter",
            Self::ShortSection => "short_section",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Warning {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|w| w.as_str() == s)
            .ok_or_else(|| format!("unknown warning kind: {}", s))
    }
}

/// Verbosity levels exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[default]
    Warning,
    Info,
    Debug,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warning => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationType {
    /// A section with exactly one child
    SingleChild,
}

/// Traversal order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IterType {
    #[default]
    DepthFirst,
    BreadthFirst,
    Upstream,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_type_codes() {
        for code in 0..40 {
            if let Some(ty) = SectionType::from_code(code) {
                assert_eq!(ty.code(), code);
            }
        }
        assert_eq!(SectionType::from_code(3), Some(SectionType::BasalDendrite));
        assert_eq!(SectionType::from_code(15), None);
        assert!(SectionType::Axon < SectionType::ApicalDendrite);
    }

    #[test]
    fn test_vascular_codes_are_stable() {
        let codes: Vec<u32> = VascularSectionType::ALL.iter().map(|t| t.code()).collect();
        assert_eq!(codes, (0..8).collect::<Vec<_>>());
        assert_eq!(VascularSectionType::from_code(2), Some(VascularSectionType::Artery));
        assert_eq!(VascularSectionType::from_code(6), Some(VascularSectionType::ArterialCapillary));
        assert_eq!(VascularSectionType::from_code(8), None);
        assert_eq!(VascularSectionType::VenousCapillary.to_string(), "venous_capillary");
        let json = serde_json::to_string(&VascularSectionType::Transitional).unwrap();
        assert_eq!(json, "\"transitional\"");
    }

    #[test]
    fn test_warning_parse() {
        for w in Warning::ALL {
            assert_eq!(w.as_str().parse::<Warning>(), Ok(w));
        }
        assert!("nope".parse::<Warning>().is_err());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&SomaType::ThreePointCylinders).unwrap();
        assert_eq!(json, "\"three_point_cylinders\"");
        let w: Warning = serde_json::from_str("\"only_child\"").unwrap();
        assert_eq!(w, Warning::OnlyChild);
    }
}
