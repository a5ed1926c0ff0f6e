//! On-disk format detection

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Morphology file formats, told apart by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Swc,
    /// Neurolucida ASCII
    Asc,
    /// HDF5
    H5,
}

impl FileFormat {
    /// Detect the format from the file extension, ignoring case
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
            .ok_or_else(|| Error::UnknownFileType(path.display().to_string()))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Swc => "swc",
            Self::Asc => "asc",
            Self::H5 => "h5",
        }
    }

    pub fn supports_perimeters(self) -> bool {
        matches!(self, Self::H5)
    }

    pub fn supports_mitochondria(self) -> bool {
        matches!(self, Self::H5)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "swc" => Ok(Self::Swc),
            "asc" => Ok(Self::Asc),
            "h5" => Ok(Self::H5),
            _ => Err(Error::UnknownFileType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_ignores_case() {
        assert_eq!(FileFormat::from_path("cell.swc").unwrap(), FileFormat::Swc);
        assert_eq!(FileFormat::from_path("/data/CELL.ASC").unwrap(), FileFormat::Asc);
        assert_eq!(FileFormat::from_path("a/b.c/cell.H5").unwrap(), FileFormat::H5);
    }

    #[test]
    fn test_unknown_extensions() {
        for path in ["cell.txt", "cell", "swc", "cell.swc.bak"] {
            let err = FileFormat::from_path(path).unwrap_err();
            assert!(matches!(err, Error::UnknownFileType(_)), "{}", path);
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("SWC".parse::<FileFormat>().unwrap(), FileFormat::Swc);
        assert!("hdf5".parse::<FileFormat>().is_err());
        assert_eq!(FileFormat::H5.to_string(), "h5");
    }
}
