//! Checks run before handing a morphology to a format writer
//!
//! Soft problems go through the warning handler; data the target format
//! cannot represent is a [`WriterError`].

use crate::enums::{SectionType, SomaType, Warning};
use crate::error::{Result, WriterError};
use crate::format::FileFormat;
use crate::properties::Properties;
use crate::warnings::WarningHandler;

/// Verify that `properties` can be written as `format`
pub fn check_writable(
    properties: &Properties,
    format: FileFormat,
    handler: &WarningHandler,
) -> Result<()> {
    let has_sections = properties.section_count() > 0;
    if !has_sections && !properties.has_soma() {
        handler.emit(
            Warning::WriteEmptyMorphology,
            "Writing an empty morphology",
        )?;
    } else if !properties.has_soma() {
        handler.emit(Warning::WriteNoSoma, "Writing a morphology without a soma")?;
    }

    if !properties.mitochondria.is_empty() && !format.supports_mitochondria() {
        handler.emit(
            Warning::MitochondriaWriteNotSupported,
            format!("Mitochondria cannot be written to {} and are dropped", format),
        )?;
    }

    if properties.point_level.has_perimeters() && !format.supports_perimeters() {
        return Err(WriterError::PerimetersNotWritable {
            format: format.to_string(),
        }
        .into());
    }

    let soma_type = properties.cell.soma_type;
    if format == FileFormat::Swc && soma_type == SomaType::SimpleContour {
        return Err(WriterError::UnsupportedSomaType {
            soma_type,
            format: format.to_string(),
        }
        .into());
    }

    if let Some(section) = properties
        .section_level
        .section_types
        .iter()
        .position(|t| *t == SectionType::Soma)
    {
        return Err(WriterError::SomaTypedSection {
            section: section as u32,
        }
        .into());
    }

    tracing::debug!("Morphology is writable as {}", format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::properties::{MitochondriaLevel, PointLevel, SectionRecord, NO_PARENT};
    use crate::warnings::WarningPolicy;

    fn quiet() -> WarningHandler {
        WarningHandler::new(WarningPolicy::silent())
    }

    fn line() -> PointLevel {
        PointLevel::new(vec![[0.0; 3], [1.0, 0.0, 0.0]], vec![1.0, 1.0])
    }

    fn cell() -> Properties {
        let mut props = Properties::new();
        props.set_soma(SomaType::SinglePoint, PointLevel::new(vec![[0.0; 3]], vec![2.0]));
        props.push_section(NO_PARENT, SectionType::Axon, &line()).unwrap();
        props
    }

    #[test]
    fn test_clean_morphology_passes() {
        let handler = quiet();
        for format in [FileFormat::Swc, FileFormat::Asc, FileFormat::H5] {
            check_writable(&cell(), format, &handler).unwrap();
        }
        assert_eq!(handler.emitted(), 0);
    }

    #[test]
    fn test_empty_and_somaless_warn() {
        let strict = WarningHandler::new(WarningPolicy::raising());
        let err = check_writable(&Properties::new(), FileFormat::Swc, &strict).unwrap_err();
        assert_eq!(err.warning_kind(), Some(Warning::WriteEmptyMorphology));

        let mut props = Properties::new();
        props.push_section(NO_PARENT, SectionType::Axon, &line()).unwrap();
        let err = check_writable(&props, FileFormat::H5, &strict).unwrap_err();
        assert_eq!(err.warning_kind(), Some(Warning::WriteNoSoma));

        let handler = quiet();
        check_writable(&props, FileFormat::H5, &handler).unwrap();
        assert_eq!(handler.emitted(), 1);
    }

    #[test]
    fn test_mitochondria_only_in_h5() {
        let mut props = cell();
        props.mitochondria = MitochondriaLevel {
            sections: vec![SectionRecord::root(0)],
            neurite_section_ids: vec![0],
            relative_path_lengths: vec![0.5],
            diameters: vec![0.1],
        };
        let strict = WarningHandler::new(WarningPolicy::raising());
        check_writable(&props, FileFormat::H5, &strict).unwrap();
        let err = check_writable(&props, FileFormat::Asc, &strict).unwrap_err();
        assert_eq!(err.warning_kind(), Some(Warning::MitochondriaWriteNotSupported));
    }

    #[test]
    fn test_perimeters_only_in_h5() {
        let mut props = cell();
        props.point_level.perimeters = vec![1.0; props.point_level.len()];
        check_writable(&props, FileFormat::H5, &quiet()).unwrap();
        let err = check_writable(&props, FileFormat::Swc, &quiet()).unwrap_err();
        assert!(matches!(
            err,
            Error::Writer(WriterError::PerimetersNotWritable { .. })
        ));
    }

    #[test]
    fn test_contour_soma_not_in_swc() {
        let mut props = cell();
        props.set_soma(
            SomaType::SimpleContour,
            PointLevel::new(vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], vec![1.0; 3]),
        );
        check_writable(&props, FileFormat::Asc, &quiet()).unwrap();
        let err = check_writable(&props, FileFormat::Swc, &quiet()).unwrap_err();
        assert!(matches!(
            err,
            Error::Writer(WriterError::UnsupportedSomaType {
                soma_type: SomaType::SimpleContour,
                ..
            })
        ));
    }

    #[test]
    fn test_soma_typed_section_is_rejected() {
        let mut props = cell();
        props.push_section(0, SectionType::Soma, &line()).unwrap();
        let err = check_writable(&props, FileFormat::H5, &quiet()).unwrap_err();
        assert!(matches!(
            err,
            Error::Writer(WriterError::SomaTypedSection { section: 1 })
        ));
    }
}
