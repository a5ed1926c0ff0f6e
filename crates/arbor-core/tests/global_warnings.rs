//! The process-wide warning handler, exercised through the free functions.
//!
//! Kept in its own test binary and in a single test so nothing else in the
//! process touches the global state concurrently.

use arbor_core::{
    reset_warnings, set_ignored_warning, set_ignored_warnings, set_maximum_warnings,
    set_raise_warnings, Morphology, PointLevel, Properties, SectionType, Warning, WarningHandler,
    NO_PARENT,
};

fn somaless() -> Properties {
    let mut props = Properties::new();
    props
        .push_section(
            NO_PARENT,
            SectionType::Axon,
            &PointLevel::new(vec![[0.0; 3], [1.0, 0.0, 0.0]], vec![1.0, 1.0]),
        )
        .unwrap();
    props
}

#[test]
fn test_global_handler_configuration() {
    reset_warnings();
    let global = WarningHandler::global();
    assert_eq!(global.policy().max_warnings, 100);
    assert!(!global.policy().raise_warnings);

    // Default policy prints and keeps going
    Morphology::new(somaless()).unwrap();
    assert_eq!(global.emitted(), 1);
    assert_eq!(global.printed(), 1);

    set_maximum_warnings(0);
    Morphology::new(somaless()).unwrap();
    assert_eq!(global.emitted(), 2);
    assert_eq!(global.printed(), 1);

    set_raise_warnings(true);
    let err = Morphology::new(somaless()).unwrap_err();
    assert_eq!(err.warning_kind(), Some(Warning::NoSomaFound));

    set_ignored_warning(Warning::NoSomaFound, true);
    Morphology::new(somaless()).unwrap();

    set_ignored_warnings(&[Warning::NoSomaFound], false);
    assert!(Morphology::new(somaless()).is_err());

    // Every handle shares the same state
    assert!(WarningHandler::global().policy().raise_warnings);

    reset_warnings();
    assert_eq!(global.emitted(), 0);
    assert!(!global.policy().raise_warnings);
    Morphology::new(somaless()).unwrap();
    assert_eq!(global.printed(), 1);
}
