//! Soma geometry
//!
//! Every formula is a pure function of the soma type and its points, shared
//! by the immutable [`Soma`] view and the mutable soma. Summation runs in
//! point order so results are reproducible across implementations.

use crate::enums::{SomaType, Warning};
use crate::error::{Result, SomaError};
use crate::point::{
    center_of_gravity, euclidean_distance, max_distance_to_center_of_gravity, FloatType, Point,
};
use crate::warnings::WarningHandler;
use std::f64::consts::PI;

/// Surface area of the soma
///
/// Sphere types use the first diameter. Cylinders sum the lateral areas of
/// the frustums between consecutive points; end caps are not included.
pub fn surface(
    soma_type: SomaType,
    points: &[Point],
    diameters: &[FloatType],
) -> std::result::Result<FloatType, SomaError> {
    match soma_type {
        SomaType::SinglePoint | SomaType::ThreePointCylinders => {
            let radius = first_radius(diameters, "surface")?;
            Ok(4.0 * PI * radius * radius)
        }
        SomaType::Cylinders => {
            let mut total = 0.0;
            for (p, d) in points.windows(2).zip(diameters.windows(2)) {
                let r0 = d[0] * 0.5;
                let r1 = d[1] * 0.5;
                let h = euclidean_distance(&p[0], &p[1]);
                total += PI * (r0 + r1) * ((r0 - r1) * (r0 - r1) + h * h).sqrt();
            }
            Ok(total)
        }
        SomaType::SimpleContour => Err(SomaError::NotImplemented {
            operation: "surface",
            soma_type,
        }),
        SomaType::Undefined => Err(SomaError::Undefined {
            operation: "surface",
        }),
    }
}

/// Volume of the soma; only three-point cylinder somas have a formula
pub fn volume(
    soma_type: SomaType,
    diameters: &[FloatType],
) -> std::result::Result<FloatType, SomaError> {
    match soma_type {
        SomaType::ThreePointCylinders => {
            let radius = first_radius(diameters, "volume")?;
            Ok(4.0 / 3.0 * PI * radius * radius * radius)
        }
        SomaType::SinglePoint
        | SomaType::Cylinders
        | SomaType::SimpleContour
        | SomaType::Undefined => Err(SomaError::NotImplemented {
            operation: "volume",
            soma_type,
        }),
    }
}

fn first_radius(
    diameters: &[FloatType],
    operation: &'static str,
) -> std::result::Result<FloatType, SomaError> {
    diameters
        .first()
        .map(|d| d / 2.0)
        .ok_or(SomaError::Empty { operation })
}

/// Report a soma whose point count does not fit its type
pub fn check_conformity(
    soma_type: SomaType,
    point_count: usize,
    handler: &WarningHandler,
) -> Result<()> {
    let expected = match soma_type {
        SomaType::SinglePoint if point_count != 1 => Some("exactly 1 point"),
        SomaType::ThreePointCylinders if point_count != 3 => Some("exactly 3 points"),
        SomaType::Cylinders if point_count < 2 => Some("at least 2 points"),
        SomaType::SimpleContour if point_count < 3 => Some("at least 3 points"),
        _ => None,
    };
    if let Some(expected) = expected {
        handler.emit(
            Warning::SomaNonConform,
            format!(
                "{} soma has {} point(s), expected {}",
                soma_type, point_count, expected
            ),
        )?;
    }
    Ok(())
}

/// Read-only soma view borrowing the morphology's point store
#[derive(Debug, Clone, Copy)]
pub struct Soma<'a> {
    soma_type: SomaType,
    points: &'a [Point],
    diameters: &'a [FloatType],
}

impl<'a> Soma<'a> {
    pub fn new(soma_type: SomaType, points: &'a [Point], diameters: &'a [FloatType]) -> Self {
        Self {
            soma_type,
            points,
            diameters,
        }
    }

    pub fn soma_type(&self) -> SomaType {
        self.soma_type
    }

    pub fn points(&self) -> &'a [Point] {
        self.points
    }

    pub fn diameters(&self) -> &'a [FloatType] {
        self.diameters
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Center of gravity of the soma points
    pub fn center(&self) -> Point {
        center_of_gravity(self.points)
    }

    pub fn surface(&self) -> std::result::Result<FloatType, SomaError> {
        surface(self.soma_type, self.points, self.diameters)
    }

    pub fn volume(&self) -> std::result::Result<FloatType, SomaError> {
        volume(self.soma_type, self.diameters)
    }

    /// Largest distance from a soma point to the center
    pub fn max_distance(&self) -> FloatType {
        max_distance_to_center_of_gravity(self.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warnings::WarningPolicy;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_sphere_surface_is_pi_d_squared() {
        let d = 3.0;
        for ty in [SomaType::SinglePoint, SomaType::ThreePointCylinders] {
            let s = surface(ty, &[[0.0; 3]], &[d]).unwrap();
            assert!(close(s, PI * d * d));
        }
    }

    #[test]
    fn test_cylinder_surface_is_pi_d_h() {
        let (d, h) = (2.0, 5.0);
        let pts = [[0.0, 0.0, 0.0], [0.0, h, 0.0]];
        let s = surface(SomaType::Cylinders, &pts, &[d, d]).unwrap();
        assert!(close(s, PI * d * h));
    }

    #[test]
    fn test_cylinder_surface_sums_frustums() {
        let pts = [[0.0, 0.0, 0.0], [0.0, 0.0, 4.0], [0.0, 0.0, 6.0]];
        let diams = [2.0, 8.0, 8.0];
        // frustum r0=1, r1=4, h=4: pi * 5 * 5; cylinder r=4, h=2: pi * 8 * 2
        let expected = PI * 5.0 * 5.0 + PI * 8.0 * 2.0;
        let s = surface(SomaType::Cylinders, &pts, &diams).unwrap();
        assert!(close(s, expected));
        assert_eq!(surface(SomaType::Cylinders, &pts[..1], &diams[..1]).unwrap(), 0.0);
    }

    #[test]
    fn test_surface_failures() {
        assert_eq!(
            surface(SomaType::SimpleContour, &[], &[]),
            Err(SomaError::NotImplemented {
                operation: "surface",
                soma_type: SomaType::SimpleContour
            })
        );
        assert_eq!(
            surface(SomaType::Undefined, &[], &[]),
            Err(SomaError::Undefined { operation: "surface" })
        );
        assert_eq!(
            surface(SomaType::SinglePoint, &[], &[]),
            Err(SomaError::Empty { operation: "surface" })
        );
    }

    #[test]
    fn test_volume_only_for_three_point_cylinders() {
        let v = volume(SomaType::ThreePointCylinders, &[2.0, 2.0, 2.0]).unwrap();
        assert!(close(v, 4.0 / 3.0 * PI));

        for ty in [
            SomaType::SinglePoint,
            SomaType::Cylinders,
            SomaType::SimpleContour,
            SomaType::Undefined,
        ] {
            assert!(matches!(
                volume(ty, &[2.0]),
                Err(SomaError::NotImplemented { operation: "volume", .. })
            ));
        }
    }

    #[test]
    fn test_view_center_and_max_distance() {
        let pts = [[0.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 4.0, 0.0]];
        let diams = [1.0, 1.0, 1.0];
        let soma = Soma::new(SomaType::ThreePointCylinders, &pts, &diams);
        assert_eq!(soma.center(), [0.0, 2.0, 0.0]);
        assert_eq!(soma.max_distance(), 2.0);
        assert!(!soma.is_empty());
    }

    #[test]
    fn test_conformity() {
        let handler = WarningHandler::new(WarningPolicy::silent());
        check_conformity(SomaType::SinglePoint, 1, &handler).unwrap();
        check_conformity(SomaType::SimpleContour, 5, &handler).unwrap();
        assert_eq!(handler.emitted(), 0);

        check_conformity(SomaType::ThreePointCylinders, 2, &handler).unwrap();
        check_conformity(SomaType::SimpleContour, 2, &handler).unwrap();
        assert_eq!(handler.emitted(), 2);
    }
}
