//! Point type and the small amount of vector math the core needs

/// Floating point type used for coordinates, diameters and perimeters
pub type FloatType = f64;

/// 3D coordinate; equality is exact
pub type Point = [FloatType; 3];

pub fn euclidean_distance(a: &Point, b: &Point) -> FloatType {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Mean of the points; the origin for an empty slice
pub fn center_of_gravity(points: &[Point]) -> Point {
    if points.is_empty() {
        return [0.0; 3];
    }
    let mut sum = [0.0; 3];
    for p in points {
        sum[0] += p[0];
        sum[1] += p[1];
        sum[2] += p[2];
    }
    let n = points.len() as FloatType;
    [sum[0] / n, sum[1] / n, sum[2] / n]
}

/// Largest distance from any point to the center of gravity
pub fn max_distance_to_center_of_gravity(points: &[Point]) -> FloatType {
    let center = center_of_gravity(points);
    points
        .iter()
        .map(|p| euclidean_distance(p, &center))
        .fold(0.0, FloatType::max)
}

/// Sum of consecutive point distances
pub fn path_length(points: &[Point]) -> FloatType {
    points
        .windows(2)
        .map(|w| euclidean_distance(&w[0], &w[1]))
        .sum()
}
