use glam::Vec3;

/// Plane in Hessian normal form: points with `normal.dot(p) + distance == 0`.
/// Points on the side the normal faces have positive distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    pub fn new(normal: Vec3, distance: f32) -> Plane {
        Plane { normal, distance }
    }

    pub fn signed_distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_positive_in_front() {
        let plane = Plane::new(Vec3::NEG_X, 0.5);
        assert_eq!(plane.signed_distance_to_point(Vec3::ZERO), 0.5);
        assert_eq!(plane.signed_distance_to_point(Vec3::new(0.5, 7.0, 7.0)), 0.0);
        assert!(plane.signed_distance_to_point(Vec3::X) < 0.0);
    }
}
