//! Two-hand distance gesture.

use crate::config::VolumeConfig;

use super::hands::HandPoint;

/// Maps the distance between both wrists to a gesture value in `[0, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct VolumeMapper {
    min_dist: f64,
    max_dist: f64,
}

impl VolumeMapper {
    pub fn new(config: &VolumeConfig) -> Self {
        debug_assert!(config.min_dist < config.max_dist);
        Self {
            min_dist: config.min_dist,
            max_dist: config.max_dist,
        }
    }

    /// Gesture value for one frame, or `None` unless both hands are present.
    pub fn compute(&self, left: Option<HandPoint>, right: Option<HandPoint>) -> Option<f64> {
        let (left, right) = (left?, right?);
        let dist = left.distance_to(&right).clamp(self.min_dist, self.max_dist);
        Some((dist - self.min_dist) / (self.max_dist - self.min_dist))
    }
}

impl Default for VolumeMapper {
    fn default() -> Self {
        Self::new(&VolumeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apart(dist: f64) -> (Option<HandPoint>, Option<HandPoint>) {
        (
            Some(HandPoint::new(100.0, 200.0)),
            Some(HandPoint::new(100.0 + dist, 200.0)),
        )
    }

    #[test]
    fn missing_hand_yields_none() {
        let mapper = VolumeMapper::default();
        let point = Some(HandPoint::new(0.0, 0.0));
        assert_eq!(mapper.compute(None, point), None);
        assert_eq!(mapper.compute(point, None), None);
        assert_eq!(mapper.compute(None, None), None);
        assert!(mapper.compute(point, point).is_some());
    }

    #[test]
    fn bounds_map_to_unit_range() {
        let mapper = VolumeMapper::default();
        let (l, r) = apart(40.0);
        assert_eq!(mapper.compute(l, r), Some(0.0));
        let (l, r) = apart(600.0);
        assert_eq!(mapper.compute(l, r), Some(1.0));
        let (l, r) = apart(5.0);
        assert_eq!(mapper.compute(l, r), Some(0.0));
        let (l, r) = apart(2_000.0);
        assert_eq!(mapper.compute(l, r), Some(1.0));
    }

    #[test]
    fn diagonal_distance_is_euclidean() {
        let mapper = VolumeMapper::default();
        // 3-4-5 triangle scaled to 320 px.
        let value = mapper
            .compute(Some(HandPoint::new(0.0, 0.0)), Some(HandPoint::new(192.0, 256.0)))
            .expect("both hands present");
        assert!((value - 0.5).abs() < 1e-12);
    }

    #[test]
    fn monotonic_in_distance() {
        let mapper = VolumeMapper::default();
        let mut previous = -1.0;
        for dist in (0..700).step_by(7) {
            let (l, r) = apart(dist as f64);
            let value = mapper.compute(l, r).expect("both hands present");
            assert!(value >= previous);
            previous = value;
        }
    }
}
