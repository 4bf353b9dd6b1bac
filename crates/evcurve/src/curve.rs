use serde::{Deserialize, Serialize};

/// A single control point on an [`AnimationCurve`].
///
/// Tangents are slopes (value units per time unit) on either side of the key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: f32,
    #[serde(default)]
    pub out_tangent: f32,
}

impl Keyframe {
    /// Creates a key with flat tangents.
    pub fn new(time: f32, value: f32) -> Self {
        Self::with_tangents(time, value, 0.0, 0.0)
    }

    pub fn with_tangents(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }
}

/// Read-only view of a curve the resampler can sample.
///
/// Keys are expected in non-decreasing time order; implementors are not re-sorted.
pub trait Curve {
    fn keys(&self) -> &[Keyframe];

    fn evaluate(&self, time: f32) -> f32;

    fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }

    /// Time of the first and last key, if any.
    fn time_range(&self) -> Option<(f32, f32)> {
        let keys = self.keys();
        match (keys.first(), keys.last()) {
            (Some(first), Some(last)) => Some((first.time, last.time)),
            _ => None,
        }
    }
}

/// Piecewise cubic Hermite curve with clamped extrapolation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationCurve {
    keys: Vec<Keyframe>,
}

impl AnimationCurve {
    pub fn new(keys: Vec<Keyframe>) -> Self {
        Self { keys }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Straight line between two keys; tangents match the segment slope.
    pub fn linear(time_start: f32, value_start: f32, time_end: f32, value_end: f32) -> Self {
        let span = time_end - time_start;
        let slope = if span != 0.0 {
            (value_end - value_start) / span
        } else {
            0.0
        };
        Self::new(vec![
            Keyframe::with_tangents(time_start, value_start, slope, slope),
            Keyframe::with_tangents(time_end, value_end, slope, slope),
        ])
    }

    /// Builds a curve through `(time, value)` points with tangents taken from neighbouring slopes.
    ///
    /// End keys use the one-sided slope of their only segment, interior keys the slope between
    /// their two neighbours. A single point gets flat tangents.
    pub fn from_points(points: &[(f32, f32)]) -> Self {
        let keys = points
            .iter()
            .enumerate()
            .map(|(index, &(time, value))| {
                let tangent = derived_tangent(points, index);
                Keyframe::with_tangents(time, value, tangent, tangent)
            })
            .collect();
        Self::new(keys)
    }

    /// The default EV remap: identity over -10..16.
    pub fn default_exposure() -> Self {
        Self::linear(-10.0, -10.0, 16.0, 16.0)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn first(&self) -> Option<&Keyframe> {
        self.keys.first()
    }

    pub fn last(&self) -> Option<&Keyframe> {
        self.keys.last()
    }
}

impl Curve for AnimationCurve {
    fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    fn evaluate(&self, time: f32) -> f32 {
        let keys = &self.keys;
        let (first, last) = match (keys.first(), keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if keys.len() == 1 || time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        // First key strictly after `time`; guaranteed in 1..len by the clamps above.
        let right = keys.partition_point(|key| key.time <= time);
        hermite(&keys[right - 1], &keys[right], time)
    }
}

fn hermite(left: &Keyframe, right: &Keyframe, time: f32) -> f32 {
    let span = right.time - left.time;
    if span <= 0.0 {
        return right.value;
    }
    if !left.out_tangent.is_finite() || !right.in_tangent.is_finite() {
        return left.value;
    }

    let s = (time - left.time) / span;
    let s2 = s * s;
    let s3 = s2 * s;
    let m0 = left.out_tangent * span;
    let m1 = right.in_tangent * span;

    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    h00 * left.value + h10 * m0 + h01 * right.value + h11 * m1
}

fn derived_tangent(points: &[(f32, f32)], index: usize) -> f32 {
    let slope = |a: (f32, f32), b: (f32, f32)| {
        let span = b.0 - a.0;
        if span != 0.0 {
            (b.1 - a.1) / span
        } else {
            0.0
        }
    };

    let previous = index.checked_sub(1).and_then(|i| points.get(i)).copied();
    let next = points.get(index + 1).copied();
    let current = points[index];
    match (previous, next) {
        (Some(prev), Some(next)) => slope(prev, next),
        (Some(prev), None) => slope(prev, current),
        (None, Some(next)) => slope(current, next),
        (None, None) => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_curve_evaluates_to_zero() {
        let curve = AnimationCurve::empty();
        assert_eq!(curve.evaluate(3.0), 0.0);
        assert_eq!(curve.time_range(), None);
    }

    #[test]
    fn linear_curve_interpolates_exactly() {
        let curve = AnimationCurve::linear(0.0, 0.0, 1.0, 1.0);
        for step in 0..=8 {
            let t = step as f32 / 8.0;
            assert!((curve.evaluate(t) - t).abs() < 1e-6, "t={t}");
        }
    }

    #[test]
    fn clamps_outside_key_range() {
        let curve = AnimationCurve::linear(-10.0, -10.0, 16.0, 16.0);
        assert_eq!(curve.evaluate(-50.0), -10.0);
        assert_eq!(curve.evaluate(50.0), 16.0);
    }

    #[test]
    fn flat_tangents_ease_between_keys() {
        let curve = AnimationCurve::new(vec![Keyframe::new(0.0, 0.0), Keyframe::new(1.0, 1.0)]);
        assert!((curve.evaluate(0.5) - 0.5).abs() < 1e-6);
        assert!((curve.evaluate(0.25) - 0.15625).abs() < 1e-6);
    }

    #[test]
    fn evaluates_exactly_at_keys() {
        let curve = AnimationCurve::from_points(&[(0.0, 1.0), (2.0, 5.0), (3.0, -1.0)]);
        assert!((curve.evaluate(0.0) - 1.0).abs() < 1e-6);
        assert!((curve.evaluate(2.0) - 5.0).abs() < 1e-6);
        assert!((curve.evaluate(3.0) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn from_points_derives_neighbour_slopes() {
        let curve = AnimationCurve::from_points(&[(0.0, 0.0), (1.0, 2.0), (3.0, 2.0)]);
        let keys = curve.keys();
        assert_eq!(keys[0].out_tangent, 2.0);
        assert_eq!(keys[1].in_tangent, 2.0 / 3.0);
        assert_eq!(keys[2].in_tangent, 0.0);
    }

    #[test]
    fn infinite_tangent_steps() {
        let curve = AnimationCurve::new(vec![
            Keyframe::with_tangents(0.0, 1.0, 0.0, f32::INFINITY),
            Keyframe::new(1.0, 4.0),
        ]);
        assert_eq!(curve.evaluate(0.9), 1.0);
        assert_eq!(curve.evaluate(1.0), 4.0);
    }

    #[test]
    fn coincident_keys_take_right_value() {
        let curve = AnimationCurve::new(vec![
            Keyframe::new(0.0, 0.0),
            Keyframe::new(1.0, 1.0),
            Keyframe::new(1.0, 3.0),
            Keyframe::new(2.0, 3.0),
        ]);
        assert_eq!(curve.evaluate(1.0), 3.0);
    }
}
