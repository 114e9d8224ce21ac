//! Continuous scale computation for pinch gestures.
//!
//! Once a dual touch resolves to pinch-zoom, every two-finger sample is fed
//! here. The scale factor of each step is the ratio between the current and the
//! previous finger span, focused on the midpoint of the two fingers.

use rdp_common::PointF;
use tracing::trace;

/// Spans below this are treated as degenerate (fingers on top of each other).
const MIN_SPAN: f32 = 1.0;

/// One incremental scale step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleStep {
    /// Ratio of the current span to the previous span.
    pub factor: f32,
    /// Midpoint between the two fingers, in view pixels.
    pub focus: PointF,
}

/// Tracks the span between two fingers across samples.
#[derive(Debug, Clone)]
pub struct ScaleGesture {
    previous_span: f32,
}

impl ScaleGesture {
    /// Begin a scale gesture using the given finger positions as the baseline.
    pub fn begin(a: PointF, b: PointF) -> Self {
        Self {
            previous_span: a.distance(&b),
        }
    }

    /// Feed the current finger positions, returning the incremental step.
    ///
    /// Returns `None` if either span is degenerate or nothing changed.
    pub fn update(&mut self, a: PointF, b: PointF) -> Option<ScaleStep> {
        let span = a.distance(&b);
        if span < MIN_SPAN || self.previous_span < MIN_SPAN {
            self.previous_span = span;
            return None;
        }
        let factor = span / self.previous_span;
        self.previous_span = span;
        if (factor - 1.0).abs() <= f32::EPSILON {
            return None;
        }
        trace!("Scale step: factor={:.3}, span={:.1}", factor, span);
        Some(ScaleStep {
            factor,
            focus: a.midpoint(&b),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spreading_fingers_scales_up() {
        let mut scale = ScaleGesture::begin(PointF::new(100.0, 100.0), PointF::new(200.0, 100.0));
        let step = scale
            .update(PointF::new(50.0, 100.0), PointF::new(250.0, 100.0))
            .unwrap();
        assert_eq!(step.factor, 2.0);
        assert_eq!(step.focus, PointF::new(150.0, 100.0));

        // Factors are incremental, relative to the previous sample
        let step = scale
            .update(PointF::new(100.0, 100.0), PointF::new(200.0, 100.0))
            .unwrap();
        assert_eq!(step.factor, 0.5);
    }

    #[test]
    fn test_unchanged_span_yields_nothing() {
        let mut scale = ScaleGesture::begin(PointF::new(0.0, 0.0), PointF::new(30.0, 40.0));
        assert_eq!(
            scale.update(PointF::new(10.0, 10.0), PointF::new(40.0, 50.0)),
            None
        );
    }

    #[test]
    fn test_degenerate_span() {
        let mut scale = ScaleGesture::begin(PointF::new(5.0, 5.0), PointF::new(5.0, 5.0));
        assert_eq!(
            scale.update(PointF::new(0.0, 0.0), PointF::new(100.0, 0.0)),
            None
        );
        // Baseline recovers from the next valid sample
        let step = scale
            .update(PointF::new(0.0, 0.0), PointF::new(150.0, 0.0))
            .unwrap();
        assert_eq!(step.factor, 1.5);
    }
}
