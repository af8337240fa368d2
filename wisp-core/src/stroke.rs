use glam::Vec2;

/// Decimates raw pointer samples into the sparse point list a spline is fit
/// through.
///
/// The first sample of a stroke is always kept; later samples are kept only
/// when they are farther than `min_distance` from the last kept one and the
/// stroke holds fewer than `max_points` points.
#[derive(Clone, Debug)]
pub struct StrokeSampler {
    pub min_distance: f32,
    pub max_points: usize,
    points: Vec<Vec2>,
}

impl Default for StrokeSampler {
    fn default() -> Self {
        Self::new(Self::MIN_DISTANCE, Self::MAX_POINTS)
    }
}

impl StrokeSampler {
    pub const MIN_DISTANCE: f32 = 100.0;
    pub const MAX_POINTS: usize = 50;

    pub fn new(min_distance: f32, max_points: usize) -> Self {
        Self {
            min_distance,
            max_points,
            points: Vec::with_capacity(max_points.min(64)),
        }
    }

    /// Offers one sample. Returns `true` if it was kept.
    pub fn push(&mut self, p: Vec2) -> bool {
        if !p.is_finite() {
            return false;
        }
        let keep = match self.points.last() {
            None => self.max_points > 0,
            Some(last) => self.points.len() < self.max_points && last.distance(p) > self.min_distance,
        };
        if keep {
            self.points.push(p);
        }
        keep
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Ends the stroke, returning its points and resetting the sampler.
    pub fn finish(&mut self) -> Vec<Vec2> {
        std::mem::take(&mut self.points)
    }

    /// Drops the current stroke.
    pub fn cancel(&mut self) {
        self.points.clear();
    }
}
