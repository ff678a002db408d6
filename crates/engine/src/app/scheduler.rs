use std::time::{Duration, Instant};

pub const DEFAULT_FALLBACK_INTERVAL: Duration = Duration::from_secs(1);

/// What one frame's recompute has to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecomputePlan {
    pub lighting: bool,
    pub visibility: bool,
    /// Visibility is only running because the periodic safety pass came due.
    pub fallback: bool,
}

impl RecomputePlan {
    pub fn is_idle(&self) -> bool {
        !self.lighting && !self.visibility
    }
}

/// Coalesces input changes into at most one recompute per frame, plus a
/// periodic visibility pass that catches anything an edit path missed.
#[derive(Debug, Clone)]
pub struct RecomputeScheduler {
    lighting_dirty: bool,
    visibility_dirty: bool,
    fallback_interval: Duration,
    last_visibility_pass: Option<Instant>,
}

impl Default for RecomputeScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_INTERVAL)
    }
}

impl RecomputeScheduler {
    pub fn new(fallback_interval: Duration) -> Self {
        let fallback_interval = if fallback_interval.is_zero() {
            DEFAULT_FALLBACK_INTERVAL
        } else {
            fallback_interval
        };
        Self {
            lighting_dirty: true,
            visibility_dirty: true,
            fallback_interval,
            last_visibility_pass: None,
        }
    }

    pub fn mark_lighting_dirty(&mut self) {
        self.lighting_dirty = true;
    }

    pub fn mark_visibility_dirty(&mut self) {
        self.visibility_dirty = true;
    }

    pub fn mark_all_dirty(&mut self) {
        self.lighting_dirty = true;
        self.visibility_dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.lighting_dirty || self.visibility_dirty
    }

    pub fn fallback_interval(&self) -> Duration {
        self.fallback_interval
    }

    /// `animated` forces a lighting pass every frame for flickering lights.
    pub fn plan(&self, now: Instant, animated: bool) -> RecomputePlan {
        let fallback_due = match self.last_visibility_pass {
            Some(last) => now.saturating_duration_since(last) >= self.fallback_interval,
            None => true,
        };
        let visibility = self.visibility_dirty || fallback_due;
        RecomputePlan {
            lighting: self.lighting_dirty || animated,
            visibility,
            fallback: visibility && !self.visibility_dirty,
        }
    }

    pub fn complete(&mut self, now: Instant, plan: RecomputePlan) {
        if plan.lighting {
            self.lighting_dirty = false;
        }
        if plan.visibility {
            self.visibility_dirty = false;
            self.last_visibility_pass = Some(now);
        }
    }
}
