//! The minimal `Trajectory` container the resolvers produce and consume.
//!
//! Full playback/animation semantics are out of scope (spec §1); this is
//! just the aligned `(times, milestones)` pair with the invariants §3
//! requires.

use serde::{Deserialize, Serialize};

/// An ordered pair of aligned sequences: strictly non-decreasing `times`
/// and the corresponding `milestones`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trajectory<M> {
    pub times: Vec<f64>,
    pub milestones: Vec<M>,
}

impl<M: Clone> Trajectory<M> {
    /// A one-milestone trajectory at `t=0`. Used for the zero-length-segment
    /// edge case (spec §7).
    pub fn single(time: f64, milestone: M) -> Self {
        Self {
            times: vec![time],
            milestones: vec![milestone],
        }
    }

    pub fn new(times: Vec<f64>, milestones: Vec<M>) -> Self {
        debug_assert_eq!(times.len(), milestones.len());
        debug_assert!(!times.is_empty());
        debug_assert!(times.windows(2).all(|w| w[0] <= w[1]));
        Self { times, milestones }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn start_time(&self) -> f64 {
        self.times[0]
    }

    pub fn end_time(&self) -> f64 {
        *self.times.last().unwrap()
    }

    pub fn duration(&self) -> f64 {
        self.end_time() - self.start_time()
    }

    pub fn push(&mut self, time: f64, milestone: M) {
        self.times.push(time);
        self.milestones.push(milestone);
    }

    /// Rescale `times` linearly from this trajectory's own `[0,1]` domain to
    /// `[lo, hi]`, in place. Used when concatenating per-segment results
    /// from the path orchestrator (spec §4.E).
    pub fn rescale_unit_domain(&mut self, lo: f64, hi: f64) {
        for t in &mut self.times {
            *t = lo + *t * (hi - lo);
        }
    }

    /// Append `other` after `self`, dropping `other`'s own first milestone
    /// (which is assumed to coincide with `self`'s last one) and shifting
    /// its times so they start exactly where `self` ends.
    pub fn concat_relative(&mut self, mut other: Trajectory<M>) {
        if other.is_empty() {
            return;
        }
        let base = self.end_time();
        other.times.drain(..1);
        other.milestones.drain(..1);
        for t in &mut other.times {
            *t += base;
        }
        self.times.extend(other.times);
        self.milestones.extend(other.milestones);
    }

    /// Append `other` after `self` without shifting its times, dropping
    /// `other`'s first milestone (assumed to coincide with `self`'s last
    /// one). Used by the path orchestrator, where each segment has already
    /// been rescaled onto the shared path time domain (spec §4.E).
    pub fn append_aligned(&mut self, mut other: Trajectory<M>) {
        if other.is_empty() {
            return;
        }
        other.times.drain(..1);
        other.milestones.drain(..1);
        self.times.extend(other.times);
        self.milestones.extend(other.milestones);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_milestone_trajectory_has_len_one() {
        let t = Trajectory::single(0.0, 42);
        assert_eq!(t.len(), 1);
        assert_eq!(t.start_time(), t.end_time());
    }

    #[test]
    fn rescale_maps_unit_domain() {
        let mut t = Trajectory::new(vec![0.0, 0.5, 1.0], vec![0, 1, 2]);
        t.rescale_unit_domain(2.0, 4.0);
        assert_eq!(t.times, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn concat_relative_drops_duplicate_join_milestone() {
        let mut a = Trajectory::new(vec![0.0, 1.0], vec![0, 1]);
        let b = Trajectory::new(vec![0.0, 0.5, 1.0], vec![1, 2, 3]);
        a.concat_relative(b);
        assert_eq!(a.times, vec![0.0, 1.0, 1.5, 2.0]);
        assert_eq!(a.milestones, vec![0, 1, 2, 3]);
    }
}
