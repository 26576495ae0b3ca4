//! Reel input controller
//!
//! Turns a vertical drag into drum rotation, snaps to the nearest segment on
//! release and reports the selected value after a settle delay. All times are
//! milliseconds on the caller's clock (`performance.now()` on the web).

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::{signed_degrees, wrap_degrees};

/// Which of the two reels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReelId {
    First,
    Second,
}

impl ReelId {
    pub const ALL: [ReelId; 2] = [ReelId::First, ReelId::Second];

    /// Array index (0 or 1)
    pub fn index(self) -> usize {
        match self {
            ReelId::First => 0,
            ReelId::Second => 1,
        }
    }

    /// The opposite reel
    pub fn other(self) -> Self {
        match self {
            ReelId::First => ReelId::Second,
            ReelId::Second => ReelId::First,
        }
    }
}

/// Pointer position and rotation captured when a drag begins
#[derive(Debug, Clone, Copy)]
struct DragAnchor {
    start_y: f64,
    start_rotation: f64,
    last_y: f64,
    last_time: f64,
}

/// A snapped value waiting out the settle delay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingSelection {
    pub due: f64,
    pub value: u32,
}

/// One scrollable number drum
#[derive(Debug, Clone)]
pub struct Reel {
    /// Drum rotation in degrees (unbounded)
    pub rotation_degrees: f64,
    /// Instantaneous drag speed (px/ms), zero when idle
    pub velocity: f64,
    /// A drag is in progress
    pub dragging: bool,
    /// Bound display values
    sequence: Vec<u32>,
    /// Rejects new drags (set while a win plays out)
    locked: bool,
    /// Degrees per pixel
    sensitivity: f64,
    /// Snap to selection delay (ms)
    settle_ms: f64,
    drag: Option<DragAnchor>,
    /// One entry per completed drag, oldest first
    pending: VecDeque<PendingSelection>,
}

impl Default for Reel {
    fn default() -> Self {
        Self::new(REEL_SENSITIVITY, SETTLE_DELAY_MS)
    }
}

impl Reel {
    pub fn new(sensitivity: f64, settle_ms: f64) -> Self {
        Self {
            rotation_degrees: 0.0,
            velocity: 0.0,
            dragging: false,
            sequence: Vec::new(),
            locked: false,
            sensitivity,
            settle_ms,
            drag: None,
            pending: VecDeque::new(),
        }
    }

    /// Bind the values shown on this reel, dropping any unreported selection
    pub fn bind(&mut self, sequence: &[u32]) {
        if sequence.len() != SEGMENT_COUNT {
            log::warn!(
                "Reel bound to {} values, expected {}",
                sequence.len(),
                SEGMENT_COUNT
            );
        }
        self.sequence = sequence.to_vec();
        self.pending.clear();
    }

    pub fn sequence(&self) -> &[u32] {
        &self.sequence
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Begin a drag; returns false (and does nothing) while locked
    pub fn drag_start(&mut self, y: f64, now: f64) -> bool {
        if self.locked {
            return false;
        }
        self.dragging = true;
        self.drag = Some(DragAnchor {
            start_y: y,
            start_rotation: self.rotation_degrees,
            last_y: y,
            last_time: now,
        });
        true
    }

    /// Follow the pointer while dragging
    pub fn drag_move(&mut self, y: f64, now: f64) {
        let Some(anchor) = self.drag.as_mut() else {
            return;
        };

        let dt = now - anchor.last_time;
        if dt > 0.0 {
            self.velocity = ((y - anchor.last_y) / dt).abs();
        }

        // Dragging up (negative dy) turns the drum forward
        self.rotation_degrees = anchor.start_rotation - (y - anchor.start_y) * self.sensitivity;

        anchor.last_y = y;
        anchor.last_time = now;
    }

    /// Release the drag: snap and schedule the selection.
    ///
    /// Returns the selected segment index, or `None` if no drag was active.
    pub fn drag_end(&mut self, now: f64) -> Option<usize> {
        self.drag.take()?;
        self.dragging = false;
        self.velocity = 0.0;

        self.rotation_degrees = snap_rotation(self.rotation_degrees);
        let index = selected_index(self.rotation_degrees);

        if let Some(value) = self.value_at(index) {
            self.pending.push_back(PendingSelection {
                due: now + self.settle_ms,
                value,
            });
        }
        Some(index)
    }

    /// When the oldest pending selection (if any) becomes due
    pub fn pending_due(&self) -> Option<f64> {
        self.pending.front().map(|p| p.due)
    }

    /// Take the oldest selection once its settle delay has elapsed
    pub fn poll_selection(&mut self, now: f64) -> Option<PendingSelection> {
        if self.pending.front().is_some_and(|p| p.due <= now) {
            self.pending.pop_front()
        } else {
            None
        }
    }

    /// Segment index currently at the center (meaningful once snapped)
    pub fn current_index(&self) -> usize {
        selected_index(snap_rotation(self.rotation_degrees))
    }

    /// Bound value for a segment index (sequence repeats if short)
    pub fn value_at(&self, index: usize) -> Option<u32> {
        if self.sequence.is_empty() {
            None
        } else {
            Some(self.sequence[index % self.sequence.len()])
        }
    }

    /// The 12 values painted on the drum
    pub fn display_values(&self) -> Vec<u32> {
        (0..SEGMENT_COUNT)
            .map(|i| self.value_at(i).unwrap_or(0))
            .collect()
    }

    /// Angular distance (0..=180) between a segment and the reel center
    pub fn segment_distance(&self, index: usize) -> f64 {
        let absolute = wrap_degrees(index as f64 * ANGLE_STEP + self.rotation_degrees);
        signed_degrees(absolute).abs()
    }

    /// Motion blur radius (px) for the current velocity
    pub fn motion_blur(&self) -> f64 {
        if self.velocity > BLUR_VELOCITY_THRESHOLD {
            (self.velocity * 1.2).min(MAX_BLUR_PX)
        } else {
            0.0
        }
    }
}

/// Nearest multiple of the segment angle (halves round away from zero)
pub fn snap_rotation(rotation: f64) -> f64 {
    (rotation / ANGLE_STEP).round() * ANGLE_STEP
}

/// Segment index facing the viewer for a snapped rotation
pub fn selected_index(snapped_rotation: f64) -> usize {
    let steps = (-snapped_rotation / ANGLE_STEP).round() as i64;
    steps.rem_euclid(SEGMENT_COUNT as i64) as usize
}

/// Segment opacity for an angular distance from center
pub fn segment_opacity(distance: f64) -> f64 {
    if distance < ACTIVE_SEGMENT_DEGREES {
        1.0
    } else if distance < VISIBLE_SEGMENT_DEGREES {
        (1.0 - distance / SEGMENT_FADE_DEGREES).max(0.0)
    } else {
        0.0
    }
}

/// Whether a segment is close enough to the center to glow
pub fn is_active(distance: f64) -> bool {
    distance < ACTIVE_SEGMENT_DEGREES
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bound_reel() -> Reel {
        let mut reel = Reel::default();
        reel.bind(&(100..112).collect::<Vec<_>>());
        reel
    }

    /// Pixels of downward drag that move the drum back by `segments`
    fn drag_px(segments: f64) -> f64 {
        segments * ANGLE_STEP / REEL_SENSITIVITY
    }

    #[test]
    fn test_drag_rotation_follows_pointer() {
        let mut reel = bound_reel();
        assert!(reel.drag_start(200.0, 0.0));
        reel.drag_move(100.0, 10.0);
        // Upward drag increases rotation
        assert!((reel.rotation_degrees - 42.0).abs() < 1e-9);
        reel.drag_move(300.0, 20.0);
        assert!((reel.rotation_degrees + 42.0).abs() < 1e-9);
        assert!(reel.dragging);
    }

    #[test]
    fn test_velocity() {
        let mut reel = bound_reel();
        reel.drag_start(0.0, 0.0);
        reel.drag_move(10.0, 5.0);
        assert!((reel.velocity - 2.0).abs() < 1e-9);
        // Zero time step keeps the previous velocity
        reel.drag_move(20.0, 5.0);
        assert!((reel.velocity - 2.0).abs() < 1e-9);
        reel.drag_move(15.0, 15.0);
        assert!((reel.velocity - 0.5).abs() < 1e-9);
        assert!(reel.motion_blur() > 0.0);

        reel.drag_end(20.0);
        assert_eq!(reel.velocity, 0.0);
        assert_eq!(reel.motion_blur(), 0.0);
        assert!(!reel.dragging);
    }

    #[test]
    fn test_snap_and_select() {
        let mut reel = bound_reel();
        reel.drag_start(0.0, 0.0);
        // Down by two segments and a bit: rotation ≈ -64
        reel.drag_move(drag_px(2.0) + 10.0, 16.0);
        let index = reel.drag_end(20.0);
        assert_eq!(reel.rotation_degrees, -60.0);
        assert_eq!(index, Some(2));

        // Nothing until the settle delay has passed
        assert_eq!(reel.poll_selection(20.0 + SETTLE_DELAY_MS - 1.0), None);
        let selection = reel.poll_selection(20.0 + SETTLE_DELAY_MS).unwrap();
        assert_eq!(selection.value, 102);
        // Exactly once
        assert_eq!(reel.poll_selection(1_000.0), None);
    }

    #[test]
    fn test_each_drag_reports_its_own_value() {
        let mut reel = bound_reel();
        reel.drag_start(0.0, 0.0);
        reel.drag_move(drag_px(1.0), 10.0);
        assert_eq!(reel.drag_end(10.0), Some(1));

        // Ends inside the first drag's settle window
        reel.drag_start(0.0, 20.0);
        reel.drag_move(drag_px(2.0), 40.0);
        assert_eq!(reel.drag_end(60.0), Some(3));

        assert_eq!(reel.pending_due(), Some(10.0 + SETTLE_DELAY_MS));
        let first = reel.poll_selection(1_000.0).unwrap();
        assert_eq!((first.due, first.value), (10.0 + SETTLE_DELAY_MS, 101));
        let second = reel.poll_selection(1_000.0).unwrap();
        assert_eq!((second.due, second.value), (60.0 + SETTLE_DELAY_MS, 103));
        assert_eq!(reel.poll_selection(1_000.0), None);
    }

    #[test]
    fn test_other_reel() {
        assert_eq!(ReelId::First.other(), ReelId::Second);
        assert_eq!(ReelId::Second.other().index(), 0);
    }

    #[test]
    fn test_negative_index_wraps() {
        let mut reel = bound_reel();
        reel.drag_start(0.0, 0.0);
        // Up by one segment: rotation +30 selects the last value
        reel.drag_move(-drag_px(1.0), 10.0);
        assert_eq!(reel.drag_end(10.0), Some(11));
        assert_eq!(reel.poll_selection(500.0).unwrap().value, 111);
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(snap_rotation(15.0), 30.0);
        assert_eq!(snap_rotation(-15.0), -30.0);
        assert_eq!(snap_rotation(14.9), 0.0);
        assert_eq!(selected_index(360.0), 0);
        assert_eq!(selected_index(-390.0), 1);
    }

    #[test]
    fn test_locked_reel_rejects_drag() {
        let mut reel = bound_reel();
        reel.set_locked(true);
        assert!(!reel.drag_start(0.0, 0.0));
        reel.drag_move(100.0, 10.0);
        assert_eq!(reel.rotation_degrees, 0.0);
        assert_eq!(reel.drag_end(20.0), None);
        assert_eq!(reel.pending_due(), None);
    }

    #[test]
    fn test_rebind_drops_pending_selection() {
        let mut reel = bound_reel();
        reel.drag_start(0.0, 0.0);
        reel.drag_end(0.0);
        assert!(reel.pending_due().is_some());
        reel.bind(&[1; SEGMENT_COUNT]);
        assert_eq!(reel.poll_selection(1_000.0), None);
    }

    #[test]
    fn test_unbound_reel_selects_nothing() {
        let mut reel = Reel::default();
        reel.drag_start(0.0, 0.0);
        assert_eq!(reel.drag_end(0.0), Some(0));
        assert_eq!(reel.poll_selection(1_000.0), None);
        assert_eq!(reel.display_values(), vec![0; SEGMENT_COUNT]);
    }

    #[test]
    fn test_segment_distance_and_opacity() {
        let mut reel = bound_reel();
        assert_eq!(reel.segment_distance(0), 0.0);
        assert_eq!(reel.segment_distance(1), 30.0);
        assert_eq!(reel.segment_distance(11), 30.0);
        assert_eq!(reel.segment_distance(6), 180.0);

        reel.rotation_degrees = -60.0;
        assert_eq!(reel.segment_distance(2), 0.0);
        assert!(is_active(reel.segment_distance(2)));
        assert!(!is_active(reel.segment_distance(3)));

        assert_eq!(segment_opacity(0.0), 1.0);
        assert!((segment_opacity(55.0) - 0.5).abs() < 1e-9);
        assert_eq!(segment_opacity(120.0), 0.0);
    }

    proptest! {
        #[test]
        fn zero_net_drag_round_trips(
            start_segments in -30i32..30,
            deltas in proptest::collection::vec(-400.0f64..400.0, 1..12),
        ) {
            let mut reel = bound_reel();
            reel.rotation_degrees = start_segments as f64 * ANGLE_STEP;
            let before = reel.rotation_degrees;

            reel.drag_start(500.0, 0.0);
            let mut y = 500.0;
            for (i, d) in deltas.iter().enumerate() {
                y += d;
                reel.drag_move(y, (i + 1) as f64 * 16.0);
            }
            // Return to where the drag started
            reel.drag_move(500.0, 1_000.0);
            reel.drag_end(1_000.0);
            prop_assert_eq!(reel.rotation_degrees, before);
        }

        #[test]
        fn snapped_rotation_is_on_the_grid(y in -5_000.0f64..5_000.0) {
            let mut reel = bound_reel();
            reel.drag_start(0.0, 0.0);
            reel.drag_move(y, 16.0);
            let index = reel.drag_end(16.0).unwrap();
            prop_assert_eq!(reel.rotation_degrees % ANGLE_STEP, 0.0);
            prop_assert!(index < SEGMENT_COUNT);
            prop_assert_eq!(reel.current_index(), index);
        }
    }
}
