//! Pointer capture
//!
//! A drag starts on one reel but its move/up samples arrive from anywhere on
//! the page. The capture remembers which reel owns the gesture until release.

use super::reel::ReelId;

/// Which reel (if any) currently owns the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerCapture {
    #[default]
    Idle,
    Capturing {
        reel: ReelId,
    },
}

impl PointerCapture {
    /// Start capturing for `reel`; fails if another gesture is in progress
    pub fn begin(&mut self, reel: ReelId) -> bool {
        match self {
            PointerCapture::Idle => {
                *self = PointerCapture::Capturing { reel };
                true
            }
            PointerCapture::Capturing { .. } => false,
        }
    }

    /// Reel receiving move samples
    pub fn target(&self) -> Option<ReelId> {
        match *self {
            PointerCapture::Idle => None,
            PointerCapture::Capturing { reel } => Some(reel),
        }
    }

    /// End the gesture, returning the reel that owned it
    pub fn release(&mut self) -> Option<ReelId> {
        let reel = self.target();
        *self = PointerCapture::Idle;
        reel
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, PointerCapture::Capturing { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_lifecycle() {
        let mut capture = PointerCapture::default();
        assert_eq!(capture.target(), None);
        assert!(capture.begin(ReelId::Second));
        assert_eq!(capture.target(), Some(ReelId::Second));
        // Second pointer is ignored while captured
        assert!(!capture.begin(ReelId::First));
        assert_eq!(capture.release(), Some(ReelId::Second));
        assert!(!capture.is_capturing());
        assert_eq!(capture.release(), None);
    }
}
