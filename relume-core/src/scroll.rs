//! Scroll planning for labels wider than their viewport
//!
//! Long labels either loop forever (marquee, used for the music title)
//! or sweep to the end, pause, and restart from the top (bounded, used
//! for chat text). The plan is pure data; the renderer evaluates
//! `offset_at` against elapsed time each frame.

/// Hold the start position before a marquee begins moving
pub const MARQUEE_START_DELAY_MS: u32 = 1_500;
/// Hold the end position after a bounded sweep before restarting
pub const BOUNDED_END_PAUSE_MS: u32 = 2_000;
/// Scroll speed for both modes
pub const SCROLL_PX_PER_SEC: u32 = 20;

/// How an overflowing label moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScrollPlan {
    /// Content fits; never moves
    None,
    /// Loop continuously; content is drawn twice with a `gap_px` seam so
    /// wrap-around shows no blank frame
    Marquee { travel_px: u32, duration_ms: u32 },
    /// Sweep to reveal the tail, hold through the end pause, restart
    Bounded { travel_px: u32, duration_ms: u32 },
}

impl ScrollPlan {
    /// Plan a looping marquee; `travel_px` is content width plus the seam gap
    pub fn marquee(content_px: u32, viewport_px: u32, gap_px: u32) -> Self {
        if content_px <= viewport_px {
            return ScrollPlan::None;
        }
        let travel_px = content_px + gap_px;
        ScrollPlan::Marquee {
            travel_px,
            duration_ms: travel_px * 1_000 / SCROLL_PX_PER_SEC,
        }
    }

    /// Plan a repeating sweep to the end of the content
    pub fn bounded(content_px: u32, viewport_px: u32) -> Self {
        if content_px <= viewport_px {
            return ScrollPlan::None;
        }
        let travel_px = content_px - viewport_px;
        ScrollPlan::Bounded {
            travel_px,
            duration_ms: travel_px * 1_000 / SCROLL_PX_PER_SEC,
        }
    }

    /// Leftward pixel offset at `elapsed_ms` since the plan started
    pub fn offset_at(&self, elapsed_ms: u32) -> u32 {
        match *self {
            ScrollPlan::None => 0,
            ScrollPlan::Marquee {
                travel_px,
                duration_ms,
            } => {
                if elapsed_ms < MARQUEE_START_DELAY_MS || duration_ms == 0 {
                    return 0;
                }
                let t = (elapsed_ms - MARQUEE_START_DELAY_MS) % duration_ms;
                (t as u64 * travel_px as u64 / duration_ms as u64) as u32
            }
            ScrollPlan::Bounded {
                travel_px,
                duration_ms,
            } => {
                if duration_ms == 0 {
                    return 0;
                }
                // One cycle = sweep + end pause, then back to the top
                let t = elapsed_ms % (duration_ms + BOUNDED_END_PAUSE_MS);
                if t >= duration_ms {
                    return travel_px;
                }
                (t as u64 * travel_px as u64 / duration_ms as u64) as u32
            }
        }
    }

    /// Whether the plan has settled and needs no more frames
    pub fn finished(&self, _elapsed_ms: u32) -> bool {
        matches!(*self, ScrollPlan::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fitting_content_never_scrolls() {
        assert_eq!(ScrollPlan::marquee(100, 100, 24), ScrollPlan::None);
        assert_eq!(ScrollPlan::bounded(100, 200), ScrollPlan::None);
        assert_eq!(ScrollPlan::None.offset_at(99_999), 0);
    }

    #[test]
    fn marquee_waits_then_wraps() {
        let plan = ScrollPlan::marquee(200, 100, 24);
        let travel = match plan {
            ScrollPlan::Marquee { travel_px, .. } => travel_px,
            _ => panic!("expected marquee"),
        };
        assert_eq!(travel, 224);
        // Offset stays pinned through the start delay
        assert_eq!(plan.offset_at(0), 0);
        assert_eq!(plan.offset_at(MARQUEE_START_DELAY_MS - 1), 0);
        // travel 224px at 20px/s = 11_200ms per loop
        let duration = 224 * 1_000 / SCROLL_PX_PER_SEC;
        assert_eq!(plan.offset_at(MARQUEE_START_DELAY_MS + duration / 2), travel / 2);
        // Exactly one period later the offset is back at the seam
        assert_eq!(plan.offset_at(MARQUEE_START_DELAY_MS + duration), 0);
        assert!(!plan.finished(u32::MAX));
    }

    #[test]
    fn marquee_offset_never_exceeds_travel() {
        let plan = ScrollPlan::marquee(350, 120, 24);
        let travel = match plan {
            ScrollPlan::Marquee { travel_px, .. } => travel_px,
            _ => panic!("expected marquee"),
        };
        for ms in (0..60_000).step_by(97) {
            assert!(plan.offset_at(ms) < travel);
        }
    }

    #[test]
    fn bounded_sweeps_pauses_then_restarts() {
        let plan = ScrollPlan::bounded(300, 100);
        let (travel, duration) = match plan {
            ScrollPlan::Bounded {
                travel_px,
                duration_ms,
            } => (travel_px, duration_ms),
            _ => panic!("expected bounded"),
        };
        assert_eq!(travel, 200);
        assert_eq!(duration, 10_000);
        assert_eq!(plan.offset_at(0), 0);
        assert_eq!(plan.offset_at(duration / 2), travel / 2);
        // End position held through the whole pause window
        assert_eq!(plan.offset_at(duration), travel);
        assert_eq!(plan.offset_at(duration + BOUNDED_END_PAUSE_MS - 1), travel);
        // One full cycle later the sweep starts over from the top
        assert_eq!(plan.offset_at(duration + BOUNDED_END_PAUSE_MS), 0);
        assert_eq!(
            plan.offset_at(duration + BOUNDED_END_PAUSE_MS + duration / 2),
            travel / 2
        );
        // Repeats forever; the animation never settles
        assert!(!plan.finished(duration + BOUNDED_END_PAUSE_MS + 100));
        assert!(!plan.finished(u32::MAX));
    }

    #[test]
    fn bounded_offset_is_monotonic_within_a_cycle() {
        let plan = ScrollPlan::bounded(777, 123);
        let duration = match plan {
            ScrollPlan::Bounded { duration_ms, .. } => duration_ms,
            _ => panic!("expected bounded"),
        };
        let mut last = 0;
        for ms in (0..duration + BOUNDED_END_PAUSE_MS).step_by(113) {
            let off = plan.offset_at(ms);
            assert!(off >= last);
            last = off;
        }
    }
}
