//! Battery voltage conversion and low-battery hysteresis
//!
//! The fuel gauge is a bare ADC behind a 1/3 resistor divider. Charge
//! level comes from a quadratic fit of the cell's discharge curve, and
//! the low-battery warning uses split show/hide thresholds so a noisy
//! reading near 20% cannot flicker the alert.

/// Divider multiplier from ADC millivolts to cell millivolts
pub const DIVIDER_RATIO: u32 = 3;
/// ADC samples averaged per reading
pub const SAMPLE_COUNT: usize = 10;
/// Quadratic fit `(-v^2 + 9016 v - 19_189_000) / 10_000`, v in mV
const FIT_B: i64 = 9_016;
const FIT_C: i64 = -19_189_000;
const FIT_SCALE: i64 = 10_000;
/// EMA smoothing: new = old + (sample - old) / 10
const EMA_DIV: i32 = 10;

/// Poller-side cache window for gauge reads
pub const CACHE_WINDOW_MS: u32 = 10_000;
/// Show the low-battery alert below this level while discharging
pub const LOW_SHOW_BELOW: u8 = 20;
/// Hide it again only at or above this level (or on charge)
pub const LOW_HIDE_AT: u8 = 25;

/// Map averaged cell millivolts to a 0..=100 charge percentage
pub fn voltage_to_percent(mv: u32) -> u8 {
    let v = mv as i64;
    let pct = (-v * v + FIT_B * v + FIT_C) / FIT_SCALE;
    pct.clamp(0, 100) as u8
}

/// Voltage smoothing strategy, chosen at gauge construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatteryFilter {
    /// Pass averaged samples through unchanged
    Raw,
    /// Exponential moving average over readings
    Ema,
}

/// Applies the configured filter to successive voltage readings
#[derive(Debug, Clone)]
pub struct VoltageFilter {
    mode: BatteryFilter,
    state: Option<i32>,
}

impl VoltageFilter {
    pub fn new(mode: BatteryFilter) -> Self {
        Self { mode, state: None }
    }

    /// Feed one averaged reading, get the filtered value back
    pub fn apply(&mut self, mv: u32) -> u32 {
        match self.mode {
            BatteryFilter::Raw => mv,
            BatteryFilter::Ema => {
                let sample = mv as i32;
                let next = match self.state {
                    // Seed with the first sample so startup shows a real level
                    None => sample,
                    Some(prev) => prev + (sample - prev) / EMA_DIV,
                };
                self.state = Some(next);
                next as u32
            }
        }
    }
}

/// Edge produced by the low-battery hysteresis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlertEdge {
    Show,
    Hide,
}

/// Low-battery alert state with split thresholds
#[derive(Debug, Clone, Default)]
pub struct LowBatteryAlert {
    visible: bool,
}

impl LowBatteryAlert {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Update from a gauge reading; returns an edge when visibility changes
    pub fn update(&mut self, level: u8, charging: bool, discharging: bool) -> Option<AlertEdge> {
        if !self.visible && discharging && !charging && level < LOW_SHOW_BELOW {
            self.visible = true;
            return Some(AlertEdge::Show);
        }
        if self.visible && (charging || level >= LOW_HIDE_AT) {
            self.visible = false;
            return Some(AlertEdge::Hide);
        }
        None
    }
}

/// Status-bar battery glyph selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatteryIcon {
    Charging,
    Low,
    Medium,
    Full,
}

impl BatteryIcon {
    pub fn for_reading(level: u8, charging: bool) -> Self {
        if charging {
            BatteryIcon::Charging
        } else if level < 20 {
            BatteryIcon::Low
        } else if level < 60 {
            BatteryIcon::Medium
        } else {
            BatteryIcon::Full
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fit_endpoints_clamp() {
        assert_eq!(voltage_to_percent(3_300), 0);
        assert_eq!(voltage_to_percent(4_200), 100);
        assert_eq!(voltage_to_percent(0), 0);
        assert_eq!(voltage_to_percent(10_000), 0);
    }

    #[test]
    fn fit_midrange_is_monotonic_enough() {
        let low = voltage_to_percent(3_600);
        let mid = voltage_to_percent(3_800);
        let high = voltage_to_percent(4_000);
        assert!(low < mid && mid < high);
        assert!((1..100).contains(&mid));
    }

    #[test]
    fn ema_seeds_then_smooths() {
        let mut f = VoltageFilter::new(BatteryFilter::Ema);
        assert_eq!(f.apply(4_000), 4_000);
        // A 100mV jump moves the output one tenth of the way
        assert_eq!(f.apply(4_100), 4_010);
    }

    #[test]
    fn raw_filter_is_identity() {
        let mut f = VoltageFilter::new(BatteryFilter::Raw);
        assert_eq!(f.apply(3_700), 3_700);
        assert_eq!(f.apply(4_100), 4_100);
    }

    #[test]
    fn alert_hysteresis_band() {
        let mut alert = LowBatteryAlert::new();
        assert_eq!(alert.update(19, false, true), Some(AlertEdge::Show));
        // Bouncing back above 20 but below 25 keeps it shown
        assert_eq!(alert.update(21, false, true), None);
        assert!(alert.visible());
        assert_eq!(alert.update(25, false, true), Some(AlertEdge::Hide));
    }

    #[test]
    fn alert_edges_across_a_discharge_trace() {
        // A drain past 20%, a bounce inside the band, then a recharge
        let trace: [(u8, Option<AlertEdge>); 6] = [
            (25, None),
            (22, None),
            (19, Some(AlertEdge::Show)),
            (21, None),
            (19, None),
            (26, Some(AlertEdge::Hide)),
        ];
        let mut alert = LowBatteryAlert::new();
        for (level, expected) in trace {
            assert_eq!(alert.update(level, false, true), expected, "at {level}%");
        }
        assert!(!alert.visible());
    }

    #[test]
    fn plugging_in_hides_the_alert() {
        let mut alert = LowBatteryAlert::new();
        alert.update(10, false, true);
        assert_eq!(alert.update(10, true, false), Some(AlertEdge::Hide));
        // And it will not re-show while charging
        assert_eq!(alert.update(10, true, false), None);
    }

    #[test]
    fn no_alert_when_not_discharging() {
        let mut alert = LowBatteryAlert::new();
        assert_eq!(alert.update(10, false, false), None);
    }

    #[test]
    fn icon_bands() {
        assert_eq!(BatteryIcon::for_reading(5, true), BatteryIcon::Charging);
        assert_eq!(BatteryIcon::for_reading(19, false), BatteryIcon::Low);
        assert_eq!(BatteryIcon::for_reading(20, false), BatteryIcon::Medium);
        assert_eq!(BatteryIcon::for_reading(59, false), BatteryIcon::Medium);
        assert_eq!(BatteryIcon::for_reading(60, false), BatteryIcon::Full);
    }

    proptest! {
        #[test]
        fn percent_always_in_range(mv in 0u32..=12_000) {
            let pct = voltage_to_percent(mv);
            prop_assert!(pct <= 100);
        }

        #[test]
        fn alert_never_flickers_inside_the_band(levels in proptest::collection::vec(20u8..25, 1..50)) {
            let mut alert = LowBatteryAlert::new();
            alert.update(10, false, true);
            for level in levels {
                prop_assert_eq!(alert.update(level, false, true), None);
            }
            prop_assert!(alert.visible());
        }
    }
}
