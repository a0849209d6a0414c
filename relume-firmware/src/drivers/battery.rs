//! Battery sensing: ADC pack voltage plus charger status pins
//!
//! The pack sits behind a 3:1 resistive divider into ADC1. Each read
//! averages a short burst of conversions, scales back up through the
//! divider and runs the result through the shared EMA filter before
//! the quadratic voltage-to-percent fit.

use embedded_hal::digital::InputPin;
use esp_hal::analog::adc::{Adc, AdcPin};
use esp_hal::peripherals::{ADC1, GPIO4};
use esp_hal::Blocking;
use log::warn;

use relume_core::battery::{
    voltage_to_percent, BatteryFilter, VoltageFilter, DIVIDER_RATIO, SAMPLE_COUNT,
};
use relume_core::traits::{BatteryGauge, BatteryReading};

/// ADC full-scale in millivolts at 11 dB attenuation
const ADC_FULL_SCALE_MV: u32 = 3100;
const ADC_MAX: u32 = 4095;

/// Averaged divided-down pack voltage in millivolts
pub trait VoltageSource {
    fn sample_mv(&mut self) -> Option<u32>;
}

/// ADC1 oneshot sampler on the pack-sense pin
pub struct AdcSampler {
    adc: Adc<'static, ADC1<'static>, Blocking>,
    pin: AdcPin<GPIO4<'static>, ADC1<'static>>,
}

impl AdcSampler {
    pub fn new(
        adc: Adc<'static, ADC1<'static>, Blocking>,
        pin: AdcPin<GPIO4<'static>, ADC1<'static>>,
    ) -> Self {
        Self { adc, pin }
    }
}

impl VoltageSource for AdcSampler {
    fn sample_mv(&mut self) -> Option<u32> {
        let mut sum: u32 = 0;
        for _ in 0..SAMPLE_COUNT {
            sum += self.adc.read_blocking(&mut self.pin) as u32;
        }
        let raw = sum / SAMPLE_COUNT as u32;
        Some(raw * ADC_FULL_SCALE_MV / ADC_MAX)
    }
}

pub struct BatterySense<S, C, D> {
    source: S,
    charging_pin: C,
    discharging_pin: D,
    filter: VoltageFilter,
}

impl<S: VoltageSource, C: InputPin, D: InputPin> BatterySense<S, C, D> {
    pub fn new(source: S, charging_pin: C, discharging_pin: D) -> Self {
        Self {
            source,
            charging_pin,
            discharging_pin,
            filter: VoltageFilter::new(BatteryFilter::Ema),
        }
    }
}

impl<S: VoltageSource, C: InputPin, D: InputPin> BatteryGauge for BatterySense<S, C, D> {
    fn read(&mut self) -> Option<BatteryReading> {
        let divided_mv = self.source.sample_mv()?;
        let pack_mv = self.filter.apply(divided_mv * DIVIDER_RATIO);

        // Charger status pins are active low
        let charging = match self.charging_pin.is_low() {
            Ok(level) => level,
            Err(_) => {
                warn!("battery: charge pin read failed");
                false
            }
        };
        let discharging = match self.discharging_pin.is_low() {
            Ok(level) => level,
            Err(_) => false,
        };

        Some(BatteryReading {
            level: voltage_to_percent(pack_mv),
            charging,
            discharging,
        })
    }
}
