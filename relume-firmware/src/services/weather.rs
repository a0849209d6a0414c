//! Weather over the assistant link
//!
//! `update` drains any reply that arrived since the last poll, then
//! files a fresh request. It reports success only when a reply landed,
//! so the first call after boot counts as a miss and the poller's
//! shorter retry interval covers the link round trip.

use log::info;

use relume_core::traits::{WeatherReport, WeatherService};

use crate::channels::{WEATHER_REPLY, WEATHER_REQUEST};

pub struct LinkWeather {
    latest: WeatherReport,
}

impl LinkWeather {
    pub fn new() -> Self {
        Self {
            latest: WeatherReport::default(),
        }
    }
}

impl WeatherService for LinkWeather {
    fn update(&mut self) -> bool {
        let fresh = match WEATHER_REPLY.try_take() {
            Some(report) => {
                info!("weather: {} {}", report.city.as_str(), report.condition.as_str());
                self.latest = report;
                true
            }
            None => false,
        };
        WEATHER_REQUEST.signal(());
        fresh
    }

    fn latest(&self) -> &WeatherReport {
        &self.latest
    }
}
