//! Retained desk-clock scene
//!
//! The scene is the single shared drawing surface: the poller writes
//! labels through the [`DisplaySurface`] trait, voice tools switch the
//! side card page, and the render task calls [`Scene::render`] into the
//! panel whenever something is dirty or an animation is running.
//!
//! Layout on the 400x300 landscape panel:
//!
//! ```text
//! +------------------------------------------+
//! | wifi  emotion                battery 98% |  status bar
//! |                                          |
//! |  08:30            +--------------------+ |
//! |  2024-06-15 SAT   |  side card:        | |
//! |  23.1C  45%       |  weather / music / | |
//! |                   |  pomodoro          | |
//! |                   +--------------------+ |
//! |  Listening... (scrolls when long)        |  chat line
//! |  1. [08:30] standup                      |  reminders
//! +------------------------------------------+
//! ```

pub mod widgets;

use core::fmt::Write as _;

use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10, FONT_8X13};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use heapless::{String, Vec};

use relume_core::battery::BatteryIcon;
use relume_core::memo::{MemoList, MAX_MEMOS};
use relume_core::traits::{DisplaySurface, EnvReading, WeatherReport, WifiIcon};

use crate::color::Mono;
use widgets::{draw_battery, draw_wifi, ScrollMode, ScrollingLabel};

/// Which card occupies the right side of the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Weather,
    Music,
    Pomodoro,
}

/// Full-screen alert content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String<24>,
    pub body: String<64>,
}

/// Pomodoro card state, driven by a voice tool
#[derive(Debug, Clone, Copy, Default)]
pub struct Pomodoro {
    pub remaining_s: u16,
    pub on_break: bool,
    pub running: bool,
}

const CHAT_VIEWPORT: Rectangle = Rectangle::new(Point::new(12, 208), Size::new(376, 14));
const MUSIC_VIEWPORT: Rectangle = Rectangle::new(Point::new(216, 70), Size::new(168, 14));
const CARD: Rectangle = Rectangle::new(Point::new(208, 40), Size::new(184, 150));

/// All retained display state
pub struct Scene {
    dirty: bool,
    clock: String<5>,
    second: u8,
    date: String<16>,
    env: String<16>,
    weather: WeatherReport,
    battery: Option<(BatteryIcon, u8)>,
    wifi: WifiIcon,
    emotion: String<12>,
    chat: ScrollingLabel,
    low_battery: bool,
    memo_lines: Vec<String<64>, MAX_MEMOS>,
    page: Page,
    music_title: ScrollingLabel,
    music_artist: String<32>,
    pomodoro: Pomodoro,
    alert: Option<Alert>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            dirty: true,
            clock: String::new(),
            second: 0,
            date: String::new(),
            env: String::new(),
            weather: WeatherReport::default(),
            battery: None,
            wifi: WifiIcon::Off,
            emotion: String::new(),
            chat: ScrollingLabel::new(ScrollMode::Sweep),
            low_battery: false,
            memo_lines: Vec::new(),
            page: Page::default(),
            music_title: ScrollingLabel::new(ScrollMode::Loop),
            music_artist: String::new(),
            pomodoro: Pomodoro::default(),
            alert: None,
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    /// Switch the side card; pages are mutually exclusive
    pub fn set_page(&mut self, page: Page) {
        if self.page != page {
            self.page = page;
            self.dirty = true;
        }
    }

    pub fn set_music(&mut self, title: &str, artist: &str, now_ms: u32) {
        self.music_title
            .set_text(title, MUSIC_VIEWPORT.size.width, &FONT_8X13, now_ms);
        self.music_artist.clear();
        let _ = self.music_artist.push_str(artist);
        self.page = Page::Music;
        self.dirty = true;
    }

    pub fn set_pomodoro(&mut self, pomodoro: Pomodoro) {
        self.pomodoro = pomodoro;
        self.page = Page::Pomodoro;
        self.dirty = true;
    }

    /// Chat/status line written by the voice pipeline or alerts
    pub fn set_chat_text(&mut self, text: &str, now_ms: u32) {
        if self.chat.text() != text {
            self.chat
                .set_text(text, CHAT_VIEWPORT.size.width, &FONT_8X13, now_ms);
            self.dirty = true;
        }
    }

    pub fn show_alert(&mut self, title: &str, body: &str) {
        let mut t = String::new();
        for ch in title.chars() {
            if t.push(ch).is_err() {
                break;
            }
        }
        let mut b = String::new();
        for ch in body.chars() {
            if b.push(ch).is_err() {
                break;
            }
        }
        self.alert = Some(Alert { title: t, body: b });
        self.dirty = true;
    }

    pub fn clear_alert(&mut self) {
        if self.alert.is_some() {
            self.alert = None;
            self.dirty = true;
        }
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    /// Consume the dirty flag; the render task flushes when it was set
    pub fn take_dirty(&mut self) -> bool {
        core::mem::replace(&mut self.dirty, false)
    }

    /// Whether an animation wants another frame soon
    pub fn animating(&self, now_ms: u32) -> bool {
        self.chat.animating(now_ms)
            || (self.page == Page::Music && self.music_title.animating(now_ms))
    }

    /// Draw the whole scene into `target`
    pub fn render<D>(&self, target: &mut D, now_ms: u32) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Mono>,
    {
        let small = MonoTextStyle::new(&FONT_6X10, Mono::Black);
        let body = MonoTextStyle::new(&FONT_8X13, Mono::Black);
        let big = MonoTextStyle::new(&FONT_10X20, Mono::Black);

        target.clear(Mono::White)?;

        // Status bar
        draw_wifi(target, Point::new(12, 8), self.wifi)?;
        Text::with_baseline(self.emotion.as_str(), Point::new(36, 6), small, Baseline::Top)
            .draw(target)?;
        if let Some((icon, level)) = self.battery {
            draw_battery(target, Point::new(340, 6), icon, level)?;
            let mut pct: String<5> = String::new();
            let _ = write!(pct, "{level}%");
            Text::with_baseline(pct.as_str(), Point::new(366, 6), small, Baseline::Top)
                .draw(target)?;
        }
        if self.low_battery {
            Text::with_baseline("LOW BATTERY", Point::new(160, 6), small, Baseline::Top)
                .draw(target)?;
        }

        // Clock column
        Text::with_baseline(self.clock.as_str(), Point::new(20, 60), big, Baseline::Top)
            .draw(target)?;
        Text::with_baseline(self.date.as_str(), Point::new(20, 96), body, Baseline::Top)
            .draw(target)?;
        Text::with_baseline(self.env.as_str(), Point::new(20, 120), body, Baseline::Top)
            .draw(target)?;

        // Side card
        CARD.into_styled(PrimitiveStyle::with_stroke(Mono::Black, 1))
            .draw(target)?;
        match self.page {
            Page::Weather => self.render_weather(target, body, small)?,
            Page::Music => self.render_music(target, body, small, now_ms)?,
            Page::Pomodoro => self.render_pomodoro(target, big, small)?,
        }

        // Chat line and reminders
        self.chat.draw(target, CHAT_VIEWPORT, body, now_ms)?;
        let mut y = 230;
        for line in self.memo_lines.iter() {
            Text::with_baseline(line.as_str(), Point::new(12, y), small, Baseline::Top)
                .draw(target)?;
            y += 12;
        }

        // Alert overlays everything else
        if let Some(alert) = &self.alert {
            let frame = Rectangle::new(Point::new(60, 90), Size::new(280, 110));
            frame
                .into_styled(PrimitiveStyle::with_fill(Mono::White))
                .draw(target)?;
            frame
                .into_styled(PrimitiveStyle::with_stroke(Mono::Black, 2))
                .draw(target)?;
            Text::with_baseline(alert.title.as_str(), Point::new(76, 104), body, Baseline::Top)
                .draw(target)?;
            Text::with_baseline(alert.body.as_str(), Point::new(76, 136), body, Baseline::Top)
                .draw(target)?;
        }
        Ok(())
    }

    fn render_weather<D>(
        &self,
        target: &mut D,
        body: MonoTextStyle<'_, Mono>,
        small: MonoTextStyle<'_, Mono>,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Mono>,
    {
        Text::with_baseline(
            self.weather.city.as_str(),
            Point::new(216, 52),
            body,
            Baseline::Top,
        )
        .draw(target)?;
        Text::with_baseline(
            self.weather.condition.as_str(),
            Point::new(216, 78),
            small,
            Baseline::Top,
        )
        .draw(target)?;
        Text::with_baseline(
            self.weather.temperature.as_str(),
            Point::new(216, 100),
            body,
            Baseline::Top,
        )
        .draw(target)?;
        Ok(())
    }

    fn render_music<D>(
        &self,
        target: &mut D,
        body: MonoTextStyle<'_, Mono>,
        small: MonoTextStyle<'_, Mono>,
        now_ms: u32,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Mono>,
    {
        Text::with_baseline("Now playing", Point::new(216, 52), small, Baseline::Top)
            .draw(target)?;
        self.music_title.draw(target, MUSIC_VIEWPORT, body, now_ms)?;
        Text::with_baseline(
            self.music_artist.as_str(),
            Point::new(216, 92),
            small,
            Baseline::Top,
        )
        .draw(target)?;
        Ok(())
    }

    fn render_pomodoro<D>(
        &self,
        target: &mut D,
        big: MonoTextStyle<'_, Mono>,
        small: MonoTextStyle<'_, Mono>,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Mono>,
    {
        let mut remaining: String<8> = String::new();
        let _ = write!(
            remaining,
            "{:02}:{:02}",
            self.pomodoro.remaining_s / 60,
            self.pomodoro.remaining_s % 60
        );
        Text::with_baseline(remaining.as_str(), Point::new(250, 90), big, Baseline::Top)
            .draw(target)?;
        let label = match (self.pomodoro.running, self.pomodoro.on_break) {
            (false, _) => "paused",
            (true, false) => "focus",
            (true, true) => "break",
        };
        Text::with_baseline(label, Point::new(262, 130), small, Baseline::Top).draw(target)?;
        Ok(())
    }
}

impl DisplaySurface for Scene {
    fn set_clock(&mut self, hhmm: &str, second: u8) {
        if self.clock.as_str() != hhmm {
            self.clock.clear();
            let _ = self.clock.push_str(hhmm);
            self.dirty = true;
        }
        self.second = second;
    }

    fn set_calendar(&mut self, year: u16, month: u8, day: u8, weekday: &str) {
        let mut date: String<16> = String::new();
        let _ = write!(date, "{year:04}-{month:02}-{day:02} {weekday}");
        if self.date != date {
            self.date = date;
            self.dirty = true;
        }
    }

    fn set_env(&mut self, reading: EnvReading) {
        let mut env: String<16> = String::new();
        let _ = write!(
            env,
            "{}.{}C  {}%",
            reading.temp_c_x10 / 10,
            (reading.temp_c_x10 % 10).unsigned_abs(),
            reading.humidity_x10 / 10
        );
        if self.env != env {
            self.env = env;
            self.dirty = true;
        }
    }

    fn set_weather(&mut self, report: &WeatherReport) {
        if &self.weather != report {
            self.weather = report.clone();
            self.dirty = true;
        }
    }

    fn set_battery(&mut self, icon: BatteryIcon, level: u8) {
        if self.battery != Some((icon, level)) {
            self.battery = Some((icon, level));
            self.dirty = true;
        }
    }

    fn set_wifi(&mut self, icon: WifiIcon) {
        if self.wifi != icon {
            self.wifi = icon;
            self.dirty = true;
        }
    }

    fn set_assistant(&mut self, emotion: &str, status: Option<&'static str>) {
        if self.emotion.as_str() != emotion {
            self.emotion.clear();
            let _ = self.emotion.push_str(emotion);
            self.dirty = true;
        }
        if let Some(text) = status {
            // Status lines are short fixed strings that never scroll
            self.set_chat_text(text, 0);
        }
    }

    fn set_low_battery_visible(&mut self, visible: bool) {
        if self.low_battery != visible {
            self.low_battery = visible;
            self.dirty = true;
        }
    }

    fn refresh_memos(&mut self, list: &MemoList) {
        self.memo_lines.clear();
        for (i, reminder) in list.iter().enumerate() {
            let mut line: String<64> = String::new();
            let _ = write!(line, "{}. [{}] {}", i + 1, reminder.time, reminder.text);
            // Capacity matches the list bound
            let _ = self.memo_lines.push(line);
        }
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::tests::panel;
    use relume_core::memo::Reminder;

    fn memo_list() -> MemoList {
        let mut list = MemoList::new();
        list.add(Reminder {
            time: String::try_from("08:30").unwrap(),
            text: String::try_from("standup").unwrap(),
        })
        .unwrap();
        list
    }

    #[test]
    fn pages_are_exclusive() {
        let mut scene = Scene::new();
        assert_eq!(scene.page(), Page::Weather);
        scene.set_music("title", "artist", 0);
        assert_eq!(scene.page(), Page::Music);
        scene.set_pomodoro(Pomodoro {
            remaining_s: 1_500,
            on_break: false,
            running: true,
        });
        assert_eq!(scene.page(), Page::Pomodoro);
        scene.set_page(Page::Weather);
        assert_eq!(scene.page(), Page::Weather);
    }

    #[test]
    fn dirty_only_on_change() {
        let mut scene = Scene::new();
        assert!(scene.take_dirty());
        scene.set_clock("08:30", 0);
        assert!(scene.take_dirty());
        scene.set_clock("08:30", 5);
        assert!(!scene.take_dirty());
        scene.set_wifi(WifiIcon::Off);
        assert!(!scene.take_dirty());
        scene.set_wifi(WifiIcon::Connected);
        assert!(scene.take_dirty());
    }

    #[test]
    fn memo_lines_are_numbered() {
        let mut scene = Scene::new();
        scene.refresh_memos(&memo_list());
        assert_eq!(scene.memo_lines.len(), 1);
        assert_eq!(scene.memo_lines[0].as_str(), "1. [08:30] standup");
    }

    #[test]
    fn env_formatting_handles_negatives() {
        let mut scene = Scene::new();
        scene.set_env(EnvReading {
            temp_c_x10: -53,
            humidity_x10: 402,
        });
        assert_eq!(scene.env.as_str(), "-5.3C  40%");
    }

    #[test]
    fn alert_lifecycle() {
        let mut scene = Scene::new();
        scene.take_dirty();
        scene.show_alert("Reminder", "standup");
        assert!(scene.alert().is_some());
        assert!(scene.take_dirty());
        scene.clear_alert();
        assert!(scene.alert().is_none());
        assert!(scene.take_dirty());
        // Clearing twice stays clean
        scene.clear_alert();
        assert!(!scene.take_dirty());
    }

    #[test]
    fn music_page_animates_long_titles() {
        let mut scene = Scene::new();
        scene.set_music("a very long song title that cannot fit", "band", 0);
        assert!(scene.animating(10_000));
        scene.set_page(Page::Weather);
        assert!(!scene.animating(10_000));
    }

    #[test]
    fn render_produces_ink() {
        let mut scene = Scene::new();
        scene.set_clock("08:30", 0);
        scene.set_calendar(2024, 6, 15, "SAT");
        scene.set_env(EnvReading {
            temp_c_x10: 231,
            humidity_x10: 450,
        });
        scene.refresh_memos(&memo_list());

        let mut p = panel();
        scene.render(&mut p, 0).unwrap();
        // Something was drawn over the white frame
        assert!(p.buffer().iter().any(|b| *b != 0xFF));
    }

    #[test]
    fn render_all_pages_smoke() {
        let mut scene = Scene::new();
        let mut p = panel();
        scene.set_music("title", "artist", 0);
        scene.render(&mut p, 0).unwrap();
        scene.set_pomodoro(Pomodoro {
            remaining_s: 90,
            on_break: true,
            running: true,
        });
        scene.render(&mut p, 0).unwrap();
        scene.show_alert("Low battery", "Connect the charger");
        scene.render(&mut p, 0).unwrap();
    }
}
