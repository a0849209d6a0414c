//! Small drawing helpers used by the scene

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use heapless::String;

use relume_core::battery::BatteryIcon;
use relume_core::scroll::ScrollPlan;
use relume_core::traits::WifiIcon;

use crate::color::Mono;

/// Pixel gap between the two copies of a looping marquee
pub const MARQUEE_GAP_PX: u32 = 24;

/// How a [`ScrollingLabel`] moves when its text overflows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    /// Loop forever (music titles)
    Loop,
    /// Sweep to the end, pause, restart from the top (chat text)
    Sweep,
}

/// A single-line label that scrolls when wider than its viewport
pub struct ScrollingLabel {
    text: String<64>,
    plan: ScrollPlan,
    started_ms: u32,
    mode: ScrollMode,
}

impl ScrollingLabel {
    pub fn new(mode: ScrollMode) -> Self {
        Self {
            text: String::new(),
            plan: ScrollPlan::None,
            started_ms: 0,
            mode,
        }
    }

    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    pub fn plan(&self) -> ScrollPlan {
        self.plan
    }

    /// Replace the text and restart the scroll clock
    pub fn set_text(&mut self, text: &str, viewport_px: u32, font: &MonoFont<'_>, now_ms: u32) {
        self.text.clear();
        // Overlong input is cut at capacity; the scroll still covers it
        for ch in text.chars() {
            if self.text.push(ch).is_err() {
                break;
            }
        }
        let content_px = self.text.chars().count() as u32 * font.character_size.width;
        self.plan = match self.mode {
            ScrollMode::Loop => ScrollPlan::marquee(content_px, viewport_px, MARQUEE_GAP_PX),
            ScrollMode::Sweep => ScrollPlan::bounded(content_px, viewport_px),
        };
        self.started_ms = now_ms;
    }

    /// Whether redraws are still needed for the animation
    pub fn animating(&self, now_ms: u32) -> bool {
        !self.plan.finished(now_ms.wrapping_sub(self.started_ms))
    }

    /// Draw into `target`, clipped to the viewport rectangle
    pub fn draw<D>(
        &self,
        target: &mut D,
        viewport: Rectangle,
        style: MonoTextStyle<'_, Mono>,
        now_ms: u32,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Mono>,
    {
        let offset = self.plan.offset_at(now_ms.wrapping_sub(self.started_ms)) as i32;
        let mut clipped = target.clipped(&viewport);
        let origin = Point::new(viewport.top_left.x - offset, viewport.top_left.y);
        Text::with_baseline(self.text.as_str(), origin, style, Baseline::Top)
            .draw(&mut clipped)?;
        // The loop seam: a second copy trails the first so wrap-around
        // never shows an empty viewport
        if let ScrollPlan::Marquee { travel_px, .. } = self.plan {
            Text::with_baseline(
                self.text.as_str(),
                origin + Point::new(travel_px as i32, 0),
                style,
                Baseline::Top,
            )
            .draw(&mut clipped)?;
        }
        Ok(())
    }
}

/// Battery glyph: outline, charge fill, nub; a bolt bar when charging
pub fn draw_battery<D>(
    target: &mut D,
    top_left: Point,
    icon: BatteryIcon,
    level: u8,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Mono>,
{
    let body = Rectangle::new(top_left, Size::new(20, 10));
    body.into_styled(PrimitiveStyle::with_stroke(Mono::Black, 1))
        .draw(target)?;
    Rectangle::new(top_left + Point::new(20, 3), Size::new(2, 4))
        .into_styled(PrimitiveStyle::with_fill(Mono::Black))
        .draw(target)?;
    let fill_px = match icon {
        BatteryIcon::Charging => 16,
        _ => (level.min(100) as u32 * 16) / 100,
    };
    if fill_px > 0 {
        Rectangle::new(top_left + Point::new(2, 2), Size::new(fill_px, 6))
            .into_styled(PrimitiveStyle::with_fill(Mono::Black))
            .draw(target)?;
    }
    if icon == BatteryIcon::Charging {
        // Inverted notch marks the charge animation
        Rectangle::new(top_left + Point::new(8, 3), Size::new(2, 4))
            .into_styled(PrimitiveStyle::with_fill(Mono::White))
            .draw(target)?;
    }
    Ok(())
}

/// Wi-Fi glyph: stacked arcs reduced to bars on a 1-bit panel
pub fn draw_wifi<D>(target: &mut D, top_left: Point, icon: WifiIcon) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Mono>,
{
    let bars: u32 = match icon {
        WifiIcon::Connected => 3,
        WifiIcon::Configuring => 1,
        WifiIcon::Off => 0,
    };
    for i in 0..3u32 {
        let height = 3 + i * 3;
        let filled = i < bars;
        let rect = Rectangle::new(
            top_left + Point::new((i * 5) as i32, (9 - height) as i32),
            Size::new(3, height),
        );
        let style = if filled {
            PrimitiveStyle::with_fill(Mono::Black)
        } else {
            PrimitiveStyle::with_stroke(Mono::Black, 1)
        };
        rect.into_styled(style).draw(target)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::mono_font::ascii::FONT_6X10;
    use relume_core::scroll::{BOUNDED_END_PAUSE_MS, MARQUEE_START_DELAY_MS};

    #[test]
    fn short_text_does_not_scroll() {
        let mut label = ScrollingLabel::new(ScrollMode::Loop);
        label.set_text("hi", 200, &FONT_6X10, 0);
        assert_eq!(label.plan(), ScrollPlan::None);
        assert!(!label.animating(60_000));
    }

    #[test]
    fn long_text_loops() {
        let mut label = ScrollingLabel::new(ScrollMode::Loop);
        label.set_text("a very long music title indeed", 60, &FONT_6X10, 1_000);
        assert!(matches!(label.plan(), ScrollPlan::Marquee { .. }));
        assert!(label.animating(u32::MAX));
    }

    #[test]
    fn sweep_restarts_after_end_pause() {
        let mut label = ScrollingLabel::new(ScrollMode::Sweep);
        label.set_text("a fairly long chat reply to sweep", 60, &FONT_6X10, 0);
        let (travel, duration) = match label.plan() {
            ScrollPlan::Bounded {
                travel_px,
                duration_ms,
            } => (travel_px, duration_ms),
            other => panic!("expected bounded plan, got {other:?}"),
        };
        assert!(travel > 0);
        // Tail held through the pause, then the sweep starts over
        assert_eq!(label.plan().offset_at(duration), travel);
        assert_eq!(label.plan().offset_at(duration + BOUNDED_END_PAUSE_MS), 0);
        assert!(label.animating(duration + 10_000));
    }

    #[test]
    fn new_text_restarts_the_clock() {
        let mut label = ScrollingLabel::new(ScrollMode::Loop);
        label.set_text("first overflowing title text here", 60, &FONT_6X10, 0);
        // Halfway through a loop, swap the text
        label.set_text("second overflowing title text here", 60, &FONT_6X10, 50_000);
        // Fresh start delay applies again
        assert_eq!(
            label.plan().offset_at(MARQUEE_START_DELAY_MS - 1),
            0
        );
    }
}
