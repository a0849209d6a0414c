//! Assistant link over UART
//!
//! The voice pipeline runs on its own processor and talks to this
//! firmware over a JSON-lines UART link: one JSON object per `\n`.
//! Inbound frames carry pipeline state, chat text, weather replies,
//! synced epochs and tool calls; outbound frames carry sync/weather
//! requests, chime cues and tool acknowledgements.

use embassy_time::{Duration, Instant, Ticker};
use embedded_io_async::{Read, Write};
use esp_hal::uart::{UartRx, UartTx};
use esp_hal::Async;
use heapless::Vec;
use log::{debug, info, warn};
use serde::Deserialize;

use relume_core::state::DeviceState;
use relume_core::traits::{SoundCue, WeatherReport};
use relume_display::{Page, Pomodoro};

use crate::channels::{
    publish_state, RENDER_WAKE, SOUND_CUES, SYNCED_EPOCH, SYNC_REQUEST, TOOL_REPLIES,
    TOOL_REQUESTS, WEATHER_REPLY, WEATHER_REQUEST,
};
use crate::ui::SharedScene;

/// Longest accepted inbound line
const LINE_MAX: usize = 512;
/// Outbound poll cadence
const TX_PERIOD_MS: u64 = 50;

/// Tool calls that need the update task's stores to run
#[derive(Debug, Clone)]
pub enum ToolRequest {
    MemoAdd {
        time: heapless::String<8>,
        text: heapless::String<48>,
    },
    MemoDone {
        index: usize,
    },
    MemoList,
    MemoClear,
    Contrast {
        level: u8,
    },
}

/// One inbound line; unrelated fields stay `None`
#[derive(Deserialize)]
struct LinkFrame<'a> {
    op: &'a str,
    #[serde(default)]
    v: Option<&'a str>,
    #[serde(default)]
    text: Option<&'a str>,
    #[serde(default)]
    time: Option<&'a str>,
    #[serde(default)]
    emotion: Option<&'a str>,
    #[serde(default)]
    city: Option<&'a str>,
    #[serde(default)]
    cond: Option<&'a str>,
    #[serde(default)]
    temp: Option<&'a str>,
    #[serde(default)]
    epoch: Option<i64>,
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    title: Option<&'a str>,
    #[serde(default)]
    artist: Option<&'a str>,
    #[serde(default)]
    secs: Option<u16>,
    #[serde(default, rename = "break")]
    brk: Option<bool>,
    #[serde(default)]
    run: Option<bool>,
    #[serde(default)]
    level: Option<u8>,
}

fn parse_state(v: &str) -> DeviceState {
    match v {
        "starting" => DeviceState::Starting,
        "wifi_config" => DeviceState::WifiConfiguring,
        "connecting" => DeviceState::Connecting,
        "listening" => DeviceState::Listening,
        "speaking" => DeviceState::Speaking,
        "idle" => DeviceState::Idle,
        "upgrading" => DeviceState::Upgrading,
        "activating" => DeviceState::Activating,
        "error" => DeviceState::FatalError,
        _ => DeviceState::Unknown,
    }
}

fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}

fn truncated<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

fn handle_line(ui: &SharedScene, line: &[u8]) {
    let frame: LinkFrame = match serde_json_core::from_slice(line) {
        Ok((frame, _)) => frame,
        Err(_) => {
            warn!("link: unparseable line ({} bytes)", line.len());
            return;
        }
    };

    match frame.op {
        "state" => {
            if let Some(v) = frame.v {
                publish_state(parse_state(v));
                RENDER_WAKE.signal(());
            }
        }
        "chat" => {
            let text = frame.text.unwrap_or("");
            let now = now_ms();
            ui.lock(|scene| scene.set_chat_text(text, now));
            if let Some(emotion) = frame.emotion {
                debug!("link: emotion {}", emotion);
            }
            RENDER_WAKE.signal(());
        }
        "epoch" => {
            if let Some(epoch) = frame.epoch {
                SYNCED_EPOCH.signal(epoch);
            }
        }
        "weather" => {
            let report = WeatherReport {
                city: truncated(frame.city.unwrap_or("")),
                condition: truncated(frame.cond.unwrap_or("")),
                temperature: truncated(frame.temp.unwrap_or("")),
            };
            WEATHER_REPLY.signal(report);
        }
        "memo.add" => {
            let req = ToolRequest::MemoAdd {
                time: truncated(frame.time.unwrap_or("")),
                text: truncated(frame.text.unwrap_or("")),
            };
            if TOOL_REQUESTS.try_send(req).is_err() {
                warn!("link: tool queue full, dropping memo.add");
            }
        }
        "memo.done" => {
            if let Some(index) = frame.index {
                if TOOL_REQUESTS.try_send(ToolRequest::MemoDone { index }).is_err() {
                    warn!("link: tool queue full, dropping memo.done");
                }
            }
        }
        "memo.list" => {
            let _ = TOOL_REQUESTS.try_send(ToolRequest::MemoList);
        }
        "memo.clear" => {
            let _ = TOOL_REQUESTS.try_send(ToolRequest::MemoClear);
        }
        "music" => {
            let now = now_ms();
            ui.lock(|scene| {
                scene.set_music(frame.title.unwrap_or(""), frame.artist.unwrap_or(""), now);
                scene.set_page(Page::Music);
            });
            RENDER_WAKE.signal(());
        }
        "pomodoro" => {
            ui.lock(|scene| {
                scene.set_pomodoro(Pomodoro {
                    remaining_s: frame.secs.unwrap_or(0),
                    on_break: frame.brk.unwrap_or(false),
                    running: frame.run.unwrap_or(false),
                });
                scene.set_page(Page::Pomodoro);
            });
            RENDER_WAKE.signal(());
        }
        "page" => {
            let page = match frame.v {
                Some("music") => Page::Music,
                Some("pomodoro") => Page::Pomodoro,
                _ => Page::Weather,
            };
            ui.lock(|scene| scene.set_page(page));
            RENDER_WAKE.signal(());
        }
        "contrast" => {
            if let Some(level) = frame.level {
                if TOOL_REQUESTS.try_send(ToolRequest::Contrast { level }).is_err() {
                    warn!("link: tool queue full, dropping contrast");
                }
            }
        }
        other => {
            warn!("link: unknown op {:?}", other);
        }
    }
}

/// Reads the UART byte stream and dispatches complete lines
#[embassy_executor::task]
pub async fn link_rx_task(mut rx: UartRx<'static, Async>, ui: &'static SharedScene) {
    info!("link RX task started");

    let mut line: Vec<u8, LINE_MAX> = Vec::new();
    let mut overflowed = false;
    let mut buf = [0u8; 64];

    loop {
        let n = match rx.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("link: UART read error: {:?}", e);
                continue;
            }
        };

        for &byte in &buf[..n] {
            if byte == b'\n' {
                if !overflowed && !line.is_empty() {
                    handle_line(ui, &line);
                }
                line.clear();
                overflowed = false;
            } else if line.push(byte).is_err() {
                // Resync at the next newline
                overflowed = true;
            }
        }
    }
}

async fn send_line(tx: &mut UartTx<'static, Async>, line: &str) {
    if tx.write_all(line.as_bytes()).await.is_err() || tx.write_all(b"\n").await.is_err() {
        warn!("link: UART write error");
    }
}

/// Drains outbound requests at a short fixed cadence
#[embassy_executor::task]
pub async fn link_tx_task(mut tx: UartTx<'static, Async>) {
    info!("link TX task started");

    let mut ticker = Ticker::every(Duration::from_millis(TX_PERIOD_MS));

    loop {
        if SYNC_REQUEST.signaled() {
            SYNC_REQUEST.reset();
            send_line(&mut tx, "{\"op\":\"sync_time\"}").await;
        }

        if WEATHER_REQUEST.signaled() {
            WEATHER_REQUEST.reset();
            send_line(&mut tx, "{\"op\":\"get_weather\"}").await;
        }

        while let Ok(cue) = SOUND_CUES.try_receive() {
            let line = match cue {
                SoundCue::Reminder => "{\"op\":\"sound\",\"cue\":\"reminder\"}",
                SoundCue::LowBattery => "{\"op\":\"sound\",\"cue\":\"low_battery\"}",
            };
            send_line(&mut tx, line).await;
        }

        while let Ok(reply) = TOOL_REPLIES.try_receive() {
            send_line(&mut tx, &reply).await;
        }

        ticker.next().await;
    }
}
