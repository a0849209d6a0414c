//! Voice-tool dispatch
//!
//! The assistant pipeline edits reminders through tool calls on the
//! link. The update task drains the queue between poll iterations so
//! all memo mutations stay on the task that owns the pad, and every
//! call gets a one-line JSON acknowledgement back.

use core::fmt::Write as _;

use heapless::String;
use log::{info, warn};

use relume_core::memo::{MemoError, MemoPad, Reminder};
use relume_core::traits::{DisplaySurface, KvStore, SharedSurface};

use crate::channels::{CONTRAST, RENDER_WAKE, TOOL_REPLIES, TOOL_REQUESTS};
use crate::link::ToolRequest;
use crate::services::memostore::{CONTRAST_KEY, UI_NAMESPACE};
use crate::ui::SharedScene;

fn reply(line: String<96>) {
    // A full reply queue only loses an acknowledgement
    let _ = TOOL_REPLIES.try_send(line);
}

fn ack(op: &str, result: Result<usize, MemoError>) {
    let mut line: String<96> = String::new();
    let ok = match result {
        Ok(count) => {
            let _ = write!(line, r#"{{"op":"{}","ok":true,"count":{}}}"#, op, count);
            true
        }
        Err(ref e) => {
            let reason = match e {
                MemoError::ListFull => "full",
                MemoError::BadIndex { .. } => "bad_index",
                MemoError::Empty => "empty",
                MemoError::Encode | MemoError::Storage => "storage",
            };
            let _ = write!(line, r#"{{"op":"{}","ok":false,"err":"{}"}}"#, op, reason);
            false
        }
    };
    if !ok {
        info!("tool {} rejected", op);
    }
    reply(line);
}

fn send_listing<S: KvStore>(memos: &MemoPad<S>) {
    for (i, item) in memos.list().iter().enumerate() {
        let mut line: String<96> = String::new();
        let _ = write!(
            line,
            r#"{{"op":"memo.item","index":{},"time":"{}","text":"{}"}}"#,
            i + 1,
            item.time.as_str(),
            item.text.as_str()
        );
        reply(line);
    }
    let mut tail: String<96> = String::new();
    let _ = write!(tail, r#"{{"op":"memo.end","count":{}}}"#, memos.list().len());
    reply(tail);
}

fn repaint_memos<S: KvStore>(ui: &SharedScene, memos: &MemoPad<S>) {
    let list = memos.list();
    ui.with(&mut |surface: &mut dyn DisplaySurface| {
        surface.refresh_memos(list);
    });
    RENDER_WAKE.signal(());
}

/// Run every queued tool call against the pad and the scene
pub fn drain<S: KvStore>(ui: &SharedScene, memos: &mut MemoPad<S>) -> bool {
    let mut handled = false;
    while let Ok(req) = TOOL_REQUESTS.try_receive() {
        handled = true;
        match req {
            ToolRequest::MemoAdd { time, text } => {
                let result = memos.mutate(|list| {
                    list.add(Reminder { time, text })?;
                    Ok(list.len())
                });
                ack("memo.add", result);
                repaint_memos(ui, memos);
            }
            ToolRequest::MemoDone { index } => {
                let result = memos.mutate(|list| {
                    list.complete(index)?;
                    Ok(list.len())
                });
                ack("memo.done", result);
                repaint_memos(ui, memos);
            }
            ToolRequest::MemoList => {
                send_listing(memos);
            }
            ToolRequest::MemoClear => {
                let result = memos.mutate(|list| {
                    list.clear();
                    Ok(0)
                });
                ack("memo.clear", result);
                repaint_memos(ui, memos);
            }
            ToolRequest::Contrast { level } => {
                // Persist first so the level survives a reboot, then
                // hand it to the render task that owns the panel
                let saved = memos.store().set(UI_NAMESPACE, CONTRAST_KEY, &[level]);
                if saved.is_err() {
                    warn!("tool contrast: store write failed");
                }
                CONTRAST.signal(level);
                let mut line: String<96> = String::new();
                let _ = write!(
                    line,
                    r#"{{"op":"contrast","ok":{},"level":{}}}"#,
                    saved.is_ok(),
                    level
                );
                reply(line);
            }
        }
    }
    handled
}
