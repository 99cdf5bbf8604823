// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer. Each
//! slot's lifetime becomes a duration span on its own thread lane, with every
//! other event rendered as an instant.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// The host timestamps events with its animation-frame pump count, not wall
/// time, so `frame_interval_us` supplies the microseconds each frame should
/// occupy on the timeline (16_667 reads as 60 Hz). Slot spans are laid out
/// with `tid` equal to the slot's arena index, which keeps overlapping
/// lifetimes during a handoff on separate lanes.
pub fn export(bytes: &[u8], frame_interval_us: u64, writer: &mut dyn Write) -> io::Result<()> {
    let ts = |frame_index: u64| frame_index * frame_interval_us;
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::SlotAllocated {
                frame_index,
                slot,
                kind,
                view,
            } => {
                events.push(json!({
                    "ph": "B",
                    "name": format!("Slot{} ({kind:?})", slot.index),
                    "cat": "Slot",
                    "ts": ts(frame_index),
                    "pid": 0,
                    "tid": slot.index,
                    "args": {
                        "slot": format!("{slot:?}"),
                        "view": view.0,
                    }
                }));
            }
            RecordedEvent::SlotReleased {
                frame_index,
                slot,
                kind,
            } => {
                events.push(json!({
                    "ph": "E",
                    "name": format!("Slot{} ({kind:?})", slot.index),
                    "cat": "Slot",
                    "ts": ts(frame_index),
                    "pid": 0,
                    "tid": slot.index,
                    "args": {
                        "slot": format!("{slot:?}"),
                    }
                }));
            }
            RecordedEvent::SurfaceLive { frame_index, slot } => {
                events.push(json!({
                    "ph": "i",
                    "name": "SurfaceLive",
                    "cat": "Surface",
                    "ts": ts(frame_index),
                    "pid": 0,
                    "tid": slot.index,
                    "s": "t",
                    "args": {
                        "slot": format!("{slot:?}"),
                    }
                }));
            }
            RecordedEvent::SurfaceBound {
                frame_index,
                slot,
                handle_changed,
                direct_path,
                width,
                height,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "SurfaceBound",
                    "cat": "Surface",
                    "ts": ts(frame_index),
                    "pid": 0,
                    "tid": slot.index,
                    "s": "t",
                    "args": {
                        "handle_changed": handle_changed,
                        "direct_path": direct_path,
                        "width": width,
                        "height": height,
                    }
                }));
            }
            RecordedEvent::SurfaceUnbound {
                frame_index,
                slot,
                cache_back_buffer,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "SurfaceUnbound",
                    "cat": "Surface",
                    "ts": ts(frame_index),
                    "pid": 0,
                    "tid": slot.index,
                    "s": "t",
                    "args": {
                        "cache_back_buffer": cache_back_buffer,
                    }
                }));
            }
            RecordedEvent::HandoffBegan {
                frame_index,
                outgoing,
                incoming,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "HandoffBegan",
                    "cat": "Handoff",
                    "ts": ts(frame_index),
                    "pid": 0,
                    "tid": incoming.index,
                    "s": "g",
                    "args": {
                        "outgoing": format!("{outgoing:?}"),
                        "incoming": format!("{incoming:?}"),
                    }
                }));
            }
            RecordedEvent::ContentSettled {
                frame_index,
                slot,
                kind,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "ContentSettled",
                    "cat": "Handoff",
                    "ts": ts(frame_index),
                    "pid": 0,
                    "tid": slot.index,
                    "s": "t",
                    "args": {
                        "kind": format!("{kind:?}"),
                    }
                }));
            }
            RecordedEvent::CallbacksRun {
                frame_index,
                slot,
                count,
                success,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "CallbacksRun",
                    "cat": "Handoff",
                    "ts": ts(frame_index),
                    "pid": 0,
                    "tid": slot.index,
                    "s": "t",
                    "args": {
                        "count": count,
                        "success": success,
                    }
                }));
            }
            RecordedEvent::Cover {
                frame_index,
                visible,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "Cover",
                    "cat": "Handoff",
                    "ts": ts(frame_index),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "visible": visible,
                    }
                }));
            }
            RecordedEvent::TeardownFlush {
                frame_index,
                tasks_run,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "TeardownFlush",
                    "cat": "Handoff",
                    "ts": ts(frame_index),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "tasks_run": tasks_run,
                    }
                }));
            }
            RecordedEvent::TaskRun {
                frame_index,
                slot,
                step,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "TaskRun",
                    "cat": "Rich",
                    "ts": ts(frame_index),
                    "pid": 0,
                    "tid": slot.index,
                    "s": "p",
                    "args": {
                        "step": format!("{step:?}"),
                    }
                }));
            }
            RecordedEvent::Swap {
                frame_index,
                swap_index,
                remaining_until_visible,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "Swap",
                    "cat": "Rich",
                    "ts": ts(frame_index),
                    "pid": 0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "swap_index": swap_index,
                        "remaining_until_visible": remaining_until_visible,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}
