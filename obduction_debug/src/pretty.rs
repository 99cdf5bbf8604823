// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Lines are
//! prefixed with the animation-frame index so interleavings read in order.

use std::io::Write;

use obduction_core::trace::{
    CallbacksRunEvent, ContentSettledEvent, CoverEvent, HandoffBeganEvent, SlotAllocatedEvent,
    SlotReleasedEvent, SurfaceBoundEvent, SurfaceLiveEvent, SurfaceUnboundEvent, SwapEvent,
    TaskRunEvent, TaskStep, TeardownFlushEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write)
/// destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }
}

fn step_name(step: TaskStep) -> &'static str {
    match step {
        TaskStep::Attach => "attach",
        TaskStep::FlushCallbacks => "flush-callbacks",
        TaskStep::SendToBack => "send-to-back",
        TaskStep::DetachWait => "detach-wait",
        TaskStep::Detach => "detach",
        TaskStep::ClearPlaceholder => "clear-placeholder",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_slot_allocated(&mut self, e: &SlotAllocatedEvent) {
        let _ = writeln!(
            self.writer,
            "[alloc] frame={} slot={:?} kind={:?} view={:?}",
            e.frame_index, e.slot, e.kind, e.view,
        );
    }

    fn on_surface_live(&mut self, e: &SurfaceLiveEvent) {
        let _ = writeln!(
            self.writer,
            "[live] frame={} slot={:?}",
            e.frame_index, e.slot,
        );
    }

    fn on_surface_bound(&mut self, e: &SurfaceBoundEvent) {
        let handle = if e.handle_changed { "new" } else { "kept" };
        let path = if e.direct_path { "direct" } else { "copied" };
        let _ = writeln!(
            self.writer,
            "[bind] frame={} slot={:?} handle={handle} path={path} {}x{}",
            e.frame_index, e.slot, e.width, e.height,
        );
    }

    fn on_surface_unbound(&mut self, e: &SurfaceUnboundEvent) {
        let _ = writeln!(
            self.writer,
            "[unbind] frame={} slot={:?} cache={}",
            e.frame_index, e.slot, e.cache_back_buffer,
        );
    }

    fn on_handoff_began(&mut self, e: &HandoffBeganEvent) {
        let _ = writeln!(
            self.writer,
            "[handoff] frame={} {:?} -> {:?}",
            e.frame_index, e.outgoing, e.incoming,
        );
    }

    fn on_content_settled(&mut self, e: &ContentSettledEvent) {
        let _ = writeln!(
            self.writer,
            "[settled] frame={} slot={:?} kind={:?}",
            e.frame_index, e.slot, e.kind,
        );
    }

    fn on_callbacks_run(&mut self, e: &CallbacksRunEvent) {
        let _ = writeln!(
            self.writer,
            "[callbacks] frame={} slot={:?} count={} ok={}",
            e.frame_index, e.slot, e.count, e.success,
        );
    }

    fn on_slot_released(&mut self, e: &SlotReleasedEvent) {
        let _ = writeln!(
            self.writer,
            "[released] frame={} slot={:?} kind={:?}",
            e.frame_index, e.slot, e.kind,
        );
    }

    fn on_cover(&mut self, e: &CoverEvent) {
        let state = if e.visible { "shown" } else { "removed" };
        let _ = writeln!(
            self.writer,
            "[cover] frame={} {state}",
            e.frame_index,
        );
    }

    fn on_teardown_flush(&mut self, e: &TeardownFlushEvent) {
        let _ = writeln!(
            self.writer,
            "[teardown] frame={} tasks={}",
            e.frame_index, e.tasks_run,
        );
    }

    fn on_task_run(&mut self, e: &TaskRunEvent) {
        let _ = writeln!(
            self.writer,
            "[task] frame={} slot={:?} {}",
            e.frame_index,
            e.slot,
            step_name(e.step),
        );
    }

    fn on_swap(&mut self, e: &SwapEvent) {
        match e.remaining_until_visible {
            Some(remaining) => {
                let _ = writeln!(
                    self.writer,
                    "[swap] frame={} index={} remaining={remaining}",
                    e.frame_index, e.swap_index,
                );
            }
            None => {
                let _ = writeln!(
                    self.writer,
                    "[swap] frame={} index={}",
                    e.frame_index, e.swap_index,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_print_cover_line() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_cover(&CoverEvent {
            frame_index: 1,
            visible: true,
        });
        sink.on_cover(&CoverEvent {
            frame_index: 3,
            visible: false,
        });
        let output = String::from_utf8(sink.writer).unwrap();
        assert!(output.contains("[cover] frame=1 shown"), "got: {output}");
        assert!(output.contains("[cover] frame=3 removed"), "got: {output}");
    }

    #[test]
    fn pretty_print_swap_omits_absent_remaining() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_swap(&SwapEvent {
            frame_index: 2,
            swap_index: 4,
            remaining_until_visible: None,
        });
        let output = String::from_utf8(sink.writer).unwrap();
        assert!(output.contains("[swap] frame=2 index=4"), "got: {output}");
        assert!(!output.contains("remaining"), "got: {output}");
    }
}
