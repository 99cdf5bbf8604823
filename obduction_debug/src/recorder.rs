// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Decoded events identify slots by [`SlotRef`] (raw index plus generation)
//! rather than `SlotId`; arena handles are only minted by a live host, and a
//! recording outlives the arena it describes.

use obduction_core::slot::SlotId;
use obduction_core::surface::BackendKind;
use obduction_core::trace::{
    CallbacksRunEvent, ContentSettledEvent, CoverEvent, HandoffBeganEvent, SlotAllocatedEvent,
    SlotReleasedEvent, SurfaceBoundEvent, SurfaceLiveEvent, SurfaceUnboundEvent, SwapEvent,
    TaskRunEvent, TaskStep, TeardownFlushEvent, TraceSink,
};
use obduction_core::view::ViewId;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_SLOT_ALLOCATED: u8 = 1;
const TAG_SURFACE_LIVE: u8 = 2;
const TAG_SURFACE_BOUND: u8 = 3;
const TAG_SURFACE_UNBOUND: u8 = 4;
const TAG_HANDOFF_BEGAN: u8 = 5;
const TAG_CONTENT_SETTLED: u8 = 6;
const TAG_CALLBACKS_RUN: u8 = 7;
const TAG_SLOT_RELEASED: u8 = 8;
const TAG_COVER: u8 = 9;
const TAG_TEARDOWN_FLUSH: u8 = 10;
const TAG_TASK_RUN: u8 = 11;
const TAG_SWAP: u8 = 12;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_slot(&mut self, slot: SlotId) {
        self.write_u32(slot.index());
        self.write_u32(slot.generation());
    }

    fn write_kind(&mut self, kind: BackendKind) {
        self.write_u8(match kind {
            BackendKind::Direct => 0,
            BackendKind::Texture => 1,
        });
    }

    fn write_step(&mut self, step: TaskStep) {
        self.write_u8(match step {
            TaskStep::Attach => 0,
            TaskStep::FlushCallbacks => 1,
            TaskStep::SendToBack => 2,
            TaskStep::DetachWait => 3,
            TaskStep::Detach => 4,
            TaskStep::ClearPlaceholder => 5,
        });
    }

    fn write_option_u32(&mut self, v: Option<u32>) {
        match v {
            Some(val) => {
                self.write_u8(1);
                self.write_u32(val);
            }
            None => {
                self.write_u8(0);
                self.write_u32(0);
            }
        }
    }
}

impl TraceSink for RecorderSink {
    fn on_slot_allocated(&mut self, e: &SlotAllocatedEvent) {
        self.write_u8(TAG_SLOT_ALLOCATED);
        self.write_u64(e.frame_index);
        self.write_slot(e.slot);
        self.write_kind(e.kind);
        self.write_u32(e.view.0);
    }

    fn on_surface_live(&mut self, e: &SurfaceLiveEvent) {
        self.write_u8(TAG_SURFACE_LIVE);
        self.write_u64(e.frame_index);
        self.write_slot(e.slot);
    }

    fn on_surface_bound(&mut self, e: &SurfaceBoundEvent) {
        self.write_u8(TAG_SURFACE_BOUND);
        self.write_u64(e.frame_index);
        self.write_slot(e.slot);
        self.write_bool(e.handle_changed);
        self.write_bool(e.direct_path);
        self.write_u32(e.width);
        self.write_u32(e.height);
    }

    fn on_surface_unbound(&mut self, e: &SurfaceUnboundEvent) {
        self.write_u8(TAG_SURFACE_UNBOUND);
        self.write_u64(e.frame_index);
        self.write_slot(e.slot);
        self.write_bool(e.cache_back_buffer);
    }

    fn on_handoff_began(&mut self, e: &HandoffBeganEvent) {
        self.write_u8(TAG_HANDOFF_BEGAN);
        self.write_u64(e.frame_index);
        self.write_slot(e.outgoing);
        self.write_slot(e.incoming);
    }

    fn on_content_settled(&mut self, e: &ContentSettledEvent) {
        self.write_u8(TAG_CONTENT_SETTLED);
        self.write_u64(e.frame_index);
        self.write_slot(e.slot);
        self.write_kind(e.kind);
    }

    fn on_callbacks_run(&mut self, e: &CallbacksRunEvent) {
        self.write_u8(TAG_CALLBACKS_RUN);
        self.write_u64(e.frame_index);
        self.write_slot(e.slot);
        self.write_u32(e.count);
        self.write_bool(e.success);
    }

    fn on_slot_released(&mut self, e: &SlotReleasedEvent) {
        self.write_u8(TAG_SLOT_RELEASED);
        self.write_u64(e.frame_index);
        self.write_slot(e.slot);
        self.write_kind(e.kind);
    }

    fn on_cover(&mut self, e: &CoverEvent) {
        self.write_u8(TAG_COVER);
        self.write_u64(e.frame_index);
        self.write_bool(e.visible);
    }

    fn on_teardown_flush(&mut self, e: &TeardownFlushEvent) {
        self.write_u8(TAG_TEARDOWN_FLUSH);
        self.write_u64(e.frame_index);
        self.write_u32(e.tasks_run);
    }

    fn on_task_run(&mut self, e: &TaskRunEvent) {
        self.write_u8(TAG_TASK_RUN);
        self.write_u64(e.frame_index);
        self.write_slot(e.slot);
        self.write_step(e.step);
    }

    fn on_swap(&mut self, e: &SwapEvent) {
        self.write_u8(TAG_SWAP);
        self.write_u64(e.frame_index);
        self.write_u64(e.swap_index);
        self.write_option_u32(e.remaining_until_visible);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Raw slot identity in a recording: arena index plus generation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRef {
    /// Arena entry index.
    pub index: u32,
    /// Generation the entry had when the event fired.
    pub generation: u32,
}

impl std::fmt::Debug for SlotRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@gen{}", self.index, self.generation)
    }
}

/// A decoded event from a binary recording.
#[derive(Clone, Copy, Debug)]
pub enum RecordedEvent {
    /// A [`SlotAllocatedEvent`].
    SlotAllocated {
        /// Animation-frame pump count at emission.
        frame_index: u64,
        /// The new slot.
        slot: SlotRef,
        /// Requested backend kind.
        kind: BackendKind,
        /// The backend view allocated for it.
        view: ViewId,
    },
    /// A [`SurfaceLiveEvent`].
    SurfaceLive {
        /// Animation-frame pump count at emission.
        frame_index: u64,
        /// The slot that became current.
        slot: SlotRef,
    },
    /// A [`SurfaceBoundEvent`].
    SurfaceBound {
        /// Animation-frame pump count at emission.
        frame_index: u64,
        /// The bound slot.
        slot: SlotRef,
        /// Whether a new platform handle was forwarded.
        handle_changed: bool,
        /// Whether the direct presentation path was enabled.
        direct_path: bool,
        /// Surface width in pixels.
        width: u32,
        /// Surface height in pixels.
        height: u32,
    },
    /// A [`SurfaceUnboundEvent`].
    SurfaceUnbound {
        /// Animation-frame pump count at emission.
        frame_index: u64,
        /// The unbound slot.
        slot: SlotRef,
        /// Whether the back buffer was kept for the successor.
        cache_back_buffer: bool,
    },
    /// A [`HandoffBeganEvent`].
    HandoffBegan {
        /// Animation-frame pump count at emission.
        frame_index: u64,
        /// The slot being retired.
        outgoing: SlotRef,
        /// The slot taking over.
        incoming: SlotRef,
    },
    /// A [`ContentSettledEvent`].
    ContentSettled {
        /// Animation-frame pump count at emission.
        frame_index: u64,
        /// The settled slot.
        slot: SlotRef,
        /// Its backend kind.
        kind: BackendKind,
    },
    /// A [`CallbacksRunEvent`].
    CallbacksRun {
        /// Animation-frame pump count at emission.
        frame_index: u64,
        /// The slot whose callbacks ran.
        slot: SlotRef,
        /// Number of callbacks delivered.
        count: u32,
        /// Value delivered to them.
        success: bool,
    },
    /// A [`SlotReleasedEvent`].
    SlotReleased {
        /// Animation-frame pump count at emission.
        frame_index: u64,
        /// The released slot.
        slot: SlotRef,
        /// Kind the slot carried.
        kind: BackendKind,
    },
    /// A [`CoverEvent`].
    Cover {
        /// Animation-frame pump count at emission.
        frame_index: u64,
        /// Whether the cover became visible or was removed.
        visible: bool,
    },
    /// A [`TeardownFlushEvent`].
    TeardownFlush {
        /// Animation-frame pump count at emission.
        frame_index: u64,
        /// Tasks run synchronously by the flush.
        tasks_run: u32,
    },
    /// A [`TaskRunEvent`].
    TaskRun {
        /// Animation-frame pump count at emission.
        frame_index: u64,
        /// The slot the task concerned.
        slot: SlotRef,
        /// Which step ran.
        step: TaskStep,
    },
    /// A [`SwapEvent`].
    Swap {
        /// Animation-frame pump count at emission.
        frame_index: u64,
        /// Monotonic swap counter.
        swap_index: u64,
        /// Swaps still needed before the current slot counts as visible.
        remaining_until_visible: Option<u32>,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_slot(&mut self) -> Option<SlotRef> {
        Some(SlotRef {
            index: self.read_u32()?,
            generation: self.read_u32()?,
        })
    }

    fn read_kind(&mut self) -> Option<BackendKind> {
        Some(match self.read_u8()? {
            0 => BackendKind::Direct,
            _ => BackendKind::Texture,
        })
    }

    fn read_step(&mut self) -> Option<TaskStep> {
        Some(match self.read_u8()? {
            0 => TaskStep::Attach,
            1 => TaskStep::FlushCallbacks,
            2 => TaskStep::SendToBack,
            3 => TaskStep::DetachWait,
            4 => TaskStep::Detach,
            _ => TaskStep::ClearPlaceholder,
        })
    }

    fn read_option_u32(&mut self) -> Option<Option<u32>> {
        let present = self.read_u8()?;
        let val = self.read_u32()?;
        Some(if present != 0 { Some(val) } else { None })
    }

    fn decode_slot_allocated(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SlotAllocated {
            frame_index: self.read_u64()?,
            slot: self.read_slot()?,
            kind: self.read_kind()?,
            view: ViewId(self.read_u32()?),
        })
    }

    fn decode_surface_live(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SurfaceLive {
            frame_index: self.read_u64()?,
            slot: self.read_slot()?,
        })
    }

    fn decode_surface_bound(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SurfaceBound {
            frame_index: self.read_u64()?,
            slot: self.read_slot()?,
            handle_changed: self.read_bool()?,
            direct_path: self.read_bool()?,
            width: self.read_u32()?,
            height: self.read_u32()?,
        })
    }

    fn decode_surface_unbound(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SurfaceUnbound {
            frame_index: self.read_u64()?,
            slot: self.read_slot()?,
            cache_back_buffer: self.read_bool()?,
        })
    }

    fn decode_handoff_began(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::HandoffBegan {
            frame_index: self.read_u64()?,
            outgoing: self.read_slot()?,
            incoming: self.read_slot()?,
        })
    }

    fn decode_content_settled(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::ContentSettled {
            frame_index: self.read_u64()?,
            slot: self.read_slot()?,
            kind: self.read_kind()?,
        })
    }

    fn decode_callbacks_run(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CallbacksRun {
            frame_index: self.read_u64()?,
            slot: self.read_slot()?,
            count: self.read_u32()?,
            success: self.read_bool()?,
        })
    }

    fn decode_slot_released(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SlotReleased {
            frame_index: self.read_u64()?,
            slot: self.read_slot()?,
            kind: self.read_kind()?,
        })
    }

    fn decode_cover(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Cover {
            frame_index: self.read_u64()?,
            visible: self.read_bool()?,
        })
    }

    fn decode_teardown_flush(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TeardownFlush {
            frame_index: self.read_u64()?,
            tasks_run: self.read_u32()?,
        })
    }

    fn decode_task_run(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TaskRun {
            frame_index: self.read_u64()?,
            slot: self.read_slot()?,
            step: self.read_step()?,
        })
    }

    fn decode_swap(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Swap {
            frame_index: self.read_u64()?,
            swap_index: self.read_u64()?,
            remaining_until_visible: self.read_option_u32()?,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_SLOT_ALLOCATED => self.decode_slot_allocated(),
            TAG_SURFACE_LIVE => self.decode_surface_live(),
            TAG_SURFACE_BOUND => self.decode_surface_bound(),
            TAG_SURFACE_UNBOUND => self.decode_surface_unbound(),
            TAG_HANDOFF_BEGAN => self.decode_handoff_began(),
            TAG_CONTENT_SETTLED => self.decode_content_settled(),
            TAG_CALLBACKS_RUN => self.decode_callbacks_run(),
            TAG_SLOT_RELEASED => self.decode_slot_released(),
            TAG_COVER => self.decode_cover(),
            TAG_TEARDOWN_FLUSH => self.decode_teardown_flush(),
            TAG_TASK_RUN => self.decode_task_run(),
            TAG_SWAP => self.decode_swap(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use obduction_core::compositor::CompositorBinding;
    use obduction_core::config::HandoffConfig;
    use obduction_core::host::RenderSurfaceHost;
    use obduction_core::surface::{Color, PixelFormat, SurfaceHandle};
    use obduction_core::view::ViewTree;

    use super::*;

    struct NullCompositor;

    impl CompositorBinding for NullCompositor {
        fn surface_available(&mut self) {}
        fn bind_surface(
            &mut self,
            _handle: Option<SurfaceHandle>,
            _can_use_direct_path: bool,
            _format: PixelFormat,
            _width: u32,
            _height: u32,
        ) {
        }
        fn unbind_surface(&mut self, _cache_back_buffer: bool) {}
        fn evict_cached_back_buffer(&mut self) {}
    }

    struct CountingTree(u32);

    impl ViewTree for CountingTree {
        fn create_backend_view(&mut self, _kind: BackendKind) -> ViewId {
            self.0 += 1;
            ViewId(self.0 - 1)
        }
        fn create_cover_view(&mut self) -> ViewId {
            self.0 += 1;
            ViewId(self.0 - 1)
        }
        fn insert_at_back(&mut self, _view: ViewId) {}
        fn insert_at_front(&mut self, _view: ViewId) {}
        fn remove(&mut self, _view: ViewId) {}
        fn reorder_to_back(&mut self, _view: ViewId) {}
        fn set_background(&mut self, _view: ViewId, _color: Option<Color>) {}
        fn destroy_view(&mut self, _view: ViewId) {}
    }

    /// Slot handles are only minted by a live arena, so borrow one from a
    /// throwaway host.
    fn some_slot() -> SlotId {
        let mut host =
            RenderSurfaceHost::new(NullCompositor, CountingTree(0), HandoffConfig::DEFAULT);
        host.request_backend(BackendKind::Direct, None);
        host.requested_slot().unwrap()
    }

    #[test]
    fn allocation_event_round_trips() {
        let mut rec = RecorderSink::new();
        rec.on_slot_allocated(&SlotAllocatedEvent {
            frame_index: 4,
            slot: some_slot(),
            kind: BackendKind::Texture,
            view: ViewId(9),
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1);
        match events[0] {
            RecordedEvent::SlotAllocated {
                frame_index,
                slot,
                kind,
                view,
            } => {
                assert_eq!(frame_index, 4);
                assert_eq!(slot, SlotRef { index: 0, generation: 0 });
                assert_eq!(kind, BackendKind::Texture);
                assert_eq!(view, ViewId(9));
            }
            ref other => panic!("expected SlotAllocated, got {other:?}"),
        }
    }

    #[test]
    fn bind_and_unbind_round_trip() {
        let mut rec = RecorderSink::new();
        rec.on_surface_bound(&SurfaceBoundEvent {
            frame_index: 3,
            slot: some_slot(),
            handle_changed: true,
            direct_path: false,
            width: 1920,
            height: 1080,
        });
        rec.on_surface_unbound(&SurfaceUnboundEvent {
            frame_index: 8,
            slot: some_slot(),
            cache_back_buffer: true,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        match events[0] {
            RecordedEvent::SurfaceBound {
                handle_changed,
                direct_path,
                width,
                height,
                ..
            } => {
                assert!(handle_changed);
                assert!(!direct_path);
                assert_eq!((width, height), (1920, 1080));
            }
            ref other => panic!("expected SurfaceBound, got {other:?}"),
        }
        match events[1] {
            RecordedEvent::SurfaceUnbound {
                frame_index,
                cache_back_buffer,
                ..
            } => {
                assert_eq!(frame_index, 8);
                assert!(cache_back_buffer);
            }
            ref other => panic!("expected SurfaceUnbound, got {other:?}"),
        }
    }

    #[test]
    fn handoff_sequence_decodes_in_order() {
        let slot = some_slot();
        let mut rec = RecorderSink::new();
        rec.on_handoff_began(&HandoffBeganEvent {
            frame_index: 10,
            outgoing: slot,
            incoming: slot,
        });
        rec.on_content_settled(&ContentSettledEvent {
            frame_index: 11,
            slot,
            kind: BackendKind::Direct,
        });
        rec.on_callbacks_run(&CallbacksRunEvent {
            frame_index: 12,
            slot,
            count: 2,
            success: true,
        });
        rec.on_slot_released(&SlotReleasedEvent {
            frame_index: 13,
            slot,
            kind: BackendKind::Direct,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], RecordedEvent::HandoffBegan { .. }));
        assert!(matches!(events[1], RecordedEvent::ContentSettled { .. }));
        assert!(matches!(
            events[2],
            RecordedEvent::CallbacksRun {
                count: 2,
                success: true,
                ..
            }
        ));
        assert!(matches!(events[3], RecordedEvent::SlotReleased { .. }));
    }

    #[test]
    fn swap_round_trips_with_and_without_remaining() {
        let mut rec = RecorderSink::new();
        rec.on_swap(&SwapEvent {
            frame_index: 1,
            swap_index: 5,
            remaining_until_visible: Some(2),
        });
        rec.on_swap(&SwapEvent {
            frame_index: 1,
            swap_index: 6,
            remaining_until_visible: None,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            RecordedEvent::Swap {
                swap_index: 5,
                remaining_until_visible: Some(2),
                ..
            }
        ));
        assert!(matches!(
            events[1],
            RecordedEvent::Swap {
                swap_index: 6,
                remaining_until_visible: None,
                ..
            }
        ));
    }

    #[test]
    fn every_task_step_survives_encoding() {
        let slot = some_slot();
        let steps = [
            TaskStep::Attach,
            TaskStep::FlushCallbacks,
            TaskStep::SendToBack,
            TaskStep::DetachWait,
            TaskStep::Detach,
            TaskStep::ClearPlaceholder,
        ];
        let mut rec = RecorderSink::new();
        for step in steps {
            rec.on_task_run(&TaskRunEvent {
                frame_index: 0,
                slot,
                step,
            });
        }

        let decoded: Vec<TaskStep> = decode(rec.as_bytes())
            .map(|event| match event {
                RecordedEvent::TaskRun { step, .. } => step,
                other => panic!("expected TaskRun, got {other:?}"),
            })
            .collect();
        assert_eq!(decoded, steps);
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }

    #[test]
    fn truncated_record_stops_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_cover(&CoverEvent {
            frame_index: 2,
            visible: true,
        });
        let mut bytes = rec.into_bytes();
        bytes.truncate(bytes.len() - 1);
        let events: Vec<_> = decode(&bytes).collect();
        assert!(events.is_empty(), "partial record must not decode");
    }

    #[test]
    fn unknown_tag_stops_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_teardown_flush(&TeardownFlushEvent {
            frame_index: 20,
            tasks_run: 6,
        });
        let mut bytes = rec.into_bytes();
        bytes.push(0xFF);
        bytes.extend_from_slice(&[0; 16]);
        let events: Vec<_> = decode(&bytes).collect();
        assert_eq!(events.len(), 1, "decoding stops at the unknown tag");
        assert!(matches!(
            events[0],
            RecordedEvent::TeardownFlush { tasks_run: 6, .. }
        ));
    }
}
