// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the handoff protocol.
//!
//! This module provides a [`TraceSink`] trait with per-event methods the host
//! calls at each externally meaningful transition. All method bodies default
//! to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] owns an optional boxed sink. When the `trace` feature is
//! **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Every event carries `frame_index`, the host's animation-frame pump count
//! at the time of emission, so sinks can lay events out on a shared timeline.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) — gates the per-swap and per-task events
//!   plus the corresponding `TraceSink` methods.

use crate::slot::SlotId;
use crate::surface::BackendKind;
use crate::view::ViewId;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a request allocates a new slot.
#[derive(Clone, Copy, Debug)]
pub struct SlotAllocatedEvent {
    /// Animation-frame pump count at emission.
    pub frame_index: u64,
    /// The new slot.
    pub slot: SlotId,
    /// Requested backend kind.
    pub kind: BackendKind,
    /// The backend view the adapter allocated for it.
    pub view: ViewId,
}

/// Emitted when the platform reports a slot's backend surface live.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceLiveEvent {
    /// Animation-frame pump count at emission.
    pub frame_index: u64,
    /// The slot that became current.
    pub slot: SlotId,
}

/// Emitted when surface state is forwarded to the compositor.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceBoundEvent {
    /// Animation-frame pump count at emission.
    pub frame_index: u64,
    /// The bound slot.
    pub slot: SlotId,
    /// Whether a new platform handle was forwarded (`false` for a
    /// geometry-only rebind).
    pub handle_changed: bool,
    /// Whether the compositor may use the direct presentation path.
    pub direct_path: bool,
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
}

/// Emitted when a slot's surface is unbound from the compositor.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceUnboundEvent {
    /// Animation-frame pump count at emission.
    pub frame_index: u64,
    /// The unbound slot.
    pub slot: SlotId,
    /// Whether the compositor was asked to keep the back buffer for the
    /// successor's startup window.
    pub cache_back_buffer: bool,
}

/// Emitted when a live slot is superseded and its teardown is linked to the
/// incoming slot.
#[derive(Clone, Copy, Debug)]
pub struct HandoffBeganEvent {
    /// Animation-frame pump count at emission.
    pub frame_index: u64,
    /// The slot being retired.
    pub outgoing: SlotId,
    /// The slot taking over.
    pub incoming: SlotId,
}

/// Emitted when a slot proves it is showing real content (swap-count gate
/// for Direct, invalidate for Texture).
#[derive(Clone, Copy, Debug)]
pub struct ContentSettledEvent {
    /// Animation-frame pump count at emission.
    pub frame_index: u64,
    /// The settled slot.
    pub slot: SlotId,
    /// Its backend kind.
    pub kind: BackendKind,
}

/// Emitted when a slot's queued ready-callbacks are delivered.
#[derive(Clone, Copy, Debug)]
pub struct CallbacksRunEvent {
    /// Animation-frame pump count at emission.
    pub frame_index: u64,
    /// The slot whose callbacks ran.
    pub slot: SlotId,
    /// Number of callbacks delivered.
    pub count: u32,
    /// Value delivered: `true` for live-and-shown, `false` for superseded.
    pub success: bool,
}

/// Emitted when a slot's view has been detached and the slot is released.
#[derive(Clone, Copy, Debug)]
pub struct SlotReleasedEvent {
    /// Animation-frame pump count at emission.
    pub frame_index: u64,
    /// The released slot. The ID is stale after this event.
    pub slot: SlotId,
    /// Kind the slot carried.
    pub kind: BackendKind,
}

/// Emitted when the window-attach cover view is shown or removed.
#[derive(Clone, Copy, Debug)]
pub struct CoverEvent {
    /// Animation-frame pump count at emission.
    pub frame_index: u64,
    /// `true` on attach (cover inserted frontmost), `false` once enough
    /// swaps completed and the cover was removed.
    pub visible: bool,
}

/// Emitted when host teardown force-runs outstanding deferred tasks.
#[derive(Clone, Copy, Debug)]
pub struct TeardownFlushEvent {
    /// Animation-frame pump count at emission.
    pub frame_index: u64,
    /// Tasks run synchronously by the flush.
    pub tasks_run: u32,
}

/// Which deferred step ran (requires `trace-rich`).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskStep {
    /// Backend view inserted at the back of the z-order.
    Attach,
    /// Queued ready-callbacks delivered.
    FlushCallbacks,
    /// Outgoing Direct view reordered to the back.
    SendToBack,
    /// Detach countdown ticked without detaching.
    DetachWait,
    /// View detached and released.
    Detach,
    /// Placeholder background cleared after the first swap.
    ClearPlaceholder,
}

/// Per-task execution record (requires `trace-rich`).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct TaskRunEvent {
    /// Animation-frame pump count at emission.
    pub frame_index: u64,
    /// The slot the task concerned.
    pub slot: SlotId,
    /// Which step ran.
    pub step: TaskStep,
}

/// Per-vsync swap record (requires `trace-rich`).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct SwapEvent {
    /// Animation-frame pump count at emission.
    pub frame_index: u64,
    /// Monotonic swap counter.
    pub swap_index: u64,
    /// Swaps the current Direct slot still needs before it counts as
    /// visible, if it is still counting.
    pub remaining_until_visible: Option<u32>,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the host.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a request allocates a new slot.
    fn on_slot_allocated(&mut self, e: &SlotAllocatedEvent) {
        _ = e;
    }

    /// Called when a slot's surface goes live and becomes current.
    fn on_surface_live(&mut self, e: &SurfaceLiveEvent) {
        _ = e;
    }

    /// Called when surface state is forwarded to the compositor.
    fn on_surface_bound(&mut self, e: &SurfaceBoundEvent) {
        _ = e;
    }

    /// Called when a surface is unbound from the compositor.
    fn on_surface_unbound(&mut self, e: &SurfaceUnboundEvent) {
        _ = e;
    }

    /// Called when a handoff between two slots begins.
    fn on_handoff_began(&mut self, e: &HandoffBeganEvent) {
        _ = e;
    }

    /// Called when a slot proves it shows real content.
    fn on_content_settled(&mut self, e: &ContentSettledEvent) {
        _ = e;
    }

    /// Called when a slot's ready-callbacks are delivered.
    fn on_callbacks_run(&mut self, e: &CallbacksRunEvent) {
        _ = e;
    }

    /// Called when a slot is released.
    fn on_slot_released(&mut self, e: &SlotReleasedEvent) {
        _ = e;
    }

    /// Called when the cover view is shown or removed.
    fn on_cover(&mut self, e: &CoverEvent) {
        _ = e;
    }

    /// Called when teardown force-runs outstanding tasks.
    fn on_teardown_flush(&mut self, e: &TeardownFlushEvent) {
        _ = e;
    }

    /// Called for each deferred task executed (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    fn on_task_run(&mut self, e: &TaskRunEvent) {
        _ = e;
    }

    /// Called for each compositor swap (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    fn on_swap(&mut self, e: &SwapEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional owned [`TraceSink`].
///
/// The host stores one of these for the duration of its life, so unlike a
/// per-frame tracer it owns the sink rather than borrowing it. When the
/// `trace` feature is **off**, every method compiles to nothing and no sink
/// is stored; when **on**, each method checks the inner `Option` (one
/// branch) before dispatching.
#[derive(Default)]
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<alloc::boxed::Box<dyn TraceSink>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Tracer {
    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub const fn none() -> Self {
        Self {
            #[cfg(feature = "trace")]
            sink: None,
        }
    }

    /// Installs `sink` as the event destination.
    ///
    /// Without the `trace` feature the sink is dropped and nothing is ever
    /// emitted.
    #[inline]
    pub fn set_sink(&mut self, sink: alloc::boxed::Box<dyn TraceSink>) {
        #[cfg(feature = "trace")]
        {
            self.sink = Some(sink);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
        }
    }

    /// Emits a [`SlotAllocatedEvent`].
    #[inline]
    pub fn slot_allocated(&mut self, e: &SlotAllocatedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_slot_allocated(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SurfaceLiveEvent`].
    #[inline]
    pub fn surface_live(&mut self, e: &SurfaceLiveEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_surface_live(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SurfaceBoundEvent`].
    #[inline]
    pub fn surface_bound(&mut self, e: &SurfaceBoundEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_surface_bound(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SurfaceUnboundEvent`].
    #[inline]
    pub fn surface_unbound(&mut self, e: &SurfaceUnboundEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_surface_unbound(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`HandoffBeganEvent`].
    #[inline]
    pub fn handoff_began(&mut self, e: &HandoffBeganEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_handoff_began(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ContentSettledEvent`].
    #[inline]
    pub fn content_settled(&mut self, e: &ContentSettledEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_content_settled(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CallbacksRunEvent`].
    #[inline]
    pub fn callbacks_run(&mut self, e: &CallbacksRunEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_callbacks_run(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SlotReleasedEvent`].
    #[inline]
    pub fn slot_released(&mut self, e: &SlotReleasedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_slot_released(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CoverEvent`].
    #[inline]
    pub fn cover(&mut self, e: &CoverEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_cover(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TeardownFlushEvent`].
    #[inline]
    pub fn teardown_flush(&mut self, e: &TeardownFlushEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_teardown_flush(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TaskRunEvent`] (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn task_run(&mut self, e: &TaskRunEvent) {
        if let Some(s) = &mut self.sink {
            s.on_task_run(e);
        }
    }

    /// Emits a [`SwapEvent`] (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn swap(&mut self, e: &SwapEvent) {
        if let Some(s) = &mut self.sink {
            s.on_swap(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
