// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface slots and the arena that owns them.
//!
//! A [`SurfaceSlot`] is one allocated backend instance: its view, its
//! pending-callback queue, and its destruction state machine. Slots live in a
//! [`SlotArena`] and refer to each other only by [`SlotId`], an index plus
//! generation counter, so the handoff links
//! (`prev_awaiting_destroy`/`next_awaiting_callback`) are non-owning and a
//! stale handle is detectable instead of dangling. The host is the sole
//! owner of slot lifetime; everything here is bookkeeping it drives.
//!
//! Slot methods mutate only the slot itself and *report* what the host must
//! forward to the compositor (e.g. [`SurfaceSlot::mark_for_destroy`]
//! returning the unbind it implies). That keeps the protocol's compositor
//! traffic in one place, the host, where the single-binding invariant is
//! enforced.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::config::HandoffConfig;
use crate::surface::{BackendKind, SurfaceProperties};
use crate::view::ViewId;

/// Callback registered with a backend request.
///
/// Fires with `true` once the requested backend is live and has shown
/// content, or `false` if the request was superseded or torn down first.
pub type ReadyCallback = Box<dyn FnOnce(bool)>;

/// Window-manager redraw-and-ack callback; fires once the requested redraw
/// has demonstrably happened (or the surface went away).
pub type RedrawCallback = Box<dyn FnOnce()>;

/// A handle to a slot in a [`SlotArena`].
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a slot is destroyed and the entry is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl SlotId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self { idx, generation }
    }

    /// Returns the raw entry index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotId({}@gen{})", self.idx, self.generation)
    }
}

/// Result of feeding one compositor swap to a slot.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum SwapOutcome {
    /// The slot is not counting swaps (Texture kind, or already visible).
    Idle,
    /// Still waiting for more swaps; the embedder should keep drawing.
    Counting {
        /// Swaps still required.
        remaining: u32,
    },
    /// This swap satisfied the visibility gate.
    BecameVisible,
}

/// One allocated surface backend instance and its destruction state machine.
///
/// Field meanings follow the lifecycle: a slot is created `requested`,
/// becomes `current` when the platform reports its surface live, is marked
/// for destroy when superseded, and is freed once its view leaves the tree.
pub struct SurfaceSlot {
    pub(crate) kind: BackendKind,
    pub(crate) props: SurfaceProperties,
    pub(crate) view: ViewId,
    /// Cancellation signal: once set, the slot drops all further platform
    /// events and refuses new callback registrations.
    pub(crate) marked_for_destroy: bool,
    /// Whether `pending_callbacks` has been drained (it happens once).
    pub(crate) has_run_callbacks: bool,
    pub(crate) pending_callbacks: Vec<ReadyCallback>,
    /// Backlink to the slot this one superseded, alive until that slot's
    /// teardown completes. Chain length is at most one.
    pub(crate) prev_awaiting_destroy: Option<SlotId>,
    /// Forward link to the slot that superseded this one and is waiting for
    /// this teardown before flushing its own callbacks.
    pub(crate) next_awaiting_callback: Option<SlotId>,
    /// Direct-kind visibility gate; armed by each geometry change.
    pub(crate) remaining_swaps_until_visible: u32,
    /// The platform reported this surface live and has not yet reported (or
    /// been synthesized) a destroy; an unbind is owed to the compositor.
    pub(crate) needs_destroy_notification: bool,
    /// The unbind asked the compositor to cache the back buffer; the cache
    /// must be evicted when the deferred detach completes.
    pub(crate) cached_buffer_needs_eviction: bool,
    pub(crate) redraw_callbacks: Vec<RedrawCallback>,
    /// A placeholder background is painted on the view and should be cleared
    /// after the first swap (Direct kind only).
    pub(crate) placeholder_pending: bool,
    /// The deferred attach ran and the view is in the tree.
    pub(crate) attached: bool,
    /// The slot has proven visible content at least once.
    pub(crate) content_proven: bool,
}

impl SurfaceSlot {
    pub(crate) fn new(kind: BackendKind, props: SurfaceProperties, view: ViewId) -> Self {
        Self {
            kind,
            props,
            view,
            marked_for_destroy: false,
            has_run_callbacks: false,
            pending_callbacks: Vec::new(),
            prev_awaiting_destroy: None,
            next_awaiting_callback: None,
            remaining_swaps_until_visible: 0,
            needs_destroy_notification: false,
            cached_buffer_needs_eviction: false,
            redraw_callbacks: Vec::new(),
            placeholder_pending: matches!(kind, BackendKind::Direct),
            attached: false,
            content_proven: false,
        }
    }

    /// Which backend this slot drives.
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// The toolkit view owned by this slot.
    #[must_use]
    pub fn view(&self) -> ViewId {
        self.view
    }

    /// Whether this slot has been superseded and is tearing down.
    #[must_use]
    pub fn is_marked_for_destroy(&self) -> bool {
        self.marked_for_destroy
    }

    /// Whether the visibility gate is still counting swaps (Direct kind).
    #[must_use]
    pub fn remaining_swaps_until_visible(&self) -> u32 {
        self.remaining_swaps_until_visible
    }

    /// Whether this slot has put pixels on screen at least once.
    #[must_use]
    pub fn has_shown_content(&self) -> bool {
        self.content_proven
    }

    /// Queues a ready-callback.
    ///
    /// # Panics
    ///
    /// Panics if the slot is already marked for destroy; registering on a
    /// dying slot is a programming error, not a race.
    pub(crate) fn add_callback(&mut self, cb: ReadyCallback) {
        assert!(
            !self.marked_for_destroy,
            "callback registered on a slot marked for destroy"
        );
        self.pending_callbacks.push(cb);
    }

    pub(crate) fn take_pending_callbacks(&mut self) -> Vec<ReadyCallback> {
        core::mem::take(&mut self.pending_callbacks)
    }

    pub(crate) fn take_redraw_callbacks(&mut self) -> Vec<RedrawCallback> {
        core::mem::take(&mut self.redraw_callbacks)
    }

    pub(crate) fn has_redraw_callbacks(&self) -> bool {
        !self.redraw_callbacks.is_empty()
    }

    /// Marks the slot for destruction. Idempotent.
    ///
    /// Returns `Some(cache_back_buffer)` when the compositor is still owed an
    /// unbind for this surface (the platform never reported it destroyed);
    /// the host must forward that unbind before any other compositor call.
    /// `has_next_surface` enables back-buffer caching so the outgoing content
    /// keeps showing while the successor starts up. Direct kind only, since
    /// a Texture backend's content lives in the view, not a dedicated buffer.
    pub(crate) fn mark_for_destroy(&mut self, has_next_surface: bool) -> Option<bool> {
        if self.marked_for_destroy {
            return None;
        }
        self.marked_for_destroy = true;
        if !self.needs_destroy_notification {
            return None;
        }
        self.needs_destroy_notification = false;
        self.cached_buffer_needs_eviction =
            has_next_surface && matches!(self.kind, BackendKind::Direct);
        Some(self.cached_buffer_needs_eviction)
    }

    /// The platform reported the surface destroyed. The host must unbind the
    /// compositor (without caching) right after this call.
    ///
    /// # Panics
    ///
    /// Panics if no matching create was seen; the platform contract is
    /// created, changed, destroyed, in that order.
    pub(crate) fn platform_destroyed(&mut self) {
        assert!(
            self.needs_destroy_notification,
            "surface destroyed without a preceding create"
        );
        self.needs_destroy_notification = false;
    }

    /// Arms the Direct visibility gate after a geometry change.
    pub(crate) fn note_geometry(&mut self, config: &HandoffConfig) {
        if matches!(self.kind, BackendKind::Direct) {
            self.remaining_swaps_until_visible = config.swaps_until_visible;
        }
    }

    /// Feeds one compositor swap to the visibility gate.
    pub(crate) fn note_swap(&mut self) -> SwapOutcome {
        if self.remaining_swaps_until_visible == 0 {
            return SwapOutcome::Idle;
        }
        self.remaining_swaps_until_visible -= 1;
        if self.remaining_swaps_until_visible == 0 {
            SwapOutcome::BecameVisible
        } else {
            SwapOutcome::Counting {
                remaining: self.remaining_swaps_until_visible,
            }
        }
    }
}

impl fmt::Debug for SurfaceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceSlot")
            .field("kind", &self.kind)
            .field("props", &self.props)
            .field("view", &self.view)
            .field("marked_for_destroy", &self.marked_for_destroy)
            .field("has_run_callbacks", &self.has_run_callbacks)
            .field("pending_callbacks", &self.pending_callbacks.len())
            .field("prev_awaiting_destroy", &self.prev_awaiting_destroy)
            .field("next_awaiting_callback", &self.next_awaiting_callback)
            .field(
                "remaining_swaps_until_visible",
                &self.remaining_swaps_until_visible,
            )
            .field("needs_destroy_notification", &self.needs_destroy_notification)
            .field(
                "cached_buffer_needs_eviction",
                &self.cached_buffer_needs_eviction,
            )
            .field("redraw_callbacks", &self.redraw_callbacks.len())
            .field("placeholder_pending", &self.placeholder_pending)
            .field("attached", &self.attached)
            .field("content_proven", &self.content_proven)
            .finish()
    }
}

/// Arena owning every live [`SurfaceSlot`].
///
/// Entries are recycled via a free list; generation counters make handles to
/// freed entries detectably stale. At most three entries are ever live
/// (current, requested, and one slot draining through its deferred detach),
/// so lookups are linear.
#[derive(Debug, Default)]
pub struct SlotArena {
    entries: Vec<Option<SurfaceSlot>>,
    generation: Vec<u32>,
    free_list: Vec<u32>,
}

impl SlotArena {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Stores `slot` and returns its handle.
    pub(crate) fn alloc(&mut self, slot: SurfaceSlot) -> SlotId {
        let idx = if let Some(idx) = self.free_list.pop() {
            self.entries[idx as usize] = Some(slot);
            idx
        } else {
            let idx = u32::try_from(self.entries.len()).unwrap_or(u32::MAX);
            self.entries.push(Some(slot));
            self.generation.push(0);
            idx
        };
        SlotId::new(idx, self.generation[idx as usize])
    }

    /// Removes the slot, freeing its entry for reuse.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub(crate) fn free(&mut self, id: SlotId) -> SurfaceSlot {
        assert!(self.is_alive(id), "stale SlotId: {id:?}");
        // Bump generation so old handles immediately fail validation.
        self.generation[id.idx as usize] += 1;
        self.free_list.push(id.idx);
        self.entries[id.idx as usize]
            .take()
            .unwrap_or_else(|| unreachable!("live entry checked above"))
    }

    /// Returns whether the given handle refers to a live slot.
    #[must_use]
    pub fn is_alive(&self, id: SlotId) -> bool {
        (id.idx as usize) < self.entries.len()
            && self.generation[id.idx as usize] == id.generation
            && self.entries[id.idx as usize].is_some()
    }

    /// Stale-tolerant lookup: `None` for freed or reused entries.
    #[must_use]
    pub fn get(&self, id: SlotId) -> Option<&SurfaceSlot> {
        if self.is_alive(id) {
            self.entries[id.idx as usize].as_ref()
        } else {
            None
        }
    }

    /// Stale-tolerant mutable lookup.
    pub(crate) fn get_mut(&mut self, id: SlotId) -> Option<&mut SurfaceSlot> {
        if self.is_alive(id) {
            self.entries[id.idx as usize].as_mut()
        } else {
            None
        }
    }

    /// Lookup for handles the host owns and knows to be live.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub(crate) fn slot(&self, id: SlotId) -> &SurfaceSlot {
        self.get(id)
            .unwrap_or_else(|| panic!("stale SlotId: {id:?}"))
    }

    /// Mutable variant of [`slot`](Self::slot).
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub(crate) fn slot_mut(&mut self, id: SlotId) -> &mut SurfaceSlot {
        if !self.is_alive(id) {
            panic!("stale SlotId: {id:?}");
        }
        self.entries[id.idx as usize]
            .as_mut()
            .unwrap_or_else(|| unreachable!("live entry checked above"))
    }

    /// Finds the live slot owning `view`, if any.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "entry count is bounded by the handful of live slots"
    )]
    pub fn find_by_view(&self, view: ViewId) -> Option<SlotId> {
        self.entries.iter().enumerate().find_map(|(idx, entry)| {
            let slot = entry.as_ref()?;
            (slot.view == view).then(|| SlotId::new(idx as u32, self.generation[idx]))
        })
    }

    /// Number of live slots.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }
}
