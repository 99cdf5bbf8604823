// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The handoff controller connecting platform surfaces to a compositor.
//!
//! [`RenderSurfaceHost`] owns a [`SlotArena`] of backend slots, a deferred
//! task queue, and the two collaborator seams ([`CompositorBinding`] and
//! [`ViewTree`]). It accepts backend requests from the embedder and surface
//! lifecycle events from the platform, and keeps the compositor bound to at
//! most one surface at any time.
//!
//! # Handoff sequence
//!
//! Replacing one backend with another goes through five steps, tuned so the
//! screen never shows a gap between the outgoing and incoming content:
//!
//! 1. A new slot is allocated and its view inserted at the *back* of the
//!    z-order, hidden behind the old one.
//! 2. When the platform reports the new surface live, the compositor is
//!    rebound to it; the old slot is marked for destroy and the two slots are
//!    linked. The old view is still what the user sees.
//! 3. The host waits for the new slot to prove it has content: a Direct slot
//!    counts compositor swaps, a Texture slot waits for its first invalidate.
//! 4. The old slot's teardown runs. A Texture view detaches on the next
//!    animation frame; a Direct view is first reordered to the back and
//!    detached two frames later, because detaching a live dedicated surface
//!    removes it from the display pipeline before the toolkit closes the
//!    hole it occupied.
//! 5. Once the old view is gone, the new slot's ready-callbacks fire.
//!
//! All view-tree mutations go through the task queue and run from
//! [`RenderSurfaceHost::animation_frame`], never from inside a platform or
//! compositor callback.

use alloc::boxed::Box;

use crate::compositor::CompositorBinding;
use crate::config::HandoffConfig;
use crate::slot::{ReadyCallback, RedrawCallback, SlotArena, SlotId, SurfaceSlot, SwapOutcome};
use crate::surface::{BackendKind, Color, PixelFormat, SurfaceHandle, SurfaceProperties};
use crate::tasks::TaskTracker;
use crate::trace::{
    CallbacksRunEvent, ContentSettledEvent, CoverEvent, HandoffBeganEvent, SlotAllocatedEvent,
    SlotReleasedEvent, SurfaceBoundEvent, SurfaceLiveEvent, SurfaceUnboundEvent,
    TeardownFlushEvent, TraceSink, Tracer,
};
#[cfg(feature = "trace-rich")]
use crate::trace::{TaskRunEvent, TaskStep};
use crate::view::{ViewId, ViewTree};

/// One unit of deferred work, tagged with the slot it belongs to.
///
/// Tasks look their slot up again when they run; a task whose slot has been
/// released in the meantime is dropped, which is the normal fate of work
/// scheduled against a superseded slot.
#[derive(Clone, Copy, Debug)]
enum SlotTask {
    /// Insert the slot's view at the back of the z-order.
    Attach(SlotId),
    /// Deliver the slot's queued ready-callbacks.
    FlushCallbacks(SlotId),
    /// First Direct teardown step: reorder the outgoing view to the back.
    SendToBack(SlotId),
    /// Detach countdown. Counts `frames_left` down across frames and removes
    /// the view, releasing the slot, when it reaches one.
    Detach { slot: SlotId, frames_left: u32 },
    /// Clear the placeholder background once the first swap proved content.
    ClearPlaceholder(SlotId),
    /// Remove the window-attach cover view.
    HideCover,
}

/// Owner of the handoff state machine.
///
/// The host is single-threaded and re-entrancy free: every public method runs
/// to completion without calling back into the embedder, except for redraw
/// acks on dying slots which the platform contract requires to complete
/// immediately. Generic over the compositor seam `C` and the view-tree seam
/// `V` so the whole protocol can run against recording doubles in tests.
pub struct RenderSurfaceHost<C: CompositorBinding, V: ViewTree> {
    compositor: C,
    tree: V,
    config: HandoffConfig,
    slots: SlotArena,
    tasks: TaskTracker<SlotTask>,
    /// Slot of the most recent request. Stays set after the slot goes live.
    requested: Option<SlotId>,
    /// Slot whose surface the compositor is (or will next be) bound to.
    current: Option<SlotId>,
    props: SurfaceProperties,
    background_color: Color,
    physical_width: u32,
    physical_height: u32,
    /// Handle and direct-path flag of the last bind, for geometry dedup.
    last_bound: Option<(SurfaceHandle, bool)>,
    compositor_has_surface: bool,
    swap_ack_enabled: bool,
    cover_view: Option<ViewId>,
    cover_attached: bool,
    swaps_until_hide_cover: u32,
    /// Animation-frame pump count, stamped on trace events.
    frame_index: u64,
    /// Compositor swap count.
    swap_index: u64,
    tracer: Tracer,
}

impl<C: CompositorBinding, V: ViewTree> RenderSurfaceHost<C, V> {
    /// Creates a host that owns `compositor` and `tree` until
    /// [`destroy`](Self::destroy) returns them.
    #[must_use]
    pub fn new(compositor: C, tree: V, config: HandoffConfig) -> Self {
        Self {
            compositor,
            tree,
            config,
            slots: SlotArena::new(),
            tasks: TaskTracker::new(),
            requested: None,
            current: None,
            props: SurfaceProperties::DEFAULT,
            background_color: Color::WHITE,
            physical_width: 0,
            physical_height: 0,
            last_bound: None,
            compositor_has_surface: false,
            swap_ack_enabled: false,
            cover_view: None,
            cover_attached: false,
            swaps_until_hide_cover: 0,
            frame_index: 0,
            swap_index: 0,
            tracer: Tracer::none(),
        }
    }

    /// Installs a trace sink. A no-op without the `trace` feature.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.tracer.set_sink(sink);
    }

    // -----------------------------------------------------------------------
    // Embedder surface
    // -----------------------------------------------------------------------

    /// Requests that rendering go through a backend of `kind`.
    ///
    /// If the pending request already matches `kind` and the current surface
    /// properties, the existing slot is reused and `ready` simply joins its
    /// callback queue. Otherwise a new slot is allocated, its view scheduled
    /// for insertion at the back of the z-order, and any pending request that
    /// never went live is torn down on the spot.
    ///
    /// `ready` fires once, on a later animation frame: with `true` after the
    /// backend is live, has shown content, and any predecessor's teardown has
    /// finished; with `false` if the request is superseded first.
    pub fn request_backend(&mut self, kind: BackendKind, ready: Option<ReadyCallback>) {
        if let Some(req) = self.requested {
            let mismatch = {
                let slot = self.slots.slot(req);
                slot.kind != kind || slot.props != self.props
            };
            if mismatch {
                // A request that never went live is torn down immediately; a
                // live one keeps serving until the replacement's surface
                // arrives.
                if self.current != Some(req) {
                    self.mark_slot_for_destroy(req, false);
                    self.destroy_slot(req);
                }
                self.requested = None;
            }
        }

        let req = match self.requested {
            Some(req) => req,
            None => {
                let view = self.tree.create_backend_view(kind);
                if matches!(kind, BackendKind::Direct) {
                    // Placeholder backdrop until the first swap proves the
                    // surface has content.
                    self.tree.set_background(view, Some(self.background_color));
                }
                let id = self.slots.alloc(SurfaceSlot::new(kind, self.props, view));
                self.tasks.schedule(SlotTask::Attach(id));
                self.requested = Some(id);
                self.tracer.slot_allocated(&SlotAllocatedEvent {
                    frame_index: self.frame_index,
                    slot: id,
                    kind,
                    view,
                });
                id
            }
        };

        if let Some(ready) = ready {
            let ran_before = self.slots.slot(req).has_run_callbacks;
            self.slots.slot_mut(req).add_callback(ready);
            if ran_before {
                // Late registration after delivery: re-post a flush so the
                // callback still arrives on a later frame, never inline.
                self.tasks.schedule(SlotTask::FlushCallbacks(req));
            }
        }
    }

    /// Updates the surface properties applied to newly requested backends.
    ///
    /// If the current backend is Direct, it is re-requested so the new
    /// properties take effect from surface creation; Texture backends render
    /// through an offscreen buffer and do not need a reallocation.
    pub fn set_surface_properties(&mut self, props: SurfaceProperties) {
        if self.props == props {
            return;
        }
        self.props = props;
        let Some(cur) = self.current else { return };
        let kind = self.slots.slot(cur).kind;
        if matches!(kind, BackendKind::Direct) {
            self.request_backend(kind, None);
        }
    }

    /// Sets the background color painted behind surface content.
    ///
    /// Applies to the cover view, to the placeholder backdrop of live Direct
    /// views (re-arming the after-swap clear), and notifies the compositor.
    pub fn set_background_color(&mut self, color: Color) {
        if self.background_color == color {
            return;
        }
        self.background_color = color;
        if let Some(cover) = self.cover_view {
            self.tree.set_background(cover, Some(color));
        }
        let requested = self.requested;
        let current = self.current.filter(|&cur| requested != Some(cur));
        for id in [requested, current].into_iter().flatten() {
            let (kind, view) = {
                let slot = self.slots.slot(id);
                (slot.kind, slot.view)
            };
            if matches!(kind, BackendKind::Direct) {
                self.slots.slot_mut(id).placeholder_pending = true;
                self.tree.set_background(view, Some(color));
            }
        }
        self.compositor.background_color_changed(color);
    }

    /// Records the layout-driven size of the surface area.
    pub fn set_physical_size(&mut self, width: u32, height: u32) {
        self.physical_width = width;
        self.physical_height = height;
    }

    /// The last size recorded via [`set_physical_size`](Self::set_physical_size).
    #[must_use]
    pub fn physical_size(&self) -> (u32, u32) {
        (self.physical_width, self.physical_height)
    }

    /// Whether the compositor currently holds a live surface.
    #[must_use]
    pub fn has_live_surface(&self) -> bool {
        self.compositor_has_surface
    }

    /// The slot of the most recent request, if any.
    #[must_use]
    pub fn requested_slot(&self) -> Option<SlotId> {
        self.requested
    }

    /// The slot whose surface the compositor is bound to, if any.
    #[must_use]
    pub fn current_slot(&self) -> Option<SlotId> {
        self.current
    }

    /// Kind of the current backend, if one is live.
    #[must_use]
    pub fn current_kind(&self) -> Option<BackendKind> {
        self.current.map(|id| self.slots.slot(id).kind)
    }

    /// View of the current backend, for embedder readback.
    #[must_use]
    pub fn current_view(&self) -> Option<ViewId> {
        self.current.map(|id| self.slots.slot(id).view)
    }

    /// Read access to the slot arena.
    #[must_use]
    pub fn slots(&self) -> &SlotArena {
        &self.slots
    }

    /// Number of deferred tasks waiting for the next animation frame.
    #[must_use]
    pub fn deferred_task_count(&self) -> usize {
        self.tasks.len()
    }

    /// The handoff configuration this host was built with.
    #[must_use]
    pub fn config(&self) -> HandoffConfig {
        self.config
    }

    /// Read access to the compositor seam.
    #[must_use]
    pub fn compositor(&self) -> &C {
        &self.compositor
    }

    /// Mutable access to the compositor seam.
    pub fn compositor_mut(&mut self) -> &mut C {
        &mut self.compositor
    }

    /// Read access to the view-tree seam.
    #[must_use]
    pub fn view_tree(&self) -> &V {
        &self.tree
    }

    /// Mutable access to the view-tree seam.
    pub fn view_tree_mut(&mut self) -> &mut V {
        &mut self.tree
    }

    // -----------------------------------------------------------------------
    // Platform surface events
    // -----------------------------------------------------------------------

    /// The platform reports the surface behind `view` live.
    ///
    /// The owning slot becomes current. If another slot was current, this
    /// begins a handoff: the old slot is marked for destroy (unbinding its
    /// surface, with back-buffer caching for Direct kinds) and linked to the
    /// new one so callbacks fire only after the old teardown completes.
    ///
    /// Events for unknown views or slots already marked for destroy are
    /// dropped.
    ///
    /// # Panics
    ///
    /// Panics if the slot is live but neither requested nor current; the
    /// arena guarantees that cannot happen without memory corruption or a
    /// host bug.
    pub fn surface_created(&mut self, view: ViewId) {
        let Some(id) = self.slots.find_by_view(view) else {
            return;
        };
        if self.slots.slot(id).marked_for_destroy {
            return;
        }
        assert!(
            self.requested == Some(id) || self.current == Some(id),
            "live surface on a slot that is neither requested nor current"
        );

        if let Some(outgoing) = self.current.filter(|&cur| cur != id) {
            self.begin_handoff(outgoing, id);
        }
        self.current = Some(id);
        self.update_swap_ack_needed();
        self.compositor.surface_available();

        let run_now = {
            let slot = self.slots.slot(id);
            !slot.has_run_callbacks && slot.prev_awaiting_destroy.is_none()
        };
        if run_now {
            self.run_callbacks(id);
        }
        self.slots.slot_mut(id).needs_destroy_notification = true;
        self.tracer.surface_live(&SurfaceLiveEvent {
            frame_index: self.frame_index,
            slot: id,
        });
    }

    /// The platform reports geometry (and possibly a new handle) for the
    /// surface behind `view`.
    ///
    /// Forwards a bind to the compositor. When the handle and direct-path
    /// flag both match the previous bind, `None` is passed instead of the
    /// handle so the compositor treats it as a geometry-only update. Arms the
    /// Direct visibility gate.
    ///
    /// Events for unknown views, slots marked for destroy, or surfaces with
    /// no preceding create are dropped.
    pub fn surface_changed(
        &mut self,
        view: ViewId,
        handle: SurfaceHandle,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) {
        let Some(id) = self.slots.find_by_view(view) else {
            return;
        };
        {
            let slot = self.slots.slot(id);
            if slot.marked_for_destroy || !slot.needs_destroy_notification {
                return;
            }
        }
        debug_assert!(
            self.current == Some(id),
            "geometry reported for a non-current surface"
        );

        let direct_path = {
            let slot = self.slots.slot_mut(id);
            slot.note_geometry(&self.config);
            matches!(slot.kind, BackendKind::Direct) && slot.props.can_use_direct_path()
        };

        let pair = (handle, direct_path);
        let handle_changed = self.last_bound != Some(pair);
        self.last_bound = Some(pair);
        self.compositor.bind_surface(
            handle_changed.then_some(handle),
            direct_path,
            format,
            width,
            height,
        );
        self.compositor_has_surface = true;
        self.tracer.surface_bound(&SurfaceBoundEvent {
            frame_index: self.frame_index,
            slot: id,
            handle_changed,
            direct_path,
            width,
            height,
        });
    }

    /// The platform reports the surface behind `view` destroyed.
    ///
    /// Unbinds the compositor (no caching; the platform is taking the buffer
    /// away) and delivers pending redraw acks, which can no longer be
    /// satisfied by a swap. A later create on the same slot brings the
    /// surface back.
    ///
    /// Events for unknown views are dropped. For slots already marked for
    /// destroy the unbind was synthesized when the mark happened, so the
    /// event is dropped too.
    pub fn surface_destroyed(&mut self, view: ViewId) {
        let Some(id) = self.slots.find_by_view(view) else {
            return;
        };
        if self.slots.slot(id).marked_for_destroy {
            return;
        }
        self.slots.slot_mut(id).platform_destroyed();
        self.compositor.unbind_surface(false);
        self.compositor_has_surface = false;
        self.last_bound = None;
        self.tracer.surface_unbound(&SurfaceUnboundEvent {
            frame_index: self.frame_index,
            slot: id,
            cache_back_buffer: false,
        });
        self.deliver_redraw_acks(id);
    }

    /// A Texture backend received a frame into its offscreen buffer.
    ///
    /// This is the Texture content-proof signal: the first one marks the slot
    /// settled, and each one retires a predecessor still awaiting teardown.
    /// Dropped for unknown views, marked slots, and Direct slots (whose
    /// content proof is the swap gate).
    pub fn texture_invalidated(&mut self, view: ViewId) {
        let Some(id) = self.slots.find_by_view(view) else {
            return;
        };
        {
            let slot = self.slots.slot(id);
            if slot.marked_for_destroy || !matches!(slot.kind, BackendKind::Texture) {
                return;
            }
        }
        self.settle(id);
    }

    /// The window manager needs the surface redrawn and wants `done` called
    /// once the new content has actually swapped.
    ///
    /// The ack is queued on the slot, swap-ack reporting is enabled, and the
    /// compositor is asked to draw. For a slot already marked for destroy the
    /// ack runs immediately, because no further swap will ever come; same for
    /// unknown views.
    ///
    /// # Panics
    ///
    /// Panics if the slot is neither marked nor current; the platform only
    /// issues redraw requests for the surface it is showing.
    pub fn surface_redraw_needed(&mut self, view: ViewId, done: RedrawCallback) {
        let Some(id) = self.slots.find_by_view(view) else {
            done();
            return;
        };
        if self.slots.slot(id).marked_for_destroy {
            done();
            return;
        }
        assert!(
            self.current == Some(id),
            "redraw ack requested for a non-current surface"
        );
        self.slots.slot_mut(id).redraw_callbacks.push(done);
        self.update_swap_ack_needed();
        self.compositor.request_redraw();
    }

    // -----------------------------------------------------------------------
    // Compositor feedback
    // -----------------------------------------------------------------------

    /// The compositor swapped a frame.
    ///
    /// Drives the Direct visibility gate and the cover countdown. Returns
    /// `true` while more swaps are wanted even without new content, so the
    /// compositor keeps drawing until both counters run out.
    #[must_use]
    pub fn did_swap_frame(&mut self) -> bool {
        self.swap_index = self.swap_index.saturating_add(1);
        debug_assert!(
            self.current.is_some(),
            "swap reported with no current surface"
        );
        let mut keep_swapping = false;

        if let Some(id) = self.current {
            let (kind, clear_placeholder, outcome) = {
                let slot = self.slots.slot_mut(id);
                let clear = slot.placeholder_pending;
                slot.placeholder_pending = false;
                (slot.kind, clear, slot.note_swap())
            };
            if clear_placeholder {
                self.tasks.schedule(SlotTask::ClearPlaceholder(id));
            }
            match outcome {
                SwapOutcome::Idle => {
                    // A settled Direct slot keeps retiring any predecessor
                    // that gets linked in after its gate already ran out.
                    if matches!(kind, BackendKind::Direct) {
                        self.destroy_previous(id);
                    }
                }
                SwapOutcome::Counting { .. } => keep_swapping = true,
                SwapOutcome::BecameVisible => self.settle(id),
            }
        }

        if self.swaps_until_hide_cover > 0 {
            self.swaps_until_hide_cover -= 1;
            if self.swaps_until_hide_cover == 0 {
                self.tasks.schedule(SlotTask::HideCover);
            } else {
                keep_swapping = true;
            }
        }

        #[cfg(feature = "trace-rich")]
        {
            let remaining = self.current.and_then(|id| {
                let left = self.slots.slot(id).remaining_swaps_until_visible;
                (left > 0).then_some(left)
            });
            self.tracer.swap(&crate::trace::SwapEvent {
                frame_index: self.frame_index,
                swap_index: self.swap_index,
                remaining_until_visible: remaining,
            });
        }

        keep_swapping
    }

    /// The compositor finished a buffer swap.
    ///
    /// Delivers pending redraw acks on the current slot, but only when the
    /// swapped frame matched the surface size; a stale-sized frame mid-resize
    /// does not prove the redraw happened.
    pub fn did_swap_buffers(&mut self, size_matches: bool) {
        if !size_matches {
            return;
        }
        if let Some(id) = self.current {
            self.deliver_redraw_acks(id);
        }
    }

    // -----------------------------------------------------------------------
    // Window lifecycle
    // -----------------------------------------------------------------------

    /// The surface area was attached to a window.
    ///
    /// Inserts the cover view frontmost, painted in the background color, and
    /// arms its hide countdown; the platform punches the display hole for a
    /// dedicated surface before that surface has content, and the cover hides
    /// the resulting black frames. Also nudges the compositor to start
    /// producing the swaps that run the countdown down.
    pub fn attached_to_window(&mut self) {
        if self.config.swaps_until_hide_cover > 0 {
            let cover = match self.cover_view {
                Some(cover) => cover,
                None => {
                    let cover = self.tree.create_cover_view();
                    self.cover_view = Some(cover);
                    cover
                }
            };
            self.tree.set_background(cover, Some(self.background_color));
            if !self.cover_attached {
                self.tree.insert_at_front(cover);
                self.cover_attached = true;
            }
            self.swaps_until_hide_cover = self.config.swaps_until_hide_cover;
            self.tracer.cover(&CoverEvent {
                frame_index: self.frame_index,
                visible: true,
            });
        }
        self.compositor.request_redraw();
    }

    /// The surface area was detached from its window.
    ///
    /// Takes the cover down immediately; there is nothing left to cover.
    pub fn detached_from_window(&mut self) {
        self.swaps_until_hide_cover = 0;
        if self.cover_attached {
            if let Some(cover) = self.cover_view {
                self.tree.remove(cover);
            }
            self.cover_attached = false;
            self.tracer.cover(&CoverEvent {
                frame_index: self.frame_index,
                visible: false,
            });
        }
    }

    // -----------------------------------------------------------------------
    // Deferred tasks
    // -----------------------------------------------------------------------

    /// Runs every task queued before this call. The embedder calls this once
    /// per UI animation frame.
    ///
    /// Tasks scheduled by a running task wait for the next frame, which is
    /// what the teardown pacing counts on.
    pub fn animation_frame(&mut self) {
        self.frame_index += 1;
        for task in self.tasks.take_due() {
            self.run_task(task);
        }
    }

    fn run_task(&mut self, task: SlotTask) {
        #[cfg(feature = "trace-rich")]
        {
            let step = match task {
                SlotTask::Attach(slot) => Some((slot, TaskStep::Attach)),
                SlotTask::FlushCallbacks(slot) => Some((slot, TaskStep::FlushCallbacks)),
                SlotTask::SendToBack(slot) => Some((slot, TaskStep::SendToBack)),
                SlotTask::Detach { slot, frames_left } => {
                    let step = if frames_left > 1 {
                        TaskStep::DetachWait
                    } else {
                        TaskStep::Detach
                    };
                    Some((slot, step))
                }
                SlotTask::ClearPlaceholder(slot) => Some((slot, TaskStep::ClearPlaceholder)),
                SlotTask::HideCover => None,
            };
            if let Some((slot, step)) = step {
                self.tracer.task_run(&TaskRunEvent {
                    frame_index: self.frame_index,
                    slot,
                    step,
                });
            }
        }

        match task {
            SlotTask::Attach(id) => {
                let view = match self.slots.get_mut(id) {
                    Some(slot) if !slot.marked_for_destroy => {
                        slot.attached = true;
                        slot.view
                    }
                    _ => return,
                };
                self.tree.insert_at_back(view);
            }
            SlotTask::FlushCallbacks(id) => self.flush_callbacks(id),
            SlotTask::SendToBack(id) => {
                let reorder = match self.slots.get(id) {
                    Some(slot) if slot.attached => Some(slot.view),
                    Some(_) => None,
                    None => return,
                };
                if let Some(view) = reorder {
                    self.tree.reorder_to_back(view);
                }
                self.tasks.schedule(SlotTask::Detach {
                    slot: id,
                    frames_left: self.config.detach_delay(),
                });
            }
            SlotTask::Detach { slot, frames_left } => {
                if frames_left > 1 {
                    self.tasks.schedule(SlotTask::Detach {
                        slot,
                        frames_left: frames_left - 1,
                    });
                } else {
                    self.detach_and_release(slot);
                }
            }
            SlotTask::ClearPlaceholder(id) => {
                let view = match self.slots.get(id) {
                    Some(slot) if !slot.marked_for_destroy => slot.view,
                    _ => return,
                };
                self.tree.set_background(view, None);
            }
            SlotTask::HideCover => {
                // Re-armed or already taken down while this task was queued.
                if self.swaps_until_hide_cover > 0 || !self.cover_attached {
                    return;
                }
                if let Some(cover) = self.cover_view {
                    self.tree.remove(cover);
                }
                self.cover_attached = false;
                self.tracer.cover(&CoverEvent {
                    frame_index: self.frame_index,
                    visible: false,
                });
            }
        }
    }

    /// Final teardown step: take the view out of the tree, evict a cached
    /// back buffer if one was kept, release the slot, and let a waiting
    /// successor run its callbacks.
    fn detach_and_release(&mut self, id: SlotId) {
        let (view, attached, evict, next) = match self.slots.get_mut(id) {
            Some(slot) => (
                slot.view,
                slot.attached,
                slot.cached_buffer_needs_eviction,
                slot.next_awaiting_callback.take(),
            ),
            None => return,
        };
        if attached {
            self.tree.remove(view);
        }
        self.tree.destroy_view(view);
        if evict {
            self.compositor.evict_cached_back_buffer();
        }
        let released = self.slots.free(id);
        self.tracer.slot_released(&SlotReleasedEvent {
            frame_index: self.frame_index,
            slot: id,
            kind: released.kind,
        });
        if let Some(next) = next {
            if let Some(slot) = self.slots.get_mut(next) {
                if slot.prev_awaiting_destroy == Some(id) {
                    slot.prev_awaiting_destroy = None;
                }
                self.run_callbacks(next);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Tears the host down, returning the compositor and view tree.
    ///
    /// Retires every slot, then force-runs all deferred tasks (including the
    /// ones those tasks schedule) so the teardown chains complete
    /// synchronously: every view leaves the tree, every pending callback is
    /// delivered (with `false`), and no task survives against the released
    /// compositor.
    pub fn destroy(mut self) -> (C, V) {
        let requested = self.requested.take();
        let current = self.current.take();

        if let Some(cur) = current {
            // A handoff still waiting on its settle signal finishes now; the
            // signal can never arrive once everything is retiring.
            self.destroy_previous(cur);
        }
        if let Some(req) = requested {
            self.mark_slot_for_destroy(req, false);
            self.destroy_slot(req);
        }
        if let Some(cur) = current.filter(|&cur| requested != Some(cur)) {
            self.mark_slot_for_destroy(cur, false);
            self.destroy_slot(cur);
        }

        let mut tasks_run: u32 = 0;
        loop {
            let batch = self.tasks.take_due();
            if batch.is_empty() {
                break;
            }
            for task in batch {
                tasks_run = tasks_run.saturating_add(1);
                self.run_task(task);
            }
        }
        debug_assert!(self.slots.live_count() == 0, "slot survived teardown");

        if self.cover_attached {
            if let Some(cover) = self.cover_view {
                self.tree.remove(cover);
            }
            self.cover_attached = false;
        }
        if let Some(cover) = self.cover_view.take() {
            self.tree.destroy_view(cover);
        }
        self.tracer.teardown_flush(&TeardownFlushEvent {
            frame_index: self.frame_index,
            tasks_run,
        });
        (self.compositor, self.tree)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Retires `outgoing` in favor of `incoming` and links the pair.
    fn begin_handoff(&mut self, outgoing: SlotId, incoming: SlotId) {
        // If the outgoing slot was itself still waiting on a predecessor's
        // teardown, that predecessor can go now: the settle signal it was
        // waiting for will never come from a retiring slot.
        if let Some(orphan) = self.slots.slot_mut(outgoing).prev_awaiting_destroy.take() {
            if self.slots.is_alive(orphan) {
                self.destroy_slot(orphan);
            }
        }
        self.mark_slot_for_destroy(outgoing, true);
        self.slots.slot_mut(outgoing).next_awaiting_callback = Some(incoming);
        self.slots.slot_mut(incoming).prev_awaiting_destroy = Some(outgoing);
        self.tracer.handoff_began(&HandoffBeganEvent {
            frame_index: self.frame_index,
            outgoing,
            incoming,
        });
    }

    /// Marks a slot for destroy, synthesizing the compositor unbind if the
    /// platform never reported the surface destroyed, and flushing redraw
    /// acks that can no longer be satisfied.
    fn mark_slot_for_destroy(&mut self, id: SlotId, has_next_surface: bool) {
        if let Some(cache) = self.slots.slot_mut(id).mark_for_destroy(has_next_surface) {
            self.compositor.unbind_surface(cache);
            self.compositor_has_surface = false;
            self.last_bound = None;
            self.tracer.surface_unbound(&SurfaceUnboundEvent {
                frame_index: self.frame_index,
                slot: id,
                cache_back_buffer: cache,
            });
        }
        self.deliver_redraw_acks(id);
    }

    /// Schedules the teardown of a marked slot: ready-callbacks flush first,
    /// then the kind-specific detach chain runs across animation frames.
    fn destroy_slot(&mut self, id: SlotId) {
        debug_assert!(
            self.slots.slot(id).marked_for_destroy,
            "destroying a slot that was not marked first"
        );
        self.run_callbacks(id);
        match self.slots.slot(id).kind {
            BackendKind::Direct => {
                self.tasks.schedule(SlotTask::SendToBack(id));
            }
            BackendKind::Texture => {
                self.tasks.schedule(SlotTask::Detach {
                    slot: id,
                    frames_left: 1,
                });
            }
        }
    }

    /// The slot proved it is showing content: trace the transition and retire
    /// a predecessor awaiting teardown.
    fn settle(&mut self, id: SlotId) {
        let (kind, first) = {
            let slot = self.slots.slot_mut(id);
            let first = !slot.content_proven;
            slot.content_proven = true;
            (slot.kind, first)
        };
        // Texture slots signal on every received frame; only the first one is
        // a transition worth tracing.
        if first || matches!(kind, BackendKind::Direct) {
            self.tracer.content_settled(&ContentSettledEvent {
                frame_index: self.frame_index,
                slot: id,
                kind,
            });
        }
        self.destroy_previous(id);
    }

    /// Starts the teardown of the slot `id` superseded, if it is still
    /// waiting.
    fn destroy_previous(&mut self, id: SlotId) {
        let prev = match self.slots.get_mut(id) {
            Some(slot) => slot.prev_awaiting_destroy.take(),
            None => return,
        };
        if let Some(prev) = prev {
            if self.slots.is_alive(prev) {
                self.destroy_slot(prev);
            }
        }
    }

    /// Marks the slot's callbacks as run and schedules their delivery if any
    /// are queued. Delivery happens on a later animation frame; the success
    /// value is decided then, not now.
    fn run_callbacks(&mut self, id: SlotId) {
        let slot = self.slots.slot_mut(id);
        slot.has_run_callbacks = true;
        if slot.pending_callbacks.is_empty() {
            return;
        }
        self.tasks.schedule(SlotTask::FlushCallbacks(id));
    }

    /// Delivers queued ready-callbacks. Success means the slot is still not
    /// marked for destroy at delivery time.
    fn flush_callbacks(&mut self, id: SlotId) {
        let (success, callbacks) = match self.slots.get_mut(id) {
            Some(slot) => (!slot.marked_for_destroy, slot.take_pending_callbacks()),
            None => return,
        };
        if callbacks.is_empty() {
            return;
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "callback queues are tiny; the count is diagnostic"
        )]
        self.tracer.callbacks_run(&CallbacksRunEvent {
            frame_index: self.frame_index,
            slot: id,
            count: callbacks.len() as u32,
            success,
        });
        for callback in callbacks {
            callback(success);
        }
    }

    /// Runs queued redraw acks for `id` and refreshes swap-ack reporting.
    fn deliver_redraw_acks(&mut self, id: SlotId) {
        let acks = match self.slots.get_mut(id) {
            Some(slot) => slot.take_redraw_callbacks(),
            None => return,
        };
        for ack in acks {
            ack();
        }
        self.update_swap_ack_needed();
    }

    /// Tells the compositor whether per-swap acks are needed, which is the
    /// case exactly while the current slot holds redraw callbacks.
    fn update_swap_ack_needed(&mut self) {
        let needed = self
            .current
            .and_then(|id| self.slots.get(id))
            .is_some_and(SurfaceSlot::has_redraw_callbacks);
        if needed != self.swap_ack_enabled {
            self.swap_ack_enabled = needed;
            self.compositor.set_swap_ack_needed(needed);
        }
    }
}

impl<C: CompositorBinding, V: ViewTree> core::fmt::Debug for RenderSurfaceHost<C, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RenderSurfaceHost")
            .field("requested", &self.requested)
            .field("current", &self.current)
            .field("live_slots", &self.slots.live_count())
            .field("deferred_tasks", &self.tasks.len())
            .field("compositor_has_surface", &self.compositor_has_surface)
            .field("frame_index", &self.frame_index)
            .field("swap_index", &self.swap_index)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::{Cell, RefCell};

    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum CompositorCall {
        Available,
        Bind {
            handle: Option<SurfaceHandle>,
            direct_path: bool,
            format: PixelFormat,
            width: u32,
            height: u32,
        },
        Unbind {
            cache_back_buffer: bool,
        },
        Evict,
        Redraw,
        SwapAck(bool),
        Background(Color),
    }

    #[derive(Default)]
    struct TestCompositor {
        calls: Vec<CompositorCall>,
    }

    impl CompositorBinding for TestCompositor {
        fn surface_available(&mut self) {
            self.calls.push(CompositorCall::Available);
        }

        fn bind_surface(
            &mut self,
            handle: Option<SurfaceHandle>,
            can_use_direct_path: bool,
            format: PixelFormat,
            width: u32,
            height: u32,
        ) {
            self.calls.push(CompositorCall::Bind {
                handle,
                direct_path: can_use_direct_path,
                format,
                width,
                height,
            });
        }

        fn unbind_surface(&mut self, cache_back_buffer: bool) {
            self.calls.push(CompositorCall::Unbind { cache_back_buffer });
        }

        fn evict_cached_back_buffer(&mut self) {
            self.calls.push(CompositorCall::Evict);
        }

        fn request_redraw(&mut self) {
            self.calls.push(CompositorCall::Redraw);
        }

        fn set_swap_ack_needed(&mut self, needed: bool) {
            self.calls.push(CompositorCall::SwapAck(needed));
        }

        fn background_color_changed(&mut self, color: Color) {
            self.calls.push(CompositorCall::Background(color));
        }
    }

    impl TestCompositor {
        /// Binds that carried a new platform handle.
        fn handle_binds(&self) -> usize {
            self.calls
                .iter()
                .filter(|call| matches!(call, CompositorCall::Bind { handle: Some(_), .. }))
                .count()
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum TreeOp {
        CreateBackend(ViewId, BackendKind),
        CreateCover(ViewId),
        InsertBack(ViewId),
        InsertFront(ViewId),
        Remove(ViewId),
        ReorderBack(ViewId),
        Background(ViewId, Option<Color>),
        Destroy(ViewId),
    }

    /// Recording tree double that also enforces the structural contract:
    /// views are inserted at most once, removed only while attached, and
    /// destroyed only while detached.
    #[derive(Default)]
    struct TestTree {
        ops: Vec<TreeOp>,
        /// Back-to-front order of attached views.
        z_order: Vec<ViewId>,
        next_view: u32,
    }

    impl ViewTree for TestTree {
        fn create_backend_view(&mut self, kind: BackendKind) -> ViewId {
            let view = ViewId(self.next_view);
            self.next_view += 1;
            self.ops.push(TreeOp::CreateBackend(view, kind));
            view
        }

        fn create_cover_view(&mut self) -> ViewId {
            let view = ViewId(self.next_view);
            self.next_view += 1;
            self.ops.push(TreeOp::CreateCover(view));
            view
        }

        fn insert_at_back(&mut self, view: ViewId) {
            assert!(!self.z_order.contains(&view), "inserted twice: {view:?}");
            self.z_order.insert(0, view);
            self.ops.push(TreeOp::InsertBack(view));
        }

        fn insert_at_front(&mut self, view: ViewId) {
            assert!(!self.z_order.contains(&view), "inserted twice: {view:?}");
            self.z_order.push(view);
            self.ops.push(TreeOp::InsertFront(view));
        }

        fn remove(&mut self, view: ViewId) {
            let idx = self
                .z_order
                .iter()
                .position(|&v| v == view)
                .unwrap_or_else(|| panic!("removed while detached: {view:?}"));
            self.z_order.remove(idx);
            self.ops.push(TreeOp::Remove(view));
        }

        fn reorder_to_back(&mut self, view: ViewId) {
            let idx = self
                .z_order
                .iter()
                .position(|&v| v == view)
                .unwrap_or_else(|| panic!("reordered while detached: {view:?}"));
            self.z_order.remove(idx);
            self.z_order.insert(0, view);
            self.ops.push(TreeOp::ReorderBack(view));
        }

        fn set_background(&mut self, view: ViewId, color: Option<Color>) {
            self.ops.push(TreeOp::Background(view, color));
        }

        fn destroy_view(&mut self, view: ViewId) {
            assert!(
                !self.z_order.contains(&view),
                "destroyed while attached: {view:?}"
            );
            self.ops.push(TreeOp::Destroy(view));
        }
    }

    type TestHost = RenderSurfaceHost<TestCompositor, TestTree>;

    fn host() -> TestHost {
        RenderSurfaceHost::new(
            TestCompositor::default(),
            TestTree::default(),
            HandoffConfig::DEFAULT,
        )
    }

    fn recording_callback(log: &Rc<RefCell<Vec<bool>>>) -> ReadyCallback {
        let log = Rc::clone(log);
        Box::new(move |ok| log.borrow_mut().push(ok))
    }

    fn swap(host: &mut TestHost) {
        let _ = host.did_swap_frame();
    }

    /// Requests `kind` and returns the view backing the pending slot.
    fn request(host: &mut TestHost, kind: BackendKind) -> ViewId {
        host.request_backend(kind, None);
        let id = host.requested_slot().unwrap();
        host.slots().slot(id).view()
    }

    /// Pumps the attach task, then walks the slot through create + change.
    fn go_live(host: &mut TestHost, view: ViewId, handle: u64) {
        host.animation_frame();
        host.surface_created(view);
        host.surface_changed(view, SurfaceHandle(handle), PixelFormat::Opaque, 800, 600);
    }

    /// A Direct slot that has been requested, gone live, and settled.
    fn live_direct(host: &mut TestHost, handle: u64) -> ViewId {
        let view = request(host, BackendKind::Direct);
        go_live(host, view, handle);
        swap(host);
        swap(host);
        host.animation_frame();
        view
    }

    /// A Texture slot that has been requested, gone live, and settled.
    fn live_texture(host: &mut TestHost, handle: u64) -> ViewId {
        let view = request(host, BackendKind::Texture);
        go_live(host, view, handle);
        host.texture_invalidated(view);
        host.animation_frame();
        view
    }

    #[test]
    fn first_direct_request_binds_and_reports_ready() {
        let mut host = host();
        let log = Rc::new(RefCell::new(Vec::new()));
        host.request_backend(BackendKind::Direct, Some(recording_callback(&log)));
        let view = host.current_view();
        assert_eq!(view, None, "nothing is live before the platform create");
        let id = host.requested_slot().unwrap();
        let view = host.slots().slot(id).view();

        host.animation_frame();
        assert_eq!(host.view_tree().z_order, [view]);

        host.surface_created(view);
        assert_eq!(host.current_slot(), Some(id));
        assert!(log.borrow().is_empty(), "callbacks never run inline");

        host.surface_changed(view, SurfaceHandle(7), PixelFormat::Opaque, 800, 600);
        assert!(host.has_live_surface());
        assert_eq!(
            host.compositor().calls,
            [
                CompositorCall::Available,
                CompositorCall::Bind {
                    handle: Some(SurfaceHandle(7)),
                    direct_path: true,
                    format: PixelFormat::Opaque,
                    width: 800,
                    height: 600,
                },
            ]
        );
        assert_eq!(host.slots().slot(id).remaining_swaps_until_visible(), 2);

        assert!(host.did_swap_frame(), "one swap is not enough to settle");
        assert!(!host.did_swap_frame(), "second swap settles the gate");
        assert_eq!(host.slots().slot(id).remaining_swaps_until_visible(), 0);

        host.animation_frame();
        assert_eq!(*log.borrow(), [true]);
        assert!(host.slots().slot(id).has_shown_content());
    }

    #[test]
    fn placeholder_clears_after_the_first_swap() {
        let mut host = host();
        let view = request(&mut host, BackendKind::Direct);
        assert!(
            host.view_tree()
                .ops
                .contains(&TreeOp::Background(view, Some(Color::WHITE))),
            "backdrop painted at allocation"
        );
        go_live(&mut host, view, 1);
        swap(&mut host);
        host.animation_frame();
        assert!(
            host.view_tree()
                .ops
                .contains(&TreeOp::Background(view, None)),
            "backdrop cleared one frame after the first swap"
        );
    }

    #[test]
    fn ready_callback_reports_failure_when_superseded_before_live() {
        let mut host = host();
        let log = Rc::new(RefCell::new(Vec::new()));
        host.request_backend(BackendKind::Direct, Some(recording_callback(&log)));
        let direct_view = {
            let id = host.requested_slot().unwrap();
            host.slots().slot(id).view()
        };

        // Different kind before the platform ever created the surface.
        host.request_backend(BackendKind::Texture, None);
        host.animation_frame();
        assert_eq!(*log.borrow(), [false]);

        let texture_view = host.slots().slot(host.requested_slot().unwrap()).view();
        assert_eq!(host.view_tree().z_order, [texture_view]);

        // The dead request's view never entered the tree; once its detach
        // chain drains, the view is destroyed without ever being removed.
        host.animation_frame();
        host.animation_frame();
        assert!(host.view_tree().ops.contains(&TreeOp::Destroy(direct_view)));
        assert!(
            !host.view_tree().ops.contains(&TreeOp::Remove(direct_view)),
            "a never-attached view has nothing to remove"
        );
        assert_eq!(host.slots().live_count(), 1);
    }

    #[test]
    fn same_kind_request_reuses_the_pending_slot() {
        let mut host = host();
        let log = Rc::new(RefCell::new(Vec::new()));
        host.request_backend(BackendKind::Direct, None);
        let first = host.requested_slot().unwrap();
        host.request_backend(BackendKind::Direct, Some(recording_callback(&log)));
        assert_eq!(host.requested_slot(), Some(first));
        assert_eq!(host.slots().live_count(), 1);

        let backend_creates = host
            .view_tree()
            .ops
            .iter()
            .filter(|op| matches!(op, TreeOp::CreateBackend(..)))
            .count();
        assert_eq!(backend_creates, 1);

        let view = host.slots().slot(first).view();
        go_live(&mut host, view, 3);
        host.animation_frame();
        assert_eq!(*log.borrow(), [true]);
    }

    #[test]
    fn late_callback_registration_delivers_on_a_later_frame() {
        let mut host = host();
        let view = live_direct(&mut host, 1);
        let _ = view;
        let log = Rc::new(RefCell::new(Vec::new()));
        host.request_backend(BackendKind::Direct, Some(recording_callback(&log)));
        assert!(log.borrow().is_empty());
        host.animation_frame();
        assert_eq!(*log.borrow(), [true]);
    }

    #[test]
    fn direct_handoff_to_texture_caches_and_evicts_back_buffer() {
        let mut host = host();
        let direct_view = live_direct(&mut host, 1);

        let log = Rc::new(RefCell::new(Vec::new()));
        host.request_backend(BackendKind::Texture, Some(recording_callback(&log)));
        let texture_view = host.slots().slot(host.requested_slot().unwrap()).view();
        host.animation_frame();
        // New view sits behind the old content.
        assert_eq!(host.view_tree().z_order, [texture_view, direct_view]);

        host.surface_created(texture_view);
        assert!(
            host.compositor()
                .calls
                .contains(&CompositorCall::Unbind { cache_back_buffer: true }),
            "direct surface keeps its back buffer for the transition"
        );

        host.surface_changed(texture_view, SurfaceHandle(2), PixelFormat::Opaque, 800, 600);
        assert_eq!(host.current_kind(), Some(BackendKind::Texture));

        // Old teardown starts only when the texture proves content.
        host.texture_invalidated(texture_view);

        host.animation_frame(); // reorder the old view to the back
        assert_eq!(host.view_tree().z_order, [direct_view, texture_view]);
        host.animation_frame(); // countdown
        assert!(host.view_tree().z_order.contains(&direct_view));
        host.animation_frame(); // detach
        assert_eq!(host.view_tree().z_order, [texture_view]);
        assert!(host.view_tree().ops.contains(&TreeOp::Destroy(direct_view)));
        assert!(host.compositor().calls.contains(&CompositorCall::Evict));
        assert_eq!(host.slots().live_count(), 1);

        // Callbacks arrive one frame after the teardown completes.
        assert!(log.borrow().is_empty());
        host.animation_frame();
        assert_eq!(*log.borrow(), [true]);
    }

    #[test]
    fn texture_slot_detaches_on_the_next_frame() {
        let mut host = host();
        let texture_view = live_texture(&mut host, 1);

        let direct_view = request(&mut host, BackendKind::Direct);
        host.animation_frame();
        host.surface_created(direct_view);
        assert!(
            host.compositor()
                .calls
                .contains(&CompositorCall::Unbind { cache_back_buffer: false }),
            "texture content lives in the view, nothing to cache"
        );
        host.surface_changed(direct_view, SurfaceHandle(9), PixelFormat::Opaque, 800, 600);
        swap(&mut host);
        swap(&mut host);

        host.animation_frame();
        assert_eq!(host.view_tree().z_order, [direct_view]);
        assert!(host.view_tree().ops.contains(&TreeOp::Destroy(texture_view)));
        assert!(
            !host
                .view_tree()
                .ops
                .contains(&TreeOp::ReorderBack(texture_view)),
            "texture teardown does not use the send-to-back step"
        );
        assert!(!host.compositor().calls.contains(&CompositorCall::Evict));
    }

    #[test]
    fn geometry_rebind_without_handle_change_passes_no_handle() {
        let mut host = host();
        let view = live_direct(&mut host, 5);
        assert_eq!(host.compositor().handle_binds(), 1);
        let id = host.current_slot().unwrap();
        assert_eq!(host.slots().slot(id).remaining_swaps_until_visible(), 0);

        // Same handle, same path: geometry-only rebind.
        host.surface_changed(view, SurfaceHandle(5), PixelFormat::Opaque, 1024, 768);
        assert_eq!(host.compositor().handle_binds(), 1);
        assert_eq!(
            host.compositor().calls.last(),
            Some(&CompositorCall::Bind {
                handle: None,
                direct_path: true,
                format: PixelFormat::Opaque,
                width: 1024,
                height: 768,
            })
        );

        // Resize re-arms the visibility gate of the settled slot.
        assert_eq!(host.slots().slot(id).remaining_swaps_until_visible(), 2);

        // A genuinely new handle is forwarded again.
        host.surface_changed(view, SurfaceHandle(6), PixelFormat::Opaque, 1024, 768);
        assert_eq!(host.compositor().handle_binds(), 2);
    }

    #[test]
    fn alpha_channel_disables_the_direct_path() {
        let mut host = host();
        host.set_surface_properties(SurfaceProperties {
            requires_alpha_channel: true,
            overlay_z_order: false,
        });
        let view = request(&mut host, BackendKind::Direct);
        host.animation_frame();
        host.surface_created(view);
        host.surface_changed(view, SurfaceHandle(1), PixelFormat::Translucent, 400, 300);
        assert_eq!(
            host.compositor().calls.last(),
            Some(&CompositorCall::Bind {
                handle: Some(SurfaceHandle(1)),
                direct_path: false,
                format: PixelFormat::Translucent,
                width: 400,
                height: 300,
            })
        );
    }

    #[test]
    fn property_change_reallocates_a_live_direct_backend() {
        let mut host = host();
        let old_view = live_direct(&mut host, 1);
        let old_slot = host.current_slot().unwrap();

        host.set_surface_properties(SurfaceProperties {
            requires_alpha_channel: true,
            overlay_z_order: false,
        });
        let new_slot = host.requested_slot().unwrap();
        assert_ne!(new_slot, old_slot);
        assert_eq!(host.current_slot(), Some(old_slot), "old stays until live");

        // Same properties again: no further reallocation.
        host.set_surface_properties(SurfaceProperties {
            requires_alpha_channel: true,
            overlay_z_order: false,
        });
        assert_eq!(host.requested_slot(), Some(new_slot));

        let new_view = host.slots().slot(new_slot).view();
        go_live(&mut host, new_view, 2);
        assert_eq!(host.current_slot(), Some(new_slot));
        swap(&mut host);
        swap(&mut host);
        host.animation_frame();
        host.animation_frame();
        host.animation_frame();
        assert_eq!(host.view_tree().z_order, [new_view]);
        assert!(host.view_tree().ops.contains(&TreeOp::Destroy(old_view)));
    }

    #[test]
    fn stale_platform_events_are_ignored() {
        let mut host = host();
        let view = live_direct(&mut host, 1);
        let calls_before = host.compositor().calls.len();
        let ops_before = host.view_tree().ops.len();

        let ghost = ViewId(99);
        host.surface_created(ghost);
        host.surface_changed(ghost, SurfaceHandle(8), PixelFormat::Opaque, 10, 10);
        host.surface_destroyed(ghost);
        host.texture_invalidated(ghost);
        host.texture_invalidated(view); // direct slots ignore this signal

        assert_eq!(host.compositor().calls.len(), calls_before);
        assert_eq!(host.view_tree().ops.len(), ops_before);
    }

    #[test]
    fn surface_comes_back_after_a_platform_destroy() {
        let mut host = host();
        let view = live_direct(&mut host, 1);

        host.surface_destroyed(view);
        assert!(!host.has_live_surface());
        assert_eq!(
            host.compositor().calls.last(),
            Some(&CompositorCall::Unbind { cache_back_buffer: false })
        );

        // Geometry without a live surface is a platform misorder: dropped.
        let binds = host.compositor().handle_binds();
        host.surface_changed(view, SurfaceHandle(1), PixelFormat::Opaque, 800, 600);
        assert_eq!(host.compositor().handle_binds(), binds);

        // The same slot goes live again (window shown again).
        host.surface_created(view);
        host.surface_changed(view, SurfaceHandle(1), PixelFormat::Opaque, 800, 600);
        assert!(host.has_live_surface());
        assert_eq!(
            host.compositor().handle_binds(),
            binds + 1,
            "the unbind invalidated the handle dedup state"
        );
    }

    #[test]
    fn redraw_acks_wait_for_a_size_matched_swap() {
        let mut host = host();
        let view = live_direct(&mut host, 1);
        let acked = Rc::new(Cell::new(0));
        let ack = {
            let acked = Rc::clone(&acked);
            Box::new(move || acked.set(acked.get() + 1))
        };

        host.surface_redraw_needed(view, ack);
        assert!(host.compositor().calls.contains(&CompositorCall::SwapAck(true)));
        assert_eq!(host.compositor().calls.last(), Some(&CompositorCall::Redraw));

        host.did_swap_buffers(false);
        assert_eq!(acked.get(), 0, "stale-sized swap does not prove the redraw");

        host.did_swap_buffers(true);
        assert_eq!(acked.get(), 1);
        assert_eq!(
            host.compositor().calls.last(),
            Some(&CompositorCall::SwapAck(false))
        );

        host.did_swap_buffers(true);
        assert_eq!(acked.get(), 1, "acks run once");
    }

    #[test]
    fn redraw_ack_runs_immediately_when_no_swap_can_come() {
        let mut host = host();
        let direct_view = live_direct(&mut host, 1);

        // Supersede the direct slot so it is marked for destroy.
        let texture_view = request(&mut host, BackendKind::Texture);
        host.animation_frame();
        host.surface_created(texture_view);

        let acked = Rc::new(Cell::new(0));
        let ack = {
            let acked = Rc::clone(&acked);
            Box::new(move || acked.set(acked.get() + 1))
        };
        host.surface_redraw_needed(direct_view, ack);
        assert_eq!(acked.get(), 1, "dying slots ack without waiting");

        // Unknown views too: there is nothing to wait on.
        let acked_ghost = Rc::new(Cell::new(0));
        let ack = {
            let acked = Rc::clone(&acked_ghost);
            Box::new(move || acked.set(acked.get() + 1))
        };
        host.surface_redraw_needed(ViewId(99), ack);
        assert_eq!(acked_ghost.get(), 1);
    }

    #[test]
    fn pending_redraw_acks_flush_when_the_slot_is_marked() {
        let mut host = host();
        let direct_view = live_direct(&mut host, 1);
        let acked = Rc::new(Cell::new(0));
        let ack = {
            let acked = Rc::clone(&acked);
            Box::new(move || acked.set(acked.get() + 1))
        };
        host.surface_redraw_needed(direct_view, ack);

        let texture_view = request(&mut host, BackendKind::Texture);
        host.animation_frame();
        host.surface_created(texture_view);
        assert_eq!(acked.get(), 1, "mark flushes acks that can never be swapped");
        let ack_toggles: Vec<bool> = host
            .compositor()
            .calls
            .iter()
            .filter_map(|call| match call {
                CompositorCall::SwapAck(needed) => Some(*needed),
                _ => None,
            })
            .collect();
        assert_eq!(ack_toggles, [true, false]);
    }

    #[test]
    #[should_panic(expected = "redraw ack requested for a non-current surface")]
    fn redraw_request_before_the_surface_is_live_panics() {
        let mut host = host();
        let view = request(&mut host, BackendKind::Direct);
        host.surface_redraw_needed(view, Box::new(|| {}));
    }

    #[test]
    fn cover_view_hides_after_two_swaps() {
        let mut host = host();
        host.attached_to_window();
        assert_eq!(host.compositor().calls.last(), Some(&CompositorCall::Redraw));
        let cover = match host.view_tree().ops[0] {
            TreeOp::CreateCover(view) => view,
            ref op => panic!("expected a cover creation, got {op:?}"),
        };
        assert_eq!(host.view_tree().z_order, [cover]);

        let view = request(&mut host, BackendKind::Direct);
        go_live(&mut host, view, 1);
        // Cover stays frontmost over the backend view.
        assert_eq!(host.view_tree().z_order, [view, cover]);

        assert!(host.did_swap_frame());
        assert!(!host.did_swap_frame());
        host.animation_frame();
        assert_eq!(host.view_tree().z_order, [view]);
        assert!(host.view_tree().ops.contains(&TreeOp::Remove(cover)));
    }

    #[test]
    fn window_detach_takes_the_cover_down_at_once() {
        let mut host = host();
        host.attached_to_window();
        let view = request(&mut host, BackendKind::Direct);
        go_live(&mut host, view, 1);
        swap(&mut host); // cover countdown: one swap in, still covered

        // Re-attaching while still covered re-arms without a second insert.
        host.attached_to_window();
        let cover_inserts = host
            .view_tree()
            .ops
            .iter()
            .filter(|op| matches!(op, TreeOp::InsertFront(_)))
            .count();
        assert_eq!(cover_inserts, 1);

        // Run the countdown out so a hide task is sitting in the queue.
        swap(&mut host);
        swap(&mut host);
        host.detached_from_window();
        let removed = host
            .view_tree()
            .ops
            .iter()
            .filter(|op| matches!(op, TreeOp::Remove(_)))
            .count();
        assert_eq!(removed, 1);

        // The queued hide task must not remove the cover a second time.
        host.animation_frame();
        let removed_after = host
            .view_tree()
            .ops
            .iter()
            .filter(|op| matches!(op, TreeOp::Remove(_)))
            .count();
        assert_eq!(removed_after, 1);
    }

    #[test]
    fn background_color_repaints_cover_placeholder_and_compositor() {
        let mut host = host();
        host.attached_to_window();
        let view = live_direct(&mut host, 1);

        host.set_background_color(Color::BLACK);
        assert!(
            host.view_tree()
                .ops
                .contains(&TreeOp::Background(view, Some(Color::BLACK)))
        );
        assert!(
            host.compositor()
                .calls
                .contains(&CompositorCall::Background(Color::BLACK))
        );

        // The repaint re-arms the placeholder clear.
        swap(&mut host);
        host.animation_frame();
        assert_eq!(
            host.view_tree().ops.last(),
            Some(&TreeOp::Background(view, None))
        );

        // Same color again is a no-op.
        let ops = host.view_tree().ops.len();
        host.set_background_color(Color::BLACK);
        assert_eq!(host.view_tree().ops.len(), ops);
    }

    #[test]
    fn rapid_triple_handoff_retires_the_undelivered_middle() {
        let mut host = host();
        let log_a = Rc::new(RefCell::new(Vec::new()));
        let log_b = Rc::new(RefCell::new(Vec::new()));
        let log_c = Rc::new(RefCell::new(Vec::new()));

        host.request_backend(BackendKind::Direct, Some(recording_callback(&log_a)));
        let view_a = host.slots().slot(host.requested_slot().unwrap()).view();
        go_live(&mut host, view_a, 1);
        swap(&mut host);
        swap(&mut host);
        host.animation_frame();
        assert_eq!(*log_a.borrow(), [true]);

        // B goes live but C arrives before B ever proves content.
        host.request_backend(BackendKind::Texture, Some(recording_callback(&log_b)));
        let view_b = host.slots().slot(host.requested_slot().unwrap()).view();
        host.animation_frame();
        host.surface_created(view_b);
        host.surface_changed(view_b, SurfaceHandle(2), PixelFormat::Opaque, 800, 600);

        host.request_backend(BackendKind::Direct, Some(recording_callback(&log_c)));
        let view_c = host.slots().slot(host.requested_slot().unwrap()).view();
        host.animation_frame();
        host.surface_created(view_c);
        host.surface_changed(view_c, SurfaceHandle(3), PixelFormat::Opaque, 800, 600);
        swap(&mut host);
        swap(&mut host);

        // Run everything out.
        for _ in 0..6 {
            host.animation_frame();
        }

        assert_eq!(*log_b.borrow(), [false], "b never showed content");
        assert_eq!(*log_c.borrow(), [true]);
        assert_eq!(host.slots().live_count(), 1);
        assert_eq!(host.view_tree().z_order, [view_c]);
        assert!(host.view_tree().ops.contains(&TreeOp::Destroy(view_a)));
        assert!(host.view_tree().ops.contains(&TreeOp::Destroy(view_b)));
    }

    #[test]
    fn compositor_binds_alternate_with_unbinds_across_handoffs() {
        let mut host = host();
        let _ = live_direct(&mut host, 1);
        let texture_view = request(&mut host, BackendKind::Texture);
        host.animation_frame();
        host.surface_created(texture_view);
        host.surface_changed(texture_view, SurfaceHandle(2), PixelFormat::Opaque, 800, 600);
        host.texture_invalidated(texture_view);
        for _ in 0..4 {
            host.animation_frame();
        }

        // Every handle-carrying bind is separated from the next by an unbind.
        let mut bound = false;
        for call in &host.compositor().calls {
            match call {
                CompositorCall::Bind { handle: Some(_), .. } => {
                    assert!(!bound, "two binds without an intervening unbind");
                    bound = true;
                }
                CompositorCall::Unbind { .. } => bound = false,
                _ => {}
            }
        }
        assert!(bound, "ends bound to the texture surface");
    }

    #[test]
    fn destroy_flushes_chained_teardown_and_returns_collaborators() {
        let mut host = host();
        host.attached_to_window();
        let direct_view = live_direct(&mut host, 1);

        // Mid-handoff: B is live but never settles, so A's teardown is still
        // waiting on a signal that will never come.
        let log_b = Rc::new(RefCell::new(Vec::new()));
        host.request_backend(BackendKind::Texture, Some(recording_callback(&log_b)));
        let texture_view = host.slots().slot(host.requested_slot().unwrap()).view();
        host.animation_frame();
        host.surface_created(texture_view);
        host.surface_changed(texture_view, SurfaceHandle(2), PixelFormat::Opaque, 800, 600);

        let (compositor, tree) = host.destroy();
        assert!(tree.z_order.is_empty(), "every view left the tree");
        assert!(tree.ops.contains(&TreeOp::Destroy(direct_view)));
        assert!(tree.ops.contains(&TreeOp::Destroy(texture_view)));
        assert_eq!(*log_b.borrow(), [false]);
        // The texture surface is unbound, then the direct slot's cached back
        // buffer (kept for a handoff that never finished) is evicted.
        assert!(compositor.calls.ends_with(&[
            CompositorCall::Unbind { cache_back_buffer: false },
            CompositorCall::Evict,
        ]));
    }

    #[test]
    fn physical_size_is_recorded_for_readback() {
        let mut host = host();
        assert_eq!(host.physical_size(), (0, 0));
        host.set_physical_size(1920, 1080);
        assert_eq!(host.physical_size(), (1920, 1080));
    }
}
