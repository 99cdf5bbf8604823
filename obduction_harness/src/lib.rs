// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording collaborators and scripted playback for handoff exercises.
//!
//! [`RecordingCompositor`] and [`RecordingTree`] implement the host's
//! collaborator seams with a call log, a bound-surface flag, and a live
//! z-order model, so a whole handoff can run against them and be inspected
//! afterwards. [`run_script`] drives a [`RenderSurfaceHost`] through a list
//! of [`ScriptStep`]s and returns a [`HandoffReport`] grading how seamless
//! the run was.

#![no_std]

extern crate alloc;

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use obduction_core::compositor::CompositorBinding;
use obduction_core::host::RenderSurfaceHost;
use obduction_core::surface::{BackendKind, Color, PixelFormat, SurfaceHandle, SurfaceProperties};
use obduction_core::view::{ViewId, ViewTree};

// ---------------------------------------------------------------------------
// Recording compositor
// ---------------------------------------------------------------------------

/// One call a [`RecordingCompositor`] received, with its arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositorCall {
    /// `surface_available`.
    Available,
    /// `bind_surface`.
    Bind {
        /// New platform handle, or `None` for a geometry-only rebind.
        handle: Option<SurfaceHandle>,
        /// Direct presentation path enabled.
        direct_path: bool,
        /// Pixel format of the bound surface.
        format: PixelFormat,
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// `unbind_surface`.
    Unbind {
        /// Back buffer kept for the successor's startup window.
        cache_back_buffer: bool,
    },
    /// `evict_cached_back_buffer`.
    Evict,
    /// `request_redraw`.
    Redraw,
    /// `set_swap_ack_needed`, with the new value.
    SwapAck(bool),
    /// `background_color_changed`, with the new color.
    Background(Color),
}

/// Compositor double that logs every call and models the bound state.
#[derive(Debug, Default)]
pub struct RecordingCompositor {
    calls: Vec<CompositorCall>,
    bound: bool,
    cached_back_buffer: bool,
}

impl RecordingCompositor {
    /// Creates an unbound compositor with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> &[CompositorCall] {
        &self.calls
    }

    /// Whether a surface is currently bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Whether an unbind left a back buffer cached and not yet evicted.
    #[must_use]
    pub fn has_cached_back_buffer(&self) -> bool {
        self.cached_back_buffer
    }

    /// Binds that carried a new platform handle.
    #[must_use]
    pub fn handle_binds(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, CompositorCall::Bind { handle: Some(_), .. }))
            .count()
    }
}

impl CompositorBinding for RecordingCompositor {
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
        self.bound = true;
        self.calls.push(CompositorCall::Bind {
            handle,
            direct_path: can_use_direct_path,
            format,
            width,
            height,
        });
    }

    fn unbind_surface(&mut self, cache_back_buffer: bool) {
        self.bound = false;
        if cache_back_buffer {
            self.cached_back_buffer = true;
        }
        self.calls.push(CompositorCall::Unbind { cache_back_buffer });
    }

    fn evict_cached_back_buffer(&mut self) {
        self.cached_back_buffer = false;
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

// ---------------------------------------------------------------------------
// Recording view tree
// ---------------------------------------------------------------------------

/// One mutation a [`RecordingTree`] received.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeOp {
    /// `create_backend_view`, with the allocated view.
    CreateBackend(ViewId, BackendKind),
    /// `create_cover_view`, with the allocated view.
    CreateCover(ViewId),
    /// `insert_at_back`.
    InsertBack(ViewId),
    /// `insert_at_front`.
    InsertFront(ViewId),
    /// `remove`.
    Remove(ViewId),
    /// `reorder_to_back`.
    ReorderBack(ViewId),
    /// `set_background`.
    Background(ViewId, Option<Color>),
    /// `destroy_view`.
    Destroy(ViewId),
}

/// View-tree double that logs every mutation and keeps a live z-order model.
///
/// The model also enforces the structural contract the host promises its
/// toolkit: views are inserted at most once, removed or reordered only while
/// attached, and destroyed only while detached. A violated contract panics,
/// which is the point of running against this double.
#[derive(Debug, Default)]
pub struct RecordingTree {
    ops: Vec<TreeOp>,
    /// Back-to-front order of attached views.
    z_order: Vec<ViewId>,
    next_view: u32,
}

impl RecordingTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every mutation received so far, in order.
    #[must_use]
    pub fn ops(&self) -> &[TreeOp] {
        &self.ops
    }

    /// Attached views, back to front.
    #[must_use]
    pub fn z_order(&self) -> &[ViewId] {
        &self.z_order
    }

    /// Whether `view` is currently attached.
    #[must_use]
    pub fn is_attached(&self, view: ViewId) -> bool {
        self.z_order.contains(&view)
    }
}

impl ViewTree for RecordingTree {
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

// ---------------------------------------------------------------------------
// Scripted playback
// ---------------------------------------------------------------------------

/// A host wired to the recording doubles.
pub type ScriptHost = RenderSurfaceHost<RecordingCompositor, RecordingTree>;

/// One step of a playback script.
///
/// Platform events resolve their target at execution time: a create goes to
/// the requested slot (falling back to the current one for a surface
/// comeback), everything else to the current slot. That matches how the
/// platform addresses surfaces, so scripts read like event logs.
#[derive(Clone, Copy, Debug)]
pub enum ScriptStep {
    /// Request a backend of this kind, with a report-counted ready-callback.
    Request(BackendKind),
    /// The platform reports the pending surface live.
    SurfaceCreated,
    /// The platform reports geometry for the current surface.
    SurfaceChanged {
        /// Platform handle value.
        handle: u64,
        /// Pixel format.
        format: PixelFormat,
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// The platform takes the current surface away.
    SurfaceDestroyed,
    /// A Texture backend received a frame.
    TextureInvalidated,
    /// The compositor swaps a frame (with a size-matched buffer swap).
    Swap,
    /// One animation frame. Samples the bound state for the report timeline.
    Frame,
    /// The surface area is attached to a window.
    AttachWindow,
    /// The surface area is detached from its window.
    DetachWindow,
    /// Change the background color.
    SetBackground(Color),
    /// Change the surface properties.
    SetProperties(SurfaceProperties),
    /// Record a new physical size for readback.
    SetPhysicalSize {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
}

/// How seamless a scripted run was.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandoffGrade {
    /// Every frame had a bound surface and every request was honored.
    Seamless,
    /// No visible gap, but some requests were superseded before going live.
    Clean,
    /// Brief gaps, at most one unbound frame per handoff.
    Rough,
    /// The compositor sat unbound while content was expected on screen.
    Broken,
}

impl HandoffGrade {
    /// Returns a short label for report rendering.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Seamless => "seamless",
            Self::Clean => "clean",
            Self::Rough => "rough",
            Self::Broken => "broken",
        }
    }
}

/// Aggregated result of [`run_script`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandoffReport {
    /// Overall grade.
    pub grade: HandoffGrade,
    /// `Frame` steps executed.
    pub frames: u64,
    /// `Swap` steps executed.
    pub swaps: u64,
    /// Handoffs started (a surface went live while another was current).
    pub handoffs: u32,
    /// Compositor bind calls.
    pub binds: usize,
    /// Compositor unbind calls.
    pub unbinds: usize,
    /// Frames with a current slot but no bound surface.
    pub unbound_frames: u64,
    /// Ready-callbacks delivered with `true` during the run.
    pub ready_successes: usize,
    /// Ready-callbacks delivered with `false` during the run.
    pub ready_failures: usize,
    /// One char per `Frame` step: `#` bound, `.` unbound with a current
    /// slot, space before anything went live.
    pub timeline: String,
}

/// Plays `steps` against `host` and reports on the run.
///
/// Ready-callbacks registered by `Request` steps are counted when they are
/// delivered; callbacks still queued when the script ends are not part of
/// the report.
///
/// # Panics
///
/// Panics when a platform-event step has no slot to resolve against, which
/// means the script is out of order (for example a `SurfaceChanged` before
/// any surface went live).
pub fn run_script(host: &mut ScriptHost, steps: &[ScriptStep]) -> HandoffReport {
    let delivered: Rc<RefCell<Vec<bool>>> = Rc::new(RefCell::new(Vec::new()));
    let mut frames: u64 = 0;
    let mut swaps: u64 = 0;
    let mut handoffs: u32 = 0;
    let mut unbound_frames: u64 = 0;
    let mut timeline = String::new();

    for &step in steps {
        match step {
            ScriptStep::Request(kind) => {
                let log = Rc::clone(&delivered);
                host.request_backend(kind, Some(Box::new(move |ok| log.borrow_mut().push(ok))));
            }
            ScriptStep::SurfaceCreated => {
                let Some(id) = host.requested_slot().or_else(|| host.current_slot()) else {
                    panic!("SurfaceCreated without a requested backend");
                };
                let Some(slot) = host.slots().get(id) else {
                    panic!("SurfaceCreated for a released slot");
                };
                let view = slot.view();
                let marked = slot.is_marked_for_destroy();
                if !marked && host.current_slot().is_some_and(|cur| cur != id) {
                    handoffs += 1;
                }
                host.surface_created(view);
            }
            ScriptStep::SurfaceChanged {
                handle,
                format,
                width,
                height,
            } => {
                let Some(view) = host.current_view() else {
                    panic!("SurfaceChanged without a live backend");
                };
                host.surface_changed(view, SurfaceHandle(handle), format, width, height);
            }
            ScriptStep::SurfaceDestroyed => {
                let Some(view) = host.current_view() else {
                    panic!("SurfaceDestroyed without a live backend");
                };
                host.surface_destroyed(view);
            }
            ScriptStep::TextureInvalidated => {
                let Some(view) = host.current_view() else {
                    panic!("TextureInvalidated without a live backend");
                };
                host.texture_invalidated(view);
            }
            ScriptStep::Swap => {
                swaps += 1;
                let _ = host.did_swap_frame();
                host.did_swap_buffers(true);
            }
            ScriptStep::Frame => {
                host.animation_frame();
                frames += 1;
                let presenting = host.current_slot().is_some();
                let bound = host.compositor().is_bound();
                timeline.push(match (presenting, bound) {
                    (true, true) => '#',
                    (true, false) => '.',
                    (false, _) => ' ',
                });
                if presenting && !bound {
                    unbound_frames += 1;
                }
            }
            ScriptStep::AttachWindow => host.attached_to_window(),
            ScriptStep::DetachWindow => host.detached_from_window(),
            ScriptStep::SetBackground(color) => host.set_background_color(color),
            ScriptStep::SetProperties(props) => host.set_surface_properties(props),
            ScriptStep::SetPhysicalSize { width, height } => {
                host.set_physical_size(width, height);
            }
        }
    }

    let (ready_successes, ready_failures) = {
        let log = delivered.borrow();
        let ok = log.iter().filter(|&&ok| ok).count();
        (ok, log.len() - ok)
    };
    let binds = host
        .compositor()
        .calls()
        .iter()
        .filter(|call| matches!(call, CompositorCall::Bind { .. }))
        .count();
    let unbinds = host
        .compositor()
        .calls()
        .iter()
        .filter(|call| matches!(call, CompositorCall::Unbind { .. }))
        .count();

    HandoffReport {
        grade: grade_for(unbound_frames, ready_failures, handoffs),
        frames,
        swaps,
        handoffs,
        binds,
        unbinds,
        unbound_frames,
        ready_successes,
        ready_failures,
        timeline,
    }
}

fn grade_for(unbound_frames: u64, ready_failures: usize, handoffs: u32) -> HandoffGrade {
    if unbound_frames == 0 && ready_failures == 0 {
        HandoffGrade::Seamless
    } else if unbound_frames == 0 {
        HandoffGrade::Clean
    } else if unbound_frames <= u64::from(handoffs) {
        HandoffGrade::Rough
    } else {
        HandoffGrade::Broken
    }
}
