// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! View-tree contract for toolkit integrations.
//!
//! The handoff protocol manipulates a small stack of platform views: one per
//! allocated backend, plus an optional cover view during window attach. All
//! of that manipulation goes through [`ViewTree`], the only toolkit-coupled
//! seam in the crate. An embedder implements it over whatever its UI toolkit
//! offers (a `ViewGroup`, a DOM container, a test double) and hands views
//! back to the host as opaque [`ViewId`]s.
//!
//! The host never calls [`ViewTree`] synchronously from inside a platform
//! callback; structural mutations are deferred to the next animation frame
//! via the host's task queue, so implementations may assume they are called
//! outside any in-progress layout or draw pass.

use core::fmt;

use crate::surface::{BackendKind, Color};

/// Identifies a view allocated by a [`ViewTree`] implementation.
///
/// Assigned by the adapter; core passes IDs back without interpreting the
/// value. Platform events are reported against the `ViewId` they arrived on,
/// which is how the host finds the owning slot.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ViewId(pub u32);

impl fmt::Debug for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewId({})", self.0)
    }
}

/// Adapter from handoff-protocol view operations to a concrete UI toolkit.
///
/// Implementations own the concrete view objects and are responsible for
/// routing their platform callbacks back into the host (tagged with the
/// [`ViewId`] they concern). The host guarantees:
///
/// - every created view is inserted at most once, and removed before
///   [`destroy_view`](Self::destroy_view);
/// - structural calls (`insert_*`, `remove`, `reorder_to_back`) happen only
///   from the animation-frame pump or a forced teardown flush, never from
///   inside a platform callback.
pub trait ViewTree {
    /// Creates (but does not attach) a backend view of the given kind.
    ///
    /// For [`BackendKind::Direct`] this is the dedicated-surface view; for
    /// [`BackendKind::Texture`] the offscreen-buffer view. The adapter should
    /// begin delivering that view's platform events once it is attached.
    fn create_backend_view(&mut self, kind: BackendKind) -> ViewId;

    /// Creates (but does not attach) an opaque cover view.
    fn create_cover_view(&mut self) -> ViewId;

    /// Attaches `view` as the lowest-z-order child, behind every sibling.
    fn insert_at_back(&mut self, view: ViewId);

    /// Attaches `view` as the highest-z-order child, in front of every
    /// sibling.
    fn insert_at_front(&mut self, view: ViewId);

    /// Detaches `view` from the tree.
    fn remove(&mut self, view: ViewId);

    /// Moves an already-attached `view` to the lowest z-order without
    /// detaching it.
    fn reorder_to_back(&mut self, view: ViewId);

    /// Paints (`Some`) or clears (`None`) a solid background on `view`.
    fn set_background(&mut self, view: ViewId, color: Option<Color>);

    /// Releases a detached view's resources. The host stops referring to
    /// `view` after this call.
    fn destroy_view(&mut self, view: ViewId);
}
