// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handoff timing constants.
//!
//! The protocol leans on three small frame counts that encode compositor and
//! display timing assumptions outside this crate's control. None of them has
//! a derivation; they were tuned against real devices in the system this
//! design comes from, so they live in a config struct rather than as buried
//! literals.

/// Frame-count knobs for the handoff protocol.
///
/// Passed to [`RenderSurfaceHost::new`](crate::host::RenderSurfaceHost::new).
/// [`DEFAULT`](Self::DEFAULT) carries the empirically tuned values; embedders
/// on unusual displays can widen them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandoffConfig {
    /// Compositor swaps a [`Direct`] surface must complete after a geometry
    /// change before it counts as showing real content.
    ///
    /// No platform signal exists for "this dedicated surface now displays
    /// something"; the first swap can still present stale or empty buffers.
    ///
    /// [`Direct`]: crate::surface::BackendKind::Direct
    pub swaps_until_visible: u32,
    /// Animation frames between sending an outgoing [`Direct`] view to the
    /// back of the z-order and detaching it.
    ///
    /// Detaching a dedicated surface that was frontmost one frame earlier
    /// still flickers on high-refresh displays; two frames is the smallest
    /// delay observed to be safe. Values below 1 are treated as 1.
    ///
    /// [`Direct`]: crate::surface::BackendKind::Direct
    pub detach_delay_frames: u32,
    /// Compositor swaps after window attach before the cover view is
    /// removed.
    ///
    /// Reattaching a window can flash whatever the platform last had in the
    /// backend's buffers; the cover hides that until real frames land.
    pub swaps_until_hide_cover: u32,
}

impl HandoffConfig {
    /// The tuned production values: two swaps, two frames, two swaps.
    pub const DEFAULT: Self = Self {
        swaps_until_visible: 2,
        detach_delay_frames: 2,
        swaps_until_hide_cover: 2,
    };

    /// Effective detach delay, with the floor applied.
    #[inline]
    #[must_use]
    pub(crate) const fn detach_delay(self) -> u32 {
        if self.detach_delay_frames < 1 {
            1
        } else {
            self.detach_delay_frames
        }
    }
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
