// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositor contract.
//!
//! The compositor is the external renderer producing the frames a backend
//! surface displays. The host owns exactly one [`CompositorBinding`] and is
//! the only code that calls into it; slots never reach the binding directly.
//! The binding's core guarantee, upheld by the host, is that at most one
//! surface is bound at any instant: [`bind_surface`] is never called twice
//! without an intervening [`unbind_surface`].
//!
//! Outbound traffic only. The compositor's inbound signals (vsync swap
//! completion, swap-buffer acks) arrive as calls on the host itself
//! ([`RenderSurfaceHost::did_swap_frame`] and
//! [`RenderSurfaceHost::did_swap_buffers`]).
//!
//! [`bind_surface`]: CompositorBinding::bind_surface
//! [`unbind_surface`]: CompositorBinding::unbind_surface
//! [`RenderSurfaceHost::did_swap_frame`]: crate::host::RenderSurfaceHost::did_swap_frame
//! [`RenderSurfaceHost::did_swap_buffers`]: crate::host::RenderSurfaceHost::did_swap_buffers

use crate::surface::{Color, PixelFormat, SurfaceHandle};

/// Outbound interface to the external compositor.
///
/// The four surface-lifecycle methods are required; the remaining methods
/// are auxiliary signals with no-op defaults, so minimal embedders and test
/// doubles only implement what they observe.
pub trait CompositorBinding {
    /// A backend surface finished platform-side creation and will be bound
    /// shortly. Always precedes the first [`bind_surface`] for that surface.
    ///
    /// [`bind_surface`]: Self::bind_surface
    fn surface_available(&mut self);

    /// Binds the current surface, or updates its geometry.
    ///
    /// `handle` is `Some` when the platform buffer changed (first bind, or
    /// the platform replaced the buffer) and `None` when only geometry or
    /// format changed for an already-bound handle; a `None` rebind must not
    /// tear down the compositor's swap chain. `can_use_direct_path` reports
    /// whether the buffer may be presented without an intermediate copy.
    fn bind_surface(
        &mut self,
        handle: Option<SurfaceHandle>,
        can_use_direct_path: bool,
        format: PixelFormat,
        width: u32,
        height: u32,
    );

    /// Unbinds the current surface.
    ///
    /// With `cache_back_buffer` the compositor should keep the final backing
    /// store alive so the outgoing content can continue to show while a
    /// successor surface starts up; the host later calls
    /// [`evict_cached_back_buffer`](Self::evict_cached_back_buffer) when the
    /// handoff completes.
    fn unbind_surface(&mut self, cache_back_buffer: bool);

    /// Drops a back buffer retained by an earlier
    /// `unbind_surface(cache_back_buffer = true)`.
    fn evict_cached_back_buffer(&mut self);

    /// Asks the compositor to produce a frame soon even if nothing is
    /// animating. Used to restart swap traffic after window attach and to
    /// satisfy redraw-and-ack requests.
    fn request_redraw(&mut self) {}

    /// Enables or disables per-swap completion acks
    /// ([`did_swap_buffers`]). The host turns acks on only while redraw
    /// callbacks are outstanding.
    ///
    /// [`did_swap_buffers`]: crate::host::RenderSurfaceHost::did_swap_buffers
    fn set_swap_ack_needed(&mut self, _needed: bool) {}

    /// The host's background color changed; the compositor may use it for
    /// letterboxing or pre-first-frame fill.
    fn background_color_changed(&mut self, _color: Color) {}
}
