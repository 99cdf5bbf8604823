// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface backend identification and platform-facing value types.
//!
//! [`BackendKind`] names the two ways a host can get pixels on screen.
//! [`SurfaceHandle`] is the platform's opaque buffer handle; the controller
//! forwards it to the compositor without interpreting it. [`PixelFormat`],
//! [`SurfaceProperties`], and [`Color`] carry the remaining knobs a backend
//! view is configured with.

use core::fmt;

/// The two kinds of surface backend a host can allocate.
///
/// The kind decides both how "this surface now shows content" is detected and
/// how teardown is paced (see the slot state machine in
/// [`host`](crate::host)).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BackendKind {
    /// A dedicated compositor-visible surface with asynchronous
    /// create/change/destroy lifecycle callbacks from the platform.
    ///
    /// Content readiness has no platform signal and is inferred by counting
    /// compositor swaps; detach is deferred across extra animation frames to
    /// avoid a flash while the surface is still frontmost.
    Direct,
    /// An offscreen buffer composited as an ordinary view.
    ///
    /// Availability arrives via a texture-ready callback and content
    /// readiness via any subsequent invalidate; detach needs no extra delay.
    Texture,
}

/// Opaque platform buffer handle.
///
/// Assigned by the windowing system when a backend surface becomes usable and
/// reported through geometry-change events. Core passes it to the compositor
/// untouched; equality is the only operation performed on it (to suppress
/// redundant rebinds).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SurfaceHandle(pub u64);

impl fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceHandle({:#x})", self.0)
    }
}

/// Pixel format reported with a geometry change and forwarded in the bind.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PixelFormat {
    /// Fully opaque; the compositor may skip blending beneath the surface.
    Opaque,
    /// Carries an alpha channel; content beneath the surface may show
    /// through.
    Translucent,
}

impl PixelFormat {
    /// Whether this format requires blending with content beneath it.
    #[inline]
    #[must_use]
    pub const fn is_translucent(self) -> bool {
        matches!(self, Self::Translucent)
    }
}

/// Requested configuration for a backend surface.
///
/// Part of the request comparison: asking for a backend whose kind *or*
/// properties differ from the pending request forces a slot reallocation,
/// since these knobs can only be applied when the platform surface is
/// created.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct SurfaceProperties {
    /// The surface must carry an alpha channel.
    ///
    /// An alpha-carrying [`BackendKind::Direct`] surface cannot take the
    /// compositor's direct path (see [`Self::can_use_direct_path`]).
    pub requires_alpha_channel: bool,
    /// Stack the dedicated surface above sibling surfaces (but still below
    /// the window's ordinary views).
    pub overlay_z_order: bool,
}

impl SurfaceProperties {
    /// Properties for an opaque, normally stacked surface.
    pub const DEFAULT: Self = Self {
        requires_alpha_channel: false,
        overlay_z_order: false,
    };

    /// Whether a surface with these properties may use the compositor's
    /// direct presentation path.
    ///
    /// The direct path composites the buffer without an intermediate copy,
    /// which is incompatible with alpha blending.
    #[inline]
    #[must_use]
    pub const fn can_use_direct_path(self) -> bool {
        !self.requires_alpha_channel
    }
}

/// 32-bit ARGB color.
///
/// Used for the host background, the cover view, and the placeholder a
/// [`BackendKind::Direct`] view paints until its first swap.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    /// Opaque white, the host's default background.
    pub const WHITE: Self = Self(0xFF_FF_FF_FF);
    /// Opaque black.
    pub const BLACK: Self = Self(0xFF_00_00_00);
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self(0x00_00_00_00);

    /// Builds a color from alpha, red, green, and blue components.
    #[inline]
    #[must_use]
    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// The alpha component.
    #[inline]
    #[must_use]
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color({:#010x})", self.0)
    }
}
