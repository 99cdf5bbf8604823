// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Seamless rendering-surface handoff between compositor backends.
//!
//! `obduction_core` keeps a compositor bound to exactly one platform surface
//! while the embedder switches between backend kinds (a dedicated surface or
//! an offscreen texture view), without ever showing a gap, a black flash, or
//! stale content during the switch. It is `no_std` compatible (with `alloc`)
//! and talks to the platform exclusively through two embedder-implemented
//! traits, so the whole protocol runs unmodified under test doubles.
//!
//! # Architecture
//!
//! The crate is organized around a host that turns platform surface events
//! and embedder requests into compositor bindings and deferred view-tree
//! mutations:
//!
//! ```text
//!   Embedder                       Platform adapter
//!       │ request_backend()            │ surface created/changed/destroyed
//!       ▼                              ▼
//!   RenderSurfaceHost ◄── did_swap_frame() ─── compositor vsync
//!       │         │
//!       │         └──► SlotArena (requested / current / retiring)
//!       │                   │
//!       │ bind / unbind     │ TaskTracker (attach, send-to-back,
//!       ▼        / evict    ▼             detach, callback flush)
//!   CompositorBinding   ViewTree
//! ```
//!
//! **[`host`]** — [`RenderSurfaceHost`](host::RenderSurfaceHost), the handoff
//! state machine. Owns the collaborators, enforces the single-binding
//! invariant, and paces teardown across animation frames.
//!
//! **[`slot`]** — Surface slots (one per allocated backend) in a
//! generational-handle arena, including the swap-count visibility gate and
//! the ready-callback queue.
//!
//! **[`surface`]** — Backend kinds, surface handles, pixel formats, surface
//! properties, and colors shared across the protocol.
//!
//! **[`compositor`]** — The [`CompositorBinding`](compositor::CompositorBinding)
//! trait the embedder implements to connect a real compositor.
//!
//! **[`view`]** — The [`ViewTree`](view::ViewTree) trait for z-ordered
//! toolkit view manipulation.
//!
//! **[`tasks`]** — Next-animation-frame task queue with the
//! post-to-next-batch semantics the teardown pacing relies on.
//!
//! **[`config`]** — Tunable swap and frame counts for the handoff protocol.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! handoff instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Reserved for `std` support in dependent
//!   tooling; the core itself stays `no_std`.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one
//!   branch per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-task and
//!   per-swap events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod compositor;
pub mod config;
pub mod host;
pub mod slot;
pub mod surface;
pub mod tasks;
pub mod trace;
pub mod view;
