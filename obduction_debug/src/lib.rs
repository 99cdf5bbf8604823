// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for obduction
//! diagnostics.
//!
//! This crate provides [`TraceSink`](obduction_core::trace::TraceSink)
//! implementations for development and post-mortem analysis of surface
//! handoffs:
//!
//! - [`pretty::PrettyPrintSink`] — human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`] — compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`] — writes Chrome Trace Event Format JSON from
//!   recorded bytes, with one track per surface slot.
//! - [`tee::TeeSink`] and [`tee::SharedSink`] — plumbing for feeding one
//!   host-owned sink slot from several destinations.

pub mod chrome;
pub mod pretty;
pub mod recorder;
pub mod tee;
