// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted backend handoff that exercises the tracing pipeline.
//!
//! Drives a Direct → Texture → Direct handoff sequence against the recording
//! collaborators, pretty-printing every trace event to stdout while also
//! recording it, then prints the harness seamlessness report and exports a
//! Chrome trace JSON file.

use std::fs::File;
use std::io::BufWriter;

use obduction_core::config::HandoffConfig;
use obduction_core::host::RenderSurfaceHost;
use obduction_core::surface::{BackendKind, PixelFormat};

use obduction_debug::pretty::PrettyPrintSink;
use obduction_debug::recorder::RecorderSink;
use obduction_debug::tee::{SharedSink, TeeSink};

use obduction_harness::{RecordingCompositor, RecordingTree, ScriptStep, run_script};

/// Microseconds per animation frame on the exported timeline (≈60 Hz).
const FRAME_INTERVAL_US: u64 = 16_667;

const fn changed(handle: u64) -> ScriptStep {
    ScriptStep::SurfaceChanged {
        handle,
        format: PixelFormat::Opaque,
        width: 1280,
        height: 720,
    }
}

fn main() {
    // -- sinks -------------------------------------------------------------
    let recorder = SharedSink::new(RecorderSink::new());
    let mut host = RenderSurfaceHost::new(
        RecordingCompositor::new(),
        RecordingTree::new(),
        HandoffConfig::DEFAULT,
    );
    host.set_trace_sink(Box::new(TeeSink(
        PrettyPrintSink::new(Box::new(std::io::stdout())),
        recorder.clone(),
    )));

    // -- scripted handoffs -------------------------------------------------
    let script = [
        // Window attach puts the cover up; the first Direct backend comes
        // live underneath it.
        ScriptStep::AttachWindow,
        ScriptStep::Request(BackendKind::Direct),
        ScriptStep::Frame,
        ScriptStep::SurfaceCreated,
        changed(1),
        ScriptStep::Swap,
        ScriptStep::Swap,
        ScriptStep::Frame,
        // Hand off to an offscreen Texture backend.
        ScriptStep::Request(BackendKind::Texture),
        ScriptStep::Frame,
        ScriptStep::SurfaceCreated,
        changed(2),
        ScriptStep::TextureInvalidated,
        ScriptStep::Frame,
        ScriptStep::Frame,
        ScriptStep::Frame,
        ScriptStep::Frame,
        // And back to a dedicated surface.
        ScriptStep::Request(BackendKind::Direct),
        ScriptStep::Frame,
        ScriptStep::SurfaceCreated,
        changed(3),
        ScriptStep::Swap,
        ScriptStep::Swap,
        ScriptStep::Frame,
        ScriptStep::Frame,
        ScriptStep::Frame,
    ];
    let report = run_script(&mut host, &script);

    println!();
    println!(
        "handoffs={} binds={} unbinds={} gap_frames={} ready={}+{} grade={}",
        report.handoffs,
        report.binds,
        report.unbinds,
        report.unbound_frames,
        report.ready_successes,
        report.ready_failures,
        report.grade.as_str(),
    );
    println!("timeline: [{}]", report.timeline);

    // Teardown emits the final flush events into the recording too.
    let _ = host.destroy();

    // -- export Chrome trace -----------------------------------------------
    let path = "handoff_trace.json";
    let file = File::create(path).expect("failed to create handoff_trace.json");
    let mut writer = BufWriter::new(file);
    obduction_debug::chrome::export(recorder.borrow().as_bytes(), FRAME_INTERVAL_US, &mut writer)
        .expect("failed to write Chrome trace");
    println!("Wrote {path}");
}
