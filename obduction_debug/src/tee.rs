// Copyright 2026 the Obduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sink fan-out and shared ownership.
//!
//! The host owns its sink for its whole life, which is awkward when one run
//! should feed several destinations, or when a recording must be read back
//! after the host is gone. [`TeeSink`] forwards every event to two sinks;
//! [`SharedSink`] wraps a sink in shared ownership so a clone kept outside
//! the host still reaches it.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use obduction_core::trace::{
    CallbacksRunEvent, ContentSettledEvent, CoverEvent, HandoffBeganEvent, SlotAllocatedEvent,
    SlotReleasedEvent, SurfaceBoundEvent, SurfaceLiveEvent, SurfaceUnboundEvent, SwapEvent,
    TaskRunEvent, TeardownFlushEvent, TraceSink,
};

/// Forwards every event to both inner sinks, in order.
#[derive(Debug)]
pub struct TeeSink<A: TraceSink, B: TraceSink>(pub A, pub B);

impl<A: TraceSink, B: TraceSink> TraceSink for TeeSink<A, B> {
    fn on_slot_allocated(&mut self, e: &SlotAllocatedEvent) {
        self.0.on_slot_allocated(e);
        self.1.on_slot_allocated(e);
    }

    fn on_surface_live(&mut self, e: &SurfaceLiveEvent) {
        self.0.on_surface_live(e);
        self.1.on_surface_live(e);
    }

    fn on_surface_bound(&mut self, e: &SurfaceBoundEvent) {
        self.0.on_surface_bound(e);
        self.1.on_surface_bound(e);
    }

    fn on_surface_unbound(&mut self, e: &SurfaceUnboundEvent) {
        self.0.on_surface_unbound(e);
        self.1.on_surface_unbound(e);
    }

    fn on_handoff_began(&mut self, e: &HandoffBeganEvent) {
        self.0.on_handoff_began(e);
        self.1.on_handoff_began(e);
    }

    fn on_content_settled(&mut self, e: &ContentSettledEvent) {
        self.0.on_content_settled(e);
        self.1.on_content_settled(e);
    }

    fn on_callbacks_run(&mut self, e: &CallbacksRunEvent) {
        self.0.on_callbacks_run(e);
        self.1.on_callbacks_run(e);
    }

    fn on_slot_released(&mut self, e: &SlotReleasedEvent) {
        self.0.on_slot_released(e);
        self.1.on_slot_released(e);
    }

    fn on_cover(&mut self, e: &CoverEvent) {
        self.0.on_cover(e);
        self.1.on_cover(e);
    }

    fn on_teardown_flush(&mut self, e: &TeardownFlushEvent) {
        self.0.on_teardown_flush(e);
        self.1.on_teardown_flush(e);
    }

    fn on_task_run(&mut self, e: &TaskRunEvent) {
        self.0.on_task_run(e);
        self.1.on_task_run(e);
    }

    fn on_swap(&mut self, e: &SwapEvent) {
        self.0.on_swap(e);
        self.1.on_swap(e);
    }
}

/// Shared handle to a sink. Clones dispatch to the same inner sink, so one
/// clone can go into the host while another stays behind for readback.
#[derive(Debug)]
pub struct SharedSink<S: TraceSink>(Rc<RefCell<S>>);

impl<S: TraceSink> SharedSink<S> {
    /// Wraps `sink` in shared ownership.
    #[must_use]
    pub fn new(sink: S) -> Self {
        Self(Rc::new(RefCell::new(sink)))
    }

    /// Borrows the inner sink.
    ///
    /// # Panics
    ///
    /// Panics if a clone of this handle is currently dispatching an event,
    /// which cannot happen from host-driven dispatch: the host never hands
    /// control back to the embedder while emitting.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, S> {
        self.0.borrow()
    }
}

impl<S: TraceSink> Clone for SharedSink<S> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<S: TraceSink> TraceSink for SharedSink<S> {
    fn on_slot_allocated(&mut self, e: &SlotAllocatedEvent) {
        self.0.borrow_mut().on_slot_allocated(e);
    }

    fn on_surface_live(&mut self, e: &SurfaceLiveEvent) {
        self.0.borrow_mut().on_surface_live(e);
    }

    fn on_surface_bound(&mut self, e: &SurfaceBoundEvent) {
        self.0.borrow_mut().on_surface_bound(e);
    }

    fn on_surface_unbound(&mut self, e: &SurfaceUnboundEvent) {
        self.0.borrow_mut().on_surface_unbound(e);
    }

    fn on_handoff_began(&mut self, e: &HandoffBeganEvent) {
        self.0.borrow_mut().on_handoff_began(e);
    }

    fn on_content_settled(&mut self, e: &ContentSettledEvent) {
        self.0.borrow_mut().on_content_settled(e);
    }

    fn on_callbacks_run(&mut self, e: &CallbacksRunEvent) {
        self.0.borrow_mut().on_callbacks_run(e);
    }

    fn on_slot_released(&mut self, e: &SlotReleasedEvent) {
        self.0.borrow_mut().on_slot_released(e);
    }

    fn on_cover(&mut self, e: &CoverEvent) {
        self.0.borrow_mut().on_cover(e);
    }

    fn on_teardown_flush(&mut self, e: &TeardownFlushEvent) {
        self.0.borrow_mut().on_teardown_flush(e);
    }

    fn on_task_run(&mut self, e: &TaskRunEvent) {
        self.0.borrow_mut().on_task_run(e);
    }

    fn on_swap(&mut self, e: &SwapEvent) {
        self.0.borrow_mut().on_swap(e);
    }
}

#[cfg(test)]
mod tests {
    use crate::recorder::{RecordedEvent, RecorderSink, decode};

    use super::*;

    #[derive(Debug, Default)]
    struct CoverCounter(u32);

    impl TraceSink for CoverCounter {
        fn on_cover(&mut self, _e: &CoverEvent) {
            self.0 += 1;
        }
    }

    #[test]
    fn tee_feeds_both_sinks() {
        let mut tee = TeeSink(CoverCounter::default(), CoverCounter::default());
        tee.on_cover(&CoverEvent {
            frame_index: 0,
            visible: true,
        });
        tee.on_cover(&CoverEvent {
            frame_index: 4,
            visible: false,
        });
        assert_eq!((tee.0.0, tee.1.0), (2, 2));
    }

    #[test]
    fn shared_sink_clone_reads_back_the_recording() {
        let shared = SharedSink::new(RecorderSink::new());
        let readback = shared.clone();

        // The other clone goes wherever the host wants it.
        let mut owned: Box<dyn TraceSink> = Box::new(shared);
        owned.on_teardown_flush(&TeardownFlushEvent {
            frame_index: 7,
            tasks_run: 3,
        });
        drop(owned);

        let events: Vec<_> = decode(readback.borrow().as_bytes()).collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            RecordedEvent::TeardownFlush {
                frame_index: 7,
                tasks_run: 3,
            }
        ));
    }
}
