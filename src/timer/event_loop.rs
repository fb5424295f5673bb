//! In-process work loop
//!
//! Single-threaded cooperative host for timer sources. The embedding event
//! loop calls `dispatch` whenever it wakes up (for example after polling with
//! `next_deadline` as the timeout); expired timers fire in registration order.

use log::{debug, trace};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use super::{LoopError, TimerAction, TimerEventSource, WorkLoop};

/// State shared between a timer handle and the loop it is attached to
struct TimerSlot {
    id: u64,
    deadline: Cell<Option<Instant>>,
    attached: Cell<bool>,
    action: Box<dyn Fn()>,
}

/// Timer source created by `EventLoop`
pub struct LoopTimer {
    slot: Rc<TimerSlot>,
}

impl LoopTimer {
    pub fn id(&self) -> u64 {
        self.slot.id
    }

    pub fn is_attached(&self) -> bool {
        self.slot.attached.get()
    }
}

impl TimerEventSource for LoopTimer {
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), LoopError> {
        if !self.slot.attached.get() {
            return Err(LoopError::NotAttached);
        }
        let deadline = Instant::now()
            .checked_add(timeout)
            .ok_or(LoopError::DeadlineOverflow)?;
        self.slot.deadline.set(Some(deadline));
        trace!("event loop: timer {} armed for {:?}", self.slot.id, timeout);
        Ok(())
    }

    fn cancel_timeout(&mut self) {
        self.slot.deadline.set(None);
    }

    fn is_pending(&self) -> bool {
        self.slot.deadline.get().is_some()
    }
}

impl Drop for LoopTimer {
    fn drop(&mut self) {
        // Released while still registered: make sure the loop never fires it
        self.slot.attached.set(false);
        self.slot.deadline.set(None);
    }
}

/// Single-threaded work loop
pub struct EventLoop {
    sources: RefCell<Vec<Rc<TimerSlot>>>,
    next_id: Cell<u64>,
    closed: Cell<bool>,
}

impl EventLoop {
    pub fn new() -> Self {
        Self {
            sources: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            closed: Cell::new(false),
        }
    }

    /// Refuse further registrations (already attached sources stay)
    pub fn close(&self) {
        debug!("event loop: closed");
        self.closed.set(true);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Number of attached sources
    pub fn source_count(&self) -> usize {
        self.sources
            .borrow()
            .iter()
            .filter(|slot| slot.attached.get())
            .count()
    }

    /// Earliest pending deadline among attached sources
    pub fn next_deadline(&self) -> Option<Instant> {
        self.sources
            .borrow()
            .iter()
            .filter(|slot| slot.attached.get())
            .filter_map(|slot| slot.deadline.get())
            .min()
    }

    /// Fire every attached timer whose deadline is at or before `now`
    ///
    /// Returns the number of callbacks run. Callbacks may re-arm, cancel or
    /// detach timers (including ones later in this batch).
    pub fn dispatch(&self, now: Instant) -> usize {
        let expired: Vec<Rc<TimerSlot>> = {
            let mut sources = self.sources.borrow_mut();
            sources.retain(|slot| slot.attached.get());
            sources
                .iter()
                .filter(|slot| slot.deadline.get().is_some_and(|d| d <= now))
                .cloned()
                .collect()
        };

        let mut fired = 0;
        for slot in expired {
            if !slot.attached.get() {
                continue;
            }
            match slot.deadline.get() {
                Some(deadline) if deadline <= now => {}
                _ => continue,
            }
            slot.deadline.set(None);
            trace!("event loop: timer {} fired", slot.id);
            (slot.action)();
            fired += 1;
        }
        fired
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkLoop for EventLoop {
    type Timer = LoopTimer;

    fn timer_event_source<O: 'static>(
        &self,
        owner: Weak<O>,
        action: TimerAction<O>,
    ) -> Option<LoopTimer> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let callback = move || match owner.upgrade() {
            Some(owner) => action(&*owner),
            None => debug!("event loop: timer {} owner is gone", id),
        };

        Some(LoopTimer {
            slot: Rc::new(TimerSlot {
                id,
                deadline: Cell::new(None),
                attached: Cell::new(false),
                action: Box::new(callback),
            }),
        })
    }

    fn add_event_source(&self, source: &LoopTimer) -> Result<(), LoopError> {
        if self.closed.get() {
            return Err(LoopError::Closed);
        }
        if source.slot.attached.get() {
            return Err(LoopError::AlreadyAttached);
        }
        source.slot.attached.set(true);
        let mut sources = self.sources.borrow_mut();
        // Drop slots of sources released without being removed
        sources.retain(|slot| slot.attached.get());
        sources.push(source.slot.clone());
        debug!("event loop: attached timer {}", source.slot.id);
        Ok(())
    }

    fn remove_event_source(&self, source: &LoopTimer) {
        source.slot.attached.set(false);
        source.slot.deadline.set(None);
        self.sources
            .borrow_mut()
            .retain(|slot| !Rc::ptr_eq(slot, &source.slot));
        debug!("event loop: detached timer {}", source.slot.id);
    }
}
