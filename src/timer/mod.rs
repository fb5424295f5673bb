//! Scoped timers on a hosting work loop
//!
//! The host owns a single-threaded work loop on which event sources are
//! registered and fired. `TimerWrapper` binds at most one timer source to
//! such a loop and guarantees it is cancelled, detached and released before
//! the wrapper goes away, so the callback can never run into a torn-down
//! owner.
//!
//! Lifetime contract: the work loop is borrowed for `'a` and must outlive the
//! wrapper. The owner is only held weakly; the timer never keeps it alive.

pub mod event_loop;

pub use event_loop::{EventLoop, LoopTimer};

use log::{debug, warn};
use std::rc::{Rc, Weak};
use std::time::Duration;
use thiserror::Error;

/// Callback fired on timer expiry, receiving the owner
pub type TimerAction<O> = fn(&O);

/// Rejections reported by a work loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoopError {
    #[error("event source is already attached to a work loop")]
    AlreadyAttached,
    #[error("event source is not attached to a work loop")]
    NotAttached,
    #[error("work loop is closed")]
    Closed,
    #[error("timeout is out of range")]
    DeadlineOverflow,
}

/// A timer event source created by a work loop
///
/// Dropping the source releases it.
pub trait TimerEventSource {
    /// Arm (or re-arm) the timer to fire once after `timeout`
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), LoopError>;

    /// Disarm a pending expiry; no-op when nothing is pending
    fn cancel_timeout(&mut self);

    fn is_pending(&self) -> bool;
}

/// Hosting execution context
pub trait WorkLoop {
    type Timer: TimerEventSource;

    /// Create a timer source that calls `action(owner)` on expiry
    ///
    /// Returns None when the source cannot be allocated.
    fn timer_event_source<O: 'static>(
        &self,
        owner: Weak<O>,
        action: TimerAction<O>,
    ) -> Option<Self::Timer>;

    fn add_event_source(&self, source: &Self::Timer) -> Result<(), LoopError>;

    fn remove_event_source(&self, source: &Self::Timer);
}

/// Zero or one timer source bound to a work loop
///
/// Unbound on creation. `initialize` binds (terminating any previous
/// binding first), `terminate` unbinds and may be called any number of
/// times. Dropping the wrapper terminates it.
pub struct TimerWrapper<'a, L: WorkLoop> {
    work_loop: Option<&'a L>,
    timer: Option<L::Timer>,
}

impl<'a, L: WorkLoop> TimerWrapper<'a, L> {
    pub fn new() -> Self {
        Self {
            work_loop: None,
            timer: None,
        }
    }

    /// Bind a new timer source calling `action(owner)` on expiry
    ///
    /// `None` for the work loop leaves the wrapper unbound without touching
    /// any loop. A source the loop refuses is released immediately.
    pub fn initialize<O: 'static>(
        &mut self,
        work_loop: Option<&'a L>,
        owner: &Rc<O>,
        action: TimerAction<O>,
    ) {
        if self.timer.is_some() {
            self.terminate();
        }

        let Some(work_loop) = work_loop else {
            debug!("timer: no work loop, staying unbound");
            return;
        };

        let Some(timer) = work_loop.timer_event_source(Rc::downgrade(owner), action) else {
            warn!("timer: failed to create timer event source");
            return;
        };

        if let Err(e) = work_loop.add_event_source(&timer) {
            warn!("timer: work loop rejected event source: {}", e);
            drop(timer);
            return;
        }

        debug!("timer: bound to work loop");
        self.work_loop = Some(work_loop);
        self.timer = Some(timer);
    }

    /// Cancel, detach and release the timer source
    pub fn terminate(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.cancel_timeout();
            if let Some(work_loop) = self.work_loop {
                work_loop.remove_event_source(&timer);
            }
            drop(timer);
            debug!("timer: unbound");
        }
        self.work_loop = None;
    }

    pub fn is_bound(&self) -> bool {
        self.timer.is_some()
    }

    /// Arm the bound timer
    ///
    /// Returns false when unbound or when the loop refuses the request.
    pub fn set_timeout(&mut self, timeout: Duration) -> bool {
        let Some(timer) = self.timer.as_mut() else {
            return false;
        };
        match timer.set_timeout(timeout) {
            Ok(()) => true,
            Err(e) => {
                warn!("timer: failed to arm {:?}: {}", timeout, e);
                false
            }
        }
    }

    pub fn cancel_timeout(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            timer.cancel_timeout();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.timer.as_ref().map(|t| t.is_pending()).unwrap_or(false)
    }
}

impl<'a, L: WorkLoop> Default for TimerWrapper<'a, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, L: WorkLoop> Drop for TimerWrapper<'a, L> {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Create(u32),
        Add(u32),
        Remove(u32),
        Cancel(u32),
        Release(u32),
    }

    type CallLog = Rc<RefCell<Vec<Call>>>;

    /// Work loop double recording every call made against it
    struct RecordingLoop {
        calls: CallLog,
        next_id: Cell<u32>,
        reject: Cell<bool>,
        refuse_create: Cell<bool>,
    }

    impl RecordingLoop {
        fn new(first_id: u32) -> Self {
            Self {
                calls: Rc::new(RefCell::new(Vec::new())),
                next_id: Cell::new(first_id),
                reject: Cell::new(false),
                refuse_create: Cell::new(false),
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        fn count(&self, pred: fn(&Call) -> bool) -> usize {
            self.calls.borrow().iter().filter(|c| pred(c)).count()
        }
    }

    struct RecordingTimer {
        id: u32,
        calls: CallLog,
        pending: bool,
    }

    impl TimerEventSource for RecordingTimer {
        fn set_timeout(&mut self, _timeout: Duration) -> Result<(), LoopError> {
            self.pending = true;
            Ok(())
        }

        fn cancel_timeout(&mut self) {
            self.pending = false;
            self.calls.borrow_mut().push(Call::Cancel(self.id));
        }

        fn is_pending(&self) -> bool {
            self.pending
        }
    }

    impl Drop for RecordingTimer {
        fn drop(&mut self) {
            self.calls.borrow_mut().push(Call::Release(self.id));
        }
    }

    impl WorkLoop for RecordingLoop {
        type Timer = RecordingTimer;

        fn timer_event_source<O: 'static>(
            &self,
            _owner: Weak<O>,
            _action: TimerAction<O>,
        ) -> Option<RecordingTimer> {
            if self.refuse_create.get() {
                return None;
            }
            let id = self.next_id.get();
            self.next_id.set(id + 1);
            self.calls.borrow_mut().push(Call::Create(id));
            Some(RecordingTimer {
                id,
                calls: self.calls.clone(),
                pending: false,
            })
        }

        fn add_event_source(&self, source: &RecordingTimer) -> Result<(), LoopError> {
            if self.reject.get() {
                return Err(LoopError::Closed);
            }
            self.calls.borrow_mut().push(Call::Add(source.id));
            Ok(())
        }

        fn remove_event_source(&self, source: &RecordingTimer) {
            self.calls.borrow_mut().push(Call::Remove(source.id));
        }
    }

    fn bump(counter: &Cell<u32>) {
        counter.set(counter.get() + 1);
    }

    #[test]
    fn test_bind_then_terminate_order() {
        let lp = RecordingLoop::new(1);
        let owner = Rc::new(Cell::new(0u32));
        let mut timer = TimerWrapper::new();

        timer.initialize(Some(&lp), &owner, bump);
        assert!(timer.is_bound());
        timer.terminate();
        assert!(!timer.is_bound());

        assert_eq!(
            lp.calls(),
            vec![
                Call::Create(1),
                Call::Add(1),
                Call::Cancel(1),
                Call::Remove(1),
                Call::Release(1),
            ]
        );
    }

    #[test]
    fn test_terminate_is_idempotent() {
        let lp = RecordingLoop::new(1);
        let owner = Rc::new(Cell::new(0u32));
        let mut timer = TimerWrapper::new();

        timer.initialize(Some(&lp), &owner, bump);
        timer.terminate();
        let after_once = lp.calls();
        timer.terminate();
        assert_eq!(lp.calls(), after_once);
        assert!(!timer.is_bound());
    }

    #[test]
    fn test_terminate_unbound_is_noop() {
        let mut timer: TimerWrapper<'_, RecordingLoop> = TimerWrapper::new();
        timer.terminate();
        timer.terminate();
        assert!(!timer.is_bound());
        assert!(!timer.is_pending());
    }

    #[test]
    fn test_rebind_releases_previous() {
        let a = RecordingLoop::new(1);
        let b = RecordingLoop::new(100);
        let owner = Rc::new(Cell::new(0u32));
        let mut timer = TimerWrapper::new();

        timer.initialize(Some(&a), &owner, bump);
        timer.initialize(Some(&b), &owner, bump);
        assert!(timer.is_bound());

        assert_eq!(a.count(|c| matches!(c, Call::Add(_))), 1);
        assert_eq!(a.count(|c| matches!(c, Call::Remove(_))), 1);
        assert_eq!(a.count(|c| matches!(c, Call::Release(_))), 1);
        assert_eq!(b.calls(), vec![Call::Create(100), Call::Add(100)]);

        drop(timer);
        assert_eq!(b.count(|c| matches!(c, Call::Remove(_))), 1);
        assert_eq!(b.count(|c| matches!(c, Call::Release(_))), 1);
    }

    #[test]
    fn test_no_work_loop_stays_unbound() {
        let lp = RecordingLoop::new(1);
        let owner = Rc::new(Cell::new(0u32));
        let mut timer: TimerWrapper<'_, RecordingLoop> = TimerWrapper::new();

        timer.initialize(None, &owner, bump);
        assert!(!timer.is_bound());
        assert!(!timer.set_timeout(Duration::from_millis(10)));
        drop(timer);
        assert!(lp.calls().is_empty());
    }

    #[test]
    fn test_no_work_loop_releases_previous_binding() {
        let lp = RecordingLoop::new(1);
        let owner = Rc::new(Cell::new(0u32));
        let mut timer = TimerWrapper::new();

        timer.initialize(Some(&lp), &owner, bump);
        timer.initialize(None, &owner, bump);
        assert!(!timer.is_bound());
        assert_eq!(lp.count(|c| matches!(c, Call::Release(_))), 1);
    }

    #[test]
    fn test_rejected_registration_releases_source() {
        let lp = RecordingLoop::new(1);
        lp.reject.set(true);
        let owner = Rc::new(Cell::new(0u32));
        let mut timer = TimerWrapper::new();

        timer.initialize(Some(&lp), &owner, bump);
        assert!(!timer.is_bound());
        assert_eq!(lp.calls(), vec![Call::Create(1), Call::Release(1)]);

        timer.terminate();
        assert_eq!(lp.calls().len(), 2);
    }

    #[test]
    fn test_failed_creation_stays_unbound() {
        let lp = RecordingLoop::new(1);
        lp.refuse_create.set(true);
        let owner = Rc::new(Cell::new(0u32));
        let mut timer = TimerWrapper::new();

        timer.initialize(Some(&lp), &owner, bump);
        assert!(!timer.is_bound());
        assert!(lp.calls().is_empty());
    }

    #[test]
    fn test_drop_terminates() {
        let lp = RecordingLoop::new(7);
        let owner = Rc::new(Cell::new(0u32));
        {
            let mut timer = TimerWrapper::new();
            timer.initialize(Some(&lp), &owner, bump);
            assert!(timer.set_timeout(Duration::from_millis(5)));
            assert!(timer.is_pending());
        }
        assert_eq!(
            &lp.calls()[2..],
            &[Call::Cancel(7), Call::Remove(7), Call::Release(7)]
        );
    }
}
