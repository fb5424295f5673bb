//! Stuck-modifier auto-recovery
//!
//! While the chain's stuck guards keep reporting a stuck combination, a
//! one-shot timer is armed; if it expires before an event passes again, every
//! held modifier is released in the shared `FlagStatus`. The timer is terminated when the
//! recovery is dropped, so the reset never runs after teardown.

use log::{debug, info, warn};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::config::RecoveryConfig;
use crate::modifier::FlagStatus;
use crate::timer::{TimerWrapper, WorkLoop};

pub struct StuckRecovery<'a, L: WorkLoop> {
    timer: TimerWrapper<'a, L>,
    timeout: Duration,
}

impl<'a, L: WorkLoop> StuckRecovery<'a, L> {
    /// Bind the recovery timer; stays inert without a work loop
    pub fn new(
        work_loop: Option<&'a L>,
        status: &Rc<RefCell<FlagStatus>>,
        timeout: Duration,
    ) -> Self {
        let mut timer = TimerWrapper::new();
        timer.initialize(work_loop, status, release_stuck_modifiers);
        if !timer.is_bound() {
            debug!("recovery: timer unavailable, auto-recovery disabled");
        }
        Self { timer, timeout }
    }

    /// Bind from the `[recovery]` settings; a disabled section never binds
    pub fn from_config(
        work_loop: Option<&'a L>,
        status: &Rc<RefCell<FlagStatus>>,
        config: &RecoveryConfig,
    ) -> Self {
        let work_loop = if config.enabled {
            work_loop
        } else {
            debug!("recovery: disabled by config");
            None
        };
        Self::new(work_loop, status, config.timeout())
    }

    /// Feed the stuck decision (`FilterChain::is_stuck`) for the current event
    pub fn observe(&mut self, stuck: bool) {
        if stuck {
            if !self.timer.is_pending() && self.timer.set_timeout(self.timeout) {
                debug!("recovery: stuck modifiers, reset in {:?}", self.timeout);
            }
        } else if self.timer.is_pending() {
            self.timer.cancel_timeout();
            debug!("recovery: modifiers recovered, reset cancelled");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.timer.is_bound()
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_pending()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Disable recovery and release the timer
    pub fn terminate(&mut self) {
        self.timer.terminate();
    }
}

fn release_stuck_modifiers(status: &RefCell<FlagStatus>) {
    match status.try_borrow_mut() {
        Ok(mut status) => {
            info!(
                "recovery: releasing stuck modifiers {:?}",
                status.active().mask()
            );
            status.reset();
        }
        Err(_) => warn!("recovery: flag status busy, reset skipped"),
    }
}
