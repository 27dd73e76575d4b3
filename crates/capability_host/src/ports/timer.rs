//! One-shot timer port used by the notification scheduler.

use std::{cell::RefCell, rc::Rc};

/// Host service for one-shot deferred callbacks.
pub trait TimerHost {
    /// Arms a one-shot timer that runs `callback` after `delay_ms`.
    fn set_timeout(&self, delay_ms: u64, callback: Box<dyn FnOnce()>);
}

struct ArmedTimer {
    delay_ms: u64,
    callback: Box<dyn FnOnce()>,
}

#[derive(Clone, Default)]
/// Timer host that queues armed timers for manual firing in tests.
pub struct ManualTimerHost {
    queue: Rc<RefCell<Vec<ArmedTimer>>>,
}

impl ManualTimerHost {
    /// Returns the number of timers currently armed.
    pub fn armed(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Returns the requested delays of the armed timers, in arming order.
    pub fn armed_delays(&self) -> Vec<u64> {
        self.queue.borrow().iter().map(|t| t.delay_ms).collect()
    }

    /// Fires the oldest armed timer; returns `false` when none is armed.
    pub fn fire_next(&self) -> bool {
        let timer = {
            let mut queue = self.queue.borrow_mut();
            if queue.is_empty() {
                return false;
            }
            queue.remove(0)
        };
        (timer.callback)();
        true
    }

    /// Fires every currently-armed timer in arming order.
    pub fn fire_all(&self) {
        while self.fire_next() {}
    }
}

impl TimerHost for ManualTimerHost {
    fn set_timeout(&self, delay_ms: u64, callback: Box<dyn FnOnce()>) {
        self.queue.borrow_mut().push(ArmedTimer { delay_ms, callback });
    }
}
