use glib::ControlFlow;
use std::time::Duration;

use super::Category;

/// Repeating tick callback. Returning `ControlFlow::Break` ends the timer.
pub type Tick = Box<dyn FnMut() -> ControlFlow>;

/// Starts and cancels repeating timers on the host event loop
pub trait TimerHost {
    type Handle;

    fn start(&self, category: Category, interval: Duration, tick: Tick) -> Self::Handle;

    /// Cancelled timers never tick again
    fn cancel(&self, handle: Self::Handle);
}

/// Timers on the default GLib main context
#[derive(Debug, Clone, Copy, Default)]
pub struct GlibTimers;

impl TimerHost for GlibTimers {
    type Handle = glib::SourceId;

    fn start(&self, category: Category, interval: Duration, mut tick: Tick) -> glib::SourceId {
        log::debug!("Starting {} timer every {:?}", category, interval);
        glib::timeout_add_local(interval, move || tick())
    }

    fn cancel(&self, handle: glib::SourceId) {
        handle.remove();
    }
}

#[cfg(test)]
pub use manual::ManualTimers;

#[cfg(test)]
mod manual {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct ManualTimer {
        id: usize,
        category: Category,
        interval: Duration,
        tick: Option<Tick>,
    }

    #[derive(Default)]
    struct State {
        next_id: usize,
        timers: Vec<ManualTimer>,
        started: Vec<Category>,
    }

    /// Timer host whose ticks only happen when a test fires them
    #[derive(Clone, Default)]
    pub struct ManualTimers {
        state: Rc<RefCell<State>>,
    }

    impl ManualTimers {
        /// Categories with a live timer, in start order
        pub fn active(&self) -> Vec<Category> {
            self.state.borrow().timers.iter().map(|t| t.category).collect()
        }

        pub fn interval_of(&self, category: Category) -> Option<Duration> {
            self.state
                .borrow()
                .timers
                .iter()
                .find(|t| t.category == category)
                .map(|t| t.interval)
        }

        /// Every start ever requested, including cancelled ones
        pub fn started(&self) -> Vec<Category> {
            self.state.borrow().started.clone()
        }

        /// Run one tick of every live timer for `category`; returns how many ran
        pub fn fire(&self, category: Category) -> usize {
            let ids: Vec<usize> = self
                .state
                .borrow()
                .timers
                .iter()
                .filter(|t| t.category == category)
                .map(|t| t.id)
                .collect();

            let mut fired = 0;
            for id in ids {
                let tick = {
                    let mut state = self.state.borrow_mut();
                    state
                        .timers
                        .iter_mut()
                        .find(|t| t.id == id)
                        .and_then(|t| t.tick.take())
                };
                let Some(mut tick) = tick else { continue };

                fired += 1;
                let flow = tick();

                let mut state = self.state.borrow_mut();
                if flow == ControlFlow::Break {
                    state.timers.retain(|t| t.id != id);
                } else if let Some(timer) = state.timers.iter_mut().find(|t| t.id == id) {
                    timer.tick = Some(tick);
                }
            }
            fired
        }

        /// Fire every live timer once, in display order
        pub fn fire_all(&self) -> usize {
            Category::ALL.into_iter().map(|c| self.fire(c)).sum()
        }
    }

    impl TimerHost for ManualTimers {
        type Handle = usize;

        fn start(&self, category: Category, interval: Duration, tick: Tick) -> usize {
            let mut state = self.state.borrow_mut();
            let id = state.next_id;
            state.next_id += 1;
            state.started.push(category);
            state.timers.push(ManualTimer {
                id,
                category,
                interval,
                tick: Some(tick),
            });
            id
        }

        fn cancel(&self, handle: usize) {
            let mut state = self.state.borrow_mut();
            let before = state.timers.len();
            state.timers.retain(|t| t.id != handle);
            assert_eq!(before, state.timers.len() + 1, "cancelled unknown timer {}", handle);
        }
    }
}
