//! Per-seed traversal state: the FIFO of pending URLs, the visited set and
//! the depth tier countdown.
//!
//! All three live behind one mutex. Taking a URL (pop, visited check and
//! insert) and completing it (push discovered links, count down the tier,
//! maybe advance) are each a single critical section, so concurrent workers
//! can never double-advance or skip a tier.
//!
//! The tier countdown starts at 1 for the seed. Every completed dispatch
//! decrements it; when it reaches zero the depth advances and the countdown is
//! reset to the number of URLs queued at that instant. Duplicates popped from
//! the queue are skipped without touching the countdown.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;
use tracing::{debug, info};

#[derive(Debug)]
struct State {
    queue: VecDeque<String>,
    visited: HashSet<String>,
    current_depth: usize,
    remaining: usize,
    in_flight: usize,
}

/// Outcome of one attempt to take work from the frontier.
#[derive(Debug, PartialEq, Eq)]
pub enum Next {
    /// A fresh URL, now marked visited
    Dispatch { url: String, depth: usize },
    /// Queue is empty but other workers may still push links
    Wait,
    /// Nothing left to do for this seed
    Done,
}

#[derive(Debug)]
pub struct Frontier {
    state: Mutex<State>,
    changed: Notify,
    recursive: bool,
    max_depth: usize,
}

impl Frontier {
    pub fn new(seed: impl Into<String>, recursive: bool, max_depth: usize) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back(seed.into());

        Self {
            state: Mutex::new(State {
                queue,
                visited: HashSet::new(),
                current_depth: 0,
                remaining: 1,
                in_flight: 0,
            }),
            changed: Notify::new(),
            recursive,
            max_depth,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // No critical section can leave the state half-updated, so a poisoned
        // lock is still usable
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn may_dispatch(&self, state: &State) -> bool {
        !self.recursive || state.current_depth < self.max_depth
    }

    /// Pop the next unvisited URL and mark it visited, in one critical section.
    pub fn try_next(&self) -> Next {
        let mut state = self.lock();

        loop {
            if !self.may_dispatch(&state) {
                return Next::Done;
            }

            let Some(url) = state.queue.pop_front() else {
                return if state.in_flight > 0 { Next::Wait } else { Next::Done };
            };

            if state.visited.contains(&url) {
                debug!("Skipping already visited {}", url);
                continue;
            }

            state.visited.insert(url.clone());
            state.in_flight += 1;
            return Next::Dispatch {
                url,
                depth: state.current_depth,
            };
        }
    }

    /// Wait for the next URL. Returns `None` once the crawl of this seed is over.
    pub async fn next(&self) -> Option<Dispatch<'_>> {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            // Register before inspecting the state so a completion between the
            // check and the await still wakes us
            notified.as_mut().enable();

            match self.try_next() {
                Next::Dispatch { url, depth } => {
                    return Some(Dispatch {
                        frontier: self,
                        url,
                        depth,
                        finished: false,
                    });
                }
                Next::Done => return None,
                Next::Wait => notified.await,
            }
        }
    }

    /// True while newly discovered links would still be enqueued.
    pub fn accepts_links(&self) -> bool {
        self.recursive && self.lock().current_depth < self.max_depth
    }

    /// Finish a dispatch: enqueue its links if the gate is open, run the tier
    /// countdown and release the in-flight slot.
    fn finish(&self, links: Vec<String>) {
        {
            let mut state = self.lock();

            if self.recursive {
                if state.current_depth < self.max_depth {
                    state.queue.extend(links);
                }

                state.remaining = state.remaining.saturating_sub(1);
                if state.remaining == 0 {
                    state.current_depth += 1;
                    state.remaining = state.queue.len();
                    info!(
                        "Advanced to depth {} with {} queued URL(s)",
                        state.current_depth, state.remaining
                    );
                }
            }

            state.in_flight = state.in_flight.saturating_sub(1);
        }

        self.changed.notify_waiters();
    }

    pub fn current_depth(&self) -> usize {
        self.lock().current_depth
    }

    pub fn remaining(&self) -> usize {
        self.lock().remaining
    }

    pub fn queued(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    pub fn visited(&self) -> Vec<String> {
        let mut visited: Vec<String> = self.lock().visited.iter().cloned().collect();
        visited.sort();
        visited
    }
}

/// A URL handed to one worker. Dropping it without calling
/// [`Dispatch::complete`] counts as a completion with no links, so a failing
/// worker never leaves its siblings waiting.
#[derive(Debug)]
pub struct Dispatch<'a> {
    frontier: &'a Frontier,
    pub url: String,
    /// Depth tier current when the URL was taken
    pub depth: usize,
    finished: bool,
}

impl Dispatch<'_> {
    pub fn complete(mut self, links: Vec<String>) {
        self.finished = true;
        self.frontier.finish(links);
    }
}

impl Drop for Dispatch<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.frontier.finish(Vec::new());
        }
    }
}
