//! Deadline scheduler with generation tokens
//!
//! Every timer records the session generation it was scheduled under. The
//! owner compares that token with its current generation when the timer
//! fires and drops it on mismatch, so a reset can never be overwritten by a
//! continuation from the session it replaced.

/// A scheduled task
#[derive(Debug, Clone, PartialEq)]
pub struct Timer<T> {
    /// Due time (ms)
    pub due: f64,
    /// Generation the task belongs to
    pub token: u64,
    /// Insertion order, breaks ties between equal deadlines
    seq: u64,
    pub task: T,
}

/// Timer queue ordered by deadline
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    timers: Vec<Timer<T>>,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            timers: Vec::new(),
            next_seq: 0,
        }
    }

    /// Queue `task` to fire at `due` under generation `token`
    pub fn schedule(&mut self, due: f64, token: u64, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.push(Timer {
            due,
            token,
            seq,
            task,
        });
    }

    /// Earliest deadline in the queue
    pub fn next_due(&self) -> Option<f64> {
        self.earliest().map(|i| self.timers[i].due)
    }

    /// Remove and return the earliest timer if it is due at `now`
    pub fn pop_due(&mut self, now: f64) -> Option<Timer<T>> {
        let i = self.earliest()?;
        if self.timers[i].due <= now {
            Some(self.timers.remove(i))
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    fn earliest(&self) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)))
            .map(|(i, _)| i)
    }
}
