//! Virtual-clock task queue: recurring tasks and cancellable one-shots

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

/// Handle to a scheduled task, used to cancel it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

struct Slot<T> {
    task: T,
    period: Option<Duration>,
}

#[derive(PartialEq, Eq)]
struct Entry {
    due: Duration,
    seq: u64,
    id: TaskId,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the heap pops the earliest (due, seq) first
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Tasks fire in `(due, scheduling order)` order. Time only moves forward,
/// through [`Timeline::pop_due`].
pub struct Timeline<T> {
    now: Duration,
    queue: BinaryHeap<Entry>,
    slots: HashMap<TaskId, Slot<T>>,
    next_id: u64,
    next_seq: u64,
}

impl<T: Clone> Timeline<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            queue: BinaryHeap::new(),
            slots: HashMap::new(),
            next_id: 0,
            next_seq: 0,
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Fire `task` once, `delay` from now
    pub fn schedule_once(&mut self, delay: Duration, task: T) -> TaskId {
        self.insert(delay, task, None)
    }

    /// Fire `task` every `period`, first after one period.
    /// A zero period is bumped to one nanosecond so time always advances.
    pub fn schedule_every(&mut self, period: Duration, task: T) -> TaskId {
        let period = period.max(Duration::from_nanos(1));
        self.insert(period, task, Some(period))
    }

    /// Returns false if the task already fired (one-shot) or was cancelled
    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.slots.remove(&id).is_some()
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Number of live tasks
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Earliest due time among live tasks
    pub fn next_deadline(&mut self) -> Option<Duration> {
        self.discard_cancelled();
        self.queue.peek().map(|entry| entry.due)
    }

    /// Pops the next task due at or before `until`, advancing the clock to
    /// its due time. Recurring tasks are re-armed one period after their
    /// due time. When nothing is due the clock moves to `until`.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TaskId, T)> {
        self.discard_cancelled();
        let due = match self.queue.peek() {
            Some(entry) if entry.due <= until => entry.due,
            _ => {
                self.now = self.now.max(until);
                return None;
            }
        };
        let entry = self.queue.pop()?;
        self.now = self.now.max(due);

        let (task, period) = {
            let slot = self.slots.get(&entry.id)?;
            (slot.task.clone(), slot.period)
        };
        match period {
            Some(period) => {
                let seq = self.bump_seq();
                self.queue.push(Entry {
                    due: entry.due.saturating_add(period),
                    seq,
                    id: entry.id,
                });
            }
            None => {
                self.slots.remove(&entry.id);
            }
        }
        Some((entry.id, task))
    }

    fn insert(&mut self, delay: Duration, task: T, period: Option<Duration>) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        let seq = self.bump_seq();
        self.slots.insert(id, Slot { task, period });
        self.queue.push(Entry {
            due: self.now.saturating_add(delay),
            seq,
            id,
        });
        id
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn discard_cancelled(&mut self) {
        while let Some(entry) = self.queue.peek() {
            if self.slots.contains_key(&entry.id) {
                break;
            }
            self.queue.pop();
        }
    }
}

impl<T: Clone> Default for Timeline<T> {
    fn default() -> Self {
        Self::new()
    }
}
