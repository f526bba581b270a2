/// Deferred world tasks on the simulation clock.
///
/// Every delayed effect (removing a splashed bottle, halting the session
/// after the outcome fanfare) is registered here with an absolute due
/// time in simulated milliseconds. The step drains due tasks once per
/// tick; halting cancels everything still pending in one call.

use super::world::Outcome;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Task {
    RemoveProjectile(u64),
    Halt(Outcome),
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TaskId(u64);

#[derive(Clone, Debug)]
struct Scheduled {
    id: TaskId,
    due_ms: u64,
    task: Task,
}

#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    pending: Vec<Scheduled>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler::default()
    }

    pub fn schedule(&mut self, due_ms: u64, task: Task) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.pending.push(Scheduled { id, due_ms, task });
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|s| s.id != id);
        self.pending.len() != before
    }

    /// Drop every pending task. Returns how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        n
    }

    /// Remove and return the tasks due at `now_ms`, oldest deadline first
    /// (registration order breaks ties).
    pub fn take_due(&mut self, now_ms: u64) -> Vec<Task> {
        let mut due: Vec<Scheduled> = Vec::new();
        self.pending.retain(|s| {
            if s.due_ms <= now_ms {
                due.push(s.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|s| (s.due_ms, s.id.0));
        due.into_iter().map(|s| s.task).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_fire_once_in_deadline_order() {
        let mut s = Scheduler::new();
        s.schedule(300, Task::RemoveProjectile(2));
        s.schedule(100, Task::RemoveProjectile(1));
        s.schedule(300, Task::Halt(Outcome::Victory));

        assert!(s.take_due(99).is_empty());
        assert_eq!(s.take_due(100), vec![Task::RemoveProjectile(1)]);
        assert_eq!(
            s.take_due(1000),
            vec![Task::RemoveProjectile(2), Task::Halt(Outcome::Victory)],
        );
        assert!(s.is_empty());
        assert!(s.take_due(2000).is_empty());
    }

    #[test]
    fn cancel_single_and_all() {
        let mut s = Scheduler::new();
        let a = s.schedule(10, Task::RemoveProjectile(1));
        s.schedule(20, Task::RemoveProjectile(2));
        s.schedule(30, Task::Halt(Outcome::Defeat));

        assert!(s.cancel(a));
        assert!(!s.cancel(a));
        assert_eq!(s.len(), 2);

        assert_eq!(s.cancel_all(), 2);
        assert!(s.take_due(u64::MAX).is_empty());
    }
}
