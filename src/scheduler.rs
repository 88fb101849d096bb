/// Delayed actions
///
/// Runs closures once a delay has elapsed on an injectable clock. Nothing
/// runs on its own: the owner polls [`DelayExecutor::run_due`] (the audio
/// manager does so on every tick). Actions scheduled under a key can be
/// canceled by that key.
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Monotonic time source
pub trait Clock: Send + Sync {
    /// Time elapsed since an arbitrary fixed origin
    fn now(&self) -> Duration;
}

/// Wall clock backed by `Instant`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to; clones share the same time
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn advance_secs(&self, secs: f32) {
        self.advance(duration_from_secs(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

/// Convert seconds to a `Duration`; negative and NaN become zero, overflow saturates
pub fn duration_from_secs(secs: f32) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f32(secs).unwrap_or(Duration::MAX)
}

/// Identifier of a scheduled action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// Boxed action waiting for its deadline
pub type DelayedAction = Box<dyn FnOnce() + Send>;

struct ScheduledTask {
    id: TaskId,
    key: Option<String>,
    due: Duration,
    action: DelayedAction,
}

/// Keyed, cancelable delayed actions
pub struct DelayExecutor {
    clock: Arc<dyn Clock>,
    tasks: Vec<ScheduledTask>,
    next_id: u64,
}

impl DelayExecutor {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            tasks: Vec::new(),
            next_id: 0,
        }
    }

    /// Run `action` after `delay_secs`
    pub fn schedule<F>(&mut self, delay_secs: f32, action: F) -> TaskId
    where
        F: FnOnce() + Send + 'static,
    {
        self.push(delay_secs, Box::new(action), None)
    }

    /// Run `action` after `delay_secs`, cancelable by `key`; an action already
    /// scheduled under the same key is replaced
    pub fn schedule_keyed<F>(&mut self, delay_secs: f32, action: F, key: impl Into<String>) -> TaskId
    where
        F: FnOnce() + Send + 'static,
    {
        let key = key.into();
        if self.cancel(&key) {
            tracing::debug!("Replaced delayed action '{}'", key);
        }
        self.push(delay_secs, Box::new(action), Some(key))
    }

    fn push(&mut self, delay_secs: f32, action: DelayedAction, key: Option<String>) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;

        let due = self
            .clock
            .now()
            .checked_add(duration_from_secs(delay_secs))
            .unwrap_or(Duration::MAX);
        self.tasks.push(ScheduledTask {
            id,
            key,
            due,
            action,
        });
        id
    }

    /// Drop the action scheduled under `key`
    pub fn cancel(&mut self, key: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.key.as_deref() != Some(key));
        before != self.tasks.len()
    }

    /// Drop the action with `id`
    pub fn cancel_task(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        before != self.tasks.len()
    }

    pub fn is_scheduled(&self, key: &str) -> bool {
        self.tasks.iter().any(|task| task.key.as_deref() == Some(key))
    }

    pub fn is_task_scheduled(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|task| task.id == id)
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Run every action whose deadline has passed, earliest first
    pub fn run_due(&mut self) -> usize {
        let now = self.clock.now();
        let (mut due, waiting): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|task| task.due <= now);
        self.tasks = waiting;

        due.sort_by_key(|task| (task.due, task.id));
        let count = due.len();
        for task in due {
            tracing::trace!("Running delayed action {:?}", task.id);
            (task.action)();
        }
        count
    }
}

impl fmt::Debug for DelayExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelayExecutor")
            .field("pending", &self.tasks.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl Default for DelayExecutor {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn executor() -> (DelayExecutor, ManualClock) {
        let clock = ManualClock::new();
        (DelayExecutor::new(Arc::new(clock.clone())), clock)
    }

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let count = Arc::new(AtomicUsize::new(0));
        let shared = Arc::clone(&count);
        let make = move || {
            let shared = Arc::clone(&shared);
            Box::new(move || {
                shared.fetch_add(1, Ordering::SeqCst);
            }) as Box<dyn FnOnce() + Send>
        };
        (count, make)
    }

    #[test]
    fn test_action_runs_after_delay() {
        let (mut executor, clock) = executor();
        let (count, make) = counter();
        executor.schedule(1.0, make());

        clock.advance_secs(0.5);
        assert_eq!(executor.run_due(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        clock.advance_secs(0.6);
        assert_eq!(executor.run_due(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(executor.pending(), 0);
    }

    #[test]
    fn test_keyed_action_can_be_canceled() {
        let (mut executor, clock) = executor();
        let (count, make) = counter();
        executor.schedule_keyed(1.0, make(), "fanfare");
        assert!(executor.is_scheduled("fanfare"));

        assert!(executor.cancel("fanfare"));
        assert!(!executor.cancel("fanfare"));

        clock.advance_secs(2.0);
        executor.run_due();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_same_key_replaces_previous_action() {
        let (mut executor, clock) = executor();
        let (count, make) = counter();
        executor.schedule_keyed(1.0, make(), "done");
        executor.schedule_keyed(1.0, make(), "done");
        assert_eq!(executor.pending(), 1);

        clock.advance_secs(1.0);
        executor.run_due();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_by_id() {
        let (mut executor, _clock) = executor();
        let (_count, make) = counter();
        let id = executor.schedule(3.0, make());
        let other = executor.schedule(3.0, make());
        assert!(executor.is_task_scheduled(id));

        assert!(executor.cancel_task(id));
        assert!(!executor.is_task_scheduled(id));
        assert!(executor.is_task_scheduled(other));
        assert_eq!(executor.pending(), 1);
    }

    #[test]
    fn test_due_actions_run_in_deadline_order() {
        let (mut executor, clock) = executor();
        let order = Arc::new(Mutex::new(Vec::new()));
        for (delay, label) in [(0.3, "late"), (0.1, "early"), (0.2, "middle")] {
            let order = Arc::clone(&order);
            executor.schedule(delay, move || order.lock().push(label));
        }

        clock.advance_secs(1.0);
        assert_eq!(executor.run_due(), 3);
        assert_eq!(*order.lock(), vec!["early", "middle", "late"]);
    }

    #[test]
    fn test_duration_from_secs_is_total() {
        assert_eq!(duration_from_secs(-1.0), Duration::ZERO);
        assert_eq!(duration_from_secs(f32::NAN), Duration::ZERO);
        assert_eq!(duration_from_secs(f32::INFINITY), Duration::MAX);
        assert_eq!(duration_from_secs(0.5), Duration::from_millis(500));
    }
}
