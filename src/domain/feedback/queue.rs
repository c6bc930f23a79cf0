//! Debounced trigger buffer.
//!
//! The buffer is owned by a single actor task; handles talk to it over an
//! unbounded channel, so adds and flushes are applied strictly in order and
//! a timer fire can never interleave with an add.
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `debounce` | 800ms | Quiet period after the last add before flushing |
//! | `max_flush` | 2 | Most-recent triggers delivered per flush |

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};

use super::trigger::FieldTrigger;

/// Receives each flushed batch, newest first.
pub type FlushCallback = Arc<dyn Fn(Vec<FieldTrigger>) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackQueueConfig {
    pub debounce: Duration,
    pub max_flush: usize,
}

impl Default for FeedbackQueueConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(800),
            max_flush: 2,
        }
    }
}

enum Command {
    Add(Vec<FieldTrigger>),
    Flush(oneshot::Sender<usize>),
    OnFlush(FlushCallback),
}

/// Handle to a debounce buffer. Cloning shares the same buffer.
///
/// Must be created inside a Tokio runtime. The actor stops, flushing what
/// is left, once every handle is dropped.
#[derive(Clone)]
pub struct FeedbackQueue {
    commands: mpsc::UnboundedSender<Command>,
}

impl FeedbackQueue {
    pub fn new(config: FeedbackQueueConfig) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        tokio::spawn(Actor::new(config).run(receiver));
        Self { commands }
    }

    /// Buffers triggers and restarts the debounce timer.
    ///
    /// Later triggers replace earlier ones with the same field path. An
    /// empty batch is ignored and leaves the timer alone.
    pub fn add(&self, triggers: Vec<FieldTrigger>) {
        if triggers.is_empty() {
            return;
        }
        self.send(Command::Add(triggers));
    }

    /// Flushes immediately and returns how many triggers were delivered.
    ///
    /// An empty buffer is a no-op and does not invoke the callback.
    pub async fn flush(&self) -> usize {
        let (reply, delivered) = oneshot::channel();
        self.send(Command::Flush(reply));
        delivered.await.unwrap_or(0)
    }

    /// Replaces the flush callback; only the current one sees the next flush.
    pub fn on_flush<F>(&self, callback: F)
    where
        F: Fn(Vec<FieldTrigger>) + Send + Sync + 'static,
    {
        self.send(Command::OnFlush(Arc::new(callback)));
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::warn!("Feedback queue actor has stopped; command dropped");
        }
    }
}

impl std::fmt::Debug for FeedbackQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackQueue").finish_non_exhaustive()
    }
}

struct Actor {
    config: FeedbackQueueConfig,
    buffer: Vec<FieldTrigger>,
    callback: Option<FlushCallback>,
    deadline: Option<Instant>,
}

impl Actor {
    fn new(config: FeedbackQueueConfig) -> Self {
        Self {
            config,
            buffer: Vec::new(),
            callback: None,
            deadline: None,
        }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Add(triggers)) => self.add(triggers),
                    Some(Command::Flush(reply)) => {
                        let delivered = self.flush();
                        let _ = reply.send(delivered);
                    }
                    Some(Command::OnFlush(callback)) => self.callback = Some(callback),
                    None => {
                        self.flush();
                        break;
                    }
                },
                _ = time::sleep_until(self.deadline.unwrap_or_else(Instant::now)), if self.deadline.is_some() => {
                    self.flush();
                }
            }
        }
    }

    fn add(&mut self, triggers: Vec<FieldTrigger>) {
        for trigger in triggers {
            self.buffer.retain(|t| t.field_path != trigger.field_path);
            self.buffer.push(trigger);
        }
        self.deadline = Some(Instant::now() + self.config.debounce);
    }

    fn flush(&mut self) -> usize {
        self.deadline = None;
        if self.buffer.is_empty() {
            return 0;
        }

        let mut batch = std::mem::take(&mut self.buffer);
        batch.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let dropped = batch.len().saturating_sub(self.config.max_flush);
        batch.truncate(self.config.max_flush);
        let delivered = batch.len();

        match &self.callback {
            Some(callback) => {
                tracing::info!(delivered, dropped, "Flushing field triggers");
                callback(batch);
            }
            None => tracing::debug!(delivered, "No flush callback registered; triggers discarded"),
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Chapter, Timestamp};
    use crate::domain::feedback::TriggerSource;
    use serde_json::json;
    use std::sync::Mutex;

    type Flushes = Arc<Mutex<Vec<Vec<FieldTrigger>>>>;

    fn recording_queue() -> (FeedbackQueue, Flushes) {
        let queue = FeedbackQueue::new(FeedbackQueueConfig::default());
        let flushes: Flushes = Arc::new(Mutex::new(Vec::new()));
        let sink = flushes.clone();
        queue.on_flush(move |batch| sink.lock().unwrap().push(batch));
        (queue, flushes)
    }

    fn trigger(path: &str, value: i64, millis: i64) -> FieldTrigger {
        let chapter = path.split('.').next().unwrap().parse::<Chapter>().unwrap();
        FieldTrigger::new(chapter, path, json!(value), TriggerSource::User)
            .with_timestamp(Timestamp::from_millis(millis))
    }

    async fn wait(ms: u64) {
        time::sleep(Duration::from_millis(ms)).await;
    }

    mod debounce {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn flushes_once_after_quiet_period() {
            let (queue, flushes) = recording_queue();

            queue.add(vec![trigger("budget.budgetTotaal", 1, 1)]);
            wait(799).await;
            assert!(flushes.lock().unwrap().is_empty());

            wait(10).await;
            assert_eq!(flushes.lock().unwrap().len(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn each_add_restarts_the_timer() {
            let (queue, flushes) = recording_queue();

            for i in 0..5 {
                queue.add(vec![trigger("ruimtes.rooms", i, i)]);
                wait(500).await;
            }
            assert!(flushes.lock().unwrap().is_empty());

            wait(400).await;
            assert_eq!(flushes.lock().unwrap().len(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn same_path_keeps_latest_value() {
            let (queue, flushes) = recording_queue();

            queue.add(vec![trigger("budget.budgetTotaal", 100, 1)]);
            wait(100).await;
            queue.add(vec![trigger("budget.budgetTotaal", 200, 2)]);
            wait(100).await;
            queue.add(vec![trigger("budget.budgetTotaal", 300, 3)]);
            wait(1_000).await;

            let flushes = flushes.lock().unwrap();
            assert_eq!(flushes.len(), 1);
            assert_eq!(flushes[0].len(), 1);
            assert_eq!(flushes[0][0].new_value, json!(300));
        }

        #[tokio::test(start_paused = true)]
        async fn flush_keeps_two_most_recent_newest_first() {
            let (queue, flushes) = recording_queue();

            queue.add(vec![
                trigger("basis.bouwjaar", 1, 30),
                trigger("budget.budgetTotaal", 2, 10),
                trigger("wensen.wishes", 3, 20),
            ]);
            wait(1_000).await;

            let flushes = flushes.lock().unwrap();
            let paths: Vec<_> = flushes[0].iter().map(|t| t.field_path.as_str()).collect();
            assert_eq!(paths, vec!["basis.bouwjaar", "wensen.wishes"]);
        }

        #[tokio::test(start_paused = true)]
        async fn empty_add_does_not_touch_the_timer() {
            let (queue, flushes) = recording_queue();

            queue.add(vec![trigger("budget.budgetTotaal", 1, 1)]);
            wait(500).await;
            queue.add(Vec::new());
            wait(400).await;

            assert_eq!(flushes.lock().unwrap().len(), 1);

            queue.add(Vec::new());
            wait(2_000).await;
            assert_eq!(flushes.lock().unwrap().len(), 1);
        }
    }

    mod explicit_flush {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn flush_on_empty_buffer_is_a_no_op() {
            let (queue, flushes) = recording_queue();

            assert_eq!(queue.flush().await, 0);
            assert!(flushes.lock().unwrap().is_empty());
        }

        #[tokio::test(start_paused = true)]
        async fn flush_delivers_immediately_and_cancels_timer() {
            let (queue, flushes) = recording_queue();

            queue.add(vec![trigger("budget.budgetTotaal", 1, 1)]);
            assert_eq!(queue.flush().await, 1);
            wait(2_000).await;

            assert_eq!(flushes.lock().unwrap().len(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn only_current_callback_receives_flush() {
            let queue = FeedbackQueue::new(FeedbackQueueConfig::default());
            let first: Flushes = Arc::new(Mutex::new(Vec::new()));
            let second: Flushes = Arc::new(Mutex::new(Vec::new()));
            let sink = first.clone();
            queue.on_flush(move |batch| sink.lock().unwrap().push(batch));
            let sink = second.clone();
            queue.on_flush(move |batch| sink.lock().unwrap().push(batch));

            queue.add(vec![trigger("budget.budgetTotaal", 1, 1)]);
            queue.flush().await;

            assert!(first.lock().unwrap().is_empty());
            assert_eq!(second.lock().unwrap().len(), 1);
        }
    }
}
