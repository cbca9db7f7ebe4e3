//! # Task Management System
//!
//! This module provides a small worker pool for running CPU heavy work off
//! the main thread.
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: Central coordinator for task distribution and worker management
//! - `Task`: A unit of work that can be executed asynchronously
//! - `TaskChannel`: Communication channel between the main thread and one worker
//!
//! Each worker owns a task receiver and a result sender built on
//! `std::sync::mpsc`. The manager hands tasks out round-robin and never gives
//! a worker more than [`MAX_TASKS_IN_FLIGHT`] at once; the rest wait in a
//! queue on the main thread where they can still be cancelled.
//!
//! With zero workers every task runs inline inside `publish_task`.
//!
//! ## Task Lifecycle
//! 1. Tasks are created and published via `TaskManager::publish_task()`
//! 2. The manager sends them to a free worker, or queues them
//! 3. Workers process tasks and send back their output
//! 4. `TaskManager::process_queued_tasks()` tops up idle workers
//! 5. `TaskManager::drain_completed()` returns finished outputs on the main thread
//!
//! ## Shutdown
//!
//! Dropping the manager closes every task channel. Workers exit once their
//! current task finishes; nobody joins them, so a slow task never blocks exit.
//!
//! ## Example Usage
//! ```ignore
//! let mut task_manager = TaskManager::new(4);
//!
//! task_manager.publish_task(Box::new(MyTask::new(...)));
//!
//! // In the game loop:
//! task_manager.process_queued_tasks();
//! for output in task_manager.drain_completed() {
//!     // apply output
//! }
//! ```

pub mod task;

use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};
use task::Task;

/// A communication channel between the main thread and a worker thread.
///
/// # Fields
/// - `task_sender`: Sends tasks from main thread to worker
/// - `result_receiver`: Receives task output from worker
/// - `num_tasks_in_flight`: Tracks number of tasks currently being processed
/// - `_worker`: Handle to the worker thread; dropping it detaches the thread
#[derive(Debug)]
pub struct TaskChannel<T: Task> {
    task_sender: Sender<Box<T>>,
    result_receiver: Receiver<T::Output>,
    num_tasks_in_flight: usize,
    _worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// # Fields
/// - `channels`: Set of live worker channels
/// - `queued_tasks`: Tasks waiting for an available worker
/// - `current_channel`: Index for round-robin scheduling
/// - `completed_inline`: Outputs of tasks run without workers
pub struct TaskManager<T: Task> {
    channels: Vec<TaskChannel<T>>,
    queued_tasks: VecDeque<Box<T>>,
    current_channel: usize,
    completed_inline: Vec<T::Output>,
}

/// Maximum number of tasks that can be in flight per worker channel.
///
/// Tasks beyond this stay in the main-thread queue, where
/// [`TaskManager::retain_queued`] can still drop them.
pub const MAX_TASKS_IN_FLIGHT: usize = 2;

impl<T: Task> TaskManager<T> {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// A worker that fails to spawn is logged and skipped. If none spawn the
    /// manager runs tasks inline.
    pub fn new(num_workers: usize) -> Self {
        let mut channels = Vec::with_capacity(num_workers);

        info!(
            "Starting {num_workers} task workers (available parallelism: {:?})",
            thread::available_parallelism()
        );

        for index in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<T>>();
            let (result_tx, result_rx) = channel::<T::Output>();

            let task_closure = move || {
                while let Ok(task) = task_rx.recv() {
                    if result_tx.send(task.process()).is_err() {
                        break;
                    }
                }
            };

            let worker = match thread::Builder::new()
                .name(format!("task-worker-{index}"))
                .spawn(task_closure)
            {
                Ok(worker) => worker,
                Err(e) => {
                    warn!("Failed to spawn task worker {index}: {e}");
                    continue;
                }
            };

            channels.push(TaskChannel {
                task_sender: task_tx,
                result_receiver: result_rx,
                num_tasks_in_flight: 0,
                _worker: worker,
            });
        }

        TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
            completed_inline: Vec::new(),
        }
    }

    /// Number of worker threads still connected.
    pub fn worker_count(&self) -> usize {
        self.channels.len()
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// Returns the task back if the worker has hung up.
    fn try_send_task(&mut self, task: Box<T>, channel_idx: usize) -> Result<(), Box<T>> {
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(task) => Err(task.0),
        }
    }

    /// Finds an available worker channel, round-robin from the last one used.
    fn find_available_channel(&self) -> Option<usize> {
        let len = self.channels.len();
        (0..len)
            .map(|offset| (self.current_channel + offset) % len)
            .find(|&idx| self.channels[idx].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT)
    }

    /// Publishes a new task for execution.
    ///
    /// Returns `true` if the task started immediately (on a worker or inline)
    /// and `false` if it was queued because all workers are busy.
    pub fn publish_task(&mut self, task: Box<T>) -> bool {
        if self.channels.is_empty() {
            self.completed_inline.push(task.process());
            return true;
        }

        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
                    self.drop_channel(channel_idx);
                    self.publish_task(task)
                }
            },
            None => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Moves queued tasks onto workers that have room, oldest first.
    pub fn process_queued_tasks(&mut self) {
        while !self.queued_tasks.is_empty() {
            if self.channels.is_empty() {
                while let Some(task) = self.queued_tasks.pop_front() {
                    self.completed_inline.push(task.process());
                }
                return;
            }

            let Some(channel_idx) = self.find_available_channel() else {
                return;
            };
            let Some(task) = self.queued_tasks.pop_front() else {
                return;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(_) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => {
                    self.queued_tasks.push_front(task);
                    self.drop_channel(channel_idx);
                }
            }
        }
    }

    /// Drops queued tasks for which `keep` returns false. Tasks already sent
    /// to a worker are unaffected.
    pub fn retain_queued(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.queued_tasks.retain(|task| keep(task));
    }

    pub fn queued_count(&self) -> usize {
        self.queued_tasks.len()
    }

    pub fn in_flight_count(&self) -> usize {
        self.channels
            .iter()
            .map(|channel| channel.num_tasks_in_flight)
            .sum()
    }

    /// Collects the output of every finished task.
    pub fn drain_completed(&mut self) -> Vec<T::Output> {
        let mut completed = std::mem::take(&mut self.completed_inline);
        let mut disconnected = Vec::new();

        for (idx, channel) in self.channels.iter_mut().enumerate() {
            loop {
                match channel.result_receiver.try_recv() {
                    Ok(output) => {
                        channel.num_tasks_in_flight -= 1;
                        completed.push(output);
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        disconnected.push(idx);
                        break;
                    }
                }
            }
        }

        for idx in disconnected.into_iter().rev() {
            self.drop_channel(idx);
        }

        completed
    }

    /// Forgets a worker whose thread has exited.
    fn drop_channel(&mut self, idx: usize) {
        let channel = self.channels.remove(idx);
        warn!(
            "Task worker exited with {} task(s) in flight",
            channel.num_tasks_in_flight
        );
        if self.channels.is_empty() {
            self.current_channel = 0;
        } else {
            self.current_channel %= self.channels.len();
        }
    }
}

impl<T: Task> Drop for TaskManager<T> {
    fn drop(&mut self) {
        debug!(
            "Detaching {} task workers, abandoning {} queued task(s)",
            self.channels.len(),
            self.queued_tasks.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    struct Square(u64);

    impl Task for Square {
        type Output = u64;

        fn process(self: Box<Self>) -> u64 {
            self.0 * self.0
        }
    }

    fn drain_until(manager: &mut TaskManager<Square>, expected: usize) -> Vec<u64> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut results = Vec::new();
        while results.len() < expected && Instant::now() < deadline {
            manager.process_queued_tasks();
            results.extend(manager.drain_completed());
            thread::yield_now();
        }
        results
    }

    #[test]
    fn inline_manager_runs_tasks_immediately() {
        let mut manager = TaskManager::new(0);
        assert!(manager.publish_task(Box::new(Square(3))));
        assert_eq!(manager.drain_completed(), vec![9]);
        assert!(manager.drain_completed().is_empty());
    }

    #[test]
    fn workers_complete_every_task() {
        let mut manager = TaskManager::new(3);
        for i in 0..20 {
            manager.publish_task(Box::new(Square(i)));
        }

        let mut results = drain_until(&mut manager, 20);
        results.sort_unstable();
        assert_eq!(results, (0..20).map(|i| i * i).collect::<Vec<_>>());
        assert_eq!(manager.in_flight_count(), 0);
    }

    #[test]
    fn excess_tasks_are_queued_and_can_be_dropped() {
        let mut manager = TaskManager::new(1);
        for i in 0..10 {
            manager.publish_task(Box::new(Square(i)));
        }
        assert_eq!(manager.queued_count(), 10 - MAX_TASKS_IN_FLIGHT);

        manager.retain_queued(|task| task.0 % 2 == 0);
        let expected = MAX_TASKS_IN_FLIGHT + manager.queued_count();

        let results = drain_until(&mut manager, expected);
        assert_eq!(results.len(), expected);
        assert!(results[MAX_TASKS_IN_FLIGHT..]
            .iter()
            .all(|square| square % 2 == 0));
    }
}
