//! Cooperative task scheduler
//!
//! Tasks run one at a time on the calling thread until they finish, park
//! on a promise or use up their fuel. Host I/O runs as futures on a tokio
//! current-thread runtime; those futures only make progress while the
//! scheduler waits in [`Scheduler::wait`], and each posts a [`Completion`]
//! back over a channel.

use super::errors::VmResult;
use super::frames::TaskId;
use super::host::{http_client, perform, IoOutcome, IoRequest};
use crate::runtime::promise::PromiseHandle;
use std::collections::VecDeque;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc;
use tracing::trace;

/// Finished host work, correlated with its promise
#[derive(Debug)]
pub struct Completion {
    pub handle: PromiseHandle,
    pub outcome: IoOutcome,
}

pub struct Scheduler {
    runtime: Runtime,
    http: reqwest::Client,
    sender: mpsc::UnboundedSender<Completion>,
    receiver: mpsc::UnboundedReceiver<Completion>,
    ready: VecDeque<TaskId>,
    inflight: usize,
}

impl Scheduler {
    pub fn new() -> VmResult<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let http = http_client()?;
        let (sender, receiver) = mpsc::unbounded_channel();
        Ok(Self {
            runtime,
            http,
            sender,
            receiver,
            ready: VecDeque::new(),
            inflight: 0,
        })
    }

    /// Queue a task to run
    pub fn ready(
        &mut self,
        task: TaskId,
    ) {
        trace!("{} ready", task);
        self.ready.push_back(task);
    }

    pub fn next_ready(&mut self) -> Option<TaskId> {
        self.ready.pop_front()
    }

    /// Start host work that settles `handle` when done
    pub fn submit(
        &mut self,
        handle: PromiseHandle,
        request: IoRequest,
    ) {
        trace!("{} waits on {:?}", handle, request);
        self.inflight += 1;
        let sender = self.sender.clone();
        let client = self.http.clone();
        self.runtime.spawn(async move {
            let outcome = perform(client, request).await;
            let _ = sender.send(Completion { handle, outcome });
        });
    }

    /// Host work started and not yet collected
    pub fn inflight(&self) -> usize {
        self.inflight
    }

    /// Block until some host work completes; `None` when nothing is in
    /// flight
    pub fn wait(&mut self) -> Option<Completion> {
        if self.inflight == 0 {
            return None;
        }
        let completion = self.runtime.block_on(self.receiver.recv());
        if completion.is_some() {
            self.inflight -= 1;
        }
        completion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Duration, Instant};

    #[test]
    fn test_timers_complete_in_deadline_order() {
        let mut scheduler = Scheduler::new().unwrap();
        let now = Instant::now();
        scheduler.submit(PromiseHandle(1), IoRequest::Sleep(now + Duration::from_millis(40)));
        scheduler.submit(PromiseHandle(2), IoRequest::Sleep(now + Duration::from_millis(5)));
        assert_eq!(scheduler.inflight(), 2);
        assert_eq!(scheduler.wait().unwrap().handle, PromiseHandle(2));
        assert_eq!(scheduler.wait().unwrap().handle, PromiseHandle(1));
        assert!(scheduler.wait().is_none());
    }

    #[test]
    fn test_ready_queue_is_fifo() {
        let mut scheduler = Scheduler::new().unwrap();
        scheduler.ready(TaskId(3));
        scheduler.ready(TaskId(1));
        assert_eq!(scheduler.next_ready(), Some(TaskId(3)));
        assert_eq!(scheduler.next_ready(), Some(TaskId(1)));
        assert_eq!(scheduler.next_ready(), None);
    }

    #[test]
    fn test_missing_file_completes_with_error() {
        let mut scheduler = Scheduler::new().unwrap();
        scheduler.submit(
            PromiseHandle(1),
            IoRequest::ReadFile {
                path: "/definitely/not/here.txt".to_string(),
            },
        );
        match scheduler.wait().unwrap().outcome {
            IoOutcome::Text(Err(message)) => assert!(message.contains("not/here.txt")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
