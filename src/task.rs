//! Off-loop jobs whose results come back over a channel.
//!
//! Each spawn gets a ticket. `cancel` and every newer spawn retire older
//! tickets, and results carrying a retired ticket are dropped on receipt,
//! so a screen that went away is never written to.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

pub struct TaskSlot<T> {
    name: &'static str,
    generation: u64,
    pending: bool,
    tx: Sender<(u64, T)>,
    rx: Receiver<(u64, T)>,
}

impl<T: Send + 'static> TaskSlot<T> {
    pub fn new(name: &'static str) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            name,
            generation: 0,
            pending: false,
            tx,
            rx,
        }
    }

    /// Run `job` on a worker thread. Any earlier job's result is retired.
    pub fn spawn<F>(&mut self, job: F) -> io::Result<u64>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        self.generation += 1;
        let ticket = self.generation;
        let tx = self.tx.clone();

        thread::Builder::new()
            .name(format!("encore-{}", self.name))
            .spawn(move || {
                // The slot may be gone by now; nothing to deliver to.
                let _ = tx.send((ticket, job()));
            })?;

        self.pending = true;
        tracing::debug!(task = self.name, ticket, "spawned");
        Ok(ticket)
    }

    /// Retire the in-flight job; its result will be dropped when it lands.
    pub fn cancel(&mut self) {
        if self.pending {
            tracing::debug!(task = self.name, ticket = self.generation, "cancelled");
        }
        self.generation += 1;
        self.pending = false;
    }

    /// The current job's result, if it has arrived.
    pub fn try_take(&mut self) -> Option<T> {
        while let Ok((ticket, value)) = self.rx.try_recv() {
            if ticket == self.generation {
                self.pending = false;
                return Some(value);
            }
            tracing::debug!(task = self.name, ticket, "dropping stale result");
        }
        None
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    fn wait_for<T: Send + 'static>(slot: &mut TaskSlot<T>) -> Option<T> {
        for _ in 0..200 {
            if let Some(v) = slot.try_take() {
                return Some(v);
            }
            thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn delivers_current_result() {
        let mut slot = TaskSlot::new("test");
        slot.spawn(|| 42).unwrap();
        assert!(slot.is_pending());
        assert_eq!(wait_for(&mut slot), Some(42));
        assert!(!slot.is_pending());
    }

    #[test]
    fn cancelled_result_is_dropped() {
        let mut slot = TaskSlot::new("test");
        let (go_tx, go_rx) = mpsc::channel::<()>();
        slot.spawn(move || {
            let _ = go_rx.recv();
            1
        })
        .unwrap();
        slot.cancel();
        go_tx.send(()).unwrap();

        thread::sleep(Duration::from_millis(50));
        assert_eq!(slot.try_take(), None);
        assert!(!slot.is_pending());
    }

    #[test]
    fn newer_spawn_supersedes_older() {
        let mut slot = TaskSlot::new("test");
        let (go_tx, go_rx) = mpsc::channel::<()>();
        slot.spawn(move || {
            let _ = go_rx.recv();
            "old"
        })
        .unwrap();
        slot.spawn(|| "new").unwrap();
        go_tx.send(()).unwrap();

        assert_eq!(wait_for(&mut slot), Some("new"));
        thread::sleep(Duration::from_millis(50));
        assert_eq!(slot.try_take(), None);
    }
}
