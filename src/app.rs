use crate::{helpers::random_line, types::EMIT_INTERVAL};

use rand::Rng;
use std::{
    io::{self, Write},
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread,
    time::Duration,
};

/// A detached background thread with a stop handle.
pub struct Worker {
    stop: Sender<()>,
    done: Receiver<()>,
}

impl Worker {
    pub fn spawn<F>(name: &str, task: F) -> io::Result<Self>
    where
        F: FnOnce(Receiver<()>) + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();

        thread::Builder::new().name(name.to_string()).spawn(move || {
            task(stop_rx);
            let _ = done_tx.send(());
        })?;

        Ok(Self {
            stop: stop_tx,
            done: done_rx,
        })
    }

    /// Asks the task to stop and waits at most `limit` for it. Returns `false`
    /// if it is still running, e.g. blocked writing to a full pipe; the thread
    /// is then left to die with the process.
    pub fn stop_within(self, limit: Duration) -> bool {
        let Worker { stop, done } = self;
        drop(stop);

        !matches!(done.recv_timeout(limit), Err(RecvTimeoutError::Timeout))
    }
}

pub struct Printer<R, W> {
    rng: R,
    out: W,
    interval: Duration,
    emitted: usize,
}

impl<R: Rng, W: Write> Printer<R, W> {
    pub fn new(rng: R, out: W) -> Self {
        Self::with_interval(rng, out, EMIT_INTERVAL)
    }

    pub fn with_interval(rng: R, out: W, interval: Duration) -> Self {
        Self {
            rng,
            out,
            interval,
            emitted: 0,
        }
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    #[cfg(test)]
    pub fn into_writer(self) -> W {
        self.out
    }

    /// Writes one line. The line is complete on the writer before this returns.
    pub fn emit(&mut self) -> io::Result<()> {
        let mut line = random_line(&mut self.rng);
        line.push('\n');

        self.out.write_all(line.as_bytes())?;
        self.out.flush()?;
        self.emitted += 1;

        Ok(())
    }

    /// Emits until `stop` receives a message or its sender is dropped.
    /// Write errors are logged and the loop keeps going.
    pub fn run(&mut self, stop: &Receiver<()>) {
        tracing::debug!(interval_ms = self.interval.as_millis() as u64, "printer started");

        loop {
            if let Err(err) = self.emit() {
                tracing::debug!(error = %err, "write failed");
            }

            match stop.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        tracing::debug!(emitted = self.emitted(), "printer stopped");
    }
}
