//! Line-based exit listener on standard input

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use super::{CancellationSignal, ExitKey, TriggerCallback};
use crate::Result;

/// Fires when a line naming the exit key is read from stdin.
///
/// Reading stdin blocks, so the listener thread is detached rather than
/// joined; after `shutdown` any further input is ignored.
pub struct StdinListener {
    key: ExitKey,
    active: Arc<AtomicBool>,
}

impl StdinListener {
    pub fn new(key: ExitKey) -> Self {
        Self {
            key,
            active: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// True if a typed line names `key`
pub(crate) fn line_matches(line: &str, key: ExitKey) -> bool {
    line.trim().parse::<ExitKey>().map(|k| k == key).unwrap_or(false)
}

impl CancellationSignal for StdinListener {
    fn on_trigger(&mut self, callback: TriggerCallback) -> Result<()> {
        self.active.store(true, Ordering::SeqCst);

        let active = self.active.clone();
        let key = self.key;

        thread::Builder::new()
            .name("stdin-exit-listener".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    if !active.load(Ordering::SeqCst) {
                        return;
                    }
                    if line_matches(&line, key) {
                        log::info!("Exit key '{}' entered, stopping", key);
                        callback();
                        return;
                    }
                }
                log::debug!("stdin closed, exit listener idle");
            })?;

        log::info!("Type '{}' and press Enter to stop tracking", self.key);
        Ok(())
    }

    fn shutdown(&mut self) {
        self.active.store(false, Ordering::SeqCst);
    }
}
