//! Global hotkey listener (Windows)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use windows::Win32::UI::Input::KeyboardAndMouse::GetAsyncKeyState;

use super::{CancellationSignal, ExitKey, TriggerCallback};
use crate::Result;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Polls the asynchronous key state for the exit key on a background thread
pub struct KeyboardListener {
    key: ExitKey,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl KeyboardListener {
    pub fn new(key: ExitKey) -> Self {
        Self {
            key,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
}

impl CancellationSignal for KeyboardListener {
    fn on_trigger(&mut self, callback: TriggerCallback) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);

        let running = self.running.clone();
        let key = self.key;
        let vk = key.virtual_key() as i32;

        let handle = thread::Builder::new()
            .name("exit-key-listener".to_string())
            .spawn(move || {
                while running.load(Ordering::SeqCst) {
                    // High bit set means the key is currently down
                    let state = unsafe { GetAsyncKeyState(vk) };
                    if (state as u16) & 0x8000 != 0 {
                        log::info!("Exit key '{}' pressed, stopping", key);
                        callback();
                        return;
                    }
                    thread::sleep(POLL_INTERVAL);
                }
            })?;

        self.worker = Some(handle);
        log::info!("Press '{}' to stop tracking", self.key);
        Ok(())
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for KeyboardListener {
    fn drop(&mut self) {
        self.shutdown();
    }
}
