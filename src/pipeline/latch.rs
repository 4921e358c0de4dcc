//! One-shot latch gate
//!
//! A [`Latch`] starts closed and can be opened exactly once. Opening wakes
//! every current waiter, and any later `wait()` returns immediately. There is
//! no reset: a new pipeline run gets new latches.

use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct Latch {
    name: &'static str,
    state: Arc<watch::Sender<bool>>,
}

impl Latch {
    pub fn new(name: &'static str) -> Self {
        let (state, _) = watch::channel(false);
        Self {
            name,
            state: Arc::new(state),
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Open the gate and release all waiters. Opening twice is a no-op.
    pub fn open(&self) {
        let was_open = self.state.send_replace(true);
        if !was_open {
            tracing::debug!(gate = self.name, "Gate opened");
        }
    }

    pub fn is_open(&self) -> bool {
        *self.state.borrow()
    }

    /// Wait until the gate is open.
    pub async fn wait(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|open| *open).await;
    }
}
