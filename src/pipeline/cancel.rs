// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 buildgate contributors

//! Cancellation signal from the hosting environment

use tokio::sync::watch;

/// Fires cancellation; held by whoever listens for Ctrl-C or SIGTERM
#[derive(Debug)]
pub struct CancelTrigger(watch::Sender<bool>);

impl CancelTrigger {
    pub fn cancel(&self) {
        let _ = self.0.send(true);
    }
}

/// Observed by the pipeline between and during steps
#[derive(Debug, Clone)]
pub struct Cancellation(watch::Receiver<bool>);

impl Cancellation {
    /// Linked trigger/observer pair
    pub fn pair() -> (CancelTrigger, Self) {
        let (tx, rx) = watch::channel(false);
        (CancelTrigger(tx), Self(rx))
    }

    /// A signal that never fires
    pub fn never() -> Self {
        let (_, cancellation) = Self::pair();
        cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once cancellation fires; pends forever if it never can
    pub async fn cancelled(&self) {
        let mut rx = self.0.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
