/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::LazyLock;

use tokio::sync::watch;

static PROCESS_QUIT: LazyLock<QuitSignal> = LazyLock::new(QuitSignal::default);

/// A one-shot broadcast notification for stopping background tasks.
///
/// Waiters created after the trigger see it immediately.
pub struct QuitSignal {
    sender: watch::Sender<bool>,
}

impl Default for QuitSignal {
    fn default() -> Self {
        QuitSignal {
            sender: watch::Sender::new(false),
        }
    }
}

impl QuitSignal {
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    pub fn waiter(&self) -> QuitWaiter {
        QuitWaiter {
            receiver: self.sender.subscribe(),
        }
    }
}

#[derive(Clone)]
pub struct QuitWaiter {
    receiver: watch::Receiver<bool>,
}

impl QuitWaiter {
    /// Resolves once quit has been triggered.
    pub async fn wait(&mut self) {
        // a dropped sender counts as quit
        let _ = self.receiver.wait_for(|quit| *quit).await;
    }

    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }
}

/// The process wide quit signal, triggered by the signal handlers.
pub fn process() -> &'static QuitSignal {
    &PROCESS_QUIT
}

pub fn trigger_process_quit() {
    PROCESS_QUIT.trigger();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_trigger() {
        let quit = QuitSignal::default();
        let mut waiter = quit.waiter();
        assert!(!waiter.is_triggered());

        let task = tokio::spawn(async move {
            waiter.wait().await;
        });
        quit.trigger();
        task.await.unwrap();
        assert!(quit.is_triggered());
    }

    #[tokio::test]
    async fn late_waiter() {
        let quit = QuitSignal::default();
        quit.trigger();
        let mut waiter = quit.waiter();
        assert!(waiter.is_triggered());
        waiter.wait().await;
    }
}
