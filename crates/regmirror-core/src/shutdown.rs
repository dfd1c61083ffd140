// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Cooperative shutdown coordination.
//!
//! One [`ShutdownCoordinator`] is shared by the whole process; each
//! synchronizer task holds a [`ShutdownListener`]. Signal handling lives
//! in the binary crate; this module only carries the notification
//! plumbing so that the synchronizer can observe cancellation between
//! areas and while sleeping out the poll interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

// =============================================================================
// ShutdownCoordinator
// =============================================================================

/// Broadcasts a one-shot shutdown notification to all listeners.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    sender: broadcast::Sender<()>,
    requested: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    /// Creates a new coordinator.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            sender,
            requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates a listener for one task.
    pub fn listener(&self) -> ShutdownListener {
        ShutdownListener {
            requested: self.requested.clone(),
            receiver: self.sender.subscribe(),
        }
    }

    /// Requests shutdown. Idempotent; only the first call notifies.
    pub fn initiate(&self) {
        if self
            .requested
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            info!("shutdown requested");
            let _ = self.sender.send(());
        }
    }

    /// Returns `true` once shutdown has been requested.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ShutdownListener
// =============================================================================

/// A per-task handle for observing shutdown.
pub struct ShutdownListener {
    requested: Arc<AtomicBool>,
    receiver: broadcast::Receiver<()>,
}

impl ShutdownListener {
    /// Returns `true` once shutdown has been requested.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Resolves when shutdown is requested.
    ///
    /// Resolves immediately if the request already happened; suitable for
    /// racing against a sleep in `tokio::select!`.
    pub async fn cancelled(&mut self) {
        if self.is_requested() {
            return;
        }
        let _ = self.receiver.recv().await;
    }
}

impl Clone for ShutdownListener {
    fn clone(&self) -> Self {
        Self {
            requested: self.requested.clone(),
            receiver: self.receiver.resubscribe(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
