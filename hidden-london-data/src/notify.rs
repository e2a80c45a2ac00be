// notify.rs
//
// Copyright 2025 Hidden London contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Best-effort change notifications.
//!
//! Views that render content subscribe here to learn that something they
//! show may be stale. Delivery is at most once: a subscriber that falls
//! behind skips what it missed and is expected to re-fetch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use std::sync::{Arc, RwLock};

use crate::models::EntityKind;

/// Events buffered per subscriber before it starts lagging.
const CHANNEL_CAPACITY: usize = 256;

/// What happened to the content of one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Change {
    Saved {
        id: String,
        record: serde_json::Value,
    },
    Deleted {
        id: String,
    },
    Reordered {
        count: usize,
    },
    /// The cache was overwritten by a fresh remote list.
    Refreshed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: EntityKind,
    pub change: Change,
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(kind: EntityKind, change: Change) -> Self {
        ChangeEvent {
            kind,
            change,
            at: Utc::now(),
        }
    }
}

/// Fan-out of [`ChangeEvent`]s to every live subscriber.
///
/// Clones share the same channel. After [`close`](ChangeNotifier::close)
/// publishing is a no-op and subscribers see the end of the stream.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    sender: Arc<RwLock<Option<broadcast::Sender<ChangeEvent>>>>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        ChangeNotifier {
            sender: Arc::new(RwLock::new(Some(sender))),
        }
    }

    pub fn subscribe(&self) -> ChangeSubscription {
        let guard = self.sender.read().unwrap_or_else(|e| e.into_inner());
        let receiver = guard.as_ref().map(|sender| sender.subscribe());
        ChangeSubscription { receiver }
    }

    /// Returns how many subscribers the event was handed to.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        let guard = self.sender.read().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            // An error only means there is nobody listening.
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        }
    }

    pub fn close(&self) {
        let mut guard = self.sender.write().unwrap_or_else(|e| e.into_inner());
        if guard.take().is_some() {
            debug!("Change notifications closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        let guard = self.sender.read().unwrap_or_else(|e| e.into_inner());
        guard.is_none()
    }
}

/// One subscriber's end of the channel.
#[derive(Debug)]
pub struct ChangeSubscription {
    receiver: Option<broadcast::Receiver<ChangeEvent>>,
}

impl ChangeSubscription {
    /// Wait for the next event. `None` once the notifier is closed.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Change subscriber lagged behind, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// The next event if one is already waiting.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Change subscriber lagged behind, {} events skipped", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}
