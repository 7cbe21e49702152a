//! Per-popup decay timers.
//!
//! Every timer is a tokio task sleeping until its deadline that then enqueues
//! a [`Message::Timeout`] on the control loop. It never touches popup state
//! itself. Each schedule gets a fresh generation number; the lifecycle
//! manager drops fires whose generation is not the record's current one, which
//! covers a fire that was already queued when the timer got cancelled.

use crate::handlers::messages::Message;
use cosmic_headsup_util::NotificationIdentity;
use tokio::{sync::mpsc::Sender, task::JoinHandle, time::Instant};

#[derive(Debug)]
pub struct DecayTimer {
    identity: NotificationIdentity,
    generation: u64,
    deadline: Instant,
    task: JoinHandle<()>,
}

impl DecayTimer {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn identity(&self) -> &NotificationIdentity {
        &self.identity
    }
}

impl Drop for DecayTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[derive(Debug)]
pub struct DecayScheduler {
    tx: Sender<Message>,
    next_generation: u64,
}

impl DecayScheduler {
    pub fn new(tx: Sender<Message>) -> Self {
        Self {
            tx,
            next_generation: 1,
        }
    }

    pub fn schedule(&mut self, identity: NotificationIdentity, deadline: Instant) -> DecayTimer {
        let generation = self.next_generation;
        self.next_generation += 1;

        let tx = self.tx.clone();
        let fired = identity.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Err(err) = tx
                .send(Message::Timeout {
                    identity: fired,
                    generation,
                })
                .await
            {
                tracing::debug!("Control loop gone, dropping decay timeout: {}", err);
            }
        });

        DecayTimer {
            identity,
            generation,
            deadline,
            task,
        }
    }

    /// Cancels the pending fire and schedules a new one. The old generation
    /// becomes stale even if its message is already queued.
    pub fn reset(&mut self, timer: &mut DecayTimer, deadline: Instant) {
        let identity = timer.identity().clone();
        *timer = self.schedule(identity, deadline);
    }

    pub fn cancel(&mut self, timer: DecayTimer) {
        tracing::trace!(identity = %timer.identity, generation = timer.generation, "cancel decay");
        drop(timer);
    }
}
