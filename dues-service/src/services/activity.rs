//! Fire-and-forget activity/audit logging.
//!
//! Policy: logging never blocks or fails the primary user action. Writes
//! happen on a background worker with bounded retry; records that still
//! cannot be written park in a bounded dead-letter buffer and are retried
//! on an interval. Every failure and drop is counted in metrics, so
//! operators can see loss without the primary flow ever noticing it.

use metrics::counter;
use mongodb::{Collection, Database};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::models::{collections, ActivityRecord};

const CHANNEL_CAPACITY: usize = 256;
const DEAD_LETTER_CAPACITY: usize = 256;
const WRITE_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);
const DEAD_LETTER_FLUSH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct ActivityLogger {
    tx: mpsc::Sender<ActivityRecord>,
}

impl ActivityLogger {
    pub fn spawn(db: &Database) -> Self {
        let collection = db.collection::<ActivityRecord>(collections::ACTIVITY);
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(worker(collection, rx));
        Self { tx }
    }

    /// Append an activity record. Returns immediately; a full channel drops
    /// the record and bumps a counter.
    pub fn log(&self, action: &str, meta: serde_json::Value, actor: Option<&str>) {
        let record = ActivityRecord::new(action.to_string(), meta, actor.map(str::to_string));
        if self.tx.try_send(record).is_err() {
            counter!("activity_log_dropped_total").increment(1);
            tracing::warn!(action, "activity channel full, record dropped");
        }
    }
}

async fn worker(collection: Collection<ActivityRecord>, mut rx: mpsc::Receiver<ActivityRecord>) {
    let mut dead_letter: VecDeque<ActivityRecord> = VecDeque::new();
    let mut flush = tokio::time::interval(DEAD_LETTER_FLUSH_INTERVAL);
    flush.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            received = rx.recv() => {
                match received {
                    Some(record) => {
                        if let Err(record) = write_with_retry(&collection, record).await {
                            park(&mut dead_letter, record);
                        }
                    }
                    None => {
                        // Sender side gone: drain what we can and stop.
                        while let Some(record) = dead_letter.pop_front() {
                            if write_with_retry(&collection, record).await.is_err() {
                                break;
                            }
                        }
                        return;
                    }
                }
            }
            _ = flush.tick() => {
                retry_dead_letters(&collection, &mut dead_letter).await;
            }
        }
    }
}

async fn retry_dead_letters(
    collection: &Collection<ActivityRecord>,
    dead_letter: &mut VecDeque<ActivityRecord>,
) {
    let mut remaining = VecDeque::new();
    while let Some(record) = dead_letter.pop_front() {
        if let Err(record) = write_with_retry(collection, record).await {
            // Store still unhappy; keep everything and stop hammering it.
            remaining.push_back(record);
            remaining.extend(dead_letter.drain(..));
            break;
        }
    }
    *dead_letter = remaining;
}

/// Bounded retry with linear backoff. Hands the record back on exhaustion.
async fn write_with_retry(
    collection: &Collection<ActivityRecord>,
    record: ActivityRecord,
) -> Result<(), ActivityRecord> {
    for attempt in 1..=WRITE_ATTEMPTS {
        match collection.insert_one(&record, None).await {
            Ok(_) => return Ok(()),
            Err(e) => {
                counter!("activity_log_failures_total").increment(1);
                tracing::warn!(error = %e, attempt, action = %record.action, "activity write failed");
                if attempt < WRITE_ATTEMPTS {
                    tokio::time::sleep(RETRY_BASE_DELAY * attempt).await;
                }
            }
        }
    }
    Err(record)
}

fn park(queue: &mut VecDeque<ActivityRecord>, record: ActivityRecord) {
    if queue.len() >= DEAD_LETTER_CAPACITY {
        queue.pop_front();
        counter!("activity_log_dropped_total").increment(1);
    }
    queue.push_back(record);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dead_letter_buffer_drops_oldest_at_capacity() {
        let mut queue = VecDeque::new();
        for i in 0..DEAD_LETTER_CAPACITY + 5 {
            park(
                &mut queue,
                ActivityRecord::new(format!("action-{i}"), json!({}), None),
            );
        }
        assert_eq!(queue.len(), DEAD_LETTER_CAPACITY);
        // The five oldest records were evicted.
        assert_eq!(queue.front().unwrap().action, "action-5");
        assert_eq!(
            queue.back().unwrap().action,
            format!("action-{}", DEAD_LETTER_CAPACITY + 4)
        );
    }
}
