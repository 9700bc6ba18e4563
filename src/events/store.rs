//! SQLite-backed append-only event store
//!
//! The log is the durable form of all governance state. Appends are the only
//! write path; sequence numbers are assigned by the single writer holding
//! this store, so they are unique, strictly increasing, and gap-free.

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{debug, info};

use super::{EventPayload, GovernanceEvent};

pub struct EventStore {
    db: Connection,
    next_seq: u64,
}

impl EventStore {
    /// Open or create the governance log in `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir).context("creating data directory")?;
        let db_path = data_dir.join("governance.db");
        let db = Connection::open(&db_path)
            .with_context(|| format!("opening event log at {}", db_path.display()))?;

        // WAL for concurrent read access while the writer appends
        db.execute_batch("PRAGMA journal_mode=WAL;")?;

        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS events (
                seq INTEGER PRIMARY KEY,
                timestamp_ms INTEGER NOT NULL,
                kind TEXT NOT NULL,
                payload TEXT NOT NULL
            );",
        )?;

        let last_seq: u64 = db.query_row("SELECT COALESCE(MAX(seq), 0) FROM events", [], |row| {
            row.get(0)
        })?;

        info!(path = %db_path.display(), last_seq, "Event store opened");

        Ok(Self {
            db,
            next_seq: last_seq + 1,
        })
    }

    /// Highest sequence number appended so far (0 when the log is empty).
    pub fn last_seq(&self) -> u64 {
        self.next_seq - 1
    }

    /// Append one event.
    pub fn append(&mut self, timestamp_ms: u64, payload: EventPayload) -> Result<GovernanceEvent> {
        let mut events = self.append_all(timestamp_ms, vec![payload])?;
        Ok(events.pop().expect("one payload appended"))
    }

    /// Append a batch of events in one transaction. Commands that produce
    /// several events (a spend plus a confirmation, a whole tally boundary)
    /// use this so the log never holds a partial command.
    pub fn append_all(
        &mut self,
        timestamp_ms: u64,
        payloads: Vec<EventPayload>,
    ) -> Result<Vec<GovernanceEvent>> {
        let tx = self.db.transaction()?;
        let mut events = Vec::with_capacity(payloads.len());
        let mut seq = self.next_seq;

        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO events (seq, timestamp_ms, kind, payload) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for payload in payloads {
                let body = serde_json::to_string(&payload).context("serializing event payload")?;
                stmt.execute(rusqlite::params![seq, timestamp_ms, payload.kind(), body])?;
                events.push(GovernanceEvent {
                    seq,
                    timestamp_ms,
                    payload,
                });
                seq += 1;
            }
        }

        tx.commit()?;
        self.next_seq = seq;
        debug!(count = events.len(), last_seq = seq - 1, "Appended events");
        Ok(events)
    }

    /// Events with `seq > since`, oldest first, optionally capped.
    pub fn events_since(&self, since: u64, limit: Option<usize>) -> Result<Vec<GovernanceEvent>> {
        let mut stmt = self.db.prepare_cached(
            "SELECT seq, timestamp_ms, payload FROM events WHERE seq > ?1 ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map([since], |row| {
            Ok((
                row.get::<_, u64>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (seq, timestamp_ms, body) = row?;
            let payload: EventPayload = serde_json::from_str(&body)
                .with_context(|| format!("decoding event payload at seq {}", seq))?;
            events.push(GovernanceEvent {
                seq,
                timestamp_ms,
                payload,
            });
            if let Some(max) = limit {
                if events.len() >= max {
                    break;
                }
            }
        }
        Ok(events)
    }

    /// The full log from genesis, for replay.
    pub fn replay(&self) -> Result<Vec<GovernanceEvent>> {
        self.events_since(0, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventPayload;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn cancelled(governor: &str) -> EventPayload {
        EventPayload::ProposalCancelled {
            proposal_id: Uuid::new_v4(),
            governor: governor.to_string(),
        }
    }

    #[test]
    fn sequence_numbers_are_gap_free() {
        let dir = TempDir::new().unwrap();
        let mut store = EventStore::open(dir.path()).unwrap();
        assert_eq!(store.last_seq(), 0);

        let e1 = store.append(1, cancelled("ava")).unwrap();
        let e2 = store.append(2, cancelled("ben")).unwrap();
        let batch = store
            .append_all(3, vec![cancelled("cora"), cancelled("dev")])
            .unwrap();

        assert_eq!(e1.seq, 1);
        assert_eq!(e2.seq, 2);
        assert_eq!(batch[0].seq, 3);
        assert_eq!(batch[1].seq, 4);
        assert_eq!(store.last_seq(), 4);
    }

    #[test]
    fn events_since_filters_and_limits() {
        let dir = TempDir::new().unwrap();
        let mut store = EventStore::open(dir.path()).unwrap();
        for i in 0..5 {
            store.append(i, cancelled("ava")).unwrap();
        }

        assert_eq!(store.events_since(0, None).unwrap().len(), 5);
        assert_eq!(store.events_since(3, None).unwrap().len(), 2);
        assert_eq!(store.events_since(0, Some(2)).unwrap().len(), 2);
        assert!(store.events_since(5, None).unwrap().is_empty());
    }

    #[test]
    fn log_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = EventStore::open(dir.path()).unwrap();
            store.append(1, cancelled("ava")).unwrap();
            store.append(2, cancelled("ben")).unwrap();
        }

        let mut store = EventStore::open(dir.path()).unwrap();
        assert_eq!(store.last_seq(), 2);
        let e3 = store.append(3, cancelled("cora")).unwrap();
        assert_eq!(e3.seq, 3);

        let all = store.replay().unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].seq, 1);
        assert_eq!(all[2].seq, 3);
    }
}
