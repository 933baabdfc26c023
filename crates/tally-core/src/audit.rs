//! Best-effort audit recording.
//!
//! A failed audit write is logged and dropped: the mutation it describes has
//! already been committed and must not be reported as failed.

use chrono::Utc;
use uuid::Uuid;

use crate::error::Result;
use crate::storage::{Actor, AuditAction, AuditLog, AuditRecord, BookScope};

/// Writes and reads audit records for the services.
#[derive(Clone, Copy)]
pub struct AuditRecorder<'a> {
    log: &'a dyn AuditLog,
}

impl<'a> AuditRecorder<'a> {
    pub fn new(log: &'a dyn AuditLog) -> Self {
        Self { log }
    }

    /// Append a record. Never fails; write errors are logged.
    pub fn record(
        &self,
        scope: &BookScope,
        action: AuditAction,
        actor: &Actor,
        details: serde_json::Value,
    ) {
        let record = AuditRecord {
            id: Uuid::now_v7(),
            channel: scope.channel.clone(),
            book: scope.book,
            action,
            actor: actor.clone(),
            details,
            timestamp: Utc::now(),
        };

        if let Err(err) = self.log.append(&record) {
            tracing::warn!(
                channel = %scope.channel,
                book = %scope.book,
                action = %action,
                error = %err,
                "audit write failed; mutation kept"
            );
        }
    }

    /// Newest first, at most `limit` records.
    pub fn query(&self, scope: &BookScope, limit: usize) -> Result<Vec<AuditRecord>> {
        self.log.query(scope, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TallyError;
    use crate::storage::{Book, SqliteStore};

    struct BrokenLog;

    impl AuditLog for BrokenLog {
        fn append(&self, _record: &AuditRecord) -> Result<()> {
            Err(TallyError::StorageUnavailable("disk full".to_string()))
        }

        fn query(&self, _scope: &BookScope, _limit: usize) -> Result<Vec<AuditRecord>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_records_are_returned_newest_first() {
        let store = SqliteStore::open_in_memory().unwrap();
        let recorder = AuditRecorder::new(&store);
        let scope = BookScope::new("chan", Book::Tracker);
        let actor = Actor::new("1", "alice");

        recorder.record(&scope, AuditAction::Add, &actor, serde_json::json!({ "n": 1 }));
        recorder.record(&scope, AuditAction::Remove, &actor, serde_json::json!({ "n": 2 }));
        recorder.record(&scope, AuditAction::Clear, &actor, serde_json::json!({ "n": 3 }));

        let records = recorder.query(&scope, 2).unwrap();
        let actions: Vec<AuditAction> = records.iter().map(|r| r.action).collect();
        assert_eq!(actions, vec![AuditAction::Clear, AuditAction::Remove]);
        assert_eq!(records[0].actor, actor);
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let recorder = AuditRecorder::new(&BrokenLog);
        recorder.record(
            &BookScope::new("chan", Book::Dnd),
            AuditAction::Deposit,
            &Actor::new("1", "alice"),
            serde_json::Value::Null,
        );
    }
}
