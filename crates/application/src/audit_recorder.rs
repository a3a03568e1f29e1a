use std::sync::Arc;
use std::time::Duration;

use gatehouse_core::{AppResult, TenantId};
use gatehouse_domain::{AuditEntry, NewAuditEntry, OperationName};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::warn;
use uuid::Uuid;

use crate::bounded_call::bounded;
use crate::{AuditLog, AuditLogQuery, Clock};

/// Upper bound on entries returned by one audit query.
pub const AUDIT_QUERY_MAX_LIMIT: usize = 100;

/// Writes and reads the permission audit trail.
///
/// Writes never block or fail the caller. The entry is stamped on the spot
/// and appended from a background task; a failed or slow append is logged
/// and the entry is dropped.
#[derive(Clone)]
pub struct AuditRecorder {
    audit_log: Arc<dyn AuditLog>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
    in_flight: Arc<watch::Sender<usize>>,
}

impl AuditRecorder {
    /// Creates an audit recorder.
    #[must_use]
    pub fn new(audit_log: Arc<dyn AuditLog>, clock: Arc<dyn Clock>, timeout: Duration) -> Self {
        Self {
            audit_log,
            clock,
            timeout,
            in_flight: Arc::new(watch::Sender::new(0)),
        }
    }

    /// Stamps one entry and hands the append to a background task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn record(&self, entry: NewAuditEntry) {
        let entry = entry.recorded(Uuid::new_v4(), self.clock.now());
        let audit_log = Arc::clone(&self.audit_log);
        let in_flight = Arc::clone(&self.in_flight);
        let timeout = self.timeout;

        in_flight.send_modify(|count| *count += 1);
        tokio::spawn(async move {
            let tenant_id = entry.tenant_id;
            let action = entry.action;

            if let Err(error) = bounded(timeout, "audit append", audit_log.append_entry(entry)).await
            {
                warn!(
                    tenant_id = %tenant_id,
                    action = action.as_str(),
                    error = %error,
                    "dropping audit entry after write failure"
                );
            }

            in_flight.send_modify(|count| *count = count.saturating_sub(1));
        });
    }

    /// Waits until every append handed off so far has finished or timed out.
    pub async fn flush(&self) {
        let mut in_flight = self.in_flight.subscribe();
        let _ = in_flight.wait_for(|count| *count == 0).await;
    }

    /// Returns up to `limit` tenant entries, newest first.
    ///
    /// `limit` is capped at [`AUDIT_QUERY_MAX_LIMIT`]; zero returns nothing.
    pub async fn query(
        &self,
        tenant_id: TenantId,
        limit: usize,
        operation: Option<OperationName>,
    ) -> AppResult<Vec<AuditEntry>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let limit = limit.min(AUDIT_QUERY_MAX_LIMIT);
        let mut entries = bounded(
            self.timeout,
            "audit query",
            self.audit_log
                .list_entries(tenant_id, AuditLogQuery { limit, operation }),
        )
        .await?;

        entries.sort_by(|left, right| right.recorded_at.cmp(&left.recorded_at));
        entries.truncate(limit);
        Ok(entries)
    }
}

/// Snapshots a record for the old or new value of an audit entry.
pub(crate) fn audit_snapshot<T: Serialize>(value: &T) -> Option<Value> {
    serde_json::to_value(value).ok()
}
