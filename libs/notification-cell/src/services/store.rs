// libs/notification-cell/src/services/store.rs
use std::sync::Arc;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::error::NotificationError;
use crate::models::{NotificationKind, NotificationRecord, NotificationStatus};

const TABLE_PATH: &str = "/rest/v1/appointment_notifications";

/// Data access for `appointment_notifications`. Pure persistence, no policy:
/// which rows to touch and when is decided by the scheduler and dispatcher.
pub struct NotificationStore {
    supabase: Arc<SupabaseClient>,
}

/// PostgREST filter values must not contain `+`, so timestamps are always
/// rendered with a `Z` suffix.
fn ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn representation_headers() -> reqwest::header::HeaderMap {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        "Prefer",
        reqwest::header::HeaderValue::from_static("return=representation"),
    );
    headers
}

fn parse_record(value: Value) -> Result<NotificationRecord, NotificationError> {
    serde_json::from_value(value)
        .map_err(|e| NotificationError::Database(format!("Failed to parse notification: {}", e)))
}

fn parse_records(values: Vec<Value>) -> Result<Vec<NotificationRecord>, NotificationError> {
    values.into_iter().map(parse_record).collect()
}

impl NotificationStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Insert one Pending record.
    pub async fn insert_pending(
        &self,
        appointment_id: Uuid,
        kind: NotificationKind,
        send_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<NotificationRecord, NotificationError> {
        let body = json!({
            "appointment_id": appointment_id,
            "kind": kind,
            "status": NotificationStatus::Pending,
            "send_at": ts(send_at),
            "created_at": ts(now),
            "updated_at": ts(now),
        });

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            TABLE_PATH,
            Some(body),
            Some(representation_headers()),
        ).await.map_err(|e| NotificationError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(NotificationError::Database("Failed to create notification".to_string()));
        }

        parse_record(result[0].clone())
    }

    /// Atomically claim up to `limit` due Pending records, earliest `send_at`
    /// first, and return them. One conditional UPDATE does both the selection
    /// and the marking, so two overlapping dispatch cycles can never claim
    /// the same rows.
    pub async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<NotificationRecord>, NotificationError> {
        let path = format!(
            "{}?status=eq.pending&send_at=lte.{}&order=send_at.asc&limit={}",
            TABLE_PATH, ts(now), limit
        );
        let body = json!({
            "status": NotificationStatus::Claimed,
            "claimed_at": ts(now),
            "updated_at": ts(now),
        });

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(body),
            Some(representation_headers()),
        ).await.map_err(|e| NotificationError::Database(e.to_string()))?;

        let mut records = parse_records(result)?;
        records.sort_by_key(|r| r.send_at);

        debug!("Claimed {} due notifications", records.len());
        Ok(records)
    }

    /// Reset every claim older than `older_than` (or with no recorded claim
    /// time) back to Pending in one bulk update. Returns the affected count.
    pub async fn release_stale(
        &self,
        older_than: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64, NotificationError> {
        let path = format!(
            "{}?status=eq.claimed&or=(claimed_at.lte.{},claimed_at.is.null)",
            TABLE_PATH, ts(older_than)
        );
        let body = json!({
            "status": NotificationStatus::Pending,
            "claimed_at": null,
            "updated_at": ts(now),
        });

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(body),
            Some(representation_headers()),
        ).await.map_err(|e| NotificationError::Database(e.to_string()))?;

        Ok(result.len() as u64)
    }

    /// Confirm a delivered record as Sent.
    pub async fn mark_sent(&self, id: Uuid, now: DateTime<Utc>) -> Result<(), NotificationError> {
        self.update_status(id, NotificationStatus::Sent, json!({
            "status": NotificationStatus::Sent,
            "sent_at": ts(now),
            "updated_at": ts(now),
        })).await
    }

    /// Record a terminal per-item delivery failure.
    pub async fn mark_failed(&self, id: Uuid, now: DateTime<Utc>) -> Result<(), NotificationError> {
        self.update_status(id, NotificationStatus::Failed, json!({
            "status": NotificationStatus::Failed,
            "updated_at": ts(now),
        })).await
    }

    /// Withdraw every Pending record for a cancelled appointment. Zero
    /// affected rows is a success, so repeat cancellations are harmless.
    pub async fn cancel_pending(
        &self,
        appointment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, NotificationError> {
        let path = format!(
            "{}?appointment_id=eq.{}&status=eq.pending",
            TABLE_PATH, appointment_id
        );
        let body = json!({
            "status": NotificationStatus::Failed,
            "updated_at": ts(now),
        });

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(body),
            Some(representation_headers()),
        ).await.map_err(|e| NotificationError::Database(e.to_string()))?;

        Ok(result.len() as u64)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: NotificationStatus,
        body: Value,
    ) -> Result<(), NotificationError> {
        let path = format!("{}?id=eq.{}", TABLE_PATH, id);

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(body),
            Some(representation_headers()),
        ).await.map_err(|e| NotificationError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(NotificationError::Database(format!(
                "Failed to mark notification {} as {}", id, status
            )));
        }

        Ok(())
    }
}
