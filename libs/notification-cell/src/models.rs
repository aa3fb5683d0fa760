// libs/notification-cell/src/models.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;

use crate::error::NotificationError;

// ==============================================================================
// NOTIFICATION RECORDS
// ==============================================================================

/// One scheduled notification, persisted in `appointment_notifications`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub kind: NotificationKind,
    pub status: NotificationStatus,
    pub send_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    EmailReminder,
    SmsReminder,
    WhatsappConfirmation,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::EmailReminder => write!(f, "email_reminder"),
            NotificationKind::SmsReminder => write!(f, "sms_reminder"),
            NotificationKind::WhatsappConfirmation => write!(f, "whatsapp_confirmation"),
        }
    }
}

/// Lifecycle of a notification.
///
/// Claimed rows belong to exactly one in-flight dispatch cycle; the reclaimer
/// returns them to Pending when the claim ages past the processing timeout.
/// Sent and Failed are terminal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Claimed,
    Sent,
    Failed,
}

impl NotificationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, NotificationStatus::Sent | NotificationStatus::Failed)
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationStatus::Pending => write!(f, "pending"),
            NotificationStatus::Claimed => write!(f, "claimed"),
            NotificationStatus::Sent => write!(f, "sent"),
            NotificationStatus::Failed => write!(f, "failed"),
        }
    }
}

// ==============================================================================
// SUBJECT DATA
// ==============================================================================

/// Everything the engine needs to know about an appointment to schedule and
/// render a notification, resolved at delivery time so content reflects the
/// subject's current data.
#[derive(Debug, Clone)]
pub struct ReminderContext {
    pub appointment_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub patient_name: String,
    pub patient_email: Option<String>,
    pub patient_phone: Option<String>,
    pub online_reminders_enabled: bool,
    pub doctor_name: String,
    pub patient_note: Option<String>,
}

// ==============================================================================
// SETTINGS
// ==============================================================================

/// Tuning knobs for scheduling, dispatch and delivery.
#[derive(Debug, Clone)]
pub struct ReminderSettings {
    /// Calendar days before the appointment that the reminder fires.
    pub lead_days: i64,
    /// Hour of day (UTC) the reminder is pinned to.
    pub send_hour: u32,
    pub dispatch_interval_seconds: u64,
    /// Upper bound on records claimed per tick.
    pub max_batch: usize,
    /// A claim older than this is presumed abandoned and reclaimed.
    pub processing_timeout_minutes: i64,
    pub max_delivery_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            lead_days: 1,
            send_hour: 9,
            dispatch_interval_seconds: 60,
            max_batch: 50,
            processing_timeout_minutes: 5,
            max_delivery_attempts: 3,
            backoff_base_ms: 1000,
            backoff_cap_ms: 5000,
        }
    }
}

// ==============================================================================
// DISPATCH RESULTS
// ==============================================================================

/// Counters for one completed dispatch cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub stale_reclaimed: u64,
    pub claimed: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Outcome of a single dispatcher tick.
#[derive(Debug)]
pub enum TickOutcome {
    /// A previous cycle was still running; nothing was touched.
    Skipped,
    /// Reclaiming or claiming failed; the tick stopped before dispatching.
    Aborted(NotificationError),
    Completed(TickReport),
}
