// libs/notification-cell/src/services/scheduler.rs
use std::sync::Arc;
use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, TimeZone, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::NotificationError;
use crate::models::{NotificationKind, NotificationRecord, ReminderSettings};
use crate::services::appointments::AppointmentDirectory;
use crate::services::clock::Clock;
use crate::services::store::NotificationStore;

/// Turns appointment lifecycle events into notification records.
pub struct ReminderSchedulingService {
    store: Arc<NotificationStore>,
    directory: Arc<dyn AppointmentDirectory>,
    clock: Arc<dyn Clock>,
    settings: ReminderSettings,
}

impl ReminderSchedulingService {
    pub fn new(
        store: Arc<NotificationStore>,
        directory: Arc<dyn AppointmentDirectory>,
        clock: Arc<dyn Clock>,
        settings: ReminderSettings,
    ) -> Self {
        Self { store, directory, clock, settings }
    }

    /// Called when an appointment is booked. Returns the created record, or
    /// `None` when the request was skipped: the patient has not opted in, or
    /// the computed send time has already passed. Skipping is not an error;
    /// callers must treat a `Database` failure as non-fatal to the booking.
    pub async fn schedule_reminder(
        &self,
        appointment_id: Uuid,
        kind: NotificationKind,
    ) -> Result<Option<NotificationRecord>, NotificationError> {
        let context = self.directory.reminder_context(appointment_id).await?;

        if !context.online_reminders_enabled {
            info!(
                "Patient has not opted in to online reminders, skipping appointment {}",
                appointment_id
            );
            return Ok(None);
        }

        let send_at = self.compute_send_at(context.starts_at)?;
        let now = self.clock.now();
        if send_at <= now {
            info!(
                "Reminder for appointment {} would fire in the past ({}), skipping",
                appointment_id, send_at
            );
            return Ok(None);
        }

        let record = self.store.insert_pending(appointment_id, kind, send_at, now).await?;
        debug!(
            "Scheduled {} for appointment {} at {}",
            record.kind, appointment_id, record.send_at
        );
        Ok(Some(record))
    }

    /// Called when an appointment is cancelled or removed. Withdraws every
    /// pending notification for it; repeat calls affect zero rows.
    pub async fn cancel_for_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<u64, NotificationError> {
        let withdrawn = self.store.cancel_pending(appointment_id, self.clock.now()).await?;
        if withdrawn > 0 {
            info!(
                "Withdrew {} pending notifications for cancelled appointment {}",
                withdrawn, appointment_id
            );
        }
        Ok(withdrawn)
    }

    /// Lead time before the appointment, pinned to a fixed hour of day.
    fn compute_send_at(&self, starts_at: DateTime<Utc>) -> Result<DateTime<Utc>, NotificationError> {
        let send_time = match NaiveTime::from_hms_opt(self.settings.send_hour, 0, 0) {
            Some(t) => t,
            None => {
                return Err(NotificationError::InvalidRecord(format!(
                    "invalid send hour {}", self.settings.send_hour
                )))
            }
        };

        let send_date = starts_at.date_naive() - ChronoDuration::days(self.settings.lead_days);
        Ok(Utc.from_utc_datetime(&send_date.and_time(send_time)))
    }
}
