// libs/notification-cell/src/services/appointments.rs
use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::error::NotificationError;
use crate::models::ReminderContext;

/// Subject provider for the reminder engine. The appointment collaborator
/// owns the data; the engine only reads the slice it needs to schedule and
/// render notifications.
#[async_trait]
pub trait AppointmentDirectory: Send + Sync {
    async fn reminder_context(
        &self,
        appointment_id: Uuid,
    ) -> Result<ReminderContext, NotificationError>;
}

pub struct SupabaseAppointmentDirectory {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentDirectory {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn fetch_row(&self, path: &str) -> Result<Option<Value>, NotificationError> {
        let result: Vec<Value> = self.supabase
            .request(Method::GET, path, None)
            .await
            .map_err(|e| NotificationError::Database(e.to_string()))?;

        Ok(result.into_iter().next())
    }
}

fn required_str(row: &Value, field: &str) -> Result<String, NotificationError> {
    match row[field].as_str() {
        Some(s) => Ok(s.to_string()),
        None => Err(NotificationError::InvalidRecord(format!("missing field {}", field))),
    }
}

fn optional_str(row: &Value, field: &str) -> Option<String> {
    row[field].as_str().filter(|s| !s.is_empty()).map(|s| s.to_string())
}

fn required_datetime(row: &Value, field: &str) -> Result<DateTime<Utc>, NotificationError> {
    let raw = required_str(row, field)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| NotificationError::InvalidRecord(format!("bad timestamp in {}: {}", field, e)))
}

#[async_trait]
impl AppointmentDirectory for SupabaseAppointmentDirectory {
    async fn reminder_context(
        &self,
        appointment_id: Uuid,
    ) -> Result<ReminderContext, NotificationError> {
        debug!("Resolving reminder context for appointment {}", appointment_id);

        let appointment = self
            .fetch_row(&format!("/rest/v1/appointments?id=eq.{}", appointment_id))
            .await?
            .ok_or(NotificationError::SubjectNotFound(appointment_id))?;

        let patient_id = required_str(&appointment, "patient_id")?;
        let doctor_id = required_str(&appointment, "doctor_id")?;
        let starts_at = required_datetime(&appointment, "appointment_date")?;

        let patient = self
            .fetch_row(&format!("/rest/v1/patients?id=eq.{}", patient_id))
            .await?
            .ok_or_else(|| NotificationError::InvalidRecord(format!(
                "patient {} not found for appointment {}", patient_id, appointment_id
            )))?;

        let doctor = self
            .fetch_row(&format!("/rest/v1/doctors?id=eq.{}", doctor_id))
            .await?
            .ok_or_else(|| NotificationError::InvalidRecord(format!(
                "doctor {} not found for appointment {}", doctor_id, appointment_id
            )))?;

        Ok(ReminderContext {
            appointment_id,
            starts_at,
            patient_name: required_str(&patient, "full_name")?,
            patient_email: optional_str(&patient, "email"),
            patient_phone: optional_str(&patient, "phone"),
            online_reminders_enabled: patient["online_reminders_enabled"].as_bool().unwrap_or(false),
            doctor_name: required_str(&doctor, "full_name")?,
            patient_note: optional_str(&appointment, "patient_notes"),
        })
    }
}
