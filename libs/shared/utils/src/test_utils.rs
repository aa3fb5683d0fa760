use std::sync::Arc;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub mailer_api_url: String,
    pub mailer_api_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
            mailer_api_url: "http://localhost:8025".to_string(),
            mailer_api_key: "test-mailer-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Default::default()
        }
    }

    pub fn with_mailer_url(url: &str) -> Self {
        Self {
            mailer_api_url: url.to_string(),
            ..Default::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            mailer_api_url: self.mailer_api_url.clone(),
            mailer_api_key: self.mailer_api_key.clone(),
            mailer_from_address: "reminders@clinic.example".to_string(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Timestamps rendered the way the engine writes them to PostgREST.
pub fn format_ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn appointment_row(
        id: &Uuid,
        patient_id: &Uuid,
        doctor_id: &Uuid,
        starts_at: DateTime<Utc>,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "appointment_date": format_ts(starts_at),
            "status": "confirmed",
            "duration_minutes": 30,
            "patient_notes": "Please bring previous test results",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn patient_row(
        id: &Uuid,
        email: Option<&str>,
        phone: Option<&str>,
        online_reminders_enabled: bool,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "full_name": "Test Patient",
            "email": email,
            "phone": phone,
            "online_reminders_enabled": online_reminders_enabled,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn doctor_row(id: &Uuid) -> serde_json::Value {
        json!({
            "id": id,
            "full_name": "Dr. Test",
            "specialty": "General Practice",
            "is_available": true
        })
    }

    pub fn notification_row(
        id: &Uuid,
        appointment_id: &Uuid,
        kind: &str,
        status: &str,
        send_at: DateTime<Utc>,
        claimed_at: Option<DateTime<Utc>>,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "appointment_id": appointment_id,
            "kind": kind,
            "status": status,
            "send_at": format_ts(send_at),
            "claimed_at": claimed_at.map(format_ts),
            "sent_at": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }
}
