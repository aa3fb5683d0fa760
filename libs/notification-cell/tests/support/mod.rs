#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use notification_cell::error::{MailerError, NotificationError};
use notification_cell::models::{ReminderContext, ReminderSettings};
use notification_cell::services::{AppointmentDirectory, Clock, Mailer};

/// Clock fixed at a chosen instant, so send times and store queries are
/// predictable.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// In-memory subject provider with a fixed set of contexts.
pub struct StaticDirectory {
    contexts: HashMap<Uuid, ReminderContext>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self { contexts: HashMap::new() }
    }

    pub fn with_context(mut self, context: ReminderContext) -> Self {
        self.contexts.insert(context.appointment_id, context);
        self
    }
}

#[async_trait]
impl AppointmentDirectory for StaticDirectory {
    async fn reminder_context(
        &self,
        appointment_id: Uuid,
    ) -> Result<ReminderContext, NotificationError> {
        self.contexts
            .get(&appointment_id)
            .cloned()
            .ok_or(NotificationError::SubjectNotFound(appointment_id))
    }
}

/// Transport double with programmable failures: the first `fail_first`
/// calls fail, and any destination in `fail_destinations` always fails.
pub struct ScriptedMailer {
    calls: AtomicU32,
    fail_first: u32,
    fail_destinations: Vec<String>,
}

impl ScriptedMailer {
    pub fn succeeding() -> Self {
        Self { calls: AtomicU32::new(0), fail_first: 0, fail_destinations: Vec::new() }
    }

    pub fn failing_first(n: u32) -> Self {
        Self { calls: AtomicU32::new(0), fail_first: n, fail_destinations: Vec::new() }
    }

    pub fn failing_for(destination: &str) -> Self {
        Self {
            calls: AtomicU32::new(0),
            fail_first: 0,
            fail_destinations: vec![destination.to_string()],
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Mailer for ScriptedMailer {
    async fn send(&self, to: &str, _subject: &str, _body: &str) -> Result<(), MailerError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.fail_first || self.fail_destinations.iter().any(|d| d == to) {
            return Err(MailerError::Api {
                status: 503,
                message: "mail service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

/// Default settings with backoff shrunk so retry tests run in milliseconds.
pub fn test_settings() -> ReminderSettings {
    ReminderSettings {
        backoff_base_ms: 1,
        backoff_cap_ms: 5,
        ..ReminderSettings::default()
    }
}

pub fn context_for(
    appointment_id: Uuid,
    starts_at: DateTime<Utc>,
    email: Option<&str>,
) -> ReminderContext {
    ReminderContext {
        appointment_id,
        starts_at,
        patient_name: "Test Patient".to_string(),
        patient_email: email.map(|e| e.to_string()),
        patient_phone: None,
        online_reminders_enabled: true,
        doctor_name: "Dr. Test".to_string(),
        patient_note: Some("Please bring previous test results".to_string()),
    }
}
