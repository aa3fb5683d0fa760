// libs/notification-cell/src/services/delivery.rs
use std::cmp;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use crate::error::DeliveryError;
use crate::models::{NotificationKind, NotificationRecord, ReminderContext, ReminderSettings};
use crate::services::appointments::AppointmentDirectory;
use crate::services::mailer::Mailer;

/// Renders and sends one claimed notification with bounded retries. Status
/// bookkeeping stays with the dispatcher; this only reports the outcome.
pub struct DeliveryWorker {
    directory: Arc<dyn AppointmentDirectory>,
    mailer: Arc<dyn Mailer>,
    settings: ReminderSettings,
}

impl DeliveryWorker {
    pub fn new(
        directory: Arc<dyn AppointmentDirectory>,
        mailer: Arc<dyn Mailer>,
        settings: ReminderSettings,
    ) -> Self {
        Self { directory, mailer, settings }
    }

    pub async fn deliver(&self, record: &NotificationRecord) -> Result<(), DeliveryError> {
        let context = self.directory.reminder_context(record.appointment_id).await?;

        let destination = match record.kind {
            NotificationKind::EmailReminder => context.patient_email.clone(),
            NotificationKind::SmsReminder | NotificationKind::WhatsappConfirmation => {
                context.patient_phone.clone()
            }
        };
        let destination = match destination {
            Some(d) => d,
            None => return Err(DeliveryError::MissingDestination(record.kind.clone())),
        };

        let (subject, body) = render_message(&record.kind, &context);

        let max_attempts = self.settings.max_delivery_attempts;
        for attempt in 1..=max_attempts {
            match self.mailer.send(&destination, &subject, &body).await {
                Ok(()) => {
                    debug!("Notification {} delivered on attempt {}", record.id, attempt);
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        "Delivery attempt {}/{} for notification {} failed: {}",
                        attempt, max_attempts, record.id, e
                    );
                    if attempt < max_attempts {
                        sleep(self.backoff_delay(attempt)).await;
                    }
                }
            }
        }

        Err(DeliveryError::Exhausted { attempts: max_attempts })
    }

    /// Delay before the attempt that follows `attempt` (1-based): doubles
    /// each time, capped.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let shift = cmp::min(attempt.saturating_sub(1), 16);
        let delay = self.settings.backoff_base_ms.saturating_mul(1u64 << shift);
        Duration::from_millis(cmp::min(delay, self.settings.backoff_cap_ms))
    }
}

fn render_message(kind: &NotificationKind, context: &ReminderContext) -> (String, String) {
    let when = context.starts_at.format("%A %e %B %Y at %H:%M UTC");

    match kind {
        NotificationKind::EmailReminder => (
            "Your appointment is coming up".to_string(),
            format!(
                "Hi {},\n\nThis is a reminder of your appointment with {} on {}.{}\n\nSee you soon,\nThe clinic team",
                context.patient_name, context.doctor_name, when, note_line(context)
            ),
        ),
        NotificationKind::SmsReminder => (
            "Appointment reminder".to_string(),
            format!(
                "Hi {}, a reminder of your appointment with {} on {}.",
                context.patient_name, context.doctor_name, when
            ),
        ),
        NotificationKind::WhatsappConfirmation => (
            "Appointment confirmed".to_string(),
            format!(
                "Hi {}, your appointment with {} on {} is confirmed.",
                context.patient_name, context.doctor_name, when
            ),
        ),
    }
}

fn note_line(context: &ReminderContext) -> String {
    match &context.patient_note {
        Some(note) if !note.is_empty() => format!("\n\nYour note: {}", note),
        _ => String::new(),
    }
}
