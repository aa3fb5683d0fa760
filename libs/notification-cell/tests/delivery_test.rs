mod support;

use std::sync::Arc;
use std::time::Duration as StdDuration;
use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use notification_cell::error::DeliveryError;
use notification_cell::models::{
    NotificationKind, NotificationRecord, NotificationStatus, ReminderSettings,
};
use notification_cell::services::DeliveryWorker;

use support::{context_for, test_settings, ScriptedMailer, StaticDirectory};

fn claimed_record(appointment_id: Uuid, kind: NotificationKind) -> NotificationRecord {
    let now = Utc.with_ymd_and_hms(2025, 3, 11, 9, 30, 0).unwrap();
    NotificationRecord {
        id: Uuid::new_v4(),
        appointment_id,
        kind,
        status: NotificationStatus::Claimed,
        send_at: now - Duration::minutes(30),
        claimed_at: Some(now),
        sent_at: None,
        created_at: now - Duration::days(1),
        updated_at: now,
    }
}

#[tokio::test]
async fn delivery_succeeds_after_transient_failures() {
    let appointment_id = Uuid::new_v4();
    let directory = StaticDirectory::new().with_context(context_for(
        appointment_id,
        Utc.with_ymd_and_hms(2025, 3, 12, 9, 30, 0).unwrap(),
        Some("patient@example.com"),
    ));
    let mailer = Arc::new(ScriptedMailer::failing_first(2));

    let worker = DeliveryWorker::new(Arc::new(directory), mailer.clone(), test_settings());
    let record = claimed_record(appointment_id, NotificationKind::EmailReminder);

    worker
        .deliver(&record)
        .await
        .expect("third attempt should succeed");
    assert_eq!(mailer.call_count(), 3);
}

#[tokio::test]
async fn delivery_exhausts_after_max_attempts() {
    let appointment_id = Uuid::new_v4();
    let directory = StaticDirectory::new().with_context(context_for(
        appointment_id,
        Utc.with_ymd_and_hms(2025, 3, 12, 9, 30, 0).unwrap(),
        Some("patient@example.com"),
    ));
    let mailer = Arc::new(ScriptedMailer::failing_first(10));

    let worker = DeliveryWorker::new(Arc::new(directory), mailer.clone(), test_settings());
    let record = claimed_record(appointment_id, NotificationKind::EmailReminder);

    let result = worker.deliver(&record).await;
    assert_matches!(result, Err(DeliveryError::Exhausted { attempts: 3 }));
    assert_eq!(mailer.call_count(), 3);
}

#[tokio::test]
async fn missing_destination_fails_without_touching_the_transport() {
    let appointment_id = Uuid::new_v4();
    let directory = StaticDirectory::new().with_context(context_for(
        appointment_id,
        Utc.with_ymd_and_hms(2025, 3, 12, 9, 30, 0).unwrap(),
        None,
    ));
    let mailer = Arc::new(ScriptedMailer::succeeding());

    let worker = DeliveryWorker::new(Arc::new(directory), mailer.clone(), test_settings());
    let record = claimed_record(appointment_id, NotificationKind::EmailReminder);

    let result = worker.deliver(&record).await;
    assert_matches!(
        result,
        Err(DeliveryError::MissingDestination(NotificationKind::EmailReminder))
    );
    assert_eq!(mailer.call_count(), 0);
}

#[tokio::test]
async fn sms_kinds_deliver_to_the_phone_number() {
    let appointment_id = Uuid::new_v4();
    let mut context = context_for(
        appointment_id,
        Utc.with_ymd_and_hms(2025, 3, 12, 9, 30, 0).unwrap(),
        None,
    );
    context.patient_phone = Some("+33612345678".to_string());

    let directory = StaticDirectory::new().with_context(context);
    let mailer = Arc::new(ScriptedMailer::succeeding());

    let worker = DeliveryWorker::new(Arc::new(directory), mailer.clone(), test_settings());
    let record = claimed_record(appointment_id, NotificationKind::SmsReminder);

    worker
        .deliver(&record)
        .await
        .expect("sms delivery should use the phone number");
    assert_eq!(mailer.call_count(), 1);
}

#[tokio::test]
async fn backoff_doubles_per_attempt_and_caps() {
    let directory = StaticDirectory::new();
    let mailer = Arc::new(ScriptedMailer::succeeding());
    let worker = DeliveryWorker::new(Arc::new(directory), mailer, ReminderSettings::default());

    assert_eq!(worker.backoff_delay(1), StdDuration::from_millis(1000));
    assert_eq!(worker.backoff_delay(2), StdDuration::from_millis(2000));
    assert_eq!(worker.backoff_delay(3), StdDuration::from_millis(4000));
    assert_eq!(worker.backoff_delay(4), StdDuration::from_millis(5000));
    assert_eq!(worker.backoff_delay(10), StdDuration::from_millis(5000));
}
