use thiserror::Error;
use uuid::Uuid;

use crate::models::NotificationKind;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Appointment {0} not found")]
    SubjectNotFound(Uuid),

    #[error("Invalid notification data: {0}")]
    InvalidRecord(String),
}

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("Mail API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Mail transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mailer is not configured")]
    NotConfigured,
}

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("No destination on file for {0} delivery")]
    MissingDestination(NotificationKind),

    #[error("Delivery attempt failed: {0}")]
    Transport(#[from] MailerError),

    #[error("Delivery failed after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("Could not resolve appointment data: {0}")]
    Subject(#[from] NotificationError),
}
