pub mod appointments;
pub mod clock;
pub mod delivery;
pub mod dispatcher;
pub mod mailer;
pub mod scheduler;
pub mod store;

pub use appointments::{AppointmentDirectory, SupabaseAppointmentDirectory};
pub use clock::{Clock, SystemClock};
pub use delivery::DeliveryWorker;
pub use dispatcher::ReminderDispatchService;
pub use mailer::{HttpMailer, Mailer};
pub use scheduler::ReminderSchedulingService;
pub use store::NotificationStore;
