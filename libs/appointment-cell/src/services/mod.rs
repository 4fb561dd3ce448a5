pub mod booking;
pub mod dispatch;
pub mod notification;
pub mod reminder;
pub mod store;

pub use booking::BookingService;
pub use dispatch::{DispatchConfig, DispatchHandle, ReminderDispatcher};
pub use notification::{
    LogNotificationSender, NotificationSender, RecordingNotificationSender, WebhookNotificationSender,
};
pub use reminder::ReminderScheduler;
pub use store::AppointmentStore;
