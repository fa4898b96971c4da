pub mod controller;
pub mod notification;
pub mod timeline;

pub use controller::{active_incident, DashboardController, DashboardState};
pub use notification::{Notification, NotificationKind};
pub use timeline::TimelineDay;
