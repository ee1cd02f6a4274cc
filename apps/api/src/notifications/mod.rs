pub mod dispatcher;
pub mod handlers;
pub mod mentions;
pub mod retry;

pub use dispatcher::{NotificationDispatcher, NotifyError};
pub use retry::RetryPolicy;
