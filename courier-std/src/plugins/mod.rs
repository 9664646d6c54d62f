//! Standard plugins.

pub mod logging;
pub mod retry;
pub mod throttle;
pub mod validation;

#[cfg(feature = "time")]
pub mod debounce;
#[cfg(feature = "time")]
pub mod timeout;

pub use logging::LoggingPlugin;
pub use retry::{RetryPlugin, RetryPolicy};
pub use throttle::ThrottlePlugin;
pub use validation::ValidationPlugin;

#[cfg(feature = "time")]
pub use debounce::DebouncePlugin;
#[cfg(feature = "time")]
pub use timeout::TimeoutPlugin;
