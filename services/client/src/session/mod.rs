pub mod biometric_ops;
pub mod manager;
pub mod notice;
pub mod signal;

pub use manager::{SessionManager, AUTH_TOKEN_KEY, USER_KEY};
pub use notice::Notice;
pub use signal::{AuthPhase, SessionSignal, SessionStatus};
