//! services/client/src/adapters/biometric.rs
//!
//! Biometric prompt adapter for hosts without a platform biometric API.
//! Mobile shells inject their own `BiometricAuthenticator`; this one reports
//! the hardware as absent so the fast path fails terminally.

use async_trait::async_trait;
use talent_core::ports::{BiometricAuthenticator, BiometricResult};

pub struct UnsupportedBiometric;

#[async_trait]
impl BiometricAuthenticator for UnsupportedBiometric {
    fn is_available(&self) -> bool {
        false
    }

    fn is_enrolled(&self) -> bool {
        false
    }

    async fn authenticate(&self, _reason: &str) -> BiometricResult {
        BiometricResult::NotAvailable
    }
}
