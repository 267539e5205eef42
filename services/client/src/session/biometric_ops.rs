//! Biometric fast-path operations for the session manager.

use talent_core::domain::Session;
use talent_core::ports::BiometricResult;
use tracing::{info, warn};

use crate::error::SessionError;
use crate::session::manager::SessionManager;

pub const BIOMETRIC_ENABLED_KEY: &str = "biometricEnabled";
pub const BIOMETRIC_IDENTITY_KEY: &str = "biometricIdentity";
pub const BIOMETRIC_SECRET_KEY: &str = "biometricSecret";

impl SessionManager {
    /// Saves the identity+secret pair after a successful password login.
    pub(crate) async fn remember_credentials(&self, identity: &str, secret: &str) {
        let stored = async {
            self.secure.set(BIOMETRIC_IDENTITY_KEY, identity).await?;
            self.secure.set(BIOMETRIC_SECRET_KEY, secret).await
        };
        if let Err(e) = stored.await {
            warn!(error = %e, "Failed to save credentials for biometric login");
        }
    }

    pub async fn biometric_enabled(&self) -> bool {
        matches!(
            self.secure.get(BIOMETRIC_ENABLED_KEY).await,
            Ok(Some(flag)) if flag == "true"
        )
    }

    fn check_hardware(&self) -> Result<(), SessionError> {
        if !self.biometric.is_available() {
            return Err(SessionError::BiometricUnavailable);
        }
        if !self.biometric.is_enrolled() {
            return Err(SessionError::BiometricNotEnrolled);
        }
        Ok(())
    }

    async fn prompt(&self, reason: &str) -> Result<(), SessionError> {
        match self.biometric.authenticate(reason).await {
            BiometricResult::Success => Ok(()),
            BiometricResult::Cancelled => Err(SessionError::BiometricCancelled),
            BiometricResult::NotAvailable => Err(SessionError::BiometricUnavailable),
            BiometricResult::NotEnrolled => Err(SessionError::BiometricNotEnrolled),
            BiometricResult::Failed(reason) => Err(SessionError::BiometricFailed(reason)),
        }
    }

    /// Turns the fast path on after a confirming prompt.
    pub async fn enable_biometric_fast_path(&self) -> Result<(), SessionError> {
        let enabled = async {
            self.check_hardware()?;
            self.prompt("Confirm to enable biometric login").await?;
            self.secure.set(BIOMETRIC_ENABLED_KEY, "true").await?;
            Ok::<(), SessionError>(())
        };
        match enabled.await {
            Ok(()) => {
                info!("Biometric login enabled");
                Ok(())
            }
            Err(e) => self.report(e),
        }
    }

    /// Turns the fast path off and forgets the stored pair.
    pub async fn disable_biometric_fast_path(&self) -> Result<(), SessionError> {
        for key in [
            BIOMETRIC_ENABLED_KEY,
            BIOMETRIC_IDENTITY_KEY,
            BIOMETRIC_SECRET_KEY,
        ] {
            self.secure.remove(key).await?;
        }
        info!("Biometric login disabled");
        Ok(())
    }

    /// Prompts, then replays a password login with the stored pair.
    ///
    /// Missing hardware, a disabled fast path and a missing pair are terminal;
    /// nothing is retried.
    pub async fn attempt_biometric_login(&self) -> Result<Session, SessionError> {
        let credentials = async {
            self.check_hardware()?;
            if !self.biometric_enabled().await {
                return Err(SessionError::BiometricNotEnabled);
            }
            let identity = self.secure.get(BIOMETRIC_IDENTITY_KEY).await?;
            let secret = self.secure.get(BIOMETRIC_SECRET_KEY).await?;
            let (Some(identity), Some(secret)) = (identity, secret) else {
                return Err(SessionError::NoStoredCredentials);
            };
            self.prompt("Sign in").await?;
            Ok::<_, SessionError>((identity, secret))
        };

        match credentials.await {
            Ok((identity, secret)) => self.login(&identity, &secret).await,
            Err(e) => self.report(e),
        }
    }

    fn report<T>(&self, err: SessionError) -> Result<T, SessionError> {
        if !matches!(err, SessionError::BiometricCancelled) {
            warn!(error = %err, "Biometric login unavailable");
        }
        self.fail(err)
    }
}
