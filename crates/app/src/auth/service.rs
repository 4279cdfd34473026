use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use snafu::Snafu;

use super::validation::{LoginForm, RegistrationForm};
use crate::session::{SessionPreferences, SubscriptionTier, UserSession};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub const SIGNED_IN_USER_ID: &str = "user_123";
pub const SIGNED_IN_DISPLAY_NAME: &str = "Thanh Trúc";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CredentialError {
    #[snafu(display("credential service unavailable during {operation}"))]
    ServiceUnavailable {
        stage: &'static str,
        operation: &'static str,
    },
}

/// Turns submitted forms into sessions. Forms are validated before this is called.
pub trait CredentialService: Send + Sync {
    fn sign_in<'a>(&'a self, form: &'a LoginForm) -> BoxFuture<'a, Result<UserSession, CredentialError>>;
    fn register<'a>(
        &'a self,
        form: &'a RegistrationForm,
    ) -> BoxFuture<'a, Result<UserSession, CredentialError>>;
}

/// Accepts any validated credentials after a fixed latency.
pub struct SimulatedCredentialService {
    sign_in_latency: Duration,
    registration_latency: Duration,
    fail_next: AtomicBool,
}

impl SimulatedCredentialService {
    pub fn new(sign_in_latency: Duration, registration_latency: Duration) -> Self {
        Self {
            sign_in_latency,
            registration_latency,
            fail_next: AtomicBool::new(false),
        }
    }

    /// Makes the next call fail with `ServiceUnavailable`.
    pub fn fail_next_call(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn take_failure(&self) -> bool {
        self.fail_next.swap(false, Ordering::SeqCst)
    }
}

impl CredentialService for SimulatedCredentialService {
    fn sign_in<'a>(&'a self, form: &'a LoginForm) -> BoxFuture<'a, Result<UserSession, CredentialError>> {
        Box::pin(async move {
            tokio::time::sleep(self.sign_in_latency).await;
            if self.take_failure() {
                return ServiceUnavailableSnafu {
                    stage: "simulated-sign-in",
                    operation: "sign-in",
                }
                .fail();
            }

            Ok(UserSession {
                id: SIGNED_IN_USER_ID.to_string(),
                email: form.email.clone(),
                display_name: SIGNED_IN_DISPLAY_NAME.to_string(),
                avatar_ref: None,
                subscription_tier: SubscriptionTier::Premium,
                last_login_at: Utc::now(),
                preferences: SessionPreferences {
                    remember_login: form.remember_me,
                },
            })
        })
    }

    fn register<'a>(
        &'a self,
        form: &'a RegistrationForm,
    ) -> BoxFuture<'a, Result<UserSession, CredentialError>> {
        Box::pin(async move {
            tokio::time::sleep(self.registration_latency).await;
            if self.take_failure() {
                return ServiceUnavailableSnafu {
                    stage: "simulated-register",
                    operation: "registration",
                }
                .fail();
            }

            let now = Utc::now();
            Ok(UserSession {
                id: format!("user_new_{}", now.timestamp_millis()),
                email: form.email.clone(),
                display_name: form.name.clone(),
                avatar_ref: None,
                subscription_tier: SubscriptionTier::Free,
                last_login_at: now,
                preferences: SessionPreferences {
                    remember_login: false,
                },
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> SimulatedCredentialService {
        SimulatedCredentialService::new(Duration::from_millis(1_500), Duration::from_millis(2_000))
    }

    #[tokio::test(start_paused = true)]
    async fn sign_in_waits_for_latency_and_carries_remember_flag() {
        let service = service();
        let form = LoginForm::new("a@b.com", "secret", true);
        let started = tokio::time::Instant::now();

        let session = service.sign_in(&form).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(1_500));
        assert_eq!(session.id, SIGNED_IN_USER_ID);
        assert_eq!(session.email, "a@b.com");
        assert!(session.remember_flag());
    }

    #[tokio::test(start_paused = true)]
    async fn registration_creates_free_tier_session() {
        let form = RegistrationForm {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "secret".to_string(),
            confirm_password: "secret".to_string(),
            agree_to_terms: true,
        };

        let session = service().register(&form).await.unwrap();

        assert!(session.id.starts_with("user_new_"));
        assert_eq!(session.display_name, "Ada");
        assert_eq!(session.subscription_tier, SubscriptionTier::Free);
        assert!(!session.remember_flag());
    }

    #[tokio::test(start_paused = true)]
    async fn injected_failure_applies_to_one_call() {
        let service = service();
        let form = LoginForm::new("a@b.com", "secret", false);
        service.fail_next_call();

        assert!(matches!(
            service.sign_in(&form).await,
            Err(CredentialError::ServiceUnavailable { .. })
        ));
        assert!(service.sign_in(&form).await.is_ok());
    }
}
