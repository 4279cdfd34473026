use crate::session::UserSession;

/// Top-level authentication phase. Exactly one is active at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthPhase {
    #[default]
    Initial,
    LoggingIn,
    Authenticated(UserSession),
}

/// Transition input for the authentication lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthTransition {
    /// Session found in durable storage at process start.
    Restored(UserSession),
    ShowLogin,
    Back,
    CredentialsAccepted(UserSession),
    /// The credential service failed; the form stays on screen.
    CredentialsRejected,
    Logout,
}

/// Rejection reason for illegal auth transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    IllegalTransition {
        from: &'static str,
        transition: &'static str,
    },
}

pub type AuthTransitionResult = Result<AuthPhase, AuthRejection>;

impl AuthTransition {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Restored(_) => "restored",
            Self::ShowLogin => "show-login",
            Self::Back => "back",
            Self::CredentialsAccepted(_) => "credentials-accepted",
            Self::CredentialsRejected => "credentials-rejected",
            Self::Logout => "logout",
        }
    }
}

impl AuthPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::LoggingIn => "logging-in",
            Self::Authenticated(_) => "authenticated",
        }
    }

    pub fn session(&self) -> Option<&UserSession> {
        match self {
            Self::Authenticated(session) => Some(session),
            Self::Initial | Self::LoggingIn => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Applies one transition deterministically.
    ///
    /// `Restored` is only valid from `Initial`, credential outcomes only from
    /// `LoggingIn`, and `Logout` only from `Authenticated`.
    pub fn apply(&self, transition: AuthTransition) -> AuthTransitionResult {
        match (self, transition) {
            (Self::Initial, AuthTransition::Restored(session)) => Ok(Self::Authenticated(session)),
            (Self::Initial, AuthTransition::ShowLogin) => Ok(Self::LoggingIn),
            (Self::LoggingIn, AuthTransition::Back) => Ok(Self::Initial),
            (Self::LoggingIn, AuthTransition::CredentialsAccepted(session)) => {
                Ok(Self::Authenticated(session))
            }
            (Self::LoggingIn, AuthTransition::CredentialsRejected) => Ok(Self::LoggingIn),
            (Self::Authenticated(_), AuthTransition::Logout) => Ok(Self::Initial),
            (current, transition) => Err(AuthRejection::IllegalTransition {
                from: current.name(),
                transition: transition.name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::session::{SessionPreferences, SubscriptionTier};

    fn session() -> UserSession {
        UserSession {
            id: "user_123".to_string(),
            email: "a@b.com".to_string(),
            display_name: "Ada".to_string(),
            avatar_ref: None,
            subscription_tier: SubscriptionTier::Free,
            last_login_at: Utc::now(),
            preferences: SessionPreferences {
                remember_login: false,
            },
        }
    }

    #[test]
    fn login_round_trip_follows_the_phase_graph() {
        let phase = AuthPhase::Initial;
        let phase = phase.apply(AuthTransition::ShowLogin).unwrap();
        assert_eq!(phase, AuthPhase::LoggingIn);

        let phase = phase.apply(AuthTransition::CredentialsRejected).unwrap();
        assert_eq!(phase, AuthPhase::LoggingIn);

        let phase = phase
            .apply(AuthTransition::CredentialsAccepted(session()))
            .unwrap();
        assert!(phase.is_authenticated());

        let phase = phase.apply(AuthTransition::Logout).unwrap();
        assert_eq!(phase, AuthPhase::Initial);
    }

    #[test]
    fn back_returns_to_initial() {
        let phase = AuthPhase::LoggingIn.apply(AuthTransition::Back).unwrap();

        assert_eq!(phase, AuthPhase::Initial);
    }

    #[test]
    fn restore_skips_the_login_phase() {
        let phase = AuthPhase::Initial
            .apply(AuthTransition::Restored(session()))
            .unwrap();

        assert_eq!(phase.session().map(|s| s.id.as_str()), Some("user_123"));
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        assert_eq!(
            AuthPhase::Initial.apply(AuthTransition::Logout),
            Err(AuthRejection::IllegalTransition {
                from: "initial",
                transition: "logout",
            })
        );
        assert!(
            AuthPhase::Initial
                .apply(AuthTransition::CredentialsAccepted(session()))
                .is_err()
        );
        assert!(
            AuthPhase::Authenticated(session())
                .apply(AuthTransition::ShowLogin)
                .is_err()
        );
    }
}
