use snafu::{Snafu, ensure};

/// A user input precondition that failed. Nothing is mutated when one is raised.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ValidationError {
    #[snafu(display("Please enter both email and password"))]
    MissingCredentials { stage: &'static str },
    #[snafu(display("Please fill in all fields"))]
    MissingRegistrationFields { stage: &'static str },
    #[snafu(display("Password confirmation does not match"))]
    PasswordMismatch { stage: &'static str },
    #[snafu(display("Password must be at least {min} characters"))]
    PasswordTooShort { stage: &'static str, min: usize },
    #[snafu(display("Please agree to the terms of use"))]
    TermsNotAccepted { stage: &'static str },
    #[snafu(display("Message is {len} characters, the limit is {max}"))]
    MessageTooLong {
        stage: &'static str,
        len: usize,
        max: usize,
    },
    #[snafu(display("Please enter a knowledge base name"))]
    MissingKnowledgeBaseName { stage: &'static str },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub remember_me: bool,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>, remember_me: bool) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            remember_me,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure!(
            !self.email.is_empty() && !self.password.is_empty(),
            MissingCredentialsSnafu {
                stage: "login-required-fields",
            }
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub agree_to_terms: bool,
}

impl RegistrationForm {
    /// Checks run in a fixed order and the first failure wins:
    /// required fields, password match, minimum length, terms.
    pub fn validate(&self, min_password_len: usize) -> Result<(), ValidationError> {
        ensure!(
            !self.name.is_empty()
                && !self.email.is_empty()
                && !self.password.is_empty()
                && !self.confirm_password.is_empty(),
            MissingRegistrationFieldsSnafu {
                stage: "register-required-fields",
            }
        );
        ensure!(
            self.password == self.confirm_password,
            PasswordMismatchSnafu {
                stage: "register-password-match",
            }
        );
        ensure!(
            self.password.chars().count() >= min_password_len,
            PasswordTooShortSnafu {
                stage: "register-password-length",
                min: min_password_len,
            }
        );
        ensure!(
            self.agree_to_terms,
            TermsNotAcceptedSnafu {
                stage: "register-terms",
            }
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> RegistrationForm {
        RegistrationForm {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "secret".to_string(),
            confirm_password: "secret".to_string(),
            agree_to_terms: true,
        }
    }

    #[test]
    fn login_needs_email_and_password() {
        assert!(matches!(
            LoginForm::new("", "secret", false).validate(),
            Err(ValidationError::MissingCredentials { .. })
        ));
        assert!(matches!(
            LoginForm::new("a@b.com", "", false).validate(),
            Err(ValidationError::MissingCredentials { .. })
        ));
        assert!(LoginForm::new("a@b.com", "secret", true).validate().is_ok());
    }

    #[test]
    fn valid_registration_passes() {
        assert!(registration().validate(6).is_ok());
    }

    #[test]
    fn first_failing_check_wins() {
        // Mismatch and too short and no terms: mismatch is reported.
        let form = RegistrationForm {
            password: "abc".to_string(),
            confirm_password: "abd".to_string(),
            agree_to_terms: false,
            ..registration()
        };
        assert!(matches!(
            form.validate(6),
            Err(ValidationError::PasswordMismatch { .. })
        ));

        let form = RegistrationForm {
            name: String::new(),
            password: "abc".to_string(),
            ..registration()
        };
        assert!(matches!(
            form.validate(6),
            Err(ValidationError::MissingRegistrationFields { .. })
        ));

        let form = RegistrationForm {
            password: "abc".to_string(),
            confirm_password: "abc".to_string(),
            agree_to_terms: false,
            ..registration()
        };
        assert_eq!(
            form.validate(6),
            Err(ValidationError::PasswordTooShort {
                stage: "register-password-length",
                min: 6,
            })
        );

        let form = RegistrationForm {
            agree_to_terms: false,
            ..registration()
        };
        assert!(matches!(
            form.validate(6),
            Err(ValidationError::TermsNotAccepted { .. })
        ));
    }
}
