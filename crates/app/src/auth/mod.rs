/// Phase transitions for sign-in.
pub mod machine;
/// Simulated credential checks.
pub mod service;
/// Form preconditions.
pub mod validation;

pub use machine::{AuthPhase, AuthRejection, AuthTransition, AuthTransitionResult};
pub use service::{BoxFuture, CredentialError, CredentialService, SimulatedCredentialService};
pub use validation::{LoginForm, RegistrationForm, ValidationError};
