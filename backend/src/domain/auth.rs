//! Authentication primitives: login credentials and registration passwords.
//!
//! Inbound adapters build these from raw strings before calling the account
//! service, so the service only sees validated values.

use std::fmt;

use zeroize::Zeroizing;

use super::EmailAddress;

/// Minimum password length accepted at registration.
pub const PASSWORD_MIN_LENGTH: usize = 6;

/// Domain error returned when credential payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialValidationError {
    /// Email was missing or malformed.
    InvalidEmail,
    /// Password was blank.
    EmptyPassword,
    /// Password is shorter than [`PASSWORD_MIN_LENGTH`].
    PasswordTooShort { min: usize },
}

impl fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "email must be a valid address"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
        }
    }
}

impl std::error::Error for CredentialValidationError {}

/// Plain-text password held only for the duration of a hash or verify call.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Accept any non-empty password (used for login).
    pub fn existing(raw: &str) -> Result<Self, CredentialValidationError> {
        if raw.is_empty() {
            return Err(CredentialValidationError::EmptyPassword);
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Accept a new password that meets the registration length rule.
    pub fn new_for_registration(raw: &str) -> Result<Self, CredentialValidationError> {
        if raw.chars().count() < PASSWORD_MIN_LENGTH {
            return Err(CredentialValidationError::PasswordTooShort {
                min: PASSWORD_MIN_LENGTH,
            });
        }
        Self::existing(raw)
    }

    /// Plain-text value.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Validated login credentials used by the account service.
///
/// # Examples
/// ```
/// use donor_backend::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Admin@Hospital.com", "admin123").unwrap();
/// assert_eq!(creds.email().as_ref(), "admin@hospital.com");
/// assert_eq!(creds.password().expose(), "admin123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Password,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialValidationError> {
        let email =
            EmailAddress::new(email).map_err(|_| CredentialValidationError::InvalidEmail)?;
        let password = Password::existing(password)?;
        Ok(Self { email, password })
    }

    /// Normalised email used for the user lookup.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password supplied by the caller.
    pub fn password(&self) -> &Password {
        &self.password
    }
}
