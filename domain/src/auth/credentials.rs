//! Sign-in and sign-up form values

use crate::core::error::DomainError;

fn required(field: &'static str, value: String) -> Result<String, DomainError> {
    if value.trim().is_empty() {
        Err(DomainError::MissingField(field))
    } else {
        Ok(value)
    }
}

/// Username/password pair exchanged for a [`SessionToken`](super::token::SessionToken)
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            username: required("username", username.into())?,
            password: required("password", password.into())?,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Registration form for a new account
#[derive(Clone, PartialEq, Eq)]
pub struct SignupForm {
    name: String,
    username: String,
    password: String,
}

impl SignupForm {
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            name: required("name", name.into())?,
            username: required("username", username.into())?,
            password: required("password", password.into())?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupForm")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_require_both_fields() {
        assert_eq!(
            Credentials::new("", "pw").unwrap_err(),
            DomainError::MissingField("username")
        );
        assert_eq!(
            Credentials::new("a@x.com", " ").unwrap_err(),
            DomainError::MissingField("password")
        );
        assert!(Credentials::new("a@x.com", "pw").is_ok());
    }

    #[test]
    fn test_signup_form_requires_name() {
        assert_eq!(
            SignupForm::new("", "a@x.com", "pw").unwrap_err(),
            DomainError::MissingField("name")
        );
    }

    #[test]
    fn test_debug_hides_password() {
        let creds = Credentials::new("a@x.com", "hunter2").unwrap();
        assert!(!format!("{:?}", creds).contains("hunter2"));

        let form = SignupForm::new("Ann", "a@x.com", "hunter2").unwrap();
        assert!(!format!("{:?}", form).contains("hunter2"));
    }
}
