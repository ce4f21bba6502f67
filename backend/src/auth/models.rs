//! Data structures for authentication-related entities.
//!
//! Form payloads for registration and login, and the validated account data
//! that the service persists.

use serde::{Deserialize, Serialize};

use super::errors::AuthError;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_NAME_LEN: usize = 80;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegisterForm {
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing)]
    pub confirm: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoginForm {
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
}

/// Registration data that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Lowercase and trim; require `local@domain.tld`.
pub fn normalize_email(raw: &str) -> Result<String, AuthError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if valid && !email.contains(char::is_whitespace) {
        Ok(email)
    } else {
        Err(AuthError::InvalidEmail)
    }
}

impl RegisterForm {
    pub fn validate(&self) -> Result<NewAccount, AuthError> {
        let email = normalize_email(&self.email)?;

        let name = self.name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(AuthError::InvalidName { max: MAX_NAME_LEN });
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }
        if self.password != self.confirm {
            return Err(AuthError::PasswordMismatch);
        }

        Ok(NewAccount {
            email,
            name: name.to_string(),
            password: self.password.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RegisterForm {
        RegisterForm {
            email: "  Ann@Example.COM ".to_string(),
            name: " Ann ".to_string(),
            password: "hunter2hunter2".to_string(),
            confirm: "hunter2hunter2".to_string(),
        }
    }

    #[test]
    fn test_valid_form_is_normalized() {
        let account = form().validate().unwrap();
        assert_eq!(account.email, "ann@example.com");
        assert_eq!(account.name, "Ann");
    }

    #[test]
    fn test_rejections() {
        let mut f = form();
        f.email = "ann.example.com".into();
        assert!(matches!(f.validate(), Err(AuthError::InvalidEmail)));

        let mut f = form();
        f.name = "   ".into();
        assert!(matches!(f.validate(), Err(AuthError::InvalidName { .. })));

        let mut f = form();
        f.password = "short".into();
        f.confirm = "short".into();
        assert!(matches!(f.validate(), Err(AuthError::WeakPassword { min: 8 })));

        let mut f = form();
        f.confirm = "something-else".into();
        assert!(matches!(f.validate(), Err(AuthError::PasswordMismatch)));
    }

    #[test]
    fn test_normalize_email_edge_cases() {
        assert!(normalize_email("a@b.c").is_ok());
        assert!(normalize_email("@b.c").is_err());
        assert!(normalize_email("a@.c").is_err());
        assert!(normalize_email("a@b.").is_err());
        assert!(normalize_email("a b@c.d").is_err());
    }
}
