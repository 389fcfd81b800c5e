//! Contact form validation.
//!
//! Fields are checked in form order and the first failure is reported, so a
//! client can focus the offending input.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z ]{2,30}$").unwrap());
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$").unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10,15}$").unwrap());
static AGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:1[01][0-9]|120|[1-9][0-9]?)$").unwrap());
static PASSWORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{6,}$").unwrap());

pub const SUBMITTED: &str = "Form submitted successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContactError {
    #[error("Enter a valid name (letters only, 2-30 chars).")]
    Name,
    #[error("Enter a valid email address.")]
    Email,
    #[error("Enter a valid phone number (10-15 digits).")]
    Phone,
    #[error("Enter a valid age (1-120).")]
    Age,
    #[error("Password must be at least 6 characters with letters and numbers.")]
    Password,
    #[error("Passwords do not match.")]
    PasswordMismatch,
}

impl ContactError {
    /// Form field to focus.
    pub fn field(&self) -> &'static str {
        match self {
            ContactError::Name => "name",
            ContactError::Email => "email",
            ContactError::Phone => "phone",
            ContactError::Age => "age",
            ContactError::Password => "password",
            ContactError::PasswordMismatch => "repassword",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: String,
    pub password: String,
    pub repassword: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<(), ContactError> {
        if !NAME_RE.is_match(&self.name) {
            return Err(ContactError::Name);
        }
        if !EMAIL_RE.is_match(&self.email) {
            return Err(ContactError::Email);
        }
        if !PHONE_RE.is_match(&self.phone) {
            return Err(ContactError::Phone);
        }
        if !AGE_RE.is_match(&self.age) {
            return Err(ContactError::Age);
        }
        if !is_strong_password(&self.password) {
            return Err(ContactError::Password);
        }
        if self.password != self.repassword {
            return Err(ContactError::PasswordMismatch);
        }
        Ok(())
    }

    /// Validates and, on success, clears every field.
    pub fn submit(&mut self) -> Result<(), ContactError> {
        self.validate()?;
        *self = Self::default();
        Ok(())
    }
}

fn is_strong_password(password: &str) -> bool {
    PASSWORD_RE.is_match(password)
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ContactForm {
        ContactForm {
            name: "Ada Lovelace".to_string(),
            email: "ada.l+films@example.co.uk".to_string(),
            phone: "01012345678".to_string(),
            age: "36".to_string(),
            password: "engine42".to_string(),
            repassword: "engine42".to_string(),
        }
    }

    fn with(f: impl FnOnce(&mut ContactForm)) -> ContactForm {
        let mut form = valid();
        f(&mut form);
        form
    }

    #[test]
    fn accepts_valid_form_and_resets() {
        let mut form = valid();
        assert_eq!(form.submit(), Ok(()));
        assert_eq!(form, ContactForm::default());
    }

    #[test]
    fn failed_submit_keeps_input() {
        let mut form = with(|f| f.phone = "123".to_string());
        assert_eq!(form.submit(), Err(ContactError::Phone));
        assert_eq!(form.name, "Ada Lovelace");
    }

    #[test]
    fn name_rules() {
        let too_long = "a".repeat(31);
        for bad in ["A", "R2D2", "Jean-Luc", too_long.as_str(), ""] {
            assert_eq!(
                with(|f| f.name = bad.to_string()).validate(),
                Err(ContactError::Name),
                "{bad:?}"
            );
        }
        let longest = "b".repeat(30);
        for good in ["Al", longest.as_str(), "Mary Jane Watson"] {
            assert!(with(|f| f.name = good.to_string()).validate().is_ok(), "{good:?}");
        }
    }

    #[test]
    fn email_rules() {
        for bad in ["plain", "a@b", "a@b.c", "a b@c.com", "@example.com"] {
            assert_eq!(
                with(|f| f.email = bad.to_string()).validate(),
                Err(ContactError::Email),
                "{bad:?}"
            );
        }
        assert!(with(|f| f.email = "USER@Example.COM".to_string())
            .validate()
            .is_ok());
    }

    #[test]
    fn phone_rules() {
        for bad in ["123456789", "1234567890123456", "012-345-6789", "+201012345678"] {
            assert_eq!(
                with(|f| f.phone = bad.to_string()).validate(),
                Err(ContactError::Phone),
                "{bad:?}"
            );
        }
        for good in ["1234567890", "123456789012345"] {
            assert!(with(|f| f.phone = good.to_string()).validate().is_ok());
        }
    }

    #[test]
    fn age_rules() {
        for bad in ["0", "121", "-1", "007", "abc", "", "1.5"] {
            assert_eq!(
                with(|f| f.age = bad.to_string()).validate(),
                Err(ContactError::Age),
                "{bad:?}"
            );
        }
        for good in ["1", "9", "10", "99", "100", "119", "120"] {
            assert!(with(|f| f.age = good.to_string()).validate().is_ok(), "{good:?}");
        }
    }

    #[test]
    fn password_rules() {
        for bad in ["abc12", "abcdef", "123456", "abc 123", "abc_123"] {
            let form = with(|f| {
                f.password = bad.to_string();
                f.repassword = bad.to_string();
            });
            assert_eq!(form.validate(), Err(ContactError::Password), "{bad:?}");
        }
        let mismatch = with(|f| f.repassword = "engine43".to_string());
        assert_eq!(mismatch.validate(), Err(ContactError::PasswordMismatch));
        assert_eq!(ContactError::PasswordMismatch.field(), "repassword");
    }

    #[test]
    fn reports_first_failing_field() {
        let form = ContactForm::default();
        assert_eq!(form.validate(), Err(ContactError::Name));
        let form = with(|f| {
            f.email = "nope".to_string();
            f.age = "500".to_string();
        });
        assert_eq!(form.validate(), Err(ContactError::Email));
    }
}
