//! Field-level validation for user records.
//!
//! Rules run per field with `else if` precedence: at most one error per
//! field, fields evaluated independently, every applicable field error
//! collected. An empty list means the draft is valid.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const PASSWORD_MAX_LENGTH: usize = 50;

lazy_static! {
    static ref VALID_EMAIL_RE: Regex =
        Regex::new(r"(?i)^[A-Za-z0-9_+\-.]+@[a-z0-9\-.]+\.[a-z]+$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// The fields of a user record as submitted, before persistence.
#[derive(Debug, Default)]
pub struct UserDraft<'a> {
    pub email: &'a str,
    pub password: Option<&'a str>,
    pub password_confirmation: Option<&'a str>,
}

/// What the validator needs to know about the record's situation. The
/// `email_taken` flag is a read-then-decide check and therefore advisory;
/// the unique index on users.email is the final arbiter under concurrency.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext {
    pub is_new: bool,
    pub email_changed: bool,
    pub email_taken: bool,
}

pub fn validate(draft: &UserDraft, ctx: ValidationContext) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if ctx.is_new || ctx.email_changed {
        validate_email(draft, ctx, &mut errors);
    }
    if ctx.is_new || draft.password.map_or(false, |p| !p.is_empty()) {
        validate_password(draft, &mut errors);
    }

    errors
}

pub fn is_valid_email(email: &str) -> bool {
    VALID_EMAIL_RE.is_match(email)
}

fn validate_email(draft: &UserDraft, ctx: ValidationContext, errors: &mut Vec<FieldError>) {
    if draft.email.trim().is_empty() {
        errors.push(FieldError::new("email", "can't be blank"));
    } else if !is_valid_email(draft.email) {
        errors.push(FieldError::new("email", "looks like it might have a typo"));
    } else if ctx.email_taken {
        errors.push(FieldError::new("email", "address is already registered."));
    }
}

fn validate_password(draft: &UserDraft, errors: &mut Vec<FieldError>) {
    let password = draft.password.unwrap_or("");
    let len = password.chars().count();

    if password.is_empty() {
        errors.push(FieldError::new("password", "can't be blank"));
    } else if !(PASSWORD_MIN_LENGTH..=PASSWORD_MAX_LENGTH).contains(&len) {
        errors.push(FieldError::new(
            "password",
            "must be between 8 and 50 characters",
        ));
    } else if draft.password != draft.password_confirmation {
        errors.push(FieldError::new("password", "and confirmation do not match."));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEW: ValidationContext = ValidationContext {
        is_new: true,
        email_changed: false,
        email_taken: false,
    };

    fn draft<'a>(email: &'a str, password: &'a str, confirmation: &'a str) -> UserDraft<'a> {
        UserDraft {
            email,
            password: Some(password),
            password_confirmation: Some(confirmation),
        }
    }

    #[test]
    fn valid_signup_has_no_errors() {
        let d = draft("mcgonagol@hogwarts.com", "stupify123", "stupify123");
        assert!(validate(&d, NEW).is_empty());
    }

    #[test]
    fn blank_email_yields_exactly_the_blank_error() {
        let d = draft("   ", "stupify123", "stupify123");
        let errors = validate(&d, NEW);
        assert_eq!(errors, vec![FieldError::new("email", "can't be blank")]);
    }

    #[test]
    fn malformed_email_yields_the_typo_error() {
        for email in ["asfasd", "no-at-sign.com", "two@@at.com", "tld@missing"] {
            let errors = validate(&draft(email, "stupify123", "stupify123"), NEW);
            assert_eq!(
                errors,
                vec![FieldError::new("email", "looks like it might have a typo")],
                "email: {email}"
            );
        }
    }

    #[test]
    fn taken_email_yields_the_registered_error() {
        let ctx = ValidationContext {
            email_taken: true,
            ..NEW
        };
        let errors = validate(&draft("hagrid@eowls.com", "stupify123", "stupify123"), ctx);
        assert_eq!(
            errors,
            vec![FieldError::new("email", "address is already registered.")]
        );
    }

    #[test]
    fn blank_check_wins_over_uniqueness() {
        let ctx = ValidationContext {
            email_taken: true,
            ..NEW
        };
        let errors = validate(&draft("", "stupify123", "stupify123"), ctx);
        assert_eq!(errors, vec![FieldError::new("email", "can't be blank")]);
    }

    #[test]
    fn short_password_yields_only_the_length_error() {
        // confirmation also mismatches, but length has precedence
        let d = draft("hagrid@eowls.com", "stupify", "avadakedavra");
        let errors = validate(&d, NEW);
        assert_eq!(
            errors,
            vec![FieldError::new(
                "password",
                "must be between 8 and 50 characters"
            )]
        );
    }

    #[test]
    fn overlong_password_yields_the_length_error() {
        let long = "x".repeat(51);
        let errors = validate(&draft("hagrid@eowls.com", &long, &long), NEW);
        assert_eq!(
            errors,
            vec![FieldError::new(
                "password",
                "must be between 8 and 50 characters"
            )]
        );
    }

    #[test]
    fn boundary_lengths_are_accepted() {
        for len in [8usize, 50] {
            let p = "x".repeat(len);
            assert!(validate(&draft("hagrid@eowls.com", &p, &p), NEW).is_empty());
        }
    }

    #[test]
    fn mismatched_confirmation_yields_the_match_error() {
        let d = draft("hagrid@eowls.com", "stupify123", "stupifaiiiii");
        let errors = validate(&d, NEW);
        assert_eq!(
            errors,
            vec![FieldError::new("password", "and confirmation do not match.")]
        );
    }

    #[test]
    fn blank_fields_on_a_new_record_collect_both_errors() {
        let d = UserDraft {
            email: "",
            password: None,
            password_confirmation: None,
        };
        let errors = validate(&d, NEW);
        assert_eq!(
            errors,
            vec![
                FieldError::new("email", "can't be blank"),
                FieldError::new("password", "can't be blank"),
            ]
        );
    }

    #[test]
    fn existing_record_skips_unchanged_email_and_absent_password() {
        let ctx = ValidationContext {
            is_new: false,
            email_changed: false,
            email_taken: true,
        };
        let d = UserDraft {
            email: "hagrid@eowls.com",
            password: None,
            password_confirmation: None,
        };
        assert!(validate(&d, ctx).is_empty());
    }

    #[test]
    fn existing_record_validates_a_changed_email() {
        let ctx = ValidationContext {
            is_new: false,
            email_changed: true,
            email_taken: false,
        };
        let d = UserDraft {
            email: "not-an-email",
            password: None,
            password_confirmation: None,
        };
        assert_eq!(
            validate(&d, ctx),
            vec![FieldError::new("email", "looks like it might have a typo")]
        );
    }

    #[test]
    fn existing_record_validates_a_supplied_password() {
        let ctx = ValidationContext {
            is_new: false,
            email_changed: false,
            email_taken: false,
        };
        let d = draft("hagrid@eowls.com", "short", "short");
        assert_eq!(
            validate(&d, ctx),
            vec![FieldError::new(
                "password",
                "must be between 8 and 50 characters"
            )]
        );
    }
}
