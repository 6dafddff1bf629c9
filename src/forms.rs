//! Submitted forms and their validation.
//!
//! Every form deserializes leniently (missing fields become empty strings) so
//! that problems surface as per-field errors on the re-rendered page instead of
//! an extractor rejection.

use std::collections::BTreeMap;

use serde::Deserialize;
use validator::ValidateEmail;

use crate::{auth::password::MIN_PASSWORD_LEN, db::entities::user};

const REQUIRED: &str = "This field is required.";
const INVALID_EMAIL: &str = "Enter a valid email address.";
const PASSWORDS_DIFFER: &str = "Passwords must match.";

/// Error messages keyed by form field name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn with(mut self, field: &'static str, message: impl Into<String>) -> Self {
        self.add(field, message);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, name: &str) -> bool {
        !self.field(name).is_empty()
    }
}

fn required(errors: &mut FormErrors, field: &'static str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, REQUIRED);
        return false;
    }
    true
}

fn email(errors: &mut FormErrors, field: &'static str, value: &str) {
    if required(errors, field, value) && !value.trim().validate_email() {
        errors.add(field, INVALID_EMAIL);
    }
}

fn new_password(
    errors: &mut FormErrors,
    field: &'static str,
    confirm_field: &'static str,
    value: &str,
    confirmation: &str,
) {
    if value.is_empty() {
        errors.add(field, REQUIRED);
    } else if value.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            field,
            format!("Password must be at least {MIN_PASSWORD_LEN} characters long."),
        );
    }
    if value != confirmation {
        errors.add(confirm_field, PASSWORDS_DIFFER);
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        email(&mut errors, "email", &self.email);
        required(&mut errors, "password", &self.password);
        errors
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        required(&mut errors, "first_name", &self.first_name);
        required(&mut errors, "last_name", &self.last_name);
        email(&mut errors, "email", &self.email);
        required(&mut errors, "phone_number", &self.phone_number);
        new_password(
            &mut errors,
            "password",
            "confirm_password",
            &self.password,
            &self.confirm_password,
        );
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EditProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

impl EditProfileForm {
    pub fn from_user(user: &user::Model) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
        }
    }

    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        required(&mut errors, "first_name", &self.first_name);
        required(&mut errors, "last_name", &self.last_name);
        email(&mut errors, "email", &self.email);
        required(&mut errors, "phone_number", &self.phone_number);
        errors
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct PasswordForm {
    pub password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordForm {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        required(&mut errors, "password", &self.password);
        new_password(
            &mut errors,
            "new_password",
            "confirm_password",
            &self.new_password,
            &self.confirm_password,
        );
        errors
    }
}
