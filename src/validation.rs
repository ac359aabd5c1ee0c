//! Local form validation.
//!
//! Forms are checked before anything is sent; an invalid form never reaches
//! the server. Each check reports per-field messages so a front end can show
//! them inline.

use std::collections::BTreeMap;
use std::fmt;

use crate::types::{Address, AuthRequest, NewProduct, OtpRequest, SignUpRequest};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const PHONE_DIGITS: usize = 10;
pub const OTP_DIGITS: usize = 6;
pub const PIN_CODE_DIGITS: usize = 6;

/// Field name → message, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`. The first message per field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_owned())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.fields {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// A loose structural email check: one `@`, non-empty local part, dotted domain.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    if email.trim().is_empty() {
        errors.add("email", "Email is required");
    } else if !is_valid_email(email) {
        errors.add("email", "Email should be valid");
    }
}

fn check_required(errors: &mut ValidationErrors, field: &str, value: &str, label: &str) {
    if value.trim().is_empty() {
        errors.add(field, format!("{label} is required"));
    }
}

pub fn validate_sign_in(form: &AuthRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_email(&mut errors, &form.email);
    if form.password.is_empty() {
        errors.add("password", "Password is required");
    }
    errors.into_result()
}

pub fn validate_sign_up(form: &SignUpRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_required(&mut errors, "name", &form.name, "Name");
    check_email(&mut errors, &form.email);
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        );
    }
    if let Some(address) = &form.user_address {
        check_address(&mut errors, address);
    }
    errors.into_result()
}

/// Validates an OTP send/resend request, or a verify request when
/// `expect_code` is set.
pub fn validate_otp(request: &OtpRequest, expect_code: bool) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if !is_digits(request.phone.trim(), PHONE_DIGITS) {
        errors.add("phone", format!("Phone number must be {PHONE_DIGITS} digits"));
    }
    check_email(&mut errors, &request.email);
    if expect_code {
        match request.otp.as_deref().map(str::trim) {
            Some(code) if is_digits(code, OTP_DIGITS) => {}
            _ => errors.add("otp", format!("Code must be {OTP_DIGITS} digits")),
        }
    }
    errors.into_result()
}

fn check_address(errors: &mut ValidationErrors, address: &Address) {
    check_required(errors, "street", &address.street, "Street");
    check_required(errors, "city", &address.city, "City");
    check_required(errors, "state", &address.state, "State");
    check_required(errors, "country", &address.country, "Country");
    if !is_digits(address.pin_code.trim(), PIN_CODE_DIGITS) {
        errors.add("pinCode", format!("Pin code must be {PIN_CODE_DIGITS} digits"));
    }
    let phone = address.phone_number.trim();
    if !phone.is_empty() && !is_digits(phone, PHONE_DIGITS) {
        errors.add("phoneNumber", format!("Phone number must be {PHONE_DIGITS} digits"));
    }
}

pub fn validate_address(address: &Address) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_address(&mut errors, address);
    errors.into_result()
}

pub fn validate_checkout(
    customer_name: &str,
    email: &str,
    address: Option<&Address>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_required(&mut errors, "customerName", customer_name, "Customer name");
    check_email(&mut errors, email);
    if let Some(address) = address {
        check_address(&mut errors, address);
    }
    errors.into_result()
}

pub fn validate_product(product: &NewProduct) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_required(&mut errors, "name", &product.name, "Name");
    check_required(&mut errors, "category", &product.category, "Category");
    check_required(&mut errors, "description", &product.description, "Description");
    if !product.price.is_finite() || product.price <= 0.0 {
        errors.add("price", "Price must be greater than zero");
    }
    errors.into_result()
}
