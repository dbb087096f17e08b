//! User domain types and account payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gamevault_core::{Email, UserId};

use super::{ValidationError, non_blank};

/// Longest accepted username.
const MAX_USERNAME_LENGTH: usize = 40;

/// A store account (domain type).
///
/// The password hash never leaves the repository layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<ShippingAddress>,
    #[serde(skip_serializing)]
    pub stripe_customer_id: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Display name for payment receipts and greetings.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            _ => self.username.clone(),
        }
    }
}

/// The authenticated caller, as carried in a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    pub is_admin: bool,
}

/// A postal address, stored as a JSON document on users and orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub region: Option<String>,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// Trim every field and check the required ones are present.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] naming the first missing field.
    pub fn validate(self) -> Result<Self, ValidationError> {
        fn required(field: &str, value: &str) -> Result<String, ValidationError> {
            let value = value.trim();
            if value.is_empty() {
                return Err(ValidationError::new(format!("address {field} is required")));
            }
            Ok(value.to_owned())
        }

        Ok(Self {
            full_name: required("fullName", &self.full_name)?,
            line1: required("line1", &self.line1)?,
            line2: non_blank(self.line2),
            city: required("city", &self.city)?,
            region: non_blank(self.region),
            postal_code: required("postalCode", &self.postal_code)?,
            country: required("country", &self.country)?,
        })
    }
}

/// Validate and trim a username.
///
/// # Errors
///
/// Returns [`ValidationError`] for blank or overlong names.
pub fn validate_username(username: &str) -> Result<String, ValidationError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ValidationError::new("username is required"));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::new(format!(
            "username must be at most {MAX_USERNAME_LENGTH} characters"
        )));
    }
    Ok(username.to_owned())
}

// =============================================================================
// Request payloads
// =============================================================================

/// `POST /api/auth/signup`
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// `POST /api/auth/signin`
#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// `PUT /api/users/me`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<ShippingAddress>,
}

/// `PUT /api/users/me/password`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// `PUT /api/users/{id}` (admin)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateUserRequest {
    #[serde(flatten)]
    pub profile: UpdateProfileRequest,
    pub is_admin: Option<bool>,
}

/// Profile changes after validation. `None` leaves a field untouched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<ShippingAddress>,
    pub is_admin: Option<bool>,
}

impl UpdateProfileRequest {
    /// Validate the fields that were supplied.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for a blank username or incomplete address.
    pub fn validate(self) -> Result<ProfileChanges, ValidationError> {
        Ok(ProfileChanges {
            username: self.username.as_deref().map(validate_username).transpose()?,
            first_name: non_blank(self.first_name),
            last_name: non_blank(self.last_name),
            address: self.address.map(ShippingAddress::validate).transpose()?,
            is_admin: None,
        })
    }
}

impl AdminUpdateUserRequest {
    /// Validate profile fields and carry the admin flag through.
    ///
    /// # Errors
    ///
    /// See [`UpdateProfileRequest::validate`].
    pub fn validate(self) -> Result<ProfileChanges, ValidationError> {
        let mut changes = self.profile.validate()?;
        changes.is_admin = self.is_admin;
        Ok(changes)
    }
}

/// Response body for signup and signin.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}
