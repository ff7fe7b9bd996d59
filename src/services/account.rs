use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

use super::{ActionState, FieldErrors};
use crate::entities::user::{self, UserRole};
use crate::store::{NewUser, ProfileUpdate, Store, StoreError};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Account form as submitted. Missing fields deserialize to empty strings so
/// they surface as field errors instead of a rejected request.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileForm {
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    pub role: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters."))]
    pub name: String,
    #[validate(length(min = 1, max = 200, message = "Address must be between 1 and 200 characters."))]
    pub address: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(custom(function = "validate_date"))]
    pub dob: String,
    #[validate(custom(function = "validate_date"))]
    pub driving_since: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFields {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub dob: NaiveDate,
    pub driving_since: NaiveDate,
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

pub fn validate_date(value: &str) -> Result<(), ValidationError> {
    if parse_date(value).is_some() {
        return Ok(());
    }
    let mut error = ValidationError::new("date");
    error.message = Some("A valid date (YYYY-MM-DD) is required.".into());
    Err(error)
}

pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'));
    let digits = value.chars().filter(char::is_ascii_digit).count();

    if allowed && (7..=20).contains(&value.len()) && digits >= 7 {
        return Ok(());
    }
    let mut error = ValidationError::new("phone");
    error.message = Some("Phone must be 7 to 20 digits, spaces or +-() characters.".into());
    Err(error)
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map_or_else(|| e.code.to_string(), ToString::to_string)
                })
                .collect();
            (camel_case(&field), messages)
        })
        .collect()
}

impl ProfileForm {
    /// Run the schema and return typed fields, or the per-field messages.
    pub fn profile_fields(&self) -> Result<ProfileFields, FieldErrors> {
        self.validate().map_err(|e| field_errors(&e))?;

        let (Some(dob), Some(driving_since)) =
            (parse_date(&self.dob), parse_date(&self.driving_since))
        else {
            return Err(FieldErrors::from([(
                "dob".to_string(),
                vec!["A valid date (YYYY-MM-DD) is required.".to_string()],
            )]));
        };

        if driving_since < dob {
            return Err(FieldErrors::from([(
                "drivingSince".to_string(),
                vec!["Driving since date cannot precede date of birth.".to_string()],
            )]));
        }

        Ok(ProfileFields {
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            phone: self.phone.trim().to_string(),
            dob,
            driving_since,
        })
    }

    pub fn submitted_role(&self) -> Option<UserRole> {
        self.role.as_deref().and_then(|r| r.parse().ok())
    }
}

/// Role given to any account created through self-service, whatever was submitted.
pub fn role_on_create(_submitted: Option<UserRole>) -> UserRole {
    UserRole::Customer
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileOutcome {
    Updated(user::Model),
    Created(user::Model),
    NotFound,
    CreateFailed,
    Invalid(FieldErrors),
    DatabaseError(String),
}

impl ProfileOutcome {
    pub fn message(&self) -> String {
        match self {
            ProfileOutcome::Updated(_) => "User updated successfully.".to_string(),
            ProfileOutcome::Created(_) => "User profile created successfully.".to_string(),
            ProfileOutcome::NotFound => "User not found or update failed.".to_string(),
            ProfileOutcome::CreateFailed => "Failed to create user profile.".to_string(),
            ProfileOutcome::Invalid(_) => {
                "Failed to update user. Some fields are missing or incorrect.".to_string()
            }
            ProfileOutcome::DatabaseError(e) => format!("Database error: {}", e),
        }
    }

    pub fn into_state(self) -> ActionState {
        let message = self.message();
        match self {
            ProfileOutcome::Invalid(errors) => ActionState::with_errors(message, errors),
            _ => ActionState::message(message),
        }
    }
}

/// Validate the account form and upsert the user keyed by email.
///
/// Never fails: storage errors come back as [`ProfileOutcome::DatabaseError`].
pub async fn update_user<S: Store + ?Sized>(
    store: &S,
    form: &ProfileForm,
    now: DateTime<Utc>,
) -> ProfileOutcome {
    let fields = match form.profile_fields() {
        Ok(fields) => fields,
        Err(errors) => return ProfileOutcome::Invalid(errors),
    };

    let email = form.email.trim();
    match upsert_profile(store, email, fields, form.submitted_role(), now).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(email, error = %e, "Failed to save user profile");
            ProfileOutcome::DatabaseError(e.to_string())
        }
    }
}

async fn upsert_profile<S: Store + ?Sized>(
    store: &S,
    email: &str,
    fields: ProfileFields,
    role: Option<UserRole>,
    now: DateTime<Utc>,
) -> Result<ProfileOutcome, StoreError> {
    if store.find_user_by_email(email).await?.is_some() {
        let updated = store
            .update_user_profile(
                email,
                ProfileUpdate {
                    name: fields.name,
                    address: fields.address,
                    phone: fields.phone,
                    dob: fields.dob,
                    driving_since: fields.driving_since,
                    role,
                    updated_at: now,
                },
            )
            .await?;

        return Ok(match updated {
            Some(user) => {
                tracing::info!(user_id = %user.id, "User profile updated");
                ProfileOutcome::Updated(user)
            }
            None => ProfileOutcome::NotFound,
        });
    }

    let created = store
        .insert_user(NewUser {
            email: email.to_string(),
            password_hash: None,
            name: Some(fields.name),
            address: Some(fields.address),
            phone: Some(fields.phone),
            role: role_on_create(role),
            dob: Some(fields.dob),
            driving_since: Some(fields.driving_since),
            picture_url: String::new(),
            bookings: Some(Vec::new()),
            created_at: now,
            updated_at: now,
        })
        .await?;

    Ok(match created {
        Some(user) => {
            tracing::info!(user_id = %user.id, "User profile created");
            ProfileOutcome::Created(user)
        }
        None => ProfileOutcome::CreateFailed,
    })
}
