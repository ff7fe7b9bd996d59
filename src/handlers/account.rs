use axum::{extract::State, http::StatusCode, Extension, Form, Json};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::user::UserRole;
use crate::error::{AppError, AppResult};
use crate::services::account::{update_user, ProfileForm, ProfileOutcome};
use crate::services::ActionState;
use crate::store::Store;
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub dob: Option<NaiveDate>,
    pub driving_since: Option<NaiveDate>,
    pub picture_url: String,
    pub bookings: Vec<Uuid>,
}

/// Profile of the signed-in user
pub async fn get_account(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<AccountResponse>> {
    let user = state
        .store
        .find_user_by_email(&claims.email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(AccountResponse {
        id: user.id,
        email: user.email,
        name: user.name,
        address: user.address,
        phone: user.phone,
        role: user.role,
        dob: user.dob,
        driving_since: user.driving_since,
        picture_url: user.picture_url,
        bookings: user.bookings.unwrap_or_default(),
    }))
}

/// Drop a submitted ADMIN role unless the stored account is already an admin.
/// The token's role is not trusted, it may predate a demotion.
async fn strip_unearned_admin(store: &dyn Store, form: &mut ProfileForm) {
    if form.submitted_role() != Some(UserRole::Admin) {
        return;
    }

    let stored_role = match store.find_user_by_email(&form.email).await {
        Ok(user) => user.map(|u| u.role),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load stored role");
            None
        }
    };

    if stored_role != Some(UserRole::Admin) {
        tracing::warn!(email = %form.email, "Ignoring self-assigned ADMIN role");
        form.role = None;
    }
}

/// Save the account form for the signed-in user
///
/// The email always comes from the session, and only accounts stored as
/// admin may submit the ADMIN role.
pub async fn update_account(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Form(mut form): Form<ProfileForm>,
) -> (StatusCode, Json<ActionState>) {
    form.email = claims.email.clone();
    strip_unearned_admin(state.store.as_ref(), &mut form).await;

    let outcome = update_user(state.store.as_ref(), &form, Utc::now()).await;
    let status = match &outcome {
        ProfileOutcome::Updated(_) => StatusCode::OK,
        ProfileOutcome::Created(_) => StatusCode::CREATED,
        ProfileOutcome::NotFound => StatusCode::NOT_FOUND,
        ProfileOutcome::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ProfileOutcome::CreateFailed | ProfileOutcome::DatabaseError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(outcome.into_state()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn admin_request(email: &str) -> ProfileForm {
        ProfileForm {
            email: email.to_string(),
            role: Some("ADMIN".to_string()),
            name: "Mara Pop".to_string(),
            address: "Str. Lunga 4, Sibiu".to_string(),
            phone: "+40 721 000 111".to_string(),
            dob: "1990-05-01".to_string(),
            driving_since: "2010-06-01".to_string(),
        }
    }

    #[tokio::test]
    async fn test_demoted_admin_cannot_reclaim_role() {
        let store = MemoryStore::new();
        store.add_user("mara@example.com", UserRole::Customer, None);

        let mut form = admin_request("mara@example.com");
        strip_unearned_admin(&store, &mut form).await;

        assert_eq!(form.role, None);
    }

    #[tokio::test]
    async fn test_stored_admin_keeps_submitted_role() {
        let store = MemoryStore::new();
        store.add_user("root@example.com", UserRole::Admin, None);

        let mut form = admin_request("root@example.com");
        strip_unearned_admin(&store, &mut form).await;

        assert_eq!(form.submitted_role(), Some(UserRole::Admin));
    }
}
