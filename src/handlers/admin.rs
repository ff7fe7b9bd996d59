use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::entities::booking::{self, BookingStatus};
use crate::entities::user::{self, UserRole};
use crate::entities::car;
use crate::error::{AppError, AppResult};
use crate::handlers::customer::{booking_parties, booking_responses, BookingResponse};
use crate::AppState;

// ============ Car Management ============

fn positive_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_positive() && !price.is_zero() {
        return Ok(());
    }
    let mut error = ValidationError::new("price");
    error.message = Some("Rental price per day must be positive.".into());
    Err(error)
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCarRequest {
    #[validate(length(min = 1, max = 100))]
    pub make: String,
    #[validate(length(min = 1, max = 100))]
    pub car_model: String,
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    #[validate(range(min = 1950, max = 2100))]
    pub year: i32,
    #[validate(range(min = 1, max = 60))]
    pub seats: i32,
    #[validate(range(min = 0, max = 6))]
    pub doors: i32,
    #[validate(length(min = 1, max = 50))]
    pub transmission: String,
    #[validate(length(min = 1, max = 50))]
    pub fuel_type: String,
    #[validate(range(min = 0))]
    pub mileage: i32,
    #[validate(custom(function = "positive_price"))]
    pub rental_price_per_day: Decimal,
    #[validate(length(equal = 3))]
    pub currency: String,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
}

/// Add a car to the fleet (admin)
pub async fn create_car(
    State(state): State<AppState>,
    Json(payload): Json<CreateCarRequest>,
) -> AppResult<(StatusCode, Json<car::Model>)> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let car = car::ActiveModel {
        id: Set(Uuid::new_v4()),
        make: Set(payload.make),
        car_model: Set(payload.car_model),
        category: Set(payload.category),
        year: Set(payload.year),
        seats: Set(payload.seats),
        doors: Set(payload.doors),
        transmission: Set(payload.transmission),
        fuel_type: Set(payload.fuel_type),
        mileage: Set(payload.mileage),
        rental_price_per_day: Set(payload.rental_price_per_day),
        currency: Set(payload.currency.to_uppercase()),
        location: Set(payload.location),
        bookings: Set(None),
        ..Default::default()
    };

    let result = car.insert(&state.db).await?;
    tracing::info!(car_id = %result.id, "Car created");
    Ok((StatusCode::CREATED, Json(result)))
}

// ============ User Management ============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: UserRole,
    pub booking_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            role: u.role,
            booking_count: u.bookings.as_ref().map_or(0, Vec::len),
            created_at: u.created_at.with_timezone(&Utc),
            updated_at: u.updated_at.with_timezone(&Utc),
        }
    }
}

/// List all users (admin)
pub async fn list_all_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = user::Entity::find()
        .order_by_asc(user::Column::Email)
        .all(&state.db)
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

/// Update user role (admin). This is how driver accounts are created.
pub async fn update_user_role(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let old_role = user.role;
    let mut active: user::ActiveModel = user.into();
    active.role = Set(payload.role);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.db).await?;

    tracing::info!(%user_id, from = %old_role, to = %payload.role, "User role changed");
    Ok(Json(updated.into()))
}

// ============ Bookings Management (Admin) ============

/// List all bookings (admin)
pub async fn list_all_bookings(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<BookingResponse>>> {
    let bookings = booking::Entity::find()
        .order_by_desc(booking::Column::CreatedAt)
        .all(&state.db)
        .await?;
    let (cars, users) = booking_parties(&state.db, &bookings).await?;

    Ok(Json(booking_responses(bookings, &cars, &users)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

/// Move a booking through its lifecycle (admin)
pub async fn update_booking_status(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<booking::Model>> {
    let record = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if !record.status.can_transition_to(payload.status) {
        return Err(AppError::Conflict(format!(
            "Cannot move booking from {:?} to {:?}",
            record.status, payload.status
        )));
    }

    let mut active: booking::ActiveModel = record.into();
    active.status = Set(payload.status);
    let updated = active.update(&state.db).await?;

    tracing::info!(%booking_id, status = ?updated.status, "Booking status changed");
    Ok(Json(updated))
}
