use axum::{extract::State, http::StatusCode, Extension, Form, Json};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Select};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::{car, user};
use crate::error::{AppError, AppResult};
use crate::services::booking::{book_car, BookCarForm, BookedCar};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: Uuid,
    pub car_id: Uuid,
    pub car: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub driver_id: Uuid,
    pub driver_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    pub total_amount: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

fn display_name(users: &[user::Model], id: Uuid) -> String {
    users
        .iter()
        .find(|u| u.id == id)
        .map(|u| u.name.clone().unwrap_or_else(|| u.email.clone()))
        .unwrap_or_default()
}

/// Join bookings with the car and user rows they reference
pub fn booking_responses(
    bookings: Vec<booking::Model>,
    cars: &[car::Model],
    users: &[user::Model],
) -> Vec<BookingResponse> {
    bookings
        .into_iter()
        .map(|b| {
            let car = cars.iter().find(|c| c.id == b.car_id);
            BookingResponse {
                id: b.id,
                car_id: b.car_id,
                car: car
                    .map(|c| format!("{} {}", c.make, c.car_model))
                    .unwrap_or_default(),
                customer_id: b.customer_id,
                customer_name: display_name(users, b.customer_id),
                driver_id: b.driver_id,
                driver_name: display_name(users, b.driver_id),
                start_date: b.start_date,
                end_date: b.end_date,
                status: b.status,
                total_amount: b.total_amount,
                currency: car.map(|c| c.currency.clone()).unwrap_or_default(),
                created_at: b.created_at.with_timezone(&Utc),
            }
        })
        .collect()
}

fn booking_party_queries(
    bookings: &[booking::Model],
) -> (Select<car::Entity>, Select<user::Entity>) {
    let cars = car::Entity::find().filter(car::Column::Id.is_in(bookings.iter().map(|b| b.car_id)));
    let users = user::Entity::find().filter(
        user::Column::Id.is_in(bookings.iter().flat_map(|b| [b.customer_id, b.driver_id])),
    );
    (cars, users)
}

/// Load only the cars and people the given bookings reference
pub async fn booking_parties(
    db: &DatabaseConnection,
    bookings: &[booking::Model],
) -> Result<(Vec<car::Model>, Vec<user::Model>), DbErr> {
    let (cars, users) = booking_party_queries(bookings);
    Ok((cars.all(db).await?, users.all(db).await?))
}

#[derive(Debug, Serialize)]
pub struct BookingCreatedResponse {
    pub message: String,
    pub booking: BookedCar,
}

/// Book a car with a driver (form submission)
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Form(form): Form<BookCarForm>,
) -> AppResult<(StatusCode, Json<BookingCreatedResponse>)> {
    let customer = state
        .store
        .find_user(claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer account not found".to_string()))?;

    let booking = book_car(
        state.store.as_ref(),
        &customer,
        &form,
        Utc::now().date_naive(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(BookingCreatedResponse {
            message: "Booking created successfully.".to_string(),
            booking,
        }),
    ))
}

/// List the signed-in customer's bookings
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<BookingResponse>>> {
    let bookings = booking::Entity::find()
        .filter(booking::Column::CustomerId.eq(claims.sub))
        .order_by_desc(booking::Column::StartDate)
        .all(&state.db)
        .await?;

    let (cars, users) = booking_parties(&state.db, &bookings).await?;

    Ok(Json(booking_responses(bookings, &cars, &users)))
}
