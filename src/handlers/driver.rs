use axum::{extract::State, Extension, Json};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::booking;
use crate::error::AppResult;
use crate::handlers::customer::{booking_parties, booking_responses, BookingResponse};
use crate::utils::jwt::Claims;
use crate::AppState;

/// List bookings assigned to the logged-in driver
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<BookingResponse>>> {
    let bookings = booking::Entity::find()
        .filter(booking::Column::DriverId.eq(claims.sub))
        .order_by_asc(booking::Column::StartDate)
        .all(&state.db)
        .await?;

    let (cars, people) = booking_parties(&state.db, &bookings).await?;

    Ok(Json(booking_responses(bookings, &cars, &people)))
}
