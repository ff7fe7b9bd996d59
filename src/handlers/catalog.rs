use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Datelike;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::user::{self, UserRole};
use crate::entities::car;
use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarSummary {
    pub id: Uuid,
    pub make: String,
    pub car_model: String,
    pub category: String,
    pub year: i32,
    pub rental_price_per_day: Decimal,
    pub currency: String,
    pub location: String,
}

impl From<car::Model> for CarSummary {
    fn from(car: car::Model) -> Self {
        Self {
            id: car.id,
            make: car.make,
            car_model: car.car_model,
            category: car.category,
            year: car.year,
            rental_price_per_day: car.rental_price_per_day,
            currency: car.currency,
            location: car.location,
        }
    }
}

/// Public driver card. Full birth dates stay private; only years are shown.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverProfile {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birth_year: Option<i32>,
    pub driving_since_year: Option<i32>,
    pub picture_url: String,
}

impl From<user::Model> for DriverProfile {
    fn from(driver: user::Model) -> Self {
        Self {
            id: driver.id,
            name: driver.name,
            email: driver.email,
            phone: driver.phone,
            address: driver.address,
            birth_year: driver.dob.map(|d| d.year()),
            driving_since_year: driver.driving_since.map(|d| d.year()),
            picture_url: driver.picture_url,
        }
    }
}

/// List cars available for rent
pub async fn list_cars(State(state): State<AppState>) -> AppResult<Json<Vec<CarSummary>>> {
    let cars = car::Entity::find()
        .order_by_asc(car::Column::Make)
        .order_by_asc(car::Column::CarModel)
        .all(&state.db)
        .await?;

    Ok(Json(cars.into_iter().map(CarSummary::from).collect()))
}

/// Car detail view
pub async fn get_car(
    State(state): State<AppState>,
    Path(car_id): Path<Uuid>,
) -> AppResult<Json<car::Model>> {
    let car = car::Entity::find_by_id(car_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Car not found".to_string()))?;

    Ok(Json(car))
}

/// List drivers customers can pick when booking
pub async fn list_drivers(State(state): State<AppState>) -> AppResult<Json<Vec<DriverProfile>>> {
    let drivers = user::Entity::find()
        .filter(user::Column::Role.eq(UserRole::Driver))
        .order_by_asc(user::Column::Name)
        .all(&state.db)
        .await?;

    Ok(Json(drivers.into_iter().map(DriverProfile::from).collect()))
}

/// Driver detail view
pub async fn get_driver(
    State(state): State<AppState>,
    Path(driver_id): Path<Uuid>,
) -> AppResult<Json<DriverProfile>> {
    let driver = user::Entity::find_by_id(driver_id)
        .filter(user::Column::Role.eq(UserRole::Driver))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))?;

    Ok(Json(driver.into()))
}
