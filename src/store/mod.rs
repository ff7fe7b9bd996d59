//! Storage handle injected into the booking and account services.
//!
//! The services never open connections themselves; they receive a [`Store`]
//! and call the handful of document-style operations they need. The
//! production implementation is [`SeaOrmStore`]; tests run against the
//! in-memory store.

mod postgres;
#[cfg(test)]
pub mod memory;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use crate::entities::booking::BookingStatus;
use crate::entities::{car, user};

pub use postgres::SeaOrmStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbErr),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Tables whose rows carry a list of booking references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    Cars,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Cars => "cars",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub customer_id: Uuid,
    pub car_id: Uuid,
    pub driver_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub role: user::UserRole,
    pub dob: Option<NaiveDate>,
    pub driving_since: Option<NaiveDate>,
    pub picture_url: String,
    pub bookings: Option<Vec<Uuid>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields overwritten by an account form save. A `None` role keeps the stored one.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub dob: NaiveDate,
    pub driving_since: NaiveDate,
    pub role: Option<user::UserRole>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a booking. `None` means the write was not acknowledged.
    async fn insert_booking(&self, booking: NewBooking) -> StoreResult<Option<Uuid>>;

    /// Returns the number of rows removed.
    async fn delete_booking(&self, id: Uuid) -> StoreResult<u64>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<user::Model>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<user::Model>>;

    async fn find_car(&self, id: Uuid) -> StoreResult<Option<car::Model>>;

    /// Insert a user. `None` means the write was not acknowledged.
    async fn insert_user(&self, user: NewUser) -> StoreResult<Option<user::Model>>;

    /// Find-one-and-update keyed by email, returning the document after the update.
    async fn update_user_profile(
        &self,
        email: &str,
        update: ProfileUpdate,
    ) -> StoreResult<Option<user::Model>>;

    /// Overwrite the bookings list of one document. `None` clears the column.
    /// Returns the number of matched rows.
    async fn set_bookings(
        &self,
        collection: Collection,
        id: Uuid,
        bookings: Option<Vec<Uuid>>,
    ) -> StoreResult<u64>;
}
