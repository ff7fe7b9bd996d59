//! In-memory [`Store`] used by the service tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::DbErr;
use uuid::Uuid;


use super::{Collection, NewBooking, NewUser, ProfileUpdate, Store, StoreResult};
use crate::entities::user::UserRole;
use crate::entities::{booking, car, user};

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<user::Model>>,
    cars: Mutex<Vec<car::Model>>,
    bookings: Mutex<Vec<booking::Model>>,
    drop_writes: AtomicBool,
    offline: AtomicBool,
    detached: Mutex<Option<Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts succeed at the driver level but report no acknowledgement.
    pub fn drop_writes(&self) {
        self.drop_writes.store(true, Ordering::SeqCst);
    }

    /// Every call fails as if the database were unreachable.
    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    /// Bookings updates on `collection` match no row, as if the row had been removed.
    pub fn detach(&self, collection: Collection) {
        *self.detached.lock().unwrap() = Some(collection);
    }

    pub fn add_user(&self, email: &str, role: UserRole, bookings: Option<Vec<Uuid>>) -> user::Model {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let model = user::Model {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: None,
            name: Some(email.split('@').next().unwrap_or_default().to_string()),
            address: None,
            phone: None,
            role,
            dob: None,
            driving_since: None,
            picture_url: String::new(),
            bookings,
            created_at: created.into(),
            updated_at: created.into(),
        };
        self.users.lock().unwrap().push(model.clone());
        model
    }

    pub fn add_car(&self, price_per_day: Decimal, bookings: Option<Vec<Uuid>>) -> car::Model {
        let model = car::Model {
            id: Uuid::new_v4(),
            make: "Dacia".to_string(),
            car_model: "Logan".to_string(),
            category: "Economy".to_string(),
            year: 2022,
            seats: 5,
            doors: 4,
            transmission: "Manual".to_string(),
            fuel_type: "Diesel".to_string(),
            mileage: 42_000,
            rental_price_per_day: price_per_day,
            currency: "EUR".to_string(),
            location: "Cluj-Napoca".to_string(),
            bookings,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap().into(),
        };
        self.cars.lock().unwrap().push(model.clone());
        model
    }

    pub fn user(&self, id: Uuid) -> Option<user::Model> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    pub fn user_by_email(&self, email: &str) -> Option<user::Model> {
        self.users.lock().unwrap().iter().find(|u| u.email == email).cloned()
    }

    pub fn car(&self, id: Uuid) -> Option<car::Model> {
        self.cars.lock().unwrap().iter().find(|c| c.id == id).cloned()
    }

    pub fn booking(&self, id: Uuid) -> Option<booking::Model> {
        self.bookings.lock().unwrap().iter().find(|b| b.id == id).cloned()
    }

    pub fn booking_count(&self) -> usize {
        self.bookings.lock().unwrap().len()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DbErr::Custom("connection refused".to_string()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_booking(&self, new_booking: NewBooking) -> StoreResult<Option<Uuid>> {
        self.check_online()?;
        if self.drop_writes.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let id = Uuid::new_v4();
        self.bookings.lock().unwrap().push(booking::Model {
            id,
            customer_id: new_booking.customer_id,
            car_id: new_booking.car_id,
            driver_id: new_booking.driver_id,
            start_date: new_booking.start_date,
            end_date: new_booking.end_date,
            status: new_booking.status,
            total_amount: new_booking.total_amount,
            created_at: Utc::now().into(),
        });
        Ok(Some(id))
    }

    async fn delete_booking(&self, id: Uuid) -> StoreResult<u64> {
        self.check_online()?;
        let mut bookings = self.bookings.lock().unwrap();
        let before = bookings.len();
        bookings.retain(|b| b.id != id);
        Ok((before - bookings.len()) as u64)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<user::Model>> {
        self.check_online()?;
        Ok(self.user(id))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<user::Model>> {
        self.check_online()?;
        Ok(self.user_by_email(email))
    }

    async fn find_car(&self, id: Uuid) -> StoreResult<Option<car::Model>> {
        self.check_online()?;
        Ok(self.car(id))
    }

    async fn insert_user(&self, new_user: NewUser) -> StoreResult<Option<user::Model>> {
        self.check_online()?;
        if self.drop_writes.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(DbErr::Custom(format!(
                "duplicate key value violates unique constraint on email {}",
                new_user.email
            ))
            .into());
        }

        let model = user::Model {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            name: new_user.name,
            address: new_user.address,
            phone: new_user.phone,
            role: new_user.role,
            dob: new_user.dob,
            driving_since: new_user.driving_since,
            picture_url: new_user.picture_url,
            bookings: new_user.bookings,
            created_at: new_user.created_at.into(),
            updated_at: new_user.updated_at.into(),
        };
        users.push(model.clone());
        Ok(Some(model))
    }

    async fn update_user_profile(
        &self,
        email: &str,
        update: ProfileUpdate,
    ) -> StoreResult<Option<user::Model>> {
        self.check_online()?;
        let mut users = self.users.lock().unwrap();
        let Some(existing) = users.iter_mut().find(|u| u.email == email) else {
            return Ok(None);
        };

        existing.name = Some(update.name);
        existing.address = Some(update.address);
        existing.phone = Some(update.phone);
        existing.dob = Some(update.dob);
        existing.driving_since = Some(update.driving_since);
        if let Some(role) = update.role {
            existing.role = role;
        }
        existing.updated_at = update.updated_at.into();
        Ok(Some(existing.clone()))
    }

    async fn set_bookings(
        &self,
        collection: Collection,
        id: Uuid,
        bookings: Option<Vec<Uuid>>,
    ) -> StoreResult<u64> {
        self.check_online()?;
        if *self.detached.lock().unwrap() == Some(collection) {
            return Ok(0);
        }
        let matched = match collection {
            Collection::Users => self
                .users
                .lock()
                .unwrap()
                .iter_mut()
                .find(|u| u.id == id)
                .map(|u| u.bookings = bookings),
            Collection::Cars => self
                .cars
                .lock()
                .unwrap()
                .iter_mut()
                .find(|c| c.id == id)
                .map(|c| c.bookings = bookings),
        };
        Ok(u64::from(matched.is_some()))
    }
}
