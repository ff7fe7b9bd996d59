//! Booking write path: input validation, the booking insert, and attaching the
//! new booking to the customer, car and driver documents.

use chrono::{DateTime, Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::entities::booking::BookingStatus;
use crate::entities::user::{self, UserRole};
use crate::entities::car;
use crate::error::AppError;
use crate::store::{Collection, NewBooking, Store, StoreError};

/// Raw booking form. Every field arrives as text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BookCarForm {
    pub car_id: Option<String>,
    pub driver_id: Option<String>,
    pub start_date: Option<String>,
    pub number_of_days: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookCarInput {
    pub car_id: Uuid,
    pub driver_id: Uuid,
    pub number_of_days: u32,
    pub interval: DateInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BookingInputError {
    #[error("Missing required fields.")]
    MissingFields,
    #[error("Invalid date.")]
    InvalidDate,
    #[error("Invalid days number.")]
    InvalidDuration,
    #[error("Invalid car or driver reference.")]
    InvalidIdentifier,
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error(transparent)]
    Input(#[from] BookingInputError),
    #[error("Only customer accounts can book cars")]
    NotACustomer,
    #[error("A customer cannot be their own driver")]
    SelfDriven,
    #[error("Car not found")]
    CarNotFound,
    #[error("Driver not found")]
    DriverNotFound,
    #[error("Failed to save the booking")]
    NotAcknowledged,
    #[error("Booking {booking_id} was not attached to {collection} document {document_id}")]
    RelationNotAttached {
        collection: Collection,
        document_id: Uuid,
        booking_id: Uuid,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Input(e) => AppError::BadRequest(e.to_string()),
            BookingError::NotACustomer => AppError::Forbidden(err.to_string()),
            BookingError::SelfDriven => AppError::BadRequest(err.to_string()),
            BookingError::CarNotFound | BookingError::DriverNotFound => {
                AppError::NotFound(err.to_string())
            }
            BookingError::RelationNotAttached { .. } => {
                AppError::Conflict("Booking could not be completed, please try again".to_string())
            }
            BookingError::NotAcknowledged => AppError::Internal(err.to_string()),
            BookingError::Store(e) => AppError::Store(e),
        }
    }
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_start_date(value: &str) -> Option<NaiveDate> {
    value
        .parse::<NaiveDate>()
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// Check a booking request before anything is written.
///
/// Rules run in order and the first failure wins: presence of all four
/// fields, start date not before yesterday, at least one day, well-formed
/// identifiers.
pub fn validate_book_car_input(
    form: &BookCarForm,
    today: NaiveDate,
) -> Result<BookCarInput, BookingInputError> {
    let (Some(car_id), Some(driver_id), Some(start_date), Some(days)) = (
        present(form.car_id.as_ref()),
        present(form.driver_id.as_ref()),
        present(form.start_date.as_ref()),
        present(form.number_of_days.as_ref()),
    ) else {
        return Err(BookingInputError::MissingFields);
    };

    // A non-numeric day count is treated like an absent one
    let days: i64 = days
        .parse()
        .map_err(|_| BookingInputError::MissingFields)?;

    let start = parse_start_date(start_date).ok_or(BookingInputError::InvalidDate)?;
    let yesterday = today.pred_opt().ok_or(BookingInputError::InvalidDate)?;
    if start < yesterday {
        return Err(BookingInputError::InvalidDate);
    }

    if days < 1 {
        return Err(BookingInputError::InvalidDuration);
    }
    let number_of_days = u32::try_from(days).map_err(|_| BookingInputError::InvalidDuration)?;
    let end = start
        .checked_add_days(Days::new(u64::from(number_of_days)))
        .ok_or(BookingInputError::InvalidDuration)?;

    let car_id = Uuid::parse_str(car_id).map_err(|_| BookingInputError::InvalidIdentifier)?;
    let driver_id =
        Uuid::parse_str(driver_id).map_err(|_| BookingInputError::InvalidIdentifier)?;

    Ok(BookCarInput {
        car_id,
        driver_id,
        number_of_days,
        interval: DateInterval { start, end },
    })
}

#[derive(Debug, Clone, Copy)]
pub struct BookingDraft {
    pub customer_id: Uuid,
    pub car_id: Uuid,
    pub driver_id: Uuid,
    pub interval: DateInterval,
    pub status: BookingStatus,
    pub total_amount: Decimal,
}

/// Persist a new booking and return its id.
///
/// New bookings always start as `Pending`; the draft's status is ignored.
pub async fn create_booking<S: Store + ?Sized>(
    store: &S,
    draft: BookingDraft,
) -> Result<Uuid, BookingError> {
    if draft.status != BookingStatus::Pending {
        tracing::debug!(
            requested = ?draft.status,
            "Ignoring requested status, new bookings start as Pending"
        );
    }

    let booking_id = store
        .insert_booking(NewBooking {
            customer_id: draft.customer_id,
            car_id: draft.car_id,
            driver_id: draft.driver_id,
            start_date: draft.interval.start,
            end_date: draft.interval.end,
            status: BookingStatus::Pending,
            total_amount: draft.total_amount,
        })
        .await?
        .ok_or(BookingError::NotAcknowledged)?;

    tracing::info!(%booking_id, customer_id = %draft.customer_id, car_id = %draft.car_id, "Booking created");
    Ok(booking_id)
}

/// A stored row that keeps a list of booking references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedDocument {
    pub id: Uuid,
    pub bookings: Option<Vec<Uuid>>,
}

impl From<&user::Model> for RelatedDocument {
    fn from(model: &user::Model) -> Self {
        Self {
            id: model.id,
            bookings: model.bookings.clone(),
        }
    }
}

impl From<&car::Model> for RelatedDocument {
    fn from(model: &car::Model) -> Self {
        Self {
            id: model.id,
            bookings: model.bookings.clone(),
        }
    }
}

pub fn append_booking(existing: Option<&[Uuid]>, booking_id: Uuid) -> Vec<Uuid> {
    let mut bookings = existing.map(<[Uuid]>::to_vec).unwrap_or_default();
    bookings.push(booking_id);
    bookings
}

/// Append `booking_id` to the document's bookings and write the list back.
///
/// Returns the list that was stored, or `RelationNotAttached` when the update
/// matched no row in `collection`.
pub async fn save_booking_in_related_document<S: Store + ?Sized>(
    store: &S,
    document: &RelatedDocument,
    booking_id: Uuid,
    collection: Collection,
) -> Result<Vec<Uuid>, BookingError> {
    let bookings = append_booking(document.bookings.as_deref(), booking_id);
    let matched = store
        .set_bookings(collection, document.id, Some(bookings.clone()))
        .await?;

    if matched == 0 {
        tracing::warn!(
            %booking_id,
            %collection,
            document_id = %document.id,
            "Booking reference update matched no document"
        );
        return Err(BookingError::RelationNotAttached {
            collection,
            document_id: document.id,
            booking_id,
        });
    }

    Ok(bookings)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedCar {
    pub booking_id: Uuid,
    pub car_id: Uuid,
    pub driver_id: Uuid,
    pub interval: DateInterval,
    pub total_amount: Decimal,
    pub status: BookingStatus,
}

/// Full booking flow for a signed-in customer.
///
/// `customer` must be the freshly loaded row: its role is checked here, not
/// taken from the session. When one of the reference updates fails, documents already updated get
/// their previous list back and the booking row is deleted.
pub async fn book_car<S: Store + ?Sized>(
    store: &S,
    customer: &user::Model,
    form: &BookCarForm,
    today: NaiveDate,
) -> Result<BookedCar, BookingError> {
    let input = validate_book_car_input(form, today)?;

    if customer.role != UserRole::Customer {
        return Err(BookingError::NotACustomer);
    }
    if input.driver_id == customer.id {
        return Err(BookingError::SelfDriven);
    }

    let car = store
        .find_car(input.car_id)
        .await?
        .ok_or(BookingError::CarNotFound)?;
    let driver = store
        .find_user(input.driver_id)
        .await?
        .filter(|u| u.role == UserRole::Driver)
        .ok_or(BookingError::DriverNotFound)?;

    let total_amount = car.rental_price_per_day * Decimal::from(input.number_of_days);

    let booking_id = create_booking(
        store,
        BookingDraft {
            customer_id: customer.id,
            car_id: car.id,
            driver_id: driver.id,
            interval: input.interval,
            status: BookingStatus::Pending,
            total_amount,
        },
    )
    .await?;

    let related = [
        (Collection::Users, RelatedDocument::from(customer)),
        (Collection::Cars, RelatedDocument::from(&car)),
        (Collection::Users, RelatedDocument::from(&driver)),
    ];

    let mut attached: Vec<(Collection, &RelatedDocument)> = Vec::with_capacity(related.len());
    for (collection, document) in &related {
        match save_booking_in_related_document(store, document, booking_id, *collection).await {
            Ok(_) => attached.push((*collection, document)),
            Err(err) => {
                roll_back(store, booking_id, &attached).await;
                return Err(err);
            }
        }
    }

    Ok(BookedCar {
        booking_id,
        car_id: car.id,
        driver_id: driver.id,
        interval: input.interval,
        total_amount,
        status: BookingStatus::Pending,
    })
}

async fn roll_back<S: Store + ?Sized>(
    store: &S,
    booking_id: Uuid,
    attached: &[(Collection, &RelatedDocument)],
) {
    for (collection, document) in attached {
        if let Err(e) = store
            .set_bookings(*collection, document.id, document.bookings.clone())
            .await
        {
            tracing::error!(
                %booking_id,
                %collection,
                document_id = %document.id,
                error = %e,
                "Failed to restore booking references"
            );
        }
    }

    if let Err(e) = store.delete_booking(booking_id).await {
        tracing::error!(%booking_id, error = %e, "Failed to delete orphaned booking");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn form(car: &str, driver: &str, start: &str, days: &str) -> BookCarForm {
        let field = |v: &str| Some(v.to_string());
        BookCarForm {
            car_id: field(car),
            driver_id: field(driver),
            start_date: field(start),
            number_of_days: field(days),
        }
    }

    fn ids() -> (String, String) {
        (Uuid::new_v4().to_string(), Uuid::new_v4().to_string())
    }

    #[test]
    fn test_missing_fields_win_over_other_checks() {
        let (car, driver) = ids();
        // Past date and zero days would fail later checks, but presence comes first
        let mut f = form(&car, &driver, "2001-01-01", "0");
        f.driver_id = None;
        assert_eq!(
            validate_book_car_input(&f, today()),
            Err(BookingInputError::MissingFields)
        );

        let blank = form(&car, &driver, "   ", "3");
        assert_eq!(
            validate_book_car_input(&blank, today()),
            Err(BookingInputError::MissingFields)
        );

        assert_eq!(
            validate_book_car_input(&BookCarForm::default(), today()),
            Err(BookingInputError::MissingFields)
        );
    }

    #[test]
    fn test_non_numeric_days_count_as_missing() {
        let (car, driver) = ids();
        assert_eq!(
            validate_book_car_input(&form(&car, &driver, "2025-03-12", "three"), today()),
            Err(BookingInputError::MissingFields)
        );
    }

    #[test]
    fn test_yesterday_is_accepted_but_not_earlier() {
        let (car, driver) = ids();
        let ok = validate_book_car_input(&form(&car, &driver, "2025-03-09", "2"), today()).unwrap();
        assert_eq!(ok.interval.start, NaiveDate::from_ymd_opt(2025, 3, 9).unwrap());
        assert_eq!(ok.interval.end, NaiveDate::from_ymd_opt(2025, 3, 11).unwrap());

        assert_eq!(
            validate_book_car_input(&form(&car, &driver, "2025-03-08", "2"), today()),
            Err(BookingInputError::InvalidDate)
        );
        assert_eq!(
            validate_book_car_input(&form(&car, &driver, "next tuesday", "2"), today()),
            Err(BookingInputError::InvalidDate)
        );
    }

    #[test]
    fn test_rfc3339_start_date_is_accepted() {
        let (car, driver) = ids();
        let ok = validate_book_car_input(
            &form(&car, &driver, "2025-03-15T10:00:00Z", "1"),
            today(),
        )
        .unwrap();
        assert_eq!(ok.interval.start, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
    }

    #[test]
    fn test_zero_or_negative_days_are_invalid_duration() {
        let (car, driver) = ids();
        for days in ["0", "-1", "-30"] {
            assert_eq!(
                validate_book_car_input(&form(&car, &driver, "2025-03-12", days), today()),
                Err(BookingInputError::InvalidDuration),
                "days = {days}"
            );
        }
    }

    #[test]
    fn test_malformed_identifiers_are_rejected() {
        let (car, _) = ids();
        assert_eq!(
            validate_book_car_input(&form(&car, "driver-7", "2025-03-12", "1"), today()),
            Err(BookingInputError::InvalidIdentifier)
        );
    }

    #[test]
    fn test_append_booking() {
        let b1 = Uuid::new_v4();
        let b2 = Uuid::new_v4();
        assert_eq!(append_booking(None, b1), vec![b1]);
        assert_eq!(append_booking(Some(&[b1]), b2), vec![b1, b2]);
    }

    #[tokio::test]
    async fn test_create_booking_forces_pending() {
        let store = MemoryStore::new();
        let interval = DateInterval {
            start: NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        };

        let id = create_booking(
            &store,
            BookingDraft {
                customer_id: Uuid::new_v4(),
                car_id: Uuid::new_v4(),
                driver_id: Uuid::new_v4(),
                interval,
                status: BookingStatus::Confirmed,
                total_amount: Decimal::new(9000, 2),
            },
        )
        .await
        .unwrap();

        let stored = store.booking(id).unwrap();
        assert_eq!(stored.status, BookingStatus::Pending);
        assert_eq!(stored.start_date, interval.start);
        assert_eq!(stored.end_date, interval.end);
        assert_eq!(stored.total_amount, Decimal::new(9000, 2));
    }

    #[tokio::test]
    async fn test_create_booking_fails_when_not_acknowledged() {
        let store = MemoryStore::new();
        store.drop_writes();

        let result = create_booking(
            &store,
            BookingDraft {
                customer_id: Uuid::new_v4(),
                car_id: Uuid::new_v4(),
                driver_id: Uuid::new_v4(),
                interval: DateInterval {
                    start: today(),
                    end: today(),
                },
                status: BookingStatus::Pending,
                total_amount: Decimal::ZERO,
            },
        )
        .await;

        assert!(matches!(result, Err(BookingError::NotAcknowledged)));
        assert_eq!(store.booking_count(), 0);
    }

    #[tokio::test]
    async fn test_relation_updater_initializes_and_appends() {
        let store = MemoryStore::new();
        let user = store.add_user("ana@example.com", UserRole::Customer, None);
        let b1 = Uuid::new_v4();
        let b2 = Uuid::new_v4();

        let first = save_booking_in_related_document(
            &store,
            &RelatedDocument::from(&user),
            b1,
            Collection::Users,
        )
        .await
        .unwrap();
        assert_eq!(first, vec![b1]);

        let reloaded = store.user(user.id).unwrap();
        assert_eq!(reloaded.bookings, Some(vec![b1]));

        save_booking_in_related_document(
            &store,
            &RelatedDocument::from(&reloaded),
            b2,
            Collection::Users,
        )
        .await
        .unwrap();
        assert_eq!(store.user(user.id).unwrap().bookings, Some(vec![b1, b2]));
    }

    #[tokio::test]
    async fn test_relation_updater_reports_missing_document() {
        let store = MemoryStore::new();
        let ghost = RelatedDocument {
            id: Uuid::new_v4(),
            bookings: None,
        };

        let result =
            save_booking_in_related_document(&store, &ghost, Uuid::new_v4(), Collection::Cars)
                .await;

        assert!(matches!(
            result,
            Err(BookingError::RelationNotAttached {
                collection: Collection::Cars,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_book_car_links_booking_everywhere() {
        let store = MemoryStore::new();
        let existing = Uuid::new_v4();
        let customer = store.add_user("ana@example.com", UserRole::Customer, Some(vec![existing]));
        let driver = store.add_user("ion@example.com", UserRole::Driver, None);
        let car = store.add_car(Decimal::new(3550, 2), None);

        let booked = book_car(
            &store,
            &customer,
            &form(&car.id.to_string(), &driver.id.to_string(), "2025-03-10", "3"),
            today(),
        )
        .await
        .unwrap();

        assert_eq!(booked.total_amount, Decimal::new(10650, 2));
        assert_eq!(booked.status, BookingStatus::Pending);
        assert_eq!(
            store.user(customer.id).unwrap().bookings,
            Some(vec![existing, booked.booking_id])
        );
        assert_eq!(store.car(car.id).unwrap().bookings, Some(vec![booked.booking_id]));
        assert_eq!(store.user(driver.id).unwrap().bookings, Some(vec![booked.booking_id]));

        let stored = store.booking(booked.booking_id).unwrap();
        assert_eq!(stored.customer_id, customer.id);
        assert_eq!(stored.driver_id, driver.id);
    }

    #[tokio::test]
    async fn test_book_car_rejects_non_driver() {
        let store = MemoryStore::new();
        let customer = store.add_user("ana@example.com", UserRole::Customer, None);
        let other = store.add_user("dan@example.com", UserRole::Customer, None);
        let car = store.add_car(Decimal::new(3000, 2), None);

        let result = book_car(
            &store,
            &customer,
            &form(&car.id.to_string(), &other.id.to_string(), "2025-03-10", "1"),
            today(),
        )
        .await;

        assert!(matches!(result, Err(BookingError::DriverNotFound)));
        assert_eq!(store.booking_count(), 0);
    }

    #[tokio::test]
    async fn test_book_car_rolls_back_when_customer_row_is_gone() {
        let store = MemoryStore::new();
        let driver = store.add_user("ion@example.com", UserRole::Driver, None);
        let car = store.add_car(Decimal::new(3000, 2), None);
        // Customer taken from a stale session, never persisted
        let mut customer = driver.clone();
        customer.id = Uuid::new_v4();
        customer.role = UserRole::Customer;
        customer.bookings = None;

        let result = book_car(
            &store,
            &customer,
            &form(&car.id.to_string(), &driver.id.to_string(), "2025-03-10", "1"),
            today(),
        )
        .await;

        assert!(matches!(result, Err(BookingError::RelationNotAttached { .. })));
        assert_eq!(store.booking_count(), 0);
        assert_eq!(store.car(car.id).unwrap().bookings, None);
        assert_eq!(store.user(driver.id).unwrap().bookings, None);
    }

    #[tokio::test]
    async fn test_book_car_requires_customer_account() {
        let store = MemoryStore::new();
        // Role switched through the account form after the session was issued
        let me = store.add_user("mara@example.com", UserRole::Driver, Some(vec![]));
        let driver = store.add_user("ion@example.com", UserRole::Driver, None);
        let car = store.add_car(Decimal::new(3000, 2), None);

        let result = book_car(
            &store,
            &me,
            &form(&car.id.to_string(), &driver.id.to_string(), "2025-03-10", "2"),
            today(),
        )
        .await;

        assert!(matches!(result, Err(BookingError::NotACustomer)));
        assert_eq!(store.booking_count(), 0);
        assert_eq!(store.user(me.id).unwrap().bookings, Some(vec![]));
    }

    #[tokio::test]
    async fn test_book_car_rejects_customer_as_own_driver() {
        let store = MemoryStore::new();
        let me = store.add_user("mara@example.com", UserRole::Customer, None);
        let car = store.add_car(Decimal::new(3000, 2), None);

        let result = book_car(
            &store,
            &me,
            &form(&car.id.to_string(), &me.id.to_string(), "2025-03-10", "2"),
            today(),
        )
        .await;

        assert!(matches!(result, Err(BookingError::SelfDriven)));
        assert_eq!(store.booking_count(), 0);
        assert_eq!(store.user(me.id).unwrap().bookings, None);
        assert_eq!(store.car(car.id).unwrap().bookings, None);
    }

    #[tokio::test]
    async fn test_book_car_restores_customer_list_when_car_attach_fails() {
        let store = MemoryStore::new();
        let prior = Uuid::new_v4();
        let regular = store.add_user("ana@example.com", UserRole::Customer, Some(vec![prior]));
        let newcomer = store.add_user("dan@example.com", UserRole::Customer, None);
        let driver = store.add_user("ion@example.com", UserRole::Driver, None);
        let car = store.add_car(Decimal::new(3000, 2), None);
        store.detach(Collection::Cars);

        for customer in [&regular, &newcomer] {
            let result = book_car(
                &store,
                customer,
                &form(&car.id.to_string(), &driver.id.to_string(), "2025-03-10", "1"),
                today(),
            )
            .await;

            assert!(matches!(
                result,
                Err(BookingError::RelationNotAttached {
                    collection: Collection::Cars,
                    ..
                })
            ));
        }

        assert_eq!(store.user(regular.id).unwrap().bookings, Some(vec![prior]));
        assert_eq!(store.user(newcomer.id).unwrap().bookings, None);
        assert_eq!(store.user(driver.id).unwrap().bookings, None);
        assert_eq!(store.booking_count(), 0);
    }
}
