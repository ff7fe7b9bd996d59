use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use super::{Collection, NewBooking, NewUser, ProfileUpdate, Store, StoreResult};
use crate::entities::{booking, car, user};

/// [`Store`] backed by the shared sea-orm connection pool.
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Store for SeaOrmStore {
    async fn insert_booking(&self, new_booking: NewBooking) -> StoreResult<Option<Uuid>> {
        let active = booking::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(new_booking.customer_id),
            car_id: Set(new_booking.car_id),
            driver_id: Set(new_booking.driver_id),
            start_date: Set(new_booking.start_date),
            end_date: Set(new_booking.end_date),
            status: Set(new_booking.status),
            total_amount: Set(new_booking.total_amount),
            ..Default::default()
        };

        let result = booking::Entity::insert(active).exec(&self.db).await?;
        Ok(Some(result.last_insert_id))
    }

    async fn delete_booking(&self, id: Uuid) -> StoreResult<u64> {
        let result = booking::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<user::Model>> {
        Ok(user::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<user::Model>> {
        Ok(user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?)
    }

    async fn find_car(&self, id: Uuid) -> StoreResult<Option<car::Model>> {
        Ok(car::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn insert_user(&self, new_user: NewUser) -> StoreResult<Option<user::Model>> {
        let active = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            name: Set(new_user.name),
            address: Set(new_user.address),
            phone: Set(new_user.phone),
            role: Set(new_user.role),
            dob: Set(new_user.dob),
            driving_since: Set(new_user.driving_since),
            picture_url: Set(new_user.picture_url),
            bookings: Set(new_user.bookings),
            created_at: Set(new_user.created_at.into()),
            updated_at: Set(new_user.updated_at.into()),
        };

        Ok(Some(active.insert(&self.db).await?))
    }

    async fn update_user_profile(
        &self,
        email: &str,
        update: ProfileUpdate,
    ) -> StoreResult<Option<user::Model>> {
        let Some(existing) = self.find_user_by_email(email).await? else {
            return Ok(None);
        };

        let mut active: user::ActiveModel = existing.into();
        active.name = Set(Some(update.name));
        active.address = Set(Some(update.address));
        active.phone = Set(Some(update.phone));
        active.dob = Set(Some(update.dob));
        active.driving_since = Set(Some(update.driving_since));
        if let Some(role) = update.role {
            active.role = Set(role);
        }
        active.updated_at = Set(update.updated_at.into());

        match active.update(&self.db).await {
            Ok(model) => Ok(Some(model)),
            // Row vanished between the lookup and the update
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_bookings(
        &self,
        collection: Collection,
        id: Uuid,
        bookings: Option<Vec<Uuid>>,
    ) -> StoreResult<u64> {
        let result = match collection {
            Collection::Users => {
                user::Entity::update_many()
                    .col_expr(user::Column::Bookings, Expr::value(bookings))
                    .filter(user::Column::Id.eq(id))
                    .exec(&self.db)
                    .await?
            }
            Collection::Cars => {
                car::Entity::update_many()
                    .col_expr(car::Column::Bookings, Expr::value(bookings))
                    .filter(car::Column::Id.eq(id))
                    .exec(&self.db)
                    .await?
            }
        };

        Ok(result.rows_affected)
    }
}
