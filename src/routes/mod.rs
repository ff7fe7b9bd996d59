use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::error::AppResult;
use crate::handlers::{account, admin, auth, catalog, customer, driver};
use crate::middleware::auth::{auth_middleware, require_admin, require_customer, require_driver};
use crate::middleware::rate_limit::create_public_governor;
use crate::middleware::role_rate_limit::{create_role_governor, RateLimitedRole};
use crate::AppState;

pub fn create_router(state: AppState) -> AppResult<Router> {
    let driver_governor = create_role_governor(RateLimitedRole::Driver)?;
    let customer_governor = create_role_governor(RateLimitedRole::Customer)?;
    // Per-IP limit for everything reachable without a token
    let public_governor = create_public_governor()?;

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor.clone());

    // Car and driver catalog
    let public_routes = Router::new()
        .route("/cars", get(catalog::list_cars))
        .route("/cars/{id}", get(catalog::get_car))
        .route("/drivers", get(catalog::list_drivers))
        .route("/drivers/{id}", get(catalog::get_driver))
        .layer(public_governor);

    // Any signed-in user
    let account_routes = Router::new()
        .route("/", get(account::get_account).post(account::update_account))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Admin routes sit behind the global limiter only
    let admin_routes = Router::new()
        .route("/cars", post(admin::create_car))
        .route("/users", get(admin::list_all_users))
        .route("/users/{id}/role", put(admin::update_user_role))
        .route("/bookings", get(admin::list_all_bookings))
        .route("/bookings/{id}/status", put(admin::update_booking_status))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let driver_routes = Router::new()
        .route("/bookings", get(driver::my_bookings))
        .layer(driver_governor)
        .layer(middleware::from_fn(require_driver))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let customer_routes = Router::new()
        .route("/", post(customer::create_booking).get(customer::my_bookings))
        .layer(customer_governor)
        .layer(middleware::from_fn(require_customer))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Ok(Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", public_routes)
        .nest("/api/account", account_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/driver", driver_routes)
        .nest("/api/bookings", customer_routes)
        .with_state(state))
}
