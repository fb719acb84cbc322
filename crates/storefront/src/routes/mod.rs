//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Session & store
//! GET    /api/session                       - Current user (never the token)
//! GET    /api/store                         - Serialized client store
//! PUT    /api/ui/quick-view                 - Open quick view
//! DELETE /api/ui/quick-view                 - Close quick view
//! PUT    /api/ui/preview-slider             - Move the preview slider
//!
//! # Cart
//! GET    /api/cart                          - Fetch
//! DELETE /api/cart                          - Clear
//! POST   /api/cart/items                    - Add item
//! PATCH  /api/cart/items/{id}               - Set quantity (0 removes)
//! DELETE /api/cart/items/{id}               - Remove item
//! POST   /api/cart/items/{id}/increment     - +1
//! POST   /api/cart/items/{id}/decrement     - -1 (0 removes)
//!
//! # Checkout (see `checkout` module)
//! POST   /api/checkout                      - Create order from cart
//! ...    /api/checkout/{order_id}/...       - Selections, creation, confirm
//! GET    /checkout/result/{status}          - Payment return page
//!
//! # Catalog
//! GET    /api/products/facets               - Facets (query passed through)
//! GET    /api/products/{product}            - Product detail by slug
//! GET    /api/products/{product}/reviews    - Reviews by product id
//! POST   /api/products/{product}/reviews    - Post review (auth)
//! GET    /api/banners                       - Banners
//! GET    /api/wishlist                      - Wishlist (auth)
//! POST   /api/wishlist                      - Add to wishlist (auth)
//! DELETE /api/wishlist/{product_id}         - Remove from wishlist (auth)
//!
//! # Account (see `account` module, all require auth)
//!
//! # Proxy
//! ANY    /api/proxy/{*path}                 - Pass-through
//! ANY    /api/auth-proxy/{*path}            - Pass-through, sign-in required
//!
//! # Auth
//! GET    /auth/login                        - Login options
//! POST   /auth/login                        - Credentials login
//! POST   /auth/logout                       - Logout
//! GET    /auth/oauth/{provider}/login       - Redirect to provider
//! GET    /auth/oauth/{provider}/callback    - Provider callback
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod store;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{any, delete, get, patch, post, put},
};

use crate::proxy;
use crate::state::AppState;

/// Create the auth routes router (nested under `/auth`).
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/oauth/{provider}/login", get(auth::oauth_login))
        .route("/oauth/{provider}/callback", get(auth::oauth_callback))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route("/items/{id}", patch(cart::update).delete(cart::remove))
        .route("/items/{id}/increment", post(cart::increment))
        .route("/items/{id}/decrement", post(cart::decrement))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::current).post(checkout::start))
        .route("/{order_id}", get(checkout::load))
        .route("/{order_id}/shipping-address", put(checkout::shipping_address))
        .route("/{order_id}/billing-address", put(checkout::billing_address))
        .route("/{order_id}/billing-profile", put(checkout::billing_profile))
        .route("/{order_id}/payment-method", put(checkout::payment_method))
        .route("/{order_id}/addresses", post(checkout::create_address))
        .route(
            "/{order_id}/billing-profiles",
            post(checkout::create_billing_profile),
        )
        .route("/{order_id}/confirm", post(checkout::confirm))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/account", get(account::show).patch(account::update))
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route(
            "/addresses/{id}",
            patch(account::update_address).delete(account::delete_address),
        )
        .route(
            "/billing-profiles",
            get(account::billing_profiles).post(account::create_billing_profile),
        )
        .route(
            "/billing-profiles/{id}",
            patch(account::update_billing_profile)
                .delete(account::delete_billing_profile),
        )
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products/facets", get(catalog::facets))
        .route("/products/{product}", get(catalog::product))
        .route(
            "/products/{product}/reviews",
            get(catalog::reviews).post(catalog::create_review),
        )
        .route("/banners", get(catalog::banners))
        .route(
            "/wishlist",
            get(catalog::wishlist).post(catalog::add_to_wishlist),
        )
        .route("/wishlist/{product_id}", delete(catalog::remove_from_wishlist))
}

/// Create the proxy routes router.
pub fn proxy_routes() -> Router<AppState> {
    Router::new()
        .route("/proxy/{*path}", any(proxy::public))
        .route("/auth-proxy/{*path}", any(proxy::authenticated))
        .layer(DefaultBodyLimit::max(proxy::MAX_BODY_BYTES))
}

/// Create the JSON API router (nested under `/api`).
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/session", get(auth::current))
        .route("/store", get(store::snapshot))
        .route(
            "/ui/quick-view",
            put(store::open_quick_view).delete(store::close_quick_view),
        )
        .route("/ui/preview-slider", put(store::preview_slide))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .merge(account_routes())
        .merge(catalog_routes())
        .merge(proxy_routes())
}

/// Create the browser-facing (non-API) routes.
pub fn page_routes() -> Router<AppState> {
    Router::new().route("/checkout/result/{status}", get(checkout::result))
}
