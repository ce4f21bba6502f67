//! FunShop web application.
//!
//! The binary in `main.rs` loads configuration and serves [`app`]; tests build
//! the same router over an in-memory database.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod middleware;
pub mod services;
pub mod state;
pub mod views;

use axum::extract::State;
use axum::routing::get;
use axum::Router;

use crate::errors::AppResult;
use crate::state::AppState;

/// Liveness probe: answers `ok` once the database responds.
async fn health(State(state): State<AppState>) -> AppResult<&'static str> {
    state
        .db
        .call(|conn| Ok(conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?))
        .await?;
    Ok("ok")
}

/// Build the complete router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .merge(auth::auth_router())
        .merge(api::products::routes::products_router())
        .merge(api::cart::routes::cart_router())
        .merge(api::checkout::routes::checkout_router())
        .merge(api::orders::routes::orders_router())
        .merge(api::observed::routes::observed_router())
        .merge(api::seller::routes::seller_router())
        .merge(api::admin::routes::admin_router())
        .fallback(|| async { errors::AppError::NotFound })
        .with_state(state);
    middleware::with_http_layers(router)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use adapters::MemoryMailer;
    use axum::body::Body;
    use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::database::models::{ProductDraft, Role};
    use crate::database::queries::{products, sellers, users};
    use crate::database::Database;

    struct TestShop {
        state: AppState,
        mailer: MemoryMailer,
    }

    impl TestShop {
        fn new() -> Self {
            let mailer = MemoryMailer::new();
            let state = AppState::new(
                Database::open_in_memory().unwrap(),
                Arc::new(mailer.clone()),
                Config::default(),
            );
            Self { state, mailer }
        }

        fn product(&self, name: &str, price_cents: i64, stock: i64) -> i64 {
            let conn = self.state.db.lock();
            products::insert(
                &conn,
                None,
                &ProductDraft {
                    name: name.to_string(),
                    description: String::new(),
                    category: "toys".to_string(),
                    price_cents,
                    stock,
                    archived: false,
                },
            )
            .unwrap()
        }

        async fn send(&self, request: Request<Body>) -> Response {
            app(self.state.clone()).oneshot(request).await.unwrap()
        }

        async fn get(&self, path: &str, cookie: Option<&str>) -> Response {
            let mut builder = Request::get(path);
            if let Some(cookie) = cookie {
                builder = builder.header(COOKIE, cookie);
            }
            self.send(builder.body(Body::empty()).unwrap()).await
        }

        async fn post(&self, path: &str, form: &str, cookie: Option<&str>) -> Response {
            let mut builder = Request::post(path).header(CONTENT_TYPE, "application/x-www-form-urlencoded");
            if let Some(cookie) = cookie {
                builder = builder.header(COOKIE, cookie);
            }
            self.send(builder.body(Body::from(form.to_string())).unwrap()).await
        }

        /// Register through the form and return the session cookie pair.
        async fn register(&self, email: &str, cookie: Option<&str>) -> String {
            let form = format!("email={email}&name=Ann&password=hunter2hunter2&confirm=hunter2hunter2");
            let resp = self.post("/register", &form, cookie).await;
            assert_eq!(resp.status(), StatusCode::SEE_OTHER);
            cookie_pair(&resp, auth::middleware::SESSION_COOKIE)
        }
    }

    fn cookie_pair(resp: &Response, name: &str) -> String {
        resp.headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&format!("{name}=")))
            .and_then(|v| v.split(';').next())
            .unwrap()
            .to_string()
    }

    async fn body(resp: Response) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let shop = TestShop::new();
        let resp = shop.get("/health", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body(resp).await, "ok");
    }

    #[tokio::test]
    async fn test_listing_and_unknown_pages() {
        let shop = TestShop::new();
        let kite = shop.product("Kite", 1999, 3);

        let resp = shop.get("/", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let page = body(resp).await;
        assert!(page.contains("Kite"));
        assert!(page.contains("$19.99"));

        assert_eq!(shop.get(&format!("/products/{kite}"), None).await.status(), StatusCode::OK);
        assert_eq!(shop.get("/products/999", None).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(shop.get("/nowhere", None).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_protected_pages_redirect_to_login() {
        let shop = TestShop::new();
        for path in ["/orders", "/observed", "/seller/apply", "/admin"] {
            let resp = shop.get(path, None).await;
            assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
            assert_eq!(resp.headers()[LOCATION], "/login");
        }
    }

    #[tokio::test]
    async fn test_customer_cannot_open_admin_or_seller_pages() {
        let shop = TestShop::new();
        let session = shop.register("ann@example.com", None).await;
        assert_eq!(shop.get("/admin", Some(&session)).await.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            shop.get("/seller/products", Some(&session)).await.status(),
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_register_validation_rerenders_form() {
        let shop = TestShop::new();
        let resp = shop
            .post("/register", "email=ann%40example.com&name=Ann&password=short&confirm=short", None)
            .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let page = body(resp).await;
        assert!(page.contains("password must be at least 8 characters"));
        assert!(page.contains("ann@example.com"));
    }

    #[tokio::test]
    async fn test_bad_login_is_rejected() {
        let shop = TestShop::new();
        shop.register("ann@example.com", None).await;
        let resp = shop
            .post("/login", "email=ann%40example.com&password=wrong-password", None)
            .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body(resp).await.contains("invalid email or password"));

        let resp = shop
            .post("/login", "email=ann%40example.com&password=hunter2hunter2", None)
            .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_guest_checkout_flow() {
        let shop = TestShop::new();
        let kite = shop.product("Kite", 1000, 2);

        let resp = shop.post("/cart/add", &format!("product_id={kite}&quantity=2"), None).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let guest = cookie_pair(&resp, auth::middleware::CART_COOKIE);

        let page = body(shop.get("/cart", Some(&guest)).await).await;
        assert!(page.contains("Cart (2)"));
        assert!(page.contains("$20.00"));

        let form = "full_name=Ann&street=1+Main+St&city=Springfield&postal_code=12345&country=US\
                    &email=guest%40example.com&payment_method=card&card_holder=Ann\
                    &card_number=4242+4242+4242+4242";
        let resp = shop.post("/checkout", form, Some(&guest)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body(resp).await.contains("Thank you!"));

        assert_eq!(shop.mailer.sent().len(), 1);
        assert_eq!(shop.mailer.sent()[0].to, "guest@example.com");
        let stock = products::find(&shop.state.db.lock(), kite).unwrap().unwrap().stock;
        assert_eq!(stock, 0);

        // The cart is gone, so checkout sends the visitor back to it.
        let resp = shop.get("/checkout", Some(&guest)).await;
        assert_eq!(resp.headers()[LOCATION], "/cart");
    }

    #[tokio::test]
    async fn test_checkout_with_bad_card_keeps_cart() {
        let shop = TestShop::new();
        let kite = shop.product("Kite", 1000, 2);
        let resp = shop.post("/cart/add", &format!("product_id={kite}"), None).await;
        let guest = cookie_pair(&resp, auth::middleware::CART_COOKIE);

        let form = "full_name=Ann&street=1+Main+St&city=Springfield&postal_code=12345&country=US\
                    &email=guest%40example.com&payment_method=card&card_holder=Ann&card_number=1234";
        let resp = shop.post("/checkout", form, Some(&guest)).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body(resp).await.contains("The card number is not valid"));
        assert!(shop.mailer.sent().is_empty());
        assert_eq!(products::find(&shop.state.db.lock(), kite).unwrap().unwrap().stock, 2);
    }

    #[tokio::test]
    async fn test_adding_too_many_shows_error() {
        let shop = TestShop::new();
        let kite = shop.product("Kite", 1000, 2);
        let resp = shop.post("/cart/add", &format!("product_id={kite}&quantity=5"), None).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(resp.headers().get(SET_COOKIE).is_none());
        assert!(body(resp).await.contains("Only 2 of Kite left in stock"));
    }

    #[tokio::test]
    async fn test_login_merges_guest_cart() {
        let shop = TestShop::new();
        let kite = shop.product("Kite", 1000, 5);
        let resp = shop.post("/cart/add", &format!("product_id={kite}&quantity=3"), None).await;
        let guest = cookie_pair(&resp, auth::middleware::CART_COOKIE);

        let resp = shop
            .post(
                "/register",
                "email=ann%40example.com&name=Ann&password=hunter2hunter2&confirm=hunter2hunter2",
                Some(&guest),
            )
            .await;
        assert_eq!(
            cookie_pair(&resp, auth::middleware::CART_COOKIE),
            format!("{}=", auth::middleware::CART_COOKIE)
        );
        let session = cookie_pair(&resp, auth::middleware::SESSION_COOKIE);

        let page = body(shop.get("/cart", Some(&session)).await).await;
        assert!(page.contains("Cart (3)"));

        let resp = shop.post("/logout", "", Some(&session)).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let page = body(shop.get("/cart", Some(&session)).await).await;
        assert!(page.contains("Cart (0)"));
    }

    #[tokio::test]
    async fn test_seller_onboarding_and_price_watch() {
        let shop = TestShop::new();
        let seller_session = shop.register("seller@example.com", None).await;
        let resp = shop
            .post("/seller/apply", "shop_name=Kite+World&description=Kites", Some(&seller_session))
            .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let seller_id = {
            let conn = shop.state.db.lock();
            let seller = users::find_by_email(&conn, "seller@example.com").unwrap().unwrap();
            users::insert(&conn, "root@example.com", "Root", "x", Role::Admin).unwrap();
            assert_eq!(sellers::pending(&conn).unwrap().len(), 1);
            seller.id
        };
        // Admin approval goes through the service; the route is covered below.
        crate::services::sellers::decide_and_notify(
            &shop.state,
            seller_id,
            crate::database::models::SellerStatus::Approved,
        )
        .await
        .unwrap();

        let resp = shop
            .post(
                "/seller/products/new",
                "name=Kite&description=Red&category=toys&price=10.00&stock=5",
                Some(&seller_session),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let product_id = {
            let conn = shop.state.db.lock();
            products::list_by_seller(&conn, seller_id).unwrap()[0].id
        };

        let buyer = shop.register("buyer@example.com", None).await;
        let resp = shop.post(&format!("/products/{product_id}/observe"), "", Some(&buyer)).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let resp = shop
            .post(
                &format!("/seller/products/{product_id}/edit"),
                "name=Kite&description=Red&category=toys&price=8.50&stock=5",
                Some(&seller_session),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let mails = shop.mailer.sent();
        assert!(mails.iter().any(|m| m.to == "buyer@example.com" && m.subject == "Price dropped: Kite"));
        let page = body(shop.get("/observed", Some(&buyer)).await).await;
        assert!(page.contains("Price changed"));
        assert!(page.contains("$8.50"));

        shop.post("/observed/acknowledge", "", Some(&buyer)).await;
        let page = body(shop.get("/observed", Some(&buyer)).await).await;
        assert!(!page.contains("Price changed"));
    }

    #[tokio::test]
    async fn test_admin_dashboard_and_order_status() {
        let shop = TestShop::new();
        {
            let conn = shop.state.db.lock();
            let hash = auth::service::hash_password("admin-password").unwrap();
            users::insert(&conn, "root@example.com", "Root", &hash, Role::Admin).unwrap();
        }
        let resp = shop
            .post("/login", "email=root%40example.com&password=admin-password", None)
            .await;
        let admin = cookie_pair(&resp, auth::middleware::SESSION_COOKIE);

        let resp = shop.get("/admin", Some(&admin)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body(resp).await.contains("Dashboard"));

        let resp = shop.post("/admin/orders/42/status", "status=shipped", Some(&admin)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = shop.post("/admin/orders/42/status", "status=lost", Some(&admin)).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
