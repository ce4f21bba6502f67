//! Request extractors for protecting routes and identifying the visitor.
//!
//! The session token and the guest cart token travel in cookies. `Visitor`
//! resolves both once per request (the result is cached in the request
//! extensions); `CurrentUser`, `SellerUser` and `AdminUser` build on it and
//! reject the request when the visitor lacks the required role.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};

use super::service::resolve_session;
use crate::database::models::{Role, User};
use crate::database::queries::{carts, observations};
use crate::errors::{AppError, AppResult};
use crate::services::cart::CartOwner;
use crate::state::AppState;
use crate::views::Nav;

pub const SESSION_COOKIE: &str = "funshop_session";
pub const CART_COOKIE: &str = "funshop_cart";
/// Guest carts outlive a browser restart for a month.
pub const GUEST_CART_MAX_AGE: u64 = 30 * 24 * 60 * 60;

/// Value of cookie `name`, looking through every `Cookie` header.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// Tokens are uuids we minted; anything else is ignored.
fn well_formed_token(token: String) -> Option<String> {
    uuid::Uuid::parse_str(&token).ok().map(|_| token)
}

pub fn build_cookie(name: &str, value: &str, max_age: u64, secure: bool) -> String {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn expire_cookie(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Append a `Set-Cookie` header. Cookie values are ASCII we generated.
pub fn set_cookie(headers: &mut HeaderMap, cookie: &str) -> AppResult<()> {
    let value =
        HeaderValue::from_str(cookie).map_err(|err| AppError::Internal(err.to_string()))?;
    headers.append(SET_COOKIE, value);
    Ok(())
}

/// Everything known about whoever sent the request.
#[derive(Debug, Clone, Default)]
pub struct Visitor {
    pub user: Option<User>,
    pub session_token: Option<String>,
    pub guest_token: Option<String>,
    pub cart_units: i64,
    pub flagged: i64,
}

impl Visitor {
    pub fn nav(&self) -> Nav {
        Nav {
            user: self.user.clone(),
            cart_units: self.cart_units,
            flagged: self.flagged,
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }

    /// Whose cart this request works on; `None` for a guest without a cart
    /// cookie yet.
    pub fn cart_owner(&self) -> Option<CartOwner> {
        match (&self.user, &self.guest_token) {
            (Some(user), _) => Some(CartOwner::User(user.id)),
            (None, Some(token)) => Some(CartOwner::Guest(token.clone())),
            (None, None) => None,
        }
    }

    async fn load(parts: &Parts, state: &AppState) -> AppResult<Self> {
        let session_token = read_cookie(&parts.headers, SESSION_COOKIE).and_then(well_formed_token);
        let guest_token = read_cookie(&parts.headers, CART_COOKIE).and_then(well_formed_token);

        let lookup_session = session_token.clone();
        let lookup_guest = guest_token.clone();
        let (user, cart_units, flagged) = state
            .db
            .call(move |conn| {
                let user = match &lookup_session {
                    Some(token) => resolve_session(conn, token)?,
                    None => None,
                };
                let cart = match (&user, &lookup_guest) {
                    (Some(user), _) => carts::find_for_user(conn, user.id)?,
                    (None, Some(token)) => carts::find_for_guest(conn, token)?,
                    (None, None) => None,
                };
                let cart_units = match cart {
                    Some(cart) => carts::unit_count(conn, cart.id)?,
                    None => 0,
                };
                let flagged = match &user {
                    Some(user) => observations::flagged_count(conn, user.id)?,
                    None => 0,
                };
                Ok((user, cart_units, flagged))
            })
            .await?;

        Ok(Self {
            session_token: user.as_ref().and(session_token),
            user,
            guest_token,
            cart_units,
            flagged,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Visitor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(visitor) = parts.extensions.get::<Visitor>() {
            return Ok(visitor.clone());
        }
        let visitor = Visitor::load(parts, state).await?;
        parts.extensions.insert(visitor.clone());
        Ok(visitor)
    }
}

/// A logged-in user; anonymous visitors are sent to the login page.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let visitor = Visitor::from_request_parts(parts, state).await?;
        visitor.user.map(CurrentUser).ok_or(AppError::Unauthorized)
    }
}

/// An approved seller or an admin.
#[derive(Debug, Clone)]
pub struct SellerUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for SellerUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        match user.role {
            Role::Seller | Role::Admin => Ok(SellerUser(user)),
            Role::Customer => Err(AppError::Forbidden),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.role == Role::Admin {
            Ok(AdminUser(user))
        } else {
            Err(AppError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cookies: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for cookie in cookies {
            headers.append(COOKIE, HeaderValue::from_str(cookie).unwrap());
        }
        headers
    }

    #[test]
    fn test_read_cookie() {
        let h = headers(&["theme=dark; funshop_session=abc", "funshop_cart=xyz"]);
        assert_eq!(read_cookie(&h, SESSION_COOKIE).as_deref(), Some("abc"));
        assert_eq!(read_cookie(&h, CART_COOKIE).as_deref(), Some("xyz"));
        assert_eq!(read_cookie(&h, "missing"), None);
        assert_eq!(read_cookie(&headers(&["funshop_session="]), SESSION_COOKIE), None);
    }

    #[test]
    fn test_only_uuid_tokens_are_accepted() {
        assert!(well_formed_token("not-a-token".into()).is_none());
        let token = uuid::Uuid::new_v4().to_string();
        assert_eq!(well_formed_token(token.clone()), Some(token));
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = build_cookie(SESSION_COOKIE, "t", 60, true);
        assert_eq!(
            cookie,
            "funshop_session=t; Path=/; HttpOnly; SameSite=Lax; Max-Age=60; Secure"
        );
        assert!(expire_cookie(CART_COOKIE).ends_with("Max-Age=0"));
    }

    #[test]
    fn test_cart_owner_prefers_user() {
        let guest = Visitor {
            guest_token: Some("g".into()),
            ..Visitor::default()
        };
        assert_eq!(guest.cart_owner(), Some(CartOwner::Guest("g".into())));
        assert_eq!(Visitor::default().cart_owner(), None);
    }
}
