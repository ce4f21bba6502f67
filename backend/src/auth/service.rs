//! Core business logic for the authentication system.
//!
//! This service handles account creation, password hashing, credential
//! checks and the server-side session table. Password hashing runs on the
//! blocking pool so it never holds the database lock.

use std::time::Duration;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use super::errors::AuthError;
use super::models::{normalize_email, NewAccount};
use crate::database::models::{Role, User};
use crate::database::queries::{sessions, users};
use crate::database::{now_unix, Database};
use crate::errors::{AppError, AppResult};
use crate::services::cart;

#[cfg(not(test))]
fn hasher() -> Argon2<'static> {
    Argon2::default()
}

// Minimum-cost parameters keep the test suite fast.
#[cfg(test)]
fn hasher() -> Argon2<'static> {
    let params = argon2::Params::new(8, 1, 1, None).unwrap_or_default();
    Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params)
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    // A v4 uuid carries 122 random bits, plenty for a salt.
    let salt = SaltString::encode_b64(uuid::Uuid::new_v4().as_bytes())
        .map_err(|err| AuthError::Hashing(err.to_string()))?;
    hasher()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::Hashing(err.to_string()))
}

/// `false` for a wrong password and for an unparsable stored hash.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => hasher()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

async fn hash_off_thread(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|err| AppError::Internal(err.to_string()))?
        .map_err(AppError::from)
}

/// Create a customer account.
pub async fn register(db: &Database, account: NewAccount) -> AppResult<User> {
    let NewAccount {
        email,
        name,
        password,
    } = account;

    let taken = {
        let email = email.clone();
        db.call(move |conn| Ok(users::email_exists(conn, &email)?))
            .await?
    };
    if taken {
        return Err(AuthError::EmailTaken.into());
    }

    let password_hash = hash_off_thread(password).await?;
    let user = db
        .call(move |conn| {
            // The email may have been claimed while we were hashing.
            if users::email_exists(conn, &email)? {
                return Err(AuthError::EmailTaken.into());
            }
            let id = users::insert(conn, &email, &name, &password_hash, Role::Customer)?;
            users::find_by_id(conn, id)?
                .ok_or_else(|| AppError::Internal("new user vanished".to_string()))
        })
        .await?;

    tracing::info!(user_id = user.id, "account registered");
    Ok(user)
}

/// Check credentials; any mismatch is `InvalidCredentials`.
pub async fn authenticate(db: &Database, email: &str, password: String) -> AppResult<User> {
    let email = normalize_email(email).map_err(|_| AuthError::InvalidCredentials)?;
    let user = db
        .call(move |conn| Ok(users::find_by_email(conn, &email)?))
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let stored = user.password_hash.clone();
    let ok = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|err| AppError::Internal(err.to_string()))?;

    if ok {
        Ok(user)
    } else {
        tracing::debug!(user_id = user.id, "password mismatch");
        Err(AuthError::InvalidCredentials.into())
    }
}

/// Open a session for `user_id` and fold any guest cart into the user's cart.
/// Returns the new session token.
pub async fn start_session(
    db: &Database,
    user_id: i64,
    ttl: Duration,
    guest_token: Option<String>,
) -> AppResult<String> {
    let token = uuid::Uuid::new_v4().to_string();
    let expires_at = now_unix() + ttl.as_secs() as i64;

    let session_token = token.clone();
    db.call(move |conn| {
        sessions::delete_expired(conn, now_unix())?;
        sessions::insert(conn, &session_token, user_id, expires_at)?;
        if let Some(guest) = guest_token {
            cart::merge_guest_cart(conn, &guest, user_id)?;
        }
        Ok(())
    })
    .await?;

    Ok(token)
}

/// Look up the user behind a session token. Expired sessions are removed.
pub fn resolve_session(conn: &rusqlite::Connection, token: &str) -> AppResult<Option<User>> {
    let Some(session) = sessions::find(conn, token)? else {
        return Ok(None);
    };
    if session.expires_at <= now_unix() {
        sessions::delete(conn, token)?;
        return Ok(None);
    }
    Ok(users::find_by_id(conn, session.user_id)?)
}

pub async fn end_session(db: &Database, token: String) -> AppResult<()> {
    db.call(move |conn| {
        sessions::delete(conn, &token)?;
        Ok(())
    })
    .await
}

/// Create the configured administrator if no account uses that email yet.
/// Returns whether an account was created.
pub async fn ensure_admin(db: &Database, email: &str, password: &str) -> AppResult<bool> {
    let email = normalize_email(email)?;
    let exists = {
        let email = email.clone();
        db.call(move |conn| Ok(users::email_exists(conn, &email)?))
            .await?
    };
    if exists {
        return Ok(false);
    }

    let password_hash = hash_off_thread(password.to_string()).await?;
    db.call(move |conn| {
        users::insert(conn, &email, "Administrator", &password_hash, Role::Admin)?;
        Ok(())
    })
    .await?;
    tracing::info!("bootstrap admin account created");
    Ok(true)
}
