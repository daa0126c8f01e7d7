//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::Error;

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(i64);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// An account that may obtain tokens and read the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The name the user signs in with.
    pub username: String,
    /// The bcrypt hash of the user's password.
    pub password_hash: String,
}

impl User {
    /// Check `password` against the stored hash.
    ///
    /// # Errors
    /// Returns [Error::HashingError] if the stored hash is not a valid
    /// bcrypt hash.
    pub fn verify_password(&self, password: &str) -> Result<bool, Error> {
        bcrypt::verify(password, &self.password_hash)
            .map_err(|error| Error::HashingError(error.to_string()))
    }
}

pub(crate) fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

fn map_row_to_user(row: &Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: UserId::new(row.get(0)?),
        username: row.get(1)?,
        password_hash: row.get(2)?,
    })
}

/// Create and insert a new user into the database, hashing `password`.
///
/// # Errors
/// Returns [Error::HashingError] if the password could not be hashed, or
/// [Error::SqlError] if an SQL related error occurred (e.g. the username
/// is taken).
pub fn create_user(username: &str, password: &str, connection: &Connection) -> Result<User, Error> {
    let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    connection.execute(
        "INSERT INTO user (username, password) VALUES (?1, ?2)",
        (username, &password_hash),
    )?;

    Ok(User {
        id: UserId::new(connection.last_insert_rowid()),
        username: username.to_owned(),
        password_hash,
    })
}

/// Retrieve the user that signs in as `username`.
///
/// # Errors
/// Returns [Error::NotFound] if no such user exists, or [Error::SqlError]
/// if there is some other SQL error.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    let user = connection
        .prepare("SELECT id, username, password FROM user WHERE username = ?1")?
        .query_row((username,), map_row_to_user)?;

    Ok(user)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::{create_user, get_user_by_username};
    use crate::{Error, db::initialize};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    #[test]
    fn create_and_fetch_user() {
        let connection = get_test_connection();

        let created = create_user("apiuser", "apiuserpass", &connection).unwrap();
        let got = get_user_by_username("apiuser", &connection).unwrap();

        assert_eq!(got, created);
    }

    #[test]
    fn verify_password_accepts_the_right_password() {
        let connection = get_test_connection();
        let user = create_user("apiuser", "apiuserpass", &connection).unwrap();

        assert!(user.verify_password("apiuserpass").unwrap());
        assert!(!user.verify_password("wrong").unwrap());
    }

    #[test]
    fn unknown_username_returns_not_found() {
        let connection = get_test_connection();

        let got = get_user_by_username("ghost", &connection);

        assert_eq!(got, Err(Error::NotFound));
    }
}
