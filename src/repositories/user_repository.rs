// src/repositories/user_repository.rs
//
// User persistence

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{Transaction, WriteTransaction};
use crate::domain::{validate_login_name, User, UserId, UserType};
use crate::error::{AppError, AppResult};

pub trait UserRepository: Send + Sync {
    fn find_by_login(&self, tx: &dyn Transaction, login_name: &str) -> AppResult<Option<User>>;
    fn find_by_id(&self, tx: &dyn Transaction, id: UserId) -> AppResult<Option<User>>;
    fn count(&self, tx: &dyn Transaction) -> AppResult<i64>;
    fn create(
        &self,
        tx: &WriteTransaction<'_>,
        login_name: &str,
        user_type: UserType,
    ) -> AppResult<User>;
    fn set_last_login(
        &self,
        tx: &WriteTransaction<'_>,
        id: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<()>;
}

pub struct SqliteUserRepository;

impl SqliteUserRepository {
    pub fn new() -> Self {
        Self
    }

    fn row_to_user(row: &Row) -> Result<User, rusqlite::Error> {
        let user_type: String = row.get(2)?;
        let last_login: Option<String> = row.get(3)?;

        let user_type = user_type
            .parse::<UserType>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

        let last_login = last_login
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e))
                    })
            })
            .transpose()?;

        Ok(User {
            id: row.get(0)?,
            login_name: row.get(1)?,
            user_type,
            last_login,
        })
    }
}

impl Default for SqliteUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl UserRepository for SqliteUserRepository {
    fn find_by_login(&self, tx: &dyn Transaction, login_name: &str) -> AppResult<Option<User>> {
        let user = tx
            .connection()
            .query_row(
                r#"SELECT id, login_name, type, last_login FROM "user" WHERE login_name = ?1"#,
                params![login_name],
                Self::row_to_user,
            )
            .optional()?;

        Ok(user)
    }

    fn find_by_id(&self, tx: &dyn Transaction, id: UserId) -> AppResult<Option<User>> {
        let user = tx
            .connection()
            .query_row(
                r#"SELECT id, login_name, type, last_login FROM "user" WHERE id = ?1"#,
                params![id],
                Self::row_to_user,
            )
            .optional()?;

        Ok(user)
    }

    fn count(&self, tx: &dyn Transaction) -> AppResult<i64> {
        let count = tx
            .connection()
            .query_row(r#"SELECT COUNT(*) FROM "user""#, [], |row| row.get(0))?;

        Ok(count)
    }

    fn create(
        &self,
        tx: &WriteTransaction<'_>,
        login_name: &str,
        user_type: UserType,
    ) -> AppResult<User> {
        validate_login_name(login_name)?;

        let conn = tx.connection();
        conn.execute(
            r#"INSERT INTO "user" (login_name, type) VALUES (?1, ?2)"#,
            params![login_name, user_type.to_string()],
        )?;

        Ok(User {
            id: UserId(conn.last_insert_rowid()),
            login_name: login_name.to_string(),
            user_type,
            last_login: None,
        })
    }

    fn set_last_login(
        &self,
        tx: &WriteTransaction<'_>,
        id: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let rows_affected = tx.connection().execute(
            r#"UPDATE "user" SET last_login = ?1 WHERE id = ?2"#,
            params![at.to_rfc3339(), id],
        )?;

        if rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
