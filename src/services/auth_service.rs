// src/services/auth_service.rs
//
// The two catalog calls the authentication workflow makes

use chrono::Utc;
use std::sync::Arc;

use crate::db::Session;
use crate::domain::{UserId, UserType};
use crate::error::{AppError, AppResult};
use crate::repositories::UserRepository;

pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
}

impl AuthService {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    /// Resolve a login name to a user, creating the user on first sight.
    /// The very first user of the catalog is made an administrator.
    pub fn get_or_create_user(&self, session: &Session<'_>, login_name: &str) -> AppResult<UserId> {
        session.write(|tx| {
            if let Some(user) = self.user_repo.find_by_login(tx, login_name)? {
                return Ok(user.id);
            }

            let user_type = if self.user_repo.count(tx)? == 0 {
                UserType::Admin
            } else {
                UserType::Regular
            };

            let user = self.user_repo.create(tx, login_name, user_type)?;
            log::debug!(
                "Created {} user '{}' with id {}",
                user.user_type,
                user.login_name,
                user.id
            );

            Ok(user.id)
        })
    }

    /// Record a successful login. Unknown ids are ignored.
    pub fn on_user_authenticated(&self, session: &Session<'_>, user_id: UserId) -> AppResult<()> {
        session.write(|tx| match self.user_repo.set_last_login(tx, user_id, Utc::now()) {
            Err(AppError::NotFound) => {
                log::debug!("Login recorded for unknown user {}", user_id);
                Ok(())
            }
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::SqliteUserRepository;
    use crate::test_utils::open_test_database;

    fn service() -> AuthService {
        AuthService::new(Arc::new(SqliteUserRepository::new()))
    }

    #[test]
    fn test_first_user_is_admin() {
        let t = open_test_database();
        let session = t.db.session();
        let auth = service();
        let users = SqliteUserRepository::new();

        let first = auth.get_or_create_user(&session, "alice").unwrap();
        let second = auth.get_or_create_user(&session, "bob").unwrap();

        let (first, second) = session
            .read(|tx| Ok((users.find_by_id(tx, first)?, users.find_by_id(tx, second)?)))
            .unwrap();
        assert_eq!(first.unwrap().user_type, UserType::Admin);
        assert_eq!(second.unwrap().user_type, UserType::Regular);
    }

    #[test]
    fn test_existing_user_is_returned() {
        let t = open_test_database();
        let session = t.db.session();
        let auth = service();

        let a = auth.get_or_create_user(&session, "alice").unwrap();
        let b = auth.get_or_create_user(&session, "alice").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_login_timestamp_recorded() {
        let t = open_test_database();
        let session = t.db.session();
        let auth = service();
        let users = SqliteUserRepository::new();

        let id = auth.get_or_create_user(&session, "alice").unwrap();
        let before = Utc::now();
        auth.on_user_authenticated(&session, id).unwrap();

        let user = session.read(|tx| users.find_by_id(tx, id)).unwrap().unwrap();
        let last_login = user.last_login.unwrap();
        assert!(last_login >= before - chrono::Duration::seconds(1));
    }

    #[test]
    fn test_unknown_user_login_is_ignored() {
        let t = open_test_database();
        let session = t.db.session();

        service().on_user_authenticated(&session, UserId(77)).unwrap();
    }
}
