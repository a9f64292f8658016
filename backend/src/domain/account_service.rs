//! Session identity domain service.
//!
//! Authentication mechanics are out of scope; sessions are established by
//! resolving an email through the directory, and every request re-resolves
//! the stored user id so stale sessions surface as unauthorised rather than
//! acting on deleted accounts.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::policy::Caller;
use crate::domain::ports::{Accounts, DirectoryError, UserDirectory};
use crate::domain::{EmailAddress, Error, User, UserId};

/// Accounts service implementing the [`Accounts`] driving port.
#[derive(Clone)]
pub struct AccountService<U> {
    users: Arc<U>,
}

impl<U> AccountService<U> {
    /// Create a new service over the user directory.
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }
}

impl<U> AccountService<U>
where
    U: UserDirectory,
{
    fn map_directory_error(error: DirectoryError) -> Error {
        match error {
            DirectoryError::Connection { message } => {
                Error::service_unavailable(format!("user directory unavailable: {message}"))
            }
            DirectoryError::Query { message } => {
                Error::internal(format!("user directory error: {message}"))
            }
        }
    }
}

#[async_trait]
impl<U> Accounts for AccountService<U>
where
    U: UserDirectory,
{
    async fn login(&self, email: &EmailAddress) -> Result<User, Error> {
        self.users
            .find_by_email(email)
            .await
            .map_err(Self::map_directory_error)?
            .ok_or_else(|| Error::unauthorized("unknown email address"))
    }

    async fn resolve_caller(&self, user_id: &UserId) -> Result<Caller, Error> {
        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(Self::map_directory_error)?
            .ok_or_else(|| Error::unauthorized("session user no longer exists"))?;
        Ok(Caller::from_user(&user))
    }

    async fn profile(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(Self::map_directory_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayName, ErrorCode, Role};
    use crate::test_support::InMemoryUsers;
    use rstest::rstest;

    fn directory_with_ada() -> (Arc<InMemoryUsers>, User) {
        let users = Arc::new(InMemoryUsers::new());
        let ada = User::new(
            UserId::random(),
            DisplayName::new("Ada Lovelace").expect("valid name"),
            EmailAddress::new("ada@example.com").expect("valid email"),
            Role::Student,
        );
        users.insert(ada.clone());
        (users, ada)
    }

    #[rstest]
    #[tokio::test]
    async fn login_resolves_known_emails() {
        let (users, ada) = directory_with_ada();
        let service = AccountService::new(users);

        let user = service
            .login(ada.email())
            .await
            .expect("known email resolves");
        assert_eq!(user.id(), ada.id());
    }

    #[rstest]
    #[tokio::test]
    async fn login_rejects_unknown_emails() {
        let (users, _) = directory_with_ada();
        let service = AccountService::new(users);

        let error = service
            .login(&EmailAddress::new("nobody@example.com").expect("valid email"))
            .await
            .expect_err("unknown email rejected");
        assert_eq!(error.code(), ErrorCode::Unauthorized);
    }

    #[rstest]
    #[tokio::test]
    async fn stale_sessions_surface_as_unauthorised() {
        let (users, _) = directory_with_ada();
        let service = AccountService::new(users);

        let error = service
            .resolve_caller(&UserId::random())
            .await
            .expect_err("stale session rejected");
        assert_eq!(error.code(), ErrorCode::Unauthorized);
    }
}
