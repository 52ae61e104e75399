use crate::error::Error;
use async_trait::async_trait;
use uuid::Uuid;

/// Credential record for a strategy owner.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub betfair_username: String,
    pub betfair_password: String,
    pub betfair_key: String,
}

#[async_trait]
pub trait UserService: Send + Sync {
    async fn by_id(&self, user_id: Uuid) -> Result<User, Error>;
}

/// Interim single-user store backed by environment configuration, until
/// abstract user management lands.
pub struct ConfigUserService {
    user: User,
}

impl ConfigUserService {
    pub fn new(user: User) -> Self {
        Self { user }
    }
}

#[async_trait]
impl UserService for ConfigUserService {
    async fn by_id(&self, user_id: Uuid) -> Result<User, Error> {
        if user_id != self.user.id {
            return Err(Error::UserNotFound(user_id));
        }

        Ok(self.user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "trader@example.com".to_string(),
            betfair_username: "trader".to_string(),
            betfair_password: "secret".to_string(),
            betfair_key: "app-key".to_string(),
        }
    }

    #[tokio::test]
    async fn returns_the_configured_user() {
        let configured = user();
        let service = ConfigUserService::new(configured.clone());

        let found = service.by_id(configured.id).await.unwrap();
        assert_eq!(found.betfair_username, "trader");
    }

    #[tokio::test]
    async fn any_other_id_is_not_found() {
        let service = ConfigUserService::new(user());

        let err = service.by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::UserNotFound(_)));
    }
}
