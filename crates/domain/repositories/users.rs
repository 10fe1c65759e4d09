use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::users::UserEntity;

#[automock]
#[async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, user_id: i32) -> Result<Option<UserEntity>>;
}
