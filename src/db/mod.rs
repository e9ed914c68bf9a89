pub mod account_queries;
pub mod user_queries;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Account, AccountFilter, AccountUpdate, DocumentId, NewAccount, NewUser, User};

pub use account_queries::MongoAccountStore;
pub use memory::{MemoryAccountStore, MemoryUserStore};
pub use user_queries::MongoUserStore;

pub const ACCOUNTS_COLLECTION: &str = "accounts";
pub const USERS_COLLECTION: &str = "users";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("duplicate key: {0}")]
    Duplicate(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::{ErrorKind, WriteFailure};

        match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == 11000 => {
                StoreError::Duplicate(write.message.clone())
            }
            ErrorKind::BsonDeserialization(e) => StoreError::Malformed(e.to_string()),
            ErrorKind::BsonSerialization(e) => StoreError::Malformed(e.to_string()),
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

/// Document collection holding financial accounts.
///
/// Every method is a single-document operation (except `find`), atomic at the
/// store level. No locking happens above this trait.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Matching accounts, newest id first.
    async fn find(
        &self,
        filter: &AccountFilter,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Account>, StoreError>;

    async fn insert_one(&self, account: NewAccount) -> Result<DocumentId, StoreError>;

    async fn find_one(&self, id: &DocumentId) -> Result<Option<Account>, StoreError>;

    /// Returns the number of matched documents (0 or 1).
    async fn update_one(&self, id: &DocumentId, patch: &AccountUpdate) -> Result<u64, StoreError>;

    /// Returns the number of deleted documents (0 or 1).
    async fn delete_one(&self, id: &DocumentId) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `StoreError::Duplicate` when the email or username is taken.
    async fn insert_one(&self, user: NewUser) -> Result<DocumentId, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_all(&self) -> Result<Vec<User>, StoreError>;
}
