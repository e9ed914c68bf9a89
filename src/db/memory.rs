use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;

use super::{AccountStore, StoreError, UserStore};
use crate::models::{Account, AccountFilter, AccountUpdate, DocumentId, NewAccount, NewUser, User};

/// Process-local account collection, used for tests and `STORAGE_BACKEND=memory`.
///
/// Ids come from `DocumentId::generate`, so map order is creation order.
#[derive(Clone, Default)]
pub struct MemoryAccountStore {
    accounts: Arc<RwLock<BTreeMap<DocumentId, Account>>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find(
        &self,
        filter: &AccountFilter,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Account>, StoreError> {
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        let accounts = self.accounts.read();
        Ok(accounts
            .values()
            .rev()
            .filter(|a| filter.matches(a))
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn insert_one(&self, account: NewAccount) -> Result<DocumentId, StoreError> {
        let id = DocumentId::generate();
        self.accounts.write().insert(id, account.with_id(id));
        Ok(id)
    }

    async fn find_one(&self, id: &DocumentId) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.read().get(id).cloned())
    }

    async fn update_one(&self, id: &DocumentId, patch: &AccountUpdate) -> Result<u64, StoreError> {
        match self.accounts.write().get_mut(id) {
            Some(account) => {
                patch.apply(account);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_one(&self, id: &DocumentId) -> Result<u64, StoreError> {
        Ok(self.accounts.write().remove(id).map_or(0, |_| 1))
    }
}

/// Users keyed by (normalized) email.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<DashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert_one(&self, user: NewUser) -> Result<DocumentId, StoreError> {
        if self.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate(format!("username {}", user.username)));
        }
        match self.users.entry(user.email.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(StoreError::Duplicate(format!("email {}", user.email)))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let id = DocumentId::generate();
                slot.insert(user.with_id(id));
                Ok(id)
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(email).map(|u| u.value().clone()))
    }

    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountStatus, AccountType, Role};

    fn new_account(name: &str, rate: Option<f64>) -> NewAccount {
        NewAccount {
            account_number: None,
            account_type: AccountType::Checking,
            rate,
            name: name.to_string(),
            institution: None,
            status: AccountStatus::Open,
        }
    }

    #[tokio::test]
    async fn test_find_returns_newest_first() {
        let store = MemoryAccountStore::new();
        let first = store.insert_one(new_account("first", None)).await.unwrap();
        let second = store.insert_one(new_account("second", None)).await.unwrap();

        let found = store.find(&AccountFilter::default(), 0, 25).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, second);
        assert_eq!(found[1].id, first);
    }

    #[tokio::test]
    async fn test_update_and_delete_report_counts() {
        let store = MemoryAccountStore::new();
        let id = store.insert_one(new_account("acct", Some(1.0))).await.unwrap();
        let missing = DocumentId::generate();

        let patch = AccountUpdate { rate: Some(Some(2.0)) };
        assert_eq!(store.update_one(&id, &patch).await.unwrap(), 1);
        assert_eq!(store.update_one(&missing, &patch).await.unwrap(), 0);
        assert_eq!(store.find_one(&id).await.unwrap().unwrap().rate, Some(2.0));

        assert_eq!(store.delete_one(&id).await.unwrap(), 1);
        assert_eq!(store.delete_one(&id).await.unwrap(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_user_store_rejects_duplicates() {
        let store = MemoryUserStore::new();
        let user = NewUser {
            username: "jane".to_string(),
            email: "jane@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Operator,
        };
        store.insert_one(user.clone()).await.unwrap();

        let same_email = NewUser { username: "janet".to_string(), ..user.clone() };
        assert!(matches!(store.insert_one(same_email).await, Err(StoreError::Duplicate(_))));

        let same_name = NewUser { email: "other@example.com".to_string(), ..user };
        assert!(matches!(store.insert_one(same_name).await, Err(StoreError::Duplicate(_))));
    }
}
