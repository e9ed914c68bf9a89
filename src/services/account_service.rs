use serde::Deserialize;
use tracing::{debug, warn};

use crate::db::AccountStore;
use crate::errors::AppError;
use crate::models::{
    Account, AccountFilter, AccountStatus, AccountType, AccountUpdate, CreateAccount, DocumentId,
    NewAccount,
};

pub const RESULTS_PER_PAGE: u64 = 25;

/// Largest offset the store accepts; MongoDB encodes `skip` as an i64.
pub const MAX_SKIP: u64 = i64::MAX as u64;

/// Query string of `GET /accounts/`.
///
/// `min_price`/`max_price` bound `rate` (exclusive) and only apply when given.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountQuery {
    #[serde(default, alias = "min_rate")]
    pub min_price: Option<f64>,
    #[serde(default, alias = "max_rate")]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub rate: Option<f64>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub status: Option<AccountStatus>,
    #[serde(default)]
    pub account_type: Option<AccountType>,
}

impl AccountQuery {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.page() == 0 {
            return Err(AppError::Validation("page must be at least 1".into()));
        }
        if self.min_price.is_some_and(|min| min < 0.0) {
            return Err(AppError::Validation("min_price cannot be negative".into()));
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min >= max {
                return Err(AppError::Validation("min_price must be below max_price".into()));
            }
        }
        Ok(())
    }

    pub fn filter(&self) -> AccountFilter {
        AccountFilter {
            rate_above: self.min_price,
            rate_below: self.max_price,
            rate: self.rate,
            status: self.status,
            account_type: self.account_type,
        }
    }

    /// Offset of the first record on this page, capped at `MAX_SKIP`.
    pub fn skip(&self) -> u64 {
        (self.page() - 1)
            .saturating_mul(RESULTS_PER_PAGE)
            .min(MAX_SKIP)
    }
}

pub async fn list(store: &dyn AccountStore, query: AccountQuery) -> Result<Vec<Account>, AppError> {
    query.validate()?;
    let filter = query.filter();
    debug!("Listing accounts with {:?}, page {}", filter, query.page());
    let accounts = store
        .find(&filter, query.skip(), RESULTS_PER_PAGE as i64)
        .await?;
    Ok(accounts)
}

pub async fn create(store: &dyn AccountStore, input: CreateAccount) -> Result<Account, AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("Account name cannot be empty".into()));
    }
    if input.institution.as_ref().is_some_and(|i| i.name.trim().is_empty()) {
        return Err(AppError::Validation("Institution name cannot be empty".into()));
    }
    let id = store.insert_one(NewAccount::from_request(input)).await?;

    // Read back so storage-side defaults are reflected in the response.
    store.find_one(&id).await?.ok_or_else(|| {
        warn!("Account {} vanished right after insert", id);
        AppError::Internal(format!("Inserted account {} could not be read back", id))
    })
}

pub async fn fetch_one(store: &dyn AccountStore, id: &DocumentId) -> Result<Account, AppError> {
    store
        .find_one(id)
        .await?
        .ok_or_else(|| AppError::account_not_found(id))
}

/// Applies the patch then reads the record back. A missing id surfaces on the
/// read, not on the write.
pub async fn update(
    store: &dyn AccountStore,
    id: &DocumentId,
    patch: AccountUpdate,
) -> Result<Account, AppError> {
    if !patch.is_empty() {
        let matched = store.update_one(id, &patch).await?;
        debug!("Update of account {} matched {} document(s)", id, matched);
    }
    fetch_one(store, id).await
}

pub async fn delete(store: &dyn AccountStore, id: &DocumentId) -> Result<(), AppError> {
    match store.delete_one(id).await? {
        1 => Ok(()),
        _ => Err(AppError::account_not_found(id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryAccountStore;
    use crate::models::CreateInstitution;

    fn checking(name: &str) -> CreateAccount {
        CreateAccount {
            account_number: None,
            account_type: AccountType::Checking,
            rate: None,
            name: name.to_string(),
            institution: None,
        }
    }

    #[tokio::test]
    async fn test_create_then_fetch_matches_payload() {
        let store = MemoryAccountStore::new();
        let input = CreateAccount {
            account_number: Some("000123".to_string()),
            account_type: AccountType::MoneyMarket,
            rate: Some(4.25),
            name: "Marcus MM".to_string(),
            institution: Some(CreateInstitution { id: None, name: "Goldman Sachs".to_string() }),
        };

        let created = create(&store, input.clone()).await.unwrap();
        let fetched = fetch_one(&store, &created.id).await.unwrap();

        assert_eq!(created, fetched);
        assert_eq!(fetched.account_number, input.account_number);
        assert_eq!(fetched.account_type, input.account_type);
        assert_eq!(fetched.rate, input.rate);
        assert_eq!(fetched.name, input.name);
        assert_eq!(fetched.institution.unwrap().name, "Goldman Sachs");
        assert_eq!(fetched.status, AccountStatus::Open);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name_before_storage() {
        let store = MemoryAccountStore::new();
        let err = create(&store, checking("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_missing_id_is_not_found_everywhere() {
        let store = MemoryAccountStore::new();
        let id = DocumentId::generate();

        assert!(matches!(fetch_one(&store, &id).await, Err(AppError::NotFound(_))));
        let patch = AccountUpdate { rate: Some(Some(1.0)) };
        assert!(matches!(update(&store, &id, patch).await, Err(AppError::NotFound(_))));
        assert!(matches!(delete(&store, &id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_changes_only_rate() {
        let store = MemoryAccountStore::new();
        let created = create(&store, checking("Chase Checking")).await.unwrap();

        let updated = update(&store, &created.id, AccountUpdate { rate: Some(Some(5.5)) })
            .await
            .unwrap();
        assert_eq!(updated.rate, Some(5.5));
        assert_eq!(Account { rate: None, ..updated.clone() }, created);

        let untouched = update(&store, &created.id, AccountUpdate::default()).await.unwrap();
        assert_eq!(untouched, updated);
    }

    #[tokio::test]
    async fn test_delete_then_fetch_is_not_found() {
        let store = MemoryAccountStore::new();
        let created = create(&store, checking("Chase Checking")).await.unwrap();

        delete(&store, &created.id).await.unwrap();
        assert!(matches!(fetch_one(&store, &created.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(delete(&store, &created.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_paginates_newest_first() {
        let store = MemoryAccountStore::new();
        let mut ids = Vec::new();
        for i in 0..30 {
            ids.push(create(&store, checking(&format!("acct-{i}"))).await.unwrap().id);
        }
        ids.reverse();

        let first = list(&store, AccountQuery::default()).await.unwrap();
        assert_eq!(first.len(), 25);
        assert_eq!(first[0].id, ids[0]);

        let second = list(&store, AccountQuery { page: Some(2), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(second.len(), 5);
        assert_eq!(second[0].id, ids[25]);

        let beyond = list(&store, AccountQuery { page: Some(9), ..Default::default() })
            .await
            .unwrap();
        assert!(beyond.is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_by_rate() {
        let store = MemoryAccountStore::new();
        create(&store, checking("no rate")).await.unwrap();
        let mut savings = checking("savings");
        savings.rate = Some(0.01);
        let savings = create(&store, savings).await.unwrap();

        let by_rate = list(&store, AccountQuery { rate: Some(0.01), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(by_rate, vec![savings.clone()]);

        let ranged = list(
            &store,
            AccountQuery { min_price: Some(0.0), max_price: Some(1.0), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(ranged, vec![savings]);

        let unbounded = list(&store, AccountQuery::default()).await.unwrap();
        assert_eq!(unbounded.len(), 2);
    }

    #[tokio::test]
    async fn test_list_rejects_bad_query() {
        let store = MemoryAccountStore::new();
        for query in [
            AccountQuery { page: Some(0), ..Default::default() },
            AccountQuery { min_price: Some(-1.0), ..Default::default() },
            AccountQuery { min_price: Some(5.0), max_price: Some(5.0), ..Default::default() },
        ] {
            assert!(matches!(list(&store, query).await, Err(AppError::Validation(_))));
        }
    }

    #[test]
    fn test_skip_offsets() {
        assert_eq!(AccountQuery::default().skip(), 0);
        assert_eq!(AccountQuery { page: Some(2), ..Default::default() }.skip(), 25);
        assert_eq!(AccountQuery { page: Some(u64::MAX), ..Default::default() }.skip(), MAX_SKIP);
    }

    #[tokio::test]
    async fn test_huge_page_is_empty_not_an_error() {
        let store = MemoryAccountStore::new();
        create(&store, checking("Chase Checking")).await.unwrap();

        let page = list(&store, AccountQuery { page: Some(u64::MAX), ..Default::default() })
            .await
            .unwrap();
        assert!(page.is_empty());
    }
}
