use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::options::FindOptions;
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};

use super::{AccountStore, StoreError, ACCOUNTS_COLLECTION};
use crate::models::{
    Account, AccountFilter, AccountStatus, AccountType, AccountUpdate, DocumentId, Institution,
    NewAccount,
};

// Shape of an account as persisted in MongoDB.
#[derive(Debug, Serialize, Deserialize)]
struct AccountDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(default)]
    account_number: Option<String>,
    account_type: AccountType,
    #[serde(default)]
    rate: Option<f64>,
    name: String,
    #[serde(default)]
    institution: Option<InstitutionDocument>,
    #[serde(default)]
    status: AccountStatus,
}

#[derive(Debug, Serialize, Deserialize)]
struct InstitutionDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
}

impl From<AccountDocument> for Account {
    fn from(doc: AccountDocument) -> Self {
        Account {
            id: DocumentId::from_object_id(doc.id),
            account_number: doc.account_number,
            account_type: doc.account_type,
            rate: doc.rate,
            name: doc.name,
            institution: doc.institution.map(|i| Institution {
                id: DocumentId::from_object_id(i.id),
                name: i.name,
            }),
            status: doc.status,
        }
    }
}

#[derive(Clone)]
pub struct MongoAccountStore {
    accounts: Collection<AccountDocument>,
    raw: Collection<Document>,
}

impl MongoAccountStore {
    pub fn new(db: &Database) -> Self {
        Self {
            accounts: db.collection(ACCOUNTS_COLLECTION),
            raw: db.collection(ACCOUNTS_COLLECTION),
        }
    }
}

fn by_id(id: &DocumentId) -> Document {
    doc! { "_id": id.object_id() }
}

/// New-account document without `_id`; the server assigns one on insert.
pub(crate) fn insert_document(account: &NewAccount) -> Document {
    let institution = account.institution.as_ref().map(|i| {
        doc! { "_id": i.id.object_id(), "name": i.name.as_str() }
    });
    doc! {
        "account_number": account.account_number.clone(),
        "account_type": account.account_type.as_str(),
        "rate": account.rate,
        "name": account.name.as_str(),
        "institution": institution,
        "status": account.status.to_string(),
    }
}

pub(crate) fn filter_document(filter: &AccountFilter) -> Document {
    let mut query = Document::new();

    let mut rate = Document::new();
    if let Some(min) = filter.rate_above {
        rate.insert("$gt", min);
    }
    if let Some(max) = filter.rate_below {
        rate.insert("$lt", max);
    }
    if let Some(exact) = filter.rate {
        rate.insert("$eq", exact);
    }
    if !rate.is_empty() {
        query.insert("rate", rate);
    }

    if let Some(status) = filter.status {
        query.insert("status", status.to_string());
    }
    if let Some(account_type) = filter.account_type {
        query.insert("account_type", account_type.as_str());
    }
    query
}

/// `$set` body for a patch; only fields present in the patch appear.
pub(crate) fn set_document(patch: &AccountUpdate) -> Document {
    let mut set = Document::new();
    if let Some(rate) = patch.rate {
        set.insert("rate", rate.map(Bson::Double).unwrap_or(Bson::Null));
    }
    set
}

/// Newest-first page window. Offsets beyond i64 range are clamped.
pub(crate) fn find_options(skip: u64, limit: i64) -> FindOptions {
    FindOptions::builder()
        .sort(doc! { "_id": -1 })
        .skip(skip.min(i64::MAX as u64))
        .limit(limit)
        .build()
}

#[async_trait]
impl AccountStore for MongoAccountStore {
    async fn find(
        &self,
        filter: &AccountFilter,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Account>, StoreError> {
        let cursor = self
            .accounts
            .find(filter_document(filter), find_options(skip, limit))
            .await?;
        let docs: Vec<AccountDocument> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(Account::from).collect())
    }

    async fn insert_one(&self, account: NewAccount) -> Result<DocumentId, StoreError> {
        let result = self.raw.insert_one(insert_document(&account), None).await?;
        result
            .inserted_id
            .as_object_id()
            .map(DocumentId::from_object_id)
            .ok_or_else(|| {
                StoreError::Malformed(format!("unexpected inserted id: {}", result.inserted_id))
            })
    }

    async fn find_one(&self, id: &DocumentId) -> Result<Option<Account>, StoreError> {
        let found = self.accounts.find_one(by_id(id), None).await?;
        Ok(found.map(Account::from))
    }

    async fn update_one(&self, id: &DocumentId, patch: &AccountUpdate) -> Result<u64, StoreError> {
        let result = self
            .raw
            .update_one(by_id(id), doc! { "$set": set_document(patch) }, None)
            .await?;
        Ok(result.matched_count)
    }

    async fn delete_one(&self, id: &DocumentId) -> Result<u64, StoreError> {
        let result = self.raw.delete_one(by_id(id), None).await?;
        Ok(result.deleted_count)
    }
}
