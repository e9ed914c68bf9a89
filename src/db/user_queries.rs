use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{StoreError, UserStore, USERS_COLLECTION};
use crate::models::{DocumentId, NewUser, Role, User};

#[derive(Debug, Serialize, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    username: String,
    email: String,
    password: String,
    role: Role,
}

impl From<UserDocument> for User {
    fn from(doc: UserDocument) -> Self {
        User {
            id: DocumentId::from_object_id(doc.id),
            username: doc.username,
            email: doc.email,
            password_hash: doc.password,
            role: doc.role,
        }
    }
}

#[derive(Clone)]
pub struct MongoUserStore {
    users: Collection<UserDocument>,
    raw: Collection<Document>,
}

impl MongoUserStore {
    pub fn new(db: &Database) -> Self {
        Self {
            users: db.collection(USERS_COLLECTION),
            raw: db.collection(USERS_COLLECTION),
        }
    }

    /// Unique indexes backing the duplicate-email/username check.
    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let unique = || IndexOptions::builder().unique(true).build();
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(unique())
                .build(),
            IndexModel::builder()
                .keys(doc! { "username": 1 })
                .options(unique())
                .build(),
        ];
        self.raw.create_indexes(indexes, None).await?;
        info!("Ensured unique indexes on {}", USERS_COLLECTION);
        Ok(())
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn insert_one(&self, user: NewUser) -> Result<DocumentId, StoreError> {
        let document = doc! {
            "username": user.username,
            "email": user.email,
            "password": user.password_hash,
            "role": user.role.to_string(),
        };
        let result = self.raw.insert_one(document, None).await?;
        result
            .inserted_id
            .as_object_id()
            .map(DocumentId::from_object_id)
            .ok_or_else(|| {
                StoreError::Malformed(format!("unexpected inserted id: {}", result.inserted_id))
            })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let found = self.users.find_one(doc! { "email": email }, None).await?;
        Ok(found.map(User::from))
    }

    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        let options = FindOptions::builder().sort(doc! { "username": 1 }).build();
        let cursor = self.users.find(None, options).await?;
        let docs: Vec<UserDocument> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(User::from).collect())
    }
}
