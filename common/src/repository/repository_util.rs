use crate::errors::AppError;
use crate::query_builder::select_fields;
use crate::DocId;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::Collection;
use serde::{de::DeserializeOwned, Serialize};

/// 自增主键计数器集合
pub const COUNTER_COLLECTION: &str = "identitycounters";

/// 查询附加选项：投影、排序、分页
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindSpec {
    pub projection: Option<Document>,
    pub sort: Option<Document>,
    pub skip: Option<u64>,
    pub limit: Option<i64>,
}

impl FindSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// 空格分隔的字段列表，如 `"_id title"`
    pub fn select(mut self, fields: &str) -> Self {
        self.projection = select_fields(fields);
        self
    }

    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = if sort.is_empty() { None } else { Some(sort) };
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[async_trait]
pub trait Repository<T>: Send + Sync {
    /// 分配下一个自增主键
    async fn next_id(&self) -> Result<DocId, AppError>;
    async fn find_by_id(&self, id: DocId) -> Result<Option<T>, AppError>;
    async fn insert(&self, entity: &T) -> Result<(), AppError>;
    async fn find_one(&self, filter: Document) -> Result<Option<T>, AppError>;
    async fn find(&self, filter: Document, spec: FindSpec) -> Result<Vec<T>, AppError>;
    async fn count(&self, filter: Document) -> Result<u64, AppError>;
    /// 返回匹配到的文档数
    async fn update(&self, filter: Document, update: Document) -> Result<u64, AppError>;
    async fn delete(&self, filter: Document) -> Result<u64, AppError>;
}

pub struct BaseRepository<T: Send + Sync> {
    pub collection: Collection<T>,
    counters: Collection<Document>,
}

impl<T: Send + Sync> BaseRepository<T> {
    pub fn new(collection: Collection<T>, counters: Collection<Document>) -> Self {
        Self { collection, counters }
    }
}

#[async_trait]
impl<T> Repository<T> for BaseRepository<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    async fn next_id(&self) -> Result<DocId, AppError> {
        let options = FindOneAndUpdateOptions::builder().upsert(true).return_document(ReturnDocument::After).build();
        let counter = self
            .counters
            .find_one_and_update(
                doc! { "model": self.collection.name(), "field": "_id" },
                doc! { "$inc": { "count": 1_i64 } },
            )
            .with_options(options)
            .await?
            .ok_or_else(|| AppError::Internal(format!("counter missing for {}", self.collection.name())))?;
        match counter.get("count") {
            Some(Bson::Int64(n)) => Ok(*n),
            Some(Bson::Int32(n)) => Ok(i64::from(*n)),
            other => Err(AppError::Internal(format!("counter for {} is malformed: {:?}", self.collection.name(), other))),
        }
    }

    async fn find_by_id(&self, id: DocId) -> Result<Option<T>, AppError> {
        self.find_one(doc! { "_id": id }).await
    }

    async fn insert(&self, entity: &T) -> Result<(), AppError> {
        self.collection.insert_one(entity).await?;
        Ok(())
    }

    async fn find_one(&self, filter: Document) -> Result<Option<T>, AppError> {
        let result = self.collection.find_one(filter).await?;
        Ok(result)
    }

    async fn find(&self, filter: Document, spec: FindSpec) -> Result<Vec<T>, AppError> {
        let mut find_options = FindOptions::default();
        find_options.projection = spec.projection;
        find_options.sort = spec.sort;
        find_options.skip = spec.skip;
        find_options.limit = spec.limit;

        let mut cursor = self.collection.find(filter).with_options(find_options).await?;
        let mut result = vec![];
        while let Some(doc) = cursor.try_next().await? {
            result.push(doc);
        }
        Ok(result)
    }

    async fn count(&self, filter: Document) -> Result<u64, AppError> {
        let count = self.collection.count_documents(filter).await?;
        Ok(count)
    }

    async fn update(&self, filter: Document, update: Document) -> Result<u64, AppError> {
        let result = self.collection.update_many(filter, update).await?;
        Ok(result.matched_count)
    }

    async fn delete(&self, filter: Document) -> Result<u64, AppError> {
        let result = self.collection.delete_many(filter).await?;
        Ok(result.deleted_count)
    }
}
