use crate::errors::AppError;
use crate::repository_util::{FindSpec, Repository};
use crate::DocId;
use async_trait::async_trait;
use mongodb::bson::{self, doc, Bson, Document};
use serde::{de::DeserializeOwned, Serialize};
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicI64};
use std::sync::atomic::Ordering as AtomicOrdering;
use tokio::sync::Mutex;

/// 进程内的文档集合，实现与 MongoDB 相同的 [`Repository`] 语义子集：
/// 等值 / `$gt` `$gte` `$lt` `$lte` `$ne` `$in` `$nin` `$exists` 条件、
/// `$and` / `$or`、投影、排序、skip / limit 以及 `$set` `$unset` `$inc` 更新。
pub struct MemoryRepository<T> {
    docs: Mutex<Vec<Document>>,
    counter: AtomicI64,
    failing: AtomicBool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self {
            docs: Mutex::new(Vec::new()),
            counter: AtomicI64::new(0),
            failing: AtomicBool::new(false),
            _marker: PhantomData,
        }
    }
}

impl<T> MemoryRepository<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 打开后所有操作都返回存储错误，模拟数据库不可用
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, AtomicOrdering::SeqCst);
    }

    /// 当前存储的原始文档
    pub async fn documents(&self) -> Vec<Document> {
        self.docs.lock().await.clone()
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.failing.load(AtomicOrdering::SeqCst) {
            return Err(AppError::Internal("store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl<T> Repository<T> for MemoryRepository<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    async fn next_id(&self) -> Result<DocId, AppError> {
        self.check_available()?;
        Ok(self.counter.fetch_add(1, AtomicOrdering::SeqCst) + 1)
    }

    async fn find_by_id(&self, id: DocId) -> Result<Option<T>, AppError> {
        self.find_one(doc! { "_id": id }).await
    }

    async fn insert(&self, entity: &T) -> Result<(), AppError> {
        self.check_available()?;
        let document = bson::to_document(entity)?;
        let mut docs = self.docs.lock().await;
        if let Some(id) = document.get("_id") {
            if docs.iter().any(|d| d.get("_id").is_some_and(|existing| bson_eq(existing, id))) {
                return Err(AppError::Conflict);
            }
            if let Some(n) = as_i64(id) {
                self.counter.fetch_max(n, AtomicOrdering::SeqCst);
            }
        }
        docs.push(document);
        Ok(())
    }

    async fn find_one(&self, filter: Document) -> Result<Option<T>, AppError> {
        let mut found = self.find(filter, FindSpec::new().limit(1)).await?;
        Ok(found.pop())
    }

    async fn find(&self, filter: Document, spec: FindSpec) -> Result<Vec<T>, AppError> {
        self.check_available()?;
        let docs = self.docs.lock().await;
        let mut selected: Vec<&Document> = docs.iter().filter(|d| matches_filter(d, &filter)).collect();
        if let Some(sort) = &spec.sort {
            selected.sort_by(|a, b| compare_by_sort(a, b, sort));
        }
        let skip = spec.skip.unwrap_or(0) as usize;
        let limit = match spec.limit {
            Some(n) if n != 0 => n.unsigned_abs() as usize,
            _ => usize::MAX,
        };
        selected
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|d| {
                let projected = match &spec.projection {
                    Some(projection) => project(d, projection),
                    None => d.clone(),
                };
                bson::from_document(projected).map_err(AppError::from)
            })
            .collect()
    }

    async fn count(&self, filter: Document) -> Result<u64, AppError> {
        self.check_available()?;
        let docs = self.docs.lock().await;
        Ok(docs.iter().filter(|d| matches_filter(d, &filter)).count() as u64)
    }

    async fn update(&self, filter: Document, update: Document) -> Result<u64, AppError> {
        self.check_available()?;
        let mut docs = self.docs.lock().await;
        let mut matched = 0;
        for d in docs.iter_mut().filter(|d| matches_filter(d, &filter)) {
            apply_update(d, &update)?;
            matched += 1;
        }
        Ok(matched)
    }

    async fn delete(&self, filter: Document) -> Result<u64, AppError> {
        self.check_available()?;
        let mut docs = self.docs.lock().await;
        let before = docs.len();
        docs.retain(|d| !matches_filter(d, &filter));
        Ok((before - docs.len()) as u64)
    }
}

fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = document.get(parts.next()?)?;
    for part in parts {
        current = current.as_document()?.get(part)?;
    }
    Some(current)
}

fn matches_filter(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, condition)| match key.as_str() {
        "$and" => sub_filters(condition).all(|f| matches_filter(document, f)),
        "$or" => sub_filters(condition).any(|f| matches_filter(document, f)),
        _ => field_matches(lookup(document, key), condition),
    })
}

fn sub_filters(condition: &Bson) -> impl Iterator<Item = &Document> {
    condition.as_array().into_iter().flatten().filter_map(Bson::as_document)
}

fn field_matches(value: Option<&Bson>, condition: &Bson) -> bool {
    match condition {
        Bson::Document(ops) if ops.keys().next().is_some_and(|k| k.starts_with('$')) => {
            ops.iter().all(|(op, arg)| operator_matches(value, op, arg))
        }
        _ => equals_or_contains(value, condition),
    }
}

/// 数组字段只要有一个元素满足即视为匹配
fn candidates(value: Option<&Bson>) -> Vec<&Bson> {
    match value {
        Some(Bson::Array(items)) => items.iter().collect(),
        Some(v) => vec![v],
        None => vec![],
    }
}

fn equals_or_contains(value: Option<&Bson>, expected: &Bson) -> bool {
    match (value, expected) {
        (None, Bson::Null) => true,
        (Some(v), _) if bson_eq(v, expected) => true,
        _ => candidates(value).into_iter().any(|v| bson_eq(v, expected)),
    }
}

fn operator_matches(value: Option<&Bson>, op: &str, arg: &Bson) -> bool {
    let ordered = |accept: fn(Ordering) -> bool| {
        candidates(value).into_iter().any(|v| compare_values(v, arg).is_some_and(accept))
    };
    match op {
        "$gt" => ordered(|o| o == Ordering::Greater),
        "$gte" => ordered(|o| o != Ordering::Less),
        "$lt" => ordered(|o| o == Ordering::Less),
        "$lte" => ordered(|o| o != Ordering::Greater),
        "$ne" => !equals_or_contains(value, arg),
        "$in" => arg.as_array().is_some_and(|list| list.iter().any(|a| equals_or_contains(value, a))),
        "$nin" => !arg.as_array().is_some_and(|list| list.iter().any(|a| equals_or_contains(value, a))),
        "$exists" => value.is_some() == truthy(arg),
        _ => false,
    }
}

fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Null => false,
        other => as_f64(other).is_none_or(|n| n != 0.0),
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

fn as_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Int64(n) => Some(*n),
        _ => None,
    }
}

fn bson_eq(a: &Bson, b: &Bson) -> bool {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// 同类值之间的比较，不同类型返回 None（与 MongoDB 的类型分组一致）
fn compare_values(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_f64(a), as_f64(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn type_rank(value: Option<&Bson>) -> u8 {
    match value {
        None | Some(Bson::Null) => 0,
        Some(Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)) => 1,
        Some(Bson::String(_)) => 2,
        Some(Bson::Document(_)) => 3,
        Some(Bson::Array(_)) => 4,
        Some(Bson::Boolean(_)) => 5,
        Some(Bson::DateTime(_)) => 6,
        Some(_) => 7,
    }
}

fn compare_by_sort(a: &Document, b: &Document, sort: &Document) -> Ordering {
    for (field, direction) in sort {
        let (x, y) = (lookup(a, field), lookup(b, field));
        let ordering = match (x, y) {
            (Some(x), Some(y)) => compare_values(x, y).unwrap_or_else(|| type_rank(Some(x)).cmp(&type_rank(Some(y)))),
            _ => type_rank(x).cmp(&type_rank(y)),
        };
        let ordering = if as_f64(direction).is_some_and(|d| d < 0.0) { ordering.reverse() } else { ordering };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn project(document: &Document, projection: &Document) -> Document {
    let include_id = projection.get("_id").is_none_or(truthy);
    let inclusive = projection.iter().any(|(k, v)| k != "_id" && truthy(v));
    if inclusive {
        let mut out = Document::new();
        for (key, value) in document {
            let wanted = if key == "_id" { include_id } else { projection.get(key).is_some_and(truthy) };
            if wanted {
                out.insert(key.clone(), value.clone());
            }
        }
        out
    } else {
        let mut out = document.clone();
        for (key, _) in projection.iter().filter(|(_, v)| !truthy(v)) {
            out.remove(key);
        }
        out
    }
}

fn apply_update(document: &mut Document, update: &Document) -> Result<(), AppError> {
    for (op, fields) in update {
        let fields = fields
            .as_document()
            .ok_or_else(|| AppError::Validation(format!("update operator {} expects a document", op)))?;
        match op.as_str() {
            "$set" => {
                for (key, value) in fields {
                    document.insert(key.clone(), value.clone());
                }
            }
            "$unset" => {
                for (key, _) in fields {
                    document.remove(key);
                }
            }
            "$inc" => {
                for (key, delta) in fields {
                    let current = document.get(key).and_then(as_i64).unwrap_or(0);
                    let delta = as_i64(delta).ok_or_else(|| AppError::Validation(format!("$inc on {} expects an integer", key)))?;
                    document.insert(key.clone(), current + delta);
                }
            }
            other => return Err(AppError::Validation(format!("unsupported update operator {}", other))),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
    #[serde(default, rename_all = "camelCase")]
    struct Item {
        #[serde(rename = "_id")]
        id: i64,
        name: String,
        rank: i32,
        tags: Vec<i64>,
        is_visible: bool,
    }

    fn item(id: i64, name: &str, rank: i32, tags: Vec<i64>, is_visible: bool) -> Item {
        Item { id, name: name.to_string(), rank, tags, is_visible }
    }

    async fn seeded() -> MemoryRepository<Item> {
        let repo = MemoryRepository::new();
        repo.insert(&item(1, "a", 2, vec![10, 11], true)).await.unwrap();
        repo.insert(&item(2, "b", 1, vec![11], false)).await.unwrap();
        repo.insert(&item(3, "c", 2, vec![], true)).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn test_filter_operators() {
        let repo = seeded().await;
        assert_eq!(repo.count(doc! { "rank": 2 }).await.unwrap(), 2);
        assert_eq!(repo.count(doc! { "_id": { "$gt": 1 } }).await.unwrap(), 2);
        assert_eq!(repo.count(doc! { "tags": 11_i64 }).await.unwrap(), 2);
        assert_eq!(repo.count(doc! { "_id": { "$in": [1_i64, 3_i64] }, "isVisible": true }).await.unwrap(), 2);
        assert_eq!(repo.count(doc! { "$or": [ { "name": "a" }, { "name": "b" } ] }).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_sort_skip_limit_projection() {
        let repo = seeded().await;
        let spec = FindSpec::new().select("_id name").sort(doc! { "_id": -1 }).skip(1).limit(1);
        let found = repo.find(doc! {}, spec).await.unwrap();
        assert_eq!(found, vec![Item { id: 2, name: "b".into(), ..Default::default() }]);
    }

    #[tokio::test]
    async fn test_update_and_delete_counts() {
        let repo = seeded().await;
        assert_eq!(repo.update(doc! { "_id": 2_i64 }, doc! { "$set": { "name": "bb" } }).await.unwrap(), 1);
        assert_eq!(repo.find_by_id(2).await.unwrap().unwrap().name, "bb");
        assert_eq!(repo.update(doc! { "_id": 99_i64 }, doc! { "$set": { "name": "x" } }).await.unwrap(), 0);
        assert_eq!(repo.delete(doc! { "rank": 2 }).await.unwrap(), 2);
        assert_eq!(repo.count(doc! {}).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ids_and_conflicts() {
        let repo = seeded().await;
        assert_eq!(repo.next_id().await.unwrap(), 4);
        assert!(matches!(repo.insert(&item(1, "dup", 0, vec![], false)).await, Err(AppError::Conflict)));
    }

    #[tokio::test]
    async fn test_failing_store() {
        let repo = seeded().await;
        repo.set_failing(true);
        assert!(repo.count(doc! {}).await.is_err());
        repo.set_failing(false);
        assert_eq!(repo.count(doc! {}).await.unwrap(), 3);
    }
}
