use crate::entitys::activity_entity::{ACTIVITY_COLLECTION, ActivityEntity};
use common::DocId;
use common::errors::AppError;
use common::repository_util::{BaseRepository, COUNTER_COLLECTION, FindSpec, Repository};
use common::util::date_util::now;
use log::info;
use mongodb::Database;
use mongodb::bson::{DateTime, Document, doc};
use std::sync::Arc;

/// 新增、编辑活动时提交的字段（时间已完成转换）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityParams {
    pub title: String,
    pub is_visible: bool,
    pub start_time: Option<DateTime>,
    pub end_time: Option<DateTime>,
    pub pic: String,
    pub description: String,
    pub content: String,
}

pub struct ActivityService {
    pub dao: Arc<dyn Repository<ActivityEntity>>,
}

impl ActivityService {
    pub fn new(db: &Database) -> Self {
        let repository = BaseRepository::<ActivityEntity>::new(db.collection(ACTIVITY_COLLECTION), db.collection(COUNTER_COLLECTION));
        Self::with_repository(Arc::new(repository))
    }

    pub fn with_repository(dao: Arc<dyn Repository<ActivityEntity>>) -> Self {
        Self { dao }
    }

    /// 按条件查询，`select` 为空格分隔的返回字段
    pub async fn get(&self, filter: Document, select: &str) -> Result<Vec<ActivityEntity>, AppError> {
        self.dao.find(filter, FindSpec::new().select(select)).await
    }

    pub async fn get_by_id(&self, id: DocId) -> Result<Option<ActivityEntity>, AppError> {
        self.dao.find_by_id(id).await
    }

    pub async fn create(&self, params: ActivityParams) -> Result<ActivityEntity, AppError> {
        let now = now();
        let activity = ActivityEntity {
            id: self.dao.next_id().await?,
            title: params.title,
            start_time: params.start_time,
            end_time: params.end_time,
            is_visible: params.is_visible,
            pic: params.pic,
            description: params.description,
            content: params.content,
            create_time: Some(now),
            last_modify_time: Some(now),
        };
        self.dao.insert(&activity).await?;
        info!("activity {} created", activity.id);
        Ok(activity)
    }

    /// 返回匹配到的记录数，记录不存在时为 0
    pub async fn update(&self, id: DocId, params: ActivityParams) -> Result<u64, AppError> {
        let update = doc! {
            "$set": {
                "title": params.title,
                "isVisible": params.is_visible,
                "startTime": params.start_time,
                "endTime": params.end_time,
                "pic": params.pic,
                "description": params.description,
                "content": params.content,
                "lastModifyTime": now(),
            }
        };
        self.dao.update(doc! { "_id": id }, update).await
    }

    pub async fn remove(&self, id: DocId) -> Result<u64, AppError> {
        let deleted = self.dao.delete(doc! { "_id": id }).await?;
        info!("activity {} removed ({} deleted)", id, deleted);
        Ok(deleted)
    }
}
