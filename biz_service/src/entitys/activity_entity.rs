use common::DocId;
use common::index_trait::MongoIndexModelProvider;
use mongodb::IndexModel;
use mongodb::bson::{DateTime, doc};
use serde::{Deserialize, Serialize};

pub const ACTIVITY_COLLECTION: &str = "activities";

/// 活动（促销专题）
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ActivityEntity {
    #[serde(rename = "_id")]
    pub id: DocId,
    pub title: String,
    /// None 表示无法解析的时间，按原样存为 null
    pub start_time: Option<DateTime>,
    pub end_time: Option<DateTime>,
    pub is_visible: bool,
    pub pic: String,
    pub description: String,
    pub content: String,
    pub create_time: Option<DateTime>,
    pub last_modify_time: Option<DateTime>,
}

impl MongoIndexModelProvider for ActivityEntity {
    fn index_models() -> Vec<IndexModel> {
        vec![IndexModel::builder().keys(doc! { "startTime": -1 }).build()]
    }
}
