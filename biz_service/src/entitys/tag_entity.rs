use common::DocId;
use serde::{Deserialize, Serialize};

pub const TAG_COLLECTION: &str = "tags";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TagEntity {
    #[serde(rename = "_id")]
    pub id: DocId,
    pub reid: DocId,
    pub tag: String,
    pub title: String,
    pub rank: i32,
    pub is_visible: bool,
    pub sort: i64,
}
