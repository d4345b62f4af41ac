use common::DocId;
use serde::{Deserialize, Serialize};

pub const CATEGORY_COLLECTION: &str = "categories";

/// 产品分类，rank 表示层级（1 一级分类，2 二级分类）
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CategoryEntity {
    #[serde(rename = "_id")]
    pub id: DocId,
    /// 上级分类
    pub reid: DocId,
    pub tag: String,
    pub title: String,
    pub rank: i32,
    pub is_visible: bool,
    pub sort: i64,
}
