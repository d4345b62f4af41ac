use crate::entitys::category_entity::CategoryEntity;
use crate::entitys::tag_entity::TagEntity;
use common::DocId;
use common::index_trait::MongoIndexModelProvider;
use mongodb::IndexModel;
use mongodb::bson::{DateTime, doc};
use serde::{Deserialize, Serialize};

pub const PRODUCT_COLLECTION: &str = "products";

/// 产品
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductEntity {
    #[serde(rename = "_id")]
    pub id: DocId,
    /// 一级分类
    pub pid: DocId,
    /// 所属分类，查询时关联 categories
    pub cid: DocId,
    /// 标签，查询时关联 tags
    pub tags: Vec<DocId>,
    pub title: String,
    /// 标题分词，供搜索使用
    pub search: Vec<String>,
    pub content: String,
    pub price: f64,
    pub description: String,
    pub slider_pics: Vec<String>,
    pub sk_pic: String,
    /// SKU 编码
    pub code: String,
    /// 库存
    pub count: i64,
    pub is_visible: bool,
    pub sort: i64,
    pub create_time: Option<DateTime>,
    pub last_modify_time: Option<DateTime>,
}

impl MongoIndexModelProvider for ProductEntity {
    fn index_models() -> Vec<IndexModel> {
        vec![
            IndexModel::builder().keys(doc! { "pid": 1, "isVisible": 1 }).build(),
            IndexModel::builder().keys(doc! { "cid": 1 }).build(),
            IndexModel::builder().keys(doc! { "lastModifyTime": -1 }).build(),
        ]
    }
}

/// 关联了分类、标签之后的产品
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedProduct {
    #[serde(flatten)]
    pub product: ProductEntity,
    /// 分类不满足关联条件时为 None
    pub category: Option<CategoryEntity>,
    /// 只保留满足关联条件的标签，按关联排序
    pub tag_list: Vec<TagEntity>,
}

/// 新增产品参数
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub pid: DocId,
    pub cid: DocId,
    pub tags: Vec<DocId>,
    pub title: String,
    pub content: String,
    pub price: f64,
    pub description: String,
    pub slider_pics: Vec<String>,
    pub sk_pic: String,
    pub code: String,
    pub count: i64,
    pub is_visible: bool,
}
