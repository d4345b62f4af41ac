use mongodb::IndexModel;

/// 实体声明自己需要的集合索引，启动时由 [`crate::db::Db::ensure_indexes`] 创建
pub trait MongoIndexModelProvider {
    fn index_models() -> Vec<IndexModel>;
}
