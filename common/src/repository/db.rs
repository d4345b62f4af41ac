use crate::config::DatabaseConfig;
use crate::errors::AppError;
use crate::index_trait::MongoIndexModelProvider;
use anyhow::{Result, anyhow};
use log::info;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};

#[derive(Clone)]
pub struct Db {
    pub db: Database,
}

impl Db {
    /// 创建新实例
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 初始化 MongoDB 数据库连接，连接池由驱动管理
    pub async fn init(config: &DatabaseConfig) -> Result<Self> {
        let client_options = ClientOptions::parse(&config.url)
            .await
            .map_err(|e| anyhow!("MongoDB URI parse error: {}", e))?;

        let client = Client::with_options(client_options)
            .map_err(|e| anyhow!("MongoDB client init error: {}", e))?;

        Ok(Self::new(client.database(&config.db_name)))
    }

    /// 按实体声明创建集合索引，已存在的同名索引会被 MongoDB 忽略
    pub async fn ensure_indexes<T>(&self, collection: &str) -> Result<(), AppError>
    where
        T: MongoIndexModelProvider + Send + Sync,
    {
        let models = T::index_models();
        if models.is_empty() {
            return Ok(());
        }
        let result = self.db.collection::<T>(collection).create_indexes(models).await?;
        info!("indexes ready on {}: {:?}", collection, result.index_names);
        Ok(())
    }
}
