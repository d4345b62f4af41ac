pub mod activity_service;
pub mod product_service;

use crate::entitys::activity_entity::{ACTIVITY_COLLECTION, ActivityEntity};
use crate::entitys::product_entity::{PRODUCT_COLLECTION, ProductEntity};
use actix_web::web;
use common::db::Db;
use common::errors::AppError;

/// 注册业务服务，控制器通过 `web::Data<XxxService>` 获取
pub fn configure(cfg: &mut web::ServiceConfig, db: &Db) {
    let activity_service = activity_service::ActivityService::new(&db.db);
    cfg.app_data(web::Data::new(activity_service));

    let product_service = product_service::ProductService::new(&db.db);
    cfg.app_data(web::Data::new(product_service));
}

/// 启动时创建集合索引
pub async fn ensure_indexes(db: &Db) -> Result<(), AppError> {
    db.ensure_indexes::<ActivityEntity>(ACTIVITY_COLLECTION).await?;
    db.ensure_indexes::<ProductEntity>(PRODUCT_COLLECTION).await?;
    Ok(())
}
