pub mod activity_entity;
pub mod category_entity;
pub mod product_entity;
pub mod tag_entity;
