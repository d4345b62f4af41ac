use actix_web::web;

pub mod activity_handler;

/// 后台路由前缀
pub const ADMIN_PREFIX: &str = "/admin";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope(ADMIN_PREFIX).configure(activity_handler::configure));
}
