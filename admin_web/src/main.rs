use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use admin_web::flash::FlashStore;
use admin_web::handlers;
use biz_service::biz_service as biz_services;
use common::config::AppConfig;
use common::db::Db;
use log::{LevelFilter, warn};
use std::str::FromStr;

const CONFIG_FILE: &str = "admin-config.toml";

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // 读取配置文件
    AppConfig::init(CONFIG_FILE)?;
    let app_cfg = AppConfig::get();
    //初始化日志
    init_log(&app_cfg);

    let db = Db::init(&app_cfg.get_database()).await?;
    biz_services::ensure_indexes(&db).await?;
    // 所有 worker 共用一份 flash 存储
    let flash_store = web::Data::new(FlashStore::from_config(&app_cfg.get_flash()));

    let server = app_cfg.get_server();
    let address_and_port = format!("{}:{}", server.host, server.port);
    warn!("Starting server on {}", address_and_port);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(flash_store.clone())
            //配置 服务
            .configure(|cfg| biz_services::configure(cfg, &db))
            // 配置 控制器
            .configure(handlers::configure)
    })
    .keep_alive(actix_web::http::KeepAlive::Timeout(std::time::Duration::from_secs(600)))
    .bind(address_and_port)?
    .run()
    .await?;
    Ok(())
}

fn init_log(config: &AppConfig) {
    let log_level = config.get_sys().log_level;
    let level = LevelFilter::from_str(&log_level).unwrap_or(LevelFilter::Info);
    env_logger::Builder::new().filter(None, level).init();
}
