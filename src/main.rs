use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::time::Duration;

use gacha_backend::{
    config::{Config, StoreKind},
    database::{
        MemoryTableStore, SheetTableStore, TableStoreBackend, create_pool, ensure_tables,
        run_migrations,
    },
    handlers,
    middlewares::create_cors,
    services::*,
    swagger::swagger_config,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 选择表格存储
    let store = match config.database.store {
        StoreKind::Sheet => {
            let pool = create_pool(&config.database)
                .await
                .expect("Failed to create database connection pool");
            run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            TableStoreBackend::Sheet(SheetTableStore::new(pool))
        }
        StoreKind::Memory => {
            log::warn!("Using in-memory table store, data is lost on restart");
            TableStoreBackend::Memory(MemoryTableStore::new())
        }
    };

    // 表头与初始角色
    ensure_tables(&store, &config.characters)
        .await
        .expect("Failed to initialize tables");

    // 所有写操作共用一把全局事务锁
    let lock = TransactionLock::new(Duration::from_millis(config.gacha.lock_timeout_ms));

    // 创建服务
    let user_service = UserService::new(store.clone(), lock.clone(), config.gacha.starting_tickets);
    let draw_service = DrawService::new(store.clone(), lock);
    let character_service = CharacterService::new(store);

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let cors_allowed_origins = config.server.cors_allowed_origins.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors(&cors_allowed_origins))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(draw_service.clone()))
            .app_data(web::Data::new(character_service.clone()))
            .configure(swagger_config)
            .service(web::scope("/api/v1").configure(handlers::action_config))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
