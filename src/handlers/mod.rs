pub mod action;

use actix_web::web;

/// 路由配置
pub fn action_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/action", web::post().to(action::dispatch))
        .route("/health", web::get().to(action::health));
}
