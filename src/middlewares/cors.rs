use actix_cors::Cors;

/// 前端（含 mock 模式）跨域访问动作接口
///
/// `allowed_origins` 为空时允许任意来源。
pub fn create_cors(allowed_origins: &[String]) -> Cors {
    let cors = if allowed_origins.is_empty() {
        Cors::default().allow_any_origin()
    } else {
        allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };

    cors.allowed_methods(vec!["GET", "POST", "OPTIONS"])
        // 前端可能带自定义 Header，避免预检失败
        .allow_any_header()
        .max_age(3600)
}
