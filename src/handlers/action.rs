use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::{CharacterService, DrawService, UserService};
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::Value;

#[utoipa::path(
    post,
    path = "/action",
    tag = "gacha",
    request_body = ActionRequest,
    responses(
        (status = 200, description = "成功: {status: \"success\", data}"),
        (status = 400, description = "参数错误或未知 action"),
        (status = 404, description = "用户不存在"),
        (status = 409, description = "票数不足或角色池为空"),
        (status = 503, description = "等待事务锁超时")
    )
)]
/// 动作分发入口:
/// - initUser: 初始化/登录，返回票数与角色池
/// - draw: 单抽/十连
/// - listCharacters: 启用的角色池
/// - getHistory: 抽卡记录（倒序分页）
pub async fn dispatch(
    user_service: web::Data<UserService>,
    draw_service: web::Data<DrawService>,
    character_service: web::Data<CharacterService>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    match handle(&user_service, &draw_service, &character_service, &body).await {
        Ok(data) => Ok(HttpResponse::Ok().json(ApiResponse::success(data))),
        Err(e) => Ok(e.error_response()),
    }
}

async fn handle(
    user_service: &UserService,
    draw_service: &DrawService,
    character_service: &CharacterService,
    body: &[u8],
) -> AppResult<Value> {
    let request: ActionRequest = serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidInput(format!("Malformed request body: {e}")))?;
    let action = request.action.as_deref().unwrap_or_default();
    let user_id = request.user_id.as_deref().unwrap_or_default();

    let data = match Action::parse(action) {
        Some(Action::InitUser) => {
            serde_json::to_value(user_service.init_or_login(user_id).await?)?
        }
        Some(Action::Draw) => {
            let draw_type = request.draw_type.as_deref().unwrap_or_default();
            let result = draw_service
                .draw(user_id, draw_type, request.request_id.as_deref())
                .await?;
            serde_json::to_value(result)?
        }
        Some(Action::ListCharacters) => {
            serde_json::to_value(character_service.load_enabled_pool().await?)?
        }
        Some(Action::GetHistory) => {
            let params = PaginationParams::new(request.page, request.per_page);
            serde_json::to_value(draw_service.history(user_id, &params).await?)?
        }
        None => return Err(AppError::InvalidInput(format!("Unknown action: {action}"))),
    };
    Ok(data)
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "gacha",
    responses((status = 200, description = "服务存活"))
)]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success("ok"))
}
