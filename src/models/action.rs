use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 动作分发请求体，`action` 决定其余字段的含义
///
/// - `initUser`: userId
/// - `draw`: userId, drawType, requestId
/// - `listCharacters`: 无
/// - `getHistory`: userId, page, perPage
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    #[schema(example = "draw")]
    pub action: Option<String>,
    pub user_id: Option<String>,
    /// single / ten
    #[schema(example = "ten")]
    pub draw_type: Option<String>,
    /// 客户端生成的幂等键
    pub request_id: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    InitUser,
    Draw,
    ListCharacters,
    GetHistory,
}

impl Action {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "initUser" => Some(Action::InitUser),
            "draw" => Some(Action::Draw),
            "listCharacters" => Some(Action::ListCharacters),
            "getHistory" => Some(Action::GetHistory),
            _ => None,
        }
    }
}
