use uuid::Uuid;

/// 生成审计令牌（32 位十六进制）
///
/// 使用 uuid v4 自带的随机源，与抽卡选择用的随机数无关。
pub fn generate_audit_token() -> String {
    Uuid::new_v4().simple().to_string()
}
