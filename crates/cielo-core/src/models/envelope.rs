//! 벤더 응답 envelope.
//!
//! 모든 REST 응답은 `{status, message, data}` 형태로 감싸져 온다.
//! 성공은 HTTP 200 이면서 `status == 200`, `message == "SUCCESS"`인 경우뿐이다.

use serde::Deserialize;

use crate::error::CoreError;
use crate::models::device::{Appliance, Device};

/// 성공 envelope의 status 값
pub const SUCCESS_STATUS: i64 = 200;

/// 성공 envelope의 message 값
pub const SUCCESS_MESSAGE: &str = "SUCCESS";

/// 벤더 응답 래퍼
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub status: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// envelope가 성공을 나타내는지
    pub fn is_success(&self) -> bool {
        self.status == SUCCESS_STATUS && self.message == SUCCESS_MESSAGE
    }

    /// 성공 envelope의 data 추출
    pub fn into_data(self) -> Result<T, CoreError> {
        if !self.is_success() {
            return Err(CoreError::Envelope {
                status: self.status,
                message: self.message,
            });
        }
        self.data
            .ok_or_else(|| CoreError::Internal("성공 envelope에 data 없음".to_string()))
    }
}

/// 로그인 응답 data
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub user: LoginUser,
}

/// 로그인 응답의 사용자/토큰 정보
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(deserialize_with = "string_or_number")]
    pub session_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
}

/// 토큰 갱신 응답 data
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshData {
    pub access_token: String,
    pub refresh_token: String,
}

/// 디바이스 목록 응답 data
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceListData {
    #[serde(default)]
    pub list_devices: Vec<Device>,
}

/// 어플라이언스 상세 응답 data
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplianceListData {
    #[serde(default)]
    pub list_appliances: Vec<Appliance>,
}

/// 문자열 또는 숫자로 오는 식별자를 문자열로 받는다
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "문자열 또는 숫자 식별자 필요: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_envelope_success() {
        let body = r#"{
            "status": 200,
            "message": "SUCCESS",
            "data": {"user": {
                "accessToken": "acc", "refreshToken": "ref",
                "sessionId": "sess-1", "userId": 42
            }}
        }"#;
        let env: Envelope<LoginData> = serde_json::from_str(body).unwrap();
        assert!(env.is_success());
        let data = env.into_data().unwrap();
        assert_eq!(data.user.access_token, "acc");
        assert_eq!(data.user.user_id, "42");
        assert_eq!(data.user.session_id, "sess-1");
    }

    #[test]
    fn wrong_message_is_envelope_error() {
        let body = r#"{"status": 200, "message": "FAILED", "data": null}"#;
        let env: Envelope<RefreshData> = serde_json::from_str(body).unwrap();
        assert!(!env.is_success());
        assert!(matches!(
            env.into_data(),
            Err(CoreError::Envelope { status: 200, .. })
        ));
    }

    #[test]
    fn wrong_status_is_envelope_error() {
        let body = r#"{"status": 401, "message": "SUCCESS"}"#;
        let env: Envelope<RefreshData> = serde_json::from_str(body).unwrap();
        assert!(matches!(
            env.into_data(),
            Err(CoreError::Envelope { status: 401, .. })
        ));
    }

    #[test]
    fn success_without_data_is_internal_error() {
        let body = r#"{"status": 200, "message": "SUCCESS"}"#;
        let env: Envelope<DeviceListData> = serde_json::from_str(body).unwrap();
        assert!(matches!(env.into_data(), Err(CoreError::Internal(_))));
    }
}
