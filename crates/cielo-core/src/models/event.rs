//! 수신 이벤트 모델.
//!
//! WebSocket으로 들어오는 JSON 텍스트 프레임. `message_type`이
//! `"StateUpdate"`인 프레임만 리스너에게 전달된다.

use serde_json::Value;

use crate::error::CoreError;
use crate::models::message::REDACTED;

/// 상태 변경 이벤트 태그
pub const STATE_UPDATE_TAG: &str = "StateUpdate";

/// 파싱된 수신 프레임
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// 어플라이언스 동작 상태 변경
    StateUpdate(StateUpdate),
    /// 그 밖의 메시지 (리스너로 전달하지 않음)
    Other { message_type: Option<String> },
}

impl InboundEvent {
    /// 텍스트 프레임 파싱
    ///
    /// JSON이 아니면 `Serialization` 에러. 호출 측은 무시하고 계속 진행한다.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let value: Value = serde_json::from_str(text)?;
        let message_type = value
            .get("message_type")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(match message_type.as_deref() {
            Some(STATE_UPDATE_TAG) => InboundEvent::StateUpdate(StateUpdate { payload: value }),
            _ => InboundEvent::Other { message_type },
        })
    }
}

/// 상태 변경 이벤트 — 원본 JSON을 그대로 보존
#[derive(Debug, Clone, PartialEq)]
pub struct StateUpdate {
    payload: Value,
}

impl StateUpdate {
    /// 원본 JSON
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// 최상위 필드 조회
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// 원본 JSON 소유권 반환
    pub fn into_payload(self) -> Value {
        self.payload
    }
}

/// 로그 출력용으로 토큰 필드를 가린 복사본
pub fn redact_tokens(value: &Value) -> Value {
    let mut copy = value.clone();
    if let Value::Object(map) = &mut copy {
        for key in ["accessToken", "refreshToken", "token"] {
            if map.contains_key(key) {
                map.insert(key.to_string(), Value::from(REDACTED));
            }
        }
    }
    copy
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn state_update_recognized() {
        let ev = InboundEvent::parse(r#"{"message_type":"StateUpdate","mac_address":"AA"}"#)
            .unwrap();
        match ev {
            InboundEvent::StateUpdate(update) => {
                assert_eq!(update.field("mac_address"), Some(&json!("AA")));
            }
            other => panic!("StateUpdate 기대, 실제: {other:?}"),
        }
    }

    #[test]
    fn other_message_type() {
        let ev = InboundEvent::parse(r#"{"message_type":"Heartbeat"}"#).unwrap();
        assert_eq!(
            ev,
            InboundEvent::Other {
                message_type: Some("Heartbeat".into())
            }
        );
    }

    #[test]
    fn missing_message_type() {
        let ev = InboundEvent::parse(r#"{"foo": 1}"#).unwrap();
        assert_eq!(ev, InboundEvent::Other { message_type: None });
    }

    #[test]
    fn malformed_json_is_error() {
        assert!(matches!(
            InboundEvent::parse("{oops"),
            Err(CoreError::Serialization(_))
        ));
    }

    #[test]
    fn redact_tokens_masks_known_keys() {
        let red = redact_tokens(&json!({"accessToken": "a", "refreshToken": "r", "x": 1}));
        assert_eq!(red, json!({"accessToken": REDACTED, "refreshToken": REDACTED, "x": 1}));
    }
}
