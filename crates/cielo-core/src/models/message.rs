//! 송신 메시지 모델.
//!
//! 서버로 보내는 불투명 JSON 객체. 큐에 넣기 직전에
//! `token`, `mid`(세션 ID), `ts`(Unix 초) 필드가 찍힌다.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CoreError;

/// 로그 출력 시 토큰 마스킹 값
pub const REDACTED: &str = "*****";

/// keep-alive ping 메시지 본문
pub const PING_MESSAGE: &str = "Ping Connection Reset";

/// 서버로 보낼 JSON 객체
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OutboundMessage(Map<String, Value>);

impl OutboundMessage {
    /// JSON 객체로부터 생성 (객체가 아니면 에러)
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(CoreError::Internal(format!(
                "송신 메시지는 JSON 객체여야 함: {other}"
            ))),
        }
    }

    /// 명령 메시지에 인증/세션/시각 필드를 찍는다
    pub fn stamped(mut self, token: &str, session_id: &str, ts: i64) -> Self {
        self.0.insert("token".into(), Value::from(token));
        self.0.insert("mid".into(), Value::from(session_id));
        self.0.insert("ts".into(), Value::from(ts));
        self
    }

    /// 연결 유지용 ping 메시지
    pub fn ping(token: &str) -> Self {
        let mut map = Map::new();
        map.insert("message".into(), Value::from(PING_MESSAGE));
        map.insert("token".into(), Value::from(token));
        Self(map)
    }

    /// 필드 조회
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// 와이어 텍스트로 직렬화
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// 토큰을 가린 로그용 복사본
    pub fn redacted(&self) -> Value {
        let mut map = self.0.clone();
        if map.contains_key("token") {
            map.insert("token".into(), Value::from(REDACTED));
        }
        Value::Object(map)
    }
}

impl TryFrom<Value> for OutboundMessage {
    type Error = CoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<Map<String, Value>> for OutboundMessage {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
