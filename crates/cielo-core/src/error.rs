//! Cielo 클라이언트 핵심 에러 타입.
//!
//! 내부 연산은 `Result<_, CoreError>`를 반환하고,
//! 공개 파사드(`CieloClient`)에서 `bool`/빈 목록으로 완화한다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 인증 실패 (토큰 없음, 자격증명 오류 등)
    #[error("인증 에러: {0}")]
    Auth(String),

    /// 네트워크 에러 (연결 실패, 타임아웃, 비정상 HTTP 상태)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 응답 envelope가 성공(200/"SUCCESS")이 아님
    #[error("응답 envelope 불일치 — status={status}, message={message}")]
    Envelope {
        /// envelope의 status 필드
        status: i64,
        /// envelope의 message 필드
        message: String,
    },

    /// WebSocket 연결/송수신 실패
    #[error("WebSocket 에러: {0}")]
    WebSocket(String),

    /// 송신 큐가 닫힘 (연결 루프 종료)
    #[error("송신 큐 닫힘")]
    QueueClosed,

    /// 송신 큐가 가득 참 (소비하는 연결 루프가 없거나 밀림)
    #[error("송신 큐 가득 참")]
    QueueFull,

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl CoreError {
    /// 재로그인으로 복구 가능한 인증 계열 에러인지
    ///
    /// HTTP 401/403 외에 envelope status 401/403도 포함한다.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            CoreError::Auth(_) | CoreError::Envelope { status: 401 | 403, .. }
        )
    }
}
