//! 세션 모델.
//!
//! 로그인으로 생성되고 토큰 갱신 시 통째로 교체되는 인증 세션.

use std::fmt;

/// 인증 세션
///
/// `access_token`이 비어 있지 않을 때만 인증된 상태로 본다.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub session_id: String,
    pub user_id: String,
    /// 재로그인용 자격증명
    pub user_name: String,
    pub password: String,
    /// 마지막 토큰 발급/갱신 시각 (Unix 초)
    pub last_refresh_ts: i64,
}

impl Session {
    /// 인증된 상태인지
    pub fn is_authenticated(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// `now` 시점에 토큰 갱신이 필요한지
    ///
    /// 마지막 갱신 이후 경과 시간이 `refresh_after_secs`를 **초과**해야 한다.
    pub fn refresh_due(&self, now: i64, refresh_after_secs: i64) -> bool {
        now - self.last_refresh_ts > refresh_after_secs
    }

    /// 갱신된 토큰으로 교체한 새 세션
    pub fn with_tokens(&self, access_token: String, refresh_token: String, now: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            last_refresh_ts: now,
            ..self.clone()
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("session_id", &self.session_id)
            .field("user_id", &self.user_id)
            .field("user_name", &self.user_name)
            .field("password", &"[REDACTED]")
            .field("last_refresh_ts", &self.last_refresh_ts)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "[REDACTED]"
    }
}
