//! 클라이언트 설정 구조체.
//!
//! 벤더 API 주소, 고정 요청 헤더 값, 타이머 주기 등 런타임 설정을 정의한다.
//! 코어는 파일이나 환경변수를 읽지 않는다. 호출자가 값을 채워 넘긴다.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CoreError;

/// 최상위 클라이언트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// 벤더 API 설정
    #[serde(default)]
    pub api: ApiConfig,
    /// 타이머/폴링 주기 설정
    #[serde(default)]
    pub timing: TimingConfig,
    /// 송신 큐 용량 (bounded channel)
    #[serde(default = "default_outbound_capacity")]
    pub outbound_capacity: usize,
}

// ============================================================
// API 설정
// ============================================================

/// 벤더 API 설정 — 호스트, 고정 헤더, 로그인 fingerprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// REST API 기본 URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// WebSocket 기본 URL
    #[serde(default = "default_ws_base_url")]
    pub ws_base_url: String,
    /// origin / referer 헤더 값
    #[serde(default = "default_origin")]
    pub origin: String,
    /// user-agent 헤더 값
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// x-api-key 헤더 값 (웹 클라이언트 고정 키)
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// 로그인 fingerprint의 timeZone
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    /// HTTP 요청 타임아웃 (초)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// 디바이스 목록 조회 최대 개수
    #[serde(default = "default_device_list_limit")]
    pub device_list_limit: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            ws_base_url: default_ws_base_url(),
            origin: default_origin(),
            user_agent: default_user_agent(),
            api_key: default_api_key(),
            time_zone: default_time_zone(),
            request_timeout_secs: default_request_timeout_secs(),
            device_list_limit: default_device_list_limit(),
        }
    }
}

impl ApiConfig {
    /// HTTP 요청 타임아웃
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ============================================================
// 타이머 설정
// ============================================================

/// 타이머/폴링 주기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// 토큰 갱신 타이머 주기 (초)
    #[serde(default = "default_refresh_check_interval_secs")]
    pub refresh_check_interval_secs: u64,
    /// 마지막 갱신 이후 이 시간(초)을 넘기면 갱신
    #[serde(default = "default_refresh_after_secs")]
    pub refresh_after_secs: i64,
    /// keep-alive ping 주기 (초)
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
    /// 프레임 수신 대기 타임아웃 (밀리초)
    #[serde(default = "default_receive_timeout_ms")]
    pub receive_timeout_ms: u64,
    /// 연결 루프 사이클 간 대기 (밀리초)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// 업그레이드 실패 시 첫 재시도 지연 (밀리초)
    #[serde(default = "default_reconnect_initial_delay_ms")]
    pub reconnect_initial_delay_ms: u64,
    /// 업그레이드 실패 시 최대 재시도 지연 (밀리초)
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
    /// close() 시 연결 루프 종료 대기 한도 (밀리초)
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            refresh_check_interval_secs: default_refresh_check_interval_secs(),
            refresh_after_secs: default_refresh_after_secs(),
            ping_interval_secs: default_ping_interval_secs(),
            receive_timeout_ms: default_receive_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            reconnect_initial_delay_ms: default_reconnect_initial_delay_ms(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
            close_timeout_ms: default_close_timeout_ms(),
        }
    }
}

impl TimingConfig {
    pub fn refresh_check_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_check_interval_secs)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn reconnect_initial_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_initial_delay_ms)
    }

    pub fn reconnect_max_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_max_delay_ms)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }
}

fn default_api_base_url() -> String {
    "https://api.smartcielo.com".to_string()
}
fn default_ws_base_url() -> String {
    "wss://apiwss.smartcielo.com".to_string()
}
fn default_origin() -> String {
    "https://home.cielowigle.com".to_string()
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36".to_string()
}
fn default_api_key() -> String {
    "7xTAU4y4B34u8DjMsODlEyprRRQEsbJ3IB7vZie4".to_string()
}
fn default_time_zone() -> String {
    "America/Toronto".to_string()
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_device_list_limit() -> u32 {
    420
}
fn default_refresh_check_interval_secs() -> u64 {
    60
}
fn default_refresh_after_secs() -> i64 {
    1_200
}
fn default_ping_interval_secs() -> u64 {
    550
}
fn default_receive_timeout_ms() -> u64 {
    100
}
fn default_poll_interval_ms() -> u64 {
    100
}
fn default_reconnect_initial_delay_ms() -> u64 {
    1_000
}
fn default_reconnect_max_delay_ms() -> u64 {
    30_000
}
fn default_close_timeout_ms() -> u64 {
    5_000
}
fn default_outbound_capacity() -> usize {
    256
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl ClientConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self {
            api: ApiConfig::default(),
            timing: TimingConfig::default(),
            outbound_capacity: default_outbound_capacity(),
        }
    }

    /// 지정한 REST/WebSocket 주소를 쓰는 설정 (로컬 서버 테스트용)
    pub fn with_endpoints(api_base_url: &str, ws_base_url: &str) -> Self {
        let mut config = Self::default_config();
        config.api.api_base_url = api_base_url.trim_end_matches('/').to_string();
        config.api.ws_base_url = ws_base_url.trim_end_matches('/').to_string();
        config
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.api.api_base_url.is_empty() {
            return Err(CoreError::Config("api_base_url이 비어 있음".to_string()));
        }
        if !self.api.ws_base_url.starts_with("ws://") && !self.api.ws_base_url.starts_with("wss://")
        {
            return Err(CoreError::Config(format!(
                "ws_base_url은 ws:// 또는 wss:// 이어야 함: {}",
                self.api.ws_base_url
            )));
        }
        if self.outbound_capacity == 0 {
            return Err(CoreError::Config("outbound_capacity는 0보다 커야 함".to_string()));
        }

        let t = &self.timing;
        let zero = [
            ("refresh_check_interval_secs", t.refresh_check_interval_secs),
            ("ping_interval_secs", t.ping_interval_secs),
            ("receive_timeout_ms", t.receive_timeout_ms),
            ("poll_interval_ms", t.poll_interval_ms),
            ("reconnect_max_delay_ms", t.reconnect_max_delay_ms),
        ]
        .into_iter()
        .find(|(_, v)| *v == 0);
        if let Some((name, _)) = zero {
            return Err(CoreError::Config(format!("{name}는 0보다 커야 함")));
        }
        if t.refresh_after_secs <= 0 {
            return Err(CoreError::Config(
                "refresh_after_secs는 0보다 커야 함".to_string(),
            ));
        }
        Ok(())
    }
}
