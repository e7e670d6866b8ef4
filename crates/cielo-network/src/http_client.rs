//! 벤더 REST 호출 공통부.
//!
//! 고정 헤더(content-type, referer, origin, user-agent, x-api-key) 주입,
//! HTTP 상태 확인, envelope 성공 판정을 한곳에서 처리한다.

use cielo_core::config::ApiConfig;
use cielo_core::error::CoreError;
use cielo_core::models::envelope::Envelope;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, ORIGIN, REFERER};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// 벤더 API 키 헤더
const API_KEY_HEADER: &str = "x-api-key";

/// 벤더 REST 클라이언트
pub struct VendorHttp {
    client: reqwest::Client,
    base_url: String,
}

impl VendorHttp {
    /// 고정 헤더가 설정된 HTTP 클라이언트 생성
    pub fn new(api: &ApiConfig) -> Result<Self, CoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=UTF-8"),
        );
        headers.insert(REFERER, header_value(&api.origin)?);
        headers.insert(ORIGIN, header_value(&api.origin)?);
        headers.insert(
            HeaderName::from_static(API_KEY_HEADER),
            header_value(&api.api_key)?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(api.user_agent.as_str())
            .timeout(api.request_timeout())
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            base_url: api.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 기본 URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 인증 헤더를 붙인 GET → envelope data
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        access_token: &str,
    ) -> Result<T, CoreError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {path}");

        let resp = self
            .client
            .get(&url)
            .query(query)
            .header(AUTHORIZATION, header_value(access_token)?)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("GET {path} 요청 실패: {e}")))?;

        Self::read_envelope(path, resp).await
    }

    /// JSON 본문 POST → envelope data
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, CoreError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {path}");

        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("POST {path} 요청 실패: {e}")))?;

        Self::read_envelope(path, resp).await
    }

    /// HTTP 상태 확인 후 envelope를 풀어 data 반환
    async fn read_envelope<T: DeserializeOwned>(
        path: &str,
        resp: reqwest::Response,
    ) -> Result<T, CoreError> {
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| CoreError::Network(format!("{path} 응답 본문 읽기 실패: {e}")))?;

        match status {
            StatusCode::OK => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(CoreError::Auth(format!("{path} 인증 실패 ({status})")));
            }
            _ => {
                return Err(CoreError::Network(format!("{path} 실패 ({status}): {text}")));
            }
        }

        let envelope: Envelope<T> = serde_json::from_str(&text)?;
        envelope.into_data()
    }
}

fn header_value(value: &str) -> Result<HeaderValue, CoreError> {
    HeaderValue::from_str(value)
        .map_err(|e| CoreError::Config(format!("헤더 값으로 쓸 수 없음: {e}")))
}
