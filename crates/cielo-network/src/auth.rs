//! 인증 관리.
//!
//! 벤더 로그인, 토큰 갱신, 주기적 갱신 타이머를 담당한다.
//! 타이머는 60초마다 발화하고, 발화할 때마다 마지막 갱신 이후
//! 1200초가 지났는지 다시 평가한다. 발화가 늦거나 빠져도 다음 발화가 갱신한다.

use cielo_core::config::ClientConfig;
use cielo_core::error::CoreError;
use cielo_core::models::envelope::{LoginData, RefreshData};
use cielo_core::models::session::Session;
use cielo_core::unix_now;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::http_client::VendorHttp;
use crate::session::SessionStore;
use crate::timer::TimerHandle;

const LOGIN_PATH: &str = "/web/login";
const REFRESH_PATH: &str = "/web/token/refresh";

/// 갱신 타이머 한 번의 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTick {
    /// 미인증이거나 아직 갱신 시각 전
    NotDue,
    /// 갱신 성공 (재로그인 포함)
    Refreshed,
    /// 갱신 시도했으나 실패 — 세션 그대로, 다음 발화에서 재시도
    Failed,
}

/// 인증 매니저 — 로그인/갱신/갱신 타이머
pub struct AuthManager {
    http: Arc<VendorHttp>,
    store: Arc<SessionStore>,
    time_zone: String,
    refresh_after_secs: i64,
    refresh_check_interval: Duration,
}

impl AuthManager {
    /// 새 인증 매니저 생성
    pub fn new(http: Arc<VendorHttp>, store: Arc<SessionStore>, config: &ClientConfig) -> Self {
        Self {
            http,
            store,
            time_zone: config.api.time_zone.clone(),
            refresh_after_secs: config.timing.refresh_after_secs,
            refresh_check_interval: config.timing.refresh_check_interval(),
        }
    }

    /// 세션 저장소
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// 사용자명/비밀번호 로그인
    ///
    /// 성공하면 세션을 통째로 교체하고 갱신 기준 시각을 지금으로 잡는다.
    /// 실패하면 기존 세션은 건드리지 않는다.
    pub async fn login(&self, user_name: &str, password: &str) -> Result<(), CoreError> {
        debug!("로그인 요청: user={user_name}");
        let body = login_payload(user_name, password, &self.time_zone);
        let data: LoginData = self.http.post(LOGIN_PATH, &body).await?;

        if data.user.access_token.is_empty() {
            return Err(CoreError::Auth("로그인 응답에 access token 없음".to_string()));
        }

        self.store.replace(Session {
            access_token: data.user.access_token,
            refresh_token: data.user.refresh_token,
            session_id: data.user.session_id,
            user_id: data.user.user_id,
            user_name: user_name.to_string(),
            password: password.to_string(),
            last_refresh_ts: unix_now(),
        });

        info!("로그인 성공: user={user_name}");
        Ok(())
    }

    /// 저장된 자격증명으로 다시 로그인
    pub async fn relogin(&self) -> Result<(), CoreError> {
        let session = self.store.snapshot();
        if session.user_name.is_empty() {
            return Err(CoreError::Auth("저장된 자격증명 없음".to_string()));
        }
        self.login(&session.user_name, &session.password).await
    }

    /// 토큰 갱신
    ///
    /// 성공 시 두 토큰과 갱신 기준 시각을 한 번에 교체한다. 요청 중에
    /// 로그인으로 세션이 바뀌었으면 새 세션을 그대로 둔다.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let generation = self.store.generation();
        let current = self.store.snapshot();
        if !current.is_authenticated() {
            return Err(CoreError::Auth("인증되지 않음".to_string()));
        }

        let data: RefreshData = self
            .http
            .get(
                REFRESH_PATH,
                &[("refreshToken", current.refresh_token.clone())],
                &current.access_token,
            )
            .await?;

        if self
            .store
            .rotate_tokens(generation, data.access_token, data.refresh_token, unix_now())
        {
            info!("토큰 갱신 성공");
        } else {
            info!("갱신 중 세션이 교체됨, 갱신 결과 버림");
        }
        Ok(())
    }

    /// 갱신 타이머 한 번의 처리
    ///
    /// `now - last_refresh_ts`가 기준을 **초과**할 때만 갱신을 시도한다.
    /// 인증 계열 실패는 저장된 자격증명으로 재로그인을 시도한다.
    pub async fn on_refresh_tick(&self, now: i64) -> RefreshTick {
        let session = self.store.snapshot();
        if !session.is_authenticated() || !session.refresh_due(now, self.refresh_after_secs) {
            return RefreshTick::NotDue;
        }

        match self.refresh().await {
            Ok(()) => RefreshTick::Refreshed,
            Err(e) if e.is_auth() => {
                warn!("토큰 갱신 인증 실패, 재로그인 시도: {e}");
                match self.relogin().await {
                    Ok(()) => RefreshTick::Refreshed,
                    Err(e) => {
                        warn!("재로그인 실패, 다음 주기에 재시도: {e}");
                        RefreshTick::Failed
                    }
                }
            }
            Err(e) => {
                warn!("토큰 갱신 실패, 다음 주기에 재시도: {e}");
                RefreshTick::Failed
            }
        }
    }

    /// 갱신 타이머 시작
    ///
    /// 반환된 핸들이 drop되면 타이머도 멈춘다.
    pub fn spawn_refresh_timer(self: &Arc<Self>) -> TimerHandle {
        let auth = Arc::clone(self);
        TimerHandle::spawn("토큰 갱신", self.refresh_check_interval, move || {
            let auth = Arc::clone(&auth);
            async move {
                auth.on_refresh_tick(unix_now()).await;
            }
        })
    }
}

/// 고정 웹 클라이언트 fingerprint가 담긴 로그인 본문
fn login_payload(user_name: &str, password: &str, time_zone: &str) -> serde_json::Value {
    serde_json::json!({
        "user": {
            "userId": user_name,
            "password": password,
            "mobileDeviceId": "WEB",
            "deviceTokenId": "WEB",
            "appType": "WEB",
            "appVersion": "1.0",
            "timeZone": time_zone,
            "mobileDeviceName": "chrome",
            "deviceType": "WEB",
            "ipAddress": "0.0.0.0",
            "isSmartHVAC": 0,
            "locale": "en",
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const LOGIN_OK: &str = r#"{"status":200,"message":"SUCCESS","data":{"user":{
        "accessToken":"acc_1","refreshToken":"ref_1","sessionId":"sess_1","userId":"user_1"}}}"#;
    const REFRESH_OK: &str = r#"{"status":200,"message":"SUCCESS","data":{
        "accessToken":"acc_2","refreshToken":"ref_2"}}"#;

    fn manager(url: &str) -> AuthManager {
        let config = ClientConfig::with_endpoints(url, "ws://127.0.0.1:1");
        let http = Arc::new(VendorHttp::new(&config.api).unwrap());
        AuthManager::new(http, Arc::new(SessionStore::new()), &config)
    }

    async fn logged_in(server: &mut mockito::ServerGuard) -> AuthManager {
        let _login = server
            .mock("POST", "/web/login")
            .with_status(200)
            .with_body(LOGIN_OK)
            .create_async()
            .await;
        let auth = manager(&server.url());
        auth.login("user@test.com", "pw").await.unwrap();
        auth
    }

    #[test]
    fn payload_has_fingerprint() {
        let body = login_payload("u", "p", "America/Toronto");
        assert_eq!(body["user"]["userId"], "u");
        assert_eq!(body["user"]["appType"], "WEB");
        assert_eq!(body["user"]["isSmartHVAC"], 0);
        assert_eq!(body["user"]["timeZone"], "America/Toronto");
    }

    #[tokio::test]
    async fn login_success_populates_session() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/web/login")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "user": {"userId": "user@test.com", "password": "pw", "deviceType": "WEB"}
            })))
            .with_status(200)
            .with_body(LOGIN_OK)
            .create_async()
            .await;

        let auth = manager(&server.url());
        auth.login("user@test.com", "pw").await.unwrap();
        mock.assert_async().await;

        let s = auth.store().snapshot();
        assert_eq!(s.access_token, "acc_1");
        assert_eq!(s.refresh_token, "ref_1");
        assert_eq!(s.session_id, "sess_1");
        assert_eq!(s.user_id, "user_1");
        assert_eq!(s.user_name, "user@test.com");
        assert!((unix_now() - s.last_refresh_ts).abs() <= 2);
    }

    #[tokio::test]
    async fn login_envelope_failure_leaves_session_empty() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/web/login")
            .with_status(200)
            .with_body(r#"{"status":200,"message":"USER_NOT_FOUND","data":null}"#)
            .create_async()
            .await;

        let auth = manager(&server.url());
        let err = auth.login("bad", "pw").await.unwrap_err();
        assert!(matches!(err, CoreError::Envelope { .. }));
        assert!(!auth.store().is_authenticated());
        assert_eq!(auth.store().generation(), 0);
    }

    #[tokio::test]
    async fn login_network_failure() {
        let auth = manager("http://127.0.0.1:1");
        assert!(auth.login("u", "p").await.is_err());
        assert!(!auth.store().is_authenticated());
    }

    #[tokio::test]
    async fn refresh_without_login_fails() {
        let auth = manager("http://127.0.0.1:1");
        let err = auth.refresh().await.unwrap_err();
        assert!(err.to_string().contains("인증"));
    }

    #[tokio::test]
    async fn refresh_replaces_tokens() {
        let mut server = mockito::Server::new_async().await;
        let auth = logged_in(&mut server).await;
        let refresh = server
            .mock("GET", "/web/token/refresh")
            .match_query(Matcher::UrlEncoded("refreshToken".into(), "ref_1".into()))
            .match_header("authorization", "acc_1")
            .with_status(200)
            .with_body(REFRESH_OK)
            .create_async()
            .await;

        auth.refresh().await.unwrap();
        refresh.assert_async().await;

        let s = auth.store().snapshot();
        assert_eq!(s.access_token, "acc_2");
        assert_eq!(s.refresh_token, "ref_2");
        assert_eq!(s.session_id, "sess_1");
    }

    #[tokio::test]
    async fn refresh_failure_keeps_prior_session() {
        let mut server = mockito::Server::new_async().await;
        let auth = logged_in(&mut server).await;
        let before = auth.store().snapshot();
        let _refresh = server
            .mock("GET", "/web/token/refresh")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        assert!(auth.refresh().await.is_err());
        assert_eq!(auth.store().snapshot(), before);
    }

    #[tokio::test]
    async fn tick_before_deadline_does_not_refresh() {
        let mut server = mockito::Server::new_async().await;
        let auth = logged_in(&mut server).await;
        let base = auth.store().snapshot().last_refresh_ts;
        let refresh = server
            .mock("GET", "/web/token/refresh")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(REFRESH_OK)
            .expect(0)
            .create_async()
            .await;

        assert_eq!(auth.on_refresh_tick(base + 1_199).await, RefreshTick::NotDue);
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn tick_after_deadline_refreshes_once() {
        let mut server = mockito::Server::new_async().await;
        let auth = logged_in(&mut server).await;
        let base = auth.store().snapshot().last_refresh_ts;
        let refresh = server
            .mock("GET", "/web/token/refresh")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(REFRESH_OK)
            .expect(1)
            .create_async()
            .await;

        assert_eq!(auth.on_refresh_tick(base + 1_201).await, RefreshTick::Refreshed);
        refresh.assert_async().await;
        assert_eq!(auth.store().access_token(), "acc_2");
    }

    #[tokio::test]
    async fn failed_refresh_retries_on_next_tick() {
        let mut server = mockito::Server::new_async().await;
        let auth = logged_in(&mut server).await;
        let base = auth.store().snapshot().last_refresh_ts;
        let failing = server
            .mock("GET", "/web/token/refresh")
            .match_query(Matcher::Any)
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        assert_eq!(auth.on_refresh_tick(base + 1_201).await, RefreshTick::Failed);
        assert_eq!(auth.on_refresh_tick(base + 1_261).await, RefreshTick::Failed);
        failing.assert_async().await;
        assert_eq!(auth.store().access_token(), "acc_1");
    }

    #[tokio::test]
    async fn auth_failure_on_refresh_relogs_in() {
        let mut server = mockito::Server::new_async().await;
        let auth = logged_in(&mut server).await;
        let base = auth.store().snapshot().last_refresh_ts;
        let _refresh = server
            .mock("GET", "/web/token/refresh")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status":401,"message":"TOKEN_EXPIRED","data":null}"#)
            .create_async()
            .await;
        let relogin = server
            .mock("POST", "/web/login")
            .with_status(200)
            .with_body(LOGIN_OK.replace("acc_1", "acc_fresh"))
            .create_async()
            .await;

        assert_eq!(auth.on_refresh_tick(base + 1_300).await, RefreshTick::Refreshed);
        relogin.assert_async().await;
        assert_eq!(auth.store().access_token(), "acc_fresh");
    }

    #[tokio::test]
    async fn unauthenticated_tick_is_noop() {
        let auth = manager("http://127.0.0.1:1");
        assert_eq!(auth.on_refresh_tick(unix_now() + 10_000).await, RefreshTick::NotDue);
    }
}
