//! 세션 저장소.
//!
//! 현재 토큰/세션 ID를 보관한다. 쓰기는 `AuthManager`의 로그인·갱신 경로와
//! 연결 장애 시의 갱신 기준 시각 되감기뿐이고, 연결 루프는 읽기만 한다.
//! 토큰이 바뀔 때마다 세대 번호를 `watch`로 알려 스트림이 재연결하게 한다.

use cielo_core::models::session::Session;
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::debug;

/// 세션 저장소 — 단일 활성 세션
pub struct SessionStore {
    session: RwLock<Session>,
    /// 토큰 세대 (로그인/갱신마다 증가)
    generation_tx: watch::Sender<u64>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// 빈(미인증) 저장소 생성
    pub fn new() -> Self {
        let (generation_tx, _) = watch::channel(0);
        Self {
            session: RwLock::new(Session::default()),
            generation_tx,
        }
    }

    /// 현재 세션 복제본
    pub fn snapshot(&self) -> Session {
        self.session.read().clone()
    }

    /// 인증된 상태인지
    pub fn is_authenticated(&self) -> bool {
        self.session.read().is_authenticated()
    }

    /// (access_token, session_id)
    pub fn credentials(&self) -> (String, String) {
        let s = self.session.read();
        (s.access_token.clone(), s.session_id.clone())
    }

    pub fn access_token(&self) -> String {
        self.session.read().access_token.clone()
    }

    /// 세션 통째로 교체하고 토큰 세대를 올린다
    pub(crate) fn replace(&self, session: Session) {
        let mut current = self.session.write();
        *current = session;
        self.generation_tx.send_modify(|g| *g += 1);
    }

    /// 갱신 응답의 토큰을 반영한다
    ///
    /// `expected_generation`은 갱신 요청 직전의 세대다. 그 사이 로그인 등으로
    /// 세션이 교체되었으면 아무것도 바꾸지 않고 `false`를 돌려준다.
    /// 세대 비교와 교체는 같은 쓰기 락 안에서 일어난다.
    pub(crate) fn rotate_tokens(
        &self,
        expected_generation: u64,
        access_token: String,
        refresh_token: String,
        now: i64,
    ) -> bool {
        let mut current = self.session.write();
        if *self.generation_tx.borrow() != expected_generation {
            return false;
        }
        *current = current.with_tokens(access_token, refresh_token, now);
        self.generation_tx.send_modify(|g| *g += 1);
        true
    }

    /// 갱신 기준 시각을 `secs`만큼 과거로 되돌린다
    ///
    /// 다음 갱신 타이머 발화 때 곧바로 토큰 갱신이 일어나도록 하기 위함.
    pub(crate) fn rewind_refresh_baseline(&self, secs: i64) {
        let mut s = self.session.write();
        s.last_refresh_ts -= secs;
        debug!("토큰 갱신 기준 시각 되감기: {secs}초");
    }

    /// 토큰 세대 변경 구독
    pub fn subscribe_rotation(&self) -> watch::Receiver<u64> {
        self.generation_tx.subscribe()
    }

    /// 현재 토큰 세대
    pub fn generation(&self) -> u64 {
        *self.generation_tx.borrow()
    }
}
