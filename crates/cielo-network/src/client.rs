//! Cielo Home 클라이언트 파사드.
//!
//! 호스트 통합 계층이 쓰는 공개 연산을 모은다:
//! `authenticate`, `add_listener`, `send_action`, `close`, `list_devices`.
//! 일반적인 HTTP 실패는 에러로 올리지 않고 `false`/빈 목록으로 돌려준다.

use cielo_core::config::ClientConfig;
use cielo_core::error::CoreError;
use cielo_core::models::device::Device;
use cielo_core::models::message::OutboundMessage;
use cielo_core::ports::listener::EventListener;
use cielo_core::unix_now;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::auth::AuthManager;
use crate::connectivity::{ConnectionStats, ConnectionStatus, ConnectionTracker};
use crate::devices::{DeviceDirectory, HttpDeviceApi};
use crate::dispatcher::EventDispatcher;
use crate::http_client::VendorHttp;
use crate::outbound::{self, OutboundDrain, OutboundQueue};
use crate::session::SessionStore;
use crate::timer::TimerHandle;
use crate::ws_client::ConnectionLoop;

/// 스트림 태스크 슬롯
enum StreamSlot {
    /// 연결 루프 없음. 다음 루프가 쓸 큐 소비자 측 보관
    Idle(OutboundDrain),
    /// 연결 루프 실행 중
    Running {
        stop_tx: watch::Sender<bool>,
        handle: JoinHandle<OutboundDrain>,
    },
    /// 루프가 비정상 종료되어 큐 소비자 측을 잃음
    Lost,
}

/// Cielo Home 클라이언트 — 단일 사용자 세션
pub struct CieloClient {
    config: ClientConfig,
    store: Arc<SessionStore>,
    auth: Arc<AuthManager>,
    dispatcher: Arc<EventDispatcher>,
    tracker: Arc<ConnectionTracker>,
    devices: DeviceDirectory,
    queue: RwLock<OutboundQueue>,
    refresh_timer: Mutex<Option<TimerHandle>>,
    stream: tokio::sync::Mutex<StreamSlot>,
}

impl CieloClient {
    /// 새 클라이언트 생성 (네트워크 호출 없음)
    pub fn new(config: ClientConfig) -> Result<Self, CoreError> {
        config.validate()?;

        let http = Arc::new(VendorHttp::new(&config.api)?);
        let store = Arc::new(SessionStore::new());
        let auth = Arc::new(AuthManager::new(Arc::clone(&http), Arc::clone(&store), &config));
        let devices = DeviceDirectory::new(Arc::new(HttpDeviceApi::new(
            http,
            Arc::clone(&store),
            config.api.device_list_limit,
        )));
        let (queue, drain) = outbound::channel(config.outbound_capacity);

        Ok(Self {
            config,
            store,
            auth,
            dispatcher: Arc::new(EventDispatcher::new()),
            tracker: Arc::new(ConnectionTracker::new()),
            devices,
            queue: RwLock::new(queue),
            refresh_timer: Mutex::new(None),
            stream: tokio::sync::Mutex::new(StreamSlot::Idle(drain)),
        })
    }

    /// 로그인
    ///
    /// 성공하면 갱신 타이머를 켜고, `connect_stream`이면 이벤트 스트림을
    /// 백그라운드 태스크로 띄운다 (연결을 기다리지 않음).
    /// access token을 얻었으면 `true`.
    pub async fn authenticate(&self, user_name: &str, password: &str, connect_stream: bool) -> bool {
        if let Err(e) = self.auth.login(user_name, password).await {
            warn!("인증 실패: {e}");
            return false;
        }

        self.ensure_refresh_timer();

        if connect_stream {
            if let Err(e) = self.start_stream().await {
                error!("이벤트 스트림 시작 실패: {e}");
            }
        }
        true
    }

    /// 즉시 토큰 갱신. 성공하면 `true`
    pub async fn refresh_token(&self) -> bool {
        match self.auth.refresh().await {
            Ok(()) => true,
            Err(e) => {
                warn!("토큰 갱신 실패: {e}");
                false
            }
        }
    }

    /// 상태 변경 리스너 등록
    pub fn add_listener(&self, listener: Arc<dyn EventListener>) {
        self.dispatcher.add_listener(listener);
    }

    /// 명령 메시지를 송신 큐에 넣는다
    ///
    /// `token`, `mid`, `ts`를 찍어 넣으며, 실제 전송은 연결 루프가 한다.
    /// 기다리지 않는다. 큐가 가득 차 있으면 `CoreError::QueueFull`
    /// (스트림 없이 로그인했거나 `close()` 뒤에 `outbound_capacity`개를 넘긴 경우).
    pub async fn send_action(&self, message: serde_json::Value) -> Result<(), CoreError> {
        let (token, session_id) = self.store.credentials();
        if token.is_empty() {
            return Err(CoreError::Auth("인증되지 않음".to_string()));
        }

        let message = OutboundMessage::from_value(message)?.stamped(&token, &session_id, unix_now());
        self.queue.read().try_enqueue(message)
    }

    /// 디바이스 목록 (어플라이언스 상세 병합)
    pub async fn list_devices(&self) -> Vec<Device> {
        self.devices.list_devices().await
    }

    /// 이벤트 스트림 중지
    ///
    /// 연결 루프에 중지를 알리고 종료를 기다린다. 한도를 넘기면 강제 중단한다.
    /// 토큰 갱신 타이머는 클라이언트가 drop될 때까지 계속 돈다 (`list_devices` 등
    /// REST 호출이 close 뒤에도 유효한 토큰을 쓰도록).
    pub async fn close(&self) {
        let mut slot = self.stream.lock().await;
        let (stop_tx, handle) = match std::mem::replace(&mut *slot, StreamSlot::Lost) {
            StreamSlot::Running { stop_tx, handle } => (stop_tx, handle),
            other => {
                *slot = other;
                return;
            }
        };

        let _ = stop_tx.send(true);
        let abort = handle.abort_handle();
        match tokio::time::timeout(self.config.timing.close_timeout(), handle).await {
            Ok(Ok(drain)) => {
                *slot = StreamSlot::Idle(drain);
                info!("이벤트 스트림 종료");
            }
            Ok(Err(e)) => error!("연결 루프 비정상 종료: {e}"),
            Err(_) => {
                warn!("연결 루프 종료 대기 시간 초과, 강제 중단");
                abort.abort();
                self.tracker.set_status(ConnectionStatus::Stopped);
            }
        }
    }

    /// 인증된 상태인지
    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    pub fn session_id(&self) -> String {
        self.store.snapshot().session_id
    }

    pub fn user_id(&self) -> String {
        self.store.snapshot().user_id
    }

    /// 세션 저장소
    pub fn session_store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// 스트림 연결 상태
    pub fn connection_status(&self) -> ConnectionStatus {
        self.tracker.status()
    }

    /// 스트림 연결 상태 변경 구독
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.tracker.subscribe()
    }

    pub fn connection_stats(&self) -> ConnectionStats {
        self.tracker.stats()
    }

    /// 갱신 타이머가 없으면 시작
    fn ensure_refresh_timer(&self) {
        let mut timer = self.refresh_timer.lock();
        if timer.as_ref().is_some_and(TimerHandle::is_running) {
            return;
        }
        *timer = Some(self.auth.spawn_refresh_timer());
    }

    /// 연결 루프가 없으면 띄운다
    async fn start_stream(&self) -> Result<(), CoreError> {
        let mut slot = self.stream.lock().await;

        let drain = match std::mem::replace(&mut *slot, StreamSlot::Lost) {
            StreamSlot::Running { stop_tx, handle } if !handle.is_finished() => {
                *slot = StreamSlot::Running { stop_tx, handle };
                return Ok(());
            }
            StreamSlot::Running { handle, .. } => match handle.await {
                Ok(drain) => drain,
                Err(e) => {
                    warn!("이전 연결 루프 비정상 종료: {e}");
                    self.reset_channel()
                }
            },
            StreamSlot::Idle(drain) => drain,
            StreamSlot::Lost => self.reset_channel(),
        };

        let (stop_tx, stop_rx) = watch::channel(false);
        let connection = ConnectionLoop::new(
            &self.config,
            Arc::clone(&self.store),
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.tracker),
            self.queue.read().clone(),
        );
        let handle = tokio::spawn(connection.run(drain, stop_rx));
        *slot = StreamSlot::Running { stop_tx, handle };
        info!("이벤트 스트림 태스크 시작");
        Ok(())
    }

    /// 잃어버린 큐 대신 새 채널을 만든다 (이전 큐의 대기 메시지는 버려짐)
    fn reset_channel(&self) -> OutboundDrain {
        let (queue, drain) = outbound::channel(self.config.outbound_capacity);
        *self.queue.write() = queue;
        warn!("송신 큐 재생성");
        drain
    }
}
