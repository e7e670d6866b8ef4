//! 실시간 이벤트 스트림 연결 루프.
//!
//! `tokio-tungstenite` 연결 하나를 소유하고, 사이클마다
//! 프레임 하나를 짧은 타임아웃으로 받고 송신 큐를 비운다.
//! 연결이 끊기면 명시적 중지 전까지 계속 재연결한다.
//!
//! 상태: `Disconnected → Connecting → Connected → Closing → Disconnected | Stopped`

use async_trait::async_trait;
use cielo_core::config::{ClientConfig, TimingConfig};
use cielo_core::error::CoreError;
use cielo_core::models::event::{redact_tokens, InboundEvent};
use cielo_core::models::message::OutboundMessage;
use cielo_core::unix_now;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn, Level};
use url::Url;

use crate::connectivity::{ConnectionStatus, ConnectionTracker};
use crate::dispatcher::EventDispatcher;
use crate::outbound::{MessageSink, OutboundDrain, OutboundQueue};
use crate::session::SessionStore;
use crate::timer::TimerHandle;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// 연결 하나가 끝난 이유
#[derive(Debug)]
enum Teardown {
    /// 명시적 중지 요청
    Stopped,
    /// 서버가 닫기 프레임을 보냄
    ServerClosed,
    /// 토큰이 갱신되어 새 토큰으로 다시 연결
    TokenRotated,
    /// 수신 에러 또는 스트림 종료
    Fault(CoreError),
}

/// 스트림 연결 루프
pub struct ConnectionLoop {
    ws_base_url: String,
    origin: String,
    user_agent: String,
    timing: TimingConfig,
    store: Arc<SessionStore>,
    dispatcher: Arc<EventDispatcher>,
    tracker: Arc<ConnectionTracker>,
    /// ping 타이머가 쓰는 생산자 핸들
    queue: OutboundQueue,
}

impl ConnectionLoop {
    /// 새 연결 루프 생성
    pub fn new(
        config: &ClientConfig,
        store: Arc<SessionStore>,
        dispatcher: Arc<EventDispatcher>,
        tracker: Arc<ConnectionTracker>,
        queue: OutboundQueue,
    ) -> Self {
        Self {
            ws_base_url: config.api.ws_base_url.trim_end_matches('/').to_string(),
            origin: config.api.origin.clone(),
            user_agent: config.api.user_agent.clone(),
            timing: config.timing.clone(),
            store,
            dispatcher,
            tracker,
            queue,
        }
    }

    /// 중지될 때까지 연결/재연결을 반복
    ///
    /// 끝나면 송신 큐 소비자 측을 돌려준다. 다음 연결 루프가 이어받는다.
    pub async fn run(self, mut drain: OutboundDrain, mut stop: watch::Receiver<bool>) -> OutboundDrain {
        let mut backoff = self.timing.reconnect_initial_delay();
        info!("스트림 연결 루프 시작");

        loop {
            if stop_requested(&stop) {
                break;
            }

            self.tracker.set_status(ConnectionStatus::Connecting);
            let connected = tokio::select! {
                result = self.connect() => result,
                _ = wait_for_stop(&mut stop) => break,
            };

            let ws = match connected {
                Ok(ws) => ws,
                Err(e) => {
                    let failures = self.tracker.record_connect_failure();
                    error!("WebSocket 연결 실패 (연속 {failures}회): {e}");
                    self.store
                        .rewind_refresh_baseline(self.timing.refresh_after_secs);
                    self.tracker.set_status(ConnectionStatus::Disconnected);

                    warn!("WebSocket 재연결 대기: {backoff:?}");
                    tokio::select! {
                        _ = tokio::time::sleep(backoff) => {}
                        _ = wait_for_stop(&mut stop) => break,
                    }
                    backoff = (backoff * 2).min(self.timing.reconnect_max_delay());
                    continue;
                }
            };

            backoff = self.timing.reconnect_initial_delay();
            match self.serve(ws, &mut drain, &stop).await {
                Teardown::Stopped => break,
                Teardown::ServerClosed => info!("서버가 연결을 닫음, 재연결"),
                Teardown::TokenRotated => info!("토큰 갱신됨, 새 토큰으로 재연결"),
                Teardown::Fault(_) => {}
            }
        }

        self.tracker.set_status(ConnectionStatus::Stopped);
        info!("스트림 연결 루프 종료");
        drain
    }

    /// 스트림 URI (`/websocket/?sessionId=..&token=..`)
    fn stream_url(&self) -> Result<Url, CoreError> {
        let (token, session_id) = self.store.credentials();
        let mut url = Url::parse(&format!("{}/websocket/", self.ws_base_url))
            .map_err(|e| CoreError::Config(format!("WebSocket URL 오류: {e}")))?;
        url.query_pairs_mut()
            .append_pair("sessionId", &session_id)
            .append_pair("token", &token);
        Ok(url)
    }

    /// 고정 헤더로 업그레이드 요청
    async fn connect(&self) -> Result<WsStream, CoreError> {
        let url = self.stream_url()?;
        info!("WebSocket 연결: {}{}", url.origin().ascii_serialization(), url.path());

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| CoreError::WebSocket(format!("업그레이드 요청 생성 실패: {e}")))?;
        let headers = request.headers_mut();
        headers.insert(header::USER_AGENT, ws_header(&self.user_agent)?);
        headers.insert(header::ORIGIN, ws_header(&self.origin)?);
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));

        let (ws, _) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| CoreError::WebSocket(format!("업그레이드 실패: {e}")))?;
        Ok(ws)
    }

    /// 연결 하나를 끝날 때까지 운용
    async fn serve(
        &self,
        mut ws: WsStream,
        drain: &mut OutboundDrain,
        stop: &watch::Receiver<bool>,
    ) -> Teardown {
        self.tracker.record_connected(unix_now());
        let ping = self.arm_ping_timer();
        let rotation = self.store.subscribe_rotation();
        info!("WebSocket 연결됨");

        let teardown = loop {
            if stop_requested(stop) {
                break Teardown::Stopped;
            }
            if rotation.has_changed().unwrap_or(false) {
                break Teardown::TokenRotated;
            }

            match tokio::time::timeout(self.timing.receive_timeout(), ws.next()).await {
                Err(_) => {}
                Ok(None) => break Teardown::Fault(CoreError::WebSocket("스트림 종료".to_string())),
                Ok(Some(Err(e))) => {
                    break Teardown::Fault(CoreError::WebSocket(format!("수신 에러: {e}")))
                }
                Ok(Some(Ok(Message::Close(frame)))) => {
                    warn!("WebSocket 닫힘: {frame:?}");
                    break Teardown::ServerClosed;
                }
                Ok(Some(Ok(Message::Text(text)))) => {
                    if let Err(e) = self.handle_frame(text.as_str()) {
                        break Teardown::Fault(e);
                    }
                }
                Ok(Some(Ok(_))) => {} // Binary/Ping/Pong
            }

            if let Err(e) = drain.drain_and_send(&mut WsSink(&mut ws)).await {
                debug!("이번 사이클 송신 중단: {e}");
            }

            tokio::time::sleep(self.timing.poll_interval()).await;
        };

        self.tracker.set_status(ConnectionStatus::Closing);
        if let Teardown::Fault(e) = &teardown {
            self.tracker.record_fault();
            error!("WebSocket 장애, 재연결 시도: {e}");
            self.store
                .rewind_refresh_baseline(self.timing.refresh_after_secs);
        }

        ping.cancel();
        let _ = tokio::time::timeout(self.timing.close_timeout(), ws.close(None)).await;
        self.tracker.set_status(ConnectionStatus::Disconnected);
        teardown
    }

    /// 수신 텍스트 프레임 처리. 전달한 리스너 수를 반환
    ///
    /// 잘못된 JSON은 무시한다. 리스너 패닉은 에러로 돌려 연결 장애로 처리된다.
    fn handle_frame(&self, text: &str) -> Result<usize, CoreError> {
        match InboundEvent::parse(text) {
            Ok(InboundEvent::StateUpdate(update)) => {
                if tracing::enabled!(Level::DEBUG) {
                    debug!("StateUpdate 수신: {}", redact_tokens(update.payload()));
                }
                self.dispatcher.dispatch(&update)
            }
            Ok(InboundEvent::Other { message_type }) => {
                debug!("무시하는 메시지 유형: {message_type:?}");
                Ok(0)
            }
            Err(e) => {
                debug!("JSON이 아닌 프레임 무시: {e}");
                Ok(0)
            }
        }
    }

    /// 연결 수명에 묶인 ping 타이머
    fn arm_ping_timer(&self) -> TimerHandle {
        let queue = self.queue.clone();
        let store = Arc::clone(&self.store);
        TimerHandle::spawn("ping", self.timing.ping_interval(), move || {
            let queue = queue.clone();
            let token = store.access_token();
            async move {
                debug!("Ping Connection Reset 예약");
                if let Err(e) = queue.enqueue(OutboundMessage::ping(&token)).await {
                    warn!("ping 큐 추가 실패: {e}");
                }
            }
        })
    }
}

/// 살아있는 연결로 메시지 전송
struct WsSink<'a>(&'a mut WsStream);

#[async_trait]
impl<'a> MessageSink for WsSink<'a> {
    async fn transmit(&mut self, message: OutboundMessage) -> Result<(), CoreError> {
        let text = message.to_json()?;
        if tracing::enabled!(Level::DEBUG) {
            debug!("Send Json: {}", message.redacted());
        }
        self.0
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| CoreError::WebSocket(format!("전송 실패: {e}")))
    }
}

/// 중지가 요청되었거나 중지 신호 송신측이 사라졌는지
fn stop_requested(stop: &watch::Receiver<bool>) -> bool {
    *stop.borrow() || stop.has_changed().is_err()
}

/// 중지 신호(또는 송신측 소멸)까지 대기
async fn wait_for_stop(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await;
}

fn ws_header(value: &str) -> Result<HeaderValue, CoreError> {
    HeaderValue::from_str(value)
        .map_err(|e| CoreError::Config(format!("헤더 값으로 쓸 수 없음: {e}")))
}
