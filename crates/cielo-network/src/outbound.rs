//! 송신 큐.
//!
//! bounded `mpsc` 채널. 생산자(호출자, ping 타이머)는 `OutboundQueue`를 복제해
//! 넣고, 유일한 소비자인 연결 루프가 `OutboundDrain`으로 비운다.
//! 채널이 상호배제를 대신하므로 별도 락이 없다.

use async_trait::async_trait;
use cielo_core::error::CoreError;
use cielo_core::models::message::OutboundMessage;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, warn};

/// 메시지를 실제로 내보내는 쪽 (연결 루프에서는 WebSocket)
#[async_trait]
pub trait MessageSink: Send {
    async fn transmit(&mut self, message: OutboundMessage) -> Result<(), CoreError>;
}

/// 송신 큐 생산자 측
#[derive(Debug, Clone)]
pub struct OutboundQueue {
    tx: mpsc::Sender<OutboundMessage>,
}

/// 송신 큐 소비자 측 (연결 루프 소유)
#[derive(Debug)]
pub struct OutboundDrain {
    rx: mpsc::Receiver<OutboundMessage>,
}

/// 용량 `capacity`의 송신 큐 생성
pub fn channel(capacity: usize) -> (OutboundQueue, OutboundDrain) {
    let (tx, rx) = mpsc::channel(capacity);
    (OutboundQueue { tx }, OutboundDrain { rx })
}

impl OutboundQueue {
    /// 큐 끝에 추가. 가득 차 있으면 자리가 날 때까지 기다린다.
    pub async fn enqueue(&self, message: OutboundMessage) -> Result<(), CoreError> {
        self.tx
            .send(message)
            .await
            .map_err(|_| CoreError::QueueClosed)
    }

    /// 기다리지 않고 추가 (가득 차면 에러)
    pub fn try_enqueue(&self, message: OutboundMessage) -> Result<(), CoreError> {
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => CoreError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => CoreError::QueueClosed,
        })
    }

    /// 소비자가 사라졌는지
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl OutboundDrain {
    /// 대기 중인 메시지 수
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// 큐가 빌 때까지 앞에서부터 꺼내 `sink`로 전송
    ///
    /// 전송이 실패하면 그 메시지는 버리고(최대 1회 전송) 이번 사이클의 비우기를
    /// 멈춘다. 뒤의 메시지는 큐에 남아 다음 사이클에 나간다.
    /// 전송한 메시지 수를 반환한다.
    pub async fn drain_and_send<S>(&mut self, sink: &mut S) -> Result<usize, CoreError>
    where
        S: MessageSink + ?Sized,
    {
        let mut sent = 0;
        loop {
            let message = match self.rx.try_recv() {
                Ok(message) => message,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            };

            if let Err(e) = sink.transmit(message).await {
                warn!("메시지 전송 실패, 버림: {e}");
                return Err(e);
            }
            sent += 1;
        }

        if sent > 0 {
            debug!("송신 큐 비움: {sent}개 전송");
        }
        Ok(sent)
    }
}
