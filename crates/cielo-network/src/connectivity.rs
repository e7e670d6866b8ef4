//! 스트림 연결 상태 추적.
//!
//! 연결 루프의 상태 전이를 `watch`로 알리고, 연결/장애 횟수와
//! 마지막 연결 시각을 lock-free 카운터로 기록한다.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::debug;

/// 연결 루프 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// 연결 없음 (재연결 대기 포함)
    Disconnected,
    /// 업그레이드 시도 중
    Connecting,
    /// 수신/송신 중
    Connected,
    /// 연결 정리 중
    Closing,
    /// 명시적 중지 — 더 이상 재연결하지 않음
    Stopped,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
            ConnectionStatus::Connecting => write!(f, "Connecting"),
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Closing => write!(f, "Closing"),
            ConnectionStatus::Stopped => write!(f, "Stopped"),
        }
    }
}

/// 연결 상태 추적기
pub struct ConnectionTracker {
    status_tx: watch::Sender<ConnectionStatus>,
    /// 업그레이드 성공 누적 횟수
    connect_count: AtomicU64,
    /// 연결 장애 누적 횟수
    fault_count: AtomicU64,
    /// 연속 업그레이드 실패 횟수 (성공 시 0)
    consecutive_failures: AtomicU64,
    /// 마지막 업그레이드 성공 시각 (Unix 초, 0이면 없음)
    last_connected_at: AtomicI64,
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionTracker {
    pub fn new() -> Self {
        let (status_tx, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            status_tx,
            connect_count: AtomicU64::new(0),
            fault_count: AtomicU64::new(0),
            consecutive_failures: AtomicU64::new(0),
            last_connected_at: AtomicI64::new(0),
        }
    }

    /// 현재 상태
    pub fn status(&self) -> ConnectionStatus {
        *self.status_tx.borrow()
    }

    /// 상태 변경 수신기
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }

    /// 상태 전이
    pub(crate) fn set_status(&self, status: ConnectionStatus) {
        let prev = self.status_tx.send_replace(status);
        if prev != status {
            debug!("스트림 상태: {prev} → {status}");
        }
    }

    /// 업그레이드 성공 기록
    pub(crate) fn record_connected(&self, now: i64) {
        self.connect_count.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.last_connected_at.store(now, Ordering::Relaxed);
        self.set_status(ConnectionStatus::Connected);
    }

    /// 업그레이드 실패 기록, 연속 실패 횟수 반환
    pub(crate) fn record_connect_failure(&self) -> u64 {
        self.fault_count.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// 연결 중 장애 기록
    pub(crate) fn record_fault(&self) {
        self.fault_count.fetch_add(1, Ordering::Relaxed);
    }

    /// 통계 스냅샷
    pub fn stats(&self) -> ConnectionStats {
        let last = self.last_connected_at.load(Ordering::Relaxed);
        ConnectionStats {
            status: self.status(),
            connect_count: self.connect_count.load(Ordering::Relaxed),
            fault_count: self.fault_count.load(Ordering::Relaxed),
            consecutive_failures: self.consecutive_failures.load(Ordering::Relaxed),
            last_connected_at: (last != 0).then_some(last),
        }
    }
}

/// 연결 통계
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStats {
    pub status: ConnectionStatus,
    pub connect_count: u64,
    pub fault_count: u64,
    pub consecutive_failures: u64,
    pub last_connected_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state() {
        let tracker = ConnectionTracker::new();
        let stats = tracker.stats();
        assert_eq!(stats.status, ConnectionStatus::Disconnected);
        assert_eq!(stats.connect_count, 0);
        assert_eq!(stats.last_connected_at, None);
    }

    #[test]
    fn connect_resets_consecutive_failures() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.record_connect_failure(), 1);
        assert_eq!(tracker.record_connect_failure(), 2);

        tracker.record_connected(1_700_000_000);
        let stats = tracker.stats();
        assert_eq!(stats.status, ConnectionStatus::Connected);
        assert_eq!(stats.consecutive_failures, 0);
        assert_eq!(stats.fault_count, 2);
        assert_eq!(stats.last_connected_at, Some(1_700_000_000));
    }

    #[test]
    fn fault_counts_accumulate() {
        let tracker = ConnectionTracker::new();
        tracker.record_fault();
        tracker.record_fault();
        assert_eq!(tracker.stats().fault_count, 2);
    }

    #[tokio::test]
    async fn subscribe_receives_changes() {
        let tracker = ConnectionTracker::new();
        let mut rx = tracker.subscribe();

        tracker.set_status(ConnectionStatus::Connecting);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ConnectionStatus::Connecting);

        tracker.set_status(ConnectionStatus::Stopped);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ConnectionStatus::Stopped);
    }

    #[test]
    fn display_names() {
        assert_eq!(ConnectionStatus::Closing.to_string(), "Closing");
        assert_eq!(ConnectionStatus::Stopped.to_string(), "Stopped");
    }
}
