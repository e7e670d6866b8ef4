//! 주기 타이머.
//!
//! `tokio::time::interval` 기반 반복 태스크. 핸들이 drop되면 태스크도 중단되어
//! 타이머 수명이 소유자(클라이언트, 연결 하나)에 묶인다.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// 실행 중인 주기 타이머 핸들
#[derive(Debug)]
pub struct TimerHandle {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl TimerHandle {
    /// `period`마다 `tick`을 실행하는 타이머 시작 (첫 발화는 `period` 후)
    ///
    /// 발화가 밀리면 다음 발화를 그만큼 미룬다. 발화마다 마감을 다시 평가하는
    /// 쪽이 누락을 흡수한다.
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tick().await;
            }
        });
        debug!("{name} 타이머 시작: 주기 {period:?}");
        Self { name, handle }
    }

    /// 타이머가 아직 돌고 있는지
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// 타이머 중단
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("{} 타이머 중단", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn fires_repeatedly() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let timer = TimerHandle::spawn("test", Duration::from_millis(20), move || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(timer.is_running());
        assert!(count.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn first_tick_waits_one_period() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let _timer = TimerHandle::spawn("test", Duration::from_secs(60), move || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancel_stops_firing() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let timer = TimerHandle::spawn("test", Duration::from_millis(10), move || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        timer.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let after_cancel = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), after_cancel);
    }
}
