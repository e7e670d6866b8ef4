//! 이벤트 리스너 포트.
//!
//! 호출자가 구현하여 `CieloClient::add_listener`로 등록한다.
//! 리스너는 연결 루프 태스크 위에서 동기적으로 호출되므로
//! 오래 걸리는 작업은 자체 채널로 넘겨야 한다.

use crate::models::event::StateUpdate;

/// 상태 변경 이벤트 수신자
pub trait EventListener: Send + Sync {
    /// 파싱된 `StateUpdate` 이벤트 수신
    fn on_state_update(&self, event: &StateUpdate);
}

impl<F> EventListener for F
where
    F: Fn(&StateUpdate) + Send + Sync,
{
    fn on_state_update(&self, event: &StateUpdate) {
        self(event)
    }
}
