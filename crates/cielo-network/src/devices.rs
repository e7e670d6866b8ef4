//! 디바이스 디렉터리.
//!
//! 디바이스 목록을 받아 어플라이언스 상세를 한 번에 조회하고
//! `applianceId`로 합친다. 캐시하지 않는다.

use async_trait::async_trait;
use cielo_core::error::CoreError;
use cielo_core::models::device::{attach_appliances, unique_appliance_ids, Appliance, ApplianceId, Device};
use cielo_core::models::envelope::{ApplianceListData, DeviceListData};
use cielo_core::ports::device_api::DeviceApi;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::http_client::VendorHttp;
use crate::session::SessionStore;

const DEVICES_PATH: &str = "/web/devices";
const APPLIANCES_PATH: &str = "/web/sync/appliances/1";

/// `DeviceApi` 포트의 REST 구현
pub struct HttpDeviceApi {
    http: Arc<VendorHttp>,
    store: Arc<SessionStore>,
    limit: u32,
}

impl HttpDeviceApi {
    pub fn new(http: Arc<VendorHttp>, store: Arc<SessionStore>, limit: u32) -> Self {
        Self { http, store, limit }
    }
}

#[async_trait]
impl DeviceApi for HttpDeviceApi {
    async fn fetch_devices(&self) -> Result<Vec<Device>, CoreError> {
        let token = self.store.access_token();
        let data: DeviceListData = self
            .http
            .get(DEVICES_PATH, &[("limit", self.limit.to_string())], &token)
            .await?;
        debug!("디바이스 {}개 수신", data.list_devices.len());
        Ok(data.list_devices)
    }

    async fn fetch_appliances(&self, ids: &[ApplianceId]) -> Result<Vec<Appliance>, CoreError> {
        let token = self.store.access_token();
        let id_list = ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
        let data: ApplianceListData = self
            .http
            .get(
                APPLIANCES_PATH,
                &[("applianceIdList", format!("[{id_list}]"))],
                &token,
            )
            .await?;
        debug!("어플라이언스 {}개 수신", data.list_appliances.len());
        Ok(data.list_appliances)
    }
}

/// 디바이스 목록 + 어플라이언스 상세 병합
pub struct DeviceDirectory {
    api: Arc<dyn DeviceApi>,
}

impl DeviceDirectory {
    pub fn new(api: Arc<dyn DeviceApi>) -> Self {
        Self { api }
    }

    /// 디바이스 목록 (어플라이언스 상세 포함)
    ///
    /// 디바이스 목록 조회가 실패하면 빈 목록. 상세 조회만 실패하면
    /// 상세 없이 디바이스 목록을 돌려준다.
    pub async fn list_devices(&self) -> Vec<Device> {
        let devices = match self.api.fetch_devices().await {
            Ok(devices) => devices,
            Err(e) => {
                warn!("디바이스 목록 조회 실패: {e}");
                return Vec::new();
            }
        };

        let ids = unique_appliance_ids(&devices);
        if ids.is_empty() {
            return devices;
        }

        match self.api.fetch_appliances(&ids).await {
            Ok(appliances) => attach_appliances(devices, &appliances),
            Err(e) => {
                warn!("어플라이언스 상세 조회 실패: {e}");
                devices
            }
        }
    }
}
