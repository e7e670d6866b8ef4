//! 디바이스/어플라이언스 모델.
//!
//! 디바이스 목록(가벼운 레코드)과 어플라이언스 상세(실시간 상태)를
//! `applianceId`로 묶는다. 벤더 필드는 그대로 보존한다.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// 어플라이언스 식별자 (벤더가 숫자/문자열을 섞어 보냄)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApplianceId {
    Number(u64),
    Text(String),
}

impl ApplianceId {
    /// 숫자/문자열 표기 차이를 없앤 비교 키
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ApplianceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplianceId::Number(n) => write!(f, "{n}"),
            ApplianceId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for ApplianceId {
    fn from(n: u64) -> Self {
        ApplianceId::Number(n)
    }
}

/// 어플라이언스 상세 레코드
///
/// `applianceId`가 없는 레코드도 받아들이되 병합에서는 건너뛴다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appliance {
    #[serde(rename = "applianceId", default, skip_serializing_if = "Option::is_none")]
    pub appliance_id: Option<ApplianceId>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Appliance {
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// 디바이스 목록 레코드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "applianceId", default, skip_serializing_if = "Option::is_none")]
    pub appliance_id: Option<ApplianceId>,
    /// 같은 `applianceId`의 상세 정보 (없으면 필드 자체가 빠짐)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appliance: Option<Appliance>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Device {
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// 디바이스 표시 이름
    pub fn name(&self) -> Option<&str> {
        self.field("deviceName").and_then(Value::as_str)
    }

    /// MAC 주소 (명령 메시지의 대상 지정에 사용)
    pub fn mac_address(&self) -> Option<&str> {
        self.field("macAddress").and_then(Value::as_str)
    }
}

/// 중복 없는 어플라이언스 ID 목록 (처음 등장 순서 유지)
pub fn unique_appliance_ids(devices: &[Device]) -> Vec<ApplianceId> {
    let mut seen = HashSet::new();
    devices
        .iter()
        .filter_map(|d| d.appliance_id.as_ref())
        .filter(|id| seen.insert(id.key()))
        .cloned()
        .collect()
}

/// 어플라이언스 상세를 같은 ID의 디바이스에 붙인다
///
/// 같은 ID의 상세가 여러 개면 마지막 것이 남는다. ID 없는 상세는 무시한다.
pub fn attach_appliances(mut devices: Vec<Device>, appliances: &[Appliance]) -> Vec<Device> {
    let by_id: HashMap<String, &Appliance> = appliances
        .iter()
        .filter_map(|a| a.appliance_id.as_ref().map(|id| (id.key(), a)))
        .collect();

    for device in &mut devices {
        let matched = device
            .appliance_id
            .as_ref()
            .and_then(|id| by_id.get(&id.key()));
        if let Some(appliance) = matched {
            device.appliance = Some((*appliance).clone());
        }
    }
    devices
}
