//! System information seam.
//!
//! The SDK never probes hardware itself — the host supplies a provider and
//! the snapshot is read once at configuration time.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Static device/system facts, read once at startup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    /// Unique device identifier, only populated when the host opts in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Device model string.
    pub device_model: String,
    /// Device class (desktop, console, handheld, ...).
    pub device_type: String,
    /// Graphics adapter name.
    pub graphics_name: String,
    /// Graphics API/device type.
    pub graphics_type: String,
    /// Graphics memory in megabytes.
    pub graphics_memory_mb: u64,
    /// Operating system name and version.
    pub os_name: String,
    /// Processor model string.
    pub processor_type: String,
    /// Logical processor count.
    pub processor_count: u32,
    /// Processor frequency in megahertz.
    pub processor_frequency_mhz: u32,
    /// System memory in megabytes.
    pub system_memory_mb: u64,
}

impl SystemSnapshot {
    /// Wire-form data block with the collector's short field names.
    pub fn to_wire_data(&self) -> Value {
        let mut data = json!({
            "dModel": self.device_model,
            "dType": self.device_type,
            "gName": self.graphics_name,
            "gType": self.graphics_type,
            "gMem": self.graphics_memory_mb,
            "osName": self.os_name,
            "pType": self.processor_type,
            "pCount": self.processor_count,
            "pFreq": self.processor_frequency_mhz,
            "sysMem": self.system_memory_mb,
        });
        if let Some(id) = &self.device_id {
            data["dId"] = json!(id);
        }
        data
    }
}

/// Source of the one-time system snapshot.
pub trait SystemInfoProvider: Send + Sync {
    /// Gather the static facts for the current device.
    fn snapshot(&self) -> SystemSnapshot;
}

/// Provider returning a fixed snapshot supplied by the host.
#[derive(Clone, Debug, Default)]
pub struct StaticSystemInfo {
    snapshot: SystemSnapshot,
}

impl StaticSystemInfo {
    /// Wrap a host-gathered snapshot.
    pub fn new(snapshot: SystemSnapshot) -> Self {
        Self { snapshot }
    }
}

impl SystemInfoProvider for StaticSystemInfo {
    fn snapshot(&self) -> SystemSnapshot {
        self.snapshot.clone()
    }
}
