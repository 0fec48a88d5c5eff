use crate::models::Device;
use serde::Serialize;
use std::cmp::Reverse;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DeviceFilter {
    #[default]
    All,
    Online,
    Offline,
    /// Devices the scanner rated `danger`
    Vulnerable,
}

impl DeviceFilter {
    pub fn matches(&self, device: &Device) -> bool {
        match self {
            DeviceFilter::All => true,
            DeviceFilter::Online => device.is_online(),
            DeviceFilter::Offline => !device.is_online(),
            DeviceFilter::Vulnerable => device.is_vulnerable(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DeviceSort {
    #[default]
    Name,
    Ip,
    /// Riskiest first
    Severity,
}

/// Filter then sort a scan result
pub fn select_devices(devices: &[Device], filter: DeviceFilter, sort: DeviceSort) -> Vec<Device> {
    let mut selected: Vec<Device> = devices.iter().filter(|d| filter.matches(d)).cloned().collect();
    match sort {
        DeviceSort::Name => selected.sort_by_key(|d| d.display_name().to_lowercase()),
        DeviceSort::Ip => selected.sort_by_key(|d| ip_sort_key(&d.ip)),
        DeviceSort::Severity => selected.sort_by_key(|d| Reverse(d.risk_rank())),
    }
    selected
}

// Numeric ordering for dotted quads; anything unparseable sorts last
fn ip_sort_key(ip: &str) -> (u8, [u8; 4], String) {
    match ip.parse::<std::net::Ipv4Addr>() {
        Ok(addr) => (0, addr.octets(), String::new()),
        Err(_) => (1, [0; 4], ip.to_string()),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceStats {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    pub vulnerable: usize,
}

pub fn device_stats(devices: &[Device]) -> DeviceStats {
    let online = devices.iter().filter(|d| d.is_online()).count();
    DeviceStats {
        total: devices.len(),
        online,
        offline: devices.len() - online,
        vulnerable: devices.iter().filter(|d| d.is_vulnerable()).count(),
    }
}
