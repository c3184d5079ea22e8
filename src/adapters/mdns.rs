//! mDNS service advertisement adapter.
//!
//! Advertises `<hostname>.local` and an `_http._tcp` service on the
//! control port, so the page is reachable as
//! `http://stb_fan_control.local:8080/`.  Uses the ESP-IDF mDNS
//! component on target and is a no-op on simulation targets.
//!
//! Start after the station has an IP; stop before tearing WiFi down.

use log::info;

const SERVICE_TYPE: &str = "_http";
const SERVICE_PROTO: &str = "_tcp";
const INSTANCE_NAME: &str = "Stb Fan Control";

pub struct MdnsAdapter {
    hostname: heapless::String<32>,
    port: u16,
    active: bool,
}

impl MdnsAdapter {
    pub fn new(hostname: &str, port: u16) -> Self {
        let mut name = heapless::String::new();
        for c in hostname.chars() {
            if name.push(c).is_err() {
                break;
            }
        }
        Self {
            hostname: name,
            port,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn start(&mut self) {
        if self.active {
            return;
        }
        if self.platform_start() {
            self.active = true;
            info!(
                "mDNS: advertising {}.local {}.{}:{}",
                self.hostname, SERVICE_TYPE, SERVICE_PROTO, self.port
            );
        }
    }

    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.platform_stop();
        self.active = false;
        info!("mDNS: stopped");
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&self) -> bool {
        use esp_idf_svc::sys::{
            ESP_OK, mdns_hostname_set, mdns_init, mdns_instance_name_set, mdns_service_add,
        };

        let mut host = [0u8; 33];
        let hb = self.hostname.as_bytes();
        host[..hb.len()].copy_from_slice(hb);
        let mut instance = [0u8; 32];
        instance[..INSTANCE_NAME.len()].copy_from_slice(INSTANCE_NAME.as_bytes());

        // SAFETY: every pointer handed over is a NUL-terminated buffer that
        // outlives the call; the mDNS component copies what it keeps.
        unsafe {
            let ret = mdns_init();
            if ret != ESP_OK as i32 {
                log::error!("mDNS: mdns_init failed ({})", ret);
                return false;
            }
            mdns_hostname_set(host.as_ptr().cast());
            mdns_instance_name_set(instance.as_ptr().cast());
            let ret = mdns_service_add(
                instance.as_ptr().cast(),
                b"_http\0".as_ptr().cast(),
                b"_tcp\0".as_ptr().cast(),
                self.port,
                core::ptr::null_mut(),
                0,
            );
            if ret != ESP_OK as i32 {
                log::error!("mDNS: service add failed ({})", ret);
                esp_idf_svc::sys::mdns_free();
                return false;
            }
        }
        true
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&self) -> bool {
        info!("mDNS(sim): registered {}.local as {}", self.hostname, INSTANCE_NAME);
        true
    }

    #[cfg(target_os = "espidf")]
    fn platform_stop(&self) {
        // SAFETY: only called after a successful mdns_init.
        unsafe {
            esp_idf_svc::sys::mdns_free();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_stop(&self) {
        info!("mDNS(sim): unregistered");
    }
}
