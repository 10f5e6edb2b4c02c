use sysinfo::System;

pub fn format_ram_mb(ram_mb: u64) -> String {
    if ram_mb < 1024 { format!("{} MB", ram_mb) } else { format!("{:.1} GB", ram_mb as f64 / 1024.0) }
}

/// Host facts logged at startup.
#[derive(Debug, Clone)]
pub struct HostInfo {
    pub os: String,
    pub cpu: String,
    /// 0 when sysinfo could not read it
    pub ram_mb: u64,
}

impl HostInfo {
    pub fn collect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        let os = format!(
            "{} {}",
            System::name().unwrap_or_else(|| "Unknown OS".into()),
            System::os_version().unwrap_or_default()
        );
        let cpu = sys.cpus().first().map(|c| c.brand().to_string()).unwrap_or_else(|| "Unknown CPU".into());
        Self { os: os.trim().to_string(), cpu, ram_mb: sys.total_memory() / (1024 * 1024) }
    }

    pub fn ram(&self) -> String {
        format_ram_mb(self.ram_mb)
    }
}
