use crate::config::Config;
use serde::Serialize;
use sysinfo::System;

#[derive(Serialize, Debug)]
pub struct SystemInfo {
    pub version: String,
    pub platform: String,
    pub arch: String,
    pub cpus: usize,
    pub cpu_model: String,
    pub memory_total_gb: f64,
    pub memory_free_gb: f64,
}

pub fn get_system_info() -> SystemInfo {
    let mut system = System::new();
    system.refresh_all();

    let cpu_model = system
        .cpus()
        .first()
        .map(|cpu| cpu.brand().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    SystemInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        platform: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        cpus: system.cpus().len(),
        cpu_model,
        memory_total_gb: system.total_memory() as f64 / 1024.0 / 1024.0 / 1024.0,
        memory_free_gb: system.free_memory() as f64 / 1024.0 / 1024.0 / 1024.0,
    }
}

fn describe(value: &Option<String>) -> &str {
    if value.is_some() {
        "set"
    } else {
        "MISSING"
    }
}

pub fn print_startup_info(config: &Config) {
    let sys_info = get_system_info();
    let tl = &config.twelvelabs;

    println!("{}", "=".repeat(60));
    println!("🚀 Clip Catalog v{} starting...", sys_info.version);
    println!("{}", "=".repeat(60));
    println!("📊 System Information:");
    println!("  Platform: {} ({})", sys_info.platform, sys_info.arch);
    println!("  CPUs: {} ({})", sys_info.cpus, sys_info.cpu_model);
    println!(
        "  Memory: {:.2} GB total, {:.2} GB free",
        sys_info.memory_total_gb, sys_info.memory_free_gb
    );
    println!("🎬 Twelve Labs:");
    println!("  Base URL: {}", tl.base_url);
    println!("  API key: {}", describe(&tl.api_key));
    println!("  Marengo index: {}", tl.marengo_index_id.as_deref().unwrap_or("MISSING"));
    println!("  Pegasus index: {}", tl.pegasus_index_id.as_deref().unwrap_or("MISSING"));
    println!("  Page limit: {}", tl.page_limit);
    println!(
        "  Storage fallback: {}",
        config.storage.base_url.as_deref().unwrap_or("disabled")
    );
    println!("{}", "=".repeat(60));
}
