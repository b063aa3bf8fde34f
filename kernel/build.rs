//! Trine 内核构建脚本
//!
//! 这个脚本在编译前运行，负责：
//! 1. 解析仓库根目录的 Kernel.toml 配置文件
//! 2. 生成 config.rs 配置代码（写入 OUT_DIR）

use std::env;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KernelToml {
    general: General,
    scheduler: Scheduler,
    sync: SyncConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct General {
    name: String,
    version: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Scheduler {
    nproc: usize,
    ncpu: usize,
    default_tickets: i32,
    priority_ratio: i32,
    arrival_time_ratio: i32,
    executed_cycles_ratio: i32,
    aging_threshold: u64,
    shell_name: String,
    proc_name_len: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SyncConfig {
    nsemaphore: usize,
}

impl Default for General {
    fn default() -> Self {
        Self {
            name: "Trine".to_string(),
            version: env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.1.0".to_string()),
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            nproc: 64,
            ncpu: 8,
            default_tickets: 10,
            priority_ratio: 1,
            arrival_time_ratio: 1,
            executed_cycles_ratio: 1,
            aging_threshold: 10_000,
            shell_name: "sh".to_string(),
            proc_name_len: 16,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { nsemaphore: 16 }
    }
}

fn load_config(manifest_dir: &PathBuf) -> KernelToml {
    let path = manifest_dir.join("../Kernel.toml");
    println!("cargo:rerun-if-changed={}", path.display());

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => {
            println!("cargo:warning=Kernel.toml not found, using built-in defaults");
            return KernelToml::default();
        }
    };

    match toml::from_str::<KernelToml>(&content) {
        Ok(config) => config,
        Err(e) => {
            println!("cargo:warning=Kernel.toml parse error ({}), using built-in defaults", e);
            KernelToml::default()
        }
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let config = load_config(&manifest_dir);
    let sched = &config.scheduler;

    // 容量类参数不能为 0，否则调度器无法启动
    let nproc = sched.nproc.max(1);
    let ncpu = sched.ncpu.max(1);
    let nsemaphore = config.sync.nsemaphore.max(1);
    let default_tickets = sched.default_tickets.max(1);


    let generated = format!(
        r#"// Trine 内核配置（自动生成）
//
// 此文件由 build.rs 根据 Kernel.toml 自动生成，请勿手动修改

// ============================================================
// 基本信息
// ============================================================

/// 内核名称
pub const KERNEL_NAME: &str = "{name}";

/// 内核版本
pub const KERNEL_VERSION: &str = "{version}";

// ============================================================
// 调度器配置
// ============================================================

/// 进程表容量
pub const NPROC: usize = {nproc};

/// 最大 CPU 数量
pub const NCPU: usize = {ncpu};

/// 新进程默认彩票数
pub const DEFAULT_TICKETS: i32 = {tickets};

/// BJF 优先级系数默认值
pub const DEFAULT_PRIORITY_RATIO: i32 = {pratio};

/// BJF 到达时间系数默认值
pub const DEFAULT_ARRIVAL_TIME_RATIO: i32 = {aratio};

/// BJF 执行周期系数默认值
pub const DEFAULT_EXECUTED_CYCLES_RATIO: i32 = {eratio};

/// 老化阈值（滴答数）
pub const AGING_THRESHOLD: u64 = {aging};

/// 交互式 shell 的进程名
pub const SHELL_NAME: &str = "{shell}";

/// 进程名最大长度
pub const PROC_NAME_LEN: usize = {name_len};

// ============================================================
// 同步原语配置
// ============================================================

/// 内核信号量数量
pub const NSEMAPHORE: usize = {nsem};
"#,
        name = config.general.name,
        version = config.general.version,
        nproc = nproc,
        ncpu = ncpu,
        tickets = default_tickets,
        pratio = sched.priority_ratio,
        aratio = sched.arrival_time_ratio,
        eratio = sched.executed_cycles_ratio,
        aging = sched.aging_threshold,
        shell = sched.shell_name,
        name_len = sched.proc_name_len.max(1),
        nsem = nsemaphore,
    );

    let config_file = out_dir.join("config.rs");

    // 只有内容变化时才写入，避免每次编译都更新文件时间戳
    let existing = fs::read_to_string(&config_file).unwrap_or_default();
    if existing != generated {
        fs::write(&config_file, &generated).expect("写入配置文件失败");
    }
}
