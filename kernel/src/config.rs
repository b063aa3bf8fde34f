//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 内核配置
//!
//! 常量由 build.rs 根据仓库根目录的 Kernel.toml 生成。

include!(concat!(env!("OUT_DIR"), "/config.rs"));
