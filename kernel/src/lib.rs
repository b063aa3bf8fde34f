//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! Trine - 三级队列进程调度核心
//!
//! 提供固定容量进程表、三种调度策略（轮转 / 彩票 / BJF）、
//! 防饥饿老化，以及建立在 sleep/wakeup 之上的阻塞同步原语。
//!
//! 硬件相关部分（上下文切换、地址空间）通过 [`arch::Arch`] 注入。

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod arch;
pub mod config;
pub mod errno;
pub mod kernel;
pub mod process;
pub mod sched;
pub mod sync;
pub mod syscall;

#[cfg(test)]
mod tests;

pub use kernel::Kernel;
