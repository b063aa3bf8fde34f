//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 调度器模块
//!
//! 三级队列调度：
//! - 轮转 (RoundRobin): 优先级最高，严格抢占下级队列
//! - 彩票 (Lottery): 按彩票数比例随机选择
//! - BJF: 按排名选择，排名越小越优先
//!
//! 调度入口: scheduler() -> schedule_once() -> Arch::switch()
//! 进程让出入口: yield_now() / sleep() / exit() -> sched()

pub mod aging;
pub mod policy;
pub mod sched;

pub use policy::{bjf, lottery, pick_next, round_robin};
