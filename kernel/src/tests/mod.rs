//! 单元测试模块
//!
//! 每个子系统一个文件，在宿主机上用标准测试框架运行：
//! ```bash
//! cargo test --package trine
//! ```
//!
//! 需要真实调度的测试通过 `sim` 模拟平台运行，
//! 只涉及进程表的测试直接构造 `ProcTable`。


mod boundary;
mod semaphore;
mod sleep_wakeup;
mod user_spinlock;

use crate::process::table::ProcTable;
use crate::process::task::{ProcState, Queue};

use sim::Sim;

/// 在表中放入一个 Runnable 进程，返回槽位
pub fn runnable(table: &mut ProcTable<Sim>, queue: Queue, tickets: i32) -> usize {
    let slot = table.allocate(0).unwrap();
    let p = &mut table.procs[slot];
    p.state = ProcState::Runnable;
    p.queue = queue;
    p.tickets = tickets;
    slot
}
