//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 进程管理模块
//!
//! - `task`: 进程控制块、状态、队列与睡眠通道
//! - `table`: 固定容量进程表 (ptable)
//! - `fork`: 进程创建 (user_init / fork / fork_ret)
//! - `wait`: 进程退出、回收与终止 (exit / wait / kill)

pub mod fork;
pub mod table;
pub mod task;
pub mod wait;

use alloc::vec::Vec;

use crate::arch::Arch;
use crate::errno::Errno;
use crate::kernel::Kernel;

pub use table::{ProcInfo, ProcTable};
pub use task::{BjfParams, Channel, Pid, ProcState, Queue};

/// BJF 系数的作用范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// 单个进程
    Pid(Pid),
    /// 所有活动进程
    All,
}

impl<A: Arch> Kernel<A> {
    /// 当前进程 pid
    pub fn getpid(&self) -> Option<Pid> {
        let slot = self.current_slot()?;
        Some(self.lock_table().procs[slot].pid)
    }

    /// 修改进程所在队列
    pub fn set_queue(&self, pid: Pid, queue: Queue) -> Result<(), Errno> {
        let result = self.lock_table().set_queue(pid, queue);
        match result {
            Ok(()) => log::debug!("sched: pid {} -> queue {:?}", pid, queue),
            Err(e) => log::warn!("sched: set_queue({}) rejected: {}", pid, e),
        }
        result
    }

    /// 修改进程彩票数
    pub fn set_tickets(&self, pid: Pid, tickets: i32) -> Result<(), Errno> {
        let result = self.lock_table().set_tickets(pid, tickets);
        if let Err(e) = result {
            log::warn!("sched: set_tickets({}, {}) rejected: {}", pid, tickets, e);
        }
        result
    }

    /// 修改 BJF 系数
    ///
    /// `Target::All` 作用于所有活动进程，返回值为修改的进程数。
    pub fn set_bjf_params(&self, target: Target, params: BjfParams) -> Result<usize, Errno> {
        let mut table = self.lock_table();
        match target {
            Target::Pid(pid) => table.set_bjf_params(pid, params).map(|()| 1),
            Target::All => Ok(table.set_bjf_params_all(params)),
        }
    }

    /// 子进程 pid 列表
    pub fn children(&self, pid: Pid) -> Vec<Pid> {
        self.lock_table().children(pid)
    }

    /// 孙进程 pid 列表
    pub fn grandchildren(&self, pid: Pid) -> Vec<Pid> {
        self.lock_table().grandchildren(pid)
    }

    /// 所有活动进程的调度信息
    pub fn proc_info(&self) -> Vec<ProcInfo> {
        self.lock_table().snapshot()
    }

    /// 打印进程表（通过 log 输出）
    pub fn print_info(&self) {
        let infos = self.proc_info();
        log::info!("{}", ProcInfo::header());
        for info in &infos {
            log::info!("{}", info);
        }
    }
}
