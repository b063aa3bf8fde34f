//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 防饥饿老化与周期统计
//!
//! 每轮调度前检查所有 Runnable 进程，等待超过阈值的提升一级队列
//! (BJF -> Lottery -> RoundRobin) 并清零等待周期。
//!
//! 注意：轮转队列严格抢占，老化只会把进程推向轮转队列，
//! 长时间运行后所有进程最终都会汇聚到轮转队列。

use crate::arch::Arch;
use crate::process::table::ProcTable;
use crate::process::task::{ProcState, Queue};

/// 执行一轮老化，返回被提升的进程数
pub fn age<A: Arch>(table: &mut ProcTable<A>, threshold: u64) -> usize {
    let mut promoted = 0;
    for p in table.procs.iter_mut() {
        if p.state != ProcState::Runnable || p.waited_cycles <= threshold {
            continue;
        }
        p.waited_cycles = 0;
        if p.queue == Queue::RoundRobin {
            continue;
        }
        p.queue = p.queue.promoted();
        promoted += 1;
        #[cfg(feature = "debug_log")]
        log::trace!("sched: aging pid {} -> {:?}", p.pid, p.queue);
    }
    promoted
}

/// 一次调度返回后的周期统计
///
/// 其余 Runnable 进程累加等待周期，刚运行的进程清零等待周期并累加执行周期。
pub fn account<A: Arch>(table: &mut ProcTable<A>, slot: usize, elapsed: u64) {
    for (i, p) in table.procs.iter_mut().enumerate() {
        if i == slot {
            p.waited_cycles = 0;
            p.executed_cycles += elapsed;
        } else if p.state == ProcState::Runnable {
            p.waited_cycles += elapsed;
        }
    }
}
