//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 调度策略选择器
//!
//! 三个选择器都只读取 Runnable 且属于自己队列的进程，
//! 调用者持有进程表锁。

use crate::arch::Arch;
use crate::process::table::ProcTable;
use crate::process::task::Queue;

/// 轮转选择
///
/// 从游标位置开始环形扫描，选中后游标移到下一个槽位。
pub fn round_robin<A: Arch>(table: &mut ProcTable<A>) -> Option<usize> {
    let n = table.capacity();
    if n == 0 {
        return None;
    }
    let start = table.rr_cursor % n;
    let slot = (0..n)
        .map(|i| (start + i) % n)
        .find(|&i| table.procs[i].is_runnable_in(Queue::RoundRobin))?;
    table.rr_cursor = (slot + 1) % n;
    Some(slot)
}

/// 彩票选择
///
/// 对 Runnable 彩票进程的彩票数求和，取 `draw % total` 为中奖号，
/// 顺序累加直到累计值超过中奖号。总数为 0 时不选择。
pub fn lottery<A: Arch>(table: &ProcTable<A>, draw: u64) -> Option<usize> {
    let total: u64 = table
        .iter()
        .filter(|p| p.is_runnable_in(Queue::Lottery))
        .map(|p| p.tickets.max(0) as u64)
        .sum();
    if total == 0 {
        return None;
    }

    let winner = draw % total;
    let mut acc = 0u64;
    for (slot, p) in table.iter().enumerate() {
        if !p.is_runnable_in(Queue::Lottery) {
            continue;
        }
        acc += p.tickets.max(0) as u64;
        if acc > winner {
            return Some(slot);
        }
    }
    None
}

/// BJF 选择
///
/// 排名最小者胜出，相同排名取槽位靠前者。
pub fn bjf<A: Arch>(table: &ProcTable<A>) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (slot, p) in table.iter().enumerate() {
        if !p.is_runnable_in(Queue::Bjf) {
            continue;
        }
        let rank = p.rank();
        match best {
            Some((_, min)) if rank >= min => {}
            _ => best = Some((slot, rank)),
        }
    }
    best.map(|(slot, _)| slot)
}

/// 按队列优先级选择下一个进程：轮转 -> 彩票 -> BJF
pub fn pick_next<A: Arch>(table: &mut ProcTable<A>, draw: u64) -> Option<usize> {
    round_robin(table)
        .or_else(|| lottery(table, draw))
        .or_else(|| bjf(table))
}
