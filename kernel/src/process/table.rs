//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 进程表
//!
//! 固定容量的槽位数组，对应 xv6 的 ptable。
//! 所有方法都要求调用者持有进程表锁（即通过 `Kernel::table` 的守卫访问）。

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::arch::Arch;
use crate::errno::Errno;

use super::task::{BjfParams, Channel, Pid, Proc, ProcState, Queue};

/// 回收槽位后交还给架构层的资源
pub struct Released<A: Arch> {
    pub context: Option<A::Context>,
    pub space: Option<A::AddressSpace>,
}

pub struct ProcTable<A: Arch> {
    pub(crate) procs: Vec<Proc<A>>,
    next_pid: Pid,
    /// 轮转游标：下一次扫描的起始槽位
    pub(crate) rr_cursor: usize,
    /// init 进程槽位
    pub(crate) init: Option<usize>,
}

impl<A: Arch> ProcTable<A> {
    pub fn new(nproc: usize) -> Self {
        let mut procs = Vec::with_capacity(nproc);
        procs.resize_with(nproc, Proc::new);
        Self {
            procs,
            next_pid: 1,
            rr_cursor: 0,
            init: None,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.procs.len()
    }

    #[inline]
    pub fn get(&self, slot: usize) -> Option<&Proc<A>> {
        self.procs.get(slot)
    }

    #[inline]
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Proc<A>> {
        self.procs.get_mut(slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Proc<A>> {
        self.procs.iter()
    }

    /// 活动进程数（非 Unused）
    pub fn live(&self) -> usize {
        self.procs
            .iter()
            .filter(|p| p.state != ProcState::Unused)
            .count()
    }

    /// 分配槽位
    ///
    /// 对应 xv6 的 allocproc：找到第一个 Unused 槽位，分配新 pid，
    /// 状态置为 Embryo，调度元数据恢复默认值。表满返回 None。
    pub fn allocate(&mut self, now: u64) -> Option<usize> {
        let slot = self
            .procs
            .iter()
            .position(|p| p.state == ProcState::Unused)?;

        let pid = self.next_pid;
        self.next_pid += 1;

        let p = &mut self.procs[slot];
        p.pid = pid;
        p.state = ProcState::Embryo;
        p.parent = None;
        p.killed = false;
        p.channel = None;
        p.reset_sched(now);

        Some(slot)
    }

    /// 初始化失败的 Embryo 槽位直接归还
    pub fn abort_embryo(&mut self, slot: usize) -> Released<A> {
        let p = &mut self.procs[slot];
        debug_assert_eq!(p.state, ProcState::Embryo);
        Self::clear(p)
    }

    /// 回收僵尸进程的槽位
    ///
    /// 只有 Zombie 可以回收，其余状态返回 None 且不做任何修改。
    pub fn release(&mut self, slot: usize) -> Option<Released<A>> {
        let p = self.procs.get_mut(slot)?;
        if p.state != ProcState::Zombie {
            return None;
        }
        Some(Self::clear(p))
    }

    fn clear(p: &mut Proc<A>) -> Released<A> {
        p.pid = 0;
        p.parent = None;
        p.name = String::new();
        p.killed = false;
        p.channel = None;
        p.state = ProcState::Unused;
        Released {
            context: p.context.take(),
            space: p.space.take(),
        }
    }

    /// 按 pid 查找槽位（跳过 Unused）
    pub fn find(&self, pid: Pid) -> Option<usize> {
        self.procs
            .iter()
            .position(|p| p.state != ProcState::Unused && p.pid == pid)
    }

    /// 唤醒所有睡眠在 `chan` 上的进程
    ///
    /// 对应 xv6 的 wakeup1，调用者持有表锁
    pub fn wakeup(&mut self, chan: Channel) -> usize {
        let mut woken = 0;
        for p in self.procs.iter_mut() {
            if p.state == ProcState::Sleeping && p.channel == Some(chan) {
                p.state = ProcState::Runnable;
                woken += 1;
            }
        }
        woken
    }

    /// 把 `slot` 的子进程过继给 init
    ///
    /// 返回是否有已经是僵尸的子进程（此时需要唤醒 init）。
    pub fn reparent(&mut self, slot: usize) -> bool {
        let init = self.init;
        let mut zombie = false;
        for p in self.procs.iter_mut() {
            if p.state != ProcState::Unused && p.parent == Some(slot) {
                p.parent = init;
                if p.state == ProcState::Zombie {
                    zombie = true;
                }
            }
        }
        zombie
    }

    fn children_slots(&self, slot: usize) -> impl Iterator<Item = usize> + '_ {
        self.procs
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.state != ProcState::Unused && p.parent == Some(slot))
            .map(|(i, _)| i)
    }

    /// 子进程 pid 列表（按槽位顺序）
    pub fn children(&self, pid: Pid) -> Vec<Pid> {
        match self.find(pid) {
            Some(slot) => self.children_slots(slot).map(|i| self.procs[i].pid).collect(),
            None => Vec::new(),
        }
    }

    /// 孙进程 pid 列表
    pub fn grandchildren(&self, pid: Pid) -> Vec<Pid> {
        let Some(slot) = self.find(pid) else {
            return Vec::new();
        };
        self.children_slots(slot)
            .flat_map(|child| self.children_slots(child))
            .map(|i| self.procs[i].pid)
            .collect()
    }

    fn find_mut(&mut self, pid: Pid) -> Result<&mut Proc<A>, Errno> {
        match self.find(pid) {
            Some(slot) => Ok(&mut self.procs[slot]),
            None => Err(Errno::NoSuchProcess),
        }
    }

    pub fn set_queue(&mut self, pid: Pid, queue: Queue) -> Result<(), Errno> {
        self.find_mut(pid)?.queue = queue;
        Ok(())
    }

    /// 彩票数必须为正
    pub fn set_tickets(&mut self, pid: Pid, tickets: i32) -> Result<(), Errno> {
        if tickets <= 0 {
            return Err(Errno::InvalidArgument);
        }
        self.find_mut(pid)?.tickets = tickets;
        Ok(())
    }

    pub fn set_bjf_params(&mut self, pid: Pid, params: BjfParams) -> Result<(), Errno> {
        self.find_mut(pid)?.bjf = params;
        Ok(())
    }

    /// 修改所有活动进程的 BJF 系数
    pub fn set_bjf_params_all(&mut self, params: BjfParams) -> usize {
        let mut n = 0;
        for p in self.procs.iter_mut().filter(|p| p.state != ProcState::Unused) {
            p.bjf = params;
            n += 1;
        }
        n
    }

    /// 活动进程的快照
    pub fn snapshot(&self) -> Vec<ProcInfo> {
        self.procs
            .iter()
            .filter(|p| p.state != ProcState::Unused)
            .map(ProcInfo::from_proc)
            .collect()
    }
}

/// 进程信息（print_info 的一行）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcInfo {
    pub name: String,
    pub pid: Pid,
    pub state: ProcState,
    pub queue: Queue,
    pub tickets: i32,
    pub bjf: BjfParams,
    pub rank: i64,
    pub executed_cycles: u64,
    pub waited_cycles: u64,
}

const MIN_GAP: usize = 8;

/// (标题, 列宽)
const COLUMNS: [(&str, usize); 10] = [
    ("name", 10 + MIN_GAP),
    ("pid", 3 + MIN_GAP),
    ("state", 8 + MIN_GAP),
    ("queue_num", 9 + MIN_GAP),
    ("ticket", 6 + MIN_GAP),
    ("priority_ratio", 10 + MIN_GAP),
    ("arrival_time_ratio", 12 + MIN_GAP),
    ("executed_cycles_ratio", 15 + MIN_GAP),
    ("rank", 5 + MIN_GAP),
    ("cycles", 6 + MIN_GAP),
];

impl ProcInfo {
    fn from_proc<A: Arch>(p: &Proc<A>) -> Self {
        Self {
            name: p.name.clone(),
            pid: p.pid,
            state: p.state,
            queue: p.queue,
            tickets: p.tickets,
            bjf: p.bjf,
            rank: p.rank(),
            executed_cycles: p.executed_cycles,
            waited_cycles: p.waited_cycles,
        }
    }

    /// 表头
    pub fn header() -> InfoHeader {
        InfoHeader
    }
}

/// print_info 表头，含分隔线
pub struct InfoHeader;

impl fmt::Display for InfoHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut total = 0;
        for (title, width) in COLUMNS {
            write!(f, "{:<width$}", title, width = width)?;
            total += width;
        }
        writeln!(f)?;
        for _ in 0..total {
            f.write_str("-")?;
        }
        Ok(())
    }
}

impl fmt::Display for ProcInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let col = |i: usize| COLUMNS[i].1;
        write!(f, "{:<w$}", self.name, w = col(0))?;
        write!(f, "{:<w$}", self.pid, w = col(1))?;
        write!(f, "{:<w$}", self.state.as_str(), w = col(2))?;
        write!(f, "{:<w$}", self.queue as i32, w = col(3))?;
        write!(f, "{:<w$}", self.tickets, w = col(4))?;
        write!(f, "{:<w$}", self.bjf.priority_ratio, w = col(5))?;
        write!(f, "{:<w$}", self.bjf.arrival_time_ratio, w = col(6))?;
        write!(f, "{:<w$}", self.bjf.executed_cycles_ratio, w = col(7))?;
        write!(f, "{:<w$}", self.rank, w = col(8))?;
        write!(f, "{}", self.executed_cycles)
    }
}
