//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 进程控制块 (Process Control Block)
//!
//! 关键设计要点：
//! 1. 进程表是固定容量的槽位数组，父进程用槽位下标引用
//! 2. 调度元数据（队列、彩票、BJF 系数、周期统计）全部放在 PCB 中
//! 3. 所有字段都由进程表锁保护

use alloc::string::String;
use core::fmt;

use crate::arch::Arch;
use crate::config::{
    DEFAULT_ARRIVAL_TIME_RATIO, DEFAULT_EXECUTED_CYCLES_RATIO, DEFAULT_PRIORITY_RATIO,
    DEFAULT_TICKETS, PROC_NAME_LEN,
};
use crate::errno::Errno;

/// 进程标识符
pub type Pid = u32;

/// 进程状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum ProcState {
    /// 空闲槽位
    #[default]
    Unused = 0,

    /// 已分配槽位，尚未初始化完成，不参与调度
    Embryo = 1,

    /// 在某个通道上睡眠
    Sleeping = 2,

    /// 可运行，等待被调度
    Runnable = 3,

    /// 正在某个 CPU 上运行
    Running = 4,

    /// 已退出，等待父进程回收
    Zombie = 5,
}

impl ProcState {
    pub const fn as_str(self) -> &'static str {
        match self {
            ProcState::Unused => "UNUSED",
            ProcState::Embryo => "EMBRYO",
            ProcState::Sleeping => "SLEEPING",
            ProcState::Runnable => "RUNNABLE",
            ProcState::Running => "RUNNING",
            ProcState::Zombie => "ZOMBIE",
        }
    }
}

/// 调度队列
///
/// 数值即系统调用使用的队列号。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum Queue {
    /// 轮转队列，优先级最高
    RoundRobin = 1,

    /// 彩票队列，新进程默认所在
    #[default]
    Lottery = 2,

    /// BJF 队列，优先级最低
    Bjf = 3,
}

impl Queue {
    /// 老化时提升一级（BJF -> Lottery -> RoundRobin）
    pub const fn promoted(self) -> Queue {
        match self {
            Queue::Bjf => Queue::Lottery,
            Queue::Lottery | Queue::RoundRobin => Queue::RoundRobin,
        }
    }
}

impl TryFrom<i32> for Queue {
    type Error = Errno;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Queue::RoundRobin),
            2 => Ok(Queue::Lottery),
            3 => Ok(Queue::Bjf),
            _ => Err(Errno::InvalidArgument),
        }
    }
}

/// BJF 排名系数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BjfParams {
    pub priority_ratio: i32,
    pub arrival_time_ratio: i32,
    pub executed_cycles_ratio: i32,
}

impl BjfParams {
    pub const fn new(priority_ratio: i32, arrival_time_ratio: i32, executed_cycles_ratio: i32) -> Self {
        Self {
            priority_ratio,
            arrival_time_ratio,
            executed_cycles_ratio,
        }
    }
}

impl Default for BjfParams {
    fn default() -> Self {
        Self::new(
            DEFAULT_PRIORITY_RATIO,
            DEFAULT_ARRIVAL_TIME_RATIO,
            DEFAULT_EXECUTED_CYCLES_RATIO,
        )
    }
}

/// 睡眠通道
///
/// 睡眠者与唤醒者通过通道匹配。不同来源的通道互不冲突。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// 等待子进程退出，值为等待者自己的槽位
    Proc(usize),
    /// 时钟滴答
    Ticks,
    /// 内核信号量
    Semaphore(usize),
    /// 条件变量（用户地址）
    CondVar(usize),
}

/// 进程控制块
pub struct Proc<A: Arch> {
    pub(crate) pid: Pid,
    pub(crate) state: ProcState,
    /// 父进程槽位
    pub(crate) parent: Option<usize>,
    pub(crate) name: String,
    pub(crate) queue: Queue,
    pub(crate) tickets: i32,
    pub(crate) bjf: BjfParams,
    /// 创建时的滴答数，之后不再改变
    pub(crate) arrival_time: u64,
    /// 实际运行的滴答累计
    pub(crate) executed_cycles: u64,
    /// 可运行但未被选中的滴答累计，被调度时清零
    pub(crate) waited_cycles: u64,
    pub(crate) killed: bool,
    pub(crate) channel: Option<Channel>,
    /// 系统调用计数（跟踪开启时）
    pub(crate) syscall_counts: [u32; crate::syscall::NR_SYSCALLS],
    pub(crate) context: Option<A::Context>,
    pub(crate) space: Option<A::AddressSpace>,
}

impl<A: Arch> Proc<A> {
    pub(crate) fn new() -> Self {
        Self {
            pid: 0,
            state: ProcState::Unused,
            parent: None,
            name: String::new(),
            queue: Queue::default(),
            tickets: DEFAULT_TICKETS,
            bjf: BjfParams::default(),
            arrival_time: 0,
            executed_cycles: 0,
            waited_cycles: 0,
            killed: false,
            channel: None,
            syscall_counts: [0; crate::syscall::NR_SYSCALLS],
            context: None,
            space: None,
        }
    }

    /// 重置调度元数据（分配槽位时调用）
    pub(crate) fn reset_sched(&mut self, now: u64) {
        self.queue = Queue::Lottery;
        self.tickets = DEFAULT_TICKETS;
        self.bjf = BjfParams::default();
        self.arrival_time = now;
        self.executed_cycles = 0;
        self.waited_cycles = 0;
        self.syscall_counts = [0; crate::syscall::NR_SYSCALLS];
    }

    /// 设置进程名，超长部分截断
    pub(crate) fn set_name(&mut self, name: &str) {
        self.name.clear();
        for c in name.chars() {
            if self.name.len() + c.len_utf8() > PROC_NAME_LEN {
                break;
            }
            self.name.push(c);
        }
    }

    /// BJF 排名，越小越优先
    ///
    /// rank = priority_ratio / tickets
    ///      + arrival_time * arrival_time_ratio
    ///      + executed_cycles * executed_cycles_ratio
    pub fn rank(&self) -> i64 {
        let priority_share = if self.tickets != 0 {
            self.bjf.priority_ratio as i64 / self.tickets as i64
        } else {
            0
        };
        // 极端系数下饱和而不是溢出
        let arrival = i64::try_from(self.arrival_time).unwrap_or(i64::MAX);
        let executed = i64::try_from(self.executed_cycles).unwrap_or(i64::MAX);
        let arrival_share = arrival.saturating_mul(self.bjf.arrival_time_ratio as i64);
        let executed_share = executed.saturating_mul(self.bjf.executed_cycles_ratio as i64);
        priority_share
            .saturating_add(arrival_share)
            .saturating_add(executed_share)
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline]
    pub fn state(&self) -> ProcState {
        self.state
    }

    #[inline]
    pub fn queue(&self) -> Queue {
        self.queue
    }

    #[inline]
    pub fn is_runnable_in(&self, queue: Queue) -> bool {
        self.state == ProcState::Runnable && self.queue == queue
    }
}

impl<A: Arch> fmt::Debug for Proc<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proc")
            .field("pid", &self.pid)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("parent", &self.parent)
            .field("queue", &self.queue)
            .field("tickets", &self.tickets)
            .field("waited_cycles", &self.waited_cycles)
            .field("killed", &self.killed)
            .finish()
    }
}
