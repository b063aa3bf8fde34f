//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 系统调用分发
//!
//! 陷入处理代码取出系统调用号和参数后调用 [`Kernel::syscall`]。
//! 内核接口返回 `Result<_, Errno>`，这里统一折算为用户态约定的 -1。
//! 返回用户态前，被 kill 的进程在这里退出。

use alloc::vec::Vec;
use core::sync::atomic::Ordering;

use crate::arch::Arch;
use crate::errno::Errno;
use crate::kernel::Kernel;
use crate::process::task::{BjfParams, Channel, Pid, ProcState, Queue};
use crate::process::Target;

/// 系统调用计数数组的长度（最大调用号 + 1）
pub const NR_SYSCALLS: usize = 40;

/// 系统调用号
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sysno {
    Fork = 1,
    Exit = 2,
    Wait = 3,
    Kill = 6,
    Getpid = 11,
    Sleep = 13,
    Uptime = 14,
    TraceSyscalls = 22,
    GetChildren = 23,
    GetGrandchildren = 24,
    SetProcQueue = 25,
    SetTickets = 26,
    SetBjfParamsInProc = 27,
    SetBjfParamsInSystem = 28,
    PrintInfo = 29,
    SemaphoreInitialize = 30,
    SemaphoreAcquire = 31,
    SemaphoreRelease = 32,
    CvWait = 33,
    CvSignal = 34,
    IncCounter = 35,
    DecCounter = 36,
    ResetCounter = 37,
    GetCounter = 38,
    PrintTrace = 39,
}

impl Sysno {
    pub const fn name(self) -> &'static str {
        match self {
            Sysno::Fork => "fork",
            Sysno::Exit => "exit",
            Sysno::Wait => "wait",
            Sysno::Kill => "kill",
            Sysno::Getpid => "getpid",
            Sysno::Sleep => "sleep",
            Sysno::Uptime => "uptime",
            Sysno::TraceSyscalls => "trace_syscalls",
            Sysno::GetChildren => "get_children",
            Sysno::GetGrandchildren => "get_grandchildren",
            Sysno::SetProcQueue => "set_proc_queue",
            Sysno::SetTickets => "set_tickets",
            Sysno::SetBjfParamsInProc => "set_bjf_params_in_proc",
            Sysno::SetBjfParamsInSystem => "set_bjf_params_in_system",
            Sysno::PrintInfo => "print_info",
            Sysno::SemaphoreInitialize => "semaphore_initialize",
            Sysno::SemaphoreAcquire => "semaphore_aquire",
            Sysno::SemaphoreRelease => "semaphore_release",
            Sysno::CvWait => "cv_wait",
            Sysno::CvSignal => "cv_signal",
            Sysno::IncCounter => "inc_counter",
            Sysno::DecCounter => "dec_counter",
            Sysno::ResetCounter => "reset_counter",
            Sysno::GetCounter => "get_counter",
            Sysno::PrintTrace => "print_trace",
        }
    }
}

impl TryFrom<usize> for Sysno {
    type Error = Errno;

    fn try_from(num: usize) -> Result<Self, Self::Error> {
        Ok(match num {
            1 => Sysno::Fork,
            2 => Sysno::Exit,
            3 => Sysno::Wait,
            6 => Sysno::Kill,
            11 => Sysno::Getpid,
            13 => Sysno::Sleep,
            14 => Sysno::Uptime,
            22 => Sysno::TraceSyscalls,
            23 => Sysno::GetChildren,
            24 => Sysno::GetGrandchildren,
            25 => Sysno::SetProcQueue,
            26 => Sysno::SetTickets,
            27 => Sysno::SetBjfParamsInProc,
            28 => Sysno::SetBjfParamsInSystem,
            29 => Sysno::PrintInfo,
            30 => Sysno::SemaphoreInitialize,
            31 => Sysno::SemaphoreAcquire,
            32 => Sysno::SemaphoreRelease,
            33 => Sysno::CvWait,
            34 => Sysno::CvSignal,
            35 => Sysno::IncCounter,
            36 => Sysno::DecCounter,
            37 => Sysno::ResetCounter,
            38 => Sysno::GetCounter,
            39 => Sysno::PrintTrace,
            _ => return Err(Errno::FunctionNotImplemented),
        })
    }
}

/// 把 pid 列表按十进制拼接成一个整数，第一个 pid 在最低位
///
/// 例如 [4, 5, 12] 得到 1254。结果溢出时返回 `InvalidArgument`。
pub fn pack_pids(pids: &[Pid]) -> Result<i64, Errno> {
    let mut packed: i64 = 0;
    let mut modulus: i64 = 1;
    for &pid in pids {
        let term = modulus
            .checked_mul(pid as i64)
            .ok_or(Errno::InvalidArgument)?;
        packed = packed.checked_add(term).ok_or(Errno::InvalidArgument)?;

        let mut rest = pid;
        while rest != 0 {
            rest /= 10;
            modulus = modulus.checked_mul(10).ok_or(Errno::InvalidArgument)?;
        }
    }
    Ok(packed)
}

#[inline]
fn arg_i32(args: &[usize; 6], n: usize) -> i32 {
    args[n] as isize as i32
}

/// pid 参数超出 `Pid` 范围时返回 `InvalidArgument`
fn arg_pid(args: &[usize; 6], n: usize) -> Result<Pid, Errno> {
    Pid::try_from(args[n]).map_err(|_| Errno::InvalidArgument)
}

impl<A: Arch> Kernel<A> {
    /// 系统调用入口
    ///
    /// 失败统一返回 -1。
    pub fn syscall(&'static self, num: usize, args: [usize; 6]) -> isize {
        let result = match Sysno::try_from(num) {
            Ok(sysno) => {
                self.count_syscall(sysno);
                self.dispatch(sysno, &args)
            }
            Err(e) => {
                log::warn!("syscall: unknown syscall {}", num);
                Err(e)
            }
        };

        if self.killed() {
            self.exit();
        }

        match result {
            Ok(ret) => ret,
            Err(_) => -1,
        }
    }

    fn dispatch(&'static self, sysno: Sysno, args: &[usize; 6]) -> Result<isize, Errno> {
        match sysno {
            Sysno::Fork => self.fork().map(|pid| pid as isize),
            Sysno::Exit => self.exit(),
            Sysno::Wait => self.wait().map(|pid| pid as isize),
            Sysno::Kill => self.kill(arg_pid(args, 0)?).map(|()| 0),
            Sysno::Getpid => self
                .getpid()
                .map(|pid| pid as isize)
                .ok_or(Errno::NoSuchProcess),
            Sysno::Sleep => {
                let n = arg_i32(args, 0);
                if n < 0 {
                    return Err(Errno::InvalidArgument);
                }
                self.sleep_ticks(n as u64).map(|()| 0)
            }
            Sysno::Uptime => Ok(self.uptime() as isize),
            Sysno::TraceSyscalls => {
                self.trace_syscalls(args[0] != 0);
                Ok(1)
            }
            Sysno::GetChildren => {
                let pids = self.children(arg_pid(args, 0)?);
                pack_pids(&pids).map(|v| v as isize)
            }
            Sysno::GetGrandchildren => {
                let pids = self.grandchildren(arg_pid(args, 0)?);
                pack_pids(&pids).map(|v| v as isize)
            }
            Sysno::SetProcQueue => {
                let queue = Queue::try_from(arg_i32(args, 1))?;
                self.set_queue(arg_pid(args, 0)?, queue).map(|()| 0)
            }
            Sysno::SetTickets => self
                .set_tickets(arg_pid(args, 0)?, arg_i32(args, 1))
                .map(|()| 0),
            Sysno::SetBjfParamsInProc => {
                let params = BjfParams::new(arg_i32(args, 1), arg_i32(args, 2), arg_i32(args, 3));
                self.set_bjf_params(Target::Pid(arg_pid(args, 0)?), params)
                    .map(|_| 0)
            }
            Sysno::SetBjfParamsInSystem => {
                let params = BjfParams::new(arg_i32(args, 0), arg_i32(args, 1), arg_i32(args, 2));
                self.set_bjf_params(Target::All, params).map(|_| 0)
            }
            Sysno::PrintInfo => {
                self.print_info();
                Ok(0)
            }
            Sysno::SemaphoreInitialize => {
                // 用户态参数顺序：(id, value, max)
                self.semaphore_init(args[0], arg_i32(args, 2), arg_i32(args, 1))
                    .map(|()| 0)
            }
            Sysno::SemaphoreAcquire => self.semaphore_acquire(args[0]).map(|()| 0),
            Sysno::SemaphoreRelease => self.semaphore_release(args[0]).map(|()| 0),
            Sysno::CvWait => {
                let guard = self.acquire(&self.cv_lock);
                let guard = self.condvar_wait(args[0], &self.cv_lock, guard);
                drop(guard);
                Ok(0)
            }
            Sysno::CvSignal => {
                let _guard = self.acquire(&self.cv_lock);
                self.condvar_signal(args[0]);
                Ok(0)
            }
            Sysno::IncCounter => Ok(self.counter.fetch_add(1, Ordering::AcqRel) as isize + 1),
            Sysno::DecCounter => Ok(self.counter.fetch_sub(1, Ordering::AcqRel) as isize - 1),
            Sysno::ResetCounter => {
                self.counter.store(0, Ordering::Release);
                Ok(0)
            }
            Sysno::GetCounter => Ok(self.counter.load(Ordering::Acquire) as isize),
            Sysno::PrintTrace => {
                self.print_trace();
                Ok(0)
            }
        }
    }

    /// 睡眠 `n` 个时钟滴答
    ///
    /// 在 `Channel::Ticks` 上睡眠，期间被 kill 返回 `InterruptedSystemCall`。
    pub fn sleep_ticks(&self, n: u64) -> Result<(), Errno> {
        let mut guard = self.acquire(&self.tickslock);
        let start = self.ticks();
        while self.ticks() - start < n {
            if self.killed() {
                return Err(Errno::InterruptedSystemCall);
            }
            guard = self.sleep(Channel::Ticks, &self.tickslock, guard);
        }
        drop(guard);
        Ok(())
    }

    /// 启动以来的滴答数
    pub fn uptime(&self) -> u64 {
        let _guard = self.acquire(&self.tickslock);
        self.ticks()
    }

    /// 开关系统调用计数，关闭时清零所有进程的计数
    pub fn trace_syscalls(&self, on: bool) {
        self.trace_enabled.store(on, Ordering::Release);
        if !on {
            let mut table = self.lock_table();
            for p in table.procs.iter_mut() {
                p.syscall_counts = [0; NR_SYSCALLS];
            }
        }
        log::debug!("syscall: tracing {}", if on { "on" } else { "off" });
    }

    fn count_syscall(&self, sysno: Sysno) {
        if !self.trace_enabled.load(Ordering::Acquire) {
            return;
        }
        let Some(slot) = self.current_slot() else {
            return;
        };
        let mut table = self.lock_table();
        let count = &mut table.procs[slot].syscall_counts[sysno as usize];
        *count = count.saturating_add(1);
    }

    /// 某个进程各系统调用的计数（调用号, 次数），只列出非零项
    pub fn syscall_counts(&self, pid: Pid) -> Vec<(Sysno, u32)> {
        let table = self.lock_table();
        let Some(slot) = table.find(pid) else {
            return Vec::new();
        };
        let counts = &table.procs[slot].syscall_counts;
        counts
            .iter()
            .enumerate()
            .filter(|&(_, &n)| n > 0)
            .filter_map(|(num, &n)| Sysno::try_from(num).ok().map(|s| (s, n)))
            .collect()
    }

    /// 输出所有活动进程的系统调用计数
    pub fn print_trace(&self) {
        let table = self.lock_table();
        for p in table.iter().filter(|p| p.state != ProcState::Unused) {
            log::info!("trace: pid {} '{}'", p.pid, p.name);
            for (num, &n) in p.syscall_counts.iter().enumerate() {
                if n == 0 {
                    continue;
                }
                if let Ok(sysno) = Sysno::try_from(num) {
                    log::info!("trace:   {:<24}{}", sysno.name(), n);
                }
            }
        }
    }
}
