//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 内核实例
//!
//! 进程表、时钟、per-CPU 状态和同步原语表都挂在 [`Kernel`] 上。
//! 锁顺序：条件锁（信号量槽、条件变量锁、tickslock）在进程表锁之前。
//!
//! 内核里的锁都是 [`IrqMutex`]：持锁期间本 CPU 关中断，
//! 时钟中断不会在持锁的 CPU 上重入同一把锁。

use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, AtomicUsize, Ordering};

use crate::arch::Arch;
use crate::config::{NCPU, NPROC, NSEMAPHORE};
use crate::process::table::ProcTable;
use crate::process::task::Channel;
use crate::sync::semaphore::SemState;
use crate::sync::spinlock::{IrqGuard, IrqMutex};

/// 进程表锁的守卫
pub(crate) type TableGuard<'a, A> = IrqGuard<'a, A, ProcTable<A>>;

/// per-CPU 当前进程的空值
pub(crate) const NO_PROC: usize = usize::MAX;

/// per-CPU 状态
///
/// 对应 xv6 的 struct cpu
pub struct Cpu<A: Arch> {
    /// 当前运行进程的槽位，NO_PROC 表示在调度器中
    pub(crate) proc: AtomicUsize,
    /// 调度器上下文
    pub(crate) context: A::Context,
    /// push_off 的嵌套深度
    pub(crate) noff: AtomicUsize,
    /// 第一次 push_off 之前中断是否打开
    pub(crate) intena: AtomicBool,
}

impl<A: Arch> Cpu<A> {
    fn new(context: A::Context) -> Self {
        Self {
            proc: AtomicUsize::new(NO_PROC),
            context,
            noff: AtomicUsize::new(0),
            intena: AtomicBool::new(false),
        }
    }

    /// 当前关中断的嵌套深度（持有的内核锁数量）
    #[inline]
    pub fn noff(&self) -> usize {
        self.noff.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn current(&self) -> Option<usize> {
        match self.proc.load(Ordering::Acquire) {
            NO_PROC => None,
            slot => Some(slot),
        }
    }
}

/// 调度核心
pub struct Kernel<A: Arch> {
    pub(crate) table: IrqMutex<ProcTable<A>>,
    ticks: AtomicU64,
    pub(crate) tickslock: IrqMutex<()>,
    cpus: Vec<Cpu<A>>,
    pub(crate) semaphores: Vec<IrqMutex<SemState>>,
    /// 条件变量系统调用共用的锁
    pub(crate) cv_lock: IrqMutex<()>,
    /// 共享计数器（读者写者程序使用）
    pub(crate) counter: AtomicI32,
    pub(crate) trace_enabled: AtomicBool,
    pub(crate) arch: A,
}

impl<A: Arch> Kernel<A> {
    /// 按 Kernel.toml 的容量创建内核
    pub fn new(arch: A) -> Self {
        Self::with_capacity(arch, NPROC)
    }

    /// 指定进程表容量创建内核
    pub fn with_capacity(arch: A, nproc: usize) -> Self {
        let cpus = (0..NCPU)
            .map(|id| Cpu::new(arch.scheduler_context(id)))
            .collect();
        let semaphores = (0..NSEMAPHORE)
            .map(|_| IrqMutex::new(SemState::default()))
            .collect();

        log::debug!("kernel: {} procs, {} cpus, {} semaphores", nproc, NCPU, NSEMAPHORE);

        Self {
            table: IrqMutex::new(ProcTable::new(nproc)),
            ticks: AtomicU64::new(0),
            tickslock: IrqMutex::new(()),
            cpus,
            semaphores,
            cv_lock: IrqMutex::new(()),
            counter: AtomicI32::new(0),
            trace_enabled: AtomicBool::new(false),
            arch,
        }
    }

    #[inline]
    pub fn arch(&self) -> &A {
        &self.arch
    }

    /// 当前 CPU
    pub(crate) fn this_cpu(&self) -> &Cpu<A> {
        let id = self.arch.cpu_id();
        match self.cpus.get(id) {
            Some(cpu) => cpu,
            None => panic!("kernel: cpu id {} out of range", id),
        }
    }

    /// 关中断并增加嵌套深度
    ///
    /// 与 [`Kernel::pop_off`] 配对；最外层记录原来的中断状态。
    pub(crate) fn push_off(&self) {
        let old = self.arch.intr_get();
        self.arch.intr_off();
        let cpu = self.this_cpu();
        if cpu.noff.load(Ordering::Relaxed) == 0 {
            cpu.intena.store(old, Ordering::Relaxed);
        }
        cpu.noff.fetch_add(1, Ordering::Relaxed);
    }

    /// 减少嵌套深度，最外层恢复 push_off 之前的中断状态
    pub(crate) fn pop_off(&self) {
        if self.arch.intr_get() {
            panic!("pop_off: interruptible");
        }
        let cpu = self.this_cpu();
        let noff = cpu.noff.load(Ordering::Relaxed);
        if noff == 0 {
            panic!("pop_off: not pushed");
        }
        cpu.noff.store(noff - 1, Ordering::Relaxed);
        if noff == 1 && cpu.intena.load(Ordering::Relaxed) {
            self.arch.intr_on();
        }
    }

    /// 获取进程表锁
    #[inline]
    pub(crate) fn lock_table(&self) -> TableGuard<'_, A> {
        self.acquire(&self.table)
    }

    /// 当前 CPU 上运行的进程槽位
    #[inline]
    pub fn current_slot(&self) -> Option<usize> {
        self.this_cpu().current()
    }

    /// 当前进程槽位，没有当前进程属于致命错误
    pub(crate) fn my_slot(&self, what: &str) -> usize {
        match self.current_slot() {
            Some(slot) => slot,
            None => panic!("{}: no current process", what),
        }
    }

    /// 当前滴答数
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// 时钟中断入口
    ///
    /// 对应 xv6 trap.c 中的 `ticks++; wakeup(&ticks)`
    pub fn clock_tick(&self) {
        let _guard = self.acquire(&self.tickslock);
        self.ticks.fetch_add(1, Ordering::AcqRel);
        self.wakeup(Channel::Ticks);
    }
}
