//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 调度器实现
//!
//! 每个 CPU 运行一个调度循环：
//! 开中断 -> 获取进程表锁 -> 老化 -> 选择 -> 切换 -> 统计周期 -> 释放锁
//!
//! 进程表锁跨越上下文切换：调度器持锁切入进程，进程返回 sched()
//! 的调用者后释放；进程持锁调用 sched() 切回调度器，由调度器释放。
//! 新进程第一次运行时由 fork_ret 释放。
//!
//! 持有表锁期间中断关闭；intena 属于内核执行流而不是 CPU，
//! 在 sched() 的切换前后保存和恢复。

use core::sync::atomic::Ordering;

use crate::arch::Arch;
use crate::config::{AGING_THRESHOLD, KERNEL_NAME, KERNEL_VERSION};
use crate::kernel::{Kernel, TableGuard, NO_PROC};
use crate::process::task::{Channel, ProcState};
use crate::sync::spinlock::{IrqGuard, IrqMutex};

use super::{aging, policy};

impl<A: Arch> Kernel<A> {
    /// 调度循环的一次迭代
    ///
    /// 返回是否有进程被调度运行。没有可运行进程时执行空闲提示后返回。
    pub fn schedule_once(&self) -> bool {
        self.arch.intr_on();
        let cpu = self.this_cpu();

        let mut table = self.lock_table();
        let start = self.ticks();

        aging::age(&mut table, AGING_THRESHOLD);

        let Some(slot) = policy::pick_next(&mut table, start) else {
            drop(table);
            self.arch.wait_for_interrupt();
            return false;
        };

        let p = &mut table.procs[slot];
        let context = match p.context.clone() {
            Some(context) => context,
            None => panic!("sched: runnable pid {} has no context", p.pid),
        };
        p.state = ProcState::Running;
        #[cfg(feature = "debug_log")]
        log::trace!("sched: run pid {} ({:?})", p.pid, p.queue);

        cpu.proc.store(slot, Ordering::Release);

        // SAFETY: 持有表锁，当前执行流是本 CPU 的调度器
        unsafe { self.arch.switch(&cpu.context, &context) };

        // 进程已经改变了自己的状态并持锁切回
        let elapsed = self.ticks().saturating_sub(start);
        aging::account(&mut table, slot, elapsed);
        cpu.proc.store(NO_PROC, Ordering::Release);
        drop(table);

        true
    }

    /// 调度循环，永不返回
    pub fn scheduler(&self) -> ! {
        log::info!(
            "sched: {} {} cpu {} entering scheduler",
            KERNEL_NAME,
            KERNEL_VERSION,
            self.arch.cpu_id()
        );
        loop {
            self.schedule_once();
        }
    }

    /// 从当前进程切回调度器
    ///
    /// 调用者只持有进程表锁一把内核锁，且已把当前进程改为非 Running 状态。
    /// 返回时当前进程再次被调度，锁仍然持有。
    pub(crate) fn sched<'a>(&'a self, table: TableGuard<'a, A>) -> TableGuard<'a, A> {
        if !self.table.is_locked() {
            panic!("sched: table lock not held");
        }

        let cpu = self.this_cpu();
        if cpu.noff() != 1 {
            panic!("sched locks: {}", cpu.noff());
        }
        let Some(slot) = cpu.current() else {
            panic!("sched: no current process");
        };

        let p = &table.procs[slot];
        if p.state == ProcState::Running {
            panic!("sched running");
        }
        if self.arch.intr_get() {
            panic!("sched interruptible");
        }
        let context = match p.context.clone() {
            Some(context) => context,
            None => panic!("sched: pid {} has no context", p.pid),
        };

        let intena = cpu.intena.load(Ordering::Relaxed);
        // SAFETY: 持有表锁，context 是当前进程自己的上下文
        unsafe { self.arch.switch(&context, &cpu.context) };
        self.this_cpu().intena.store(intena, Ordering::Relaxed);

        table
    }

    /// 主动让出 CPU
    pub fn yield_now(&self) {
        let slot = self.my_slot("yield");
        let mut table = self.lock_table();
        table.procs[slot].state = ProcState::Runnable;
        let table = self.sched(table);
        drop(table);
    }

    /// 时钟中断的抢占入口
    ///
    /// 当前进程处于 Running 时让出 CPU；在调度器中调用时什么也不做。
    pub fn preempt(&self) {
        let Some(slot) = self.current_slot() else {
            return;
        };
        let running = self.lock_table().procs[slot].state == ProcState::Running;
        if running {
            self.yield_now();
        }
    }

    /// 释放 `lock` 并在 `chan` 上睡眠，被唤醒后重新获取 `lock`
    ///
    /// 先获取进程表锁再释放 `lock`，保证不会丢失唤醒：
    /// 唤醒者必须持有表锁才能修改睡眠者状态。
    pub fn sleep<'a, T>(
        &'a self,
        chan: Channel,
        lock: &'a IrqMutex<T>,
        guard: IrqGuard<'a, A, T>,
    ) -> IrqGuard<'a, A, T> {
        let slot = self.my_slot("sleep");

        let mut table = self.lock_table();
        drop(guard);

        let p = &mut table.procs[slot];
        p.channel = Some(chan);
        p.state = ProcState::Sleeping;

        let mut table = self.sched(table);

        table.procs[slot].channel = None;
        drop(table);

        self.acquire(lock)
    }

    /// 已持有进程表锁时睡眠（wait 使用）
    pub(crate) fn sleep_locked<'a>(
        &'a self,
        chan: Channel,
        mut table: TableGuard<'a, A>,
    ) -> TableGuard<'a, A> {
        let slot = self.my_slot("sleep");

        let p = &mut table.procs[slot];
        p.channel = Some(chan);
        p.state = ProcState::Sleeping;

        let mut table = self.sched(table);
        table.procs[slot].channel = None;
        table
    }

    /// 唤醒所有在 `chan` 上睡眠的进程，返回被唤醒的数量
    pub fn wakeup(&self, chan: Channel) -> usize {
        let woken = self.lock_table().wakeup(chan);
        #[cfg(feature = "debug_log")]
        log::trace!("sched: wakeup {:?} -> {} procs", chan, woken);
        woken
    }
}
