//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 进程创建
//!
//! 流程：
//! 1. 在进程表中分配 Embryo 槽位 (allocproc)
//! 2. 复制父进程地址空间 (copy_mm)
//! 3. 继承进程名，选择初始队列
//! 4. 创建首次调度上下文，子进程返回值为 0 (copy_thread)
//! 5. 置为 Runnable (wake_up_new_task)
//!
//! 整个过程持有进程表锁，子进程在第 5 步之前不会被调度器看到。

use crate::arch::Arch;
use crate::config::SHELL_NAME;
use crate::errno::Errno;
use crate::kernel::Kernel;

use super::task::{Pid, ProcState, Queue};

impl<A: Arch> Kernel<A> {
    /// 创建第一个用户进程 (init)
    ///
    /// init 没有父进程，所有孤儿进程都会过继给它，且它不允许退出。
    pub fn user_init(&'static self, name: &str, space: A::AddressSpace) -> Result<Pid, Errno> {
        let mut table = self.lock_table();
        if table.init.is_some() {
            return Err(Errno::InvalidArgument);
        }

        let now = self.ticks();
        let slot = table.allocate(now).ok_or(Errno::TryAgain)?;
        let context = self.arch.new_context(self, slot, &space);

        let p = &mut table.procs[slot];
        p.set_name(name);
        p.space = Some(space);
        p.context = Some(context);
        p.state = ProcState::Runnable;
        let pid = p.pid;
        table.init = Some(slot);

        log::info!("fork: init '{}' pid {} in slot {}", name, pid, slot);
        Ok(pid)
    }

    /// fork 系统调用
    ///
    /// 返回子进程 pid。进程表满返回 `TryAgain`，
    /// 地址空间复制失败返回 `OutOfMemory` 且槽位被归还。
    pub fn fork(&'static self) -> Result<Pid, Errno> {
        let parent = self.my_slot("fork");
        let mut table = self.lock_table();

        let now = self.ticks();
        let Some(slot) = table.allocate(now) else {
            log::warn!("fork: process table full");
            return Err(Errno::TryAgain);
        };

        let duplicated = match table.procs[parent].space.as_ref() {
            Some(space) => self.arch.duplicate(space),
            None => Err(Errno::OutOfMemory),
        };
        let space = match duplicated {
            Ok(space) => space,
            Err(e) => {
                table.abort_embryo(slot);
                log::warn!("fork: address space copy failed: {}", e);
                return Err(e);
            }
        };

        let context = self.arch.new_context(self, slot, &space);

        let parent_name = table.procs[parent].name.clone();
        let queue = if parent_name == SHELL_NAME {
            Queue::RoundRobin
        } else {
            Queue::Lottery
        };

        let child = &mut table.procs[slot];
        child.parent = Some(parent);
        child.set_name(&parent_name);
        child.queue = queue;
        child.space = Some(space);
        child.context = Some(context);
        child.state = ProcState::Runnable;
        let pid = child.pid;

        log::debug!("fork: '{}' slot {} -> child pid {} ({:?})", parent_name, parent, pid, queue);
        Ok(pid)
    }

    /// 新进程第一次被调度时的入口
    ///
    /// 调度器切入时持有进程表锁（中断关闭），这里代为释放并恢复中断。
    ///
    /// # Safety
    ///
    /// 只能由 [`Arch::new_context`] 创建的上下文在首次运行时调用一次。
    pub unsafe fn fork_ret(&self) {
        // SAFETY: 调度器在切换前获取了表锁，所有权随切换转移到本执行流
        unsafe { self.table.force_unlock() };
        self.pop_off();
    }
}
