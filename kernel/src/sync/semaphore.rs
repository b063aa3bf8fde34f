//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 信号量 (Semaphore) 机制
//!
//! 内核维护固定数量的信号量槽位，用户按编号访问：
//! - P 操作 (acquire): 计数为 0 时在 `Channel::Semaphore(id)` 上睡眠，否则减 1
//! - V 操作 (release): 计数加 1（不超过上限），唤醒所有等待者
//!
//! 计数永远不会为负。

use crate::arch::Arch;
use crate::errno::Errno;
use crate::kernel::Kernel;
use crate::process::task::Channel;
use crate::sync::spinlock::IrqMutex;

/// 信号量槽位状态，由槽位自己的锁保护
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SemState {
    /// 当前可用数量
    pub count: i32,
    /// 计数上限
    pub max: i32,
}

impl<A: Arch> Kernel<A> {
    fn semaphore(&self, id: usize) -> Result<&IrqMutex<SemState>, Errno> {
        self.semaphores.get(id).ok_or_else(|| {
            log::warn!("sem: invalid semaphore id {}", id);
            Errno::InvalidArgument
        })
    }

    /// 初始化信号量
    ///
    /// `count` 必须在 `0..=max` 之间。已有的等待者不受影响，
    /// 下一次 release 时才会被唤醒。
    pub fn semaphore_init(&self, id: usize, max: i32, count: i32) -> Result<(), Errno> {
        let sem = self.semaphore(id)?;
        if max < 0 || count < 0 || count > max {
            return Err(Errno::InvalidArgument);
        }

        *self.acquire(sem) = SemState { count, max };
        log::debug!("sem: init {} count={} max={}", id, count, max);
        Ok(())
    }

    /// P 操作
    ///
    /// 对应 Linux 的 down_interruptible：睡眠期间被 kill 返回
    /// `InterruptedSystemCall`。
    pub fn semaphore_acquire(&self, id: usize) -> Result<(), Errno> {
        let sem = self.semaphore(id)?;
        let mut state = self.acquire(sem);

        while state.count == 0 {
            if self.killed() {
                return Err(Errno::InterruptedSystemCall);
            }
            state = self.sleep(Channel::Semaphore(id), sem, state);
        }

        state.count -= 1;
        Ok(())
    }

    /// V 操作
    pub fn semaphore_release(&self, id: usize) -> Result<(), Errno> {
        let sem = self.semaphore(id)?;
        let mut state = self.acquire(sem);

        if state.count < state.max {
            state.count += 1;
        }
        self.wakeup(Channel::Semaphore(id));
        Ok(())
    }

    /// 读取信号量当前状态
    pub fn semaphore_state(&self, id: usize) -> Result<SemState, Errno> {
        let sem = self.semaphore(id)?;
        let state = *self.acquire(sem);
        Ok(state)
    }
}
