//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 条件变量 (Condition Variable) 机制
//!
//! 条件变量以地址标识，没有内核侧状态：
//! - wait() 在 `Channel::CondVar(addr)` 上睡眠，同时原子地释放配对的锁
//! - signal() 唤醒该地址上的所有等待者（广播）
//!
//! signal 发生在 wait 之前时唤醒会丢失，调用者需要自己检查条件。

use crate::arch::Arch;
use crate::kernel::Kernel;
use crate::process::task::Channel;
use crate::sync::spinlock::{IrqGuard, IrqMutex};

impl<A: Arch> Kernel<A> {
    /// 释放 `lock` 并等待 `addr` 上的条件，返回时重新持有 `lock`
    pub fn condvar_wait<'a, T>(
        &'a self,
        addr: usize,
        lock: &'a IrqMutex<T>,
        guard: IrqGuard<'a, A, T>,
    ) -> IrqGuard<'a, A, T> {
        self.sleep(Channel::CondVar(addr), lock, guard)
    }

    /// 唤醒 `addr` 上的所有等待者，返回被唤醒的数量
    pub fn condvar_signal(&self, addr: usize) -> usize {
        self.wakeup(Channel::CondVar(addr))
    }
}
