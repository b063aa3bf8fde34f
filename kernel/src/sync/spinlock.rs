//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 关中断自旋锁
//!
//! 对应 xv6 的 acquire/release：获取前 push_off 关闭本 CPU 中断，
//! 释放后 pop_off 按嵌套深度恢复。持锁期间时钟中断不会在本 CPU 上
//! 进入 `clock_tick` / `preempt` 再次获取同一把锁。

use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};

use spin::{Mutex, MutexGuard};

use crate::arch::Arch;
use crate::kernel::Kernel;

/// 持锁期间关中断的互斥锁
pub struct IrqMutex<T> {
    inner: Mutex<T>,
}

impl<T> IrqMutex<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// 释放由另一条执行流获取的锁，不恢复中断状态
    ///
    /// # Safety
    ///
    /// 锁必须处于持有状态，且其守卫已随上下文切换转移给当前执行流。
    pub(crate) unsafe fn force_unlock(&self) {
        // SAFETY: 由调用者保证
        unsafe { self.inner.force_unlock() };
    }
}

/// [`IrqMutex`] 的守卫
///
/// 先释放锁再 pop_off。
pub struct IrqGuard<'a, A: Arch, T> {
    kernel: &'a Kernel<A>,
    guard: ManuallyDrop<MutexGuard<'a, T>>,
}

impl<A: Arch, T> Deref for IrqGuard<'_, A, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<A: Arch, T> DerefMut for IrqGuard<'_, A, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<A: Arch, T> Drop for IrqGuard<'_, A, T> {
    fn drop(&mut self) {
        // SAFETY: guard 只在这里释放一次
        unsafe { ManuallyDrop::drop(&mut self.guard) };
        self.kernel.pop_off();
    }
}

impl<A: Arch> Kernel<A> {
    /// 关中断并获取 `lock`
    pub fn acquire<'a, T>(&'a self, lock: &'a IrqMutex<T>) -> IrqGuard<'a, A, T> {
        self.push_off();
        IrqGuard {
            kernel: self,
            guard: ManuallyDrop::new(lock.inner.lock()),
        }
    }
}
