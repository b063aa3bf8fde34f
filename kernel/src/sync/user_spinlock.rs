//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 用户态自旋锁
//!
//! 单个原子字，测试并设置 (xchg) 获取，普通的 Release 存储释放。
//! 不经过内核，也不记录持有者。

use core::sync::atomic::{AtomicU32, Ordering};

/// 用户态自旋锁
///
/// ```
/// use trine::sync::UserSpinLock;
///
/// let lock = UserSpinLock::new();
/// lock.lock();
/// assert!(lock.is_locked());
/// lock.unlock();
/// assert!(!lock.is_locked());
/// ```
#[repr(C)]
#[derive(Debug, Default)]
pub struct UserSpinLock {
    locked: AtomicU32,
}

impl UserSpinLock {
    pub const fn new() -> Self {
        Self {
            locked: AtomicU32::new(0),
        }
    }

    /// 重新初始化为未锁定
    pub fn init(&self) {
        self.locked.store(0, Ordering::Release);
    }

    /// 自旋直到获取锁
    pub fn lock(&self) {
        while self.locked.swap(1, Ordering::Acquire) != 0 {
            core::hint::spin_loop();
        }
    }

    /// 尝试获取一次
    pub fn try_lock(&self) -> bool {
        self.locked.swap(1, Ordering::Acquire) == 0
    }

    pub fn unlock(&self) {
        self.locked.store(0, Ordering::Release);
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed) != 0
    }
}
