//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 同步原语 (Synchronization Primitives)
//!
//! - `spinlock`: 持锁期间关中断的内核互斥锁
//! - `semaphore`: 按编号索引的内核计数信号量
//! - `condvar`: 以用户地址标识的条件变量
//! - `user_spinlock`: 不经过内核的用户态自旋锁
//!
//! 信号量和条件变量都建立在 `Kernel::sleep` / `Kernel::wakeup` 之上。

pub mod condvar;
pub mod semaphore;
pub mod spinlock;
pub mod user_spinlock;

pub use spinlock::{IrqGuard, IrqMutex};
pub use user_spinlock::UserSpinLock;
