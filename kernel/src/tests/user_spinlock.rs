// 测试：用户态自旋锁
//
// 测试内容：
// 1. lock / unlock / try_lock 状态转换
// 2. 多线程下保证互斥

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crate::sync::UserSpinLock;

#[test]
fn lock_unlock_transitions() {
    let lock = UserSpinLock::new();
    assert!(!lock.is_locked());
    assert!(lock.try_lock());
    assert!(!lock.try_lock());
    lock.unlock();
    lock.lock();
    assert!(lock.is_locked());
    lock.init();
    assert!(!lock.is_locked());
}

#[test]
fn spinlock_serializes_threads() {
    let lock = Arc::new(UserSpinLock::new());
    let counter = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let (lock, counter) = (lock.clone(), counter.clone());
            thread::spawn(move || {
                for _ in 0..1_000 {
                    lock.lock();
                    // 非原子的读-改-写，只有互斥时结果才正确
                    let v = counter.load(Ordering::Relaxed);
                    thread::yield_now();
                    counter.store(v + 1, Ordering::Relaxed);
                    lock.unlock();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(counter.load(Ordering::SeqCst), 4_000);
}
