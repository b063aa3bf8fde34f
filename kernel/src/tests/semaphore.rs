// 测试：内核信号量
//
// 测试内容：
// 1. 初始化参数检查，非法编号返回 EINVAL
// 2. 计数不超过上限，不会为负
// 3. 计数为 0 时 acquire 阻塞，release 交接给等待者
// 4. 二值信号量实现互斥
// 5. 等待中被 kill 返回 EINTR

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::sim;
use crate::config::NSEMAPHORE;
use crate::errno::Errno;
use crate::sync::semaphore::SemState;
use crate::syscall::Sysno;

#[test]
fn init_validates_arguments() {
    let kernel = sim::boot(2);
    assert_eq!(kernel.semaphore_init(NSEMAPHORE, 1, 1), Err(Errno::InvalidArgument));
    assert_eq!(kernel.semaphore_init(0, 1, 2), Err(Errno::InvalidArgument));
    assert_eq!(kernel.semaphore_init(0, 1, -1), Err(Errno::InvalidArgument));
    assert_eq!(kernel.semaphore_acquire(NSEMAPHORE), Err(Errno::InvalidArgument));
    assert_eq!(kernel.semaphore_release(NSEMAPHORE), Err(Errno::InvalidArgument));

    assert_eq!(kernel.semaphore_init(0, 3, 2), Ok(()));
    assert_eq!(kernel.semaphore_state(0), Ok(SemState { count: 2, max: 3 }));
}

#[test]
fn count_stays_within_bounds() {
    let kernel = sim::boot(2);
    kernel.semaphore_init(1, 2, 2).unwrap();

    kernel.semaphore_acquire(1).unwrap();
    kernel.semaphore_acquire(1).unwrap();
    assert_eq!(kernel.semaphore_state(1).unwrap().count, 0);

    for _ in 0..5 {
        kernel.semaphore_release(1).unwrap();
    }
    assert_eq!(kernel.semaphore_state(1).unwrap().count, 2);
}

#[test]
fn release_hands_off_to_blocked_acquirer() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let l = log.clone();

    let (kernel, report) = sim::run_init(4, "init", move |k| {
        k.semaphore_init(2, 1, 0).unwrap();
        let l2 = l.clone();
        let child = sim::spawn(k, move |k| {
            l2.lock().unwrap().push("child waiting");
            k.semaphore_acquire(2).unwrap();
            l2.lock().unwrap().push("child acquired");
        });

        k.sleep_ticks(50).unwrap();
        l.lock().unwrap().push("parent release");
        k.semaphore_release(2).unwrap();
        assert_eq!(k.wait(), Ok(child));
    });

    report.assert_ok();
    assert_eq!(
        *log.lock().unwrap(),
        vec!["child waiting", "parent release", "child acquired"]
    );
    assert_eq!(kernel.semaphore_state(2).unwrap().count, 0);
}

/// 生产者消费者：二值信号量保护临界区
#[test]
fn binary_semaphore_is_mutual_exclusion() {
    let inside = Arc::new(AtomicBool::new(false));
    let entries = Arc::new(Mutex::new(0));
    let (i, e) = (inside.clone(), entries.clone());

    let (_kernel, report) = sim::run_init(8, "init", move |k| {
        let args = [3, 1, 1, 0, 0, 0];
        assert_eq!(k.syscall(Sysno::SemaphoreInitialize as usize, args), 0);

        for _ in 0..3 {
            let (i, e) = (i.clone(), e.clone());
            sim::spawn(k, move |k| {
                for _ in 0..2 {
                    k.syscall(Sysno::SemaphoreAcquire as usize, [3, 0, 0, 0, 0, 0]);
                    assert!(!i.swap(true, Ordering::SeqCst), "two holders");
                    *e.lock().unwrap() += 1;
                    // 持有期间让出 CPU，其他进程必须阻塞
                    k.yield_now();
                    i.store(false, Ordering::SeqCst);
                    k.syscall(Sysno::SemaphoreRelease as usize, [3, 0, 0, 0, 0, 0]);
                }
            });
        }
        for _ in 0..3 {
            k.wait().unwrap();
        }
    });

    report.assert_ok();
    assert_eq!(*entries.lock().unwrap(), 6);
}

#[test]
fn killed_acquirer_is_interrupted() {
    let (_kernel, report) = sim::run_init(4, "init", |k| {
        k.semaphore_init(4, 1, 0).unwrap();
        let child = sim::spawn(k, |k| {
            assert_eq!(k.semaphore_acquire(4), Err(Errno::InterruptedSystemCall));
        });
        k.sleep_ticks(2).unwrap();
        k.kill(child).unwrap();
        assert_eq!(k.wait(), Ok(child));
        assert_eq!(k.semaphore_state(4).unwrap().count, 0);
    });
    report.assert_ok();
}
