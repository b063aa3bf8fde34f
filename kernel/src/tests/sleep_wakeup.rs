// 测试：进程睡眠和唤醒机制
//
// 测试内容：
// 1. wakeup 只唤醒同一通道上的睡眠者
// 2. sleep_ticks 至少睡眠指定的滴答数
// 3. sleep 返回时重新持有调用者的锁
// 4. 在调度器上下文中 preempt 什么也不做

use std::sync::{Arc, Mutex};

use super::runnable;
use super::sim::{self, Sim};
use crate::process::table::ProcTable;
use crate::process::task::{Channel, ProcState, Queue};
use crate::sync::IrqMutex;

#[test]
fn wakeup_matches_channel_exactly() {
    let mut table = ProcTable::<Sim>::new(4);
    let a = runnable(&mut table, Queue::Lottery, 10);
    let b = runnable(&mut table, Queue::Lottery, 10);
    let c = runnable(&mut table, Queue::Lottery, 10);
    for (slot, chan) in [
        (a, Channel::Semaphore(1)),
        (b, Channel::Semaphore(2)),
        (c, Channel::CondVar(1)),
    ] {
        table.procs[slot].state = ProcState::Sleeping;
        table.procs[slot].channel = Some(chan);
    }

    assert_eq!(table.wakeup(Channel::Semaphore(1)), 1);
    assert_eq!(table.procs[a].state, ProcState::Runnable);
    assert_eq!(table.procs[b].state, ProcState::Sleeping);
    assert_eq!(table.procs[c].state, ProcState::Sleeping);

    assert_eq!(table.wakeup(Channel::Ticks), 0);
}

#[test]
fn sleep_ticks_waits_at_least_n_ticks() {
    let (_kernel, report) = sim::run_init(2, "init", |k| {
        let start = k.uptime();
        k.sleep_ticks(10).unwrap();
        assert!(k.uptime() - start >= 10);

        // 0 个滴答立即返回
        let now = k.uptime();
        k.sleep_ticks(0).unwrap();
        assert_eq!(k.uptime(), now);
    });
    report.assert_ok();
}

#[test]
fn sleep_reacquires_caller_lock() {
    let shared: &'static IrqMutex<u32> = Box::leak(Box::new(IrqMutex::new(0)));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();

    let (_kernel, report) = sim::run_init(4, "init", move |k| {
        let s = s.clone();
        let child = sim::spawn(k, move |k| {
            let mut guard = k.acquire(shared);
            while *guard == 0 {
                guard = k.sleep(Channel::CondVar(0x1000), shared, guard);
            }
            s.lock().unwrap().push(*guard);
            *guard += 1;
        });

        k.sleep_ticks(2).unwrap();
        {
            let mut guard = k.acquire(shared);
            *guard = 41;
            k.wakeup(Channel::CondVar(0x1000));
        }
        assert_eq!(k.wait(), Ok(child));
        assert_eq!(*k.acquire(shared), 42);
    });

    report.assert_ok();
    assert_eq!(*seen.lock().unwrap(), vec![41]);
}

#[test]
fn preempt_outside_process_is_noop() {
    let kernel = sim::boot(2);
    kernel.preempt();
    assert_eq!(kernel.current_slot(), None);
    assert!(!kernel.schedule_once());
}
