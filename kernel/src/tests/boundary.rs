//! 边界条件测试
//!
//! 测试进程管理的边界情况

use super::runnable;
use super::sim::{self, Sim};
use crate::config::PROC_NAME_LEN;
use crate::errno::Errno;
use crate::process::table::{ProcInfo, ProcTable};
use crate::process::task::{BjfParams, ProcState, Queue};
use crate::process::Target;

/// 进程表满时 fork 失败且不修改任何槽位
#[test]
fn fork_on_full_table_fails_cleanly() {
    let (_kernel, report) = sim::run_init(3, "init", |k| {
        let a = sim::spawn(k, |_| {});
        let b = sim::spawn(k, |_| {});

        let before = k.proc_info();
        assert_eq!(before.len(), 3);
        assert_eq!(k.fork(), Err(Errno::TryAgain));
        assert_eq!(k.proc_info(), before);

        let mut reaped = vec![k.wait().unwrap(), k.wait().unwrap()];
        reaped.sort();
        assert_eq!(reaped, vec![a, b]);

        // 回收后可以再次 fork
        let c = sim::spawn(k, |_| {});
        assert_eq!(k.wait(), Ok(c));
    });
    report.assert_ok();
}

#[test]
fn allocate_returns_none_when_full() {
    let mut table = ProcTable::<Sim>::new(2);
    assert!(table.allocate(0).is_some());
    assert!(table.allocate(0).is_some());
    assert!(table.allocate(0).is_none());
    assert_eq!(table.live(), 2);
}

#[test]
fn pids_are_unique_among_live_slots() {
    let mut table = ProcTable::<Sim>::new(8);
    for round in 0..5 {
        while table.allocate(round).is_some() {}
        let mut pids: Vec<_> = table.iter().map(|p| p.pid()).collect();
        pids.sort();
        pids.dedup();
        assert_eq!(pids.len(), table.capacity());

        for slot in (0..table.capacity()).step_by(2) {
            table.procs[slot].state = ProcState::Zombie;
            table.release(slot).unwrap();
        }
    }
}

#[test]
fn setters_reject_unknown_pid_without_changes() {
    let mut table = ProcTable::<Sim>::new(2);
    let slot = runnable(&mut table, Queue::Lottery, 10);
    let pid = table.procs[slot].pid;

    assert_eq!(table.set_queue(pid + 100, Queue::Bjf), Err(Errno::NoSuchProcess));
    assert_eq!(table.set_tickets(pid + 100, 5), Err(Errno::NoSuchProcess));
    assert_eq!(
        table.set_bjf_params(pid + 100, BjfParams::new(2, 2, 2)),
        Err(Errno::NoSuchProcess)
    );
    assert_eq!(table.set_tickets(pid, 0), Err(Errno::InvalidArgument));
    assert_eq!(table.set_tickets(pid, -3), Err(Errno::InvalidArgument));

    let p = &table.procs[slot];
    assert_eq!(p.queue, Queue::Lottery);
    assert_eq!(p.tickets, 10);
    assert_eq!(p.bjf, BjfParams::default());

    assert_eq!(table.set_tickets(pid, 30), Ok(()));
    assert_eq!(table.set_queue(pid, Queue::Bjf), Ok(()));
    assert_eq!(table.procs[slot].tickets, 30);
    assert_eq!(table.procs[slot].queue, Queue::Bjf);
}

#[test]
fn bjf_params_for_whole_system() {
    let kernel = sim::boot(4);
    {
        let mut table = kernel.lock_table();
        runnable(&mut table, Queue::Bjf, 10);
        runnable(&mut table, Queue::Lottery, 10);
    }

    let params = BjfParams::new(3, 4, 5);
    assert_eq!(kernel.set_bjf_params(Target::All, params), Ok(2));
    assert!(kernel.proc_info().iter().all(|p| p.bjf == params));

    let pid = kernel.proc_info()[0].pid;
    let single = BjfParams::new(7, 1, 1);
    assert_eq!(kernel.set_bjf_params(Target::Pid(pid), single), Ok(1));
    assert_eq!(kernel.proc_info()[0].bjf, single);
    assert_eq!(kernel.proc_info()[1].bjf, params);
    assert_eq!(
        kernel.set_bjf_params(Target::Pid(pid + 50), single),
        Err(Errno::NoSuchProcess)
    );
}

#[test]
fn queue_numbers_outside_range_are_rejected() {
    assert_eq!(Queue::try_from(1i32), Ok(Queue::RoundRobin));
    assert_eq!(Queue::try_from(3i32), Ok(Queue::Bjf));
    assert_eq!(Queue::try_from(0i32), Err(Errno::InvalidArgument));
    assert_eq!(Queue::try_from(4i32), Err(Errno::InvalidArgument));
}

#[test]
fn long_names_are_truncated() {
    let kernel = sim::boot(2);
    let long = "x".repeat(PROC_NAME_LEN * 2);
    kernel.user_init(&long, sim::Image::new(|_| {})).unwrap();
    assert_eq!(kernel.proc_info()[0].name.len(), PROC_NAME_LEN);
    assert_eq!(
        kernel.user_init("again", sim::Image::new(|_| {})),
        Err(Errno::InvalidArgument)
    );
}

#[test]
fn info_listing_has_header_and_columns() {
    let header = ProcInfo::header().to_string();
    let mut lines = header.lines();
    let titles = lines.next().unwrap();
    for title in ["name", "pid", "state", "queue_num", "ticket", "rank", "cycles"] {
        assert!(titles.contains(title), "missing column {}", title);
    }
    assert!(lines.next().unwrap().chars().all(|c| c == '-'));

    let kernel = sim::boot(2);
    sim::start(kernel, "init", |_| {});
    let row = kernel.proc_info()[0].to_string();
    assert!(row.starts_with("init"));
    assert!(row.contains("RUNNABLE"));
    kernel.print_info();
}
