//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 进程退出与回收
//!
//! - `exit`: 进程变为僵尸，子进程过继给 init，永不返回
//! - `wait`: 回收一个僵尸子进程，没有则在 `Channel::Proc(self)` 上睡眠
//! - `kill`: 协作式终止，仅设置标志并唤醒睡眠者

use crate::arch::Arch;
use crate::errno::Errno;
use crate::kernel::Kernel;

use super::task::{Channel, Pid, ProcState};

impl<A: Arch> Kernel<A> {
    /// 退出当前进程
    ///
    /// 对应 Linux 的 do_exit。进程保持 Zombie 直到父进程 wait。
    pub fn exit(&self) -> ! {
        let slot = self.my_slot("exit");
        let mut table = self.lock_table();

        if table.init == Some(slot) {
            panic!("init exiting");
        }

        // 父进程可能正睡在 wait() 中
        if let Some(parent) = table.procs[slot].parent {
            table.wakeup(Channel::Proc(parent));
        }

        if table.reparent(slot) {
            if let Some(init) = table.init {
                table.wakeup(Channel::Proc(init));
            }
        }

        let p = &mut table.procs[slot];
        p.state = ProcState::Zombie;
        log::debug!("exit: pid {} '{}' -> zombie", p.pid, p.name);

        let _table = self.sched(table);
        panic!("zombie exit");
    }

    /// 等待子进程退出，返回其 pid
    ///
    /// 没有子进程返回 `NoChild`，被 kill 返回 `InterruptedSystemCall`。
    pub fn wait(&self) -> Result<Pid, Errno> {
        let slot = self.my_slot("wait");
        let mut table = self.lock_table();

        loop {
            let mut have_kids = false;
            for child in 0..table.capacity() {
                let p = &table.procs[child];
                if p.state == ProcState::Unused || p.parent != Some(slot) {
                    continue;
                }
                have_kids = true;
                if p.state == ProcState::Zombie {
                    let pid = p.pid;
                    let released = table.release(child);
                    drop(table);

                    if let Some(released) = released {
                        if let Some(context) = released.context {
                            self.arch.drop_context(context);
                        }
                        if let Some(space) = released.space {
                            self.arch.free(space);
                        }
                    }
                    log::debug!("wait: reaped pid {}", pid);
                    return Ok(pid);
                }
            }

            if !have_kids {
                return Err(Errno::NoChild);
            }
            if table.procs[slot].killed {
                return Err(Errno::InterruptedSystemCall);
            }

            table = self.sleep_locked(Channel::Proc(slot), table);
        }
    }

    /// 终止进程
    ///
    /// 只设置 killed 标志；睡眠中的目标被置为 Runnable，
    /// 由它自己在返回用户态前退出。
    pub fn kill(&self, pid: Pid) -> Result<(), Errno> {
        let mut table = self.lock_table();
        let Some(slot) = table.find(pid) else {
            log::warn!("kill: no such pid {}", pid);
            return Err(Errno::NoSuchProcess);
        };

        let p = &mut table.procs[slot];
        p.killed = true;
        if p.state == ProcState::Sleeping {
            p.state = ProcState::Runnable;
        }
        log::debug!("kill: pid {} marked", pid);
        Ok(())
    }

    /// 当前进程是否已被 kill
    pub fn killed(&self) -> bool {
        match self.current_slot() {
            Some(slot) => self.lock_table().procs[slot].killed,
            None => false,
        }
    }
}
