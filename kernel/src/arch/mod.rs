//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 架构抽象层
//!
//! 调度核心只通过 [`Arch`] 与硬件及内存子系统交互：
//! - CPU 编号、开关中断、空闲等待
//! - 调度器上下文与进程上下文的创建和切换 (cpu_switch_to)
//! - 用户地址空间的复制与释放 (copy_mm / free_pgd)
//!
//! 上下文切换原语只允许调度器路径 (`sched` / `schedule_once`) 调用。

use crate::errno::Errno;
use crate::kernel::Kernel;

/// 平台接口
///
/// 由具体架构（或测试用的模拟机）实现。
pub trait Arch: Sized + Send + Sync + 'static {
    /// 保存的执行上下文句柄
    ///
    /// 句柄本身可以随意克隆，真正的寄存器现场由实现方保存。
    type Context: Clone + Send + Sync;

    /// 用户地址空间
    type AddressSpace: Send + Sync;

    /// 当前 CPU 编号，必须小于内核创建时的 CPU 数量
    fn cpu_id(&self) -> usize;

    /// 打开当前 CPU 的中断
    fn intr_on(&self);

    /// 关闭当前 CPU 的中断
    fn intr_off(&self);

    /// 当前 CPU 的中断是否打开
    fn intr_get(&self) -> bool;

    /// 没有可运行进程时的空闲提示
    fn wait_for_interrupt(&self) {
        core::hint::spin_loop();
    }

    /// 为 `cpu` 创建调度器上下文
    fn scheduler_context(&self, cpu: usize) -> Self::Context;

    /// 为新进程创建首次调度的上下文
    ///
    /// 新上下文第一次被切入时必须先调用 [`Kernel::fork_ret`]，
    /// 然后以返回值 0 回到用户态。
    fn new_context(
        &self,
        kernel: &'static Kernel<Self>,
        slot: usize,
        space: &Self::AddressSpace,
    ) -> Self::Context;

    /// 上下文不再使用（进程被回收）
    fn drop_context(&self, _context: Self::Context) {}

    /// 复制父进程地址空间
    fn duplicate(&self, parent: &Self::AddressSpace) -> Result<Self::AddressSpace, Errno>;

    /// 释放地址空间
    fn free(&self, space: Self::AddressSpace);

    /// 保存当前现场到 `from`，切换到 `to`
    ///
    /// # Safety
    ///
    /// 调用者必须持有进程表锁（中断已关闭），且 `from` 是当前执行流的上下文。
    /// 只有调度器路径可以调用。
    unsafe fn switch(&self, from: &Self::Context, to: &Self::Context);
}
