//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 标准错误代码定义
//!
//! 数值与 include/uapi/asm-generic/errno.h 一致。
//! 内核接口返回 `Result<_, Errno>`，系统调用层统一折算为 -1。

use core::fmt;

/// 标准错误代码
///
/// 使用方法：
/// ```
/// use trine::errno::Errno;
///
/// fn lookup(found: bool) -> Result<u32, Errno> {
///     if found { Ok(1) } else { Err(Errno::NoSuchProcess) }
/// }
///
/// assert_eq!(lookup(false), Err(Errno::NoSuchProcess));
/// assert_eq!(Errno::NoSuchProcess.as_neg_i32(), -3);
/// ```
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Errno {
    /// No such process (ESRCH, 3)
    NoSuchProcess = 3,

    /// Interrupted system call (EINTR, 4)
    InterruptedSystemCall = 4,

    /// No child process (ECHILD, 10)
    NoChild = 10,

    /// Try again (EAGAIN, 11)
    TryAgain = 11,

    /// Out of memory (ENOMEM, 12)
    OutOfMemory = 12,

    /// Invalid argument (EINVAL, 22)
    InvalidArgument = 22,

    /// Function not implemented (ENOSYS, 38)
    FunctionNotImplemented = 38,
}

impl Errno {
    /// 获取错误代码的正数值（用于比较）
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// 获取错误代码的负数值
    #[inline]
    pub const fn as_neg_i32(self) -> i32 {
        -(self as i32)
    }

    /// 错误名称，用于日志
    pub const fn name(self) -> &'static str {
        match self {
            Errno::NoSuchProcess => "ESRCH",
            Errno::InterruptedSystemCall => "EINTR",
            Errno::NoChild => "ECHILD",
            Errno::TryAgain => "EAGAIN",
            Errno::OutOfMemory => "ENOMEM",
            Errno::InvalidArgument => "EINVAL",
            Errno::FunctionNotImplemented => "ENOSYS",
        }
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_i32())
    }
}

/// 常用的错误代码常量
pub mod constants {
    pub const ESRCH: i32 = 3;
    pub const EINTR: i32 = 4;
    pub const ECHILD: i32 = 10;
    pub const EAGAIN: i32 = 11;
    pub const ENOMEM: i32 = 12;
    pub const EINVAL: i32 = 22;
    pub const ENOSYS: i32 = 38;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_values() {
        assert_eq!(Errno::NoSuchProcess.as_i32(), constants::ESRCH);
        assert_eq!(Errno::NoChild.as_i32(), constants::ECHILD);
        assert_eq!(Errno::TryAgain.as_i32(), constants::EAGAIN);
        assert_eq!(Errno::InvalidArgument.as_i32(), constants::EINVAL);
    }

    #[test]
    fn test_errno_negative() {
        assert_eq!(Errno::OutOfMemory.as_neg_i32(), -12);
        assert_eq!(Errno::InterruptedSystemCall.as_neg_i32(), -4);
    }

    #[test]
    fn test_errno_display() {
        assert_eq!(Errno::NoChild.to_string(), "ECHILD (10)");
    }
}
