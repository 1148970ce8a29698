use core::fmt;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// 文件系统操作的失败原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// 路径不是 `/name` 形式，或名字超长、含有 NUL
    InvalidPath,
    NotFound,
    AlreadyExists,
    /// 索引节点、数据块或目录项已耗尽
    Exhausted,
    /// 打开文件表已满
    TooManyOpenFiles,
    /// 目标文件仍被打开着
    Busy,
    /// 软链接指向的名字已不存在
    BrokenLink,
    /// 对软链接建立硬链接等类型错误
    InvalidType,
    InvalidHandle,
    CopyFailed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::InvalidPath => "invalid path name",
            Self::NotFound => "no such file",
            Self::AlreadyExists => "name already exists",
            Self::Exhausted => "inode, block or directory capacity exhausted",
            Self::TooManyOpenFiles => "open file table is full",
            Self::Busy => "file is currently open",
            Self::BrokenLink => "symbolic link target does not resolve",
            Self::InvalidType => "operation not valid for this inode type",
            Self::InvalidHandle => "unknown file handle",
            Self::CopyFailed => "bulk copy from external file failed",
        };
        f.write_str(message)
    }
}

impl std::error::Error for Error {}
