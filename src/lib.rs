/* flat-fs 的整体架构，自上而下 */

// 操作层：实现文件打开、读写、链接、删除等操作
mod ops;
pub use ops::FlatFs;
pub use ops::OpenFlag;
pub use ops::Stat;

// 存储状态层：索引节点表、数据块池、目录索引、打开文件表
mod state;
pub use state::{Fd, InodeKind};

mod error;
pub use error::{Error, Result};

mod params;
pub use params::FsParams;

/// 根目录的索引节点号，初始化时固定分配
pub const ROOT_INUM: usize = 0;

/// 目录项中文件名的最大长度（字节）
pub const NAME_MAX_LEN: usize = state::DirEntry::NAME_MAX_LEN;
