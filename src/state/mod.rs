//! # 存储状态层
//!
//! flat-fs 的内存布局：
//! 索引节点位图 | 索引节点表 | 数据块位图 | 数据块池 | 打开文件表
//!
//! 目录索引不单独占结构：目录项以定长记录的形式
//! 存放在根目录自己的数据块里。

mod bitmap;
pub use bitmap::Bitmap;

mod inode;
pub use inode::{Inode, InodeKind, InodeTable};

mod block;
pub use block::BlockPool;

/// 目录项，也负责对根目录数据块的线性扫描
mod dir_entry;
pub use dir_entry::DirEntry;
pub use dir_entry::{dir_insert, dir_lookup, dir_remove};

mod open_file;
pub use open_file::{Fd, OpenFile, OpenFileTable};
