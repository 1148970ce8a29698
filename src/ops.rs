//! # 操作层
//!
//! 把索引节点表、数据块池、目录索引和打开文件表
//! 组合成对外的文件操作。
//!
//! 并发约定：一把全局锁串行化所有结构性修改，
//! 包括名字解析、分配与释放、目录项增删以及句柄的占用；
//! 每个句柄的读写同样经过这把锁。
//! 各内部辅助函数都假定调用方已经持锁。

use std::fs::File;
use std::io;
use std::io::Read;
use std::path::Path;

use enumflags2::bitflags;
use enumflags2::BitFlags;
use log::{debug, trace};
use spin::Mutex;

use crate::error::{Error, Result};
use crate::params::FsParams;
use crate::state::{dir_insert, dir_lookup, dir_remove};
use crate::state::{BlockPool, DirEntry, Fd, InodeKind, InodeTable, OpenFileTable};
use crate::ROOT_INUM;

/// 内存文件系统，所有状态都在这个上下文对象里，
/// 由调用方持有，弃置即拆除
pub struct FlatFs {
    state: Mutex<FsState>,
}

#[rustfmt::skip]
#[allow(clippy::upper_case_acronyms)]
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFlag {
    /// 文件不存在则创建
    CREATE = 0b001,
    /// 先清空文件，再交给用户
    TRUNC  = 0b010,
    /// 游标起始于文件末尾
    APPEND = 0b100,
}

impl OpenFlag {
    // enumflags2拒绝值为0的标志
    /// 只读
    #[inline]
    pub fn read_only() -> BitFlags<OpenFlag> {
        BitFlags::empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub inode: usize,
    pub kind: InodeKind,
    pub links: u32,
    pub size: usize,
}

impl FlatFs {
    /// 按给定容量初始化文件系统，并在固定节点号上建立根目录
    pub fn new(params: FsParams) -> Result<Self> {
        assert!(
            params.block_size >= DirEntry::SIZE,
            "block size cannot hold a single directory entry"
        );

        let mut state = FsState {
            inodes: InodeTable::new(params.max_inode_count),
            blocks: BlockPool::new(params.max_block_count, params.block_size),
            open_files: OpenFileTable::new(params.max_open_files),
            block_size: params.block_size,
        };

        let root = state.create_inode(InodeKind::Directory)?;
        assert_eq!(root, ROOT_INUM, "root dir must occupy the well-known inode");

        debug!("flat-fs up: {params:?}");
        Ok(Self {
            state: Mutex::new(state),
        })
    }

    /// 显式拆除整个文件系统，所有句柄随之失效
    #[inline]
    pub fn destroy(self) {}

    /// 打开 `/name` 形式的路径，返回带独立游标的句柄。
    ///
    /// 软链接在这里解析，且只解析一跳；
    /// 目标名字已不存在时整个调用以 [`Error::BrokenLink`] 失败。
    pub fn open(&self, path: &str, flags: BitFlags<OpenFlag>) -> Result<Fd> {
        self.state.lock().open(path, flags)
    }

    /// 释放句柄。文件内容不受影响。
    pub fn close(&self, fd: Fd) -> Result<()> {
        self.state.lock().close(fd)
    }

    /// 从游标处读入 `buf`，返回实际读取的字节数；文件尾返回 0
    pub fn read(&self, fd: Fd, buf: &mut [u8]) -> Result<usize> {
        self.state.lock().read(fd, buf)
    }

    /// 从游标处写出 `buf`，返回实际写入的字节数。
    ///
    /// 每个文件只有一个数据块，超出块内剩余空间的部分被悄悄截断。
    pub fn write(&self, fd: Fd, buf: &[u8]) -> Result<usize> {
        self.state.lock().write(fd, buf)
    }

    /// 为既有文件增加一个名字（硬链接）
    pub fn link(&self, target: &str, link_name: &str) -> Result<()> {
        self.state.lock().link(target, link_name)
    }

    /// 创建软链接，目标路径存在与否在打开时才检查
    pub fn symlink(&self, target: &str, link_name: &str) -> Result<()> {
        self.state.lock().symlink(target, link_name)
    }

    /// 删除一个名字；最后一个名字删除后回收索引节点与数据块。
    /// 文件仍被打开时拒绝删除。
    pub fn unlink(&self, path: &str) -> Result<()> {
        self.state.lock().unlink(path)
    }

    /// 查看目录项指向的节点元信息，不跟随软链接
    pub fn stat(&self, path: &str) -> Result<Stat> {
        self.state.lock().stat(path)
    }

    /// 把宿主文件系统上的一个文件整体拷入 `dest_path`。
    ///
    /// 目标以 CREATE|TRUNC 打开，按块大小分片流式写入；
    /// 写入量对不上即中止，已写入的部分保持原样。
    pub fn copy_from_host(&self, source: impl AsRef<Path>, dest_path: &str) -> Result<()> {
        let mut source = File::open(source).map_err(|_| Error::CopyFailed)?;

        let fd = self.open(dest_path, OpenFlag::CREATE | OpenFlag::TRUNC)?;
        let mut buffer = vec![0u8; self.state.lock().block_size];

        loop {
            let read = match source.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => {
                    let _ = self.close(fd);
                    return Err(Error::CopyFailed);
                }
            };

            match self.write(fd, &buffer[..read]) {
                Ok(written) if written == read => {}
                _ => {
                    let _ = self.close(fd);
                    return Err(Error::CopyFailed);
                }
            }
        }

        self.close(fd)
    }
}

/// 全局锁之下的共享状态
struct FsState {
    inodes: InodeTable,
    blocks: BlockPool,
    open_files: OpenFileTable,
    block_size: usize,
}

impl FsState {
    fn open(&mut self, path: &str, flags: BitFlags<OpenFlag>) -> Result<Fd> {
        let name = split_path(path)?;

        let (inum, offset) = match self.lookup(name) {
            Some(inum) => {
                let inum = self.resolve_link(inum)?;

                if flags.contains(OpenFlag::TRUNC) {
                    self.truncate(inum);
                }

                let size = self.inode(inum).size;
                let offset = flags.contains(OpenFlag::APPEND).then_some(size).unwrap_or(0);
                (inum, offset)
            }
            None if flags.contains(OpenFlag::CREATE) => {
                let inum = self.create_inode(InodeKind::File)?;
                if let Err(e) = dir_insert(self.root_block_mut(), name, inum as u32) {
                    self.delete_inode(inum);
                    return Err(e);
                }
                debug!("created {path}: inode {inum}");
                (inum, 0)
            }
            None => return Err(Error::NotFound),
        };

        // 注意：走到这里句柄耗尽的话，刚创建的文件保持已创建状态，
        // 不回滚。外部依赖这一行为，改动前先看住相关测试。
        self.open_files
            .open(inum, offset)
            .ok_or(Error::TooManyOpenFiles)
    }

    fn close(&mut self, fd: Fd) -> Result<()> {
        self.open_files
            .close(fd)
            .map(drop)
            .ok_or(Error::InvalidHandle)
    }

    fn read(&mut self, fd: Fd, buf: &mut [u8]) -> Result<usize> {
        let open_file = *self.open_files.get(fd).ok_or(Error::InvalidHandle)?;
        let inode = *self.inode(open_file.inum);

        // 别的句柄并发截断后游标可能越过文件尾，此时读到 0 字节
        let to_read = buf.len().min(inode.size.saturating_sub(open_file.offset));
        if to_read > 0 {
            let bnum = inode.block.expect("non-empty file must own a data block");
            let block = self.blocks.get(bnum).expect("data block deleted mid-read");
            buf[..to_read].copy_from_slice(&block[open_file.offset..open_file.offset + to_read]);

            self.open_file_mut(fd).offset += to_read;
        }

        trace!("read {to_read} bytes from inode {}", open_file.inum);
        Ok(to_read)
    }

    fn write(&mut self, fd: Fd, buf: &[u8]) -> Result<usize> {
        let open_file = *self.open_files.get(fd).ok_or(Error::InvalidHandle)?;

        // 单文件单数据块：只写得下块内剩余空间
        let to_write = buf.len().min(self.block_size - open_file.offset);
        if to_write == 0 {
            return Ok(0);
        }

        let bnum = match self.inode(open_file.inum).block {
            Some(bnum) => bnum,
            // 数据块推迟到首次写入才分配
            None => {
                let bnum = self.blocks.alloc().ok_or(Error::Exhausted)?;
                self.inode_mut(open_file.inum).block = Some(bnum);
                bnum
            }
        };

        let block = self.blocks.get_mut(bnum).expect("data block deleted mid-write");
        block[open_file.offset..open_file.offset + to_write].copy_from_slice(&buf[..to_write]);

        let end = open_file.offset + to_write;
        let inode = self.inode_mut(open_file.inum);
        if end > inode.size {
            inode.size = end;
        }
        self.open_file_mut(fd).offset = end;

        trace!("wrote {to_write} bytes to inode {}", open_file.inum);
        Ok(to_write)
    }

    fn link(&mut self, target: &str, link_name: &str) -> Result<()> {
        let target_name = split_path(target)?;
        let new_name = split_path(link_name)?;

        let inum = self.lookup(target_name).ok_or(Error::NotFound)?;
        // 不允许对软链接建立硬链接
        if self.inode(inum).kind == InodeKind::Link {
            return Err(Error::InvalidType);
        }

        dir_insert(self.root_block_mut(), new_name, inum as u32)?;
        self.inode_mut(inum).links += 1;

        debug!("linked {link_name} -> {target}: inode {inum}");
        Ok(())
    }

    fn symlink(&mut self, target: &str, link_name: &str) -> Result<()> {
        split_path(target)?;
        let name = split_path(link_name)?;

        let inum = self.create_inode(InodeKind::Link)?;
        let Some(bnum) = self.blocks.alloc() else {
            self.delete_inode(inum);
            return Err(Error::Exhausted);
        };
        self.blocks.get_mut(bnum).expect("block just allocated")[..target.len()]
            .copy_from_slice(target.as_bytes());

        let inode = self.inode_mut(inum);
        inode.block = Some(bnum);
        inode.size = target.len();

        if let Err(e) = dir_insert(self.root_block_mut(), name, inum as u32) {
            self.delete_inode(inum);
            return Err(e);
        }

        debug!("symlinked {link_name} -> {target}: inode {inum}");
        Ok(())
    }

    fn unlink(&mut self, path: &str) -> Result<()> {
        let name = split_path(path)?;
        let inum = self.lookup(name).ok_or(Error::NotFound)?;

        // 还有句柄在引用时拒绝删除，弱引用才不会指向空槽
        if self.open_files.is_open(inum) {
            return Err(Error::Busy);
        }

        dir_remove(self.root_block_mut(), name).expect("entry was resolved under the same lock");

        let inode = self.inode_mut(inum);
        inode.links -= 1;
        let links = inode.links;

        if links == 0 {
            self.delete_inode(inum);
            debug!("unlinked {path}: inode {inum} reclaimed");
        } else {
            debug!("unlinked {path}: inode {inum} still has {links} links");
        }
        Ok(())
    }

    fn stat(&self, path: &str) -> Result<Stat> {
        let name = split_path(path)?;
        let inum = self.lookup(name).ok_or(Error::NotFound)?;
        let inode = self.inode(inum);

        Ok(Stat {
            inode: inum,
            kind: inode.kind,
            links: inode.links,
            size: inode.size,
        })
    }
}

impl FsState {
    /// 在根目录索引中解析名字。只读，调用方须已持锁。
    fn lookup(&self, name: &str) -> Option<usize> {
        dir_lookup(self.root_block(), name).map(|inum| inum as usize)
    }

    /// 软链接只解析一跳：取出存储的目标路径重新查一次名字。
    ///
    /// 链到链的情况下句柄会落在链接节点上，其内容可能已被
    /// 截断或改写得不成路径，这些情况一律按失效链接处理。
    fn resolve_link(&self, inum: usize) -> Result<usize> {
        let inode = self.inode(inum);
        if inode.kind != InodeKind::Link {
            return Ok(inum);
        }

        let Some(bnum) = inode.block else {
            return Err(Error::BrokenLink);
        };
        let block = self.blocks.get(bnum).expect("symlink target block deleted");
        let Ok(target) = core::str::from_utf8(&block[..inode.size]) else {
            return Err(Error::BrokenLink);
        };
        let name = split_path(target).map_err(|_| Error::BrokenLink)?;

        self.lookup(name).ok_or(Error::BrokenLink)
    }

    /// 分配并初始化新索引节点；目录节点即刻取得自己的目录块
    fn create_inode(&mut self, kind: InodeKind) -> Result<usize> {
        let inum = self.inodes.alloc(kind).ok_or(Error::Exhausted)?;

        if kind == InodeKind::Directory {
            let Some(bnum) = self.blocks.alloc() else {
                self.inodes.free(inum);
                return Err(Error::Exhausted);
            };
            self.inode_mut(inum).block = Some(bnum);
        }

        Ok(inum)
    }

    /// 归还索引节点连同其持有的数据块
    fn delete_inode(&mut self, inum: usize) {
        let inode = self.inodes.get_mut(inum).expect("deleting a freed inode");
        if let Some(bnum) = inode.block.take() {
            self.blocks.free(bnum);
        }
        self.inodes.free(inum);
    }

    /// 释放数据块并把大小归零
    fn truncate(&mut self, inum: usize) {
        let inode = self.inode_mut(inum);
        if let Some(bnum) = inode.block.take() {
            inode.size = 0;
            self.blocks.free(bnum);
        }
    }

    fn root_block(&self) -> &[u8] {
        let root = self.inodes.get(ROOT_INUM).expect("root dir inode must exist");
        let bnum = root.block.expect("root dir must own its directory block");
        self.blocks.get(bnum).expect("root directory block deleted")
    }

    fn root_block_mut(&mut self) -> &mut [u8] {
        let root = self.inodes.get(ROOT_INUM).expect("root dir inode must exist");
        let bnum = root.block.expect("root dir must own its directory block");
        self.blocks
            .get_mut(bnum)
            .expect("root directory block deleted")
    }

    /// 目录项与句柄指向的节点必须存在，不存在即是别处破坏了不变量
    fn inode(&self, inum: usize) -> &crate::state::Inode {
        self.inodes
            .get(inum)
            .expect("resolved inode slot is not allocated")
    }

    fn inode_mut(&mut self, inum: usize) -> &mut crate::state::Inode {
        self.inodes
            .get_mut(inum)
            .expect("resolved inode slot is not allocated")
    }

    fn open_file_mut(&mut self, fd: Fd) -> &mut crate::state::OpenFile {
        self.open_files
            .get_mut(fd)
            .expect("open file entry vanished mid-operation")
    }
}

/// 校验 `/name` 形式的路径并取出名字部分
fn split_path(path: &str) -> Result<&str> {
    let name = path.strip_prefix('/').ok_or(Error::InvalidPath)?;
    if name.is_empty() || name.len() > DirEntry::NAME_MAX_LEN || name.bytes().any(|b| b == 0) {
        return Err(Error::InvalidPath);
    }
    Ok(name)
}
