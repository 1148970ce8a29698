use super::Bitmap;

/// 文件系统对象的元信息记录
#[derive(Debug, Clone, Copy, Default)]
pub struct Inode {
    pub kind: InodeKind,
    /// 内容长度（字节）
    pub size: usize,
    /// 持有的数据块；空文件没有数据块
    pub block: Option<usize>,
    /// 引用该节点的目录项个数，归零即回收
    pub links: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InodeKind {
    #[default]
    File,
    Directory,
    /// 软链接，数据块里存目标路径
    Link,
}

/// 定容索引节点表
pub struct InodeTable {
    bitmap: Bitmap,
    slots: Vec<Inode>,
}

impl InodeTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            bitmap: Bitmap::new(capacity),
            slots: vec![Inode::default(); capacity],
        }
    }

    /// 分配一个编号最小的空槽并初始化；表满时返回 [`None`]
    pub fn alloc(&mut self, kind: InodeKind) -> Option<usize> {
        let inum = self.bitmap.alloc()?;
        self.slots[inum] = Inode {
            kind,
            size: 0,
            block: None,
            links: 1,
        };
        Some(inum)
    }

    pub fn get(&self, inum: usize) -> Option<&Inode> {
        self.bitmap.is_set(inum).then(|| &self.slots[inum])
    }

    pub fn get_mut(&mut self, inum: usize) -> Option<&mut Inode> {
        self.bitmap.is_set(inum).then(|| &mut self.slots[inum])
    }

    /// 释放节点槽。调用方必须先移交其持有的数据块。
    pub fn free(&mut self, inum: usize) {
        assert!(
            self.slots[inum].block.is_none(),
            "freeing an inode that still owns a data block"
        );
        self.bitmap.dealloc(inum);
        self.slots[inum] = Inode::default();
    }
}
