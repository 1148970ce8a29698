/// 打开文件的句柄，关闭之后失效；值即打开文件表的槽位下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fd(pub(crate) usize);

/// 一次打开会话：指向索引节点的弱引用加上独立的读写游标
#[derive(Debug, Clone, Copy)]
pub struct OpenFile {
    pub inum: usize,
    /// 文件内的偏移量
    pub offset: usize,
}

/// 定容打开文件表，句柄即槽位下标
pub struct OpenFileTable {
    slots: Vec<Option<OpenFile>>,
}

impl OpenFileTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    /// 占用编号最小的空槽；表满时返回 [`None`]
    pub fn open(&mut self, inum: usize, offset: usize) -> Option<Fd> {
        let fd = self.slots.iter().position(Option::is_none)?;
        self.slots[fd] = Some(OpenFile { inum, offset });
        Some(Fd(fd))
    }

    pub fn get(&self, fd: Fd) -> Option<&OpenFile> {
        self.slots.get(fd.0)?.as_ref()
    }

    pub fn get_mut(&mut self, fd: Fd) -> Option<&mut OpenFile> {
        self.slots.get_mut(fd.0)?.as_mut()
    }

    pub fn close(&mut self, fd: Fd) -> Option<OpenFile> {
        self.slots.get_mut(fd.0)?.take()
    }

    /// 是否有会话正引用该索引节点
    pub fn is_open(&self, inum: usize) -> bool {
        self.slots
            .iter()
            .flatten()
            .any(|open_file| open_file.inum == inum)
    }
}
