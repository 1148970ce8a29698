/// 初始化时一次性固定的容量参数
#[derive(Debug, Clone, Copy)]
pub struct FsParams {
    pub max_inode_count: usize,
    pub max_block_count: usize,
    pub max_open_files: usize,
    /// 数据块大小（字节），同时决定根目录能容纳的目录项数
    pub block_size: usize,
}

impl Default for FsParams {
    #[inline]
    fn default() -> Self {
        Self {
            max_inode_count: 64,
            max_block_count: 1024,
            max_open_files: 16,
            block_size: 1024,
        }
    }
}
