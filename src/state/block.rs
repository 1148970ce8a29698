use super::Bitmap;

/// 定容数据块池，一个数据块同一时刻至多属于一个索引节点
pub struct BlockPool {
    bitmap: Bitmap,
    data: Vec<u8>,
    block_size: usize,
}

impl BlockPool {
    pub fn new(capacity: usize, block_size: usize) -> Self {
        Self {
            bitmap: Bitmap::new(capacity),
            data: vec![0; capacity * block_size],
            block_size,
        }
    }

    /// 分配编号最小的空闲块并清零；池满时返回 [`None`]
    pub fn alloc(&mut self) -> Option<usize> {
        let bnum = self.bitmap.alloc()?;
        self.block_mut(bnum).fill(0);
        Some(bnum)
    }

    pub fn free(&mut self, bnum: usize) {
        self.bitmap.dealloc(bnum);
    }

    pub fn get(&self, bnum: usize) -> Option<&[u8]> {
        self.bitmap
            .is_set(bnum)
            .then(|| &self.data[bnum * self.block_size..(bnum + 1) * self.block_size])
    }

    pub fn get_mut(&mut self, bnum: usize) -> Option<&mut [u8]> {
        self.bitmap.is_set(bnum).then(|| self.block_mut(bnum))
    }

    #[inline]
    fn block_mut(&mut self, bnum: usize) -> &mut [u8] {
        &mut self.data[bnum * self.block_size..(bnum + 1) * self.block_size]
    }
}
