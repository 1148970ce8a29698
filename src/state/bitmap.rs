/// 空闲/占用位图，索引节点表与数据块池共用的分配器。
///
/// 分配策略为首次适应：总是返回编号最小的空闲位。
pub struct Bitmap {
    words: Vec<u64>,
    len: usize,
}

const BITS_PER_WORD: usize = u64::BITS as usize;

impl Bitmap {
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(BITS_PER_WORD)],
            len,
        }
    }

    /// 分配编号最小的空闲位；全满时返回 [`None`]
    pub fn alloc(&mut self) -> Option<usize> {
        let (index, word) = self
            .words
            .iter_mut()
            .enumerate()
            .find(|(_, word)| **word != u64::MAX)?;

        let bit = (!*word).trailing_zeros() as usize;
        let pos = index * BITS_PER_WORD + bit;
        if pos >= self.len {
            return None;
        }

        *word |= 1 << bit;
        Some(pos)
    }

    /// 释放一个已分配的位。重复释放属于调用方的逻辑错误，直接断言失败。
    pub fn dealloc(&mut self, pos: usize) {
        assert!(pos < self.len, "bitmap position out of range");
        let word = &mut self.words[pos / BITS_PER_WORD];
        let mask = 1 << (pos % BITS_PER_WORD);
        assert_ne!(*word & mask, 0, "deallocating a free bit");
        *word &= !mask;
    }

    #[inline]
    pub fn is_set(&self, pos: usize) -> bool {
        pos < self.len && self.words[pos / BITS_PER_WORD] & (1 << (pos % BITS_PER_WORD)) != 0
    }
}
