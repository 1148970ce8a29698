use core::{ptr, slice};

use crate::error::{Error, Result};

/// 根目录下一个文件系统项的元信息
#[derive(Debug, Default, Clone)]
#[repr(C)]
pub struct DirEntry {
    // 最后一字节留给 \0；首字节为 0 表示空槽
    name: [u8; Self::NAME_MAX_LEN + 1],
    inode_id: u32,
}

impl DirEntry {
    /// 元信息大小恒为32字节
    pub const SIZE: usize = 32;

    pub const NAME_MAX_LEN: usize = 27;

    #[inline]
    pub fn new(name: &str, inode_id: u32) -> Self {
        let bytes = name.as_bytes();
        let mut name = [0; Self::NAME_MAX_LEN + 1];
        name[..bytes.len()].copy_from_slice(bytes);

        Self { name, inode_id }
    }

    pub fn name(&self) -> &str {
        let len = self.name.iter().position(|&c| c == 0).unwrap();
        core::str::from_utf8(&self.name[..len]).unwrap()
    }

    #[inline]
    pub fn inode_id(&self) -> u32 {
        self.inode_id
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(ptr::from_ref(self).cast(), Self::SIZE) }
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(ptr::from_mut(self).cast(), Self::SIZE) }
    }
}

/// 逐项扫描目录数据块，对每个已占用槽调用 `f`，返回首个 [`Some`]
fn scan<V>(block: &[u8], mut f: impl FnMut(usize, &DirEntry) -> Option<V>) -> Option<V> {
    let mut dir_entry = DirEntry::default();

    for offset in (0..block.len() - block.len() % DirEntry::SIZE).step_by(DirEntry::SIZE) {
        dir_entry
            .as_bytes_mut()
            .copy_from_slice(&block[offset..offset + DirEntry::SIZE]);
        if dir_entry.name[0] == 0 {
            continue;
        }
        if let Some(v) = f(offset, &dir_entry) {
            return Some(v);
        }
    }

    None
}

/// 按名字查找目录项，返回其索引节点号
pub fn dir_lookup(block: &[u8], name: &str) -> Option<u32> {
    scan(block, |_, entry| (entry.name() == name).then(|| entry.inode_id()))
}

/// 写入新目录项。名字重复、目录已满时失败。
pub fn dir_insert(block: &mut [u8], name: &str, inode_id: u32) -> Result<()> {
    if dir_lookup(block, name).is_some() {
        return Err(Error::AlreadyExists);
    }

    // 空槽不做整理，直接复用被删除项留下的洞
    let mut free = None;
    for offset in (0..block.len() - block.len() % DirEntry::SIZE).step_by(DirEntry::SIZE) {
        if block[offset] == 0 {
            free = Some(offset);
            break;
        }
    }

    let offset = free.ok_or(Error::Exhausted)?;
    let dir_entry = DirEntry::new(name, inode_id);
    block[offset..offset + DirEntry::SIZE].copy_from_slice(dir_entry.as_bytes());
    Ok(())
}

/// 按名字删除目录项并返回其索引节点号
pub fn dir_remove(block: &mut [u8], name: &str) -> Option<u32> {
    let (offset, inode_id) = scan(block, |offset, entry| {
        (entry.name() == name).then(|| (offset, entry.inode_id()))
    })?;

    block[offset..offset + DirEntry::SIZE].fill(0);
    Some(inode_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_lookup_remove() {
        let mut block = vec![0u8; 128]; // 4 个槽

        dir_insert(&mut block, "a", 3).unwrap();
        dir_insert(&mut block, "b", 7).unwrap();
        assert_eq!(dir_lookup(&block, "a"), Some(3));
        assert_eq!(dir_lookup(&block, "b"), Some(7));
        assert_eq!(dir_lookup(&block, "c"), None);

        assert_eq!(dir_insert(&mut block, "a", 9), Err(Error::AlreadyExists));

        assert_eq!(dir_remove(&mut block, "a"), Some(3));
        assert_eq!(dir_lookup(&block, "a"), None);
        assert_eq!(dir_remove(&mut block, "a"), None);
    }

    #[test]
    fn capacity_and_slot_reuse() {
        let mut block = vec![0u8; 2 * DirEntry::SIZE];

        dir_insert(&mut block, "x", 1).unwrap();
        dir_insert(&mut block, "y", 2).unwrap();
        assert_eq!(dir_insert(&mut block, "z", 3), Err(Error::Exhausted));

        // 删除腾出的槽可被复用
        dir_remove(&mut block, "x").unwrap();
        dir_insert(&mut block, "z", 3).unwrap();
        assert_eq!(dir_lookup(&block, "z"), Some(3));
    }

    #[test]
    fn longest_name_round_trips() {
        let name = "n".repeat(DirEntry::NAME_MAX_LEN);
        let entry = DirEntry::new(&name, 42);
        assert_eq!(entry.name(), name);
        assert_eq!(entry.inode_id(), 42);
    }
}
