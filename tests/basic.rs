use flat_fs::{Error, FlatFs, FsParams, InodeKind, OpenFlag};

#[test]
fn create_close_reopen_yields_empty_file() {
    let fs = FlatFs::new(FsParams::default()).unwrap();

    let fd = fs.open("/file", OpenFlag::CREATE.into()).unwrap();
    fs.close(fd).unwrap();

    let fd = fs.open("/file", OpenFlag::read_only()).unwrap();
    let mut buffer = [0u8; 16];
    assert_eq!(fs.read(fd, &mut buffer).unwrap(), 0);
    fs.close(fd).unwrap();

    let stat = fs.stat("/file").unwrap();
    assert_eq!(stat.kind, InodeKind::File);
    assert_eq!(stat.size, 0);
    assert_eq!(stat.links, 1);

    fs.destroy();
}

#[test]
fn write_read_round_trip() {
    let fs = FlatFs::new(FsParams::default()).unwrap();
    let contents = b"some bytes worth keeping";

    let fd = fs.open("/file", OpenFlag::CREATE.into()).unwrap();
    assert_eq!(fs.write(fd, contents).unwrap(), contents.len());
    fs.close(fd).unwrap();

    let fd = fs.open("/file", OpenFlag::read_only()).unwrap();
    let mut buffer = [0u8; 64];
    assert_eq!(fs.read(fd, &mut buffer).unwrap(), contents.len());
    assert_eq!(&buffer[..contents.len()], contents);
    // 到达文件尾后继续读返回 0
    assert_eq!(fs.read(fd, &mut buffer).unwrap(), 0);
    fs.close(fd).unwrap();
}

#[test]
fn cursor_advances_across_partial_reads() {
    let fs = FlatFs::new(FsParams::default()).unwrap();

    let fd = fs.open("/file", OpenFlag::CREATE.into()).unwrap();
    fs.write(fd, b"abcdef").unwrap();
    fs.close(fd).unwrap();

    let fd = fs.open("/file", OpenFlag::read_only()).unwrap();
    let mut buffer = [0u8; 2];
    for chunk in [b"ab", b"cd", b"ef"] {
        assert_eq!(fs.read(fd, &mut buffer).unwrap(), 2);
        assert_eq!(&buffer, chunk);
    }
    assert_eq!(fs.read(fd, &mut buffer).unwrap(), 0);
    fs.close(fd).unwrap();
}

#[test]
fn write_is_capped_at_block_capacity() {
    let params = FsParams {
        block_size: 64,
        ..FsParams::default()
    };
    let fs = FlatFs::new(params).unwrap();

    let fd = fs.open("/big", OpenFlag::CREATE.into()).unwrap();
    let payload = [7u8; 100];
    // 超出单块容量的部分被悄悄截断
    assert_eq!(fs.write(fd, &payload).unwrap(), 64);
    assert_eq!(fs.write(fd, &payload).unwrap(), 0);
    fs.close(fd).unwrap();

    assert_eq!(fs.stat("/big").unwrap().size, 64);
}

#[test]
fn append_mode_starts_at_end() {
    let fs = FlatFs::new(FsParams::default()).unwrap();

    let fd = fs.open("/log", OpenFlag::CREATE.into()).unwrap();
    fs.write(fd, b"first").unwrap();
    fs.close(fd).unwrap();

    let fd = fs.open("/log", OpenFlag::APPEND.into()).unwrap();
    fs.write(fd, b" second").unwrap();
    fs.close(fd).unwrap();

    let fd = fs.open("/log", OpenFlag::read_only()).unwrap();
    let mut buffer = [0u8; 32];
    let read = fs.read(fd, &mut buffer).unwrap();
    assert_eq!(&buffer[..read], b"first second");
    fs.close(fd).unwrap();
}

#[test]
fn overwrite_does_not_shrink_size() {
    let fs = FlatFs::new(FsParams::default()).unwrap();

    let fd = fs.open("/file", OpenFlag::CREATE.into()).unwrap();
    fs.write(fd, b"hello world").unwrap();
    fs.close(fd).unwrap();

    // 不带 APPEND 打开，游标回到 0，覆盖前缀
    let fd = fs.open("/file", OpenFlag::read_only()).unwrap();
    fs.write(fd, b"HELLO").unwrap();
    fs.close(fd).unwrap();

    let fd = fs.open("/file", OpenFlag::read_only()).unwrap();
    let mut buffer = [0u8; 32];
    let read = fs.read(fd, &mut buffer).unwrap();
    assert_eq!(&buffer[..read], b"HELLO world");
    fs.close(fd).unwrap();
}

#[test]
fn trunc_discards_previous_contents() {
    let fs = FlatFs::new(FsParams::default()).unwrap();

    let fd = fs.open("/file", OpenFlag::CREATE.into()).unwrap();
    fs.write(fd, b"to be discarded").unwrap();
    fs.close(fd).unwrap();

    let fd = fs.open("/file", OpenFlag::TRUNC.into()).unwrap();
    let mut buffer = [0u8; 32];
    assert_eq!(fs.read(fd, &mut buffer).unwrap(), 0);
    fs.close(fd).unwrap();

    assert_eq!(fs.stat("/file").unwrap().size, 0);
}

#[test]
fn invalid_paths_are_rejected() {
    let fs = FlatFs::new(FsParams::default()).unwrap();

    for path in ["", "/", "relative", "no/slash"] {
        assert_eq!(
            fs.open(path, OpenFlag::CREATE.into()),
            Err(Error::InvalidPath),
            "path {path:?} must be rejected"
        );
    }

    let too_long = format!("/{}", "n".repeat(flat_fs::NAME_MAX_LEN + 1));
    assert_eq!(
        fs.open(&too_long, OpenFlag::CREATE.into()),
        Err(Error::InvalidPath)
    );

    assert_eq!(fs.unlink("x"), Err(Error::InvalidPath));
    assert_eq!(fs.link("/a", "b"), Err(Error::InvalidPath));
}

#[test]
fn missing_file_without_create_is_not_found() {
    let fs = FlatFs::new(FsParams::default()).unwrap();
    assert_eq!(
        fs.open("/missing", OpenFlag::read_only()),
        Err(Error::NotFound)
    );
    assert_eq!(fs.unlink("/missing"), Err(Error::NotFound));
    assert_eq!(fs.stat("/missing"), Err(Error::NotFound));
}

#[test]
fn stale_handles_are_rejected() {
    let fs = FlatFs::new(FsParams::default()).unwrap();

    let fd = fs.open("/file", OpenFlag::CREATE.into()).unwrap();
    fs.close(fd).unwrap();

    assert_eq!(fs.close(fd), Err(Error::InvalidHandle));
    assert_eq!(fs.read(fd, &mut [0u8; 4]), Err(Error::InvalidHandle));
    assert_eq!(fs.write(fd, b"x"), Err(Error::InvalidHandle));
}

#[test]
fn handles_keep_independent_cursors() {
    let fs = FlatFs::new(FsParams::default()).unwrap();

    let writer = fs.open("/file", OpenFlag::CREATE.into()).unwrap();
    fs.write(writer, b"0123456789").unwrap();

    let a = fs.open("/file", OpenFlag::read_only()).unwrap();
    let b = fs.open("/file", OpenFlag::read_only()).unwrap();

    let mut buffer = [0u8; 4];
    fs.read(a, &mut buffer).unwrap();
    assert_eq!(&buffer, b"0123");
    fs.read(b, &mut buffer).unwrap();
    assert_eq!(&buffer, b"0123");
    fs.read(a, &mut buffer).unwrap();
    assert_eq!(&buffer, b"4567");

    for fd in [writer, a, b] {
        fs.close(fd).unwrap();
    }
}
