mod common;

use common::{mount, mount_with};
use flat_fs::{Error, FileStat, Geometry, MAX_FILE_SIZE};

#[test]
fn create_then_read_empty() {
    let (_, fs) = mount();
    for name in ["a", "notes.txt", "abcdefghijk"] {
        fs.create(name).unwrap();
        assert_eq!(Vec::<u8>::new(), fs.read(name).unwrap());
        assert_eq!(1, fs.list().iter().filter(|n| *n == name).count());
    }
}

#[test]
fn invalid_names() {
    let (_, fs) = mount();
    assert_eq!(Err(Error::InvalidName), fs.create(""));
    assert_eq!(Err(Error::InvalidName), fs.create("abcdefghijkl"));
    assert_eq!(Err(Error::InvalidName), fs.create("a\0b"));
    // 按字节计长度
    assert_eq!(Err(Error::InvalidName), fs.create("ééééééé"));
    assert!(fs.list().is_empty());
}

#[test]
fn duplicate_create_changes_nothing() {
    let (_, fs) = mount();
    fs.create("a.txt").unwrap();
    fs.write("a.txt", b"keep me").unwrap();
    let stat = fs.stat("a.txt").unwrap();
    let free = fs.free_blocks();

    assert_eq!(Err(Error::AlreadyExists), fs.create("a.txt"));
    assert_eq!(stat, fs.stat("a.txt").unwrap());
    assert_eq!(free, fs.free_blocks());
    assert_eq!(b"keep me".to_vec(), fs.read("a.txt").unwrap());
}

#[test]
fn write_read_across_block_boundaries() {
    let (_, fs) = mount();
    let block_size = fs.geometry().block_size;
    fs.create("f").unwrap();

    for len in [0, 1, block_size - 1, block_size, block_size + 1, 3 * block_size] {
        let content: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        fs.write("f", &content).unwrap();
        assert_eq!(content, fs.read("f").unwrap(), "length {len}");
        assert_eq!(
            FileStat {
                size: len,
                blocks: len.div_ceil(block_size).max(1),
            },
            fs.stat("f").unwrap()
        );
    }
}

#[test]
fn rewrite_releases_old_blocks() {
    let (_, fs) = mount();
    fs.create("f").unwrap();
    fs.write("f", &[7; 128 * 4]).unwrap();
    assert_eq!(6, fs.free_blocks());

    fs.write("f", b"short").unwrap();
    assert_eq!(9, fs.free_blocks());
    assert_eq!(b"short".to_vec(), fs.read("f").unwrap());
}

#[test]
fn missing_files() {
    let (_, fs) = mount();
    assert_eq!(Err(Error::NotFound), fs.read("ghost"));
    assert_eq!(Err(Error::NotFound), fs.write("ghost", b"boo"));
    assert_eq!(Err(Error::NotFound), fs.delete("ghost"));
    assert_eq!(Err(Error::NotFound), fs.stat("ghost").map(|_| ()));
}

#[test]
fn delete_frees_blocks_for_reuse() {
    let (_, fs) = mount();
    fs.create("big").unwrap();
    fs.write("big", &[1; 128 * 9]).unwrap();
    fs.create("other").unwrap();
    assert_eq!(0, fs.free_blocks());
    assert_eq!(Err(Error::InsufficientSpace), fs.create("third"));

    fs.delete("big").unwrap();
    assert_eq!(Err(Error::NotFound), fs.read("big"));
    assert_eq!(9, fs.free_blocks());

    fs.write("other", &[2; 128 * 9]).unwrap();
    assert_eq!(vec![2; 128 * 9], fs.read("other").unwrap());
    assert_eq!(1, fs.free_blocks());
}

#[test]
fn table_full() {
    let (_, fs) = mount();
    let max_files = fs.geometry().max_files;
    for i in 0..max_files {
        fs.create(&format!("file{i}")).unwrap();
    }
    assert_eq!(Err(Error::TableFull), fs.create("one-more"));
    assert_eq!(max_files, fs.list().len());

    // 删除后槽位可再用
    fs.delete("file0").unwrap();
    fs.create("one-more").unwrap();
}

#[test]
fn create_needs_a_free_block() {
    let (_, fs) = mount_with(Geometry::new(4, 2, 16).unwrap());
    fs.create("a").unwrap();
    fs.create("b").unwrap();
    assert_eq!(Err(Error::InsufficientSpace), fs.create("c"));
    assert_eq!(vec!["a", "b"], fs.list());
}

#[test]
fn oversized_write_keeps_old_content() {
    let (_, fs) = mount();
    fs.create("f").unwrap();
    fs.write("f", b"original").unwrap();
    let free = fs.free_blocks();

    let too_big = vec![9; 128 * 10 + 1];
    assert_eq!(Err(Error::InsufficientSpace), fs.write("f", &too_big));
    assert_eq!(b"original".to_vec(), fs.read("f").unwrap());
    assert_eq!(free, fs.free_blocks());
}

#[test]
fn write_beyond_size_field() {
    let (_, fs) = mount_with(Geometry::new(1, 600, 128).unwrap());
    fs.create("f").unwrap();
    assert_eq!(
        Err(Error::FileTooLarge),
        fs.write("f", &vec![0; MAX_FILE_SIZE + 1])
    );
    fs.write("f", &vec![3; MAX_FILE_SIZE]).unwrap();
    assert_eq!(MAX_FILE_SIZE, fs.read("f").unwrap().len());
}

#[test]
fn fragmented_blocks_read_back_in_order() {
    let (_, fs) = mount();
    for name in ["a", "b", "c", "d"] {
        fs.create(name).unwrap();
    }
    // 块 0..4 依次被占用，删掉 b、d 后留下空洞
    fs.delete("b").unwrap();
    fs.delete("d").unwrap();

    let content: Vec<u8> = (0..128 * 5).map(|i| (i / 128) as u8 + b'A').collect();
    fs.write("a", &content).unwrap();
    assert_eq!(content, fs.read("a").unwrap());
    assert_eq!(Vec::<u8>::new(), fs.read("c").unwrap());
}

#[test]
fn end_to_end() {
    let (_, fs) = mount();
    fs.create("a.txt").unwrap();
    fs.write("a.txt", b"hello world").unwrap();
    assert_eq!(b"hello world".to_vec(), fs.read("a.txt").unwrap());
    fs.delete("a.txt").unwrap();
    assert_eq!(Err(Error::NotFound), fs.read("a.txt"));
    assert!(fs.list().is_empty());
}
