//! 结构锁与文件锁所用的读写锁。
//!
//! 开启 `std` 特性时，争用者在重试之间让出时间片；否则原地自旋。

#[cfg(feature = "std")]
pub(crate) type Relax = spin::Yield;
#[cfg(not(feature = "std"))]
pub(crate) type Relax = spin::Spin;

pub(crate) type RwLock<T> = spin::rwlock::RwLock<T, Relax>;
pub(crate) type RwLockWriteGuard<'a, T> = spin::rwlock::RwLockWriteGuard<'a, T, Relax>;

/// 写者优先地获取写锁。
///
/// 先占住升级位，新到的读者就拿不到锁，再等已有的读者退出。
/// 同一时刻只有一个写者能占住升级位，其余写者在此排队。
#[inline]
pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.upgradeable_read().upgrade()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_writer_blocks_new_readers() {
        let lock = RwLock::new(0);
        let reader = lock.read();
        let pending = lock.upgradeable_read();

        assert!(lock.try_read().is_none());
        drop(reader);

        *pending.upgrade() += 1;
        assert_eq!(1, *lock.read());
    }
}
