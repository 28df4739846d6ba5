//! # 页面缓存
//!
//! 路由器只依赖 `PageCache` 的五个操作；缓存后端的存储细节与路由逻辑无关。
//! `MemoryCache` 是进程内的 LRU 实现，记录带写入时间和可选的过期时间，不支持标签。

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use log::{debug, warn};
use lru::LruCache;

use crate::exception::Exception;

/// 清理模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanMode {
    /// 删除所有记录
    All,
    /// 删除已过期的记录
    Old,
    MatchingTag,
    NotMatchingTag,
    MatchingAnyTag,
}

/// 以字符串为键的页面缓存。
///
/// 值对缓存来说是不透明的字节串，序列化由调用方负责。
#[cfg_attr(test, mockall::automock)]
pub trait PageCache: Send + Sync {
    /// 记录是否存在；存在时返回其最后写入时间
    fn test(&self, id: &str) -> Result<Option<SystemTime>, Exception>;

    fn load(&self, id: &str) -> Result<Option<Bytes>, Exception>;

    /// 写入记录。`lifetime` 为 `None` 时使用后端的默认寿命
    fn save(
        &self,
        data: Bytes,
        id: &str,
        tags: &[String],
        lifetime: Option<Duration>,
    ) -> Result<(), Exception>;

    /// 删除记录，返回记录此前是否存在
    fn remove(&self, id: &str) -> Result<bool, Exception>;

    fn clean(&self, mode: CleanMode) -> Result<(), Exception>;
}

#[derive(Clone)]
struct CacheEntry {
    content: Bytes,
    modified_time: SystemTime,
    expires: Option<SystemTime>,
}

impl CacheEntry {
    fn is_expired(&self, now: SystemTime) -> bool {
        self.expires.map_or(false, |expires| now >= expires)
    }
}

pub struct MemoryCache {
    cache: Mutex<LruCache<String, CacheEntry>>,
    default_lifetime: Option<Duration>,
}

impl MemoryCache {
    // 根据容量构造，容量为 0 时按 1 处理
    pub fn from_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            default_lifetime: None,
        }
    }

    // 设置默认寿命，None 表示永不过期
    pub fn with_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.default_lifetime = lifetime;
        self
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, CacheEntry>> {
        match self.cache.lock() {
            Ok(lock) => lock,
            Err(poisoned) => {
                warn!("缓存锁被污染，恢复并继续");
                poisoned.into_inner()
            }
        }
    }

    // 查询有效记录，过期的记录顺手删除
    fn find(&self, id: &str) -> Option<CacheEntry> {
        let mut cache = self.lock();
        let expired = match cache.get(id) {
            Some(entry) if entry.is_expired(SystemTime::now()) => true,
            Some(entry) => return Some(entry.clone()),
            None => return None,
        };
        if expired {
            debug!("缓存记录{}已过期", id);
            cache.pop(id);
        }
        None
    }
}

impl PageCache for MemoryCache {
    fn test(&self, id: &str) -> Result<Option<SystemTime>, Exception> {
        Ok(self.find(id).map(|entry| entry.modified_time))
    }

    fn load(&self, id: &str) -> Result<Option<Bytes>, Exception> {
        Ok(self.find(id).map(|entry| entry.content))
    }

    fn save(
        &self,
        data: Bytes,
        id: &str,
        tags: &[String],
        lifetime: Option<Duration>,
    ) -> Result<(), Exception> {
        if !tags.is_empty() {
            return Err(Exception::CacheFailure(
                "tags are not supported by the memory cache".to_string(),
            ));
        }
        let now = SystemTime::now();
        let entry = CacheEntry {
            content: data,
            modified_time: now,
            expires: lifetime.or(self.default_lifetime).map(|l| now + l),
        };
        self.lock().put(id.to_string(), entry);
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<bool, Exception> {
        Ok(self.lock().pop(id).is_some())
    }

    fn clean(&self, mode: CleanMode) -> Result<(), Exception> {
        let mut cache = self.lock();
        match mode {
            CleanMode::All => {
                cache.clear();
                Ok(())
            }
            CleanMode::Old => {
                let now = SystemTime::now();
                let expired: Vec<String> = cache
                    .iter()
                    .filter(|(_, entry)| entry.is_expired(now))
                    .map(|(id, _)| id.clone())
                    .collect();
                for id in expired {
                    cache.pop(&id);
                }
                Ok(())
            }
            other => Err(Exception::CacheFailure(format!(
                "clean mode {:?} is not supported by the memory cache",
                other
            ))),
        }
    }
}
