// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由解析缓存
//!
//! 在页面缓存中用唯一的 id `routes` 保存整张“规范键 → 解析结果”表（serde_json 序列化）。
//! 从页面缓存的角度看，只有一条记录保存全部已解析的路由。
//!
//! ## 一致性
//! 更新需要读出整张表、修改一项、再整体写回。这个读-改-写序列在进程内由互斥锁串行化，
//! 所以同一进程中的并发解析不会丢失彼此的更新。多个进程共享同一外部缓存时，
//! 仍然会在整表粒度上出现后写者覆盖前写者的情况。
//!
//! ## 容错
//! 缓存只是优化层：读写失败、表内容无法解码都只记录日志，从不让解析失败。

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use log::{debug, warn};
use serde_derive::{Deserialize, Serialize};

use crate::{
    cache::{CleanMode, PageCache},
    exception::Exception,
    param::CACHE_INDEX_ROUTES,
};

/// 缓存中的一条解析结果
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CachedRoute {
    pub file: String,
    #[serde(default)]
    pub not_found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

type RouteIndex = BTreeMap<String, CachedRoute>;

/// 写回策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// 只缓存成功的解析（默认）
    SuccessesOnly,
    /// 未找到的解析也缓存；路由表修正之前，过时的未找到结果会一直留在缓存中
    All,
}

impl CachePolicy {
    pub fn from_cache_all(cache_all: bool) -> Self {
        match cache_all {
            true => CachePolicy::All,
            false => CachePolicy::SuccessesOnly,
        }
    }

    fn admits(&self, not_found: bool) -> bool {
        match self {
            CachePolicy::All => true,
            CachePolicy::SuccessesOnly => !not_found,
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy::SuccessesOnly
    }
}

pub struct ResolutionCache {
    backend: Arc<dyn PageCache>,
    policy: CachePolicy,
    write_lock: Mutex<()>,
}

impl ResolutionCache {
    pub fn new(backend: Arc<dyn PageCache>, policy: CachePolicy) -> Self {
        Self {
            backend,
            policy,
            write_lock: Mutex::new(()),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn backend(&self) -> &Arc<dyn PageCache> {
        &self.backend
    }

    /// 查询规范键对应的缓存结果。任何后端错误都视为未命中
    pub fn lookup(&self, key: &str) -> Option<CachedRoute> {
        self.load_index()?.remove(key)
    }

    /// 按写回策略记录一条解析结果，返回是否真正写入了后端
    pub fn record(&self, key: &str, route: CachedRoute) -> bool {
        if !self.policy.admits(route.not_found) {
            debug!("写回策略{:?}不缓存未找到的路由{}", self.policy, key);
            return false;
        }

        let _guard = match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("路由缓存写锁被污染，恢复并继续");
                poisoned.into_inner()
            }
        };

        let mut index = self.load_index().unwrap_or_default();
        index.insert(key.to_string(), route);
        let data = match serde_json::to_vec(&index) {
            Ok(d) => d,
            Err(e) => {
                warn!("无法序列化路由缓存：{}", e);
                return false;
            }
        };
        match self
            .backend
            .save(Bytes::from(data), CACHE_INDEX_ROUTES, &[], None)
        {
            Ok(()) => {
                debug!("路由{}已写入缓存，缓存中共{}条路由", key, index.len());
                true
            }
            Err(e) => {
                warn!("写入路由缓存失败，本次解析不受影响：{}", e);
                false
            }
        }
    }

    /// 当前缓存中的路由条数
    pub fn len(&self) -> usize {
        self.load_index().map_or(0, |index| index.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 丢弃整张路由表，返回此前是否存在
    pub fn invalidate(&self) -> Result<bool, Exception> {
        let _guard = match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.backend.remove(CACHE_INDEX_ROUTES)
    }

    /// 清空整个页面缓存后端
    pub fn clear_all(&self) -> Result<(), Exception> {
        let _guard = match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.backend.clean(CleanMode::All)
    }

    fn load_index(&self) -> Option<RouteIndex> {
        match self.backend.test(CACHE_INDEX_ROUTES) {
            Ok(Some(_)) => {}
            Ok(None) => return None,
            Err(e) => {
                warn!("无法探测路由缓存：{}", e);
                return None;
            }
        }
        let data = match self.backend.load(CACHE_INDEX_ROUTES) {
            Ok(Some(data)) => data,
            // test 与 load 之间记录可能已被淘汰
            Ok(None) => return None,
            Err(e) => {
                warn!("无法读取路由缓存：{}", e);
                return None;
            }
        };
        match serde_json::from_slice::<RouteIndex>(&data) {
            Ok(index) => Some(index),
            Err(e) => {
                warn!("路由缓存内容无法解码，按空表处理：{}", e);
                None
            }
        }
    }
}
