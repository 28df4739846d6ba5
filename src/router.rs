// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由引擎
//!
//! 将规范化的请求映射到页面文件：
//! 1. 先查询路由缓存，命中即返回，命中结果不会再与路由表核对。
//! 2. 未命中时遍历只读路由表。
//! 3. 按写回策略把结果写回路由缓存。
//!
//! 未找到不是错误：结果中的 `not_found` 为真，文件总是首页，调用方据此提示用户。
//! 路由器本身没有全局可变状态，提示信息随结果一起返回。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};

use crate::{
    cache::PageCache,
    config::Config,
    descriptor::RequestDescriptor,
    exception::Exception,
    param::CLOSEST_MATCH_WARNING,
    resolution::{CachePolicy, CachedRoute, ResolutionCache},
    route_table::{RouteTable, Walk},
};

/// 一次路由解析的结果
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionOutcome {
    file: PathBuf,
    not_found: bool,
    warning: Option<String>,
    from_cache: bool,
}

impl ResolutionOutcome {
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// 为真时 `file` 一定是首页
    pub fn not_found(&self) -> bool {
        self.not_found
    }

    /// 需要展示给用户的提示（最接近的匹配）
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn from_cache(&self) -> bool {
        self.from_cache
    }
}

pub struct Router {
    table: RouteTable,
    pages_root: PathBuf,
    cache: ResolutionCache,
}

impl Router {
    pub fn new(table: RouteTable, pages_root: impl Into<PathBuf>, cache: ResolutionCache) -> Self {
        Self {
            table,
            pages_root: pages_root.into(),
            cache,
        }
    }

    /// 按配置加载路由表并构建路由器。路由表缺失或不合法时返回致命错误
    pub fn from_config(config: &Config, backend: Arc<dyn PageCache>) -> Result<Self, Exception> {
        let table = RouteTable::load(config.routes_file())?;
        let policy = CachePolicy::from_cache_all(config.cache_all());
        info!("路由缓存写回策略：{:?}", policy);
        Ok(Self::new(
            table,
            config.pages_root(),
            ResolutionCache::new(backend, policy),
        ))
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// 首页文件的完整路径
    pub fn home_file(&self) -> PathBuf {
        self.pages_root.join(self.table.home())
    }

    /// 解析一个请求。对任何合法的请求都会返回结果，不会因为路由未命中而失败
    pub fn resolve(&self, descriptor: &RequestDescriptor, id: u128) -> ResolutionOutcome {
        let key = descriptor.compact();

        if let Some(hit) = self.cache.lookup(key) {
            debug!("[ID{}]路由缓存命中：{} -> {}", id, key, hit.file);
            return ResolutionOutcome {
                file: PathBuf::from(hit.file),
                not_found: hit.not_found,
                warning: hit.warning,
                from_cache: true,
            };
        }

        let outcome = match self.table.walk(descriptor) {
            Walk::Matched(file) => {
                debug!("[ID{}]路由{}匹配到页面{}", id, key, file);
                ResolutionOutcome {
                    file: self.pages_root.join(file),
                    not_found: false,
                    warning: None,
                    from_cache: false,
                }
            }
            Walk::Unmatched { consumed } => {
                info!(
                    "[ID{}]路由{}在第{}个片段之后无法匹配，返回首页",
                    id, key, consumed
                );
                self.fallback(None)
            }
            Walk::Partial { file, consumed } => {
                info!(
                    "[ID{}]路由{}在第{}个片段处提前到达页面{}，返回首页",
                    id, key, consumed, file
                );
                self.fallback(Some(CLOSEST_MATCH_WARNING.to_string()))
            }
        };

        self.cache.record(
            key,
            CachedRoute {
                file: outcome.file.to_string_lossy().into_owned(),
                not_found: outcome.not_found,
                warning: outcome.warning.clone(),
            },
        );
        outcome
    }

    /// 解析原始请求路径。路径无法规范化时把 `MalformedRequest` 交给调用方
    pub fn resolve_path(&self, raw: &str, id: u128) -> Result<ResolutionOutcome, Exception> {
        let descriptor = RequestDescriptor::parse(raw)?;
        Ok(self.resolve(&descriptor, id))
    }

    fn fallback(&self, warning: Option<String>) -> ResolutionOutcome {
        ResolutionOutcome {
            file: self.home_file(),
            not_found: true,
            warning,
            from_cache: false,
        }
    }
}
