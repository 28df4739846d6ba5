// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了前端控制器在启动和请求处理生命周期中可能出现的各类异常情况。
//!
//! ## 设计意图
//! - **错误分类**：涵盖了启动期配置错误、请求路径解析错误、页面缓存后端错误以及页面渲染错误。
//! - **致命与非致命**：配置类错误只在启动阶段出现，进程不应带着它们继续服务；
//!   缓存类错误永远不会让路由解析失败，只会被记录到日志中。
//! - **路由未命中不是异常**：它是解析结果中的 `not_found` 标志，见 `router` 模块。

use std::fmt;

/// 前端控制器处理过程中发生的异常类型。
#[derive(Debug, Clone, PartialEq)]
pub enum Exception {
    /// 启动时找不到配置来源（服务器配置或路由表文件）。携带缺失的路径。
    ConfigurationMissing(String),
    /// 路由表结构不合法，例如缺少首页键或叶子不是字符串。
    RouteTableInvalid(String),
    /// 请求路径无法规范化为路径片段（非法的百分号转义、非 UTF-8、控制字符等）。
    MalformedRequest(String),
    /// 页面缓存后端读写失败或不支持请求的操作。
    CacheFailure(String),
    /// 客户端发送的请求字节流无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 客户端使用了服务器不接受的 HTTP 方法。
    UnSupportedRequestMethod,
    /// 客户端使用了服务器不支持的 HTTP 协议版本。
    UnsupportedHttpVersion,
    /// 路由表指向的页面文件在磁盘上不存在。
    PageNotFound(String),
    /// 调用 PHP 解释器执行页面失败。
    PHPExecuteFailed,
    /// PHP 页面内部运行错误。
    PHPCodeError,
}

use Exception::*;

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationMissing(path) => write!(f, "Configuration source is missing: {}", path),
            RouteTableInvalid(reason) => write!(f, "Route table is invalid: {}", reason),
            MalformedRequest(reason) => write!(f, "Malformed request path: {}", reason),
            CacheFailure(reason) => write!(f, "Page cache failure: {}", reason),
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            UnSupportedRequestMethod => write!(f, "Unsupported request method"),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            PageNotFound(path) => write!(f, "Page file not found: {}", path),
            PHPExecuteFailed => write!(f, "Couldn't invoke PHP interpreter"),
            PHPCodeError => write!(f, "An error happened in php code"),
        }
    }
}

impl std::error::Error for Exception {}

impl Exception {
    /// 该异常是否意味着进程不能开始服务
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConfigurationMissing(_) | RouteTableInvalid(_)
        )
    }
}
