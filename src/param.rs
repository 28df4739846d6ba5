// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 前端控制器参数与常量模块
//!
//! 该模块集中定义了路由表、路由缓存以及 HTTP 外壳共用的常量和数据结构，包括：
//! - 路由表中的保留键（通配键 `root`、首页键 `accueil`）。
//! - 页面缓存中路由索引的固定 id。
//! - 常见的 HTTP 状态码及其原因短语（Reason Phrase）。
//! - HTTP 方法、版本以及页面消息级别的强类型枚举。

use lazy_static::lazy_static;
use std::collections::HashMap;

/// 路由表每一层中充当通配（兜底）子节点的保留键
pub const ROOT_KEYWORD: &str = "root";

/// 路由表顶层必须存在的首页键
pub const HOME_KEYWORD: &str = "accueil";

/// 页面缓存中保存整张已解析路由表的唯一 id
pub const CACHE_INDEX_ROUTES: &str = "routes";

/// 路由命中叶子但深度不一致时附带的提示
pub const CLOSEST_MATCH_WARNING: &str = "Cette page est la plus proche de celle que vous avez demandée.";

/// 页面不存在时布局追加的错误消息
pub const PAGE_NOT_FOUND_MESSAGE: &str = "La page que vous avez demandé n'a pas été trouvée";

/// 服务器名称标识，用于 HTTP 响应头的 `Server` 字段
pub const SERVER_NAME: &str = "logement-front";

/// HTTP 协议规定的换行符（Carriage Return Line Feed）
pub const CRLF: &str = "\r\n";

lazy_static! {
    /// HTTP 状态码与其对应的标准原因短语映射表。
    ///
    /// 前端控制器只会产生其中很少的一部分，表中只保留这些。
    pub static ref STATUS_CODES: HashMap<u16, &'static str> = {
        let mut map = HashMap::new();
        map.insert(200, "OK");
        map.insert(400, "Bad Request");
        map.insert(404, "Not Found");
        map.insert(405, "Method Not Allowed");
        map.insert(500, "Internal Server Error");
        map.insert(505, "HTTP Version Not Supported");
        map
    };
}

/// 支持的 HTTP 协议版本
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HttpVersion {
    V1_0,
    V1_1,
}

/// 接受的 HTTP 请求方法。
///
/// 所有方法走同一条路由，唯一的区别是 HEAD 不返回响应体。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HttpRequestMethod {
    Get,
    Head,
    Post,
}

/// 布局中消息的级别，对应 CSS 类名
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

use std::fmt;

impl fmt::Display for HttpVersion {
    /// 将枚举格式化为 HTTP 报文中的版本字符串
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpVersion::V1_0 => write!(f, "HTTP/1.0"),
            HttpVersion::V1_1 => write!(f, "HTTP/1.1"),
        }
    }
}

impl fmt::Display for HttpRequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpRequestMethod::Get => write!(f, "GET"),
            HttpRequestMethod::Head => write!(f, "HEAD"),
            HttpRequestMethod::Post => write!(f, "POST"),
        }
    }
}

impl fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MessageLevel::Info => write!(f, "info"),
            MessageLevel::Success => write!(f, "success"),
            MessageLevel::Warning => write!(f, "warning"),
            MessageLevel::Error => write!(f, "error"),
        }
    }
}
