// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求描述符模块
//!
//! 把请求行中的原始路径规范化为路由器使用的形式：
//! 1. 去掉查询字符串与片段（`?` / `#` 之后的内容）。
//! 2. 按 `/` 切分并丢弃空片段，因此 `//a///b/` 与 `/a/b` 等价。
//! 3. 对每个片段做百分号解码（UTF-8）。
//! 4. 生成规范缓存键（compact 形式），对不同的片段序列保持单射。

use lazy_static::lazy_static;
use log::debug;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;

use crate::exception::Exception;

/// 重新编码缓存键片段时需要转义的字符。
///
/// `/` 与 `%` 保证键的单射性；`?` 与 `#` 保证键本身仍能作为路径被重新解析。
const KEY_ESCAPES: &AsciiSet = &CONTROLS.add(b'%').add(b'/').add(b'?').add(b'#');

lazy_static! {
    /// 每个 `%` 后面必须紧跟两位十六进制数字
    static ref VALID_ESCAPES: Regex = Regex::new(r"^(?:[^%]|%[0-9A-Fa-f]{2})*$").unwrap();
}

/// 规范化后的请求：有序的路径片段和对应的缓存键。
///
/// 深度即片段个数，深度为 0 的请求总是落到首页。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    segments: Vec<String>,
    key: String,
}

impl RequestDescriptor {
    /// 从原始请求路径构建描述符。
    ///
    /// # 错误处理
    /// 路径不以 `/` 开头、含有非法百分号转义、解码后不是 UTF-8 或含有控制字符时，
    /// 返回 `Exception::MalformedRequest`。调用方自行决定如何回退，这里不做任何猜测。
    pub fn parse(raw: &str) -> Result<Self, Exception> {
        let path = match raw.find(|c: char| c == '?' || c == '#') {
            Some(end) => &raw[..end],
            None => raw,
        };

        if !path.starts_with('/') {
            return Err(Exception::MalformedRequest(format!(
                "path must start with '/': {}",
                raw
            )));
        }
        if !VALID_ESCAPES.is_match(path) {
            return Err(Exception::MalformedRequest(format!(
                "invalid percent-encoding in {}",
                raw
            )));
        }

        let mut segments = Vec::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            let decoded = percent_decode_str(part).decode_utf8().map_err(|_| {
                Exception::MalformedRequest(format!("segment {} is not valid UTF-8", part))
            })?;
            if decoded.chars().any(char::is_control) {
                return Err(Exception::MalformedRequest(format!(
                    "segment {} contains control characters",
                    part
                )));
            }
            segments.push(decoded.into_owned());
        }

        let descriptor = Self::from_segments(segments);
        debug!("请求路径{}规范化为{}", raw, descriptor.key);
        Ok(descriptor)
    }

    /// 从已经解码的片段构建描述符，空片段会被丢弃
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments
            .into_iter()
            .map(Into::into)
            .filter(|s| !s.is_empty())
            .collect();
        let key = compact(&segments);
        Self { segments, key }
    }

    /// 深度为 0 的描述符（首页）
    pub fn home() -> Self {
        Self::from_segments(Vec::<String>::new())
    }
}

fn compact(segments: &[String]) -> String {
    let encoded: Vec<String> = segments
        .iter()
        .map(|s| utf8_percent_encode(s, KEY_ESCAPES).to_string())
        .collect();
    ["/", &encoded.join("/")].concat()
}

// --- Getter 访问器实现 ---

impl RequestDescriptor {
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    /// 路径片段个数
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// 规范缓存键
    pub fn compact(&self) -> &str {
        &self.key
    }
}
