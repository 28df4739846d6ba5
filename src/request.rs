// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求处理模块
//!
//! 前端控制器只关心请求行：方法用于区分 HEAD，路径交给请求描述符，版本用于响应。
//! 标头中只提取 `User-Agent` 用于访问日志。

use crate::{exception::Exception, param::*};
use log::error;

/// HTTP 请求元数据
#[derive(Debug, Clone)]
pub struct Request {
    method: HttpRequestMethod,
    /// 请求目标，原样保留（包含查询字符串）
    path: String,
    version: HttpVersion,
    user_agent: String,
}

impl Request {
    /// 从原始字节缓冲区尝试构建 `Request` 实例。
    ///
    /// # 参数
    /// * `buffer` - 从网络 Socket 读取的原始数据。
    /// * `id` - 全局请求 ID，用于在多线程环境下追踪日志。
    pub fn try_from(buffer: &[u8], id: u128) -> Result<Self, Exception> {
        // 1. 将字节流转换为字符串，失败则判定为非法的 HTTP 请求
        let request_string = match std::str::from_utf8(buffer) {
            Ok(string) => string.trim_end_matches('\0'),
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        let request_lines: Vec<&str> = request_string.split(CRLF).collect();

        // 2. 解析请求行 (e.g., "GET /logement/demande HTTP/1.1")
        let first_line_parts: Vec<&str> = request_lines[0].split(' ').collect();

        if first_line_parts.len() != 3 {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, request_lines[0]);
            return Err(Exception::UnSupportedRequestMethod);
        }

        let method_str = first_line_parts[0].to_uppercase();
        let method = match method_str.as_str() {
            "GET" => HttpRequestMethod::Get,
            "HEAD" => HttpRequestMethod::Head,
            "POST" => HttpRequestMethod::Post,
            _ => {
                error!("[ID{}]不支持的HTTP请求方法：{}", id, &method_str);
                return Err(Exception::UnSupportedRequestMethod);
            }
        };

        let version_str = first_line_parts[2].to_uppercase();
        let version = match version_str.as_str() {
            "HTTP/1.1" => HttpVersion::V1_1,
            "HTTP/1.0" => HttpVersion::V1_0,
            _ => {
                error!("[ID{}]不支持的HTTP协议版本：{}", id, &version_str);
                return Err(Exception::UnsupportedHttpVersion);
            }
        };

        let path = first_line_parts[1].to_string();

        // 3. 迭代各行解析 Headers
        let mut user_agent = "".to_string();
        for line in &request_lines[1..] {
            if line.is_empty() {
                break;
            }
            if line.to_lowercase().starts_with("user-agent:") {
                if let Some((_, val)) = line.split_once(':') {
                    user_agent = val.trim().to_string();
                }
            }
        }

        Ok(Self {
            method,
            path,
            version,
            user_agent,
        })
    }
}

// --- Getter 访问器实现 ---

impl Request {
    pub fn version(&self) -> HttpVersion {
        self.version
    }

    /// 获取请求路径（含查询参数）
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// HEAD 请求只返回响应头
    pub fn head_only(&self) -> bool {
        self.method == HttpRequestMethod::Head
    }
}
