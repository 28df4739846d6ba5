//! 页面渲染：把路由解析出的页面文件变成 HTML 片段。
//! `.php` 页面交给 PHP 解释器执行，其余文件按 UTF-8 文本读取。

use std::fs;
use std::path::Path;
use std::process::Command;

use lazy_static::lazy_static;
use log::{debug, error};
use regex::Regex;

use crate::exception::Exception;

lazy_static! {
    static ref PHP_VERSION: Regex = Regex::new(r"PHP (\d+\.\d+\.\d+)").unwrap();
}

pub fn render_page(path: &Path, id: u128) -> Result<String, Exception> {
    if !path.is_file() {
        error!("[ID{}]路由表指向的页面{}不存在", id, path.display());
        return Err(Exception::PageNotFound(path.display().to_string()));
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("php") => {
            debug!("[ID{}]页面是PHP，启用PHP处理", id);
            handle_php(path, id)
        }
        _ => match fs::read(path) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => {
                error!("[ID{}]无法读取页面{}：{}", id, path.display(), e);
                Err(Exception::PageNotFound(path.display().to_string()))
            }
        },
    }
}

pub fn handle_php(path: &Path, id: u128) -> Result<String, Exception> {
    let result = Command::new("php")
        .arg(path) // PHP文件路径
        .output();
    let output = match result {
        Ok(o) => o,
        Err(_) => return Err(Exception::PHPExecuteFailed),
    };

    if output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(String::from(stdout))
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!("[ID{}]PHP解释器出错：{}", id, stderr);
        Err(Exception::PHPCodeError)
    }
}

/// 探测系统中的 PHP 解释器，返回其版本号
pub fn php_version() -> Option<String> {
    let output = Command::new("php").arg("-v").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    PHP_VERSION
        .captures(&stdout)
        .and_then(|c| c.get(1))
        .map(|v| v.as_str().to_string())
}
