use num_cpus;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{error, warn};
use std::fs::File;
use std::io::prelude::*;
use std::path::Path;
use std::time::Duration;

use crate::exception::Exception;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pages_root: String,
    routes_file: String,
    port: u16,
    worker_threads: usize,
    cache_size: usize,
    local: bool,
    #[serde(default = "default_cache_all")]
    cache_all: bool,
    #[serde(default = "default_cache_lifetime")]
    cache_lifetime: u64,
    #[serde(default = "default_template_root")]
    template_root: String,
    #[serde(default = "default_menus_root")]
    menus_root: String,
    #[serde(default = "default_http_css_path")]
    http_css_path: String,
    #[serde(default = "default_http_js_path")]
    http_js_path: String,
    #[serde(default = "default_http_images_path")]
    http_images_path: String,
    #[serde(default = "default_http_library_path")]
    http_library_path: String,
}

// 默认只缓存成功的解析，避免把一次拼写错误长期留在缓存里
fn default_cache_all() -> bool {
    false
}

fn default_cache_lifetime() -> u64 {
    0 // 0 表示永不过期
}

fn default_template_root() -> String {
    "application/templates".to_string()
}

fn default_menus_root() -> String {
    "application/templates/menus".to_string()
}

fn default_http_css_path() -> String {
    "/css".to_string()
}

fn default_http_js_path() -> String {
    "/js".to_string()
}

fn default_http_images_path() -> String {
    "/images".to_string()
}

fn default_http_library_path() -> String {
    "/libraries".to_string()
}

impl Config {
    pub fn new() -> Self {
        Self {
            pages_root: "application/pages".to_string(),
            routes_file: "config/routes.toml".to_string(),
            port: 7878,
            worker_threads: 0,
            cache_size: 64,
            local: true,
            cache_all: default_cache_all(),
            cache_lifetime: default_cache_lifetime(),
            template_root: default_template_root(),
            menus_root: default_menus_root(),
            http_css_path: default_http_css_path(),
            http_js_path: default_http_js_path(),
            http_images_path: default_http_images_path(),
            http_library_path: default_http_library_path(),
        }
    }

    /// 从 TOML 文件读取配置。
    ///
    /// 文件不存在时返回 `ConfigurationMissing`，进程不应继续启动；
    /// 文件存在但内容无法解析时记录错误并回退到默认配置。
    pub fn from_toml(filename: &str) -> Result<Self, Exception> {
        let mut file = match File::open(filename) {
            Ok(f) => f,
            Err(e) => {
                error!("无法打开配置文件{}：{}", filename, e);
                return Err(Exception::ConfigurationMissing(filename.to_string()));
            }
        };
        let mut str_val = String::new();
        if let Err(e) = file.read_to_string(&mut str_val) {
            error!("读取配置文件{}失败：{}", filename, e);
            return Err(Exception::ConfigurationMissing(filename.to_string()));
        }

        let mut raw_config = match toml::from_str(&str_val) {
            Ok(t) => t,
            Err(e) => {
                error!("无法成功从配置文件构建配置对象，使用默认配置：{}", e);
                Config::new()
            }
        };
        if raw_config.worker_threads == 0 {
            raw_config.worker_threads = num_cpus::get();
        }
        if raw_config.cache_size == 0 {
            warn!("cache_size被设置为0，但路由缓存不能被禁用，因此该值将被改为64。");
            raw_config.cache_size = 64;
        }
        Ok(raw_config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn pages_root(&self) -> &Path {
        Path::new(&self.pages_root)
    }

    pub fn routes_file(&self) -> &Path {
        Path::new(&self.routes_file)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn cache_size(&self) -> usize {
        self.cache_size
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn cache_all(&self) -> bool {
        self.cache_all
    }

    /// 缓存记录的默认寿命，`None` 表示永不过期
    pub fn cache_lifetime(&self) -> Option<Duration> {
        match self.cache_lifetime {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn template_root(&self) -> &Path {
        Path::new(&self.template_root)
    }

    pub fn menus_root(&self) -> &Path {
        Path::new(&self.menus_root)
    }

    pub fn http_css_path(&self) -> &str {
        &self.http_css_path
    }

    pub fn http_js_path(&self) -> &str {
        &self.http_js_path
    }

    pub fn http_images_path(&self) -> &str {
        &self.http_images_path
    }

    pub fn http_library_path(&self) -> &str {
        &self.http_library_path
    }
}
