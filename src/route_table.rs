// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由表模块
//!
//! 路由表是一棵在启动时从静态配置加载、此后只读的树：
//! - 内部节点把字面路径片段映射到子节点，另有一个可选的通配子节点（配置中的保留键 `root`）。
//! - 叶子节点是相对于页面根目录的页面文件路径。
//!
//! 配置文件可以是 TOML（默认）或 JSON，顶层必须含有首页键 `accueil`。
//!
//! ## 匹配规则
//! 1. 字面匹配永远优先于通配匹配。
//! 2. 通配子节点只在剩余片段不超过一个时生效：没有剩余片段时它是该层的首页，
//!    恰好剩一个片段时它吞掉这个最后的片段。它从不吞掉多个片段。
//! 3. 在消费完所有片段之前就到达叶子，视为未找到（最接近的匹配）。

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{error, info};
use serde_json::Value;

use crate::{
    descriptor::RequestDescriptor,
    exception::Exception,
    param::{HOME_KEYWORD, ROOT_KEYWORD},
};

/// 路由树节点
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Internal {
        children: HashMap<String, Node>,
        wildcard: Option<Box<Node>>,
    },
    Leaf {
        file: String,
    },
}

/// 一次树遍历的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk<'a> {
    /// 所有片段恰好被消费完并停在叶子上
    Matched(&'a str),
    /// 在 `consumed` 个片段之后没有可走的子节点
    Unmatched { consumed: usize },
    /// 在 `consumed` 个片段之后到达了叶子，但请求还有剩余片段
    Partial { file: &'a str, consumed: usize },
}

/// 只读路由表
#[derive(Debug, Clone)]
pub struct RouteTable {
    root: Node,
    home: String,
}

impl RouteTable {
    /// 从磁盘加载路由表。
    ///
    /// 文件不存在时返回 `ConfigurationMissing`，无法解析或结构不合法时返回 `RouteTableInvalid`。
    /// 两者都意味着进程不能开始服务。
    pub fn load(path: &Path) -> Result<Self, Exception> {
        let display = path.display().to_string();
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                error!("路由表文件{}无法读取：{}", display, e);
                return Err(Exception::ConfigurationMissing(display));
            }
        };

        let value = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str::<Value>(&content)
                .map_err(|e| Exception::RouteTableInvalid(format!("{}: {}", display, e)))?,
            _ => {
                let table = toml::from_str::<toml::Value>(&content)
                    .map_err(|e| Exception::RouteTableInvalid(format!("{}: {}", display, e)))?;
                serde_json::to_value(table)
                    .map_err(|e| Exception::RouteTableInvalid(format!("{}: {}", display, e)))?
            }
        };

        let table = Self::from_value(&value)?;
        info!(
            "路由表{}已载入，共{}个页面，首页：{}",
            display,
            table.leaf_count(),
            table.home
        );
        Ok(table)
    }

    /// 从已经解析好的嵌套结构构建路由表，并做结构校验
    pub fn from_value(value: &Value) -> Result<Self, Exception> {
        let top = match value {
            Value::Object(map) => map,
            _ => {
                return Err(Exception::RouteTableInvalid(
                    "the top level must be a table".to_string(),
                ))
            }
        };
        let home = match top.get(HOME_KEYWORD) {
            Some(Value::String(file)) if !file.is_empty() => file.clone(),
            Some(_) => {
                return Err(Exception::RouteTableInvalid(format!(
                    "'{}' must name a page file",
                    HOME_KEYWORD
                )))
            }
            None => {
                return Err(Exception::RouteTableInvalid(format!(
                    "the top level must contain '{}'",
                    HOME_KEYWORD
                )))
            }
        };
        let root = build_node(value, "")?;
        Ok(Self { root, home })
    }

    /// 首页文件（相对页面根目录）
    pub fn home(&self) -> &str {
        &self.home
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// 路由表中的页面（叶子）数量
    pub fn leaf_count(&self) -> usize {
        count_leaves(&self.root)
    }

    /// 按请求片段遍历路由树。
    ///
    /// 深度为 0 的请求不进入树，直接返回首页。
    pub fn walk(&self, descriptor: &RequestDescriptor) -> Walk<'_> {
        let depth = descriptor.depth();
        if depth == 0 {
            return Walk::Matched(&self.home);
        }

        let mut node = &self.root;
        let mut current = 0;
        loop {
            match node {
                Node::Leaf { file } if current == depth => return Walk::Matched(file),
                Node::Leaf { file } => {
                    return Walk::Partial {
                        file,
                        consumed: current,
                    }
                }
                Node::Internal { children, wildcard } => {
                    if let Some(child) = descriptor.segment(current).and_then(|s| children.get(s)) {
                        node = child;
                        current += 1;
                        continue;
                    }
                    match wildcard {
                        // 没有剩余片段：通配子节点充当该层首页
                        Some(child) if current == depth => node = &**child,
                        // 恰好剩最后一个片段：通配子节点吞掉它
                        Some(child) if current + 1 == depth => {
                            node = &**child;
                            current += 1;
                        }
                        _ => return Walk::Unmatched { consumed: current },
                    }
                }
            }
        }
    }
}

fn build_node(value: &Value, at: &str) -> Result<Node, Exception> {
    match value {
        Value::String(file) if file.is_empty() => Err(Exception::RouteTableInvalid(format!(
            "empty page file at '{}'",
            at
        ))),
        Value::String(file) => Ok(Node::Leaf { file: file.clone() }),
        Value::Object(map) => {
            let mut children = HashMap::with_capacity(map.len());
            let mut wildcard = None;
            for (key, child) in map {
                let child_at = if at.is_empty() {
                    key.clone()
                } else {
                    [at, ".", key].concat()
                };
                let node = build_node(child, &child_at)?;
                if key == ROOT_KEYWORD {
                    wildcard = Some(Box::new(node));
                } else {
                    children.insert(key.clone(), node);
                }
            }
            Ok(Node::Internal { children, wildcard })
        }
        _ => Err(Exception::RouteTableInvalid(format!(
            "'{}' must be a page file or a table",
            at
        ))),
    }
}

fn count_leaves(node: &Node) -> usize {
    match node {
        Node::Leaf { .. } => 1,
        Node::Internal { children, wildcard } => {
            children.values().map(count_leaves).sum::<usize>()
                + wildcard.as_deref().map_or(0, count_leaves)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::Builder;

    fn table(value: Value) -> RouteTable {
        RouteTable::from_value(&value).unwrap()
    }

    fn walk<'a>(table: &'a RouteTable, path: &str) -> Walk<'a> {
        table.walk(&RequestDescriptor::parse(path).unwrap())
    }

    fn admin_table() -> RouteTable {
        table(json!({
            "accueil": "home.php",
            "admin": {"root": "admin_default.php", "users": "admin_users.php"},
        }))
    }

    #[test]
    fn test_depth_zero_is_home() {
        let t = table(json!({"accueil": "home.php", "root": "catch_all.php"}));
        assert_eq!(walk(&t, "/"), Walk::Matched("home.php"));
    }

    #[test]
    fn test_literal_descent() {
        let t = table(json!({"accueil": "home.php", "logement": {"demande": "demande.php"}}));
        assert_eq!(walk(&t, "/logement/demande"), Walk::Matched("demande.php"));
        assert_eq!(
            walk(&t, "/logement/inexistant"),
            Walk::Unmatched { consumed: 1 }
        );
    }

    #[test]
    fn test_wildcard_takes_last_segment() {
        let t = admin_table();
        assert_eq!(walk(&t, "/admin/42"), Walk::Matched("admin_default.php"));
    }

    #[test]
    fn test_literal_beats_wildcard() {
        let t = admin_table();
        assert_eq!(walk(&t, "/admin/users"), Walk::Matched("admin_users.php"));
    }

    /// 没有剩余片段时通配子节点是该层的首页
    #[test]
    fn test_wildcard_as_index() {
        let t = admin_table();
        assert_eq!(walk(&t, "/admin"), Walk::Matched("admin_default.php"));
    }

    #[test]
    fn test_wildcard_never_spans_segments() {
        let t = table(json!({"accueil": "home.php", "a": {"root": "X.php"}}));
        assert_eq!(walk(&t, "/a/b/c"), Walk::Unmatched { consumed: 1 });
        assert_eq!(walk(&t, "/a/b"), Walk::Matched("X.php"));
    }

    #[test]
    fn test_nested_wildcards() {
        let t = table(json!({
            "accueil": "home.php",
            "dossier": {"root": {"root": "dossier_index.php", "pieces": "pieces.php"}},
        }));
        assert_eq!(walk(&t, "/dossier/17"), Walk::Matched("dossier_index.php"));
        assert_eq!(walk(&t, "/dossier"), Walk::Matched("dossier_index.php"));
        // 通配只吞掉最后一个片段，`17` 不是最后一个片段
        assert_eq!(
            walk(&t, "/dossier/17/pieces"),
            Walk::Unmatched { consumed: 1 }
        );
    }

    #[test]
    fn test_leaf_before_end_is_partial() {
        let t = table(json!({"accueil": "home.php", "logement": {"demande": "demande.php"}}));
        assert_eq!(
            walk(&t, "/logement/demande/123"),
            Walk::Partial {
                file: "demande.php",
                consumed: 2
            }
        );
    }

    #[test]
    fn test_internal_node_without_wildcard_at_end() {
        let t = table(json!({"accueil": "home.php", "logement": {"demande": "demande.php"}}));
        assert_eq!(walk(&t, "/logement"), Walk::Unmatched { consumed: 1 });
    }

    #[test]
    fn test_home_key_is_also_a_literal_route() {
        let t = table(json!({"accueil": "home.php"}));
        assert_eq!(walk(&t, "/accueil"), Walk::Matched("home.php"));
    }

    #[test]
    fn test_missing_home_is_invalid() {
        let result = RouteTable::from_value(&json!({"logement": "logement.php"}));
        assert!(matches!(result, Err(Exception::RouteTableInvalid(_))));
        let result = RouteTable::from_value(&json!({"accueil": {"a": "b.php"}}));
        assert!(matches!(result, Err(Exception::RouteTableInvalid(_))));
    }

    #[test]
    fn test_non_string_leaf_is_invalid() {
        let result = RouteTable::from_value(&json!({"accueil": "home.php", "a": {"b": 3}}));
        match result {
            Err(Exception::RouteTableInvalid(reason)) => assert!(reason.contains("a.b")),
            other => panic!("期望RouteTableInvalid，实际得到{:?}", other),
        }
        let result = RouteTable::from_value(&json!({"accueil": "home.php", "a": ""}));
        assert!(matches!(result, Err(Exception::RouteTableInvalid(_))));
        let result = RouteTable::from_value(&json!(["accueil"]));
        assert!(matches!(result, Err(Exception::RouteTableInvalid(_))));
    }

    #[test]
    fn test_leaf_count() {
        assert_eq!(admin_table().leaf_count(), 3);
    }

    #[test]
    fn test_load_toml() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
accueil = "accueil.php"

[logement]
demande = "logement/demande.php"

[admin]
root = "admin/index.php"
users = "admin/users.php"
"#
        )
        .unwrap();

        let t = RouteTable::load(file.path()).unwrap();
        assert_eq!(t.home(), "accueil.php");
        assert_eq!(walk(&t, "/logement/demande"), Walk::Matched("logement/demande.php"));
        assert_eq!(walk(&t, "/admin/7"), Walk::Matched("admin/index.php"));
    }

    #[test]
    fn test_load_json() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(
            file,
            r#"{{"accueil": "accueil.php", "aide": {{"root": "aide.php"}}}}"#
        )
        .unwrap();

        let t = RouteTable::load(file.path()).unwrap();
        assert_eq!(walk(&t, "/aide/faq"), Walk::Matched("aide.php"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = RouteTable::load(Path::new("/nonexistent/routes.toml"));
        assert_eq!(
            result.unwrap_err(),
            Exception::ConfigurationMissing("/nonexistent/routes.toml".to_string())
        );
    }

    #[test]
    fn test_load_unparsable_file() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "accueil = ").unwrap();
        assert!(matches!(
            RouteTable::load(file.path()),
            Err(Exception::RouteTableInvalid(_))
        ));
    }

    proptest! {
        /// 任意请求都能在有限步内得到结果，且消费的片段数不超过深度
        #[test]
        fn prop_walk_terminates(segments in prop::collection::vec("(admin|users|logement|demande|x|root)", 0..8)) {
            let t = table(json!({
                "accueil": "home.php",
                "root": "top.php",
                "admin": {"root": {"root": "deep.php", "users": "u.php"}, "users": "admin_users.php"},
                "logement": {"demande": "demande.php", "root": "logement.php"},
            }));
            let d = RequestDescriptor::from_segments(segments);
            match t.walk(&d) {
                Walk::Matched(file) => prop_assert!(!file.is_empty()),
                Walk::Unmatched { consumed } => prop_assert!(consumed <= d.depth()),
                Walk::Partial { consumed, .. } => prop_assert!(consumed < d.depth()),
            }
        }
    }
}
