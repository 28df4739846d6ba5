// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求分发
//!
//! 前端控制器：把一个已解析的 HTTP 请求变成一个完整的页面响应。
//! 1. 规范化请求路径，无法规范化时返回 400。
//! 2. 交给路由器解析出页面文件。
//! 3. 渲染页面并套上布局；未找到的路由同样以 200 返回首页，并附带提示消息。

use std::sync::Arc;

use log::{debug, error, warn};

use crate::{
    config::Config,
    descriptor::RequestDescriptor,
    layout::Layout,
    param::MessageLevel,
    request::Request,
    response::Response,
    router::Router,
};

pub struct FrontController {
    config: Arc<Config>,
    router: Arc<Router>,
}

impl FrontController {
    pub fn new(config: Arc<Config>, router: Arc<Router>) -> Self {
        Self { config, router }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn handle(&self, request: &Request, id: u128) -> Response {
        let mut response = self.build(request, id);
        response.set_version(request.version());
        response
    }

    fn build(&self, request: &Request, id: u128) -> Response {
        let descriptor = match RequestDescriptor::parse(request.path()) {
            Ok(d) => d,
            Err(e) => {
                warn!("[ID{}]请求路径{}无法规范化，返回400：{}", id, request.path(), e);
                return Response::response_400(id);
            }
        };
        debug!("[ID{}]请求路径规范化为{}", id, descriptor.compact());

        let outcome = self.router.resolve(&descriptor, id);

        let mut layout = Layout::new(&self.config);
        if let Some(warning) = outcome.warning() {
            layout.add_message(warning, MessageLevel::Warning);
        }
        layout.set_page404(outcome.not_found());
        if let Err(e) = layout.add_page(outcome.file(), id) {
            error!("[ID{}]无法渲染页面{}，返回500：{}", id, outcome.file().display(), e);
            return Response::response_500(id);
        }

        let html = layout.render();
        Response::from_html(&html, id, request.head_only())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cache::MemoryCache, param::*};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const ROUTES: &str = r#"
accueil = "accueil.html"

[logement]
demande = "demande.html"
perdu = "absent.html"

[admin]
root = "admin_default.html"
users = "admin_users.html"
"#;

    fn site(dir: &Path) -> FrontController {
        let pages = dir.join("pages");
        let templates = dir.join("templates");
        fs::create_dir_all(&pages).unwrap();
        fs::create_dir_all(templates.join("menus")).unwrap();
        for (file, body) in [
            ("accueil.html", "<p>Accueil</p>"),
            ("demande.html", "<p>Demande</p>"),
            ("admin_default.html", "<p>Admin</p>"),
            ("admin_users.html", "<p>Utilisateurs</p>"),
        ] {
            fs::write(pages.join(file), body).unwrap();
        }
        fs::write(dir.join("routes.toml"), ROUTES).unwrap();

        let config: Config = toml::from_str(&format!(
            r#"
pages_root = "{0}/pages"
routes_file = "{0}/routes.toml"
port = 7878
worker_threads = 1
cache_size = 8
local = true
template_root = "{0}/templates"
menus_root = "{0}/templates/menus"
"#,
            dir.display()
        ))
        .unwrap();
        let router = Router::from_config(&config, Arc::new(MemoryCache::from_capacity(8))).unwrap();
        FrontController::new(Arc::new(config), Arc::new(router))
    }

    fn get(controller: &FrontController, line: &str) -> (Response, String) {
        let raw = format!("{}\r\nHost: localhost\r\n\r\n", line);
        let request = Request::try_from(raw.as_bytes(), 0).unwrap();
        let response = controller.handle(&request, 0);
        let text = String::from_utf8_lossy(&response.as_bytes()).into_owned();
        (response, text)
    }

    #[test]
    fn test_home_page() {
        let dir = TempDir::new().unwrap();
        let (response, text) = get(&site(dir.path()), "GET / HTTP/1.1");
        assert_eq!(response.status_code(), 200);
        assert!(text.contains("<p>Accueil</p>"));
        assert!(!text.contains(PAGE_NOT_FOUND_MESSAGE));
    }

    #[test]
    fn test_matched_page() {
        let dir = TempDir::new().unwrap();
        let controller = site(dir.path());
        let (_, text) = get(&controller, "GET /logement/demande HTTP/1.1");
        assert!(text.contains("<p>Demande</p>"));
        let (_, text) = get(&controller, "POST /admin/42 HTTP/1.1");
        assert!(text.contains("<p>Admin</p>"));
    }

    #[test]
    fn test_not_found_serves_home_with_message() {
        let dir = TempDir::new().unwrap();
        let (response, text) = get(&site(dir.path()), "GET /logement/inexistant HTTP/1.1");
        assert_eq!(response.status_code(), 200);
        assert!(text.contains("<p>Accueil</p>"));
        assert!(text.contains(PAGE_NOT_FOUND_MESSAGE));
    }

    #[test]
    fn test_closest_match_warning_is_shown() {
        let dir = TempDir::new().unwrap();
        let (_, text) = get(&site(dir.path()), "GET /logement/demande/123 HTTP/1.1");
        assert!(text.contains(&format!(
            r#"<div class="message warning">{}</div>"#,
            CLOSEST_MATCH_WARNING
        )));
        assert!(text.contains("<p>Accueil</p>"));
    }

    #[test]
    fn test_malformed_path_is_400() {
        let dir = TempDir::new().unwrap();
        let controller = site(dir.path());
        let (response, _) = get(&controller, "GET /admin/%zz HTTP/1.1");
        assert_eq!(response.status_code(), 400);
        assert!(controller.router().cache().is_empty());
    }

    #[test]
    fn test_missing_page_file_is_500() {
        let dir = TempDir::new().unwrap();
        let (response, _) = get(&site(dir.path()), "GET /logement/perdu HTTP/1.1");
        assert_eq!(response.status_code(), 500);
    }

    #[test]
    fn test_head_has_no_body() {
        let dir = TempDir::new().unwrap();
        let (response, text) = get(&site(dir.path()), "HEAD / HTTP/1.0");
        assert!(response.content().is_none());
        assert!(response.content_length() > 0);
        assert!(text.starts_with("HTTP/1.0 200 OK"));
        assert!(!text.contains("Accueil"));
    }
}
