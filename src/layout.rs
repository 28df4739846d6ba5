//! # 页面布局
//!
//! 把页面内容组合成完整的 HTML 文档：头部（meta、样式、脚本、标题）、横幅、菜单、
//! 消息区、内容区和页脚。消息以显式的值保存在布局中，渲染时一次性输出并清空。

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::{
    config::Config,
    exception::Exception,
    page,
    param::{MessageLevel, PAGE_NOT_FOUND_MESSAGE},
};

const DOCTYPE: &str = "<!DOCTYPE html>";

const DEFAULT_TITLE: &str = "École Polytechnique - Logement des admissibles";

// 应用自带的第三方库，路径相对于库目录
const LIBRARIES: [&str; 3] = [
    "jquery/jquery-1.9.1.js",
    "jquery/jquery-ui-1.10.1.custom.min.js",
    "jquery/jquery.visited.js",
];

const LIBRARY_TEMPLATES: [&str; 1] = ["jquery/jquery-ui-1.10.1.custom.css"];

const DEFAULT_CSS: [&str; 6] = [
    "layout.css",
    "forms.css",
    "menu.css",
    "text.css",
    "images.css",
    "messages.css",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Append,
    Prepend,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    level: MessageLevel,
    text: String,
}

impl Message {
    pub fn new(text: impl Into<String>, level: MessageLevel) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    pub fn level(&self) -> MessageLevel {
        self.level
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn render(&self) -> String {
        format!(r#"<div class="message {}">{}</div>"#, self.level, self.text)
    }
}

pub struct Layout {
    title: String,
    meta: Vec<String>,
    css: Vec<String>,
    js: Vec<String>,
    menus: Vec<PathBuf>,
    content: Vec<String>,
    messages: Vec<Message>,
    page404: bool,
    http_css_path: String,
    http_js_path: String,
    http_library_path: String,
    menus_root: PathBuf,
    template_root: PathBuf,
}

impl Layout {
    pub fn new(config: &Config) -> Self {
        let images = config.http_images_path();
        let mut layout = Self {
            title: DEFAULT_TITLE.to_string(),
            meta: vec![
                r#"<meta http-equiv="Content-Type" content="text/html; charset=UTF-8">"#.to_string(),
                format!(
                    r#"<link href="{}/favicon.ico" type="image/x-icon" rel="shortcut icon">"#,
                    images
                ),
                format!(
                    r#"<link href="{}/favicon.png" type="image/png" rel="icon">"#,
                    images
                ),
            ],
            css: Vec::new(),
            js: Vec::new(),
            menus: Vec::new(),
            content: Vec::new(),
            messages: Vec::new(),
            page404: false,
            http_css_path: config.http_css_path().to_string(),
            http_js_path: config.http_js_path().to_string(),
            http_library_path: config.http_library_path().to_string(),
            menus_root: config.menus_root().to_path_buf(),
            template_root: config.template_root().to_path_buf(),
        };
        for css in DEFAULT_CSS {
            layout.append_css(css);
        }
        layout.add_menu("main.html");
        layout.append_js("menu.js");
        layout
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn add_content(&mut self, content: impl Into<String>) {
        self.content.push(content.into());
    }

    pub fn prepend_content(&mut self, content: impl Into<String>) {
        self.content.insert(0, content.into());
    }

    /// 渲染页面文件并追加为内容块
    pub fn add_page(&mut self, path: &Path, id: u128) -> Result<(), Exception> {
        let html = page::render_page(path, id)?;
        self.add_content(html);
        Ok(())
    }

    /// 添加菜单文件，路径相对于菜单目录
    pub fn add_menu(&mut self, file: &str) {
        self.menus.push(self.menus_root.join(file));
    }

    pub fn add_head(&mut self, head: impl Into<String>) {
        self.meta.push(head.into());
    }

    /// 以完整 URL 引入外部脚本
    pub fn add_web_js(&mut self, url: &str) {
        self.js.push(script_tag(url));
    }

    pub fn append_css(&mut self, file: &str) {
        self.add_css(file, Placement::Append);
    }

    pub fn prepend_css(&mut self, file: &str) {
        self.add_css(file, Placement::Prepend);
    }

    pub fn append_js(&mut self, file: &str) {
        self.add_js(file, Placement::Append);
    }

    pub fn prepend_js(&mut self, file: &str) {
        self.add_js(file, Placement::Prepend);
    }

    pub fn add_css(&mut self, file: &str, placement: Placement) {
        let tag = stylesheet_tag(&[self.http_css_path.as_str(), "/", file].concat());
        place(&mut self.css, tag, placement);
    }

    pub fn add_js(&mut self, file: &str, placement: Placement) {
        let tag = script_tag(&[self.http_js_path.as_str(), "/", file].concat());
        place(&mut self.js, tag, placement);
    }

    pub fn add_message(&mut self, text: impl Into<String>, level: MessageLevel) {
        self.messages.push(Message::new(text, level));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn set_page404(&mut self, page404: bool) {
        self.page404 = page404;
    }

    pub fn page404(&self) -> bool {
        self.page404
    }
}

// --- 渲染 ---

impl Layout {
    pub fn render_head(&self) -> String {
        [
            "<head>\n",
            &self.render_meta(),
            &self.render_css(),
            &self.render_js(),
            "<title>",
            &self.title,
            "</title>\n</head>",
        ]
        .concat()
    }

    pub fn render_meta(&self) -> String {
        self.meta.iter().map(|m| [m.as_str(), "\n"].concat()).collect()
    }

    /// 第三方库样式在前，页面样式在后
    pub fn render_css(&self) -> String {
        let mut css: String = LIBRARY_TEMPLATES
            .iter()
            .map(|t| stylesheet_tag(&[self.http_library_path.as_str(), "/", t].concat()) + "\n")
            .collect();
        for tag in &self.css {
            css.push_str(tag);
            css.push('\n');
        }
        css
    }

    pub fn render_js(&self) -> String {
        let mut js: String = LIBRARIES
            .iter()
            .map(|l| script_tag(&[self.http_library_path.as_str(), "/", l].concat()) + "\n")
            .collect();
        for tag in &self.js {
            js.push_str(tag);
            js.push('\n');
        }
        js
    }

    /// 输出并清空消息
    pub fn render_messages(&mut self) -> String {
        let mut html = String::from(r#"<div class="messages">"#);
        for message in self.messages.drain(..) {
            html.push_str(&message.render());
        }
        html.push_str("</div>");
        html
    }

    pub fn render_content(&mut self) -> String {
        let mut html = [
            "<div id=\"page-wrapper\">\n",
            &self.render_messages(),
            "\n<div class=\"contenu\" id=\"contenu\">\n",
        ]
        .concat();
        for block in &self.content {
            html.push_str(block);
            html.push('\n');
        }
        html.push_str("</div> </div>");
        html
    }

    pub fn render_menu(&self) -> String {
        let mut html = String::from(r#"<div id="app-menus-wrapper">"#);
        for menu in &self.menus {
            html.push_str(&include_file(menu));
        }
        html.push_str("</div>");
        html
    }

    pub fn render_banner(&self) -> String {
        [
            r#"<div id="bandeau">"#,
            &include_file(&self.template_root.join("header.html")),
            "</div>",
        ]
        .concat()
    }

    pub fn render_footer(&self) -> String {
        [
            r#"<div id="footer">"#,
            &include_file(&self.template_root.join("footer.html")),
            "</div>",
        ]
        .concat()
    }

    /// 渲染完整文档。页面未找到时先追加一条错误消息
    pub fn render(mut self) -> String {
        if self.page404 {
            self.add_message(PAGE_NOT_FOUND_MESSAGE, MessageLevel::Error);
        }
        let content = self.render_content();
        [
            DOCTYPE,
            "\n<html>\n",
            &self.render_head(),
            "\n<body>",
            &self.render_banner(),
            "\n",
            &self.render_menu(),
            "\n",
            &content,
            "\n",
            &self.render_footer(),
            "\n</body>\n</html>\n",
        ]
        .concat()
    }
}

fn place(list: &mut Vec<String>, element: String, placement: Placement) {
    match placement {
        Placement::Append => list.push(element),
        Placement::Prepend => list.insert(0, element),
    }
}

fn script_tag(src: &str) -> String {
    format!(r#"<script type="text/javascript" src="{}"></script>"#, src)
}

fn stylesheet_tag(href: &str) -> String {
    format!(
        r#"<link type="text/css" href="{}" rel="stylesheet" media="all" />"#,
        href
    )
}

// 模板片段缺失时渲染为空块
fn include_file(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            warn!("无法读取模板文件{}：{}", path.display(), e);
            String::new()
        }
    }
}
