use crate::param::*;

use bytes::Bytes;
use chrono::prelude::*;
use log::{debug, error};

/// 前端控制器产生的 HTTP 响应。
///
/// 每个连接只处理一个请求，响应总是带 `Connection: close`。
#[derive(Debug, Clone)]
pub struct Response {
    version: HttpVersion,
    status_code: u16,
    information: String,
    content_type: Option<String>,
    content_length: u64,
    date: DateTime<Utc>,
    server_name: String,
    content: Option<Bytes>,
}

impl Response {
    pub fn new() -> Self {
        Self {
            version: HttpVersion::V1_1,
            status_code: 200,
            information: "OK".to_string(),
            content_type: None,
            content_length: 0,
            date: Utc::now(),
            server_name: SERVER_NAME.to_string(),
            content: None,
        }
    }

    /// 由渲染好的页面构建 200 响应。
    ///
    /// `headonly` 为真时仍然给出完整的 `Content-Length`，只是不携带响应体。
    pub fn from_html(html: &str, id: u128, headonly: bool) -> Self {
        let mut response = Self::new();
        response.content_length = html.len() as u64;
        response.content_type = Some("text/html; charset=utf-8".to_string());
        if headonly {
            debug!("[ID{}]HEAD请求，只发送响应头", id);
            return response;
        }
        response.content = Some(Bytes::from(html.to_string()));
        response
    }

    fn from_status_code(code: u16, note: Option<&str>, id: u128) -> Self {
        let mut response = Self::new();
        let content = ErrorPage::from_status_code(code, note).build();
        debug!("[ID{}]生成{}错误页面", id, code);
        let bytes = Bytes::from(content);
        response.content_length = bytes.len() as u64;
        response.content = Some(bytes);
        response.content_type = Some("text/html; charset=utf-8".to_string());
        response.set_code(code);
        response
    }

    pub fn set_version(&mut self, version: HttpVersion) -> &mut Self {
        self.version = version;
        self
    }

    /// 设置状态码。未登记的状态码使用通用的原因短语
    pub fn set_code(&mut self, code: u16) -> &mut Self {
        self.status_code = code;
        self.information = reason_phrase(code).to_string();
        self
    }

    pub fn response_400(id: u128) -> Self {
        Self::from_status_code(
            400,
            Some("<h2>Oups !</h2><p>Le chemin demandé n'est pas valide.</p>"),
            id,
        )
    }

    pub fn response_405(id: u128) -> Self {
        Self::from_status_code(
            405,
            Some("<h2>Oups !</h2><p>Seules les méthodes GET, HEAD et POST sont acceptées.</p>"),
            id,
        )
    }

    pub fn response_500(id: u128) -> Self {
        Self::from_status_code(
            500,
            Some("<h2>Oups !</h2><p>Le serveur a rencontré une erreur interne.</p>"),
            id,
        )
    }

    pub fn response_505(id: u128) -> Self {
        Self::from_status_code(505, None, id)
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let version = self.version.to_string();
        let status_code = self.status_code.to_string();
        let content_length = self.content_length.to_string();
        let date = format_date(&self.date);

        let header = [
            version.as_str(),
            " ",
            status_code.as_str(),
            " ",
            self.information.as_str(),
            CRLF,
            match &self.content_type {
                Some(t) => ["Content-Type: ", t.as_str(), CRLF].concat(),
                None => "".to_string(),
            }
            .as_str(),
            "Content-Length: ",
            content_length.as_str(),
            CRLF,
            "Date: ",
            date.as_str(),
            CRLF,
            "Server: ",
            self.server_name.as_str(),
            CRLF,
            "Connection: close",
            CRLF,
            CRLF,
        ]
        .concat();
        [header.as_bytes(), self.content.as_deref().unwrap_or(&[])].concat()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn information(&self) -> &str {
        &self.information
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn content(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }
}

fn reason_phrase(code: u16) -> &'static str {
    match STATUS_CODES.get(&code) {
        Some(&phrase) => phrase,
        None => {
            error!("未登记的状态码：{}", code);
            match code {
                100..=199 => "Informational",
                200..=299 => "Success",
                300..=399 => "Redirection",
                400..=499 => "Client Error",
                _ => "Server Error",
            }
        }
    }
}

/// IMF-fixdate，例如 `Sun, 06 Nov 1994 08:49:37 GMT`
fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// 简单的错误页面生成器
struct ErrorPage {
    title: String,
    body: String,
}

impl ErrorPage {
    fn from_status_code(code: u16, note: Option<&str>) -> Self {
        let description = note.unwrap_or_else(|| reason_phrase(code));
        let body = format!(
            r"
            <h1>{}</h1>
            <p>{}</p>
            ",
            code, description
        );
        Self {
            title: code.to_string(),
            body,
        }
    }

    fn build(&self) -> String {
        format!(
            r##"<!DOCTYPE html>
            <html>
                <head>
                    <meta charset="utf-8">
                    <title>{}</title>
                    <style>
                    body {{
                        width: 35em;
                        margin: 0 auto;
                        font-family: Tahoma, Verdana, Arial, sans-serif;
                    }}
                    </style>
                </head>
                <body>
                {}
                </body>
            </html>"##,
            self.title, self.body
        )
    }
}
