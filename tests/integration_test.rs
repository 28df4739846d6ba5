// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 针对正在运行的服务进程的黑盒测试。
//!
//! 需要先在仓库根目录用默认配置启动服务（监听 127.0.0.1:7878），因此默认被忽略：
//! `cargo test --test integration_test -- --ignored`

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const ADDRESS: &str = "127.0.0.1:7878";

async fn send_request(request: &str) -> Result<String, String> {
    let mut stream = TcpStream::connect(ADDRESS)
        .await
        .map_err(|e| e.to_string())?;
    stream
        .write_all(request.as_bytes())
        .await
        .map_err(|e| e.to_string())?;
    let mut response = Vec::new();
    // 服务端每个响应后都会关闭连接
    stream
        .read_to_end(&mut response)
        .await
        .map_err(|e| e.to_string())?;
    Ok(String::from_utf8_lossy(&response).into_owned())
}

fn parse_response(response: &str) -> (u16, Vec<(String, String)>, String) {
    let (head, body) = match response.split_once("\r\n\r\n") {
        Some((head, body)) => (head, body.to_string()),
        None => (response, String::new()),
    };
    let mut lines = head.split("\r\n");

    // 解析状态行
    let status_code = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse::<u16>().ok())
        .unwrap_or(0);

    // 解析头部
    let headers = lines
        .filter_map(|line| line.split_once(": "))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    (status_code, headers, body)
}

fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[tokio::test]
    #[ignore] // 需要服务器运行时才能通过
    async fn test_get_home() {
        let response = send_request("GET / HTTP/1.1\r\nHost: localhost:7878\r\n\r\n")
            .await
            .expect("请确保服务器运行在端口7878");
        let (status_code, headers, body) = parse_response(&response);

        assert_eq!(status_code, 200);
        assert_eq!(header(&headers, "Server"), Some("logement-front"));
        assert_eq!(header(&headers, "Connection"), Some("close"));
        assert_eq!(
            header(&headers, "Content-Length").and_then(|l| l.parse::<usize>().ok()),
            Some(body.len())
        );
        assert!(body.contains("Bienvenue"));
    }

    #[tokio::test]
    #[ignore]
    async fn test_head_request() {
        let response = send_request("HEAD /logement/demande HTTP/1.1\r\nHost: localhost:7878\r\n\r\n")
            .await
            .expect("请确保服务器运行在端口7878");
        let (status_code, headers, body) = parse_response(&response);

        assert_eq!(status_code, 200);
        // HEAD 请求不应该有响应体，但应该有 Content-Length 头
        assert!(body.is_empty());
        assert!(header(&headers, "Content-Length").is_some());
    }

    #[tokio::test]
    #[ignore]
    async fn test_unknown_route_serves_home() {
        let response = send_request("GET /logement/inexistant HTTP/1.1\r\nHost: localhost:7878\r\n\r\n")
            .await
            .expect("请确保服务器运行在端口7878");
        let (status_code, _headers, body) = parse_response(&response);

        assert_eq!(status_code, 200);
        assert!(body.contains("Bienvenue"));
        assert!(body.contains("n'a pas été trouvée"));
    }

    #[tokio::test]
    #[ignore]
    async fn test_rejections() {
        for (request, expected) in [
            ("DELETE / HTTP/1.1\r\n\r\n", 405),
            ("GET / HTTP/2.0\r\n\r\n", 505),
            ("GET /%zz HTTP/1.1\r\n\r\n", 400),
        ] {
            let response = send_request(request).await.expect("请确保服务器运行在端口7878");
            let (status_code, _headers, _body) = parse_response(&response);
            assert_eq!(status_code, expected, "{:?}", request);
        }
    }

    #[tokio::test]
    #[ignore]
    async fn test_concurrent_requests() {
        let mut handles = vec![];

        for i in 0..10 {
            let handle = tokio::spawn(async move {
                let request = format!("GET /admin/{} HTTP/1.1\r\nHost: localhost:7878\r\n\r\n", i);
                send_request(&request).await
            });
            handles.push(handle);
        }

        let mut success_count = 0;
        for handle in handles {
            if let Ok(Ok(response)) = handle.await {
                if parse_response(&response).0 == 200 {
                    success_count += 1;
                }
            }
        }

        assert_eq!(success_count, 10, "并发请求失败: {}/10", success_count);
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_parse_response_basic() {
        let response = "HTTP/1.1 200 OK\r\nContent-Length: 5\r\nServer: test\r\n\r\nHello";
        let (status_code, headers, body) = parse_response(response);

        assert_eq!(status_code, 200);
        assert_eq!(headers.len(), 2);
        assert_eq!(body, "Hello");
    }

    #[test]
    fn test_parse_response_without_body() {
        let response = "HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\n\r\n";
        let (status_code, headers, body) = parse_response(response);

        assert_eq!(status_code, 400);
        assert_eq!(headers.len(), 1);
        assert!(body.is_empty());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\n\r\n";
        let (_, headers, _) = parse_response(response);

        assert_eq!(
            header(&headers, "content-type"),
            Some("text/html; charset=utf-8")
        );
        assert_eq!(header(&headers, "Server"), None);
    }
}
