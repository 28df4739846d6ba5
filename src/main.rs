// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 前端控制器服务
//!
//! 基于 Tokio 运行时的多线程前端控制器：
//! - 启动时载入配置与路由表，任一缺失或不合法都会终止进程
//! - 每个连接读取一个请求，交给 `FrontController` 生成页面
//! - 进程内 LRU 页面缓存保存已解析的路由
//! - 后台管理控制台（stop / status / flush / clear / help）

use logement::{
    cache::MemoryCache,
    page::php_version,
    Config, Exception, FrontController, PageCache, Request, Response, Router,
};

use log::{debug, error, info, warn, LevelFilter};
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    runtime::Builder,
    sync::Notify,
};

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    process,
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc,
    },
    time::Instant,
};

const LOG_CONFIG: &str = "config/log4rs.yaml";
const SERVER_CONFIG: &str = "config/development.toml";

fn main() {
    // 1. 日志系统：优先使用 YAML 配置，缺失时退回到标准错误输出
    if let Err(e) = log4rs::init_file(LOG_CONFIG, Default::default()) {
        eprintln!("无法从{}初始化日志系统：{}，改为输出到标准错误", LOG_CONFIG, e);
        init_stderr_logger();
    }

    // 2. 配置与路由表，均为启动期致命错误
    let config = match Config::from_toml(SERVER_CONFIG) {
        Ok(c) => c,
        Err(e) => exit_with(e),
    };
    info!("配置文件已载入");
    info!("页面目录：{}", config.pages_root().display());

    let backend: Arc<dyn PageCache> = Arc::new(
        MemoryCache::from_capacity(config.cache_size()).with_lifetime(config.cache_lifetime()),
    );
    let router = match Router::from_config(&config, backend) {
        Ok(r) => r,
        Err(e) => exit_with(e),
    };
    info!("首页：{}", router.home_file().display());

    // 3. 外部依赖探测
    match php_version() {
        Some(version) => info!("找到PHP解释器，版本：{}", version),
        None => warn!("无法找到PHP解释器。服务器将继续运行，但将无法渲染PHP页面。"),
    }

    // 4. 按配置的线程数构建运行时
    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(r) => r,
        Err(e) => {
            error!("无法构建Tokio运行时：{}", e);
            process::exit(1);
        }
    };

    let controller = Arc::new(FrontController::new(Arc::new(config), Arc::new(router)));
    runtime.block_on(serve(controller));
}

async fn serve(controller: Arc<FrontController>) {
    let config = controller.config();
    let port = config.port();
    let address = match config.local() {
        true => Ipv4Addr::new(127, 0, 0, 1),
        false => Ipv4Addr::new(0, 0, 0, 0),
    };
    info!("服务端将在{}:{}上监听Socket连接", address, port);

    let listener = match TcpListener::bind(SocketAddrV4::new(address, port)).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("无法绑定端口：{}，错误：{}", port, e);
            process::exit(1);
        }
    };
    info!("端口{}绑定完成", port);

    let shutdown = Arc::new(Notify::new());
    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let active_connection = Arc::new(AtomicU32::new(0));

    // 管理控制台
    tokio::spawn(console(
        Arc::clone(&controller),
        Arc::clone(&shutdown),
        Arc::clone(&shutdown_flag),
        Arc::clone(&active_connection),
    ));

    let mut id: u128 = 0;
    loop {
        if shutdown_flag.load(Ordering::SeqCst) {
            break;
        }
        let (mut stream, addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("接受连接失败：{}", e);
                    continue;
                }
            },
            _ = shutdown.notified() => break,
        };
        debug!("[ID{}]TCP连接已建立：{}", id, addr);

        let controller = Arc::clone(&controller);
        let active_connection = Arc::clone(&active_connection);
        tokio::spawn(async move {
            active_connection.fetch_add(1, Ordering::SeqCst);
            handle_connection(&mut stream, id, &controller).await;
            active_connection.fetch_sub(1, Ordering::SeqCst);
        });
        id += 1;
    }
    info!("主循环接收到停机指令，正在退出...");
}

async fn console(
    controller: Arc<FrontController>,
    shutdown: Arc<Notify>,
    shutdown_flag: Arc<AtomicBool>,
    active_connection: Arc<AtomicU32>,
) {
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut input = String::new();
    loop {
        input.clear();
        match reader.read_line(&mut input).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let cache = controller.router().cache();
        match input.trim() {
            "stop" => {
                shutdown_flag.store(true, Ordering::SeqCst);
                shutdown.notify_one();
                println!("停机指令已激活，服务器将停止接受新的连接...");
                break;
            }
            "status" => {
                println!("== 前端控制器状态 ==");
                println!("当前活跃连接数: {}", active_connection.load(Ordering::SeqCst));
                println!("已缓存的路由数: {}", cache.len());
                println!("缓存写回策略: {:?}", cache.policy());
                println!("====================");
            }
            "flush" => match cache.invalidate() {
                Ok(true) => println!("路由缓存已清空"),
                Ok(false) => println!("路由缓存本来就是空的"),
                Err(e) => println!("清空路由缓存失败：{}", e),
            },
            "clear" => match cache.clear_all() {
                Ok(()) => println!("页面缓存已全部清空"),
                Err(e) => println!("清空页面缓存失败：{}", e),
            },
            "help" => {
                println!("== Front Controller Help ==");
                println!("stop   - 发出停机信号");
                println!("status - 查看当前运行状态");
                println!("flush  - 丢弃所有已缓存的路由");
                println!("clear  - 清空整个页面缓存");
                println!("help   - 显示此帮助信息");
                println!("===========================");
            }
            "" => {}
            cmd => println!("无效的命令：{}", cmd),
        }
    }
}

async fn handle_connection(stream: &mut TcpStream, id: u128, controller: &FrontController) {
    let mut buffer = vec![0; 1024];

    if let Err(e) = stream.readable().await {
        error!("[ID{}]等待TCPStream可读时遇到错误: {}", id, e);
        return;
    }
    let n = match stream.try_read(&mut buffer) {
        Ok(0) => return,
        Ok(n) => n,
        Err(e) => {
            error!("[ID{}]读取TCPStream时遇到错误: {}", id, e);
            return;
        }
    };
    debug!("[ID{}]HTTP请求接收完毕", id);

    let start_time = Instant::now();

    let response = match Request::try_from(&buffer[..n], id) {
        Ok(request) => {
            let response = controller.handle(&request, id);
            info!(
                "[ID{}] {}, {}, {}, {}, {}, {}",
                id,
                request.version(),
                request.path(),
                request.method(),
                response.status_code(),
                response.information(),
                request.user_agent(),
            );
            response
        }
        Err(e) => {
            warn!("[ID{}]解析HTTP请求失败: {}", id, e);
            match e {
                Exception::UnSupportedRequestMethod => Response::response_405(id),
                Exception::UnsupportedHttpVersion => Response::response_505(id),
                _ => Response::response_400(id),
            }
        }
    };

    debug!(
        "[ID{}]HTTP响应构建完成，服务端用时{}ms。",
        id,
        start_time.elapsed().as_millis()
    );

    let response_bytes = response.as_bytes();
    if let Err(e) = stream.write_all(&response_bytes).await {
        error!("[ID{}]发送响应失败: {}", id, e);
        return;
    }
    let _ = stream.flush().await;
}

fn init_stderr_logger() {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{d} {l} - {m}{n}")))
        .build();
    let config = log4rs::Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Info));
    match config {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                eprintln!("无法初始化日志系统：{}", e);
            }
        }
        Err(e) => eprintln!("日志配置不合法：{}", e),
    }
}

fn exit_with(e: Exception) -> ! {
    error!("启动失败：{}", e);
    process::exit(1);
}
