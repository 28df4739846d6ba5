pub mod cache;
pub mod config;
pub mod descriptor;
pub mod dispatch;
pub mod exception;
pub mod layout;
pub mod page;
pub mod param;
pub mod request;
pub mod resolution;
pub mod response;
pub mod route_table;
pub mod router;

pub use cache::{MemoryCache, PageCache};
pub use config::Config;
pub use descriptor::RequestDescriptor;
pub use dispatch::FrontController;
pub use exception::Exception;
pub use param::{HttpRequestMethod, HttpVersion, MessageLevel};
pub use request::Request;
pub use resolution::{CachePolicy, ResolutionCache};
pub use response::Response;
pub use route_table::RouteTable;
pub use router::{ResolutionOutcome, Router};
