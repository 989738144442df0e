pub mod http;
pub mod memory;
pub mod traits;
pub mod types;

pub use http::HttpTaskService;
pub use memory::MemoryTaskService;
pub use traits::TaskService;
pub use types::ClientConfig;
