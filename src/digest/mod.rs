pub mod config;
pub mod content;
pub mod deliver;
pub mod fetch;
pub mod http;
pub mod paths;
pub mod pipeline;
pub mod probe;
pub mod prompt;
pub mod scheduler;
pub mod sink;
pub mod summarize;
pub mod util;
