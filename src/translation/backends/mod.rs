//! 翻译后端
//!
//! - [`ShellBackend`]: 调用本地命令行翻译工具
//! - [`RemoteBackend`]: 转发给另一个节点

pub mod remote;
pub mod shell;

pub use remote::RemoteBackend;
pub use shell::ShellBackend;
