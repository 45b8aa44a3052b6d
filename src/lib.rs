//! # image-loader — 统一图片来源加载库
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       调用方                              │
//! │   load_image(source, &options) → LoadedImage / LoadError │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↓
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↓                                                  │
//! │  ┌─ source ──── ImageSource 分类（变体顺序即优先级）       │
//! │  │                                                       │
//! │  ├─ loader ──── 分发 + Data URI 解码 + 流排空 + 文件读取   │
//! │  │                                                       │
//! │  ├─ fetch ───── 网络取回（委托 / 手动两条重定向路径）       │
//! │  │                                                       │
//! │  ├─ config ──── LoadOptions / RequestOptions             │
//! │  └─ error ───── LoadError（统一错误类型）                  │
//! │                                                          │
//! │  所有产出字节的路径汇聚到 LoadedImage::from_bytes：        │
//! │  完整落内存 → infer 魔数嗅探 → (字节, MIME) 打包           │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`source`] | 来源分类 `ImageSource`、类字节规整、输出模型 `LoadedImage` |
//! | [`loader`] | 分类分发、Data URI 解码、流排空、本地文件读取 |
//! | [`fetch`] | 网络取回：委托路径与手动重定向循环（301/302 + 预算） |
//! | [`config`] | 取回配置：自定义头、重定向预算、传输层直通参数 |
//! | [`error`] | 统一错误类型 `LoadError` |
//!
//! ## 行为要点
//!
//! - 单次调用即单个逻辑操作，调用间无共享可变状态；
//!   重定向严格串行，同一时刻最多一个在途请求。
//! - 重定向上限仅手动路径（[`RedirectMode::Manual`]）执行；
//!   委托路径由传输层按自身策略跟随，不受 `max_redirects` 约束。
//! - 库内不做任何重试与缓存；超时完全来自 [`RequestOptions`] 透传。

pub mod config;
pub mod error;
pub mod source;

mod fetch;
mod loader;

pub use config::{DEFAULT_MAX_REDIRECTS, LoadOptions, RedirectMode, RequestOptions};
pub use error::LoadError;
pub use loader::load_image;
pub use source::{ByteLike, ByteStream, ForeignImage, ImageSource, LoadedImage};
