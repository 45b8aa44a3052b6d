//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载加载链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! ## 实现思路
//!
//! - 网络相关拆为两类：连接层失败（`Transport`）与远端按状态码拒绝
//!   （`RemoteRejected`，携带数字状态码供调用侧判断）。
//! - 存在性检查阶段的文件系统错误会被吞掉（统一视为“文件不存在”），
//!   而确认存在后的实际读取错误通过 `#[from] std::io::Error` 原样上抛。
//! - 所有错误对单次调用都是终态，库内部不做任何重试。

/// 图片加载统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// 输入未命中任何已知来源分类。
    #[error("不支持的图片来源")]
    UnsupportedSource,

    /// 连接层网络失败（DNS 解析、连接被拒、连接重置等）。
    #[error("网络传输错误：{0}")]
    Transport(String),

    /// 远端以非成功状态码拒绝请求（包括重定向预算耗尽后落下的 3xx）。
    #[error("远程来源拒绝，状态码 {status}")]
    RemoteRejected { status: u16 },

    /// 字节内容无法识别为任何已知类型（为空、损坏或格式未知），
    /// 以及 Base64 解码失败。
    #[error("解码错误：{0}")]
    Decode(String),

    /// URL / Location 头格式错误，或协议不受支持。
    #[error("格式错误：{0}")]
    InvalidFormat(String),

    /// 文件系统读取错误（存在性确认之后的阶段，原样透传）。
    #[error("文件错误：{0}")]
    Io(#[from] std::io::Error),
}

impl From<LoadError> for String {
    /// 兼容仍使用字符串错误的调用点。
    fn from(error: LoadError) -> Self {
        error.to_string()
    }
}
