//! # 配置模块
//!
//! ## 设计思路
//!
//! 将网络取回阶段所有“可调策略”集中到 `LoadOptions`，保证行为可观测、可测试。
//! 各字段相互独立，没有跨字段校验；`Default` 即生产可用配置。
//!
//! ## 实现思路
//!
//! - `max_redirects` 仅对手动重定向路径生效（见 [`RedirectMode`]），
//!   未设置时使用默认预算 20。
//! - `RequestOptions` 是传输层直通配置：请求超时逐请求应用，
//!   连接超时与 User-Agent 属于客户端级设置，出现时会触发构建专用客户端。
//! - 本库自身不实现任何超时与取消，全部依赖这里透传给传输层的配置。

use std::collections::HashMap;
use std::time::Duration;

/// 默认最大重定向次数。
pub const DEFAULT_MAX_REDIRECTS: usize = 20;

/// 重定向处理路径选择。
///
/// 两条路径实现同一取回接口，但重定向上限语义不同，调用方按需选择。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectMode {
    /// 重定向完全委托给传输层（reqwest 自带跟随策略，有其自身上限）。
    ///
    /// 此路径不执行 `max_redirects`，适合传输层自带完整跟随能力的场景。
    #[default]
    Delegated,
    /// 库内手动循环跟随 301/302，显式执行 `max_redirects` 预算。
    Manual,
}

/// 网络取回配置。
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// 附加到出站请求的头（两条取回路径均生效）。
    pub headers: HashMap<String, String>,
    /// 最大重定向次数（非负；仅手动路径生效，默认 20）。
    pub max_redirects: Option<usize>,
    /// 传输层直通配置。
    pub request: RequestOptions,
    /// 重定向处理路径。
    pub redirect_mode: RedirectMode,
}

impl LoadOptions {
    /// 当前生效的重定向预算。
    pub(crate) fn redirect_budget(&self) -> usize {
        self.max_redirects.unwrap_or(DEFAULT_MAX_REDIRECTS)
    }
}

/// 传输层直通配置。
///
/// 字段均为可选；全部缺省时两条路径复用全局惰性初始化的共享客户端。
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// 建立连接（TCP/TLS）超时。
    pub connect_timeout: Option<Duration>,
    /// 单次请求总超时（含响应体读取）。
    pub timeout: Option<Duration>,
    /// 自定义 User-Agent。
    pub user_agent: Option<String>,
}

impl RequestOptions {
    /// 是否包含客户端级设置（需要构建专用客户端而非复用共享客户端）。
    pub(crate) fn needs_dedicated_client(&self) -> bool {
        self.connect_timeout.is_some() || self.user_agent.is_some()
    }
}
