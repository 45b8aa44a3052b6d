//! # 网络取回模块
//!
//! ## 设计思路
//!
//! 负责“给定已解析 URL，产出完整响应体字节”这一件事。重定向处理存在两条
//! 语义不同的路径，二者实现同一取回接口（[`Transport`]），按
//! [`RedirectMode`](crate::config::RedirectMode) 选择，刻意不合并：
//!
//! - 委托路径：重定向完全交给传输层自带跟随策略，不执行 `max_redirects`；
//! - 手动路径：客户端关闭自动重定向，库内循环跟随 301/302 并显式扣减预算。
//!
//! ## 实现思路
//!
//! - 共享客户端按策略各一，惰性初始化（`OnceCell`）；仅当传输直通配置
//!   含客户端级字段时才构建一次性专用客户端。
//! - 连接层错误立即以 `Transport` 终止，任何状态下都不重试。
//! - 预算耗尽时的 301/302 不单列“重定向过多”错误，落入通用状态码检查后
//!   以 `RemoteRejected` 携带该 3xx 状态码返回。
//! - 响应体全量缓冲后才交给下游嗅探，不做流式解码，也不设体积上限。

use bytes::{Bytes, BytesMut};
use once_cell::sync::OnceCell;
use reqwest::redirect::Policy;
use reqwest::{Client, Url};

use crate::config::{LoadOptions, RedirectMode, RequestOptions};
use crate::error::LoadError;

/// 手动路径跟随的重定向状态码集合。
const REDIRECT_STATUSES: [u16; 2] = [301, 302];

static DELEGATED_CLIENT: OnceCell<Client> = OnceCell::new();
static MANUAL_CLIENT: OnceCell<Client> = OnceCell::new();

/// 取回接口：给定 URL 与配置，产出完整响应体。
pub(crate) trait Transport {
    async fn retrieve(&self, url: Url, options: &LoadOptions) -> Result<Bytes, LoadError>;
}

/// 按配置选择取回路径。
pub(crate) async fn retrieve(url: Url, options: &LoadOptions) -> Result<Bytes, LoadError> {
    log::info!("🌐 开始下载图片 - URL: {}", redact_url_for_log(&url));

    match options.redirect_mode {
        RedirectMode::Delegated => DelegatedTransport.retrieve(url, options).await,
        RedirectMode::Manual => ManualTransport.retrieve(url, options).await,
    }
}

/// 委托路径：重定向交给传输层，自身只检查最终状态并缓冲响应体。
pub(crate) struct DelegatedTransport;

impl Transport for DelegatedTransport {
    async fn retrieve(&self, url: Url, options: &LoadOptions) -> Result<Bytes, LoadError> {
        ensure_http_scheme(&url)?;

        let client = delegated_client(&options.request)?;
        let response = send_get(&client, url, options)
            .await
            .map_err(map_send_error)?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(LoadError::RemoteRejected { status });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| LoadError::Transport(format!("读取响应体失败：{}", e)))?;

        log::debug!("✅ 下载完成 - {} bytes", body.len());
        Ok(body)
    }
}

/// 手动路径：循环跟随 301/302，显式执行重定向预算。
pub(crate) struct ManualTransport;

impl Transport for ManualTransport {
    async fn retrieve(&self, url: Url, options: &LoadOptions) -> Result<Bytes, LoadError> {
        let mut current_url = url;
        let mut budget = options.redirect_budget();

        loop {
            ensure_http_scheme(&current_url)?;

            let client = manual_client(&options.request)?;
            let mut response = send_get(&client, current_url.clone(), options)
                .await
                .map_err(map_send_error)?;

            let status = response.status().as_u16();

            if REDIRECT_STATUSES.contains(&status) && budget > 0 {
                if let Some(location) = response.headers().get(reqwest::header::LOCATION) {
                    let location = location
                        .to_str()
                        .map_err(|e| LoadError::InvalidFormat(format!("重定向地址无效：{}", e)))?;

                    // 仅接受绝对地址，相对 Location 不作保证
                    let next_url = Url::parse(location)
                        .map_err(|e| LoadError::InvalidFormat(format!("重定向 URL 解析失败：{}", e)))?;

                    log::debug!("↪️ 跳转到: {}", redact_url_for_log(&next_url));
                    current_url = next_url;
                    budget -= 1;
                    continue;
                }
            }

            // 预算耗尽或缺少 Location 的 3xx 不单列错误，
            // 在这里与其它非成功状态一并以状态码拒绝
            if !(200..300).contains(&status) {
                return Err(LoadError::RemoteRejected { status });
            }

            let mut buffer = BytesMut::new();
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|e| LoadError::Transport(format!("下载失败：{}", e)))?
            {
                buffer.extend_from_slice(&chunk);
            }

            log::debug!("✅ 下载完成 - {} bytes", buffer.len());
            return Ok(buffer.freeze());
        }
    }
}

/// 发送带自定义头与逐请求超时的 GET。
async fn send_get(
    client: &Client,
    url: Url,
    options: &LoadOptions,
) -> Result<reqwest::Response, reqwest::Error> {
    let mut request = client.get(url);

    for (name, value) in &options.headers {
        request = request.header(name.as_str(), value.as_str());
    }

    if let Some(timeout) = options.request.timeout {
        request = request.timeout(timeout);
    }

    request.send().await
}

fn ensure_http_scheme(url: &Url) -> Result<(), LoadError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(LoadError::InvalidFormat(format!(
            "仅支持 HTTP/HTTPS，收到协议：{}",
            url.scheme()
        )));
    }

    Ok(())
}

fn map_send_error(e: reqwest::Error) -> LoadError {
    if e.is_connect() {
        LoadError::Transport(format!("无法连接：{}", e))
    } else if e.is_timeout() {
        LoadError::Transport(format!("请求超时：{}", e))
    } else {
        LoadError::Transport(format!("请求失败：{}", e))
    }
}

fn delegated_client(request: &RequestOptions) -> Result<Client, LoadError> {
    if request.needs_dedicated_client() {
        return build_client(request, Policy::default());
    }

    DELEGATED_CLIENT
        .get_or_try_init(|| build_client(&RequestOptions::default(), Policy::default()))
        .cloned()
}

fn manual_client(request: &RequestOptions) -> Result<Client, LoadError> {
    if request.needs_dedicated_client() {
        return build_client(request, Policy::none());
    }

    MANUAL_CLIENT
        .get_or_try_init(|| build_client(&RequestOptions::default(), Policy::none()))
        .cloned()
}

fn build_client(request: &RequestOptions, policy: Policy) -> Result<Client, LoadError> {
    let mut builder = Client::builder().redirect(policy);

    if let Some(connect_timeout) = request.connect_timeout {
        builder = builder.connect_timeout(connect_timeout);
    }
    if let Some(user_agent) = &request.user_agent {
        builder = builder.user_agent(user_agent.clone());
    }

    builder
        .build()
        .map_err(|e| LoadError::Transport(format!("无法创建 HTTP 客户端：{}", e)))
}

/// 日志用 URL 脱敏：仅保留协议、主机、端口与路径（查询串可能携带令牌）。
fn redact_url_for_log(url: &Url) -> String {
    let host = url.host_str().unwrap_or("<unknown-host>");
    let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();

    format!("{}://{}{}{}", url.scheme(), host, port, url.path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_url_for_log_removes_query_and_fragment() {
        let url = Url::parse("https://example.com:8443/path/img.png?token=abc123#hash")
            .expect("parse failed");

        assert_eq!(redact_url_for_log(&url), "https://example.com:8443/path/img.png");
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        let url = Url::parse("ftp://example.com/a.png").expect("parse failed");

        assert!(matches!(
            ensure_http_scheme(&url),
            Err(LoadError::InvalidFormat(_))
        ));
    }

    #[test]
    fn redirect_statuses_cover_exactly_301_and_302() {
        assert!(REDIRECT_STATUSES.contains(&301));
        assert!(REDIRECT_STATUSES.contains(&302));
        assert!(!REDIRECT_STATUSES.contains(&303));
        assert!(!REDIRECT_STATUSES.contains(&307));
    }
}
