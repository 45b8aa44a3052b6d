//! # 来源分类与加载模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（已加载结果 / 流 / 字节 / 类字节 / 外部句柄 / Data URI /
//! 本地文件 / 远程 URL）的原始字节加载。分类按 [`ImageSource`] 变体顺序
//! 首个命中生效，所有产出字节的路径最终汇聚到
//! [`LoadedImage::from_bytes`] 做 MIME 嗅探与打包。
//!
//! ## 实现思路
//!
//! - Data URI：取首个逗号后的载荷；逗号前出现字面量 `base64` 则按 Base64
//!   解码，否则按 UTF-8 原文取字节。URI 自带的类型声明不做解析，
//!   MIME 一律由下游嗅探重新推导。
//! - 流：按到达顺序累积分块，流结束后一次性拼接，保证嗅探前字节完整落内存。
//! - 文件：存在性检查吞掉一切文件系统错误（统一视为不存在）；
//!   确认存在后的读取错误原样上抛。
//! - 网络：委托 `fetch` 模块（两条重定向路径见该模块文档）。

use std::path::Path;

use base64::{Engine as _, engine::general_purpose};
use bytes::{Bytes, BytesMut};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use tokio::io::AsyncReadExt;

use crate::config::LoadOptions;
use crate::error::LoadError;
use crate::fetch;
use crate::source::{ByteStream, ImageSource, LoadedImage};

static DATA_URI: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*data:").unwrap());

const STREAM_CHUNK_SIZE: usize = 8 * 1024;

/// 将任意图片来源解析为已识别 MIME 的加载结果。
///
/// 分类优先级与失败语义见 [`ImageSource`] 与 [`LoadError`]；
/// 未命中任何分类时返回 [`LoadError::UnsupportedSource`]。
///
/// # 示例
/// ```rust,ignore
/// use image_loader::{load_image, LoadOptions};
///
/// let image = load_image("https://example.com/a.png", &LoadOptions::default()).await?;
/// println!("{} ({} bytes)", image.mime(), image.bytes().len());
/// # Ok::<(), image_loader::LoadError>(())
/// ```
pub async fn load_image(
    source: impl Into<ImageSource>,
    options: &LoadOptions,
) -> Result<LoadedImage, LoadError> {
    match source.into() {
        // 已是本库加载结果，原样返回，不重新嗅探
        ImageSource::Image(image) => Ok(image),
        ImageSource::Stream(stream) => LoadedImage::from_bytes(drain_stream(stream).await?),
        // 原始字节缓冲零拷贝进入嗅探
        ImageSource::Bytes(bytes) => LoadedImage::from_bytes(bytes),
        ImageSource::ByteLike(byte_like) => LoadedImage::from_bytes(byte_like.into_bytes()),
        // 外部句柄只取其保留的原始字节，重新走统一识别
        ImageSource::Foreign(foreign) => LoadedImage::from_bytes(foreign.into_src()),
        ImageSource::Text(text) => load_from_text(&text, options).await,
        ImageSource::Url(url) => load_from_url(url, options).await,
    }
}

/// 文本来源：Data URI → 本地文件 → 远程 URL，依次尝试。
async fn load_from_text(text: &str, options: &LoadOptions) -> Result<LoadedImage, LoadError> {
    if DATA_URI.is_match(text) {
        log::info!("📝 开始解析 Data URI 图片");
        return LoadedImage::from_bytes(decode_data_uri(text)?);
    }

    let path = Path::new(text);
    if exists(path).await {
        return load_from_file(path).await;
    }

    match Url::parse(text) {
        Ok(url) => LoadedImage::from_bytes(fetch::retrieve(url, options).await?),
        // 既不是文件也不是可解析 URL：未命中任何分类
        Err(_) => Err(LoadError::UnsupportedSource),
    }
}

/// 已解析 URL 来源：`file` 协议且指向存在的本地文件时直接读取，否则走网络。
async fn load_from_url(url: Url, options: &LoadOptions) -> Result<LoadedImage, LoadError> {
    if url.scheme() == "file" {
        if let Ok(path) = url.to_file_path() {
            if exists(&path).await {
                return load_from_file(&path).await;
            }
        }
    }

    LoadedImage::from_bytes(fetch::retrieve(url, options).await?)
}

/// 从本地路径加载图片原始字节。
///
/// 存在性已由调用方确认；此处的读取错误原样上抛
/// （检查与读取之间的竞态是已知且保留的边界情况）。
async fn load_from_file(path: &Path) -> Result<LoadedImage, LoadError> {
    log::info!("📁 开始读取本地图片 - 路径: {}", path.display());

    let bytes = tokio::fs::read(path).await?;
    LoadedImage::from_bytes(bytes)
}

/// 非破坏性存在性检查。
///
/// 任何失败（不存在、无权限、路径非法）统一折叠为 `false`，从不上抛。
async fn exists(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok()
}

/// 解码 Data URI 载荷。
fn decode_data_uri(text: &str) -> Result<Vec<u8>, LoadError> {
    let (head, payload) = split_data_uri(text);

    if head.contains("base64") {
        general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| LoadError::Decode(format!("Base64 解码失败：{}", e)))
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

/// 以首个逗号为界拆分 Data URI：（逗号前，载荷）。
///
/// 没有逗号时载荷为空切片，下游嗅探会以空内容拒绝。
fn split_data_uri(text: &str) -> (&str, &str) {
    match text.find(',') {
        Some(idx) => (&text[..idx], &text[idx + 1..]),
        None => (text, ""),
    }
}

/// 完整排空字节流：分块按到达顺序累积，流结束后一次性拼接。
async fn drain_stream(mut stream: ByteStream) -> Result<Bytes, LoadError> {
    let mut chunks: Vec<Bytes> = Vec::new();
    let mut total = 0usize;
    let mut buf = [0u8; STREAM_CHUNK_SIZE];

    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }

        total += n;
        chunks.push(Bytes::copy_from_slice(&buf[..n]));
    }

    let mut joined = BytesMut::with_capacity(total);
    for chunk in &chunks {
        joined.extend_from_slice(chunk);
    }

    log::debug!("✅ 流排空完成 - {} bytes", total);
    Ok(joined.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn data_uri_base64_payload_decodes_to_hello() {
        let payload = decode_data_uri("data:text/plain;base64,SGVsbG8=").expect("decode failed");

        assert_eq!(payload, b"Hello");
    }

    #[test]
    fn data_uri_without_base64_marker_decodes_as_literal_utf8() {
        let payload = decode_data_uri("data:,aGVsbG8").expect("decode failed");

        assert_eq!(payload, b"aGVsbG8");
    }

    #[test]
    fn data_uri_base64_marker_after_comma_is_ignored() {
        let payload = decode_data_uri("data:,base64").expect("decode failed");

        assert_eq!(payload, b"base64");
    }

    #[test]
    fn data_uri_without_comma_yields_empty_payload() {
        let payload = decode_data_uri("data:image/png").expect("decode failed");

        assert!(payload.is_empty());
    }

    #[test]
    fn data_uri_invalid_base64_fails_with_decode_error() {
        let result = decode_data_uri("data:;base64,@@@@");

        assert!(matches!(result, Err(LoadError::Decode(_))));
    }

    #[test]
    fn data_uri_pattern_allows_leading_whitespace() {
        assert!(DATA_URI.is_match("  \tdata:,x"));
        assert!(DATA_URI.is_match("data:,x"));
        assert!(!DATA_URI.is_match("xdata:,x"));
    }

    #[tokio::test]
    async fn exists_check_is_false_for_missing_path() {
        assert!(!exists(Path::new("/definitely/not/here/img.png")).await);
    }

    #[tokio::test]
    async fn exists_check_is_false_for_malformed_path() {
        // 内嵌 NUL 的路径在任何平台都非法，检查只折叠为 false、不上抛
        assert!(!exists(Path::new("bad\0path.png")).await);
        assert!(!exists(Path::new("http://example.com/a.png")).await);
    }

    #[tokio::test]
    async fn drain_stream_preserves_byte_order_across_chunks() {
        let data: Vec<u8> = (0..=255u8).cycle().take(STREAM_CHUNK_SIZE * 2 + 17).collect();
        let stream: ByteStream = Box::new(std::io::Cursor::new(data.clone()));

        let drained = drain_stream(stream).await.expect("drain failed");

        assert_eq!(drained.as_ref(), data.as_slice());
    }

    proptest! {
        #[test]
        fn split_data_uri_payload_is_everything_after_first_comma(
            head in "[^,]{0,32}",
            payload in "\\PC{0,64}",
        ) {
            let uri = format!("{},{}", head, payload);
            let (split_head, split_payload) = split_data_uri(&uri);

            prop_assert_eq!(split_head, head.as_str());
            prop_assert_eq!(split_payload, payload.as_str());
        }

        #[test]
        fn plain_text_payload_roundtrips_without_base64_marker(payload in "[a-zA-Z0-9+/=]{0,64}") {
            let uri = format!("data:,{}", payload);
            let decoded = decode_data_uri(&uri).expect("decode failed");

            prop_assert_eq!(decoded, payload.as_bytes().to_vec());
        }
    }
}
