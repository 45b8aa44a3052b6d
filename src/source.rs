//! # 数据源与输出模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”与“最终输出”解耦：
//! - `ImageSource` 表示外部来源语义，变体声明顺序即分类优先级
//! - `ByteLike` 表示可无损转为字节缓冲的“类字节结构”
//! - `ForeignImage` 表示保留了原始编码字节的外部互操作图片句柄
//! - `LoadedImage` 表示已完成 MIME 识别的最终结果（字节 + MIME）
//!
//! ## 实现思路
//!
//! - 分类不做运行时形状探测，由调用方通过变体（或 `From` 转换）显式标注。
//! - 字节载荷统一落在 `bytes::Bytes` 上，克隆与传递零拷贝。
//! - MIME 识别委托 `infer`（魔数探测，与文件名/扩展名无关）。

use bytes::Bytes;
use tokio::io::AsyncRead;

use crate::error::LoadError;

/// 可读异步字节流来源。
///
/// 排空时按到达顺序累积分块，流结束后一次性拼接（见 `loader::drain_stream`）。
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// 图片输入来源。
///
/// 变体声明顺序即分类优先级（首个命中生效），这是显式策略而非实现巧合：
///
/// 1. `Image` — 本库自有已加载结果，原样返回
/// 2. `Stream` — 可读字节流，完整排空后识别
/// 3. `Bytes` — 原始字节缓冲，不复制直接识别
/// 4. `ByteLike` — 类字节结构，复制规整化为字节缓冲后识别
/// 5. `Foreign` — 外部图片句柄，取其保留的原始字节重新识别
/// 6. `Text` — 字符串：Data URI / 本地文件路径 / 远程 URL
/// 7. `Url` — 已解析 URL：本地 `file` 路径或远程地址
pub enum ImageSource {
    /// 本库自有的已加载图片，直接透传。
    Image(LoadedImage),
    /// 可读字节流来源。
    Stream(ByteStream),
    /// 原始字节缓冲来源（零拷贝）。
    Bytes(Bytes),
    /// 类字节结构来源（复制规整化）。
    ByteLike(ByteLike),
    /// 外部互操作图片句柄来源。
    Foreign(ForeignImage),
    /// 文本来源（Data URI / 路径 / URL 字符串）。
    Text(String),
    /// 已解析 URL 来源。
    Url(reqwest::Url),
}

/// 类字节结构：非标准字节缓冲、但可无损规整为字节缓冲的输入。
///
/// 宽元素（u16 / u32）按“逐元素截取低 8 位”规整为字节。
pub enum ByteLike {
    /// 字节数组。
    U8(Vec<u8>),
    /// 16 位元素数组（逐元素截断为字节）。
    U16(Vec<u16>),
    /// 32 位元素数组（逐元素截断为字节）。
    U32(Vec<u32>),
}

impl ByteLike {
    /// 复制规整化为标准字节缓冲。
    pub(crate) fn into_bytes(self) -> Bytes {
        match self {
            ByteLike::U8(values) => Bytes::from(values),
            ByteLike::U16(values) => values.into_iter().map(|v| v as u8).collect::<Vec<u8>>().into(),
            ByteLike::U32(values) => values.into_iter().map(|v| v as u8).collect::<Vec<u8>>().into(),
        }
    }
}

/// 外部互操作图片句柄。
///
/// 面向“来自画布/解码库、但仍保留原始编码字节”的图片对象；
/// 本库只取其 `src` 字节并重新走统一的识别流程，不关心其内部状态。
pub struct ForeignImage {
    src: Bytes,
}

impl ForeignImage {
    /// 用外部句柄保留的原始编码字节构造。
    pub fn new(src: impl Into<Bytes>) -> Self {
        Self { src: src.into() }
    }

    /// 取出底层原始字节。
    pub(crate) fn into_src(self) -> Bytes {
        self.src
    }
}

/// 加载结果：原始字节与嗅探出的 MIME。
///
/// 一经返回即归调用方所有，本库不保留任何引用；克隆为零拷贝。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    bytes: Bytes,
    mime: String,
}

impl LoadedImage {
    /// 对已完整落盘/落内存的字节执行 MIME 嗅探并打包结果。
    ///
    /// 所有产出字节的加载路径最终都汇聚到这里；空缓冲或无法识别的
    /// 内容返回 [`LoadError::Decode`]。
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Result<Self, LoadError> {
        let bytes = bytes.into();

        if bytes.is_empty() {
            return Err(LoadError::Decode("图片内容为空".to_string()));
        }

        let kind = infer::get(&bytes)
            .ok_or_else(|| LoadError::Decode("无法识别图片类型".to_string()))?;

        Ok(Self {
            bytes,
            mime: kind.mime_type().to_string(),
        })
    }

    /// 原始字节载荷。
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// 嗅探出的 MIME 字符串（如 `image/png`）。
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// 拆解为（字节，MIME）。
    pub fn into_parts(self) -> (Bytes, String) {
        (self.bytes, self.mime)
    }
}

impl From<LoadedImage> for ImageSource {
    fn from(image: LoadedImage) -> Self {
        ImageSource::Image(image)
    }
}

impl From<ByteStream> for ImageSource {
    fn from(stream: ByteStream) -> Self {
        ImageSource::Stream(stream)
    }
}

impl From<Bytes> for ImageSource {
    fn from(bytes: Bytes) -> Self {
        ImageSource::Bytes(bytes)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(values: Vec<u8>) -> Self {
        ImageSource::ByteLike(ByteLike::U8(values))
    }
}

impl From<&[u8]> for ImageSource {
    fn from(values: &[u8]) -> Self {
        ImageSource::ByteLike(ByteLike::U8(values.to_vec()))
    }
}

impl From<Vec<u16>> for ImageSource {
    fn from(values: Vec<u16>) -> Self {
        ImageSource::ByteLike(ByteLike::U16(values))
    }
}

impl From<Vec<u32>> for ImageSource {
    fn from(values: Vec<u32>) -> Self {
        ImageSource::ByteLike(ByteLike::U32(values))
    }
}

impl From<ForeignImage> for ImageSource {
    fn from(foreign: ForeignImage) -> Self {
        ImageSource::Foreign(foreign)
    }
}

impl From<String> for ImageSource {
    fn from(text: String) -> Self {
        ImageSource::Text(text)
    }
}

impl From<&str> for ImageSource {
    fn from(text: &str) -> Self {
        ImageSource::Text(text.to_string())
    }
}

impl From<reqwest::Url> for ImageSource {
    fn from(url: reqwest::Url) -> Self {
        ImageSource::Url(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    #[test]
    fn from_bytes_rejects_empty_buffer() {
        let result = LoadedImage::from_bytes(Bytes::new());

        assert!(matches!(result, Err(LoadError::Decode(_))));
    }

    #[test]
    fn from_bytes_rejects_unrecognizable_payload() {
        let result = LoadedImage::from_bytes(&b"definitely not an image"[..]);

        assert!(matches!(result, Err(LoadError::Decode(_))));
    }

    #[test]
    fn from_bytes_sniffs_png_signature() {
        let mut data = PNG_SIGNATURE.to_vec();
        data.extend_from_slice(&[0, 0, 0, 13]);

        let image = LoadedImage::from_bytes(data.clone()).expect("sniff failed");

        assert_eq!(image.mime(), "image/png");
        assert_eq!(image.bytes().as_ref(), data.as_slice());
    }

    #[test]
    fn byte_like_u16_truncates_each_element_to_low_byte() {
        let canonical = ByteLike::U16(vec![0x0041, 0x1242, 0xFF43]).into_bytes();

        assert_eq!(canonical.as_ref(), b"ABC");
    }

    #[test]
    fn byte_like_u32_truncates_each_element_to_low_byte() {
        let canonical = ByteLike::U32(vec![0xDEAD_BE61, 0x0000_0062]).into_bytes();

        assert_eq!(canonical.as_ref(), b"ab");
    }

    proptest! {
        #[test]
        fn byte_like_u8_canonicalization_is_content_preserving(values in proptest::collection::vec(any::<u8>(), 0..256)) {
            let canonical = ByteLike::U8(values.clone()).into_bytes();

            prop_assert_eq!(canonical.as_ref(), values.as_slice());
        }

        #[test]
        fn byte_like_u16_matches_per_element_truncation(values in proptest::collection::vec(any::<u16>(), 0..256)) {
            let expected: Vec<u8> = values.iter().map(|v| (v & 0xFF) as u8).collect();
            let canonical = ByteLike::U16(values).into_bytes();

            prop_assert_eq!(canonical.as_ref(), expected.as_slice());
        }
    }
}
