use encoding_rs::Encoding;

use crate::error::AppError;

/// 按配置的编码把上传的主数据字节解码为文本
///
/// 有 BOM 时以 BOM 为准; 非法字节序列替换为 U+FFFD, 不会报错。
pub fn decode_feed(bytes: &[u8], label: &str) -> Result<String, AppError> {
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| AppError::UnknownEncoding(label.to_string()))?;

    let (decoded, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::warn!("Feed decoded as {} with replacement characters", used.name());
    }
    Ok(decoded.into_owned())
}
