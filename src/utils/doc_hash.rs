//! 文档标识
//!
//! 可信度查询需要一个由文档文本确定的标识。这里使用 base64 编码，
//! 它是可逆的编码而不是密码学哈希，只能当作不透明的标识使用。

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// 根据文档文本计算可信度查询使用的标识
pub fn document_identifier(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}
