//! 哈希原语
//!
//! 首选 SHA-256；摘要器不可用时退回到 53 位非加密混合哈希 (cyrb53)。
//! 两条路径都是纯函数，对调用方永不失败。

use sha2::{Digest, Sha256};
use thiserror::Error;

/// 摘要器错误
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Digest unavailable: {0}")]
    Unavailable(String),
}

/// 加密摘要器抽象
///
/// 生产环境使用 [`Sha256Digester`]，测试可注入失败实现以覆盖退化路径
pub trait Digester: Send + Sync {
    /// 计算输入的十六进制摘要
    fn digest_hex(&self, input: &str) -> Result<String, DigestError>;
}

/// SHA-256 摘要器
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Digester;

impl Digester for Sha256Digester {
    fn digest_hex(&self, input: &str) -> Result<String, DigestError> {
        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

/// 计算稳定的十六进制摘要（SHA-256）
pub fn hash_hex(input: &str) -> String {
    hash_hex_with(&Sha256Digester, input)
}

/// 使用指定摘要器计算摘要，失败时静默退回 cyrb53
pub fn hash_hex_with(digester: &dyn Digester, input: &str) -> String {
    match digester.digest_hex(input) {
        Ok(hex) => hex,
        Err(e) => {
            tracing::debug!(error = %e, "Cryptographic digest failed, using fallback hash");
            cyrb53_hex(input, 0)
        }
    }
}

/// cyrb53 - 两个独立的 32 位乘-异或累加器，合成 53 位结果
///
/// 按 UTF-16 码元迭代，输出固定 13 位十六进制
pub fn cyrb53_hex(input: &str, seed: u32) -> String {
    let mut h1: u32 = 0xdead_beef ^ seed;
    let mut h2: u32 = 0x41c6_ce57 ^ seed;

    for unit in input.encode_utf16() {
        let ch = u32::from(unit);
        h1 = (h1 ^ ch).wrapping_mul(2_654_435_761);
        h2 = (h2 ^ ch).wrapping_mul(1_597_334_677);
    }

    h1 = (h1 ^ (h1 >> 16)).wrapping_mul(2_246_822_507)
        ^ (h2 ^ (h2 >> 13)).wrapping_mul(3_266_489_909);
    h2 = (h2 ^ (h2 >> 16)).wrapping_mul(2_246_822_507)
        ^ (h1 ^ (h1 >> 13)).wrapping_mul(3_266_489_909);

    let combined = (u64::from(h2 & 0x1f_ffff) << 32) | u64::from(h1);
    format!("{:013x}", combined)
}
