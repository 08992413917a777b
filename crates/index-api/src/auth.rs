//! Bearer 시크릿 검증.

use axum::http::{header, HeaderMap};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// `Authorization: Bearer <token>` 헤더에서 토큰을 추출합니다.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// 요청 토큰이 시크릿과 일치하는지 확인합니다.
pub fn verify_bearer(headers: &HeaderMap, secret: &SecretString) -> bool {
    match bearer_token(headers) {
        Some(token) => tokens_match(token.as_bytes(), secret.expose_secret().as_bytes()),
        None => false,
    }
}

/// 시크릿을 키로 한 HMAC 다이제스트끼리 비교합니다.
///
/// 다이제스트 길이는 항상 32바이트이고 `verify_slice`는 상수 시간 비교이므로,
/// 토큰 길이나 일치하는 접두사 길이가 응답 시간에 드러나지 않습니다.
fn tokens_match(token: &[u8], secret: &[u8]) -> bool {
    let digest = |message: &[u8]| {
        HmacSha256::new_from_slice(secret).map(|mut mac| {
            mac.update(message);
            mac
        })
    };
    let (Ok(expected), Ok(candidate)) = (digest(secret), digest(token)) else {
        return false;
    };
    candidate
        .verify_slice(&expected.finalize().into_bytes())
        .is_ok()
}
