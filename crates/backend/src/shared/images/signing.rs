use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const FILE_ROUTE: &str = "/api/images/file";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("link has expired")]
    Expired,
    #[error("invalid signature")]
    Invalid,
}

/// Подпись ссылок вида `/api/images/file?path=..&expires=..&signature=..`
#[derive(Clone)]
pub struct UrlSigner {
    /// HMAC с уже установленным ключом, клонируется на каждую подпись
    mac: HmacSha256,
    ttl: Duration,
}

impl UrlSigner {
    /// Пустой `secret` заменяется случайным
    pub fn new(secret: &str, ttl_secs: i64) -> anyhow::Result<Self> {
        let secret = if secret.is_empty() {
            tracing::warn!("Image signing secret is not configured, generating a random one");
            Self::random_secret()
        } else {
            secret.as_bytes().to_vec()
        };
        let mac = HmacSha256::new_from_slice(&secret)
            .map_err(|e| anyhow::anyhow!("invalid image signing key: {e}"))?;
        Ok(Self {
            mac,
            ttl: Duration::seconds(ttl_secs.max(1)),
        })
    }

    fn keyed(&self, path: &str, expires: i64) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(path.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        mac
    }

    fn random_secret() -> Vec<u8> {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes.to_vec()
    }

    pub fn signature(&self, path: &str, expires: i64) -> String {
        URL_SAFE_NO_PAD.encode(self.keyed(path, expires).finalize().into_bytes())
    }

    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.ttl
    }

    pub fn sign(&self, path: &str, now: DateTime<Utc>) -> String {
        let expires = self.expires_at(now).timestamp();
        format!(
            "{}?path={}&expires={}&signature={}",
            FILE_ROUTE,
            urlencoding::encode(path),
            expires,
            self.signature(path, expires)
        )
    }

    pub fn verify(
        &self,
        path: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        let decoded = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| SignatureError::Invalid)?;
        self.keyed(path, expires)
            .verify_slice(&decoded)
            .map_err(|_| SignatureError::Invalid)?;
        if now.timestamp() > expires {
            return Err(SignatureError::Expired);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn signed_url_verifies_until_expiry() {
        let signer = UrlSigner::new("secret", 60).unwrap();
        let expires = signer.expires_at(now()).timestamp();
        let signature = signer.signature("categories/a.png", expires);

        assert!(signer.verify("categories/a.png", expires, &signature, now()).is_ok());
        assert_eq!(
            signer.verify("categories/a.png", expires, &signature, now() + Duration::seconds(61)),
            Err(SignatureError::Expired)
        );
    }

    #[test]
    fn tampering_is_detected() {
        let signer = UrlSigner::new("secret", 60).unwrap();
        let expires = signer.expires_at(now()).timestamp();
        let signature = signer.signature("categories/a.png", expires);

        assert_eq!(
            signer.verify("categories/b.png", expires, &signature, now()),
            Err(SignatureError::Invalid)
        );
        assert_eq!(
            signer.verify("categories/a.png", expires + 3600, &signature, now()),
            Err(SignatureError::Invalid)
        );
        let other = UrlSigner::new("other", 60).unwrap();
        assert_eq!(
            other.verify("categories/a.png", expires, &signature, now()),
            Err(SignatureError::Invalid)
        );
    }

    #[test]
    fn malformed_signature_is_rejected() {
        let signer = UrlSigner::new("secret", 60).unwrap();
        let expires = signer.expires_at(now()).timestamp();
        let mut signature = signer.signature("categories/a.png", expires);
        signature.truncate(signature.len() - 2);

        for bad in ["", "not base64!", signature.as_str()] {
            assert_eq!(
                signer.verify("categories/a.png", expires, bad, now()),
                Err(SignatureError::Invalid)
            );
        }
    }

    #[test]
    fn signature_is_hmac_sha256_of_path_and_expiry() {
        let signer = UrlSigner::new("secret", 60).unwrap();
        let mut mac = HmacSha256::new_from_slice(b"secret").unwrap();
        mac.update(b"categories/a.png\n1700000000");
        let expected = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        assert_eq!(signer.signature("categories/a.png", 1_700_000_000), expected);
    }

    #[test]
    fn url_escapes_the_path() {
        let signer = UrlSigner::new("secret", 60).unwrap();
        let url = signer.sign("categories/a b.png", now());
        assert!(url.starts_with("/api/images/file?path=categories%2Fa%20b.png&expires="));
        assert!(!url.ends_with('='));
    }

    #[test]
    fn random_secrets_differ() {
        let a = UrlSigner::new("", 60).unwrap();
        let b = UrlSigner::new("", 60).unwrap();
        assert_ne!(a.signature("x", 1), b.signature("x", 1));
    }
}
