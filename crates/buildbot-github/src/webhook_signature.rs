use anyhow::{anyhow, bail, Context, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Verifies a GitHub `X-Hub-Signature-256` header against the raw request
/// body. The header carries `sha256=<hex>` over an HMAC-SHA256 of the payload
/// keyed with the webhook secret.
pub fn verify_webhook_signature(payload: &[u8], signature: &str, secret: &str) -> Result<()> {
    let Some(digest_hex) = signature.strip_prefix("sha256=") else {
        bail!("github webhook signature must use sha256=<hex> format");
    };
    let signature_bytes = decode_hex(digest_hex)?;
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .context("failed to initialize webhook HMAC verifier")?;
    mac.update(payload);
    mac.verify_slice(&signature_bytes)
        .map_err(|_| anyhow!("webhook signature verification failed"))
}

fn decode_hex(value: &str) -> Result<Vec<u8>> {
    let raw = value.as_bytes();
    if raw.len() % 2 != 0 {
        bail!("webhook signature hex must have an even length");
    }
    let mut bytes = Vec::with_capacity(raw.len() / 2);
    for pair in raw.chunks_exact(2) {
        let hex = std::str::from_utf8(pair).context("webhook signature is not valid hex")?;
        let byte =
            u8::from_str_radix(hex, 16).context("webhook signature is not valid hex")?;
        bytes.push(byte);
    }
    Ok(bytes)
}
