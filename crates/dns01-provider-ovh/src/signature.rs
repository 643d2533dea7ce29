//! OVH request signature
//!
//! Every authenticated call carries
//! `X-Ovh-Signature: "$1$" + hex(sha1(secret+consumer+METHOD+url+body+timestamp))`,
//! fields joined with `+`. `url` is the full URL as sent, query string
//! included, and `body` is the exact request body (empty for GET/DELETE).

use sha1::{Digest, Sha1};

/// Compute the `X-Ovh-Signature` header value
pub fn sign(
    application_secret: &str,
    consumer_key: &str,
    method: &str,
    url: &str,
    body: &str,
    timestamp: i64,
) -> String {
    let payload = format!(
        "{}+{}+{}+{}+{}+{}",
        application_secret, consumer_key, method, url, body, timestamp
    );
    format!("$1${}", hex::encode(Sha1::digest(payload.as_bytes())))
}
