use base64::Engine;
use base64::engine::general_purpose;

/// `Authorization` header value for HTTP Basic auth: `Basic base64(user:pass)`.
pub fn basic_auth_header(username: &str, password: &str) -> String {
    let encoded = general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}")
}

/// Masks a credential for log output, keeping only the first four characters.
pub fn redact(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}
