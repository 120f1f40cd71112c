use url::Url;

use common::{Error, Result};

const CHAT_PATH: &str = "/chat/completions";

/// Turn a provider base URL into its chat-completions endpoint.
///
/// Full endpoint paths are kept as-is; bare hosts and `/v1` roots get the
/// standard suffix appended.
pub fn resolve_chat_endpoint(base: &str) -> Result<Url> {
    let raw = base.trim();
    if raw.is_empty() {
        return Err(Error::Config("tuner base_url is empty".into()));
    }
    let mut url =
        Url::parse(raw).map_err(|e| Error::Config(format!("invalid tuner base_url: {e}")))?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(Error::Config(format!("tuner base_url has no host: {raw}")));
    }

    let path = url.path().to_string();
    if path.ends_with(CHAT_PATH) {
        return Ok(url);
    }
    let new_path = match path.as_str() {
        "" | "/" => CHAT_PATH.to_string(),
        "/v1" | "/v1/" => format!("/v1{CHAT_PATH}"),
        other => format!("{}{CHAT_PATH}", other.trim_end_matches('/')),
    };
    url.set_path(&new_path);
    Ok(url)
}
