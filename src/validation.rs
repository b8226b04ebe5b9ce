//! Input validation for the socket endpoint and outbound drafts.

/// Validates a websocket endpoint URL.
pub fn validate_socket_url(url: &str) -> Result<(), String> {
    if url.is_empty() {
        return Err("Socket URL cannot be empty".to_string());
    }

    let Some((scheme, rest)) = url.split_once("://") else {
        return Err("Socket URL must start with ws:// or wss://".to_string());
    };
    if scheme != "ws" && scheme != "wss" {
        return Err("Socket URL must start with ws:// or wss://".to_string());
    }

    if rest.is_empty() || rest.starts_with('/') {
        return Err("Socket URL is missing a host".to_string());
    }

    Ok(())
}

/// Strips characters the single-line chat event cannot carry.
pub fn sanitize_message(text: &str) -> String {
    text.chars().filter(|c| !c.is_control()).collect()
}
