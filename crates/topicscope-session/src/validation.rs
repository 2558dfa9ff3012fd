use topicscope_gateway::GatewayError;
use url::Url;

/// Whether `candidate` looks like an absolute http(s) URL with a host
pub fn is_plausible_url(candidate: &str) -> bool {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return false;
    }
    match Url::parse(candidate) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// Local pre-flight check for a URL about to be sent to the backend
pub fn validate_url(candidate: &str) -> Result<String, GatewayError> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return Err(GatewayError::validation("Please enter a URL"));
    }
    if !is_plausible_url(trimmed) {
        return Err(GatewayError::validation(format!(
            "Invalid URL provided: {}",
            trimmed
        )));
    }
    Ok(trimmed.to_string())
}
