/// Detected rate-limit signal, per spec.md §4.5's termination condition
/// (e): error code 429, the token "rate limit" in an error message, or
/// `error_type == "rate_limit"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDetected {
    pub matched_on: String,
}

/// Check an agent session error for a rate-limit signal.
pub fn detect_rate_limit(message: &str, error_type: Option<&str>, status_code: Option<u32>) -> Option<RateLimitDetected> {
    if status_code == Some(429) {
        return Some(RateLimitDetected {
            matched_on: "429".to_string(),
        });
    }
    if error_type.is_some_and(|t| t == "rate_limit") {
        return Some(RateLimitDetected {
            matched_on: "error_type=rate_limit".to_string(),
        });
    }
    if message.to_lowercase().contains("rate limit") {
        return Some(RateLimitDetected {
            matched_on: "rate limit".to_string(),
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_429_status_code_fires() {
        assert!(detect_rate_limit("internal error", None, Some(429)).is_some());
    }

    #[test]
    fn test_error_type_fires() {
        assert!(detect_rate_limit("too busy", Some("rate_limit"), None).is_some());
    }

    #[test]
    fn test_message_substring_fires_case_insensitive() {
        let result = detect_rate_limit("You have hit a Rate Limit, please retry", None, None);
        assert!(result.is_some());
    }

    #[test]
    fn test_unrelated_error_does_not_fire() {
        assert!(detect_rate_limit("invalid prompt format", Some("validation"), Some(400)).is_none());
    }
}
