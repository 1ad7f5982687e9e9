//! Remediation hints for queue error types.
//!
//! The backend tags queue failures with a free-form `error_type`. The console
//! shows the matching guidance next to each failed item.

/// Human-readable explanation of an error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guidance {
    pub title: &'static str,
    pub hints: &'static [&'static str],
}

const RATE_LIMIT: Guidance = Guidance {
    title: "Rate limit exceeded",
    hints: &[
        "Wait for the provider's rate window to reset before retrying",
        "Reduce polling frequency for this source",
    ],
};

const AUTH: Guidance = Guidance {
    title: "Authentication failed",
    hints: &[
        "Check that the source's API credentials are still valid",
        "Reconnect the account if the token was revoked",
    ],
};

const TIMEOUT: Guidance = Guidance {
    title: "Request timed out",
    hints: &[
        "The source responded too slowly; retrying usually succeeds",
        "Check the provider's status page if timeouts persist",
    ],
};

const PARSE: Guidance = Guidance {
    title: "Unexpected response format",
    hints: &[
        "The provider may have changed its API",
        "Inspect the raw error details and update the source parser",
    ],
};

const QUOTA: Guidance = Guidance {
    title: "Quota exhausted",
    hints: &[
        "The daily or monthly API quota is used up",
        "Upgrade the plan or disable the source until the quota resets",
    ],
};

const NETWORK: Guidance = Guidance {
    title: "Network error",
    hints: &[
        "Check outbound connectivity from the worker hosts",
        "Verify DNS resolution for the provider's API",
    ],
};

const UNKNOWN: Guidance = Guidance {
    title: "Unclassified error",
    hints: &["Inspect the error message and details, then reset the queue item to retry"],
};

/// Look up guidance for an error type. Matching is case-insensitive and
/// tolerant of the naming variants the workers use (`rate_limit`,
/// `RateLimitError`, `429`, ...).
pub fn guidance_for(error_type: Option<&str>) -> Guidance {
    let Some(kind) = error_type else {
        return UNKNOWN;
    };
    let kind: String = kind
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();

    if kind.contains("ratelimit") || kind.contains("toomanyrequests") || kind == "429" {
        RATE_LIMIT
    } else if kind.contains("quota") {
        QUOTA
    } else if kind.contains("auth")
        || kind.contains("unauthorized")
        || kind == "401"
        || kind == "403"
    {
        AUTH
    } else if kind.contains("timeout") || kind.contains("timedout") {
        TIMEOUT
    } else if kind.contains("parse") || kind.contains("json") || kind.contains("format") {
        PARSE
    } else if kind.contains("network") || kind.contains("connection") || kind.contains("dns") {
        NETWORK
    } else {
        UNKNOWN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naming_variants() {
        assert_eq!(guidance_for(Some("rate_limit")), RATE_LIMIT);
        assert_eq!(guidance_for(Some("RateLimitError")), RATE_LIMIT);
        assert_eq!(guidance_for(Some("429")), RATE_LIMIT);
        assert_eq!(guidance_for(Some("AUTH_FAILED")), AUTH);
        assert_eq!(guidance_for(Some("request-timeout")), TIMEOUT);
        assert_eq!(guidance_for(Some("json_parse")), PARSE);
        assert_eq!(guidance_for(Some("quota_exceeded")), QUOTA);
        assert_eq!(guidance_for(Some("ConnectionReset")), NETWORK);
    }

    #[test]
    fn test_unknown() {
        assert_eq!(guidance_for(None).title, "Unclassified error");
        assert_eq!(guidance_for(Some("weird")), UNKNOWN);
        assert!(!guidance_for(Some("")).hints.is_empty());
    }
}
