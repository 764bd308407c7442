use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use sha2::{Digest, Sha256};

const EMAIL_PATTERN: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";
const PHONE_PATTERN: &str =
    r"(?:\+1[-.\s]?)?\(?\b([0-9]{3})\)?[-.\s]?([0-9]{3})[-.\s]?([0-9]{4})\b";
const SSN_PATTERN: &str = r"\b\d{3}-\d{2}-\d{4}\b";
const IP_PATTERN: &str = r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b";

lazy_static! {
    static ref DEFAULT_REDACTOR: Result<PiiRedactor, regex::Error> =
        PiiRedactor::new(RedactionConfig::default());
}

/// PII redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub redact_emails: bool,
    pub redact_phones: bool,
    pub redact_ssn: bool,
    pub redact_ip_addresses: bool,
    /// Replace values with a short hash so redacted entries can still be correlated
    pub hash_for_correlation: bool,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_emails: true,
            redact_phones: true,
            redact_ssn: true,
            redact_ip_addresses: true,
            hash_for_correlation: true,
        }
    }
}

/// PII redactor for log messages
#[derive(Debug, Clone)]
pub struct PiiRedactor {
    config: RedactionConfig,
    email: Regex,
    phone: Regex,
    ssn: Regex,
    ip: Regex,
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            config,
            email: Regex::new(EMAIL_PATTERN)?,
            phone: Regex::new(PHONE_PATTERN)?,
            ssn: Regex::new(SSN_PATTERN)?,
            ip: Regex::new(IP_PATTERN)?,
        })
    }

    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        if self.config.redact_emails {
            result = self.replace(&self.email, &result, "EMAIL", |email| {
                let (local, domain) = email.split_once('@').unwrap_or((email, ""));
                format!(
                    "{}***@{}***",
                    local.chars().next().unwrap_or('*'),
                    domain.chars().next().unwrap_or('*')
                )
            });
        }

        // SSNs first so the phone pattern does not claim their digits
        if self.config.redact_ssn {
            result = self.replace(&self.ssn, &result, "SSN", |_| "***-**-****".to_string());
        }

        if self.config.redact_phones {
            result = self.replace(&self.phone, &result, "PHONE", |_| {
                "(***) ***-****".to_string()
            });
        }

        if self.config.redact_ip_addresses {
            result = self.replace(&self.ip, &result, "IP", |ip| {
                let first = ip.split('.').next().unwrap_or("***");
                format!("{first}.***.***.***")
            });
        }

        result
    }

    fn replace(
        &self,
        pattern: &Regex,
        text: &str,
        label: &str,
        mask: impl Fn(&str) -> String,
    ) -> String {
        pattern
            .replace_all(text, |caps: &Captures| {
                let matched = caps.get(0).map_or("", |m| m.as_str());
                if self.config.hash_for_correlation {
                    format!("{label}[{}]", hash_value(matched))
                } else {
                    mask(matched)
                }
            })
            .into_owned()
    }
}

/// Short correlation hash of a value
pub fn hash_value(value: &str) -> String {
    let digest = Sha256::digest(value.to_ascii_lowercase().as_bytes());
    general_purpose::URL_SAFE_NO_PAD.encode(digest.get(..8).unwrap_or_default())
}

/// Redact PII from `text` with the default configuration
pub fn redact(text: &str) -> String {
    match DEFAULT_REDACTOR.as_ref() {
        Ok(redactor) => redactor.redact(text),
        Err(_) => "[REDACTED]".to_string(),
    }
}

/// Correlation token for an email address, suitable as a log field
pub fn redact_email(email: &str) -> String {
    format!("EMAIL[{}]", hash_value(email.trim()))
}
