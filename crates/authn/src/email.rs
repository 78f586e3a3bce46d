//! Email address validation.
//!
//! Accepts the bare `local@domain` form of an RFC 5322 `addr-spec` with a
//! dot-atom local part and a hostname domain.
//!
//! This is deliberately stricter than RFC 5322: quoted-string local parts
//! (`"john doe"@example.com`) and domain literals (`user@[192.0.2.1]`) are
//! valid addresses there but are rejected here, as are display names and
//! comments.

use crate::error::{AuthError, Result};

/// Maximum total length of an address.
pub const MAX_EMAIL_LEN: usize = 254;

/// Maximum length of the local part.
pub const MAX_LOCAL_LEN: usize = 64;

/// Maximum length of one domain label.
pub const MAX_LABEL_LEN: usize = 63;

/// Validates that `email` is a well-formed address.
///
/// # Errors
///
/// Returns [`AuthError::InvalidEmail`] describing the first problem found.
///
/// # Examples
///
/// ```
/// use vey_authn::validate_email;
///
/// assert!(validate_email("test@example.com").is_ok());
/// assert!(validate_email("first.last+tag@mail.example.org").is_ok());
/// assert!(validate_email("Test <test@example.com>").is_err());
/// assert!(validate_email("no-at-sign").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Err(invalid("email is empty"));
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(invalid(format!("email exceeds {MAX_EMAIL_LEN} bytes")));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid("missing '@'"));
    };
    if domain.contains('@') {
        return Err(invalid("more than one '@'"));
    }

    validate_local_part(local)?;
    validate_domain(domain)
}

fn validate_local_part(local: &str) -> Result<()> {
    if local.is_empty() {
        return Err(invalid("local part is empty"));
    }
    if local.len() > MAX_LOCAL_LEN {
        return Err(invalid(format!("local part exceeds {MAX_LOCAL_LEN} bytes")));
    }
    for atom in local.split('.') {
        if atom.is_empty() {
            return Err(invalid("local part has an empty dot-separated segment"));
        }
        if let Some(c) = atom.chars().find(|c| !is_atext(*c)) {
            return Err(invalid(format!("local part contains invalid character {c:?}")));
        }
    }
    Ok(())
}

fn validate_domain(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(invalid("domain is empty"));
    }
    for label in domain.split('.') {
        if label.is_empty() {
            return Err(invalid("domain has an empty label"));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(invalid(format!("domain label exceeds {MAX_LABEL_LEN} bytes")));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(invalid("domain label starts or ends with '-'"));
        }
        if let Some(c) = label.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '-')) {
            return Err(invalid(format!("domain contains invalid character {c:?}")));
        }
    }
    Ok(())
}

/// RFC 5322 `atext`.
fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~".contains(c)
}

fn invalid(reason: impl Into<String>) -> AuthError {
    AuthError::InvalidEmail(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(email: &str) {
        assert!(
            matches!(validate_email(email), Err(AuthError::InvalidEmail(_))),
            "{email:?} should be rejected"
        );
    }

    #[test]
    fn test_accepts_common_forms() {
        for email in [
            "test@example.com",
            "a@b",
            "first.last@example.co.uk",
            "user+tag@example.com",
            "o'brien@example.ie",
            "x_y-z@sub-domain.example.com",
            "{weird}=|~@example.com",
            "UPPER@EXAMPLE.COM",
        ] {
            assert!(validate_email(email).is_ok(), "{email:?} should be accepted");
        }
    }

    #[test]
    fn test_rejects_missing_parts() {
        assert_invalid("");
        assert_invalid("example.com");
        assert_invalid("@example.com");
        assert_invalid("test@");
    }

    #[test]
    fn test_rejects_multiple_at_signs() {
        assert_invalid("a@b@example.com");
    }

    #[test]
    fn test_rejects_display_name_and_brackets() {
        assert_invalid("Test <test@example.com>");
        assert_invalid("<test@example.com>");
        assert_invalid("test@example.com (comment)");
    }

    #[test]
    fn test_rejects_whitespace() {
        assert_invalid(" test@example.com");
        assert_invalid("test@example.com ");
        assert_invalid("te st@example.com");
        assert_invalid("test@exa mple.com");
        assert_invalid("test@example.com\n");
    }

    #[test]
    fn test_rejects_bad_dots() {
        assert_invalid(".test@example.com");
        assert_invalid("test.@example.com");
        assert_invalid("te..st@example.com");
        assert_invalid("test@.example.com");
        assert_invalid("test@example.com.");
        assert_invalid("test@example..com");
    }

    #[test]
    fn test_rejects_quoted_local_part() {
        assert_invalid("\"john doe\"@example.com");
    }

    #[test]
    fn test_rejects_bad_domain_labels() {
        assert_invalid("test@-example.com");
        assert_invalid("test@example-.com");
        assert_invalid("test@exa_mple.com");
        assert_invalid("test@[127.0.0.1]");
        assert_invalid(&format!("test@{}.com", "a".repeat(MAX_LABEL_LEN + 1)));
        assert!(validate_email(&format!("test@{}.com", "a".repeat(MAX_LABEL_LEN))).is_ok());
    }

    #[test]
    fn test_rejects_non_ascii() {
        assert_invalid("tëst@example.com");
        assert_invalid("test@exämple.com");
    }

    #[test]
    fn test_length_limits() {
        let local = "a".repeat(MAX_LOCAL_LEN);
        assert!(validate_email(&format!("{local}@example.com")).is_ok());
        assert_invalid(&format!("{local}a@example.com"));

        let domain = vec!["a".repeat(60); 5].join(".");
        assert_invalid(&format!("a@{domain}"));
    }
}
