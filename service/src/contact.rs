//! Contact detail normalization.

use pmp_store::ContactUpdate;

use crate::ServiceError;

/// Normalize contact fields: email trimmed and lower-cased, Instagram
/// handle trimmed with one leading `@` removed. Blank fields count as
/// absent; at least one must remain.
pub fn normalize_contact(
    email: Option<&str>,
    instagram: Option<&str>,
) -> Result<ContactUpdate, ServiceError> {
    let email = email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());
    let instagram = instagram
        .map(|h| {
            let h = h.trim();
            h.strip_prefix('@').unwrap_or(h).to_string()
        })
        .filter(|h| !h.is_empty());

    if email.is_none() && instagram.is_none() {
        return Err(ServiceError::Validation(
            "Email or Instagram must be provided".to_string(),
        ));
    }
    Ok(ContactUpdate { email, instagram })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_fields() {
        let update = normalize_contact(Some("  Me@Example.COM "), Some(" @night_owl ")).unwrap();
        assert_eq!(update.email.as_deref(), Some("me@example.com"));
        assert_eq!(update.instagram.as_deref(), Some("night_owl"));
    }

    #[test]
    fn blank_fields_are_absent() {
        let update = normalize_contact(Some("   "), Some("handle")).unwrap();
        assert_eq!(update.email, None);
        assert!(normalize_contact(Some(" "), Some("@")).is_err());
        assert!(normalize_contact(None, None).is_err());
    }
}
