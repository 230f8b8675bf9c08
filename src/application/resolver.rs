use crate::domain::payer::PayerProfile;
use crate::domain::ports::UserDirectoryBox;

/// Best-effort payer autofill.
///
/// The seed profile comes from whatever the caller has cached locally (a
/// convenience, never a correctness dependency). Empty fields are filled
/// from the user directory when it answers; directory failures are ignored
/// and the seed is returned as-is.
pub struct PayerResolver {
    users: UserDirectoryBox,
}

impl PayerResolver {
    pub fn new(users: UserDirectoryBox) -> Self {
        Self { users }
    }

    pub async fn resolve(&self, seed: PayerProfile) -> PayerProfile {
        if seed.email.trim().is_empty() {
            return seed;
        }
        let profile = match self.users.user_by_email(&seed.email).await {
            Ok(Some(profile)) => profile,
            Ok(None) => return seed,
            Err(err) => {
                tracing::debug!(email = %seed.email, %err, "payer lookup failed, keeping seed");
                return seed;
            }
        };

        let mut resolved = seed;
        if resolved.name.trim().is_empty()
            && let Some(name) = profile.name
        {
            resolved.name = name;
        }
        if resolved.mobile.trim().is_empty()
            && let Some(mobile) = profile.mobile
        {
            resolved.mobile = mobile;
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payer::UserProfile;
    use crate::domain::ports::UserDirectory;
    use crate::error::{BillingError, Result};
    use crate::infrastructure::in_memory::InMemoryUserDirectory;
    use async_trait::async_trait;

    fn directory_with_aminah() -> InMemoryUserDirectory {
        InMemoryUserDirectory::with_users(vec![UserProfile {
            user_id: Some("U-1".to_string()),
            name: Some("Aminah binti Salleh".to_string()),
            email: "aminah@example.com".to_string(),
            mobile: Some("0123456789".to_string()),
        }])
    }

    #[tokio::test]
    async fn test_fills_only_empty_fields() {
        let resolver = PayerResolver::new(Box::new(directory_with_aminah()));
        let resolved = resolver
            .resolve(PayerProfile::new("Aminah", "aminah@example.com", ""))
            .await;
        // The cached name wins; only the missing mobile is filled.
        assert_eq!(resolved.name, "Aminah");
        assert_eq!(resolved.mobile, "0123456789");
    }

    #[tokio::test]
    async fn test_unknown_email_keeps_seed() {
        let resolver = PayerResolver::new(Box::new(InMemoryUserDirectory::new()));
        let seed = PayerProfile::new("", "nobody@example.com", "");
        assert_eq!(resolver.resolve(seed.clone()).await, seed);
    }

    struct BrokenDirectory;

    #[async_trait]
    impl UserDirectory for BrokenDirectory {
        async fn user_by_email(&self, _email: &str) -> Result<Option<UserProfile>> {
            Err(BillingError::Validation("directory down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_directory_failure_is_silent() {
        let resolver = PayerResolver::new(Box::new(BrokenDirectory));
        let seed = PayerProfile::new("Aminah", "aminah@example.com", "0123456789");
        assert_eq!(resolver.resolve(seed.clone()).await, seed);
    }

    #[tokio::test]
    async fn test_empty_email_skips_lookup() {
        let resolver = PayerResolver::new(Box::new(BrokenDirectory));
        let seed = PayerProfile::new("Aminah", "", "0123456789");
        assert_eq!(resolver.resolve(seed.clone()).await, seed);
    }
}
