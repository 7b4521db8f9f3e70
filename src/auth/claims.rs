use crate::identity::Identity;

/// Role checks over claims of a given role claim type
impl Identity {
    /// Check if the identity carries a specific role
    pub fn has_role(&self, role_claim_type: &str, role: &str) -> bool {
        self.values_of(role_claim_type).any(|r| r == role)
    }

    /// Check if the identity carries any of the provided roles
    pub fn has_any_role(&self, role_claim_type: &str, roles: &[&str]) -> bool {
        roles.iter().any(|&role| self.has_role(role_claim_type, role))
    }

    /// Check if the identity carries all of the provided roles
    pub fn has_all_roles(&self, role_claim_type: &str, roles: &[&str]) -> bool {
        roles.iter().all(|&role| self.has_role(role_claim_type, role))
    }

    /// All role values in claim order, duplicates included
    pub fn roles(&self, role_claim_type: &str) -> Vec<String> {
        self.values_of(role_claim_type).map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_with_roles(roles: &[&str]) -> Identity {
        roles
            .iter()
            .fold(Identity::authenticated("Bearer", None).with_claim("sub", "user123"), |id, role| {
                id.with_claim("role", *role)
            })
    }

    #[test]
    fn test_has_role() {
        let identity = identity_with_roles(&["admin", "user"]);

        assert!(identity.has_role("role", "admin"));
        assert!(identity.has_role("role", "user"));
        assert!(!identity.has_role("role", "superadmin"));
        assert!(!identity.has_role("roles", "admin"));
    }

    #[test]
    fn test_has_role_no_roles() {
        let identity = Identity::anonymous();
        assert!(!identity.has_role("role", "admin"));
    }

    #[test]
    fn test_has_any_role() {
        let identity = identity_with_roles(&["user", "moderator"]);

        assert!(identity.has_any_role("role", &["admin", "user"]));
        assert!(!identity.has_any_role("role", &["admin", "superadmin"]));
    }

    #[test]
    fn test_has_all_roles() {
        let identity = identity_with_roles(&["user", "moderator", "admin"]);

        assert!(identity.has_all_roles("role", &["user", "admin"]));
        assert!(!identity.has_all_roles("role", &["user", "superadmin"]));
    }

    #[test]
    fn test_roles_extraction() {
        let identity = identity_with_roles(&["admin", "viewer", "admin"]);
        assert_eq!(identity.roles("role"), vec!["admin", "viewer", "admin"]);
        assert_eq!(identity.roles("scope"), Vec::<String>::new());
    }
}
