//! Identities and administered user accounts

use crate::audit::RespondentProfile;
use crate::ids::OwnerId;
use serde::{Deserialize, Serialize};

/// Authenticated caller, as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user id
    pub id: String,
    /// Role claim from the identity provider
    #[serde(default)]
    pub is_admin: bool,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Email
    #[serde(default)]
    pub email: String,
    /// Organization, if registered with one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl Identity {
    /// Create a non-admin identity
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_admin: false,
            name: String::new(),
            email: String::new(),
            company: None,
        }
    }

    /// Mark as admin
    #[inline]
    #[must_use]
    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    /// With display name and email
    #[inline]
    #[must_use]
    pub fn with_contact(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.name = name.into();
        self.email = email.into();
        self
    }

    /// With organization
    #[inline]
    #[must_use]
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    /// Audit owner key for this identity
    #[inline]
    #[must_use]
    pub fn owner_id(&self) -> OwnerId {
        OwnerId::new(self.id.clone())
    }

    /// Snapshot stored with the audit
    #[must_use]
    pub fn respondent_profile(&self) -> RespondentProfile {
        RespondentProfile {
            name: self.name.clone(),
            email: self.email.clone(),
            company: self
                .company
                .clone()
                .unwrap_or_else(|| "No especificada".to_string()),
        }
    }
}

/// Account role derived from labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Carries the `admin` label
    Admin,
    /// Everyone else
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "Admin"),
            Self::User => write!(f, "Usuario"),
        }
    }
}

/// User account as held by the user directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    /// Directory id
    pub id: String,
    /// Login email
    pub email: String,
    /// Display name, may be unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Role labels
    #[serde(default)]
    pub labels: Vec<String>,
    /// Account status, may be unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl UserAccount {
    /// Role derived from labels
    #[must_use]
    pub fn role(&self) -> Role {
        if self.labels.iter().any(|l| l == "admin") {
            Role::Admin
        } else {
            Role::User
        }
    }

    /// Name for listings
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "Sin nombre",
        }
    }

    /// Status for listings
    #[must_use]
    pub fn display_status(&self) -> &str {
        self.status.as_deref().unwrap_or("Activo")
    }

    /// Apply a partial update
    pub fn apply(&mut self, update: UserUpdate) {
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(name) = update.name {
            self.name = Some(name);
        }
        if let Some(labels) = update.labels {
            self.labels = labels;
        }
        if let Some(status) = update.status {
            self.status = Some(status);
        }
    }
}

/// Partial update of a [`UserAccount`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    /// New email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Replacement label set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    /// New status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl UserUpdate {
    /// Check if the update changes nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.name.is_none() && self.labels.is_none() && self.status.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(labels: &[&str]) -> UserAccount {
        UserAccount {
            id: "u1".to_string(),
            email: "a@b.c".to_string(),
            name: None,
            labels: labels.iter().map(|l| (*l).to_string()).collect(),
            status: None,
        }
    }

    #[test]
    fn role_from_labels() {
        assert_eq!(account(&["admin"]).role(), Role::Admin);
        assert_eq!(account(&["auditor"]).role(), Role::User);
    }

    #[test]
    fn display_defaults() {
        let acc = account(&[]);
        assert_eq!(acc.display_name(), "Sin nombre");
        assert_eq!(acc.display_status(), "Activo");
    }

    #[test]
    fn apply_partial_update() {
        let mut acc = account(&[]);
        acc.apply(UserUpdate {
            name: Some("Ana".to_string()),
            labels: Some(vec!["admin".to_string()]),
            ..UserUpdate::default()
        });
        assert_eq!(acc.display_name(), "Ana");
        assert_eq!(acc.role(), Role::Admin);
        assert_eq!(acc.email, "a@b.c");
    }

    #[test]
    fn respondent_profile_defaults_company() {
        let profile = Identity::new("u1")
            .with_contact("Ana", "ana@example.com")
            .respondent_profile();
        assert_eq!(profile.company, "No especificada");
    }
}
