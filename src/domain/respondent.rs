//! Respondent identity and profile.

use serde::{Deserialize, Serialize};

use super::record::uuid_v4;

/// Default position assigned when none is stated.
pub const DEFAULT_POSITION: &str = "Staff";

/// A survey respondent: a stable identity plus demographic profile used by
/// the analytics aggregates. Authentication state is not modeled here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Respondent {
    /// Unique identifier
    pub id: String,

    /// Unique username; bulk imports use `csv_user_<row>` as a stable
    /// external identity
    pub username: String,

    pub gender: Option<String>,
    pub department: Option<String>,
    pub position: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Respondent {
    /// Create a respondent with the default position and no profile fields.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: uuid_v4(),
            username: username.into(),
            gender: None,
            department: None,
            position: DEFAULT_POSITION.to_string(),
            created_at: chrono::Utc::now(),
        }
    }

    /// Attach profile fields; `None` position keeps the default.
    #[must_use]
    pub fn with_profile(
        mut self,
        gender: Option<String>,
        department: Option<String>,
        position: Option<String>,
    ) -> Self {
        self.gender = gender;
        self.department = department;
        if let Some(position) = position {
            self.position = position;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let r = Respondent::new("maria");
        assert_eq!(r.username, "maria");
        assert_eq!(r.position, DEFAULT_POSITION);
        assert!(r.gender.is_none());
    }

    #[test]
    fn test_profile() {
        let r = Respondent::new("csv_user_7").with_profile(
            Some("Female".into()),
            Some("Finance".into()),
            None,
        );
        assert_eq!(r.department.as_deref(), Some("Finance"));
        assert_eq!(r.position, DEFAULT_POSITION);
    }
}
