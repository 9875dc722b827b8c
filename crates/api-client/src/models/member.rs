//! Members

use super::borrowed_book::BorrowedBook;
use super::require_text;
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Membership status
///
/// Values the client does not know deserialize as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipStatus {
    Active,
    Inactive,
    Suspended,
    Expired,
    #[serde(other)]
    Unknown,
}

impl MembershipStatus {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Suspended => "SUSPENDED",
            Self::Expired => "EXPIRED",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Whether the member may borrow
    #[must_use]
    pub fn can_borrow(self) -> bool {
        self == Self::Active
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MembershipStatus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            "SUSPENDED" => Ok(Self::Suspended),
            "EXPIRED" => Ok(Self::Expired),
            other => Err(ApiError::validation(
                "membershipStatus",
                format!("unknown status {other}"),
            )),
        }
    }
}

/// Member as returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub membership_date: Option<String>,
    pub membership_status: Option<MembershipStatus>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    /// Only filled by the with-borrowed-books endpoint
    pub borrowed_books: Option<Vec<BorrowedBook>>,
}

/// Payload for creating or updating a member
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberCreateRequest {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_status: Option<MembershipStatus>,
}

impl MemberCreateRequest {
    /// Create a payload with the required fields
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    /// Set the phone number
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Set the postal address
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Set the membership status
    #[must_use]
    pub fn with_status(mut self, status: MembershipStatus) -> Self {
        self.membership_status = Some(status);
        self
    }

    /// Check the payload before sending it
    pub fn validate(&self) -> ApiResult<()> {
        require_text("name", &self.name)?;
        require_text("email", &self.email)?;

        let email = self.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(ApiError::validation("email", "must look like name@domain")),
        }

        if self.membership_status == Some(MembershipStatus::Unknown) {
            return Err(ApiError::validation("membershipStatus", "cannot be UNKNOWN"));
        }
        Ok(())
    }
}

/// Filters embedded in member list keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberFilters {
    pub search_term: Option<String>,
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_status_is_tolerated() {
        let member: Member = serde_json::from_value(json!({
            "id": 9,
            "name": "Ada",
            "email": "ada@example.org",
            "membershipStatus": "ON_HOLD"
        }))
        .unwrap();
        assert_eq!(member.membership_status, Some(MembershipStatus::Unknown));
    }

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!("suspended".parse::<MembershipStatus>().unwrap(), MembershipStatus::Suspended);
        assert!("frozen".parse::<MembershipStatus>().is_err());
        assert_eq!(MembershipStatus::Expired.to_string(), "EXPIRED");
        assert!(MembershipStatus::Active.can_borrow());
        assert!(!MembershipStatus::Suspended.can_borrow());
    }

    #[test]
    fn test_validate_email() {
        assert!(MemberCreateRequest::new("Ada", "ada@example.org").validate().is_ok());
        assert!(MemberCreateRequest::new("Ada", "ada.example.org").validate().is_err());
        assert!(MemberCreateRequest::new("Ada", "@example.org").validate().is_err());
        assert!(MemberCreateRequest::new("", "ada@example.org").validate().is_err());
    }

    #[test]
    fn test_request_serialization() {
        let json = serde_json::to_value(
            MemberCreateRequest::new("Ada", "ada@example.org").with_status(MembershipStatus::Active),
        )
        .unwrap();
        assert_eq!(
            json,
            json!({"name": "Ada", "email": "ada@example.org", "membershipStatus": "ACTIVE"})
        );
    }
}
