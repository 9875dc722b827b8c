//! Member list filters and sorts

use super::{contains_ci, needle, unknown};
use crate::error::ApiError;
use crate::models::Member;
use libris_core::listing::{paginate, Page};
use std::cmp::Ordering;
use std::str::FromStr;

/// Member list filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberFilter {
    /// Substring of the member's name
    pub name: Option<String>,
}

impl MemberFilter {
    /// Members passing the filter, in their original order
    #[must_use]
    pub fn apply(&self, members: &[Member]) -> Vec<Member> {
        let name = needle(self.name.as_deref());
        members
            .iter()
            .filter(|m| name.as_deref().map_or(true, |n| contains_ci(&m.name, n)))
            .cloned()
            .collect()
    }
}

/// Field a member list is ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MemberSortField {
    /// Name, case-insensitive
    #[default]
    Name,
    /// E-mail, case-insensitive
    Email,
    /// Membership status
    Status,
    /// Date of joining
    MembershipDate,
}

impl FromStr for MemberSortField {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "status" => Ok(Self::Status),
            "date" | "membership-date" => Ok(Self::MembershipDate),
            other => Err(unknown("sort", other)),
        }
    }
}

/// Member ordering: a field and a direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberSort {
    /// Field to compare
    pub field: MemberSortField,
    /// Reverse the order
    pub descending: bool,
}

impl MemberSort {
    /// Ascending by `field`
    #[must_use]
    pub fn by(field: MemberSortField) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    /// Builder-style method to reverse the order
    #[must_use]
    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    fn compare(self, a: &Member, b: &Member) -> Ordering {
        let ordering = match self.field {
            MemberSortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            MemberSortField::Email => a.email.to_lowercase().cmp(&b.email.to_lowercase()),
            MemberSortField::Status => a.membership_status.cmp(&b.membership_status),
            // ISO dates order lexically
            MemberSortField::MembershipDate => a.membership_date.cmp(&b.membership_date),
        };
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }

    /// Stable in-place sort
    pub fn sort(self, members: &mut [Member]) {
        members.sort_by(|a, b| self.compare(a, b));
    }
}

/// Filter, sort and slice one page of members
#[must_use]
pub fn page(
    members: &[Member],
    filter: &MemberFilter,
    sort: MemberSort,
    page: usize,
    per_page: usize,
) -> Page<Member> {
    let mut items = filter.apply(members);
    sort.sort(&mut items);
    paginate(items, page, per_page)
}
