use std::collections::BTreeSet;

use {
    serde::{Deserialize, Serialize},
    teambot_channels::UserId,
};

/// The set of user ids bound to one channel.
///
/// Rosters are values: every change returns a new roster and leaves the
/// original untouched, so a caller always commits a fully computed set.
/// Iteration is in sorted id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    members: BTreeSet<UserId>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, user: &UserId) -> bool {
        self.members.contains(user)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserId> {
        self.members.iter()
    }

    /// Members of `self` plus members of `other`.
    #[must_use]
    pub fn union(&self, other: &Roster) -> Self {
        Self {
            members: self.members.union(&other.members).cloned().collect(),
        }
    }

    /// Members of `self` that are not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Roster) -> Self {
        Self {
            members: self.members.difference(&other.members).cloned().collect(),
        }
    }

    #[must_use]
    pub fn with(&self, user: &UserId) -> Self {
        let mut members = self.members.clone();
        members.insert(user.clone());
        Self { members }
    }

    #[must_use]
    pub fn without(&self, user: &UserId) -> Self {
        let mut members = self.members.clone();
        members.remove(user);
        Self { members }
    }
}

impl FromIterator<UserId> for Roster {
    fn from_iter<I: IntoIterator<Item = UserId>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Roster {
    type IntoIter = std::collections::btree_set::Iter<'a, UserId>;
    type Item = &'a UserId;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn roster(ids: &[&str]) -> Roster {
        ids.iter().map(|id| UserId::new(*id)).collect()
    }

    #[test]
    fn union_is_idempotent() {
        let base = roster(&["U1"]);
        let added = roster(&["U2", "U3"]);
        let once = base.union(&added);
        assert_eq!(once, roster(&["U1", "U2", "U3"]));
        assert_eq!(once.union(&added), once);
    }

    #[test]
    fn difference_ignores_absent_members() {
        let base = roster(&["U1", "U2"]);
        assert_eq!(base.difference(&roster(&["U2", "U9"])), roster(&["U1"]));
    }

    #[test]
    fn with_and_without_leave_original_untouched() {
        let base = roster(&["U1"]);
        let joined = base.with(&UserId::new("U2"));
        let left = joined.without(&UserId::new("U1"));

        assert_eq!(base, roster(&["U1"]));
        assert_eq!(joined, roster(&["U1", "U2"]));
        assert_eq!(left, roster(&["U2"]));
        assert_eq!(left.without(&UserId::new("U7")), left);
    }

    #[test]
    fn iterates_in_sorted_order() {
        let r = roster(&["U3", "U1", "U2", "U1"]);
        let ids: Vec<&str> = r.iter().map(UserId::as_str).collect();
        assert_eq!(ids, vec!["U1", "U2", "U3"]);
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn serializes_as_plain_array() {
        let json = serde_json::to_string(&roster(&["U2", "U1"])).unwrap_or_default();
        assert_eq!(json, r#"["U1","U2"]"#);
    }
}
