//! Authorization decisions over already-loaded data.
//!
//! Ownership of a group is nothing more than presence in its member set;
//! there is no owner column and no role hierarchy. The functions here do no
//! I/O: the caller resolves the principal and the resource first and threads
//! them in explicitly.

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Permit,
    Deny,
}

impl Access {
    pub fn is_permitted(self) -> bool {
        self == Access::Permit
    }
}

/// Any member of a group may read it, rename it, or change its member set.
/// Read and write are the same permission in this model.
pub fn group_access(principal_id: Uuid, member_ids: &[Uuid]) -> Access {
    if member_ids.contains(&principal_id) {
        Access::Permit
    } else {
        Access::Deny
    }
}

/// User records are self-access only.
pub fn user_access(principal_id: Uuid, target_user_id: Uuid) -> Access {
    if principal_id == target_user_id {
        Access::Permit
    } else {
        Access::Deny
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_are_permitted_nonmembers_denied() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let members = vec![a, b];

        assert_eq!(group_access(a, &members), Access::Permit);
        assert_eq!(group_access(b, &members), Access::Permit);
        assert_eq!(group_access(c, &members), Access::Deny);
    }

    #[test]
    fn empty_member_set_denies_everyone() {
        assert_eq!(group_access(Uuid::new_v4(), &[]), Access::Deny);
    }

    #[test]
    fn adding_a_member_flips_deny_to_permit() {
        // user A creates a group with members [A]; B is denied until added
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut members = vec![a];

        assert_eq!(group_access(b, &members), Access::Deny);
        members.push(b);
        assert_eq!(group_access(b, &members), Access::Permit);
        assert_eq!(group_access(a, &members), Access::Permit);
    }

    #[test]
    fn user_records_are_self_access_only() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        assert_eq!(user_access(me, me), Access::Permit);
        assert_eq!(user_access(me, other), Access::Deny);
    }
}
