//! Privileged-identity resolution.
//!
//! An account is exempt from the authority when it is root, or when its
//! primary or any supplementary gid equals the gid of one of the bypass
//! groups. Nothing is cached: group membership and group-to-gid mappings are
//! re-read on every call.

mod error;
#[cfg(target_os = "linux")]
mod system;

pub use error::IdentityError;
#[cfg(target_os = "linux")]
pub use system::SystemIdentity;

pub type GroupId = u32;

/// First buffer size tried for the supplementary group list.
pub const INITIAL_GROUP_CAPACITY: usize = 32;
/// Upper bound on the group list buffer (Linux `NGROUPS_MAX`).
pub const MAX_GROUP_CAPACITY: usize = 65_536;
pub const MAX_GROUP_LIST_ATTEMPTS: usize = 8;

/// Result of one attempt at filling the supplementary group buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupListFill {
    /// The first `n` entries of the buffer are valid.
    Complete(usize),
    /// Buffer too small. `required` is the size the database asked for, if it
    /// reported one.
    Insufficient { required: Option<usize> },
}

/// Local account/group database.
pub trait IdentityDatabase {
    /// Primary gid of `account`, `None` when the account does not exist.
    fn primary_group(&self, account: &str) -> Result<Option<GroupId>, IdentityError>;

    /// Fill `buf` with every gid `account` belongs to (including `primary`).
    fn fill_group_list(
        &self,
        account: &str,
        primary: GroupId,
        buf: &mut [GroupId],
    ) -> Result<GroupListFill, IdentityError>;

    /// Gid of `group`, `None` when no such group exists.
    fn group_id(&self, group: &str) -> Result<Option<GroupId>, IdentityError>;
}

impl<D: IdentityDatabase + ?Sized> IdentityDatabase for &D {
    fn primary_group(&self, account: &str) -> Result<Option<GroupId>, IdentityError> {
        (**self).primary_group(account)
    }

    fn fill_group_list(
        &self,
        account: &str,
        primary: GroupId,
        buf: &mut [GroupId],
    ) -> Result<GroupListFill, IdentityError> {
        (**self).fill_group_list(account, primary, buf)
    }

    fn group_id(&self, group: &str) -> Result<Option<GroupId>, IdentityError> {
        (**self).group_id(group)
    }
}

/// Group ids of one account, as read for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub primary: GroupId,
    pub supplementary: Vec<GroupId>,
}

impl Membership {
    pub fn contains(&self, gid: GroupId) -> bool {
        self.primary == gid || self.supplementary.contains(&gid)
    }
}

/// Why an account skipped the authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exemption {
    BypassGroup(String),
    RootAccount,
}

pub struct IdentityResolver<D> {
    db: D,
    bypass_groups: Vec<String>,
    root_account: String,
}

impl<D: IdentityDatabase> IdentityResolver<D> {
    pub fn new(db: D, bypass_groups: Vec<String>, root_account: impl Into<String>) -> Self {
        Self {
            db,
            bypass_groups,
            root_account: root_account.into(),
        }
    }

    pub fn is_root(&self, account: &str) -> bool {
        account == self.root_account
    }

    /// Reads the primary and supplementary gids of `account`.
    ///
    /// `Ok(None)` means the account is unknown to the database.
    pub fn membership(&self, account: &str) -> Result<Option<Membership>, IdentityError> {
        let Some(primary) = self.db.primary_group(account)? else {
            return Ok(None);
        };
        let supplementary = self.supplementary_groups(account, primary)?;
        Ok(Some(Membership {
            primary,
            supplementary,
        }))
    }

    fn supplementary_groups(
        &self,
        account: &str,
        primary: GroupId,
    ) -> Result<Vec<GroupId>, IdentityError> {
        let mut capacity = INITIAL_GROUP_CAPACITY;
        for _ in 0..MAX_GROUP_LIST_ATTEMPTS {
            let mut buf = vec![0; capacity];
            match self.db.fill_group_list(account, primary, &mut buf)? {
                GroupListFill::Complete(n) => {
                    buf.truncate(n.min(capacity));
                    return Ok(buf);
                }
                GroupListFill::Insufficient { required } => {
                    let next = match required {
                        Some(r) if r > capacity => r,
                        _ => capacity.saturating_mul(2),
                    };
                    if next > MAX_GROUP_CAPACITY {
                        return Err(IdentityError::GroupListTooLarge {
                            account: account.to_string(),
                            requested: next,
                        });
                    }
                    tracing::debug!(account, capacity, next, "group list buffer too small, growing");
                    capacity = next;
                }
            }
        }
        Err(IdentityError::GroupListUnstable {
            account: account.to_string(),
            attempts: MAX_GROUP_LIST_ATTEMPTS,
        })
    }

    /// First bypass group `account` belongs to.
    ///
    /// Bypass names that do not resolve are skipped. An unknown account is
    /// `Ok(None)`.
    pub fn bypass_group_of(&self, account: &str) -> Result<Option<&str>, IdentityError> {
        let Some(membership) = self.membership(account)? else {
            return Ok(None);
        };
        for name in &self.bypass_groups {
            let gid = match self.db.group_id(name) {
                Ok(Some(gid)) => gid,
                Ok(None) => continue,
                Err(e) => {
                    tracing::debug!(group = %name, error = %e, "bypass group lookup failed, skipping");
                    continue;
                }
            };
            if membership.contains(gid) {
                return Ok(Some(name.as_str()));
            }
        }
        Ok(None)
    }

    /// Group rule first, then the root rule. Lookup failures are reported
    /// through `Err` so the caller can log them; treat them as "not exempt".
    pub fn exemption(&self, account: &str) -> Result<Option<Exemption>, IdentityError> {
        let group = self.bypass_group_of(account);
        if let Ok(Some(name)) = group {
            return Ok(Some(Exemption::BypassGroup(name.to_string())));
        }
        if self.is_root(account) {
            return Ok(Some(Exemption::RootAccount));
        }
        group.map(|_| None)
    }

    pub fn is_exempt(&self, account: &str) -> bool {
        matches!(self.exemption(account), Ok(Some(_)))
    }
}
