#![cfg(target_os = "linux")]
#![allow(unsafe_code)]

use super::{GroupId, GroupListFill, IdentityDatabase, IdentityError};
use nix::unistd::{Group, User};
use std::ffi::CString;

/// The host's passwd/group database (NSS).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIdentity;

impl IdentityDatabase for SystemIdentity {
    fn primary_group(&self, account: &str) -> Result<Option<GroupId>, IdentityError> {
        let user = User::from_name(account).map_err(|e| IdentityError::Account {
            account: account.to_string(),
            source: e.into(),
        })?;
        Ok(user.map(|u| u.gid.as_raw()))
    }

    fn fill_group_list(
        &self,
        account: &str,
        primary: GroupId,
        buf: &mut [GroupId],
    ) -> Result<GroupListFill, IdentityError> {
        let name = CString::new(account).map_err(|_| IdentityError::InvalidName {
            name: account.to_string(),
        })?;
        let mut ngroups = libc::c_int::try_from(buf.len()).unwrap_or(libc::c_int::MAX);

        // SAFETY: `name` is NUL-terminated and outlives the call; `buf` holds at
        // least `ngroups` writable gid_t slots.
        let ret = unsafe {
            libc::getgrouplist(name.as_ptr(), primary, buf.as_mut_ptr(), &mut ngroups)
        };

        if ret == -1 {
            // ngroups now carries the size glibc wants, when it reports one
            let required = usize::try_from(ngroups).ok().filter(|&n| n > 0);
            return Ok(GroupListFill::Insufficient { required });
        }
        Ok(GroupListFill::Complete(usize::try_from(ngroups).unwrap_or(0)))
    }

    fn group_id(&self, group: &str) -> Result<Option<GroupId>, IdentityError> {
        let found = Group::from_name(group).map_err(|e| IdentityError::Group {
            group: group.to_string(),
            source: e.into(),
        })?;
        Ok(found.map(|g| g.gid.as_raw()))
    }
}
