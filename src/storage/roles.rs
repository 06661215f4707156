use std::collections::BTreeMap;

use redb::{ReadableTable, WriteTransaction};

use super::db::{Database, DatabaseError};
use super::models::{Credential, Role, RoleSet};
use super::tables::*;

/// Result of a role mutation that may be refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleChange {
    /// The identity's resulting role set.
    Applied(RoleSet),
    UnknownIdentity,
    /// The change would leave the system without any Admin.
    LastAdmin,
}

impl Database {
    // ========================================================================
    // Role assignment operations
    // ========================================================================

    /// Get the role set of an identity, or `None` if it has no entry
    pub fn get_roles(&self, identity: &str) -> Result<Option<RoleSet>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USER_ROLES)?;

        match table.get(identity)? {
            Some(data) => Ok(Some(decode_roles(data.value())?)),
            None => Ok(None),
        }
    }

    /// Create an entry with the given roles and password verifier.
    /// Returns false if the identity already has one.
    pub fn insert_identity(
        &self,
        identity: &str,
        roles: &RoleSet,
        credential: &Credential,
    ) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let inserted = match read_roles(&write_txn, identity)? {
            Some(_) => false,
            None => {
                write_roles(&write_txn, identity, roles)?;
                write_credential(&write_txn, identity, credential)?;
                true
            }
        };
        write_txn.commit()?;
        Ok(inserted)
    }

    /// Get the password verifier of an identity
    pub fn get_credential(&self, identity: &str) -> Result<Option<Credential>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(CREDENTIALS)?;

        match table.get(identity)? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    /// Add a role to an existing entry
    pub fn add_role(&self, identity: &str, role: Role) -> Result<RoleChange, DatabaseError> {
        let write_txn = self.begin_write()?;
        let change = match read_roles(&write_txn, identity)? {
            None => RoleChange::UnknownIdentity,
            Some(mut roles) => {
                if roles.insert(role) {
                    write_roles(&write_txn, identity, &roles)?;
                }
                RoleChange::Applied(roles)
            }
        };
        write_txn.commit()?;
        Ok(change)
    }

    /// Give `identity` Admin and set its password verifier, creating the
    /// entry if needed.
    pub fn seed_admin(&self, identity: &str, credential: &Credential) -> Result<RoleSet, DatabaseError> {
        let write_txn = self.begin_write()?;
        let roles = {
            let mut roles = read_roles(&write_txn, identity)?.unwrap_or_default();
            roles.insert(Role::Admin);
            write_roles(&write_txn, identity, &roles)?;
            write_credential(&write_txn, identity, credential)?;
            roles
        };
        write_txn.commit()?;
        Ok(roles)
    }

    /// Remove a role. Refuses to remove the last Admin assignment.
    pub fn remove_role(&self, identity: &str, role: Role) -> Result<RoleChange, DatabaseError> {
        let write_txn = self.begin_write()?;
        let change = {
            match read_roles(&write_txn, identity)? {
                None => RoleChange::UnknownIdentity,
                Some(roles) if !roles.contains(&role) => RoleChange::Applied(roles),
                Some(_) if role == Role::Admin && count_admins(&write_txn)? <= 1 => {
                    RoleChange::LastAdmin
                }
                Some(mut roles) => {
                    roles.remove(&role);
                    write_roles(&write_txn, identity, &roles)?;
                    RoleChange::Applied(roles)
                }
            }
        };
        write_txn.commit()?;
        Ok(change)
    }

    /// All role assignments, keyed by identity
    pub fn all_roles(&self) -> Result<BTreeMap<String, RoleSet>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USER_ROLES)?;

        let mut all = BTreeMap::new();
        for result in table.iter()? {
            let (key, value) = result?;
            all.insert(key.value().to_string(), decode_roles(value.value())?);
        }

        Ok(all)
    }

    /// Number of identities holding Admin
    pub fn admin_count(&self) -> Result<usize, DatabaseError> {
        Ok(self
            .all_roles()?
            .values()
            .filter(|roles| roles.contains(&Role::Admin))
            .count())
    }
}

fn read_roles(txn: &WriteTransaction, identity: &str) -> Result<Option<RoleSet>, DatabaseError> {
    let table = txn.open_table(USER_ROLES)?;
    let result = match table.get(identity)? {
        Some(data) => Some(decode_roles(data.value())?),
        None => None,
    };
    Ok(result)
}

fn write_roles(txn: &WriteTransaction, identity: &str, roles: &RoleSet) -> Result<(), DatabaseError> {
    let mut table = txn.open_table(USER_ROLES)?;
    let data = encode_roles(roles)?;
    table.insert(identity, data.as_slice())?;
    Ok(())
}

fn write_credential(
    txn: &WriteTransaction,
    identity: &str,
    credential: &Credential,
) -> Result<(), DatabaseError> {
    let mut table = txn.open_table(CREDENTIALS)?;
    let data = rmp_serde::to_vec_named(credential)?;
    table.insert(identity, data.as_slice())?;
    Ok(())
}

fn count_admins(txn: &WriteTransaction) -> Result<usize, DatabaseError> {
    let table = txn.open_table(USER_ROLES)?;
    let mut count = 0;
    for result in table.iter()? {
        let (_, value) = result?;
        if decode_roles(value.value())?.contains(&Role::Admin) {
            count += 1;
        }
    }
    Ok(count)
}

fn encode_roles(roles: &RoleSet) -> Result<Vec<u8>, DatabaseError> {
    let list: Vec<Role> = roles.iter().copied().collect();
    Ok(rmp_serde::to_vec_named(&list)?)
}

fn decode_roles(data: &[u8]) -> Result<RoleSet, DatabaseError> {
    let list: Vec<Role> = rmp_serde::from_slice(data)?;
    Ok(list.into_iter().collect())
}
