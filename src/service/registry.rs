use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::storage::models::{Identity, Password, Role, RoleSet};
use crate::storage::{Database, RoleChange};

use super::password::{hash_password, validate_password, verify_password};

const MIN_NAME_LEN: usize = 3;
const MAX_NAME_LEN: usize = 64;

/// Identity & role registry, backed by the `user_roles` table.
pub(crate) struct Registry<'a> {
    db: &'a Database,
}

impl<'a> Registry<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Roles of an identity, empty if it is not registered
    pub fn roles_of(&self, identity: &Identity) -> Result<RoleSet, CoreError> {
        if identity.is_anonymous() {
            return Ok(RoleSet::new());
        }
        Ok(self.db.get_roles(identity.as_str())?.unwrap_or_default())
    }

    /// Create an entry holding `{Viewer}` with a password verifier
    pub fn register(&self, identity: &Identity, password: &Password) -> Result<RoleSet, CoreError> {
        validate_identity(identity)?;
        validate_password(password)?;

        let roles: RoleSet = [Role::Viewer].into_iter().collect();
        let credential = hash_password(password)?;
        if !self
            .db
            .insert_identity(identity.as_str(), &roles, &credential)?
        {
            return Err(CoreError::AlreadyRegistered(identity.to_string()));
        }

        tracing::info!(identity = %identity, "Registered identity");
        Ok(roles)
    }

    /// Check a password, returning the identity's roles on success.
    ///
    /// Unknown identities and wrong passwords fail the same way.
    pub fn login(&self, identity: &Identity, password: &Password) -> Result<RoleSet, CoreError> {
        if identity.is_anonymous() {
            return Err(CoreError::InvalidCredentials);
        }

        let verified = self
            .db
            .get_credential(identity.as_str())?
            .is_some_and(|credential| verify_password(password, &credential));
        if !verified {
            tracing::info!(identity = %identity, "Rejected login");
            return Err(CoreError::InvalidCredentials);
        }

        Ok(self.db.get_roles(identity.as_str())?.unwrap_or_default())
    }

    pub fn grant(&self, acting: &Identity, target: &Identity, role: Role) -> Result<RoleSet, CoreError> {
        let roles = applied(target, self.db.add_role(target.as_str(), role)?)?;
        tracing::info!(acting = %acting, target = %target, role = %role, "Granted role");
        Ok(roles)
    }

    pub fn revoke(&self, acting: &Identity, target: &Identity, role: Role) -> Result<RoleSet, CoreError> {
        let roles = applied(target, self.db.remove_role(target.as_str(), role)?)?;
        tracing::info!(acting = %acting, target = %target, role = %role, "Revoked role");
        Ok(roles)
    }

    pub fn list_all(&self) -> Result<BTreeMap<String, Vec<Role>>, CoreError> {
        Ok(self
            .db
            .all_roles()?
            .into_iter()
            .map(|(identity, roles)| (identity, roles.into_iter().collect()))
            .collect())
    }

    /// Make sure at least one Admin exists, seeding `admin` with `password`
    /// if none does.
    pub fn bootstrap(&self, admin: &Identity, password: Option<&Password>) -> Result<(), CoreError> {
        if self.db.admin_count()? > 0 {
            return Ok(());
        }
        validate_identity(admin)?;
        let password = password.ok_or_else(|| {
            CoreError::InvalidInput(format!(
                "no Admin exists yet; a password is required to seed '{admin}'"
            ))
        })?;
        validate_password(password)?;

        let credential = hash_password(password)?;
        self.db.seed_admin(admin.as_str(), &credential)?;
        tracing::info!(identity = %admin, "Seeded bootstrap Admin");
        Ok(())
    }
}

fn applied(target: &Identity, change: RoleChange) -> Result<RoleSet, CoreError> {
    match change {
        RoleChange::Applied(roles) => Ok(roles),
        RoleChange::UnknownIdentity => Err(CoreError::NotFound(format!(
            "identity '{target}' is not registered"
        ))),
        RoleChange::LastAdmin => Err(CoreError::InvariantViolation(format!(
            "revoking Admin from '{target}' would leave no Admin"
        ))),
    }
}

fn validate_identity(identity: &Identity) -> Result<(), CoreError> {
    let name = identity.as_str();
    if identity.is_anonymous() {
        return Err(CoreError::InvalidInput(format!(
            "'{}' is a reserved identity",
            Identity::ANONYMOUS
        )));
    }

    let len = name.chars().count();
    if len < MIN_NAME_LEN {
        return Err(CoreError::InvalidInput(format!(
            "identity must be at least {MIN_NAME_LEN} characters"
        )));
    }
    if len > MAX_NAME_LEN {
        return Err(CoreError::InvalidInput(format!(
            "identity must be at most {MAX_NAME_LEN} characters"
        )));
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(CoreError::InvalidInput(
            "identity must not contain whitespace or control characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_validation() {
        assert!(validate_identity(&Identity::new("alice")).is_ok());
        assert!(validate_identity(&Identity::new("2vxsx-fae-principal")).is_ok());
        assert!(validate_identity(&Identity::new("ab")).is_err());
        assert!(validate_identity(&Identity::new("has space")).is_err());
        assert!(validate_identity(&Identity::new("x".repeat(65))).is_err());
        assert!(validate_identity(&Identity::anonymous()).is_err());
    }
}
