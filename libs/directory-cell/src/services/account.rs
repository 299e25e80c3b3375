// libs/directory-cell/src/services/account.rs
use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use shared_database::store::from_document;
use shared_database::{Document, DocumentStore, Filter};
use shared_models::auth::User;
use shared_models::Role;

use crate::models::{Account, DirectoryError};

const ACCOUNTS: &str = "accounts";

pub struct AccountService {
    store: Arc<dyn DocumentStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get_account(&self, user_id: &str) -> Result<Account, DirectoryError> {
        self.store
            .find(ACCOUNTS, &[Filter::eq("user_id", user_id)])
            .await?
            .into_iter()
            .next()
            .map(from_document)
            .transpose()?
            .ok_or_else(|| DirectoryError::NotFound(format!("Account {}", user_id)))
    }

    /// Move an account between student and alumni. The holder or an admin may ask.
    pub async fn change_role(
        &self,
        actor: &User,
        user_id: &str,
        target: Role,
    ) -> Result<Account, DirectoryError> {
        if actor.id != user_id && actor.role != Role::Admin {
            return Err(DirectoryError::Unauthorized(
                "Only the account holder or an admin can change this role".to_string(),
            ));
        }

        let mut account = self.get_account(user_id).await?;
        if !account.role.can_transition_to(target) {
            warn!("Rejected role change {} -> {} for {}", account.role, target, user_id);
            return Err(DirectoryError::InvalidRoleTransition {
                from: account.role,
                to: target,
            });
        }

        let mut partial = Document::new();
        partial.insert("role".to_string(), json!(target));
        self.store.update(ACCOUNTS, &account.id, partial).await?;

        info!("Account {} moved from {} to {}", user_id, account.role, target);
        account.role = target;
        Ok(account)
    }
}
