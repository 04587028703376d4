//! Mutation layer for the admin surface: cascade deletion of farmers,
//! product deletion, and account status toggling.
//!
//! Every operation performs a full load-mutate-save cycle against the
//! backing stores and retains nothing across calls. Collection rewrites
//! build a filtered copy instead of removing in place.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::{AccountStore, ProductStore, StoreError};
use crate::models::{Account, Product};
use crate::services::{Clock, SideFileService};

/// The reserved bootstrap administrator identity. This single account can
/// never be cascade-deleted; other administrators are not special-cased.
pub const RESERVED_ADMIN: &str = "admin";

/// Domain errors for admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Farmer not found: {0}")]
    FarmerNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("The admin account cannot be deleted")]
    ProtectedAccount,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Orchestrates the destructive and status-changing admin operations.
///
/// Holds the two stores plus the collaborator seams (side-file cleanup,
/// clock). Authorization has already happened by the time these run.
pub struct AdminService {
    accounts: AccountStore,
    products: ProductStore,
    side_files: Arc<dyn SideFileService>,
    clock: Arc<dyn Clock>,
}

impl AdminService {
    pub fn new(
        accounts: AccountStore,
        products: ProductStore,
        side_files: Arc<dyn SideFileService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            products,
            side_files,
            clock,
        }
    }

    /// Deletes a farmer account together with everything it owns.
    ///
    /// The account is removed and persisted first, then each owned
    /// product's side-files are cleaned up best-effort, and finally the
    /// product collection is persisted without the owned records. A
    /// failure between the two persists leaves records dangling; the
    /// read views tolerate that window.
    ///
    /// Account removal is idempotent: deleting a username with no match
    /// still reports success.
    pub async fn delete_farmer(&self, username: &str) -> Result<String, AdminError> {
        if username == RESERVED_ADMIN {
            return Err(AdminError::ProtectedAccount);
        }

        let accounts = self.accounts.load().await?;
        let remaining: Vec<Account> = accounts
            .into_iter()
            .filter(|a| a.username != username)
            .collect();
        self.accounts.save(remaining).await?;

        let products = self.products.load().await?;
        let (owned, kept): (Vec<Product>, Vec<Product>) = products
            .into_iter()
            .partition(|p| p.created_by == username);

        for product in &owned {
            if let Err(e) = self.side_files.delete_side_files(&product.id).await {
                warn!(
                    product_id = %product.id,
                    error = %e,
                    "Side-file cleanup failed during cascade, continuing"
                );
            }
        }

        self.products.save(kept).await?;

        info!(username, products = owned.len(), "Deleted farmer and owned products");
        Ok(format!(
            "Deleted farmer {username} and {} product(s)",
            owned.len()
        ))
    }

    /// Deletes a single product by id.
    ///
    /// An unknown id is a structured `ProductNotFound` failure. Side-file
    /// cleanup runs after the collection is persisted and is best-effort.
    pub async fn delete_product(&self, id: &str) -> Result<String, AdminError> {
        let products = self.products.load().await?;

        if !products.iter().any(|p| p.id == id) {
            return Err(AdminError::ProductNotFound(id.to_string()));
        }

        let kept: Vec<Product> = products.into_iter().filter(|p| p.id != id).collect();
        self.products.save(kept).await?;

        if let Err(e) = self.side_files.delete_side_files(id).await {
            warn!(product_id = %id, error = %e, "Side-file cleanup failed after product deletion");
        }

        info!(product_id = %id, "Deleted product");
        Ok(format!("Deleted product {id}"))
    }

    /// Flips an account between active and inactive and stamps `updated_at`.
    ///
    /// An unknown username persists the store unchanged and still reports
    /// success, matching the historical behavior of this operation.
    pub async fn toggle_farmer_status(&self, username: &str) -> Result<String, AdminError> {
        let mut accounts = self.accounts.load().await?;

        if let Some(account) = accounts.iter_mut().find(|a| a.username == username) {
            account.status = account.status.toggled();
            account.updated_at = Some(self.clock.now());
            info!(username, status = ?account.status, "Toggled farmer status");
        } else {
            debug!(username, "Status toggle requested for unknown farmer");
        }

        self.accounts.save(accounts).await?;
        Ok(format!("Updated status of farmer {username}"))
    }
}
