//! Read-only aggregation over the two collections.
//!
//! Every query reloads fresh snapshots and recomputes its result; nothing
//! is cached between calls, so a view taken right after a mutation always
//! reflects the persisted state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{AccountStore, ProductStore};
use crate::models::{Account, AccountStatus, FarmerProfile, Product};
use crate::services::AdminError;

/// How many products the dashboard shows as "recent".
const RECENT_PRODUCT_LIMIT: usize = 5;

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_products: usize,
    pub total_farmers: usize,
    pub total_scans: u64,
    pub recent_products: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct FarmerSummary {
    pub username: String,
    pub status: AccountStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub product_count: usize,
    pub total_scans: u64,
}

/// A product annotated with its owner's public profile, where the owner
/// still exists. A dangling `created_by` simply leaves the annotation off.
#[derive(Debug, Serialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub product: Product,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farmer: Option<FarmerProfile>,
}

#[derive(Debug, Serialize)]
pub struct FarmerDetail {
    pub farmer: FarmerSummary,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone)]
pub struct StatsService {
    accounts: AccountStore,
    products: ProductStore,
}

impl StatsService {
    pub const fn new(accounts: AccountStore, products: ProductStore) -> Self {
        Self { accounts, products }
    }

    /// Global dashboard statistics.
    pub async fn dashboard(&self) -> Result<DashboardStats, AdminError> {
        let accounts = self.accounts.load().await?;
        let mut products = self.products.load().await?;

        let total_products = products.len();
        let total_farmers = accounts.iter().filter(|a| !a.is_admin()).count();
        let total_scans = products.iter().map(|p| p.scan_count).sum();

        sort_most_recent_first(&mut products);
        products.truncate(RECENT_PRODUCT_LIMIT);

        Ok(DashboardStats {
            total_products,
            total_farmers,
            total_scans,
            recent_products: products,
        })
    }

    /// All non-admin accounts in insertion order, each annotated with its
    /// product count and scan total.
    pub async fn farmer_roster(&self) -> Result<Vec<FarmerSummary>, AdminError> {
        let accounts = self.accounts.load().await?;
        let products = self.products.load().await?;

        Ok(accounts
            .iter()
            .filter(|a| !a.is_admin())
            .map(|a| summarize(a, &products))
            .collect())
    }

    /// All products, most recent first, annotated with owner profiles.
    pub async fn product_catalog(&self) -> Result<Vec<CatalogEntry>, AdminError> {
        let accounts = self.accounts.load().await?;
        let mut products = self.products.load().await?;

        let profiles: HashMap<&str, FarmerProfile> = accounts
            .iter()
            .map(|a| (a.username.as_str(), a.public_profile()))
            .collect();

        sort_most_recent_first(&mut products);

        Ok(products
            .into_iter()
            .map(|product| {
                let farmer = profiles.get(product.created_by.as_str()).cloned();
                CatalogEntry { product, farmer }
            })
            .collect())
    }

    /// A single farmer with their products, most recent first.
    /// Admin accounts are not farmers and resolve as not found.
    pub async fn farmer_detail(&self, username: &str) -> Result<FarmerDetail, AdminError> {
        let accounts = self.accounts.load().await?;
        let products = self.products.load().await?;

        let farmer = accounts
            .iter()
            .find(|a| a.username == username && !a.is_admin())
            .ok_or_else(|| AdminError::FarmerNotFound(username.to_string()))?;

        let summary = summarize(farmer, &products);

        let mut owned: Vec<Product> = products
            .into_iter()
            .filter(|p| p.created_by == username)
            .collect();
        sort_most_recent_first(&mut owned);

        Ok(FarmerDetail {
            farmer: summary,
            products: owned,
        })
    }
}

fn summarize(account: &Account, products: &[Product]) -> FarmerSummary {
    let owned = products.iter().filter(|p| p.created_by == account.username);
    let (product_count, total_scans) = owned.fold((0, 0), |(count, scans), p| {
        (count + 1, scans + p.scan_count)
    });

    FarmerSummary {
        username: account.username.clone(),
        status: account.status,
        updated_at: account.updated_at,
        product_count,
        total_scans,
    }
}

/// Stable descending sort on `created_at`; ties keep collection order.
fn sort_most_recent_first(products: &mut [Product]) {
    products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
