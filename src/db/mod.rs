//! Flat-snapshot JSON stores for the two collections.
//!
//! Each store reads and rewrites its whole file on every call. There is
//! no partial-update API and no caching: callers load a fresh snapshot,
//! mutate it, and save it back. If two operations interleave, the later
//! save wins; the admin layer is single-writer per request by contract.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;

use crate::models::{Account, Product};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {message}")]
    Io { path: String, message: String },

    #[error("invalid JSON in {path}: {message}")]
    Json { path: String, message: String },
}

impl StoreError {
    fn io(path: &Path, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    fn json(path: &Path, err: &serde_json::Error) -> Self {
        Self::Json {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Wrapper root of `accounts.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct AccountsRoot {
    #[serde(default)]
    accounts: Vec<Account>,
}

/// Wrapper root of `products.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProductsRoot {
    #[serde(default)]
    products: Vec<Product>,
}

async fn read_snapshot<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    match fs::read_to_string(path).await {
        Ok(raw) => serde_json::from_str(&raw).map_err(|e| StoreError::json(path, &e)),
        // A store that has never been written reads as an empty collection.
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(StoreError::io(path, &e)),
    }
}

async fn write_snapshot<T: Serialize>(path: &Path, root: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, &e))?;
    }

    let raw = serde_json::to_string_pretty(root).map_err(|e| StoreError::json(path, &e))?;
    fs::write(path, raw)
        .await
        .map_err(|e| StoreError::io(path, &e))
}

#[derive(Debug, Clone)]
pub struct AccountStore {
    path: PathBuf,
}

impl AccountStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Result<Vec<Account>, StoreError> {
        let root: AccountsRoot = read_snapshot(&self.path).await?;
        Ok(root.accounts)
    }

    pub async fn save(&self, accounts: Vec<Account>) -> Result<(), StoreError> {
        write_snapshot(&self.path, &AccountsRoot { accounts }).await
    }
}

#[derive(Debug, Clone)]
pub struct ProductStore {
    path: PathBuf,
}

impl ProductStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Result<Vec<Product>, StoreError> {
        let root: ProductsRoot = read_snapshot(&self.path).await?;
        Ok(root.products)
    }

    pub async fn save(&self, products: Vec<Product>) -> Result<(), StoreError> {
        write_snapshot(&self.path, &ProductsRoot { products }).await
    }
}
