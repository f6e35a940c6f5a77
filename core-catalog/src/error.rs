use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Catalog is empty")]
    Empty,
}

pub type Result<T> = std::result::Result<T, CatalogError>;
