//! Shop error model.
//!
//! Every recoverable failure the domain layer can produce, as explicit
//! variants. Absence ("no such article") is a value here, never control
//! flow; the protocol layer maps each variant to a distinct response code.

use thiserror::Error;

use crate::id::{ArticleId, CustomerId, EmployeeId};

/// Result type used across the shop crates.
pub type ShopResult<T> = Result<T, ShopError>;

#[derive(Debug, Error)]
pub enum ShopError {
    /// Requested reservation exceeds the available stock.
    #[error("article {article}: requested {requested}, only {available} available")]
    InsufficientStock {
        article: ArticleId,
        requested: i64,
        available: i64,
    },

    /// Bulk-article delta that is not a multiple of the package size.
    #[error("article {article}: {quantity} is not a multiple of package size {package_size}")]
    InvalidPackageMultiple {
        article: ArticleId,
        quantity: i64,
        package_size: i64,
    },

    /// Quantity argument outside its valid range (e.g. a negative or zero
    /// cart quantity). Checked in the domain layer, not trusted from the
    /// wire.
    #[error("invalid quantity {0}")]
    InvalidQuantity(i64),

    /// Bulk package size below the minimum of 2.
    #[error("invalid package size {0}")]
    InvalidPackageSize(i64),

    /// Cart mutation targeting an article with no cart line.
    #[error("article {0} is not in the cart")]
    ArticleNotInCart(ArticleId),

    /// Checkout on an empty cart.
    #[error("cart is empty")]
    EmptyCart,

    #[error("article {0} does not exist")]
    ArticleNotFound(ArticleId),

    #[error("customer {0} does not exist")]
    CustomerNotFound(CustomerId),

    #[error("employee {0} does not exist")]
    EmployeeNotFound(EmployeeId),

    #[error("article {0} already exists")]
    ArticleExists(ArticleId),

    #[error("customer {0} already exists")]
    CustomerExists(CustomerId),

    #[error("employee {0} already exists")]
    EmployeeExists(EmployeeId),

    #[error("username {0:?} is already taken")]
    UsernameTaken(String),

    /// Malformed movement-log line. One bad line fails the whole history
    /// reconstruction call.
    #[error("malformed log line: {0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ShopError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Stable machine-readable code, one per variant. The line protocol
    /// sends this so clients can disambiguate failures.
    pub fn code(&self) -> &'static str {
        match self {
            ShopError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            ShopError::InvalidPackageMultiple { .. } => "NOT_PACKAGE_MULTIPLE",
            ShopError::InvalidQuantity(_) => "BAD_QUANTITY",
            ShopError::InvalidPackageSize(_) => "BAD_PACKAGE_SIZE",
            ShopError::ArticleNotInCart(_) => "NOT_IN_CART",
            ShopError::EmptyCart => "CART_EMPTY",
            ShopError::ArticleNotFound(_)
            | ShopError::CustomerNotFound(_)
            | ShopError::EmployeeNotFound(_) => "NOT_FOUND",
            ShopError::ArticleExists(_)
            | ShopError::CustomerExists(_)
            | ShopError::EmployeeExists(_) => "EXISTS",
            ShopError::UsernameTaken(_) => "USERNAME_TAKEN",
            ShopError::Parse(_) => "PARSE",
            ShopError::Io(_) => "IO",
        }
    }
}
