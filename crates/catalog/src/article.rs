use serde::{Deserialize, Serialize};

use shopd_core::{ArticleId, ShopError, ShopResult};

/// Catalog entry: display name, unit price, and for bulk articles a package
/// size every stock delta must be a multiple of.
///
/// The description is immutable once created; the mutable available quantity
/// lives in the [`crate::StockLedger`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    id: ArticleId,
    name: String,
    /// Price in smallest currency unit (e.g., cents).
    price_cents: u64,
    /// `Some(n)` marks a bulk article with package size `n > 1`.
    package_size: Option<i64>,
}

impl Article {
    pub fn new(id: ArticleId, name: impl Into<String>, price_cents: u64) -> Self {
        Self {
            id,
            name: name.into(),
            price_cents,
            package_size: None,
        }
    }

    /// A bulk article. Sizes below 2 carry no meaningful package rule and
    /// degrade to a plain article; the management layer rejects them before
    /// construction so this stays unreachable from the outside.
    pub fn bulk(
        id: ArticleId,
        name: impl Into<String>,
        price_cents: u64,
        package_size: i64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            price_cents,
            package_size: (package_size > 1).then_some(package_size),
        }
    }

    pub fn id(&self) -> ArticleId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price_cents(&self) -> u64 {
        self.price_cents
    }

    pub fn package_size(&self) -> Option<i64> {
        self.package_size
    }

    pub fn is_bulk(&self) -> bool {
        self.package_size.is_some()
    }

    /// Bulk-article rule: every stock delta must be a whole number of
    /// packages. Plain articles accept any delta.
    pub fn check_package_multiple(&self, quantity: i64) -> ShopResult<()> {
        match self.package_size {
            Some(size) if quantity % size != 0 => Err(ShopError::InvalidPackageMultiple {
                article: self.id,
                quantity,
                package_size: size,
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_article_accepts_any_delta() {
        let article = Article::new(ArticleId(1), "Screwdriver", 499);
        assert!(article.check_package_multiple(7).is_ok());
        assert!(article.check_package_multiple(-13).is_ok());
    }

    #[test]
    fn bulk_article_rejects_non_multiples() {
        let article = Article::bulk(ArticleId(2), "Bottled water", 1099, 6);
        assert!(article.check_package_multiple(12).is_ok());
        assert!(article.check_package_multiple(-6).is_ok());
        assert!(matches!(
            article.check_package_multiple(-7),
            Err(ShopError::InvalidPackageMultiple { package_size: 6, .. })
        ));
    }

    #[test]
    fn package_sizes_below_two_degrade_to_plain() {
        for size in [-6, 0, 1] {
            let article = Article::bulk(ArticleId(3), "Loose screws", 9, size);
            assert!(!article.is_bulk());
            assert!(article.check_package_multiple(5).is_ok());
        }
    }
}
