use std::sync::Arc;

use chrono::NaiveDateTime;

use shopd_catalog::Article;
use shopd_core::{ArticleId, CustomerId};

/// One reservation inside a cart: an article and a quantity (> 0).
///
/// Holds the full article so totals and invoices stay printable even if the
/// article is later removed from the catalog.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub article: Arc<Article>,
    pub quantity: i64,
}

impl CartLine {
    pub fn line_total_cents(&self) -> u64 {
        self.article.price_cents() * self.quantity.max(0) as u64
    }
}

/// A customer's cart: at most one line per article, insertion order kept
/// for display.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn quantity_of(&self, article: ArticleId) -> Option<i64> {
        self.lines
            .iter()
            .find(|l| l.article.id() == article)
            .map(|l| l.quantity)
    }

    pub(crate) fn line_mut(&mut self, article: ArticleId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.article.id() == article)
    }

    pub(crate) fn push(&mut self, line: CartLine) {
        debug_assert!(self.quantity_of(line.article.id()).is_none());
        self.lines.push(line);
    }

    pub(crate) fn drop_line(&mut self, article: ArticleId) -> Option<CartLine> {
        let index = self.lines.iter().position(|l| l.article.id() == article)?;
        Some(self.lines.remove(index))
    }

    pub(crate) fn take_lines(&mut self) -> Vec<CartLine> {
        std::mem::take(&mut self.lines)
    }

    pub fn total_cents(&self) -> u64 {
        self.lines.iter().map(CartLine::line_total_cents).sum()
    }
}

/// Snapshot of a completed checkout, the basis for the invoice.
#[derive(Debug, Clone)]
pub struct Purchase {
    pub customer: CustomerId,
    pub at: NaiveDateTime,
    pub lines: Vec<CartLine>,
}

impl Purchase {
    pub fn total_cents(&self) -> u64 {
        self.lines.iter().map(CartLine::line_total_cents).sum()
    }
}
