use serde::{Deserialize, Serialize};

use shopd_catalog::Article;

/// One article plus its ledger level, as written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSnapshot {
    #[serde(flatten)]
    pub article: Article,
    pub stock: i64,
}
