//! Article register: insert, remove, lookup, search, sorted listings.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use shopd_core::{ArticleId, ShopError, ShopResult};

use crate::article::Article;

/// The article register. Entries are immutable `Arc<Article>`s handed out to
/// carts and sessions; removing an article from the register does not
/// invalidate lines already holding a reference.
#[derive(Debug, Default)]
pub struct Catalog {
    articles: RwLock<BTreeMap<ArticleId, Arc<Article>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, article: Article) -> ShopResult<Arc<Article>> {
        let mut articles = self.articles.write().unwrap();
        if articles.contains_key(&article.id()) {
            return Err(ShopError::ArticleExists(article.id()));
        }
        let article = Arc::new(article);
        articles.insert(article.id(), Arc::clone(&article));
        Ok(article)
    }

    pub fn remove(&self, id: ArticleId) -> ShopResult<Arc<Article>> {
        self.articles
            .write()
            .unwrap()
            .remove(&id)
            .ok_or(ShopError::ArticleNotFound(id))
    }

    pub fn get(&self, id: ArticleId) -> ShopResult<Arc<Article>> {
        self.articles
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(ShopError::ArticleNotFound(id))
    }

    /// Case-insensitive substring search over article names.
    pub fn search_by_name(&self, needle: &str) -> Vec<Arc<Article>> {
        let needle = needle.to_lowercase();
        self.articles
            .read()
            .unwrap()
            .values()
            .filter(|a| a.name().to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// All articles, ascending by article number.
    pub fn sorted_by_id(&self) -> Vec<Arc<Article>> {
        self.articles.read().unwrap().values().cloned().collect()
    }

    /// All articles, ascending by display name.
    pub fn sorted_by_name(&self) -> Vec<Arc<Article>> {
        let mut all = self.sorted_by_id();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    pub fn len(&self) -> usize {
        self.articles.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: u32, name: &str) -> Article {
        Article::new(ArticleId(id), name, 250)
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let catalog = Catalog::new();
        catalog.insert(sample(1, "Hammer")).unwrap();
        assert!(matches!(
            catalog.insert(sample(1, "Other hammer")),
            Err(ShopError::ArticleExists(ArticleId(1)))
        ));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let catalog = Catalog::new();
        catalog.insert(sample(1, "Claw Hammer")).unwrap();
        catalog.insert(sample(2, "Sledgehammer")).unwrap();
        catalog.insert(sample(3, "Saw")).unwrap();

        let hits = catalog.search_by_name("hammer");
        assert_eq!(hits.len(), 2);
        assert!(catalog.search_by_name("drill").is_empty());
    }

    #[test]
    fn listings_are_sorted() {
        let catalog = Catalog::new();
        catalog.insert(sample(3, "Anvil")).unwrap();
        catalog.insert(sample(1, "Wrench")).unwrap();
        catalog.insert(sample(2, "Pliers")).unwrap();

        let by_id: Vec<u32> = catalog.sorted_by_id().iter().map(|a| a.id().raw()).collect();
        assert_eq!(by_id, vec![1, 2, 3]);

        let by_name: Vec<String> = catalog
            .sorted_by_name()
            .iter()
            .map(|a| a.name().to_string())
            .collect();
        assert_eq!(by_name, vec!["Anvil", "Pliers", "Wrench"]);
    }

    #[test]
    fn removal_reports_missing_articles() {
        let catalog = Catalog::new();
        catalog.insert(sample(1, "Hammer")).unwrap();
        assert!(catalog.remove(ArticleId(1)).is_ok());
        assert!(matches!(
            catalog.remove(ArticleId(1)),
            Err(ShopError::ArticleNotFound(_))
        ));
    }
}
