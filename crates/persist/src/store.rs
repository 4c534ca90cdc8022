//! JSON snapshot files under the data directory.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use shopd_core::ShopResult;
use shopd_parties::{Customer, Employee};

use crate::snapshot::ArticleSnapshot;

const ARTICLES_FILE: &str = "articles.json";
const CUSTOMERS_FILE: &str = "customers.json";
const EMPLOYEES_FILE: &str = "employees.json";

/// Reads and writes the three register snapshots in a data directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load_articles(&self) -> ShopResult<Vec<ArticleSnapshot>> {
        self.load(ARTICLES_FILE)
    }

    pub fn save_articles(&self, articles: &[ArticleSnapshot]) -> ShopResult<()> {
        self.save(ARTICLES_FILE, articles)
    }

    pub fn load_customers(&self) -> ShopResult<Vec<Customer>> {
        self.load(CUSTOMERS_FILE)
    }

    pub fn save_customers(&self, customers: &[Customer]) -> ShopResult<()> {
        self.save(CUSTOMERS_FILE, customers)
    }

    pub fn load_employees(&self) -> ShopResult<Vec<Employee>> {
        self.load(EMPLOYEES_FILE)
    }

    pub fn save_employees(&self, employees: &[Employee]) -> ShopResult<()> {
        self.save(EMPLOYEES_FILE, employees)
    }

    /// A missing snapshot file reads as an empty register (first start).
    fn load<T: DeserializeOwned>(&self, name: &str) -> ShopResult<Vec<T>> {
        let path = self.dir.join(name);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let items: Vec<T> = serde_json::from_reader(BufReader::new(file))
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        Ok(items)
    }

    /// Write to a sibling temp file, then rename over the snapshot so a
    /// crash mid-write never leaves a torn file behind.
    fn save<T: Serialize>(&self, name: &str, items: &[T]) -> ShopResult<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        let tmp = path.with_extension("json.tmp");
        {
            let writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(writer, items)
                .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        }
        fs::rename(&tmp, &path)?;
        debug!(file = %path.display(), count = items.len(), "snapshot written");
        Ok(())
    }
}
