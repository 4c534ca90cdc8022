//! Append-only movement log backed by a flat text file.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{Local, NaiveDate, NaiveDateTime};
use tracing::debug;

use shopd_core::{ArticleId, ShopResult};

use crate::movement::StockMovement;

/// Chronological record of stock movements.
///
/// Movements are collected in memory and written out on [`EventLog::flush`];
/// flushing first drops file entries older than 30 days. All file access is
/// serialized through one lock so readers never observe a half-written line
/// or a rewrite in progress.
#[derive(Debug)]
pub struct EventLog {
    path: PathBuf,
    pending: Mutex<Vec<StockMovement>>,
    file: Mutex<()>,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pending: Mutex::new(Vec::new()),
            file: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Queue a movement. It becomes durable on the next flush.
    pub fn record(&self, movement: StockMovement) {
        self.pending.lock().unwrap().push(movement);
    }

    /// Net delta of queued movements for `article` dated `day`. History
    /// reconstruction folds this in so today's unlogged activity does not
    /// corrupt yesterday's closing balance.
    pub fn pending_delta_on(&self, article: ArticleId, day: NaiveDate) -> i64 {
        self.pending
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.article == article && m.at.date() == day)
            .map(|m| m.delta)
            .sum()
    }

    /// Write queued movements to the file, dropping file entries older than
    /// 30 days first. Zero-delta movements are discarded without a line.
    pub fn flush(&self) -> ShopResult<()> {
        let now = Local::now().naive_local();
        let queued: Vec<StockMovement> = std::mem::take(&mut *self.pending.lock().unwrap());

        let _file = self.file.lock().unwrap();
        let mut lines = read_all_lines(&self.path)?;

        // Keep the file from its first in-window entry on; a line whose
        // timestamp cannot be parsed counts as expired here, matching how
        // the inherited log files were maintained.
        let cut = lines
            .iter()
            .position(|line| line_within_window(line, now))
            .unwrap_or(lines.len());
        if cut > 0 {
            debug!(pruned = cut, path = %self.path.display(), "pruned expired log entries");
            lines.drain(..cut);
        }

        lines.extend(
            queued
                .iter()
                .filter(|m| m.delta != 0)
                .map(StockMovement::to_line),
        );

        rewrite(&self.path, &lines)?;
        Ok(())
    }

    /// All current file lines, oldest first. A missing file reads as empty.
    pub fn read_lines(&self) -> ShopResult<Vec<String>> {
        let _file = self.file.lock().unwrap();
        read_all_lines(&self.path)
    }

    /// Drop every entry (queued and on disk) for `article`.
    ///
    /// Used when an article is permanently removed, so a later article that
    /// reuses the number starts with a clean history.
    pub fn purge_article(&self, article: ArticleId) -> ShopResult<()> {
        self.pending.lock().unwrap().retain(|m| m.article != article);

        let _file = self.file.lock().unwrap();
        let lines = read_all_lines(&self.path)?;
        let id = article.to_string();
        let kept: Vec<String> = lines
            .into_iter()
            .filter(|line| line.split(' ').nth(7) != Some(id.as_str()))
            .collect();
        rewrite(&self.path, &kept)?;
        Ok(())
    }
}

fn line_within_window(line: &str, now: NaiveDateTime) -> bool {
    StockMovement::parse_line(line)
        .map(|m| m.within_window(now))
        .unwrap_or(false)
}

fn read_all_lines(path: &Path) -> ShopResult<Vec<String>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };
    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        lines.push(line?);
    }
    Ok(lines)
}

/// Replace the log atomically: write a sibling temp file, then rename it
/// over the original.
fn rewrite(path: &Path, lines: &[String]) -> ShopResult<()> {
    let tmp = path.with_extension("log.tmp");
    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        for line in lines {
            writeln!(writer, "{line}")?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
