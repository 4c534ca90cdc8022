//! Stock movements and their log-line representation.
//!
//! Wire layout (space-delimited, fixed positions):
//!
//! ```text
//! <yyyy-MM-dd> <HH:mm:ss> <Rolle> <id> <n> Stueck Artikel <artikelnummer> <verb>
//! ```
//!
//! with `Rolle` one of `Mitarbeiter`/`Kunde` and `verb` one of `eingelagert`
//! (inbound), `ausgelagert` (outbound by an employee), `verkauft` (sold to a
//! customer). The format is kept byte-compatible with the historical log
//! files this daemon inherits.

use chrono::{NaiveDateTime, TimeDelta};

use shopd_core::{Actor, ArticleId, CustomerId, EmployeeId, ShopError, ShopResult};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One stock movement: who moved how much of which article, when.
///
/// `delta` is signed: positive for inbound (restock), negative for outbound
/// (write-off or sale). Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMovement {
    pub at: NaiveDateTime,
    pub actor: Actor,
    pub article: ArticleId,
    pub delta: i64,
}

impl StockMovement {
    pub fn new(at: NaiveDateTime, actor: Actor, article: ArticleId, delta: i64) -> Self {
        Self {
            at,
            actor,
            article,
            delta,
        }
    }

    /// A sale consumes stock: negative delta, customer actor.
    pub fn sale(at: NaiveDateTime, customer: CustomerId, article: ArticleId, quantity: i64) -> Self {
        Self::new(at, Actor::Customer(customer), article, -quantity)
    }

    /// Manual adjustment by an employee; `delta` keeps its sign.
    pub fn adjustment(
        at: NaiveDateTime,
        employee: EmployeeId,
        article: ArticleId,
        delta: i64,
    ) -> Self {
        Self::new(at, Actor::Employee(employee), article, delta)
    }

    /// Movement verb as written to the log.
    pub fn verb(&self) -> &'static str {
        if self.delta > 0 {
            "eingelagert"
        } else {
            match self.actor {
                Actor::Employee(_) => "ausgelagert",
                Actor::Customer(_) => "verkauft",
            }
        }
    }

    /// Whether this movement is younger than 30 days, measured from `now`.
    pub fn within_window(&self, now: NaiveDateTime) -> bool {
        self.at > now - TimeDelta::days(30)
    }

    /// Render the log line (no trailing newline). Zero-delta movements have
    /// no line representation and are skipped at flush time.
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {} Stueck Artikel {} {}",
            self.at.format(TIMESTAMP_FORMAT),
            self.actor,
            self.delta.abs(),
            self.article,
            self.verb(),
        )
    }

    /// Parse a log line. Any structural or numeric failure is a
    /// [`ShopError::Parse`] naming the offending line.
    pub fn parse_line(line: &str) -> ShopResult<Self> {
        let bad = || ShopError::parse(line);

        let tokens: Vec<&str> = line.split(' ').collect();
        if tokens.len() != 9 || tokens[5] != "Stueck" || tokens[6] != "Artikel" {
            return Err(bad());
        }

        let at = NaiveDateTime::parse_from_str(
            &format!("{} {}", tokens[0], tokens[1]),
            TIMESTAMP_FORMAT,
        )
        .map_err(|_| bad())?;

        let actor_id: u32 = tokens[3].parse().map_err(|_| bad())?;
        let actor = match tokens[2] {
            "Mitarbeiter" => Actor::Employee(EmployeeId(actor_id)),
            "Kunde" => Actor::Customer(CustomerId(actor_id)),
            _ => return Err(bad()),
        };

        let quantity: i64 = tokens[4].parse().map_err(|_| bad())?;
        let article = ArticleId(tokens[7].parse().map_err(|_| bad())?);

        let delta = match tokens[8] {
            "eingelagert" => quantity,
            "ausgelagert" | "verkauft" => -quantity,
            _ => return Err(bad()),
        };

        Ok(Self {
            at,
            actor,
            article,
            delta,
        })
    }
}
