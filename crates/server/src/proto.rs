//! Request parsing and reply framing for the line protocol.
//!
//! A request is an uppercase verb followed by space-separated arguments.
//! Free-text fields (names) come last and run to the end of the line, so
//! they may contain spaces; every other field is a single token.

use std::str::FromStr;

use shopd_core::{ArticleId, CustomerId, EmployeeId, ShopError, ShopResult};

/// One parsed client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: String, password: String },
    Logout,
    Quit,
    ListArticles { by_name: bool },
    Search { needle: String },
    NewArticle { id: ArticleId, price_cents: u64, stock: i64, name: String },
    NewBulkArticle { id: ArticleId, price_cents: u64, package_size: i64, stock: i64, name: String },
    AdjustStock { id: ArticleId, delta: i64 },
    RemoveArticle { id: ArticleId },
    NewCustomer {
        id: CustomerId,
        username: String,
        password: String,
        street: String,
        postcode: u32,
        city: String,
        name: String,
    },
    NewEmployee { id: EmployeeId, username: String, password: String, name: String },
    ListCustomers,
    ListEmployees,
    RemoveCustomer { id: CustomerId },
    RemoveEmployee { id: EmployeeId },
    CartAdd { article: ArticleId, quantity: i64 },
    CartSet { article: ArticleId, quantity: i64 },
    CartRemove { article: ArticleId },
    CartShow,
    CartEmpty,
    Checkout,
    History { article: ArticleId },
    Log,
    Save,
}

impl Command {
    pub fn parse(line: &str) -> ShopResult<Self> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().ok_or_else(|| ShopError::parse("empty request"))?;
        let args: Vec<&str> = parts.collect();

        let cmd = match verb {
            "LOGIN" => {
                const U: &str = "LOGIN <username> <password>";
                Self::Login {
                    username: fixed(&args, 0, U)?.to_string(),
                    password: fixed(&args, 1, U)?.to_string(),
                }
            }
            "LOGOUT" => Self::Logout,
            "QUIT" => Self::Quit,
            "LIST_ARTICLES" => Self::ListArticles {
                by_name: match args.first() {
                    Some(&"name") => true,
                    Some(&"id") | None => false,
                    Some(_) => return Err(usage("LIST_ARTICLES [id|name]")),
                },
            },
            "SEARCH" => Self::Search {
                needle: tail(&args, 0, "SEARCH <name>")?,
            },
            "NEW_ARTICLE" => {
                const U: &str = "NEW_ARTICLE <id> <price-cents> <stock> <name>";
                Self::NewArticle {
                    id: num(&args, 0, U)?,
                    price_cents: num(&args, 1, U)?,
                    stock: num(&args, 2, U)?,
                    name: tail(&args, 3, U)?,
                }
            }
            "NEW_BULK_ARTICLE" => {
                const U: &str = "NEW_BULK_ARTICLE <id> <price-cents> <package-size> <stock> <name>";
                Self::NewBulkArticle {
                    id: num(&args, 0, U)?,
                    price_cents: num(&args, 1, U)?,
                    package_size: num(&args, 2, U)?,
                    stock: num(&args, 3, U)?,
                    name: tail(&args, 4, U)?,
                }
            }
            "ADJUST_STOCK" => {
                const U: &str = "ADJUST_STOCK <id> <delta>";
                Self::AdjustStock {
                    id: num(&args, 0, U)?,
                    delta: num(&args, 1, U)?,
                }
            }
            "REMOVE_ARTICLE" => Self::RemoveArticle {
                id: num(&args, 0, "REMOVE_ARTICLE <id>")?,
            },
            "NEW_CUSTOMER" => {
                const U: &str =
                    "NEW_CUSTOMER <id> <username> <password> <street> <postcode> <city> <name>";
                Self::NewCustomer {
                    id: num(&args, 0, U)?,
                    username: fixed(&args, 1, U)?.to_string(),
                    password: fixed(&args, 2, U)?.to_string(),
                    street: fixed(&args, 3, U)?.to_string(),
                    postcode: num(&args, 4, U)?,
                    city: fixed(&args, 5, U)?.to_string(),
                    name: tail(&args, 6, U)?,
                }
            }
            "NEW_EMPLOYEE" => {
                const U: &str = "NEW_EMPLOYEE <id> <username> <password> <name>";
                Self::NewEmployee {
                    id: num(&args, 0, U)?,
                    username: fixed(&args, 1, U)?.to_string(),
                    password: fixed(&args, 2, U)?.to_string(),
                    name: tail(&args, 3, U)?,
                }
            }
            "LIST_CUSTOMERS" => Self::ListCustomers,
            "LIST_EMPLOYEES" => Self::ListEmployees,
            "REMOVE_CUSTOMER" => Self::RemoveCustomer {
                id: num(&args, 0, "REMOVE_CUSTOMER <id>")?,
            },
            "REMOVE_EMPLOYEE" => Self::RemoveEmployee {
                id: num(&args, 0, "REMOVE_EMPLOYEE <id>")?,
            },
            "CART_ADD" => {
                const U: &str = "CART_ADD <article-id> <quantity>";
                Self::CartAdd {
                    article: num(&args, 0, U)?,
                    quantity: num(&args, 1, U)?,
                }
            }
            "CART_SET" => {
                const U: &str = "CART_SET <article-id> <quantity>";
                Self::CartSet {
                    article: num(&args, 0, U)?,
                    quantity: num(&args, 1, U)?,
                }
            }
            "CART_REMOVE" => Self::CartRemove {
                article: num(&args, 0, "CART_REMOVE <article-id>")?,
            },
            "CART_SHOW" => Self::CartShow,
            "CART_EMPTY" => Self::CartEmpty,
            "CHECKOUT" => Self::Checkout,
            "HISTORY" => Self::History {
                article: num(&args, 0, "HISTORY <article-id>")?,
            },
            "LOG" => Self::Log,
            "SAVE" => Self::Save,
            other => return Err(ShopError::parse(format!("unknown command {other}"))),
        };
        Ok(cmd)
    }
}

/// One framed server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ok(Vec<String>),
    Err { code: String, message: String },
}

impl Reply {
    pub fn ok(lines: Vec<String>) -> Self {
        Self::Ok(lines)
    }

    pub fn empty() -> Self {
        Self::Ok(Vec::new())
    }

    pub fn err(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Err {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Render the reply without a trailing newline. Error messages are
    /// flattened to one line so the framing cannot be broken.
    pub fn render(&self) -> String {
        match self {
            Self::Ok(lines) => {
                let mut out = format!("OK {}", lines.len());
                for line in lines {
                    out.push('\n');
                    out.push_str(line);
                }
                out
            }
            Self::Err { code, message } => {
                format!("ERR {code} {}", message.replace('\n', " "))
            }
        }
    }
}

fn usage(text: &str) -> ShopError {
    ShopError::parse(format!("usage: {text}"))
}

fn fixed<'a>(args: &[&'a str], idx: usize, u: &str) -> ShopResult<&'a str> {
    args.get(idx).copied().ok_or_else(|| usage(u))
}

fn num<T: FromStr>(args: &[&str], idx: usize, u: &str) -> ShopResult<T> {
    fixed(args, idx, u)?.parse().map_err(|_| usage(u))
}

fn tail(args: &[&str], from: usize, u: &str) -> ShopResult<String> {
    if args.len() <= from {
        return Err(usage(u));
    }
    Ok(args[from..].join(" "))
}
