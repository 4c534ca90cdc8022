//! One client connection: read request lines, dispatch against the shared
//! [`Shop`], write framed replies.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tracing::debug;

use shopd_cart::{CartLine, Purchase};
use shopd_catalog::Article;
use shopd_core::{CustomerId, EmployeeId, ShopResult};
use shopd_parties::{Customer, Employee, Login};

use crate::proto::{Command, Reply};
use crate::shop::Shop;

/// Drive a connection until the client quits or hangs up.
///
/// A dropped connection does not cancel an armed cart-expiry timer, so a
/// full cart abandoned mid-session still returns its stock after the idle
/// timeout.
pub async fn run(shop: Arc<Shop>, stream: TcpStream) -> std::io::Result<()> {
    let peer = stream.peer_addr()?;
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();

    debug!(%peer, "session opened");
    send(
        &mut write,
        &Reply::ok(vec![format!("shopd {}", env!("CARGO_PKG_VERSION"))]),
    )
    .await?;

    let mut login: Option<Login> = None;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let cmd = match Command::parse(line) {
            Ok(cmd) => cmd,
            Err(err) => {
                send(&mut write, &Reply::err(err.code(), err.to_string())).await?;
                continue;
            }
        };
        let quit = matches!(cmd, Command::Quit);
        let reply = dispatch(&shop, &mut login, cmd);

        // Every request from a logged-in customer counts as cart activity,
        // browsing included.
        if let Some(Login::Customer(customer)) = &login {
            shop.expiry().on_activity(customer.id);
        }

        send(&mut write, &reply).await?;
        if quit {
            break;
        }
    }

    debug!(%peer, "session closed");
    Ok(())
}

async fn send(write: &mut OwnedWriteHalf, reply: &Reply) -> std::io::Result<()> {
    let mut buf = reply.render();
    buf.push('\n');
    write.write_all(buf.as_bytes()).await
}

fn dispatch(shop: &Shop, login: &mut Option<Login>, cmd: Command) -> Reply {
    match cmd {
        Command::Login { username, password } => match shop.login(&username, &password) {
            Some(who) => {
                let line = describe(&who);
                *login = Some(who);
                Reply::ok(vec![line])
            }
            None => Reply::err("BAD_CREDENTIALS", "unknown username or wrong password"),
        },
        Command::Logout | Command::Quit => {
            *login = None;
            Reply::empty()
        }

        Command::ListArticles { by_name } => {
            article_list(shop, shop.articles(by_name))
        }
        Command::Search { needle } => article_list(shop, shop.search(&needle)),
        Command::NewArticle {
            id,
            price_cents,
            stock,
            name,
        } => employee(login).map_or_else(
            |deny| deny,
            |emp| {
                reply(
                    shop.new_article(emp, id, name, price_cents, None, stock)
                        .map(|a| vec![article_line(shop, &a)]),
                )
            },
        ),
        Command::NewBulkArticle {
            id,
            price_cents,
            package_size,
            stock,
            name,
        } => employee(login).map_or_else(
            |deny| deny,
            |emp| {
                reply(
                    shop.new_article(emp, id, name, price_cents, Some(package_size), stock)
                        .map(|a| vec![article_line(shop, &a)]),
                )
            },
        ),
        Command::AdjustStock { id, delta } => employee(login).map_or_else(
            |deny| deny,
            |emp| {
                reply(
                    shop.adjust_stock(emp, id, delta)
                        .map(|level| vec![format!("{id} {level}")]),
                )
            },
        ),
        Command::RemoveArticle { id } => employee(login).map_or_else(
            |deny| deny,
            |_| reply(shop.remove_article(id).map(|_| Vec::new())),
        ),

        Command::NewCustomer {
            id,
            username,
            password,
            street,
            postcode,
            city,
            name,
        } => {
            // Open registration: anyone may create a customer account.
            let customer = Customer {
                id,
                username,
                password,
                name,
                street,
                postcode,
                city,
            };
            reply(shop.new_customer(customer).map(|c| vec![customer_line(&c)]))
        }
        Command::NewEmployee {
            id,
            username,
            password,
            name,
        } => employee(login).map_or_else(
            |deny| deny,
            |_| {
                let employee = Employee {
                    id,
                    username,
                    password,
                    name,
                };
                reply(shop.new_employee(employee).map(|e| vec![employee_line(&e)]))
            },
        ),
        Command::ListCustomers => employee(login).map_or_else(
            |deny| deny,
            |_| Reply::ok(shop.customers().iter().map(|c| customer_line(c)).collect()),
        ),
        Command::ListEmployees => employee(login).map_or_else(
            |deny| deny,
            |_| Reply::ok(shop.employees().iter().map(|e| employee_line(e)).collect()),
        ),
        Command::RemoveCustomer { id } => employee(login).map_or_else(
            |deny| deny,
            |_| reply(shop.remove_customer(id).map(|_| Vec::new())),
        ),
        Command::RemoveEmployee { id } => employee(login).map_or_else(
            |deny| deny,
            |_| reply(shop.remove_employee(id).map(|_| Vec::new())),
        ),

        Command::CartAdd { article, quantity } => customer(login).map_or_else(
            |deny| deny,
            |c| reply(shop.cart().add_or_increase(c, article, quantity).map(|_| cart_lines(shop, c))),
        ),
        Command::CartSet { article, quantity } => customer(login).map_or_else(
            |deny| deny,
            |c| reply(shop.cart().set_quantity(c, article, quantity).map(|_| cart_lines(shop, c))),
        ),
        Command::CartRemove { article } => customer(login).map_or_else(
            |deny| deny,
            |c| reply(shop.cart().remove(c, article).map(|_| cart_lines(shop, c))),
        ),
        Command::CartShow => customer(login)
            .map_or_else(|deny| deny, |c| Reply::ok(cart_lines(shop, c))),
        Command::CartEmpty => customer(login)
            .map_or_else(|deny| deny, |c| reply(shop.empty_cart(c).map(|_| Vec::new()))),
        Command::Checkout => customer(login).map_or_else(
            |deny| deny,
            |c| reply(shop.checkout(c).map(|purchase| invoice_lines(&purchase))),
        ),

        Command::History { article } => {
            if login.is_none() {
                return Reply::err("NOT_LOGGED_IN", "log in first");
            }
            reply(shop.article_history(article).map(|days| {
                days.iter()
                    .map(|d| format!("{} {}", d.date, d.stock_at_close))
                    .collect()
            }))
        }
        Command::Log => employee(login).map_or_else(|deny| deny, |_| reply(shop.log_lines())),
        Command::Save => employee(login)
            .map_or_else(|deny| deny, |_| reply(shop.persist_all().map(|_| Vec::new()))),
    }
}

fn reply(result: ShopResult<Vec<String>>) -> Reply {
    match result {
        Ok(lines) => Reply::ok(lines),
        Err(err) => Reply::err(err.code(), err.to_string()),
    }
}

fn employee(login: &Option<Login>) -> Result<EmployeeId, Reply> {
    match login {
        Some(Login::Employee(e)) => Ok(e.id),
        Some(Login::Customer(_)) => Err(Reply::err("FORBIDDEN", "employee account required")),
        None => Err(Reply::err("NOT_LOGGED_IN", "log in first")),
    }
}

fn customer(login: &Option<Login>) -> Result<CustomerId, Reply> {
    match login {
        Some(Login::Customer(c)) => Ok(c.id),
        Some(Login::Employee(_)) => Err(Reply::err("FORBIDDEN", "customer account required")),
        None => Err(Reply::err("NOT_LOGGED_IN", "log in first")),
    }
}

fn describe(login: &Login) -> String {
    match login {
        Login::Employee(e) => format!("EMPLOYEE {} {}", e.id, e.name),
        Login::Customer(c) => format!("CUSTOMER {} {}", c.id, c.name),
    }
}

/// `<id> <price-cents> <stock> <package-size|-> <name>`
fn article_line(shop: &Shop, article: &Article) -> String {
    let stock = shop.stock_level(article.id()).unwrap_or(0);
    let package = article
        .package_size()
        .map_or_else(|| "-".to_string(), |s| s.to_string());
    format!(
        "{} {} {} {} {}",
        article.id(),
        article.price_cents(),
        stock,
        package,
        article.name()
    )
}

fn article_list(shop: &Shop, articles: Vec<Arc<Article>>) -> Reply {
    Reply::ok(articles.iter().map(|a| article_line(shop, a)).collect())
}

fn customer_line(c: &Customer) -> String {
    format!(
        "{} {} {} {} {} {}",
        c.id, c.username, c.street, c.postcode, c.city, c.name
    )
}

fn employee_line(e: &Employee) -> String {
    format!("{} {} {}", e.id, e.username, e.name)
}

/// Cart contents plus a trailing total, `<id> <qty> <line-total> <name>`.
fn cart_lines(shop: &Shop, customer: CustomerId) -> Vec<String> {
    let lines = shop.cart().lines(customer);
    let total: u64 = lines.iter().map(CartLine::line_total_cents).sum();
    let mut out: Vec<String> = lines
        .iter()
        .map(|line| {
            format!(
                "{} {} {} {}",
                line.article.id(),
                line.quantity,
                line.line_total_cents(),
                line.article.name()
            )
        })
        .collect();
    out.push(format!("TOTAL {total}"));
    out
}

fn invoice_lines(purchase: &Purchase) -> Vec<String> {
    let mut out = vec![format!(
        "INVOICE {} {}",
        purchase.customer,
        purchase.at.format("%Y-%m-%d %H:%M:%S")
    )];
    for line in &purchase.lines {
        out.push(format!(
            "{} {} {} {}",
            line.article.id(),
            line.quantity,
            line.line_total_cents(),
            line.article.name()
        ));
    }
    out.push(format!("TOTAL {}", purchase.total_cents()));
    out
}
