//! End-to-end tests against a real listener on an ephemeral port.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

struct TestServer {
    addr: SocketAddr,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Serve a fresh shop over `data_dir` on an ephemeral port.
    async fn spawn(data_dir: &Path) -> Self {
        let shop = shopd_server::Shop::open(data_dir).expect("failed to open shop");
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.expect("accept failed");
                let shop = Arc::clone(&shop);
                tokio::spawn(async move {
                    let _ = shopd_server::session::run(shop, stream).await;
                });
            }
        });

        Self { addr, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    write: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect failed");
        let (read, write) = stream.into_split();
        let mut client = Self {
            lines: BufReader::new(read).lines(),
            write,
        };
        let greeting = client.read_reply().await.expect("greeting");
        assert!(greeting[0].starts_with("shopd "));
        client
    }

    async fn send(&mut self, line: &str) -> Result<Vec<String>, String> {
        self.write
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("write failed");
        self.read_reply().await
    }

    /// `Ok(payload lines)` for an `OK <n>` frame, `Err(whole line)` for `ERR`.
    async fn read_reply(&mut self) -> Result<Vec<String>, String> {
        let head = self
            .lines
            .next_line()
            .await
            .expect("read failed")
            .expect("connection closed");
        if let Some(count) = head.strip_prefix("OK ") {
            let count: usize = count.parse().expect("bad OK frame");
            let mut payload = Vec::with_capacity(count);
            for _ in 0..count {
                payload.push(
                    self.lines
                        .next_line()
                        .await
                        .expect("read failed")
                        .expect("connection closed"),
                );
            }
            Ok(payload)
        } else {
            Err(head)
        }
    }

    async fn ok(&mut self, line: &str) -> Vec<String> {
        self.send(line)
            .await
            .unwrap_or_else(|err| panic!("{line:?} failed: {err}"))
    }

    async fn err_code(&mut self, line: &str) -> String {
        let reply = self.send(line).await.expect_err("expected an ERR reply");
        let mut parts = reply.split(' ');
        assert_eq!(parts.next(), Some("ERR"));
        parts.next().expect("ERR frame without code").to_string()
    }
}

#[tokio::test]
async fn stocking_browsing_and_buying() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::spawn(dir.path()).await;

    let mut admin = Client::connect(server.addr).await;
    let who = admin.ok("LOGIN admin admin").await;
    assert!(who[0].starts_with("EMPLOYEE 1 "));
    admin.ok("NEW_ARTICLE 10 1299 14 Claw hammer").await;
    admin.ok("NEW_BULK_ARTICLE 11 899 6 48 Bottled water").await;
    admin
        .ok("NEW_CUSTOMER 2 kim secret Sielwall 28203 Bremen Kim de Vries")
        .await;

    let mut kim = Client::connect(server.addr).await;
    kim.ok("LOGIN kim secret").await;

    // Browsing is open and sorted by id by default.
    let listing = kim.ok("LIST_ARTICLES").await;
    assert_eq!(listing, vec![
        "10 1299 14 - Claw hammer".to_string(),
        "11 899 48 6 Bottled water".to_string(),
    ]);
    let found = kim.ok("SEARCH water").await;
    assert_eq!(found.len(), 1);

    let cart = kim.ok("CART_ADD 10 3").await;
    assert_eq!(cart, vec!["10 3 3897 Claw hammer".to_string(), "TOTAL 3897".to_string()]);
    kim.ok("CART_ADD 11 6").await;
    let cart = kim.ok("CART_SHOW").await;
    assert_eq!(cart.last().unwrap(), "TOTAL 9291");

    let invoice = kim.ok("CHECKOUT").await;
    assert!(invoice[0].starts_with("INVOICE 2 "));
    assert_eq!(invoice.last().unwrap(), "TOTAL 9291");

    // The sale came out of the visible stock.
    let listing = admin.ok("LIST_ARTICLES").await;
    assert_eq!(listing[0], "10 1299 11 - Claw hammer");
    assert_eq!(listing[1], "11 899 42 6 Bottled water");

    // And left two sale lines in the movement log.
    let log = admin.ok("LOG").await;
    assert_eq!(log.iter().filter(|l| l.ends_with("verkauft")).count(), 2);
}

#[tokio::test]
async fn authorization_and_error_codes() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::spawn(dir.path()).await;
    let mut client = Client::connect(server.addr).await;

    assert_eq!(client.err_code("CART_ADD 10 1").await, "NOT_LOGGED_IN");
    assert_eq!(client.err_code("LOGIN admin wrong").await, "BAD_CREDENTIALS");

    client.ok("LOGIN admin admin").await;
    assert_eq!(client.err_code("CART_ADD 10 1").await, "FORBIDDEN");
    assert_eq!(client.err_code("ADJUST_STOCK 99 5").await, "NOT_FOUND");
    client.ok("NEW_ARTICLE 10 1299 2 Hammer").await;
    assert_eq!(client.err_code("NEW_ARTICLE 10 50 0 Dup").await, "EXISTS");
    assert_eq!(
        client.err_code("NEW_BULK_ARTICLE 12 100 0 0 Water").await,
        "BAD_PACKAGE_SIZE"
    );
    assert_eq!(
        client.err_code("NEW_ARTICLE 13 100 -5 Scrap").await,
        "BAD_QUANTITY"
    );
    client
        .ok("NEW_CUSTOMER 2 kim secret Sielwall 28203 Bremen Kim")
        .await;
    assert_eq!(
        client
            .err_code("NEW_CUSTOMER 3 kim other Wall 28195 Bremen Other Kim")
            .await,
        "USERNAME_TAKEN"
    );
    assert_eq!(client.err_code("NEW_ARTICLE abc").await, "PARSE");
    assert_eq!(client.err_code("FROBNICATE").await, "PARSE");

    let mut kim = Client::connect(server.addr).await;
    kim.ok("LOGIN kim secret").await;
    assert_eq!(kim.err_code("CART_ADD 10 -3").await, "BAD_QUANTITY");
    assert_eq!(kim.err_code("CART_ADD 10 0").await, "BAD_QUANTITY");
    let listing = kim.ok("LIST_ARTICLES").await;
    assert_eq!(
        listing[0], "10 1299 2 - Hammer",
        "rejected quantities leave stock alone"
    );
    assert_eq!(kim.err_code("CART_ADD 10 5").await, "INSUFFICIENT_STOCK");
    assert_eq!(kim.err_code("CART_REMOVE 10").await, "NOT_IN_CART");
    assert_eq!(kim.err_code("CHECKOUT").await, "CART_EMPTY");
    assert_eq!(kim.err_code("LOG").await, "FORBIDDEN");
}

#[tokio::test]
async fn bulk_articles_enforce_the_package_rule() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::spawn(dir.path()).await;
    let mut admin = Client::connect(server.addr).await;
    admin.ok("LOGIN admin admin").await;
    admin.ok("NEW_BULK_ARTICLE 11 899 6 48 Bottled water").await;
    admin
        .ok("NEW_CUSTOMER 2 kim secret Sielwall 28203 Bremen Kim")
        .await;

    let mut kim = Client::connect(server.addr).await;
    kim.ok("LOGIN kim secret").await;
    assert_eq!(kim.err_code("CART_ADD 11 4").await, "NOT_PACKAGE_MULTIPLE");
    kim.ok("CART_ADD 11 12").await;
}

#[tokio::test]
async fn history_covers_thirty_closed_days() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::spawn(dir.path()).await;
    let mut admin = Client::connect(server.addr).await;
    admin.ok("LOGIN admin admin").await;
    admin.ok("NEW_ARTICLE 10 1299 5 Hammer").await;

    // Everything happened today, so every closed day reads zero.
    let days = admin.ok("HISTORY 10").await;
    assert_eq!(days.len(), 30);
    assert!(days.iter().all(|d| d.ends_with(" 0")));

    // Same answer once the queued movement hits the log file.
    admin.ok("LOG").await;
    let days = admin.ok("HISTORY 10").await;
    assert_eq!(days.len(), 30);
    assert!(days.iter().all(|d| d.ends_with(" 0")));
}

#[tokio::test]
async fn save_persists_across_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let first = TestServer::spawn(dir.path()).await;
        let mut admin = Client::connect(first.addr).await;
        admin.ok("LOGIN admin admin").await;
        admin.ok("NEW_ARTICLE 10 1299 14 Hammer").await;
        admin
            .ok("NEW_CUSTOMER 2 kim secret Sielwall 28203 Bremen Kim")
            .await;
        admin.ok("SAVE").await;
    }

    let second = TestServer::spawn(dir.path()).await;
    let mut kim = Client::connect(second.addr).await;
    kim.ok("LOGIN kim secret").await;
    let listing = kim.ok("LIST_ARTICLES").await;
    assert_eq!(listing, vec!["10 1299 14 - Hammer".to_string()]);
}
