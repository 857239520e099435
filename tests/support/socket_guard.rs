//! Loopback availability for tests backed by a wiremock server.
//!
//! Sandboxed runners sometimes forbid binding localhost. Those tests are
//! skipped there, unless `BATCHFETCH_REQUIRE_SOCKET_TESTS` asks for a hard
//! failure instead.

use std::net::TcpListener;

use wiremock::MockServer;

const REQUIRE_ENV: &str = "BATCHFETCH_REQUIRE_SOCKET_TESTS";

/// What a test does when no loopback socket can be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    Skip,
    Fail,
}

impl Unavailable {
    pub fn from_env() -> Self {
        Self::from_setting(&std::env::var(REQUIRE_ENV).unwrap_or_default())
    }

    fn from_setting(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Self::Fail,
            _ => Self::Skip,
        }
    }
}

fn loopback_bindable() -> bool {
    TcpListener::bind(("127.0.0.1", 0)).is_ok()
}

/// Starts a mock server, or returns `None` when the test at `caller` must be
/// skipped.
///
/// # Panics
///
/// Panics instead of skipping when sockets are required by the environment.
pub async fn mock_server_for(caller: &str) -> Option<MockServer> {
    if loopback_bindable() {
        return Some(MockServer::start().await);
    }

    match Unavailable::from_env() {
        Unavailable::Fail => {
            panic!("{caller}: cannot bind a localhost socket and {REQUIRE_ENV} is set")
        }
        Unavailable::Skip => {
            eprintln!("{caller}: cannot bind a localhost socket, skipping (set {REQUIRE_ENV}=1 to fail)");
            None
        }
    }
}

#[test]
fn test_unavailable_setting_values() {
    assert_eq!(Unavailable::from_setting(""), Unavailable::Skip);
    assert_eq!(Unavailable::from_setting("0"), Unavailable::Skip);
    assert_eq!(Unavailable::from_setting(" TRUE "), Unavailable::Fail);
    assert_eq!(Unavailable::from_setting("1"), Unavailable::Fail);
    assert_eq!(Unavailable::from_setting("yes"), Unavailable::Fail);
}
