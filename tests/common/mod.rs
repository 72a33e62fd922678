#![allow(dead_code)]

pub mod history;

use bit_repo::Signature;
use fake::Fake;
use fake::faker::internet::en::FreeEmail;
use fake::faker::name::en::Name;
use history::History;
use rstest::fixture;
use tracing_subscriber::EnvFilter;

/// Route library logs to the test output, filtered by `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Identity with a generated name and email, signing at `time`
pub fn random_signature(time: i64) -> Signature {
    let name = Name().fake::<String>().replace(['<', '>'], "");
    let email = FreeEmail().fake::<String>();

    Signature::new(name, email, time, 0).expect("generated identity is valid")
}

/// ```text
/// a -- b -- c -- d   (main, HEAD)
/// ```
#[fixture]
pub fn linear_history() -> History {
    init_tracing();
    let mut history = History::in_memory();
    history.commit("a", 1_000, "");
    history.commit("b", 2_000, "a");
    history.commit("c", 3_000, "b");
    history.commit("d", 4_000, "c");
    history.branch("main", "d");
    history.checkout("main");

    history
}

/// ```text
///        x ------ y        (feature)
///       /          \
/// a -- b ---- c --- m      (main, HEAD)
/// ```
///
/// Commit times: a 10, b 20, x 25, c 30, y 35, m 40. The merge `m` has `c`
/// as first parent.
#[fixture]
pub fn merge_history() -> History {
    init_tracing();
    let mut history = History::in_memory();
    history.commit("a", 10, "");
    history.commit("b", 20, "a");
    history.commit("x", 25, "b");
    history.commit("c", 30, "b");
    history.commit("y", 35, "x");
    history.commit("m", 40, "c y");
    history.branch("main", "m");
    history.branch("feature", "y");
    history.checkout("main");

    history
}

/// ```text
///      h1 -- h2 -- h3     (topic)
///     /               \
/// base ------- p ----- m  (main, HEAD)
/// ```
///
/// Every commit shares the same time. The merge `m` has `p` as first parent.
#[fixture]
pub fn same_second_history() -> History {
    init_tracing();
    let mut history = History::in_memory();
    history.commit("base", 5, "");
    history.commit("h1", 5, "base");
    history.commit("h2", 5, "h1");
    history.commit("h3", 5, "h2");
    history.commit("p", 5, "base");
    history.commit("m", 5, "p h3");
    history.branch("main", "m");
    history.branch("topic", "h3");
    history.checkout("main");

    history
}
