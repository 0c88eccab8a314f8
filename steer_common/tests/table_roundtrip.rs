//! State-table serde round trip.
//!
//! The engine never parses files itself, but hosts are expected to keep
//! their configuration tables in TOML and deserialize them through the serde
//! derives on [`ControlState`]. This exercises that path end to end.

use steer_common::real;
use steer_common::table::{self, ControlState, Dimension};

#[derive(Debug, serde::Deserialize)]
struct TableFile {
    state: Vec<ControlState>,
}

const EXAMPLE: &str = r#"
[[state]]
id = 0
speedup = 0.0
cost = 0.1
idle_partner_id = 1

[[state]]
id = 1
speedup = 1.0
cost = 1.0

[[state]]
id = 2
speedup = 2.0
cost = 2.25
"#;

#[test]
fn example_table_parses_and_validates() {
    let parsed: TableFile = toml::from_str(EXAMPLE).expect("example table should parse");
    assert_eq!(parsed.state.len(), 3);
    assert!(table::validate(&parsed.state).is_ok());

    // Partner defaults to zero when omitted.
    assert_eq!(parsed.state[1].idle_partner_id, 0);
    assert!(parsed.state[0].is_idle());
    assert!(!parsed.state[2].is_idle());
}

#[test]
fn parsed_table_drives_range_derivation() {
    let parsed: TableFile = toml::from_str(EXAMPLE).expect("example table should parse");
    // The zero-speedup idle state pulls the lower bound down to the floor.
    let (lo, hi) = table::xup_bounds(&parsed.state, Dimension::Speedup);
    assert!((real::to_f64(lo) - steer_common::consts::MIN_XUP).abs() < 1e-6);
    assert!((real::to_f64(hi) - 2.0).abs() < 1e-9);

    let (lo, hi) = table::xup_bounds(&parsed.state, Dimension::Cost);
    assert!((real::to_f64(lo) - 0.1).abs() < 1e-6);
    assert!((real::to_f64(hi) - 2.25).abs() < 1e-9);
}

#[test]
fn invalid_partner_is_caught_after_parse() {
    let broken = r#"
[[state]]
id = 0
speedup = 0.5
cost = 0.5
idle_partner_id = 9

[[state]]
id = 1
speedup = 1.0
cost = 1.0
"#;
    let parsed: TableFile = toml::from_str(broken).expect("table should parse");
    assert!(matches!(
        table::validate(&parsed.state),
        Err(table::TableError::PartnerOutOfRange { id: 0, partner: 9 })
    ));
}
