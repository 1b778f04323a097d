//! Process-wide settings accessor
//!
//! Lives in its own test binary so the global cell starts empty.
//!
//! # Running the tests
//! ```bash
//! cargo test --test settings_accessor
//! ```

use std::fs;

use tempfile::tempdir;
use traderai::config::{init_settings_in, settings, Environment, Market};

const DEFAULT_YAML: &str = r#"
app:
  name: accessor-test
data:
  providers:
    - name: polygon
      endpoint: https://api.polygon.io
trading:
  markets: [stocks]
  max_position_size: 0.2
  risk:
    max_drawdown: 0.25
    var_limit: 0.05
"#;

#[test]
fn test_accessor_initializes_once_and_caches() {
    // A failed initialization caches nothing
    let broken = tempdir().unwrap();
    fs::write(broken.path().join("default.yaml"), "app: [unclosed\n").unwrap();
    assert!(init_settings_in(broken.path(), Environment::Development).is_err());
    assert!(settings().is_none());

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("default.yaml"), DEFAULT_YAML).unwrap();

    let first = init_settings_in(dir.path(), Environment::Development).unwrap();
    assert_eq!(first.app.name, "accessor-test");
    assert_eq!(first.trading.markets, vec![Market::Stocks]);

    // Files change and a different environment is requested; the cached value wins
    fs::write(
        dir.path().join("default.yaml"),
        DEFAULT_YAML.replace("accessor-test", "changed"),
    )
    .unwrap();
    fs::write(dir.path().join("production.yaml"), "trading:\n  markets: [forex]\n").unwrap();

    let second = init_settings_in(dir.path(), Environment::Production).unwrap();
    assert!(std::ptr::eq(first, second));
    assert_eq!(second.app.name, "accessor-test");
    assert_eq!(second.trading.markets, vec![Market::Stocks]);

    let cached = settings().expect("settings should be cached");
    assert!(std::ptr::eq(first, cached));
}
