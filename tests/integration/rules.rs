use crate::*;

use std::sync::Arc;

use anyhow::Result;
use penstock_core::clock::ManualClock;
use penstock_core::PenstockConfig;
use penstock_flow::RuleTable;

#[tokio::test]
async fn config_text_builds_a_working_rule_table() -> Result<()> {
    let text = r#"
        [shaping]
        enabled = true

        [[rules]]
        resource = "orders"
        rate_per_second = 10.0

        [[rules]]
        resource = "search"
        rate_per_second = 0.0
        max_queueing_ms = 100
    "#;
    let config: PenstockConfig = toml::from_str(text)?;
    assert_eq!(config.rule_for("orders").unwrap().max_queueing_ms, 500);

    let clock = Arc::new(ManualClock::starting_at(T0));
    let table = RuleTable::with_clock(clock);
    table.apply_config(&config);
    assert_eq!(table.len(), 2);

    // Paced resource: idle admit, then a 2s-cost burst is shed.
    assert!(table.try_admit("orders", 5, false).await);
    assert!(!table.try_admit("orders", 20, false).await);

    // Zero-rate rule: permanent reject mode.
    assert!(!table.try_admit("search", 1, false).await);

    // No rule: not flow controlled.
    assert!(table.try_admit("telemetry", 1, false).await);

    Ok(())
}

#[tokio::test]
async fn config_loaded_from_disk_honors_the_master_switch() -> Result<()> {
    let tmp = std::env::temp_dir().join(format!("penstock-rules-test-{}", std::process::id()));
    std::fs::create_dir_all(&tmp)?;
    let path = tmp.join("config.toml");
    std::fs::write(
        &path,
        r#"
            [shaping]
            enabled = false

            [[rules]]
            resource = "orders"
            rate_per_second = 0.0
        "#,
    )?;

    unsafe {
        std::env::set_var("PENSTOCK_CONFIG", path.to_str().unwrap());
    }
    let config = PenstockConfig::load()?;
    unsafe {
        std::env::remove_var("PENSTOCK_CONFIG");
    }
    let _ = std::fs::remove_dir_all(&tmp);

    let clock = Arc::new(ManualClock::starting_at(T0));
    let table = RuleTable::with_clock(clock);
    table.apply_config(&config);

    // The orders rule would reject everything, but shaping is off.
    assert!(table.try_admit("orders", 1, false).await);

    Ok(())
}
