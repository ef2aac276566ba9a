use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_cli_replay_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let summary = dir.path().join("summary.csv");

    let mut cmd = Command::new(cargo_bin!("payrecon"));
    cmd.arg("replay")
        .arg("tests/fixtures/deliveries.jsonl")
        .arg("--orders")
        .arg("tests/fixtures/orders.json")
        .arg("--config")
        .arg("tests/fixtures/settings.json")
        .arg("--summary")
        .arg(&summary);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            r#"{"success":true,"status":"complete","order_id":1,"type":"webhook"}"#,
        ))
        .stdout(predicate::str::contains(
            r#"{"success":true,"status":"complete","order_id":1,"type":"success"}"#,
        ))
        .stdout(predicate::str::contains(
            r#"{"redirect":"https://shop.example/checkout/process?order_id=gw-2"}"#,
        ))
        .stdout(predicate::str::contains(
            r#"{"success":true,"status":"processing","order_id":2,"type":"webhook"}"#,
        ))
        .stdout(predicate::str::contains(
            r#"{"success":false,"status":"cancelled","order_id":3,"type":"webhook""#,
        ))
        .stdout(predicate::str::contains(
            r#"{"error":"could not fetch redirect url"}"#,
        ))
        .stderr(predicate::str::contains("Error processing delivery: Order not found"))
        .stderr(predicate::str::contains("Error reading delivery"));

    let summary = std::fs::read_to_string(summary)?;
    assert!(summary.starts_with(
        "entity_id,increment_id,state,status,gateway_transaction_id,amount_paid,invoiced,email_sent"
    ));
    assert!(summary.contains("1,000000001,processing,processing,gw-1,100.5,true,true"));
    assert!(summary.contains("2,000000002,new,pending_payment,gw-2,0,false,true"));
    assert!(summary.contains("3,000000003,canceled,canceled,gw-3,0,false,false"));
    assert!(summary.contains("4,000000004,new,pending,,0,false,false"));

    Ok(())
}

#[test]
fn test_cli_duplicate_webhook_captures_once() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let summary = dir.path().join("summary.csv");

    let mut cmd = Command::new(cargo_bin!("payrecon"));
    cmd.arg("replay")
        .arg("tests/fixtures/deliveries.jsonl")
        .arg("--orders")
        .arg("tests/fixtures/orders.json")
        .arg("--summary")
        .arg(&summary);
    cmd.assert().success();

    // Two completed webhooks for 100.50 must not book 201.00.
    let summary = std::fs::read_to_string(summary)?;
    assert!(summary.contains(",gw-1,100.5,"));
    assert!(!summary.contains("201"));

    Ok(())
}

#[test]
fn test_cli_profile() {
    let mut cmd = Command::new(cargo_bin!("payrecon"));
    cmd.arg("profile")
        .arg("4")
        .arg("--orders")
        .arg("tests/fixtures/orders.json")
        .arg("--user-agent")
        .arg("Mozilla/5.0");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            r#""address": "Damrak 1 1012 LG Amsterdam""#,
        ))
        .stdout(predicate::str::contains(r#""housenumber": "1""#))
        .stdout(predicate::str::contains(r#""gender": "female""#))
        .stdout(predicate::str::contains(r#""birthdate": "1985-03-24""#))
        .stdout(predicate::str::contains(r#""locale": "nl_NL""#))
        .stdout(predicate::str::contains(r#""forwarded_ip": "198.51.100.20""#));
}

#[test]
fn test_cli_profile_unknown_order() {
    let mut cmd = Command::new(cargo_bin!("payrecon"));
    cmd.arg("profile")
        .arg("99")
        .arg("--orders")
        .arg("tests/fixtures/orders.json");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Order not found"));
}
