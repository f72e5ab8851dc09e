use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;

const TOKEN: &str = "123:abc";

fn jailbot() -> Command {
    let mut command = Command::new(assert_cmd::cargo::cargo_bin!("jailbot"));
    for (key, _) in std::env::vars() {
        if key.starts_with("JAILBOT_") {
            command.env_remove(key);
        }
    }
    command.env("RUST_LOG", "warn");
    command
}

#[test]
fn unit_help_lists_core_flags() {
    jailbot()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--telegram-bot-token"))
        .stdout(predicate::str::contains("--authorized-users"))
        .stdout(predicate::str::contains("--command-surface"))
        .stdout(predicate::str::contains("--success-detection"));
}

#[test]
fn regression_missing_token_fails_fast() {
    jailbot()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--telegram-bot-token"));
}

#[test]
fn regression_invalid_default_jail_is_rejected_at_startup() {
    jailbot()
        .args([
            "--telegram-bot-token",
            TOKEN,
            "--default-ban-jail",
            "bad jail",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --default-ban-jail"));
}

#[cfg(unix)]
#[test]
fn integration_poll_once_runs_unban_through_fail2ban_client_and_replies() {
    let server = MockServer::start();
    let updates = server.mock(|when, then| {
        when.method(GET)
            .path(format!("/bot{TOKEN}/getUpdates"))
            .query_param("timeout", "0");
        then.status(200).json_body(json!({
            "ok": true,
            "result": [{
                "update_id": 10,
                "message": {
                    "message_id": 1,
                    "chat": { "id": 42 },
                    "from": { "id": 1111, "is_bot": false, "first_name": "Ops" },
                    "text": "/unban 10.0.0.5"
                }
            }]
        }));
    });
    let progress = server.mock(|when, then| {
        when.method(POST)
            .path(format!("/bot{TOKEN}/sendMessage"))
            .json_body_includes(json!({ "chat_id": 42, "text": "Unbanning : 10.0.0.5" }).to_string());
        then.status(200)
            .json_body(json!({ "ok": true, "result": { "message_id": 100 } }));
    });
    let outcome = server.mock(|when, then| {
        when.method(POST)
            .path(format!("/bot{TOKEN}/sendMessage"))
            .json_body_includes(json!({ "chat_id": 42, "text": "=> IP unbanned" }).to_string());
        then.status(200)
            .json_body(json!({ "ok": true, "result": { "message_id": 101 } }));
    });

    jailbot()
        .args([
            "--telegram-bot-token",
            TOKEN,
            "--telegram-api-base",
            server.base_url().as_str(),
            "--telegram-poll-timeout-seconds",
            "0",
            "--authorized-users",
            "1111",
            "--no-sudo",
            "--fail2ban-client",
            "true",
            "--poll-once",
        ])
        .assert()
        .success();

    updates.assert_calls(1);
    progress.assert_calls(1);
    outcome.assert_calls(1);
}
