use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use httpmock::prelude::*;
use jailbot_access::AuthorizedIdentitySet;
use jailbot_fail2ban::{
    CommandInvocation, CommandOutput, CommandRunError, CommandRunner, Fail2banClient,
    Fail2banClientConfig,
};
use jailbot_runtime::{run_bot_polling_loop, BotConfig, BotRuntimeConfig, CommandRouter};
use jailbot_telegram::{TelegramApiClient, TelegramApiConfig};
use serde_json::{json, Value};
use tokio::sync::Mutex as AsyncMutex;

const TOKEN: &str = "42:secret";
const OPERATOR_ID: i64 = 1111;

struct ScriptedRunner {
    outputs: AsyncMutex<VecDeque<CommandOutput>>,
    invocations: AsyncMutex<Vec<String>>,
}

impl ScriptedRunner {
    fn new(outputs: Vec<CommandOutput>) -> Self {
        Self {
            outputs: AsyncMutex::new(VecDeque::from(outputs)),
            invocations: AsyncMutex::new(Vec::new()),
        }
    }

    async fn invocations(&self) -> Vec<String> {
        self.invocations.lock().await.clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &CommandInvocation) -> Result<CommandOutput, CommandRunError> {
        self.invocations.lock().await.push(invocation.display());
        Ok(self
            .outputs
            .lock()
            .await
            .pop_front()
            .unwrap_or(CommandOutput {
                exit_code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
            }))
    }
}

fn text_update(update_id: i64, chat_id: i64, sender_id: i64, text: &str) -> Value {
    json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id * 10,
            "chat": { "id": chat_id },
            "from": { "id": sender_id, "is_bot": false, "first_name": "User" },
            "text": text
        }
    })
}

fn telegram_client(server: &MockServer) -> Arc<TelegramApiClient> {
    Arc::new(
        TelegramApiClient::new(TelegramApiConfig {
            api_base: server.base_url(),
            bot_token: TOKEN.to_string(),
            request_timeout_ms: 5_000,
            poll_timeout_seconds: 0,
            retry_max_attempts: 1,
            retry_base_delay_ms: 1,
        })
        .expect("telegram client"),
    )
}

fn router(runner: Arc<ScriptedRunner>) -> Arc<CommandRouter> {
    let config = BotConfig {
        authorized_users: AuthorizedIdentitySet::parse(&OPERATOR_ID.to_string()),
        default_ban_jail: Some("manual_ban".to_string()),
        ..BotConfig::default()
    };
    Arc::new(CommandRouter::new(
        Arc::new(config),
        Fail2banClient::new(Fail2banClientConfig::default(), runner),
    ))
}

fn send_mock<'a>(server: &'a MockServer, chat_id: i64, text: &str) -> httpmock::Mock<'a> {
    let text = text.to_string();
    server.mock(move |when, then| {
        when.method(POST)
            .path(format!("/bot{TOKEN}/sendMessage"))
            .json_body_includes(json!({ "chat_id": chat_id, "text": text }).to_string());
        then.status(200)
            .json_body(json!({ "ok": true, "result": { "message_id": 1 } }));
    })
}

#[tokio::test]
async fn integration_poll_cycle_bans_for_operator_and_rejects_stranger() {
    let server = MockServer::start();
    let updates = server.mock(|when, then| {
        when.method(GET).path(format!("/bot{TOKEN}/getUpdates"));
        then.status(200).json_body(json!({
            "ok": true,
            "result": [
                text_update(5, 100, OPERATOR_ID, "/ban 10.0.0.5 sshd"),
                text_update(6, 200, 9999, "/unban 10.0.0.5"),
                { "update_id": 7 }
            ]
        }));
    });
    let ban_progress = send_mock(&server, 100, "BAN : 10.0.0.5");
    let ban_outcome = send_mock(&server, 100, "=> IP banned");
    let rejected = server.mock(|when, then| {
        when.method(POST)
            .path(format!("/bot{TOKEN}/sendMessage"))
            .json_body_includes(json!({ "chat_id": 200, "parse_mode": "HTML" }).to_string())
            .body_includes("You are not authorized to use this bot");
        then.status(200)
            .json_body(json!({ "ok": true, "result": { "message_id": 2 } }));
    });

    let runner = Arc::new(ScriptedRunner::new(Vec::new()));
    let summary = run_bot_polling_loop(
        BotRuntimeConfig {
            poll_once: true,
            idle_backoff_ms: 1,
        },
        telegram_client(&server),
        router(runner.clone()),
        std::future::pending::<()>(),
    )
    .await
    .expect("poll cycle");

    updates.assert_calls(1);
    ban_progress.assert_calls(1);
    ban_outcome.assert_calls(1);
    rejected.assert_calls(1);
    assert_eq!(summary.updates_received, 3);
    assert_eq!(summary.messages_dispatched, 2);
    assert_eq!(summary.updates_skipped, 1);
    assert_eq!(summary.handler_failures, 0);
    assert_eq!(
        runner.invocations().await,
        vec!["sudo fail2ban-client set sshd banip 10.0.0.5"]
    );
}

#[tokio::test]
async fn integration_banned_on_legacy_fail2ban_lists_each_jail() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(format!("/bot{TOKEN}/getUpdates"));
        then.status(200).json_body(json!({
            "ok": true,
            "result": [text_update(1, 100, OPERATOR_ID, "/banned")]
        }));
    });
    let sshd = send_mock(&server, 100, "sshd banned IPs: 1.2.3.4");
    let apache = send_mock(&server, 100, "apache banned IPs: 5.6.7.8, 9.9.9.9");

    let jail_status = |banned: &str| CommandOutput {
        exit_code: Some(0),
        stdout: format!(
            "Status for the jail: x\n|- filter\n|  |- File list:\t/var/log/x\n\
             |  |- Currently failed:\t0\n|  `- Total failed:\t0\n`- action\n\
             \x20  |- Currently banned:\t1\n   |- Total banned:\t1\n\
             \x20  `- Banned IP list:\t{banned}\n"
        ),
        stderr: String::new(),
    };
    let stdout = |text: &str| CommandOutput {
        exit_code: Some(0),
        stdout: text.to_string(),
        stderr: String::new(),
    };
    let runner = Arc::new(ScriptedRunner::new(vec![
        stdout("Fail2Ban v0.10.2\n"),
        stdout("Status\n|- Number of jail:\t2\n`- Jail list:\tsshd, apache\n"),
        jail_status("1.2.3.4"),
        jail_status("5.6.7.8 9.9.9.9"),
    ]));

    run_bot_polling_loop(
        BotRuntimeConfig {
            poll_once: true,
            idle_backoff_ms: 1,
        },
        telegram_client(&server),
        router(runner.clone()),
        std::future::pending::<()>(),
    )
    .await
    .expect("poll cycle");

    sshd.assert_calls(1);
    apache.assert_calls(1);
    assert_eq!(runner.invocations().await.len(), 4);
}

#[tokio::test]
async fn regression_poll_once_surfaces_telegram_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(format!("/bot{TOKEN}/getUpdates"));
        then.status(401)
            .json_body(json!({ "ok": false, "description": "Unauthorized" }));
    });

    let runner = Arc::new(ScriptedRunner::new(Vec::new()));
    let error = run_bot_polling_loop(
        BotRuntimeConfig {
            poll_once: true,
            idle_backoff_ms: 1,
        },
        telegram_client(&server),
        router(runner.clone()),
        std::future::pending::<()>(),
    )
    .await
    .expect_err("unauthorized token");

    assert!(format!("{error:#}").contains("401"));
    assert!(runner.invocations().await.is_empty());
}
