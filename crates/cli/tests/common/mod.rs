#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};
use bitbucket_admin::Prompter;
use bitbucket_admin_api::{ClientConfig, Gateway};
use bitbucket_admin_output::Console;
use serde_json::{json, Value};
use wiremock::MockServer;

/// base64("user:app-pass")
pub const APP_PASSWORD: &str = "dXNlcjphcHAtcGFzcw==";
pub const BASIC_HEADER: &str = "Basic dXNlcjphcHAtcGFzcw==";
pub const BEARER_HEADER: &str = "Bearer test-token";

#[derive(Debug)]
pub enum Answer {
    Text(String),
    /// Pick the first item with this label.
    Pick(String),
    /// Pick by position, for lists with repeated labels.
    Index(usize),
}

pub fn text(value: &str) -> Answer {
    Answer::Text(value.to_string())
}

pub fn pick(label: &str) -> Answer {
    Answer::Pick(label.to_string())
}

/// Answers prompts from a fixed script and records what was asked.
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    pub asked: Vec<String>,
    pub offered: Vec<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
            offered: Vec::new(),
        }
    }

    /// A prompter for flows that must not ask anything.
    pub fn silent() -> Self {
        Self::new(Vec::<Answer>::new())
    }

    pub fn exhausted(&self) -> bool {
        self.answers.is_empty()
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&mut self, message: &str) -> Result<String> {
        self.asked.push(message.to_string());
        match self.answers.pop_front() {
            Some(Answer::Text(value)) => Ok(value),
            other => bail!("expected a text answer for '{message}', script had {other:?}"),
        }
    }

    fn select(&mut self, message: &str, items: &[String]) -> Result<usize> {
        self.asked.push(message.to_string());
        self.offered.push(items.to_vec());
        match self.answers.pop_front() {
            Some(Answer::Pick(label)) => items
                .iter()
                .position(|item| *item == label)
                .ok_or_else(|| anyhow!("'{label}' not offered for '{message}': {items:?}")),
            Some(Answer::Index(index)) => Ok(index),
            other => bail!("expected a selection for '{message}', script had {other:?}"),
        }
    }
}

#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    pub fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

/// Uncolored console plus a handle on everything it prints.
pub fn console() -> (Console, Captured) {
    let captured = Captured::default();
    (Console::new(Box::new(captured.clone()), false), captured)
}

pub fn gateway(server: &MockServer) -> Gateway {
    Gateway::connect(&ClientConfig {
        base_url: server.uri(),
        access_token: "test-token".to_string(),
        app_password: APP_PASSWORD.to_string(),
        timeout: None,
    })
    .unwrap()
}

/// Gateway that reports failed reads and deletes on `console`.
pub fn reporting_gateway(server: &MockServer, console: &Console) -> Gateway {
    let reporter = console.clone();
    gateway(server).with_failure_reporter(Arc::new(move |message: &str| {
        reporter.warn(message).unwrap()
    }))
}

pub fn page(values: Value) -> Value {
    json!({ "values": values, "page": 1, "pagelen": 10 })
}

pub fn member(name: &str, uuid: &str) -> Value {
    json!({ "display_name": name, "uuid": uuid, "type": "user" })
}

pub fn membership(name: &str, uuid: &str) -> Value {
    json!({ "user": member(name, uuid), "permission": "write" })
}
