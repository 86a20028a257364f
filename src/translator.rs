//! The boundary to the inference model.
//!
//! A [`Translator`] turns one decompiled function body into source. The
//! transform driver calls it once per body, in file order.

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

pub trait Translator {
    fn translate(&mut self, body: &str) -> Result<String>;
}

impl<F> Translator for F
where
    F: FnMut(&str) -> Result<String>,
{
    fn translate(&mut self, body: &str) -> Result<String> {
        self(body)
    }
}

/// Returns every body unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Translator for Passthrough {
    fn translate(&mut self, body: &str) -> Result<String> {
        Ok(body.to_string())
    }
}

/// Runs a program per body: body on stdin, translation on stdout
#[derive(Debug, Clone)]
pub struct CommandTranslator {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandTranslator {
    pub fn new(program: &str, args: Vec<String>) -> Result<Self> {
        let program = which::which(program)
            .with_context(|| format!("Translator program '{}' not found in PATH", program))?;
        Ok(Self { program, args })
    }
}

impl Translator for CommandTranslator {
    fn translate(&mut self, body: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("Failed to start {}", self.program.display()))?;

        // Feed stdin from a thread so a chatty child can't fill stdout and block us
        let mut stdin = child.stdin.take().context("Translator stdin not captured")?;
        let input = body.to_string();
        let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child
            .wait_with_output()
            .with_context(|| format!("Failed to wait for {}", self.program.display()))?;
        match writer.join() {
            Ok(result) => result.with_context(|| format!("Failed to write to {}", self.program.display()))?,
            Err(_) => bail!("Translator input thread panicked"),
        }

        if !output.status.success() {
            bail!("{} exited with {}", self.program.display(), output.status);
        }
        String::from_utf8(output.stdout)
            .with_context(|| format!("{} wrote invalid UTF-8", self.program.display()))
    }
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    output: String,
}

/// POSTs `{"input": body}` to an inference server, expects `{"output": text}`
pub struct HttpTranslator {
    endpoint: String,
    http: HttpClient,
}

impl HttpTranslator {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("http://{}", endpoint)
        };

        let http = HttpClient::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { endpoint, http })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Translator for HttpTranslator {
    fn translate(&mut self, body: &str) -> Result<String> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&TranslateRequest { input: body })
            .send()
            .with_context(|| format!("Failed to reach translator at {}", self.endpoint))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().unwrap_or_default();
            bail!("Translator at {} failed ({}): {}", self.endpoint, status, text);
        }

        Ok(response
            .json::<TranslateResponse>()
            .context("Failed to parse translator response")?
            .output)
    }
}
