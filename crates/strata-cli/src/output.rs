//! How command results reach the terminal.
//!
//! Every command builds one serializable payload and hands it to [`render`] or
//! [`render_mode`] together with its human renderers. JSON is always the
//! payload itself, pretty-printed, so scripts see the same fields regardless
//! of which command produced them.
//!
//! The mode is picked by the first source that names a known mode:
//! `--format`, the hidden `--json` flag, the `FORMAT` environment variable,
//! `output` in the user config. Otherwise a terminal gets
//! [`OutputMode::Pretty`] and a pipe gets [`OutputMode::Text`].

use clap::ValueEnum;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

use strata_core::config::normalize_output_mode;

const RULE_WIDTH: usize = 72;
const KEY_WIDTH: usize = 14;

/// Heading line followed by a dashed rule.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    writeln!(w, "{}", "-".repeat(RULE_WIDTH))
}

/// `key:` padded to a fixed column, then the value.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    let label = format!("{key}:");
    writeln!(w, "{label:<width$} {}", value.as_ref(), width = KEY_WIDTH)
}

/// Output format for command results and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Sections and aligned columns for people.
    Pretty,
    /// Terse line-oriented text, stable enough to grep.
    Text,
    /// The payload as pretty-printed JSON.
    Json,
}

impl OutputMode {
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    fn from_name(raw: &str) -> Option<Self> {
        match normalize_output_mode(raw)? {
            "pretty" => Some(Self::Pretty),
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// First source naming a known mode wins; unknown names are skipped.
fn pick_output_mode(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    format_env: Option<&str>,
    user_output: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    let fallback = if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Text
    };

    format_flag
        .or_else(|| json_flag.then_some(OutputMode::Json))
        .or_else(|| format_env.and_then(OutputMode::from_name))
        .or_else(|| user_output.and_then(OutputMode::from_name))
        .unwrap_or(fallback)
}

/// Resolve the output mode for this process.
pub fn resolve_output_mode(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    user_output: Option<&str>,
) -> OutputMode {
    let format_env = std::env::var("FORMAT").ok();
    pick_output_mode(
        format_flag,
        json_flag,
        format_env.as_deref(),
        user_output,
        io::stdout().is_terminal(),
    )
}

fn write_json<T: Serialize + ?Sized>(w: &mut dyn Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *w, value)?;
    writeln!(w)?;
    Ok(())
}

fn emit<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human: impl FnOnce(&T, OutputMode, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    if mode.is_json() {
        write_json(&mut out, value)?;
    } else {
        human(value, mode, &mut out)?;
    }
    out.flush()?;
    Ok(())
}

/// Print `value` with separate renderers for text and pretty modes.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    emit(mode, value, |value, mode, w| match mode {
        OutputMode::Pretty => pretty_fn(value, w),
        OutputMode::Text | OutputMode::Json => text_fn(value, w),
    })
}

/// Print `value` with one renderer shared by text and pretty modes.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    emit(mode, value, |value, _, w| human_fn(value, w))
}

/// Failure as shown to the user: message, optional fix, optional `E####` code.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }
}

impl From<&strata_core::Error> for CliError {
    fn from(err: &strata_core::Error) -> Self {
        let code = err.code();
        Self {
            message: err.to_string(),
            suggestion: code.hint().map(str::to_string),
            error_code: Some(code.code().to_string()),
        }
    }
}

impl From<&anyhow::Error> for CliError {
    /// Prefer the structured library error anywhere in the chain.
    fn from(err: &anyhow::Error) -> Self {
        err.chain()
            .find_map(|cause| cause.downcast_ref::<strata_core::Error>())
            .map_or_else(|| Self::new(format!("{err:#}")), Self::from)
    }
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: &'a CliError,
}

/// Print `error` on stderr; JSON mode wraps it as `{"error": {...}}`.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let mut out = io::stderr().lock();
    if mode.is_json() {
        return write_json(&mut out, &ErrorEnvelope { error });
    }

    writeln!(out, "error: {}", error.message)?;
    if let Some(suggestion) = &error.suggestion {
        writeln!(out, "  suggestion: {suggestion}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    type Case = (
        Option<OutputMode>,
        bool,
        Option<&'static str>,
        Option<&'static str>,
        bool,
        OutputMode,
    );

    #[test]
    fn output_mode_precedence() {
        use OutputMode::{Json, Pretty, Text};

        // (flag, --json, FORMAT, user config, tty) -> expected
        let cases: &[Case] = &[
            (Some(Text), true, Some("pretty"), Some("json"), true, Text),
            (None, true, Some("text"), Some("pretty"), true, Json),
            (None, false, Some("json"), Some("text"), true, Json),
            (None, false, None, Some("human"), false, Pretty),
            (None, false, Some("yaml"), Some("xml"), false, Text),
            (None, false, None, None, true, Pretty),
            (None, false, None, None, false, Text),
        ];

        for &(flag, json, env, user, tty, expected) in cases {
            assert_eq!(
                pick_output_mode(flag, json, env, user, tty),
                expected,
                "flag={flag:?} json={json} env={env:?} user={user:?} tty={tty}"
            );
        }
    }

    #[test]
    fn core_error_keeps_code_and_hint() {
        let err = strata_core::Error::Io {
            path: PathBuf::from("graph.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        let cli = CliError::from(&err);
        assert_eq!(cli.error_code.as_deref(), Some("E1001"));
        assert!(cli.suggestion.is_some());
        assert!(cli.message.contains("graph.json"));
    }

    #[test]
    fn core_error_is_found_under_context() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = anyhow::Error::new(strata_core::Error::from(source)).context("loading input");
        assert_eq!(CliError::from(&err).error_code.as_deref(), Some("E1003"));
    }

    #[test]
    fn other_errors_have_no_code() {
        let cli = CliError::from(&anyhow::anyhow!("something else"));
        assert_eq!(cli.message, "something else");
        assert!(cli.error_code.is_none());
    }

    #[test]
    fn error_envelope_omits_empty_fields() {
        let cli = CliError::new("boom");
        let value = serde_json::to_value(ErrorEnvelope { error: &cli }).expect("json");
        assert_eq!(value, serde_json::json!({"error": {"message": "boom"}}));
    }

    #[test]
    fn kv_values_start_in_one_column() {
        let mut buf = Vec::new();
        pretty_kv(&mut buf, "nodes", "3").expect("write");
        pretty_kv(&mut buf, "content hash", "blake3:00").expect("write");
        assert_eq!(
            String::from_utf8(buf).expect("utf8"),
            "nodes:         3\ncontent hash:  blake3:00\n"
        );
    }

    #[test]
    fn section_is_heading_over_rule() {
        let mut buf = Vec::new();
        pretty_section(&mut buf, "Levels").expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Levels"));
        assert_eq!(lines.next().map(str::len), Some(RULE_WIDTH));
    }
}
