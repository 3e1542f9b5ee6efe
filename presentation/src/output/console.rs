//! Console output for the startup banner and `--show-config`

use bridge_domain::{BackendKind, MARKER};
use colored::Colorize;

/// What the bridge is about to serve, shown once at startup.
#[derive(Debug, Clone)]
pub struct StartupInfo {
    /// Bound listen address
    pub listen: String,
    pub backend_kind: BackendKind,
    /// Backend description (model and endpoint, or model path)
    pub backend: String,
    pub concurrent: bool,
    pub transcript: Option<String>,
}

/// Formats console output
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Startup banner
    pub fn banner(info: &StartupInfo) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("kernel-bridge"));
        output.push('\n');
        output.push_str(&Self::field("Listening:", &info.listen));
        output.push_str(&Self::field(
            "Backend:",
            &format!("{} ({})", info.backend_kind, info.backend),
        ));
        output.push_str(&Self::field(
            "Mode:",
            if info.concurrent {
                "concurrent connections"
            } else {
                "one connection at a time"
            },
        ));
        if let Some(path) = &info.transcript {
            output.push_str(&Self::field("Transcript:", path));
        }
        output.push_str(&format!(
            "\n{} {}\n",
            "Waiting for".dimmed(),
            format!("{} <question>", MARKER).yellow()
        ));
        output.push_str(&Self::footer());

        output
    }

    /// Configuration sources, highest priority first
    pub fn config_sources(sources: &[(String, bool)]) -> String {
        let mut output = format!("{}\n", "Configuration sources (in priority order):".bold());
        for (label, found) in sources {
            let marker = if *found {
                "[FOUND]".green().to_string()
            } else {
                "[     ]".dimmed().to_string()
            };
            output.push_str(&format!("  {} {}\n", marker, label));
        }
        output.push_str(&format!("  {} Default: built-in defaults\n", "[     ]".dimmed()));
        output
    }

    /// Effective configuration, already rendered as TOML
    pub fn effective_config(rendered: &str) -> String {
        format!(
            "\n{}\n{}\n",
            "Effective configuration:".bold(),
            Self::indent(rendered.trim_end(), "  ")
        )
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn field(label: &str, value: &str) -> String {
        format!("{} {}\n", format!("{:<12}", label).cyan().bold(), value)
    }

    fn footer() -> String {
        format!("{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
