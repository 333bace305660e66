//! Deployment configuration
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! environment variables (a `.env` file is loaded into the environment by the
//! binary), then command-line flags. Clap resolves flag-over-env; the file
//! layer is merged underneath with [`ConfigSource::or`].

use crate::runner::Invocation;
use clap::Args;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_REPO_PATH: &str = "repo";
pub const DEFAULT_BRANCH: &str = "master";
pub const DEFAULT_PYTHON: &str = "python3";
pub const DEFAULT_VIRTUALENV: &str = ".virtualenv";
pub const DEFAULT_REQUIREMENTS: &str = "requirements.txt";
pub const DEFAULT_MIN_COVERAGE: f64 = 100.0;
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Missing {0}")]
    Missing(&'static str),

    #[error("Command `{0}` is empty")]
    EmptyCommand(&'static str),

    #[error("Command `{0}` has an unterminated quote")]
    UnterminatedQuote(&'static str),

    #[error(
        "Command `{field}` uses shell syntax `{token}`; commands run without a shell, wrap it in `sh -c '...'`"
    )]
    ShellSyntax { field: &'static str, token: String },

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Raw settings as supplied by flags, environment or a YAML file
///
/// Every field is optional so layers can be merged; defaults are applied by
/// [`DeployConfig::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Args, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigSource {
    /// The URL of the repo to be deployed
    #[arg(short = 'u', long, env = "REPO_URL")]
    pub repo_url: Option<String>,

    /// The local path of the repo
    #[arg(short = 'p', long, env = "REPO_PATH")]
    pub repo_path: Option<PathBuf>,

    /// The branch used for deploy
    #[arg(short = 'b', long, env = "BRANCH")]
    pub branch: Option<String>,

    /// The SSH key used to authenticate to the repo
    #[arg(short = 'k', long, env = "SSH_KEY")]
    pub ssh_key: Option<PathBuf>,

    /// Deploy the newest tag on the branch instead of its tip
    #[arg(long, env = "TRACK_TAGS", num_args = 0..=1, default_missing_value = "true",
          value_parser = clap::builder::BoolishValueParser::new())]
    pub track_tags: Option<bool>,

    /// Stop without deploying when the checkout is already up to date
    #[arg(long, env = "ONLY_ON_CHANGE", num_args = 0..=1, default_missing_value = "true",
          value_parser = clap::builder::BoolishValueParser::new())]
    pub only_on_change: Option<bool>,

    /// Deploy even when the checkout is already up to date
    #[arg(short = 'O', long, env = "FORCE", num_args = 0..=1, default_missing_value = "true",
          value_parser = clap::builder::BoolishValueParser::new())]
    pub force: Option<bool>,

    /// Chat IDs notified about the deployment (comma separated)
    #[arg(long, env = "CHAT_ID", value_delimiter = ',', allow_hyphen_values = true)]
    pub chat_id: Option<Vec<i64>>,

    /// The bot token used to send notifications
    #[arg(short = 't', long, env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Base URL of the Telegram Bot API
    #[arg(long, env = "TELEGRAM_API_URL")]
    pub telegram_api_url: Option<String>,

    /// Parse mode for notifications (Markdown, MarkdownV2, HTML)
    #[arg(long, env = "TELEGRAM_PARSE_MODE")]
    pub telegram_parse_mode: Option<String>,

    /// Message sent when the repository update fails
    #[arg(long, env = "MSG_UPDATE_FAIL")]
    pub msg_update_fail: Option<String>,

    /// Message sent when the virtualenv cannot be created
    #[arg(long, env = "MSG_CREATE_VIRTUALENV_FAIL")]
    pub msg_create_virtualenv_fail: Option<String>,

    /// Message sent when the requirements cannot be installed
    #[arg(long, env = "MSG_INSTALL_REQUIREMENTS_FAIL")]
    pub msg_install_requirements_fail: Option<String>,

    /// Message sent when the tests fail
    #[arg(long, env = "MSG_RUN_TESTS_FAIL")]
    pub msg_run_tests_fail: Option<String>,

    /// Message sent when the coverage cannot be read
    #[arg(long, env = "MSG_COVERAGE_FAIL")]
    pub msg_coverage_fail: Option<String>,

    /// Message sent when the coverage is below the minimum
    #[arg(long, env = "MSG_COVERAGE_LOW")]
    pub msg_coverage_low: Option<String>,

    /// Message sent when the bot cannot be restarted
    #[arg(long, env = "MSG_RESTART_FAIL")]
    pub msg_restart_fail: Option<String>,

    /// Message sent after a successful deployment
    #[arg(long, env = "MSG_NEW_VERSION")]
    pub msg_new_version: Option<String>,

    /// The path to the PID file
    #[arg(short = 'P', long, env = "PID_FILE_PATH")]
    pub pid_file_path: Option<PathBuf>,

    /// The Python executable used to create the virtualenv
    #[arg(long, env = "PYTHON_EXECUTABLE")]
    pub python_executable: Option<String>,

    /// The path to the virtualenv, relative to the repo
    #[arg(long, env = "VIRTUALENV_PATH")]
    pub virtualenv_path: Option<PathBuf>,

    /// The command used to create the virtualenv
    #[arg(short = 'C', long, env = "CREATE_VIRTUALENV")]
    pub create_virtualenv: Option<String>,

    /// The path to the requirements file, relative to the repo
    #[arg(short = 'r', long, env = "REQUIREMENTS_PATH")]
    pub requirements_path: Option<PathBuf>,

    /// The command used to install the requirements
    #[arg(short = 'I', long, env = "INSTALL_REQUIREMENTS")]
    pub install_requirements: Option<String>,

    /// The command used to run the tests
    #[arg(short = 'T', long, env = "RUN_TESTS")]
    pub run_tests: Option<String>,

    /// Skip tests (and the coverage check)
    #[arg(long, env = "SKIP_TESTS", num_args = 0..=1, default_missing_value = "true",
          value_parser = clap::builder::BoolishValueParser::new())]
    pub skip_tests: Option<bool>,

    /// The command printing the coverage percentage
    #[arg(long, env = "GET_COVERAGE_PERCENTAGE")]
    pub get_coverage: Option<String>,

    /// Skip the coverage check
    #[arg(long, env = "SKIP_COVERAGE", num_args = 0..=1, default_missing_value = "true",
          value_parser = clap::builder::BoolishValueParser::new())]
    pub skip_coverage: Option<bool>,

    /// Minimum coverage percentage required to deploy
    #[arg(short = 'm', long, env = "MIN_COVERAGE")]
    pub min_coverage: Option<f64>,

    /// The command used to run the bot
    #[arg(short = 'R', long, env = "RUN_BOT")]
    pub run_bot: Option<String>,

    /// Timeout in seconds for each command (no timeout when unset)
    #[arg(long, env = "COMMAND_TIMEOUT")]
    pub command_timeout: Option<u64>,
}

impl ConfigSource {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Fill every unset field from `fallback`
    pub fn or(self, fallback: ConfigSource) -> ConfigSource {
        ConfigSource {
            repo_url: self.repo_url.or(fallback.repo_url),
            repo_path: self.repo_path.or(fallback.repo_path),
            branch: self.branch.or(fallback.branch),
            ssh_key: self.ssh_key.or(fallback.ssh_key),
            track_tags: self.track_tags.or(fallback.track_tags),
            only_on_change: self.only_on_change.or(fallback.only_on_change),
            force: self.force.or(fallback.force),
            chat_id: self.chat_id.or(fallback.chat_id),
            bot_token: self.bot_token.or(fallback.bot_token),
            telegram_api_url: self.telegram_api_url.or(fallback.telegram_api_url),
            telegram_parse_mode: self.telegram_parse_mode.or(fallback.telegram_parse_mode),
            msg_update_fail: self.msg_update_fail.or(fallback.msg_update_fail),
            msg_create_virtualenv_fail: self
                .msg_create_virtualenv_fail
                .or(fallback.msg_create_virtualenv_fail),
            msg_install_requirements_fail: self
                .msg_install_requirements_fail
                .or(fallback.msg_install_requirements_fail),
            msg_run_tests_fail: self.msg_run_tests_fail.or(fallback.msg_run_tests_fail),
            msg_coverage_fail: self.msg_coverage_fail.or(fallback.msg_coverage_fail),
            msg_coverage_low: self.msg_coverage_low.or(fallback.msg_coverage_low),
            msg_restart_fail: self.msg_restart_fail.or(fallback.msg_restart_fail),
            msg_new_version: self.msg_new_version.or(fallback.msg_new_version),
            pid_file_path: self.pid_file_path.or(fallback.pid_file_path),
            python_executable: self.python_executable.or(fallback.python_executable),
            virtualenv_path: self.virtualenv_path.or(fallback.virtualenv_path),
            create_virtualenv: self.create_virtualenv.or(fallback.create_virtualenv),
            requirements_path: self.requirements_path.or(fallback.requirements_path),
            install_requirements: self.install_requirements.or(fallback.install_requirements),
            run_tests: self.run_tests.or(fallback.run_tests),
            skip_tests: self.skip_tests.or(fallback.skip_tests),
            get_coverage: self.get_coverage.or(fallback.get_coverage),
            skip_coverage: self.skip_coverage.or(fallback.skip_coverage),
            min_coverage: self.min_coverage.or(fallback.min_coverage),
            run_bot: self.run_bot.or(fallback.run_bot),
            command_timeout: self.command_timeout.or(fallback.command_timeout),
        }
    }
}

/// A program and its arguments, parsed once from a configuration string
///
/// Words are split on whitespace; single or double quotes group words and a
/// backslash escapes the next character. The result is executed directly,
/// never through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    program: String,
    args: Vec<String>,
}

const SHELL_OPERATORS: &[&str] = &["|", "||", "&&", ";", ">", ">>", "<", "&"];

impl ShellCommand {
    /// Parse a configured command string
    pub fn parse(field: &'static str, raw: &str) -> Result<Self, ConfigError> {
        let words = split_words(raw).ok_or(ConfigError::UnterminatedQuote(field))?;

        if let Some(token) = words.iter().find(|w| SHELL_OPERATORS.contains(&w.as_str())) {
            return Err(ConfigError::ShellSyntax {
                field,
                token: token.clone(),
            });
        }

        let mut words = words.into_iter();
        let program = words.next().ok_or(ConfigError::EmptyCommand(field))?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    /// Build a command from already separated parts
    pub fn from_parts<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Invocation of this command in `cwd`
    pub fn invocation_in(&self, cwd: &Path) -> Invocation {
        Invocation::new(&self.program)
            .args(self.args.iter().cloned())
            .current_dir(cwd)
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words: Vec<String> = std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|w| {
                if w.is_empty() || w.chars().any(char::is_whitespace) {
                    format!("'{}'", w)
                } else {
                    w.clone()
                }
            })
            .collect();
        f.write_str(&words.join(" "))
    }
}

impl Serialize for ShellCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Split a command line into words; `None` on an unterminated quote
fn split_words(raw: &str) -> Option<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    in_word = true;
                }
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                    in_word = true;
                }
                c if c.is_whitespace() => {
                    if in_word {
                        words.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                c => {
                    current.push(c);
                    in_word = true;
                }
            },
        }
    }

    if quote.is_some() {
        return None;
    }
    if in_word {
        words.push(current);
    }
    Some(words)
}

/// Keys of the configurable notification messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKey {
    UpdateFail,
    CreateVirtualenvFail,
    InstallRequirementsFail,
    RunTestsFail,
    CoverageFail,
    CoverageLow,
    RestartFail,
    NewVersion,
}

impl MessageKey {
    pub const ALL: [MessageKey; 8] = [
        MessageKey::UpdateFail,
        MessageKey::CreateVirtualenvFail,
        MessageKey::InstallRequirementsFail,
        MessageKey::RunTestsFail,
        MessageKey::CoverageFail,
        MessageKey::CoverageLow,
        MessageKey::RestartFail,
        MessageKey::NewVersion,
    ];

    /// Built-in template for this key
    pub fn default_template(self) -> &'static str {
        match self {
            MessageKey::UpdateFail => "Error during repository update for version {{ version }}!",
            MessageKey::CreateVirtualenvFail => {
                "Error during virtualenv creation for version {{ version }}!"
            }
            MessageKey::InstallRequirementsFail => {
                "Error during install requirements for version {{ version }}!"
            }
            MessageKey::RunTestsFail => "Error during tests run for version {{ version }}!",
            MessageKey::CoverageFail => "Error during get coverage run for version {{ version }}!",
            MessageKey::CoverageLow => "Coverage too low for version {{ version }}!",
            MessageKey::RestartFail => "Error during bot restart for version {{ version }}!",
            MessageKey::NewVersion => "I'm at new version {{ version }}!",
        }
    }
}

/// Notification templates; `None` disables the message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageTemplates {
    pub update_fail: Option<String>,
    pub create_virtualenv_fail: Option<String>,
    pub install_requirements_fail: Option<String>,
    pub run_tests_fail: Option<String>,
    pub coverage_fail: Option<String>,
    pub coverage_low: Option<String>,
    pub restart_fail: Option<String>,
    pub new_version: Option<String>,
}

impl MessageTemplates {
    pub fn get(&self, key: MessageKey) -> Option<&str> {
        let template = match key {
            MessageKey::UpdateFail => &self.update_fail,
            MessageKey::CreateVirtualenvFail => &self.create_virtualenv_fail,
            MessageKey::InstallRequirementsFail => &self.install_requirements_fail,
            MessageKey::RunTestsFail => &self.run_tests_fail,
            MessageKey::CoverageFail => &self.coverage_fail,
            MessageKey::CoverageLow => &self.coverage_low,
            MessageKey::RestartFail => &self.restart_fail,
            MessageKey::NewVersion => &self.new_version,
        };
        template.as_deref()
    }
}

impl Default for MessageTemplates {
    fn default() -> Self {
        let default = |key: MessageKey| Some(key.default_template().to_string());
        Self {
            update_fail: default(MessageKey::UpdateFail),
            create_virtualenv_fail: default(MessageKey::CreateVirtualenvFail),
            install_requirements_fail: default(MessageKey::InstallRequirementsFail),
            run_tests_fail: default(MessageKey::RunTestsFail),
            coverage_fail: default(MessageKey::CoverageFail),
            coverage_low: default(MessageKey::CoverageLow),
            restart_fail: default(MessageKey::RestartFail),
            new_version: default(MessageKey::NewVersion),
        }
    }
}

/// Telegram notification settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelegramSettings {
    #[serde(skip_serializing)]
    pub bot_token: Option<String>,
    pub chat_ids: Vec<i64>,
    pub api_url: String,
    pub parse_mode: Option<String>,
}

impl TelegramSettings {
    /// Whether there is anything to send messages with and to
    pub fn is_enabled(&self) -> bool {
        self.bot_token.is_some() && !self.chat_ids.is_empty()
    }
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_ids: Vec::new(),
            api_url: DEFAULT_TELEGRAM_API_URL.to_string(),
            parse_mode: None,
        }
    }
}

/// The commands run by the pipeline stages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageCommands {
    pub create_virtualenv: ShellCommand,
    pub install_requirements: ShellCommand,
    pub run_tests: ShellCommand,
    pub get_coverage: ShellCommand,
    pub run_bot: ShellCommand,
}

/// Fully resolved configuration for one deployment run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeployConfig {
    pub repo_url: String,
    pub repo_path: PathBuf,
    pub branch: String,
    pub ssh_key: Option<PathBuf>,
    pub track_tags: bool,
    pub only_on_change: bool,
    pub force: bool,
    pub telegram: TelegramSettings,
    pub messages: MessageTemplates,
    pub pid_file: PathBuf,
    pub python_executable: String,
    pub virtualenv_path: PathBuf,
    pub requirements_path: PathBuf,
    pub commands: StageCommands,
    pub skip_tests: bool,
    pub skip_coverage: bool,
    pub min_coverage: f64,
    pub command_timeout_secs: Option<u64>,
}

impl DeployConfig {
    /// Merge flags/environment over an optional YAML file and resolve
    pub fn load(source: ConfigSource, file: Option<&Path>) -> Result<Self, ConfigError> {
        let source = match file {
            Some(path) => source.or(ConfigSource::from_file(path)?),
            None => source,
        };
        Self::resolve(source)
    }

    /// Apply defaults and validate
    pub fn resolve(source: ConfigSource) -> Result<Self, ConfigError> {
        let repo_url = non_empty(source.repo_url).ok_or(ConfigError::Missing("repo_url"))?;
        // Stage commands run inside the checkout, so it must not depend on
        // the directory they are started from.
        let repo_path = source
            .repo_path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPO_PATH));
        let repo_path = std::path::absolute(&repo_path).map_err(|e| ConfigError::Invalid {
            field: "repo_path",
            reason: e.to_string(),
        })?;
        let branch = match source.branch {
            Some(branch) if branch.trim().is_empty() => return Err(ConfigError::Missing("branch")),
            Some(branch) => branch,
            None => DEFAULT_BRANCH.to_string(),
        };

        let ssh_key = source
            .ssh_key
            .map(|key| {
                std::path::absolute(&key).map_err(|e| ConfigError::Invalid {
                    field: "ssh_key",
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let api_url = source
            .telegram_api_url
            .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string());
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                field: "telegram_api_url",
                reason: format!("`{}` is not an http(s) URL", api_url),
            });
        }

        let telegram = TelegramSettings {
            bot_token: non_empty(source.bot_token),
            chat_ids: source.chat_id.unwrap_or_default(),
            api_url: api_url.trim_end_matches('/').to_string(),
            parse_mode: non_empty(source.telegram_parse_mode),
        };

        let messages = MessageTemplates {
            update_fail: template(source.msg_update_fail, MessageKey::UpdateFail),
            create_virtualenv_fail: template(
                source.msg_create_virtualenv_fail,
                MessageKey::CreateVirtualenvFail,
            ),
            install_requirements_fail: template(
                source.msg_install_requirements_fail,
                MessageKey::InstallRequirementsFail,
            ),
            run_tests_fail: template(source.msg_run_tests_fail, MessageKey::RunTestsFail),
            coverage_fail: template(source.msg_coverage_fail, MessageKey::CoverageFail),
            coverage_low: template(source.msg_coverage_low, MessageKey::CoverageLow),
            restart_fail: template(source.msg_restart_fail, MessageKey::RestartFail),
            new_version: template(source.msg_new_version, MessageKey::NewVersion),
        };

        let pid_file = source
            .pid_file_path
            .unwrap_or_else(|| repo_path.join(".pid"));
        let python_executable = non_empty(source.python_executable)
            .unwrap_or_else(|| DEFAULT_PYTHON.to_string());
        let virtualenv_path = source
            .virtualenv_path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_VIRTUALENV));
        let requirements_path = source
            .requirements_path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REQUIREMENTS));

        let venv = virtualenv_path.to_string_lossy().into_owned();
        let bin = |tool: &str| virtualenv_path.join("bin").join(tool).to_string_lossy().into_owned();

        let commands = StageCommands {
            create_virtualenv: command_or(
                "create_virtualenv",
                source.create_virtualenv,
                || ShellCommand::from_parts(python_executable.clone(), ["-m", "venv", venv.as_str()]),
            )?,
            install_requirements: command_or(
                "install_requirements",
                source.install_requirements,
                || {
                    ShellCommand::from_parts(
                        bin("pip"),
                        [
                            "install".to_string(),
                            "-r".to_string(),
                            requirements_path.to_string_lossy().into_owned(),
                        ],
                    )
                },
            )?,
            run_tests: command_or("run_tests", source.run_tests, || {
                ShellCommand::from_parts(bin("pytest"), ["--cov=bot"])
            })?,
            get_coverage: command_or("get_coverage", source.get_coverage, || {
                ShellCommand::from_parts(bin("coverage"), ["report", "--format=total"])
            })?,
            run_bot: command_or("run_bot", source.run_bot, || {
                ShellCommand::from_parts(bin("python"), ["bot.py"])
            })?,
        };

        let min_coverage = source.min_coverage.unwrap_or(DEFAULT_MIN_COVERAGE);
        if !min_coverage.is_finite() || !(0.0..=100.0).contains(&min_coverage) {
            return Err(ConfigError::Invalid {
                field: "min_coverage",
                reason: format!("{} is not a percentage between 0 and 100", min_coverage),
            });
        }

        if source.command_timeout == Some(0) {
            return Err(ConfigError::Invalid {
                field: "command_timeout",
                reason: "must be at least one second".to_string(),
            });
        }

        Ok(Self {
            repo_url,
            repo_path,
            branch,
            ssh_key,
            track_tags: source.track_tags.unwrap_or(false),
            only_on_change: source.only_on_change.unwrap_or(false),
            force: source.force.unwrap_or(false),
            telegram,
            messages,
            pid_file,
            python_executable,
            virtualenv_path,
            requirements_path,
            commands,
            skip_tests: source.skip_tests.unwrap_or(false),
            skip_coverage: source.skip_coverage.unwrap_or(false),
            min_coverage,
            command_timeout_secs: source.command_timeout,
        })
    }

    /// Directory of the virtualenv inside the checkout
    pub fn virtualenv_dir(&self) -> PathBuf {
        self.repo_path.join(&self.virtualenv_path)
    }

    /// Value for `GIT_SSH_COMMAND`, when an SSH key is configured
    pub fn git_ssh_command(&self) -> Option<String> {
        self.ssh_key
            .as_ref()
            .map(|key| format!("ssh -i {}", key.display()))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// An explicitly empty template disables the message
fn template(value: Option<String>, key: MessageKey) -> Option<String> {
    match value {
        Some(text) if text.trim().is_empty() => None,
        Some(text) => Some(text),
        None => Some(key.default_template().to_string()),
    }
}

fn command_or<F>(field: &'static str, raw: Option<String>, default: F) -> Result<ShellCommand, ConfigError>
where
    F: FnOnce() -> ShellCommand,
{
    match raw {
        Some(raw) => ShellCommand::parse(field, &raw),
        None => Ok(default()),
    }
}
