use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub core: CoreConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Dotfile manager used for files outside any git repository
    #[serde(default)]
    pub dotfiles: DotfilesConfig,

    /// Backup snapshot mount used as the diff baseline for untracked files
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    #[serde(default)]
    pub performance: PerformanceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// strftime format used when rendering file modification times
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// External fast-file-search tool (fd-compatible flags)
    #[serde(default = "default_search_tool")]
    pub search_tool: String,
    /// Window used when the CLI does not pass --since
    #[serde(default = "default_window")]
    pub default_window: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DotfilesConfig {
    /// Git-compatible dotfile manager (ls-files / status / diff subcommands)
    #[serde(default = "default_dotfiles_program")]
    pub program: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Backup repository identifier passed to the mount tool via -r
    #[serde(default)]
    pub repository: String,
    /// Directory the snapshot filesystem is mounted on
    #[serde(default = "default_mount_point")]
    pub mount_point: PathBuf,
    /// Backup tool providing the FUSE mount subcommand
    #[serde(default = "default_mount_tool")]
    pub mount_tool: String,
    /// Tool used to detach the mount (receives -u <mount_point>)
    #[serde(default = "default_unmount_tool")]
    pub unmount_tool: String,
    /// Seconds to wait for the mount point to become populated
    #[serde(default = "default_mount_timeout")]
    pub mount_timeout: u64,
    /// Terminal emulator command the mount process runs in, so an
    /// interactive passphrase prompt stays visible. Empty = spawn directly.
    #[serde(default)]
    pub terminal: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,
    /// Seconds before a single external status/diff invocation is killed
    #[serde(default = "default_command_timeout")]
    pub command_timeout: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            time_format: default_time_format(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            search_tool: default_search_tool(),
            default_window: default_window(),
        }
    }
}

impl Default for DotfilesConfig {
    fn default() -> Self {
        Self {
            program: default_dotfiles_program(),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            repository: String::new(),
            mount_point: default_mount_point(),
            mount_tool: default_mount_tool(),
            unmount_tool: default_unmount_tool(),
            mount_timeout: default_mount_timeout(),
            terminal: String::new(),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            parallel_threads: num_cpus::get().min(8),
            command_timeout: default_command_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot read or parse the configuration file
    /// - Configuration file contains invalid TOML
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            // Create default config if it doesn't exist
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot write to the file
    /// - TOML serialization fails
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(toml_str.as_bytes())?;
        Ok(())
    }

    /// Get a configuration value by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        if parts.len() != 2 {
            return None;
        }

        match (parts[0], parts[1]) {
            ("core", "time_format") => Some(self.core.time_format.clone()),
            ("discovery", "search_tool") => Some(self.discovery.search_tool.clone()),
            ("discovery", "default_window") => Some(self.discovery.default_window.clone()),
            ("dotfiles", "program") => Some(self.dotfiles.program.clone()),
            ("snapshot", "repository") => Some(self.snapshot.repository.clone()),
            ("snapshot", "mount_point") => {
                Some(self.snapshot.mount_point.display().to_string())
            }
            ("snapshot", "mount_tool") => Some(self.snapshot.mount_tool.clone()),
            ("snapshot", "unmount_tool") => Some(self.snapshot.unmount_tool.clone()),
            ("snapshot", "mount_timeout") => Some(self.snapshot.mount_timeout.to_string()),
            ("snapshot", "terminal") => Some(self.snapshot.terminal.clone()),
            ("performance", "parallel_threads") => {
                Some(self.performance.parallel_threads.to_string())
            }
            ("performance", "command_timeout") => {
                Some(self.performance.command_timeout.to_string())
            }
            _ => None,
        }
    }

    /// Set a configuration value by key
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The key format is invalid (must be section.key)
    /// - The key is unknown
    /// - The value is invalid for the key (e.g., non-numeric timeout)
    pub fn set(&mut self, key: &str, value: String) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();
        if parts.len() != 2 {
            return Err(anyhow::anyhow!("Invalid configuration key: {key}"));
        }

        match (parts[0], parts[1]) {
            ("core", "time_format") => self.core.time_format = value,
            ("discovery", "search_tool") => self.discovery.search_tool = value,
            ("discovery", "default_window") => {
                humantime::parse_duration(&value)
                    .with_context(|| format!("Invalid window: {value}"))?;
                self.discovery.default_window = value;
            }
            ("dotfiles", "program") => self.dotfiles.program = value,
            ("snapshot", "repository") => self.snapshot.repository = value,
            ("snapshot", "mount_point") => {
                self.snapshot.mount_point = crate::utils::expand_tilde(&value)?;
            }
            ("snapshot", "mount_tool") => self.snapshot.mount_tool = value,
            ("snapshot", "unmount_tool") => self.snapshot.unmount_tool = value,
            ("snapshot", "mount_timeout") => {
                self.snapshot.mount_timeout = value
                    .parse()
                    .with_context(|| format!("Invalid number: {value}"))?;
            }
            ("snapshot", "terminal") => self.snapshot.terminal = value,
            ("performance", "parallel_threads") => {
                self.performance.parallel_threads = value
                    .parse()
                    .with_context(|| format!("Invalid number: {value}"))?;
            }
            ("performance", "command_timeout") => {
                self.performance.command_timeout = value
                    .parse()
                    .with_context(|| format!("Invalid number: {value}"))?;
            }
            _ => return Err(anyhow::anyhow!("Unknown configuration key: {key}")),
        }
        Ok(())
    }

    /// Unset a configuration value by key, restoring its default
    ///
    /// # Errors
    ///
    /// Returns an error if the key format is invalid or the key is unknown.
    pub fn unset(&mut self, key: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();
        if parts.len() != 2 {
            return Err(anyhow::anyhow!("Invalid configuration key: {key}"));
        }

        match (parts[0], parts[1]) {
            ("core", "time_format") => self.core.time_format = default_time_format(),
            ("discovery", "search_tool") => self.discovery.search_tool = default_search_tool(),
            ("discovery", "default_window") => {
                self.discovery.default_window = default_window();
            }
            ("dotfiles", "program") => self.dotfiles.program = default_dotfiles_program(),
            ("snapshot", "repository") => self.snapshot.repository = String::new(),
            ("snapshot", "terminal") => self.snapshot.terminal = String::new(),
            _ => return Err(anyhow::anyhow!("Cannot unset configuration key: {key}")),
        }
        Ok(())
    }

    /// All key/value pairs in `section.key = value` form, for `config --list`.
    #[must_use]
    pub fn list(&self) -> Vec<(String, String)> {
        const KEYS: &[&str] = &[
            "core.time_format",
            "discovery.search_tool",
            "discovery.default_window",
            "dotfiles.program",
            "snapshot.repository",
            "snapshot.mount_point",
            "snapshot.mount_tool",
            "snapshot.unmount_tool",
            "snapshot.mount_timeout",
            "snapshot.terminal",
            "performance.parallel_threads",
            "performance.command_timeout",
        ];

        KEYS.iter()
            .filter_map(|k| self.get(k).map(|v| ((*k).to_string(), v)))
            .collect()
    }
}

static NUM_CPUS: std::sync::LazyLock<usize> = std::sync::LazyLock::new(|| {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
});

mod num_cpus {
    use super::NUM_CPUS;

    pub fn get() -> usize {
        *NUM_CPUS
    }
}

// Default functions for serde
fn default_time_format() -> String {
    "%H:%M".to_string()
}

fn default_search_tool() -> String {
    "fd".to_string()
}

fn default_window() -> String {
    "24h".to_string()
}

fn default_dotfiles_program() -> String {
    "yadm".to_string()
}

fn default_mount_point() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
    home.join("mnt/backup")
}

fn default_mount_tool() -> String {
    "restic".to_string()
}

fn default_unmount_tool() -> String {
    "fusermount".to_string()
}

fn default_parallel_threads() -> usize {
    num_cpus::get().min(8)
}

const fn default_mount_timeout() -> u64 {
    60
}

const fn default_command_timeout() -> u64 {
    10
}
