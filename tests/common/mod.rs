use anyhow::Result;
use recap::RecapContext;
use tempfile::TempDir;

/// Hermetic home fixture: every external tool name points at nothing, so
/// tests never touch the real home directory or the real backends.
pub struct TestHome {
    pub temp_dir: TempDir,
    pub ctx: RecapContext,
}

impl TestHome {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join(".config/recap/config.toml");

        let mut ctx = RecapContext::new_explicit(temp_dir.path().to_path_buf(), config_path)?;
        ctx.config.discovery.search_tool = "recap-test-missing-search".to_string();
        ctx.config.dotfiles.program = "recap-test-missing-dotfiles".to_string();
        ctx.config.snapshot.mount_tool = "recap-test-missing-mount".to_string();
        ctx.config.snapshot.mount_point = temp_dir.path().join("mnt");
        ctx.config.snapshot.repository = "test-repo".to_string();
        ctx.config.snapshot.mount_timeout = 1;

        Ok(Self { temp_dir, ctx })
    }

    pub fn path(&self) -> &std::path::Path {
        self.temp_dir.path()
    }
}

/// True when `tool` is runnable on this machine; used to skip tests that
/// need real external binaries.
#[allow(dead_code)]
pub fn tool_available(tool: &str) -> bool {
    std::process::Command::new(tool)
        .arg("--version")
        .output()
        .is_ok()
}
