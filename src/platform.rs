//! # Platform-specific utilities
//!
//! Questo modulo centralizza la gestione cross-platform dei comandi esterni:
//! il motore di transcodifica (`ffmpeg`) e il lettore di metadata (`exiftool`).

use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// External tools the pipeline may invoke
pub const REQUIRED_TOOLS: [&str; 2] = ["ffmpeg", "exiftool"];

/// Platform-specific command manager
pub struct PlatformCommands {
    commands: HashMap<&'static str, &'static str>,
    which_command: &'static str,
}

impl PlatformCommands {
    /// Get the singleton instance
    pub fn instance() -> &'static Self {
        static INSTANCE: OnceLock<PlatformCommands> = OnceLock::new();
        INSTANCE.get_or_init(Self::new)
    }

    fn new() -> Self {
        let mut commands = HashMap::new();
        let which_command = if cfg!(windows) {
            commands.insert("ffmpeg", "ffmpeg.exe");
            commands.insert("exiftool", "exiftool.exe");
            "where"
        } else {
            commands.insert("ffmpeg", "ffmpeg");
            commands.insert("exiftool", "exiftool");
            "which"
        };

        Self {
            commands,
            which_command,
        }
    }

    /// Get the platform-specific command name
    pub fn get_command<'a>(&self, base_name: &'a str) -> &'a str {
        self.commands.get(base_name).copied().unwrap_or(base_name)
    }

    /// Check if a command is available on the system PATH
    pub async fn is_command_available(&self, base_name: &str) -> bool {
        let command_name = self.get_command(base_name);

        let result = tokio::process::Command::new(self.which_command)
            .arg(command_name)
            .output()
            .await;

        match result {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }

    /// Probe every external tool and warn about the missing ones.
    ///
    /// Missing tools are not fatal: images are encoded in-process, video
    /// artifacts fail per file and capture dates fall back to mtime.
    pub async fn check_dependencies(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        for tool in REQUIRED_TOOLS {
            if self.is_command_available(tool).await {
                debug!("Found external tool: {}", tool);
            } else {
                warn!("⚠️ {} not found on PATH", tool);
                missing.push(tool);
            }
        }
        if missing.contains(&"ffmpeg") {
            warn!("Video files will fail until ffmpeg is installed");
        }
        if missing.contains(&"exiftool") {
            warn!("Video capture dates will fall back to file modification time");
        }
        missing
    }
}
