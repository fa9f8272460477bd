use super::{DispatchReceipt, SmsGateway};
use crate::{CommandError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{error, info};

/// 系统 URI 打开程序（如 `xdg-open`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opener {
    pub program: String,
    /// URI 之前的固定参数
    pub args: Vec<String>,
}

impl Opener {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// 当前平台的默认打开程序
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            Opener::new("open")
        } else if cfg!(target_os = "windows") {
            Opener {
                program: "cmd".to_string(),
                args: vec!["/C".to_string(), "start".to_string(), String::new()],
            }
        } else {
            Opener::new("xdg-open")
        }
    }

    /// 在 PATH 中查找程序
    pub fn locate(&self) -> Option<PathBuf> {
        let program = Path::new(&self.program);
        if program.components().count() > 1 {
            return program.is_file().then(|| program.to_path_buf());
        }

        let path_var = std::env::var_os("PATH")?;
        std::env::split_paths(&path_var).find_map(|dir| {
            let candidate = dir.join(&self.program);
            if candidate.is_file() {
                return Some(candidate);
            }
            let exe = candidate.with_extension("exe");
            exe.is_file().then_some(exe)
        })
    }
}

/// 通过 `sms:` URI 调起系统短信编辑界面
///
/// 打开程序以后台进程启动，不等待其退出
pub struct UriGateway {
    opener: Opener,
}

impl UriGateway {
    pub fn new(opener: Opener) -> Self {
        Self { opener }
    }

    pub fn opener(&self) -> &Opener {
        &self.opener
    }
}

impl Default for UriGateway {
    fn default() -> Self {
        Self::new(Opener::platform_default())
    }
}

#[async_trait]
impl SmsGateway for UriGateway {
    async fn is_available(&self) -> bool {
        self.opener.locate().is_some()
    }

    async fn dispatch(&self, recipient: &str, body: &str) -> Result<DispatchReceipt> {
        let program = self.opener.locate().ok_or_else(|| {
            CommandError::Unavailable(format!(
                "URI opener '{}' not found on PATH",
                self.opener.program
            ))
        })?;

        let receipt = DispatchReceipt::new(recipient, body);

        let spawned = Command::new(&program)
            .args(&self.opener.args)
            .arg(&receipt.uri)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(_child) => {
                info!(
                    recipient = %recipient,
                    opener = %program.display(),
                    "SMS handed off to system compose surface"
                );
                Ok(receipt)
            }
            Err(e) => {
                error!(
                    recipient = %recipient,
                    opener = %program.display(),
                    error = %e,
                    "Failed to launch URI opener"
                );
                Err(CommandError::DispatchFailed(e.to_string()))
            }
        }
    }

    fn gateway_type(&self) -> &'static str {
        "uri"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_opener_is_unavailable() {
        let gateway = UriGateway::new(Opener::new("gsm-definitely-not-installed-opener"));

        assert!(!gateway.is_available().await);
        let err = gateway.dispatch("+1", "0000CC").await.unwrap_err();
        assert!(matches!(err, CommandError::Unavailable(_)));
    }

    #[test]
    fn test_platform_default_has_program() {
        assert!(!Opener::platform_default().program.is_empty());
    }
}
