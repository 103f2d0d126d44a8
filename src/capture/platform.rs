//! Full-screen capture through the OS's own screenshot utilities.
//!
//! This is the infrastructure layer: it talks to the OS by spawning
//! `screencapture`, `grim`, PowerShell and friends. Each tool writes a
//! PNG to a scratch path which is read back and removed.

use super::{ensure_png, CaptureError, CaptureProvider};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Linux tools in order of preference: Wayland first, then X11.
const LINUX_TOOLS: &[(&str, &[&str])] = &[
    ("grim", &[]),
    ("gnome-screenshot", &["-f"]),
    ("scrot", &["-o"]),
    ("import", &["-window", "root"]),
];

const WINDOWS_CAPTURE_SCRIPT: &str = "Add-Type -AssemblyName System.Windows.Forms; \
Add-Type -AssemblyName System.Drawing; \
$b = [System.Windows.Forms.SystemInformation]::VirtualScreen; \
$bmp = New-Object System.Drawing.Bitmap $b.Width, $b.Height; \
$g = [System.Drawing.Graphics]::FromImage($bmp); \
$g.CopyFromScreen($b.Left, $b.Top, 0, 0, $bmp.Size); \
$bmp.Save('{out}', [System.Drawing.Imaging.ImageFormat]::Png); \
$g.Dispose(); $bmp.Dispose()";

/// A resolved capture command: program plus the arguments preceding
/// (or, for PowerShell, embedding) the output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureTool {
    pub program: String,
    leading_args: Vec<String>,
    script: Option<String>,
}

impl CaptureTool {
    fn simple(program: &str, leading_args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            leading_args: leading_args.iter().map(|a| a.to_string()).collect(),
            script: None,
        }
    }

    fn powershell() -> Self {
        Self {
            program: "powershell".to_string(),
            leading_args: vec!["-NoProfile".to_string(), "-NonInteractive".to_string()],
            script: Some(WINDOWS_CAPTURE_SCRIPT.to_string()),
        }
    }

    /// Full argument list for writing the screenshot to `out`.
    pub fn args_for(&self, out: &Path) -> Vec<String> {
        let out = out.to_string_lossy();
        let mut args = self.leading_args.clone();
        match &self.script {
            // PowerShell single-quoted strings escape ' as ''
            Some(script) => {
                args.push("-Command".to_string());
                args.push(script.replace("{out}", &out.replace('\'', "''")));
            }
            None => args.push(out.into_owned()),
        }
        args
    }
}

/// Pick the capture tool for `os` (a `std::env::consts::OS` value).
///
/// `available` answers "is this program on PATH?" so selection can be
/// tested without touching the real system.
pub fn select_tool(
    os: &str,
    available: impl Fn(&str) -> bool,
) -> Result<CaptureTool, CaptureError> {
    match os {
        "macos" => Ok(CaptureTool::simple("screencapture", &["-x"])),
        "windows" => Ok(CaptureTool::powershell()),
        "linux" | "freebsd" | "openbsd" | "netbsd" => LINUX_TOOLS
            .iter()
            .find(|(program, _)| available(program))
            .map(|(program, args)| CaptureTool::simple(program, args))
            .ok_or_else(|| {
                let tried: Vec<&str> = LINUX_TOOLS.iter().map(|(p, _)| *p).collect();
                CaptureError::ToolMissing(tried.join(", "))
            }),
        other => Err(CaptureError::UnsupportedPlatform(other.to_string())),
    }
}

/// Capture tool for the platform this binary runs on.
pub fn capture_tool() -> Result<CaptureTool, CaptureError> {
    select_tool(std::env::consts::OS, |program| which::which(program).is_ok())
}

/// [`CaptureProvider`] backed by the platform screenshot utility.
pub struct SystemCapture {
    scratch_dir: PathBuf,
    counter: AtomicU64,
}

impl SystemCapture {
    pub fn new() -> Self {
        Self::with_scratch_dir(std::env::temp_dir())
    }

    pub fn with_scratch_dir(scratch_dir: PathBuf) -> Self {
        Self {
            scratch_dir,
            counter: AtomicU64::new(0),
        }
    }

    fn scratch_path(&self) -> PathBuf {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        self.scratch_dir
            .join(format!("coder-overlay-grab-{}-{}.png", std::process::id(), n))
    }
}

impl Default for SystemCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureProvider for SystemCapture {
    async fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        let tool = capture_tool()?;
        let out = self.scratch_path();
        let start = std::time::Instant::now();

        let output = tokio::process::Command::new(&tool.program)
            .args(tool.args_for(&out))
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let _ = tokio::fs::remove_file(&out).await;
            return Err(CaptureError::CommandFailed {
                tool: tool.program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let bytes = tokio::fs::read(&out).await;
        let _ = tokio::fs::remove_file(&out).await;
        let bytes = bytes?;
        ensure_png(&bytes)?;

        log::info!(
            "[CAPTURE] {} grabbed {} bytes in {}ms",
            tool.program,
            bytes.len(),
            start.elapsed().as_millis()
        );
        Ok(bytes)
    }
}
