//! Wine subprocess execution
//!
//! `WineRunner` probes the known CrossOver/Wine install locations (CrossOver
//! unix-side wine first, then the CrossOver app wrapper, then standalone
//! Wine builds and `$PATH`) and runs registry commands inside the selected
//! bottle or prefix. Invocations are synchronous and carry a hard timeout;
//! on expiry the child is killed and the call fails.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Default timeout for registry-tool invocations.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Poll interval while waiting for a child process.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// CrossOver's unix-side wine binary (preferred: no GUI wrapper involved).
const CROSSOVER_UNIX_WINE: &str =
    "/Applications/CrossOver.app/Contents/SharedSupport/CrossOver/lib/wine/x86_64-unix/wine";
/// CrossOver's hosted-application wrapper binary.
const CROSSOVER_WRAPPER_WINE: &str =
    "/Applications/CrossOver.app/Contents/SharedSupport/CrossOver/CrossOver-Hosted Application/wine";
/// CrossOver support root, exported as `CX_ROOT` for the unix-side binary.
const CROSSOVER_ROOT: &str = "/Applications/CrossOver.app/Contents/SharedSupport/CrossOver";

/// Standalone Wine builds probed after CrossOver.
const WINE_CANDIDATES: [&str; 6] = [
    "/Applications/Wine Crossover.app/Contents/Resources/wine/bin/wine64",
    "/Applications/Whisky.app/Contents/Resources/wine/bin/wine64",
    "/opt/homebrew/bin/wine64",
    "/opt/homebrew/bin/wine",
    "/usr/local/bin/wine64",
    "/usr/local/bin/wine",
];

/// Captured result of a finished subprocess.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// The command line that ran (for error reporting)
    pub command: String,
    /// Combined stdout + stderr
    pub output: String,
}

/// Narrow seam for running the bottle's registry tool.
///
/// The synchronizer and registry wrapper depend on this trait only, so tests
/// drive them with a scripted fake instead of a real Wine install.
pub trait RegistryRunner: Send + Sync {
    /// Run `wine <args...>` (e.g. `reg query ...`) inside the bottle and
    /// capture its output.
    fn run_registry_command(&self, args: &[String]) -> Result<CommandOutput>;
}

/// How the detected Wine binary is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WineFlavor {
    /// CrossOver unix-side binary: plain invocation, `CX_ROOT` + `WINEPREFIX`
    CrossOverUnix,
    /// CrossOver wrapper: `--no-gui --bottle <name>` prepended
    CrossOverWrapper,
    /// Standalone Wine: plain invocation, `WINEPREFIX`
    Standalone,
}

/// A detected Wine/CrossOver runtime bound to one bottle or prefix.
#[derive(Debug, Clone)]
pub struct WineRunner {
    wine_binary: PathBuf,
    flavor: WineFlavor,
    /// CrossOver bottle name (wrapper invocation) and its prefix path
    bottle_name: String,
    bottle_path: PathBuf,
    /// Plain-Wine prefix used when no CrossOver bottle exists
    prefix_path: PathBuf,
    timeout: Duration,
}

impl WineRunner {
    /// Detect a usable runtime for the given bottle/prefix.
    ///
    /// CrossOver is preferred when its bottle directory exists; otherwise
    /// any standalone Wine binary is used against `prefix_path`. Fails with
    /// [`Error::RuntimeNotFound`] when nothing is installed.
    pub fn detect(bottle_name: &str, bottle_path: &Path, prefix_path: &Path) -> Result<Self> {
        let (wine_binary, flavor) = Self::detect_binary(bottle_path)
            .ok_or(Error::RuntimeNotFound)?;
        debug!(binary = %wine_binary.display(), ?flavor, "Wine runtime detected");
        Ok(Self {
            wine_binary,
            flavor,
            bottle_name: bottle_name.to_string(),
            bottle_path: bottle_path.to_path_buf(),
            prefix_path: prefix_path.to_path_buf(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        })
    }

    /// Locate any Wine binary without binding it to a bottle. Used by the
    /// preflight/snapshot reporting.
    pub fn locate_wine_binary() -> Option<PathBuf> {
        for candidate in [CROSSOVER_UNIX_WINE, CROSSOVER_WRAPPER_WINE] {
            let path = Path::new(candidate);
            if is_executable(path) {
                return Some(path.to_path_buf());
            }
        }
        for candidate in WINE_CANDIDATES {
            let path = Path::new(candidate);
            if is_executable(path) {
                return Some(path.to_path_buf());
            }
        }
        search_path(&["wine", "wine64"])
    }

    /// Override the per-invocation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The binary this runner invokes.
    pub fn wine_binary(&self) -> &Path {
        &self.wine_binary
    }

    fn detect_binary(bottle_path: &Path) -> Option<(PathBuf, WineFlavor)> {
        let unix_wine = Path::new(CROSSOVER_UNIX_WINE);
        if is_executable(unix_wine) && bottle_path.exists() {
            return Some((unix_wine.to_path_buf(), WineFlavor::CrossOverUnix));
        }

        let wrapper_wine = Path::new(CROSSOVER_WRAPPER_WINE);
        if is_executable(wrapper_wine) && bottle_path.exists() {
            return Some((wrapper_wine.to_path_buf(), WineFlavor::CrossOverWrapper));
        }

        for candidate in WINE_CANDIDATES {
            let path = Path::new(candidate);
            if is_executable(path) {
                return Some((path.to_path_buf(), WineFlavor::Standalone));
            }
        }

        search_path(&["wine", "wine64"]).map(|path| (path, WineFlavor::Standalone))
    }

    fn environment(&self) -> Vec<(String, String)> {
        let mut env = vec![
            ("WINEESYNC".to_string(), "1".to_string()),
            ("WINEFSYNC".to_string(), "1".to_string()),
            ("WINEMSYNC".to_string(), "1".to_string()),
        ];
        match self.flavor {
            WineFlavor::CrossOverUnix => {
                env.push(("CX_ROOT".to_string(), CROSSOVER_ROOT.to_string()));
                env.push((
                    "WINEPREFIX".to_string(),
                    self.bottle_path.to_string_lossy().into_owned(),
                ));
                env.push(("WINEARCH".to_string(), "win64".to_string()));
            }
            WineFlavor::CrossOverWrapper => {}
            WineFlavor::Standalone => {
                env.push((
                    "WINEPREFIX".to_string(),
                    self.prefix_path.to_string_lossy().into_owned(),
                ));
                env.push(("WINEARCH".to_string(), "win64".to_string()));
            }
        }
        env
    }
}

impl RegistryRunner for WineRunner {
    fn run_registry_command(&self, args: &[String]) -> Result<CommandOutput> {
        let mut full_args: Vec<String> = Vec::new();
        if self.flavor == WineFlavor::CrossOverWrapper {
            full_args.push("--no-gui".to_string());
            full_args.push("--bottle".to_string());
            full_args.push(self.bottle_name.clone());
        }
        full_args.extend(args.iter().cloned());

        run_with_timeout(&self.wine_binary, &full_args, &self.environment(), self.timeout)
    }
}

/// Spawn `program args...` with the given extra environment, capture merged
/// output, and enforce `timeout`. The child is killed when the deadline
/// passes.
pub fn run_with_timeout(
    program: &Path,
    args: &[String],
    env: &[(String, String)],
    timeout: Duration,
) -> Result<CommandOutput> {
    let command_line = std::iter::once(program.to_string_lossy().into_owned())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ");
    debug!(command = %command_line, "Running subprocess");

    let mut child = Command::new(program)
        .args(args)
        .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| Error::CommandLaunchFailed {
            command: command_line.clone(),
            source,
        })?;

    // Drain both pipes off-thread so a chatty child cannot deadlock against
    // a full pipe buffer while we poll for exit.
    let stdout_reader = child.stdout.take().map(spawn_pipe_reader);
    let stderr_reader = child.stderr.take().map(spawn_pipe_reader);

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None => {
                if Instant::now() >= deadline {
                    warn!(command = %command_line, "Subprocess timed out, killing");
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(Error::CommandTimedOut {
                        command: command_line,
                        timeout_secs: timeout.as_secs(),
                    });
                }
                std::thread::sleep(WAIT_POLL_INTERVAL);
            }
        }
    };

    let mut output = stdout_reader.map(join_pipe_reader).unwrap_or_default();
    output.push_str(&stderr_reader.map(join_pipe_reader).unwrap_or_default());

    if !status.success() {
        return Err(Error::CommandFailed {
            command: command_line,
            status: status.code().unwrap_or(-1),
            output,
        });
    }

    Ok(CommandOutput {
        command: command_line,
        output,
    })
}

fn spawn_pipe_reader<R: Read + Send + 'static>(mut pipe: R) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buffer = String::new();
        let _ = pipe.read_to_string(&mut buffer);
        buffer
    })
}

fn join_pipe_reader(handle: std::thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Search `$PATH` for the first of `names` that resolves to an executable.
fn search_path(names: &[&str]) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        for name in names {
            let candidate = dir.join(name);
            if is_executable(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}
