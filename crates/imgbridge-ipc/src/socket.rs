//! Socket path resolution and discovery.

use std::path::{Path, PathBuf};

const SOCKET_PREFIX: &str = "host-sock-";

/// Determine the socket path the host listens on.
///
/// Priority:
/// 1. `configured` (from the config file)
/// 2. `$IMGBRIDGE_SOCKET` environment variable
/// 3. `$XDG_RUNTIME_DIR/imgbridge/host-sock-$PID`
/// 4. `/tmp/imgbridge-$UID/host-sock-$PID`
pub fn socket_path(configured: Option<&Path>) -> PathBuf {
    let env = SocketEnv::from_env(configured);
    let path = resolve_socket_path(&env);

    // Ensure the parent directory exists with restricted permissions.
    if env.socket_override.is_none() {
        let dir = resolve_runtime_dir(env.xdg_runtime_dir.as_deref());
        if let Err(e) = std::fs::create_dir_all(&dir) {
            log::warn!("failed to create socket directory {}: {}", dir.display(), e);
        } else {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) =
                    std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o700))
                {
                    log::warn!("failed to set socket dir permissions: {e}");
                }
            }
        }
    }

    path
}

/// Discover the socket of a running host.
///
/// Used by the editor side:
/// 1. `configured` or `$IMGBRIDGE_SOCKET`, if the file exists
/// 2. The most recent `host-sock-*` file in the runtime directory
pub fn discover_socket(configured: Option<&Path>) -> Option<PathBuf> {
    let env = SocketEnv::from_env(configured);
    discover_socket_with(&env)
}

/// Resolved inputs for socket path determination.
///
/// Captured once so resolution stays a pure function in tests.
struct SocketEnv {
    socket_override: Option<PathBuf>,
    xdg_runtime_dir: Option<String>,
}

impl SocketEnv {
    fn from_env(configured: Option<&Path>) -> Self {
        let socket_override = configured
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("IMGBRIDGE_SOCKET").map(PathBuf::from));
        Self {
            socket_override,
            xdg_runtime_dir: std::env::var("XDG_RUNTIME_DIR").ok(),
        }
    }
}

fn resolve_socket_path(env: &SocketEnv) -> PathBuf {
    if let Some(ref path) = env.socket_override {
        return path.clone();
    }

    let dir = resolve_runtime_dir(env.xdg_runtime_dir.as_deref());
    let pid = std::process::id();
    dir.join(format!("{SOCKET_PREFIX}{pid}"))
}

fn resolve_runtime_dir(xdg_runtime_dir: Option<&str>) -> PathBuf {
    if let Some(xdg) = xdg_runtime_dir {
        return PathBuf::from(xdg).join("imgbridge");
    }

    let uid = unsafe { libc::getuid() };
    PathBuf::from(format!("/tmp/imgbridge-{uid}"))
}

fn discover_socket_with(env: &SocketEnv) -> Option<PathBuf> {
    if let Some(ref path) = env.socket_override {
        if path.exists() {
            return Some(path.clone());
        }
    }

    let dir = resolve_runtime_dir(env.xdg_runtime_dir.as_deref());
    scan_socket_dir(&dir)
}

/// Scan a directory for the most recently modified `host-sock-*` file.
fn scan_socket_dir(dir: &Path) -> Option<PathBuf> {
    let read_dir = std::fs::read_dir(dir).ok()?;

    let mut best: Option<(PathBuf, std::time::SystemTime)> = None;

    for entry in read_dir.flatten() {
        if !entry.file_name().to_string_lossy().starts_with(SOCKET_PREFIX) {
            continue;
        }
        if let Ok(meta) = entry.metadata() {
            let modified = meta.modified().unwrap_or(std::time::UNIX_EPOCH);
            if best.as_ref().is_none_or(|(_, t)| modified > *t) {
                best = Some((entry.path(), modified));
            }
        }
    }

    best.map(|(p, _)| p)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(socket_override: Option<&str>, xdg: Option<&str>) -> SocketEnv {
        SocketEnv {
            socket_override: socket_override.map(PathBuf::from),
            xdg_runtime_dir: xdg.map(str::to_string),
        }
    }

    #[test]
    fn resolve_default_path_contains_pid() {
        let path = resolve_socket_path(&env(None, None));
        let pid = std::process::id();
        let filename = path.file_name().unwrap().to_string_lossy();
        assert_eq!(filename, format!("host-sock-{pid}"));
    }

    #[test]
    fn resolve_override() {
        let path = resolve_socket_path(&env(Some("/tmp/imgbridge-test-socket"), None));
        assert_eq!(path, PathBuf::from("/tmp/imgbridge-test-socket"));
    }

    #[test]
    fn resolve_xdg_runtime_dir() {
        let path = resolve_socket_path(&env(None, Some("/run/user/1000")));
        let pid = std::process::id();
        assert_eq!(
            path,
            PathBuf::from(format!("/run/user/1000/imgbridge/host-sock-{pid}"))
        );
    }

    #[test]
    fn override_takes_priority_over_xdg() {
        let path = resolve_socket_path(&env(Some("/custom/socket"), Some("/run/user/1000")));
        assert_eq!(path, PathBuf::from("/custom/socket"));
    }

    #[test]
    fn configured_path_wins_over_env() {
        let env = SocketEnv::from_env(Some(Path::new("/configured/socket")));
        assert_eq!(env.socket_override, Some(PathBuf::from("/configured/socket")));
    }

    #[test]
    fn discover_returns_none_for_nonexistent_dir() {
        let env = env(None, Some("/tmp/imgbridge-test-nonexistent-dir-12345"));
        assert!(discover_socket_with(&env).is_none());
    }

    #[test]
    fn discover_picks_socket_file_in_runtime_dir() {
        let xdg = std::env::temp_dir().join(format!("imgbridge-discover-{}", std::process::id()));
        let dir = xdg.join("imgbridge");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("unrelated"), b"").unwrap();
        std::fs::write(dir.join("host-sock-1"), b"").unwrap();

        let found = discover_socket_with(&env(None, xdg.to_str()));
        assert_eq!(found, Some(dir.join("host-sock-1")));

        std::fs::remove_dir_all(&xdg).unwrap();
    }

    #[test]
    fn runtime_dir_falls_back_to_tmp() {
        let dir = resolve_runtime_dir(None);
        let uid = unsafe { libc::getuid() };
        assert_eq!(dir, PathBuf::from(format!("/tmp/imgbridge-{uid}")));
    }
}
