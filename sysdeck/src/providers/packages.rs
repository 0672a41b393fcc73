//! Installed packages via the host's package manager.

use std::env;
use std::path::Path;

use tokio::process::Command;

use crate::error::FetchError;
use crate::types::{PackageInfo, PackageList, PackageManager};

/// First of apt, dnf, pacman found on `path` (a PATH-style list).
pub fn detect_in(path: &std::ffi::OsStr) -> Option<PackageManager> {
    let dirs: Vec<_> = env::split_paths(path).collect();
    let has = |bin: &str| dirs.iter().any(|d| is_executable(&d.join(bin)));
    [
        ("apt", PackageManager::Apt),
        ("dnf", PackageManager::Dnf),
        ("pacman", PackageManager::Pacman),
    ]
    .into_iter()
    .find(|(bin, _)| has(bin))
    .map(|(_, pm)| pm)
}

pub fn detect() -> Option<PackageManager> {
    env::var_os("PATH").and_then(|p| detect_in(&p))
}

fn is_executable(p: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        p.metadata()
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        p.is_file()
    }
}

fn installed(name: &str, version: &str) -> PackageInfo {
    PackageInfo {
        name: name.to_string(),
        version: version.to_string(),
        description: String::new(),
        size: String::new(),
        status: "installed".to_string(),
    }
}

/// `dpkg-query -W -f='${Package}\t${Version}\t${Description}\t${Installed-Size}\n'`
pub fn parse_dpkg(out: &str) -> Vec<PackageInfo> {
    out.lines()
        .filter_map(|line| {
            let mut parts = line.splitn(4, '\t');
            let name = parts.next().filter(|s| !s.is_empty())?;
            let version = parts.next()?;
            let mut pkg = installed(name, version);
            pkg.description = parts.next().unwrap_or_default().to_string();
            pkg.size = parts.next().unwrap_or_default().trim().to_string();
            Some(pkg)
        })
        .collect()
}

/// `dnf list installed --quiet`: a header line, then `name.arch version repo`.
pub fn parse_dnf(out: &str) -> Vec<PackageInfo> {
    out.lines()
        .skip(1)
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?;
            let version = fields.next()?;
            Some(installed(name, version))
        })
        .collect()
}

/// `pacman -Q`: `name version` per line.
pub fn parse_pacman(out: &str) -> Vec<PackageInfo> {
    out.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?;
            let version = fields.next()?;
            Some(installed(name, version))
        })
        .collect()
}

async fn run(program: &str, args: &[&str]) -> Result<String, FetchError> {
    let out = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await?;
    if !out.status.success() {
        return Err(FetchError::Unreachable(format!(
            "{program} exited with {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&out.stdout).into_owned())
}

pub async fn list(configured: Option<PackageManager>) -> Result<PackageList, FetchError> {
    let manager = configured
        .or_else(detect)
        .ok_or(FetchError::Unsupported("no supported package manager found"))?;
    let mut packages = match manager {
        PackageManager::Apt => parse_dpkg(
            &run(
                "dpkg-query",
                &[
                    "-W",
                    "-f=${Package}\t${Version}\t${Description}\t${Installed-Size}\n",
                ],
            )
            .await?,
        ),
        PackageManager::Dnf => parse_dnf(&run("dnf", &["list", "installed", "--quiet"]).await?),
        PackageManager::Pacman => parse_pacman(&run("pacman", &["-Q"]).await?),
    };
    packages.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(PackageList { manager, packages })
}
