//! Solution manifest parsing
//!
//! A manifest lists its member projects as
//! `Project("{kind-guid}") = "Display Name", "relative\path\App.csproj", ...`.
//! Only C#, VB and C++ project files are picked up. Paths may use either
//! separator and are resolved against the manifest's directory, so a
//! manifest written on Windows resolves the same way everywhere.

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use regex::Regex;
use retarget_core::CancellationToken;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static PROJECT_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"Project\("\{([\w-]*)\}"\)\s*=\s*"([^"]*)"\s*,\s*"([^"]*\.(?i:csproj|vcxproj|vbproj))""#,
    )
    .expect("project entry regex is valid")
});

/// One project entry found in a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectReference {
    /// Project kind GUID, without braces
    pub kind: String,
    /// Display name as written in the manifest
    pub display_name: String,
    /// Absolute, normalized project file path
    pub path: Utf8PathBuf,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SolutionParser;

impl SolutionParser {
    pub fn new() -> Self {
        Self
    }

    /// Read a manifest from disk and parse it
    ///
    /// Fails with [`Error::Discovery`] when the file cannot be read and with
    /// [`Error::Cancelled`] when `cancel` fires part way through.
    pub async fn parse(
        &self,
        manifest: &Utf8Path,
        cancel: &CancellationToken,
    ) -> Result<Vec<ProjectReference>> {
        let manifest = absolute(manifest)?;
        let text = tokio::fs::read_to_string(&manifest)
            .await
            .map_err(|e| Error::discovery(manifest.as_str(), e))?;

        let base_dir = parent_dir(manifest.as_str());
        self.parse_str(&text, base_dir, cancel)
    }

    /// Parse manifest text, resolving relative entries against `base_dir`
    pub fn parse_str(
        &self,
        text: &str,
        base_dir: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ProjectReference>> {
        let mut found: IndexMap<Utf8PathBuf, ProjectReference> = IndexMap::new();

        for caps in PROJECT_ENTRY.captures_iter(text) {
            if cancel.is_cancelled() {
                tracing::debug!("manifest parse cancelled");
                return Err(Error::Cancelled);
            }

            let path = Utf8PathBuf::from(normalize(base_dir, &caps[3]));
            if found.contains_key(&path) {
                tracing::debug!(project = %path, "duplicate manifest entry");
                continue;
            }
            found.insert(
                path.clone(),
                ProjectReference {
                    kind: caps[1].to_string(),
                    display_name: caps[2].to_string(),
                    path,
                },
            );
        }

        tracing::debug!(count = found.len(), "parsed manifest");
        Ok(found.into_values().collect())
    }
}

fn absolute(path: &Utf8Path) -> Result<Utf8PathBuf> {
    if is_rooted(path.as_str()) {
        return Ok(path.to_path_buf());
    }
    std::path::absolute(path)
        .ok()
        .and_then(|p| Utf8PathBuf::from_path_buf(p).ok())
        .ok_or_else(|| Error::invalid_path(path.as_str()))
}

/// Directory part of a path; a bare root keeps its separator
fn parent_dir(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(0) => &path[..1],
        Some(2) if drive_prefix(path).is_some() => &path[..3],
        Some(i) => &path[..i],
        None => "",
    }
}

/// Resolve a project path reported relative to `solution` into a rooted one
///
/// Rooted paths are only normalized.
pub fn resolve_project_path(solution: &Utf8Path, raw: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(normalize(parent_dir(solution.as_str()), raw))
}

pub(crate) fn is_rooted(path: &str) -> bool {
    path.starts_with(['/', '\\']) || drive_prefix(path).is_some()
}

fn drive_prefix(path: &str) -> Option<&str> {
    let bytes = path.as_bytes();
    (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':').then(|| &path[..2])
}

/// Join `raw` onto `base_dir` (unless rooted) and resolve `.` and `..` lexically
///
/// The result uses the separator style of whichever side supplied the root.
pub(crate) fn normalize(base_dir: &str, raw: &str) -> String {
    let raw_rooted = is_rooted(raw);
    let rooted = if raw_rooted { raw } else { base_dir };
    let sep = if rooted.contains('\\') { '\\' } else { '/' };

    let (prefix, rest) = match drive_prefix(rooted) {
        Some(drive) => (format!("{}{}", drive, sep), &rooted[2..]),
        None if rooted.starts_with(['/', '\\']) => (sep.to_string(), rooted),
        None => (String::new(), rooted),
    };

    let tail = if raw_rooted { "" } else { raw };
    let mut parts: Vec<&str> = Vec::new();
    for part in rest.split(['/', '\\']).chain(tail.split(['/', '\\'])) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }

    let mut out = prefix;
    out.push_str(&parts.join(&sep.to_string()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_windows_relative() {
        assert_eq!(normalize(r"C:\sln\", r"A\A.csproj"), r"C:\sln\A\A.csproj");
        assert_eq!(normalize(r"C:\sln\", r"..\B\B.csproj"), r"C:\B\B.csproj");
        assert_eq!(normalize(r"C:\sln", r".\C\.\C.csproj"), r"C:\sln\C\C.csproj");
    }

    #[test]
    fn test_normalize_unix_and_mixed() {
        assert_eq!(normalize("/src/app", r"lib\Lib.csproj"), "/src/app/lib/Lib.csproj");
        assert_eq!(normalize("/src/app", "../../../x.csproj"), "/x.csproj");
    }

    #[test]
    fn test_rooted_entry_ignores_base() {
        assert_eq!(normalize("/src/app", r"D:\other\X.vbproj"), r"D:\other\X.vbproj");
        assert_eq!(normalize(r"C:\sln", "/opt/Y.csproj"), "/opt/Y.csproj");
    }

    #[test]
    fn test_resolve_project_path() {
        let sln = Utf8Path::new("/work/App.sln");
        assert_eq!(resolve_project_path(sln, "Lib/Lib.csproj"), "/work/Lib/Lib.csproj");
        assert_eq!(resolve_project_path(sln, "/other/./X.csproj"), "/other/X.csproj");
        assert_eq!(
            resolve_project_path(Utf8Path::new(r"C:\sln\App.sln"), r"..\B\B.csproj"),
            r"C:\B\B.csproj"
        );
        assert!(is_rooted(r"C:\B") && is_rooted("/b") && !is_rooted("b/c"));
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir(r"C:\sln\App.sln"), r"C:\sln");
        assert_eq!(parent_dir("/App.sln"), "/");
        assert_eq!(parent_dir(r"C:\App.sln"), r"C:\");
        assert_eq!(parent_dir("App.sln"), "");
    }

    #[test]
    fn test_only_project_files_match() {
        let text = r#"
Project("{2150E333-8FDC-42A3-9474-1A3956D46DE8}") = "Folder", "Folder", "{11111111-0000-0000-0000-000000000000}"
EndProject
Project("{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}") = "Web", "Web\Web.csproj", "{22222222-0000-0000-0000-000000000000}"
EndProject
Project("{F184B08F-C81C-45F6-A57F-5ABD9991F28F}") = "Legacy", "Legacy\Legacy.VBPROJ", "{33333333-0000-0000-0000-000000000000}"
EndProject
Project("{8BC9CEB8-8B4A-11D0-8D11-00A0C91BC942}") = "Native", "Native\Native.vcxproj", "{44444444-0000-0000-0000-000000000000}"
EndProject
Project("{E24C65DC-7377-472B-9ABA-BC803B73C61A}") = "Site", "http://localhost/site", "{55555555-0000-0000-0000-000000000000}"
EndProject
"#;
        let refs = SolutionParser::new()
            .parse_str(text, "/src", &CancellationToken::new())
            .unwrap();
        let names: Vec<_> = refs.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, ["Web", "Legacy", "Native"]);
        assert_eq!(refs[0].kind, "FAE04EC0-301F-11D3-BF4B-00C04F79EFBC");
        assert_eq!(refs[0].path, "/src/Web/Web.csproj");
    }

    #[test]
    fn test_cancelled_parse_is_an_error() {
        let text = r#"Project("{X}") = "A", "A\A.csproj", "{1}""#;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = SolutionParser::new()
            .parse_str(text, "/src", &cancel)
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
