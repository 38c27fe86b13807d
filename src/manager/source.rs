//! Package source acquisition.
//!
//! Sources come from one of two places:
//! - the host's native package-source tool (`apt-get source` on Linux), or
//! - a location given by the caller: an `http(s)://` URL of a `.tar.gz`, a
//!   `file://` URL, or a local directory / tarball path.
//!
//! Everything lands under `<workspace>/sources/`. No retries happen here.

use crate::manager::{
    error::{Error, ErrorExt, Result},
    platform::{OsFamily, PlatformProfile},
    utils::{archive, fs, http, process},
    workspace::Workspace,
};
use std::path::{Path, PathBuf};
use url::Url;

/// Native tool that downloads distribution sources for a package name.
#[derive(Debug, Clone)]
pub struct NativeSourceTool {
    program: PathBuf,
    args: Vec<String>,
}

impl NativeSourceTool {
    /// Tool invoked as `<program> <args...> <package>`.
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Looks up the native source tool for the host, if any is installed.
    pub fn detect(profile: &PlatformProfile) -> Option<Self> {
        match profile.os_family() {
            OsFamily::Linux => match which::which("apt-get") {
                Ok(program) => {
                    log::debug!("Found native source tool {}", program.display());
                    Some(Self::new(program, vec!["source".to_string()]))
                }
                Err(_) => None,
            },
            _ => None,
        }
    }

    /// Path of the executable.
    pub fn program(&self) -> &Path {
        &self.program
    }
}

/// Where a caller-supplied source lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Directory or tarball on the local filesystem
    Local(PathBuf),
    /// Remote tarball
    Remote(Url),
}

impl SourceLocation {
    /// Parses a caller-supplied source string.
    ///
    /// Existing local paths win over URL parsing so that Windows drive
    /// letters are not mistaken for URL schemes.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        let path = PathBuf::from(input);
        if path.exists() {
            return Ok(Self::Local(path));
        }

        let url = Url::parse(input).map_err(|e| Error::Network {
            url: input.to_string(),
            reason: format!("malformed URL: {}", e),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(Self::Remote(url)),
            "file" => url.to_file_path().map(Self::Local).map_err(|_| Error::Network {
                url: input.to_string(),
                reason: "file URL does not name a local path".to_string(),
            }),
            other => Err(Error::Network {
                url: input.to_string(),
                reason: format!("unsupported URL scheme '{}'", other),
            }),
        }
    }
}

/// Obtains package sources into the workspace.
#[derive(Debug, Clone)]
pub struct SourceAcquirer {
    workspace: Workspace,
    client: reqwest::Client,
    native_tool: Option<NativeSourceTool>,
}

impl SourceAcquirer {
    /// Acquirer that only uses caller-supplied locations.
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            client: reqwest::Client::new(),
            native_tool: None,
        }
    }

    /// Prefers `tool` over any caller-supplied location.
    pub fn with_native_tool(mut self, tool: Option<NativeSourceTool>) -> Self {
        self.native_tool = tool;
        self
    }

    /// Uses `client` for downloads.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Native tool in use, if any.
    pub fn native_tool(&self) -> Option<&NativeSourceTool> {
        self.native_tool.as_ref()
    }

    /// Fetches the source for `name` and returns the directory holding it.
    ///
    /// With a native tool configured the tool is used and `source_url` is
    /// ignored. Otherwise `source_url` must be non-empty; an empty one fails
    /// before any directory is created.
    pub async fn fetch(&self, name: &str, source_url: Option<&str>) -> Result<PathBuf> {
        if let Some(tool) = &self.native_tool {
            return self.fetch_native(tool, name).await;
        }

        let source_url = self.require_source(name, source_url)?;
        let dest = self.workspace.sources_dir().join(name);

        match SourceLocation::parse(source_url)? {
            SourceLocation::Local(path) => self.fetch_local(&path, &dest).await,
            SourceLocation::Remote(url) => self.fetch_remote(&url, name, &dest).await,
        }
    }

    /// Checks that `name` can be fetched at all, without touching the disk.
    ///
    /// Returns the trimmed URL when one is needed, `""` when the native tool
    /// will be used.
    pub fn require_source<'a>(&self, name: &str, source_url: Option<&'a str>) -> Result<&'a str> {
        if self.native_tool.is_some() {
            return Ok("");
        }

        match source_url.map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(Error::NotFound {
                what: format!("source URL for {} (no native source tool)", name),
                path: self.workspace.sources_dir().join(name),
            }),
        }
    }

    async fn fetch_native(&self, tool: &NativeSourceTool, name: &str) -> Result<PathBuf> {
        let scratch = self.workspace.sources_dir().join(format!("{}.native", name));
        fs::create_dir_all(&scratch, true).await?;

        log::info!("Fetching {} with {}", name, tool.program.display());
        let mut args = tool.args.clone();
        args.push(name.to_string());
        process::run_program(&tool.program, &args, &scratch).await?;

        let mut dirs = std::fs::read_dir(&scratch)
            .fs_context("reading native tool output", &scratch)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect::<Vec<_>>();
        dirs.sort();

        if dirs.len() > 1 {
            log::warn!(
                "{} produced {} directories, using {}",
                tool.program.display(),
                dirs.len(),
                dirs[0].display()
            );
        }

        dirs.into_iter().next().ok_or_else(|| Error::NotFound {
            what: format!("source directory produced for {}", name),
            path: scratch,
        })
    }

    async fn fetch_local(&self, path: &Path, dest: &Path) -> Result<PathBuf> {
        if path.is_dir() {
            log::info!("Copying local source {}", path.display());
            fs::create_dir_all(dest, true).await?;
            fs::merge_dir(path, dest).await?;
            return Ok(dest.to_path_buf());
        }

        if path.is_file() {
            log::info!("Extracting local archive {}", path.display());
            return extract_into(path, dest).await;
        }

        Err(Error::NotFound {
            what: "local source".to_string(),
            path: path.to_path_buf(),
        })
    }

    async fn fetch_remote(&self, url: &Url, name: &str, dest: &Path) -> Result<PathBuf> {
        let download = self
            .workspace
            .sources_dir()
            .join(format!("{}.download-{}.tar.gz", name, uuid::Uuid::new_v4()));

        let result = async {
            http::download_to_file(&self.client, url, &download).await?;
            extract_into(&download, dest).await
        }
        .await;

        fs::remove_file(&download).await?;
        result
    }
}

/// Extracts `archive` into a freshly erased `dest`, descending into a
/// single wrapping directory if the archive has one.
async fn extract_into(archive: &Path, dest: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dest, true).await?;
    archive::unpack_tar_gz(archive, dest).await?;

    match archive::single_subdir(dest)? {
        Some(inner) => {
            log::debug!("Using wrapped source directory {}", inner.display());
            Ok(inner)
        }
        None => Ok(dest.to_path_buf()),
    }
}
