#[cfg(test)]
mod tests {
    use kodegen_bundler_install::InstallConfig;
    use kodegen_bundler_install::manager::{
        AllowAll, AnalysisStatus, BuildOutcome, BuildTarget, Error, InstallRecord, OsFamily, PackageManager,
        PackageRequest, PlatformProfile, Stage, Verdict,
    };
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;

    fn config(temp: &Path) -> InstallConfig {
        InstallConfig {
            workspace_root: temp.join("ws"),
            install_root: Some(temp.join("root")),
            build_command: None,
            strict_target: false,
            shell_update: false,
            shell_profile: None,
            native_source: false,
            api_key: None,
        }
    }

    fn profile(temp: &Path) -> PlatformProfile {
        PlatformProfile::new(OsFamily::current(), temp.join("home"), HashMap::new())
    }

    fn upstream(temp: &Path, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let dir = temp.join("upstream").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        for (file, content) in files {
            std::fs::write(dir.join(file), content).unwrap();
        }
        dir
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_native_build_installs_outputs_and_record() {
        let temp = TempDir::new().unwrap();
        let src = upstream(temp.path(), "foo", &[("Makefile", "all:\n\ttouch foo.out\n")]);

        let mut config = config(temp.path());
        config.build_command = Some("touch foo.out".to_string());
        let manager = PackageManager::new(&config, profile(temp.path())).unwrap();

        let request = PackageRequest::new("foo").source_url(src.to_string_lossy());
        let report = manager.install_package(&request).await.unwrap();

        assert_eq!(report.target, BuildTarget::Native);
        assert_eq!(report.analysis, AnalysisStatus::NotConfigured);
        assert!(matches!(report.build, BuildOutcome::Built { .. }));

        let root = temp.path().join("root");
        assert!(root.join("foo.out").is_file());
        assert!(root.join("Makefile").is_file());

        let record = InstallRecord::load(&root.join("foo_config.json")).await.unwrap();
        assert_eq!(record.package_name, "foo");
        assert_eq!(record.platform, OsFamily::current().as_str());
        assert_eq!(record.install_path, root);
    }

    #[tokio::test]
    async fn test_translate_to_javascript() {
        let temp = TempDir::new().unwrap();
        let src = upstream(
            temp.path(),
            "bar",
            &[("main.c", "int main(void) {\n    return 0;\n}\n")],
        );

        let mut config = config(temp.path());
        config.api_key = Some("test-key".to_string());
        let manager = PackageManager::new(&config, profile(temp.path())).unwrap();

        let request = PackageRequest::new("bar")
            .source_url(src.to_string_lossy())
            .target("translate")
            .language("javascript")
            .install_env("web");
        let report = manager.install_package(&request).await.unwrap();

        assert_eq!(report.analysis, AnalysisStatus::Allowed);
        let BuildOutcome::Translated { output } = &report.build else {
            panic!("expected translation, got {:?}", report.build);
        };
        assert_eq!(output.file_name().unwrap(), "bar.javascript");

        let installed = temp.path().join("ws/envs/web/bar.javascript");
        let text = std::fs::read_to_string(installed).unwrap();
        assert!(text.starts_with("function main() {\n"));
        assert!(text.contains("    int main(void) {\n"));
        assert!(text.contains("        return 0;\n"));
        assert!(text.ends_with("}\n"));
    }

    #[tokio::test]
    async fn test_empty_url_without_native_tool_creates_nothing() {
        let temp = TempDir::new().unwrap();
        let manager = PackageManager::new(&config(temp.path()), profile(temp.path())).unwrap();

        let err = manager
            .install_package(&PackageRequest::new("foo").source_url(""))
            .await
            .unwrap_err();

        assert!(matches!(err.root(), Error::NotFound { .. }));
        assert!(!temp.path().join("ws").exists());
        assert!(!temp.path().join("root").exists());
    }

    #[tokio::test]
    async fn test_rejection_aborts_before_install() {
        let temp = TempDir::new().unwrap();
        let src = upstream(temp.path(), "qux", &[("main.c", "int main;\n")]);

        let mut config = config(temp.path());
        config.api_key = Some("test-key".to_string());
        let manager = PackageManager::new(&config, profile(temp.path()))
            .unwrap()
            .with_policy(Arc::new(|_: &str, _: &str, _: &BuildTarget| {
                Verdict::reject(Some("use libqux-lite".to_string()))
            }));

        let err = manager
            .install_package(&PackageRequest::new("qux").source_url(src.to_string_lossy()))
            .await
            .unwrap_err();

        match err.root() {
            Error::AnalysisRejected { alternatives, .. } => {
                assert_eq!(alternatives.as_deref(), Some("use libqux-lite"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!temp.path().join("root/qux_config.json").exists());
    }

    #[tokio::test]
    async fn test_rejected_run_releases_lock_for_override() {
        let temp = TempDir::new().unwrap();
        let src = upstream(temp.path(), "qux", &[("main.c", "int main;\n")]);

        let mut config = config(temp.path());
        config.api_key = Some("test-key".to_string());
        let manager = PackageManager::new(&config, profile(temp.path()))
            .unwrap()
            .with_policy(Arc::new(|_: &str, _: &str, _: &BuildTarget| Verdict::reject(None)));
        let request = PackageRequest::new("qux").source_url(src.to_string_lossy());

        let err = manager.install_package(&request).await.unwrap_err();
        assert!(matches!(err.root(), Error::AnalysisRejected { .. }));

        // The override rerun shares the lock table, so it only finishes if the
        // rejected run gave its package lock back.
        let manager = manager.with_policy(Arc::new(AllowAll));
        let report = tokio::time::timeout(Duration::from_secs(10), manager.install_package(&request))
            .await
            .expect("override rerun waited on a held lock")
            .unwrap();

        assert_eq!(report.analysis, AnalysisStatus::Allowed);
        assert!(temp.path().join("root/qux_config.json").is_file());
    }

    #[tokio::test]
    async fn test_reinstall_keeps_single_record() {
        let temp = TempDir::new().unwrap();
        let src = upstream(temp.path(), "foo", &[("README", "docs\n")]);
        let manager = PackageManager::new(&config(temp.path()), profile(temp.path())).unwrap();
        let request = PackageRequest::new("foo").source_url(src.to_string_lossy());

        let first = manager.install_package(&request).await.unwrap();
        let second = manager.install_package(&request).await.unwrap();
        assert!(matches!(first.build, BuildOutcome::Skipped { .. }));
        assert!(second.record.install_time >= first.record.install_time);

        let records = manager.records(None).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], second.record);
    }

    #[tokio::test]
    async fn test_unknown_target_builds_natively() {
        let temp = TempDir::new().unwrap();
        let src = upstream(temp.path(), "foo", &[("main.c", "int main;\n")]);
        let manager = PackageManager::new(&config(temp.path()), profile(temp.path())).unwrap();

        let report = manager
            .install_package(
                &PackageRequest::new("foo")
                    .source_url(src.to_string_lossy())
                    .target("toaster"),
            )
            .await
            .unwrap();

        assert_eq!(report.target, BuildTarget::Native);
        assert!(!temp.path().join("root/foo.toaster").exists());
    }

    #[tokio::test]
    async fn test_stages_reported_in_order() {
        let temp = TempDir::new().unwrap();
        let src = upstream(temp.path(), "foo", &[("README", "docs\n")]);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let observer_seen = seen.clone();
        let manager = PackageManager::new(&config(temp.path()), profile(temp.path()))
            .unwrap()
            .with_observer(Arc::new(move |stage: Stage| observer_seen.lock().unwrap().push(stage)));

        manager
            .install_package(&PackageRequest::new("foo").source_url(src.to_string_lossy()))
            .await
            .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            [
                Stage::Fetching,
                Stage::Normalizing,
                Stage::Analyzing,
                Stage::Building,
                Stage::Installing
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_build_installs_nothing() {
        let temp = TempDir::new().unwrap();
        let src = upstream(temp.path(), "foo", &[("Makefile", "all:\n")]);

        let mut config = config(temp.path());
        config.build_command = Some("echo 'missing compiler' >&2; exit 2".to_string());
        let manager = PackageManager::new(&config, profile(temp.path())).unwrap();

        let err = manager
            .install_package(&PackageRequest::new("foo").source_url(src.to_string_lossy()))
            .await
            .unwrap_err();

        assert!(matches!(err.root(), Error::ToolInvocation { status: Some(2), .. }));
        assert!(!temp.path().join("root").exists());
    }
}
