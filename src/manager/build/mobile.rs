//! iOS build through xcodebuild.
//!
//! Packages without an Xcode project get a single-screen SwiftUI app
//! scaffolded from templates before xcodebuild runs.

use super::BuildOutcome;
use crate::manager::{
    error::{ErrorExt, Result},
    utils::process,
};
use handlebars::Handlebars;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Existing `.xcodeproj` bundle in `dir`, if any.
pub fn find_xcode_project(dir: &Path) -> Option<PathBuf> {
    let mut projects = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "xcodeproj"))
        .collect::<Vec<_>>();
    projects.sort();
    projects.into_iter().next()
}

/// Writes `<name>.xcodeproj/project.pbxproj` and `<name>/ContentView.swift`.
pub async fn scaffold(dir: &Path, name: &str) -> Result<PathBuf> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.register_template_string("project.pbxproj", PBXPROJ_TEMPLATE)?;
    handlebars.register_template_string("ContentView.swift", CONTENT_VIEW_TEMPLATE)?;

    let mut data = BTreeMap::new();
    data.insert("name", name.to_string());
    data.insert("type_name", swift_type_name(name));
    data.insert("bundle_id", format!("dev.kodegen.{}", bundle_id_component(name)));

    let project_dir = dir.join(format!("{}.xcodeproj", name));
    let sources_dir = dir.join(name);
    tokio::fs::create_dir_all(&project_dir)
        .await
        .fs_context("creating Xcode project directory", &project_dir)?;
    tokio::fs::create_dir_all(&sources_dir)
        .await
        .fs_context("creating Swift sources directory", &sources_dir)?;

    let pbxproj = project_dir.join("project.pbxproj");
    tokio::fs::write(&pbxproj, handlebars.render("project.pbxproj", &data)?)
        .await
        .fs_context("writing project.pbxproj", &pbxproj)?;

    let content_view = sources_dir.join("ContentView.swift");
    tokio::fs::write(&content_view, handlebars.render("ContentView.swift", &data)?)
        .await
        .fs_context("writing ContentView.swift", &content_view)?;

    log::info!("Scaffolded Xcode project {}", project_dir.display());
    Ok(project_dir)
}

/// Builds the package at `dir` for iOS, scaffolding a project if needed.
pub async fn build(dir: &Path, name: &str, destination: &str) -> Result<BuildOutcome> {
    let project = match find_xcode_project(dir) {
        Some(project) => project,
        None => scaffold(dir, name).await?,
    };

    let project_name = project
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| format!("{}.xcodeproj", name));
    let scheme = project_name.trim_end_matches(".xcodeproj").to_string();

    let args = [
        "-project".to_string(),
        project_name,
        "-scheme".to_string(),
        scheme,
        "-configuration".to_string(),
        "Release".to_string(),
        "-destination".to_string(),
        destination.to_string(),
        "build".to_string(),
    ];

    let output = process::run_program(Path::new("xcodebuild"), &args, dir).await?;
    Ok(BuildOutcome::Built {
        command: output.command,
    })
}

fn swift_type_name(name: &str) -> String {
    let mut out = String::new();
    for part in name.split(|c: char| !c.is_ascii_alphanumeric()).filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
        }
    }
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert_str(0, "App");
    }
    out
}

fn bundle_id_component(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

const CONTENT_VIEW_TEMPLATE: &str = r#"import SwiftUI

@main
struct {{type_name}}App: App {
    var body: some Scene {
        WindowGroup {
            ContentView()
        }
    }
}

struct ContentView: View {
    var body: some View {
        VStack(spacing: 12) {
            Text("{{name}}")
                .font(.largeTitle)
            Text("Built by kodegen")
                .foregroundStyle(.secondary)
        }
        .padding()
    }
}
"#;

const PBXPROJ_TEMPLATE: &str = r#"// !$*UTF8*$!
{
	archiveVersion = 1;
	classes = {
	};
	objectVersion = 56;
	objects = {

/* Begin PBXBuildFile section */
		A10000000000000000000001 /* ContentView.swift in Sources */ = {isa = PBXBuildFile; fileRef = A10000000000000000000002 /* ContentView.swift */; };
/* End PBXBuildFile section */

/* Begin PBXFileReference section */
		A10000000000000000000002 /* ContentView.swift */ = {isa = PBXFileReference; lastKnownFileType = sourcecode.swift; path = ContentView.swift; sourceTree = "<group>"; };
		A10000000000000000000003 /* {{name}}.app */ = {isa = PBXFileReference; explicitFileType = wrapper.application; includeInIndex = 0; path = "{{name}}.app"; sourceTree = BUILT_PRODUCTS_DIR; };
/* End PBXFileReference section */

/* Begin PBXFrameworksBuildPhase section */
		A10000000000000000000004 /* Frameworks */ = {
			isa = PBXFrameworksBuildPhase;
			buildActionMask = 2147483647;
			files = (
			);
			runOnlyForDeploymentPostprocessing = 0;
		};
/* End PBXFrameworksBuildPhase section */

/* Begin PBXGroup section */
		A10000000000000000000005 = {
			isa = PBXGroup;
			children = (
				A10000000000000000000006 /* {{name}} */,
				A10000000000000000000007 /* Products */,
			);
			sourceTree = "<group>";
		};
		A10000000000000000000006 /* {{name}} */ = {
			isa = PBXGroup;
			children = (
				A10000000000000000000002 /* ContentView.swift */,
			);
			path = "{{name}}";
			sourceTree = "<group>";
		};
		A10000000000000000000007 /* Products */ = {
			isa = PBXGroup;
			children = (
				A10000000000000000000003 /* {{name}}.app */,
			);
			name = Products;
			sourceTree = "<group>";
		};
/* End PBXGroup section */

/* Begin PBXNativeTarget section */
		A10000000000000000000008 /* {{name}} */ = {
			isa = PBXNativeTarget;
			buildConfigurationList = A1000000000000000000000D /* Build configuration list for PBXNativeTarget "{{name}}" */;
			buildPhases = (
				A10000000000000000000009 /* Sources */,
				A10000000000000000000004 /* Frameworks */,
			);
			buildRules = (
			);
			dependencies = (
			);
			name = "{{name}}";
			productName = "{{name}}";
			productReference = A10000000000000000000003 /* {{name}}.app */;
			productType = "com.apple.product-type.application";
		};
/* End PBXNativeTarget section */

/* Begin PBXProject section */
		A1000000000000000000000A /* Project object */ = {
			isa = PBXProject;
			attributes = {
				BuildIndependentTargetsInParallel = 1;
				LastSwiftUpdateCheck = 1500;
				LastUpgradeCheck = 1500;
			};
			buildConfigurationList = A1000000000000000000000B /* Build configuration list for PBXProject "{{name}}" */;
			compatibilityVersion = "Xcode 14.0";
			developmentRegion = en;
			hasScannedForEncodings = 0;
			knownRegions = (
				en,
				Base,
			);
			mainGroup = A10000000000000000000005;
			productRefGroup = A10000000000000000000007 /* Products */;
			projectDirPath = "";
			projectRoot = "";
			targets = (
				A10000000000000000000008 /* {{name}} */,
			);
		};
/* End PBXProject section */

/* Begin PBXSourcesBuildPhase section */
		A10000000000000000000009 /* Sources */ = {
			isa = PBXSourcesBuildPhase;
			buildActionMask = 2147483647;
			files = (
				A10000000000000000000001 /* ContentView.swift in Sources */,
			);
			runOnlyForDeploymentPostprocessing = 0;
		};
/* End PBXSourcesBuildPhase section */

/* Begin XCBuildConfiguration section */
		A1000000000000000000000C /* Release */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
				IPHONEOS_DEPLOYMENT_TARGET = 16.0;
				SDKROOT = iphoneos;
				SWIFT_COMPILATION_MODE = wholemodule;
				VALIDATE_PRODUCT = YES;
			};
			name = Release;
		};
		A1000000000000000000000E /* Release */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
				CODE_SIGNING_ALLOWED = NO;
				GENERATE_INFOPLIST_FILE = YES;
				INFOPLIST_KEY_UILaunchScreen_Generation = YES;
				MARKETING_VERSION = 1.0;
				CURRENT_PROJECT_VERSION = 1;
				PRODUCT_BUNDLE_IDENTIFIER = "{{bundle_id}}";
				PRODUCT_NAME = "$(TARGET_NAME)";
				SWIFT_VERSION = 5.0;
				TARGETED_DEVICE_FAMILY = "1,2";
			};
			name = Release;
		};
/* End XCBuildConfiguration section */

/* Begin XCConfigurationList section */
		A1000000000000000000000B /* Build configuration list for PBXProject "{{name}}" */ = {
			isa = XCConfigurationList;
			buildConfigurations = (
				A1000000000000000000000C /* Release */,
			);
			defaultConfigurationIsVisible = 0;
			defaultConfigurationName = Release;
		};
		A1000000000000000000000D /* Build configuration list for PBXNativeTarget "{{name}}" */ = {
			isa = XCConfigurationList;
			buildConfigurations = (
				A1000000000000000000000E /* Release */,
			);
			defaultConfigurationIsVisible = 0;
			defaultConfigurationName = Release;
		};
/* End XCConfigurationList section */
	};
	rootObject = A1000000000000000000000A /* Project object */;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_swift_type_name() {
        assert_eq!(swift_type_name("foo"), "Foo");
        assert_eq!(swift_type_name("lib-foo_bar"), "LibFooBar");
        assert_eq!(swift_type_name("7zip"), "App7zip");
    }

    #[tokio::test]
    async fn test_scaffold_writes_project_and_view() {
        let temp = TempDir::new().unwrap();
        let project = scaffold(temp.path(), "foo").await.unwrap();

        assert_eq!(project, temp.path().join("foo.xcodeproj"));
        let pbxproj = std::fs::read_to_string(project.join("project.pbxproj")).unwrap();
        assert!(pbxproj.contains("path = \"foo.app\""));
        assert!(pbxproj.contains("dev.kodegen.foo"));

        let view = std::fs::read_to_string(temp.path().join("foo/ContentView.swift")).unwrap();
        assert!(view.contains("struct FooApp: App"));
        assert_eq!(find_xcode_project(temp.path()), Some(project));
    }
}
