use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn archive_creates_zip_and_pointer() {
  let env = TestEnv::empty().with_platform_builds();

  env
    .dist_cmd("main")
    .args(["archive-and-upload", "--build-number", "7"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Created indiekey_juce-v1.2.3-7-dist.zip"))
    .stdout(predicate::str::contains("Not uploaded"));

  let entries = env.zip_entries("build-dist/indiekey_juce-v1.2.3-7-dist.zip");
  assert!(entries.contains(&"indiekey_juce/version.json".to_string()));
  assert!(entries.contains(&"indiekey_juce/libs/MacOSX/libsodium.a".to_string()));
  assert!(entries.contains(&"indiekey_juce/libs/VisualStudio2022/x64/MDd/libsodium.lib".to_string()));

  let pointer: serde_json::Value =
    serde_json::from_str(&std::fs::read_to_string(env.join("build-dist/dist.json")).unwrap()).unwrap();
  assert_eq!(pointer["path"], "indiekey_juce-v1.2.3-7-dist.zip");
  assert_eq!(pointer["version"], "v1.2.3");
  assert_eq!(pointer["build_number"], "7");
}

#[test]
fn version_record_is_stamped_into_module() {
  let env = TestEnv::empty().with_platform_builds();

  env
    .dist_cmd("main")
    .args(["archive-and-upload", "--build-number", "3"])
    .assert()
    .success();

  let record: serde_json::Value = serde_json::from_str(
    &std::fs::read_to_string(env.join("build-dist/module/indiekey_juce/version.json")).unwrap(),
  )
  .unwrap();
  assert_eq!(record["version"], "v1.2.3");
  assert_eq!(record["build_number"], "3");
  assert!(record["date"].as_str().is_some_and(|d| !d.is_empty()));
}

#[test]
fn tag_build_archive_has_no_build_number() {
  let env = TestEnv::empty().with_platform_builds();

  env
    .dist_cmd("HEAD")
    .args(["archive-and-upload", "--build-number", "7"])
    .assert()
    .success();

  assert!(env.join("build-dist/indiekey_juce-v1.2.3-dist.zip").is_file());
}

#[test]
fn custom_build_paths_are_used() {
  let env = TestEnv::empty().with_platform_builds();

  env
    .dist_cmd("main")
    .arg("archive-and-upload")
    .args(["--path-to-build", "out/dist"])
    .args(["--path-to-build-macos", "build-macos"])
    .args(["--path-to-build-windows", "build-windows"])
    .assert()
    .success();

  assert!(env.join("out/dist/indiekey_juce-v1.2.3-0-dist.zip").is_file());
  assert!(env.join("out/dist/dist.json").is_file());
}

#[test]
fn missing_windows_build_fails() {
  let env = TestEnv::empty();
  env.write_file("build-macos/indiekey_juce/indiekey_juce.h", "// header");

  env
    .dist_cmd("main")
    .arg("archive-and-upload")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Windows build not found"));

  assert!(!env.join("build-dist/dist.json").exists());
}

#[test]
fn config_file_renames_module() {
  let env = TestEnv::empty();
  env.write_file("juce-dist.toml", "[module]\nname = \"other_module\"\n");
  env.write_file("build-macos/other_module/other_module.h", "// header");
  env.write_file("build-windows/other_module/libs/VisualStudio2022/x64/MT/x.lib", "mt");

  env
    .dist_cmd("main")
    .arg("archive-and-upload")
    .assert()
    .success();

  assert!(env.join("build-dist/other_module-v1.2.3-0-dist.zip").is_file());
}

#[test]
fn invalid_config_is_reported() {
  let env = TestEnv::empty().with_platform_builds();
  env.write_file("juce-dist.toml", "[module]\nnmae = \"typo\"\n");

  env
    .dist_cmd("main")
    .arg("archive-and-upload")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn publish_without_pointer_fails() {
  let env = TestEnv::empty();

  // Credentials are present, so the missing dist.json is the failure.
  env
    .dist_cmd("main")
    .args(["archive-and-upload", "--publish"])
    .args(["--spaces-key", "key", "--spaces-secret", "secret"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("dist.json"));
}
