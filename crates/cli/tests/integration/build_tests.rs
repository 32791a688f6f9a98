//! `build-and-package` on a host without native toolchains only assembles
//! the repository sources, which is what these tests exercise.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
#[cfg(target_os = "linux")]
fn build_assembles_module_sources() {
  let env = TestEnv::project();

  env
    .dist_cmd("main")
    .arg("build-and-package")
    .assert()
    .success()
    .stdout(predicate::str::contains("Built module indiekey_juce"))
    .stdout(predicate::str::contains("Triplets: none"));

  let module = env.join("build/indiekey_juce");
  assert!(module.join("CMakeLists.txt").is_file());
  assert!(module.join("indiekey_juce.h").is_file());
  assert!(module.join("indiekey_juce.cpp").is_file());
  assert!(module.join("include/indiekey/license.h").is_file());
  assert!(module.join("src/license.cpp").is_file());
  assert!(module.join("libs").is_dir());
}

#[test]
#[cfg(target_os = "linux")]
fn build_honours_path_to_build() {
  let env = TestEnv::project();

  env
    .dist_cmd("main")
    .args(["build-and-package", "--path-to-build", "build-linux"])
    .assert()
    .success();

  assert!(env.join("build-linux/indiekey_juce/CMakeLists.txt").is_file());
}

#[test]
#[cfg(target_os = "linux")]
fn missing_module_file_fails_build() {
  let env = TestEnv::project();
  std::fs::remove_file(env.join("indiekey_juce.cpp")).unwrap();

  env
    .dist_cmd("main")
    .arg("build-and-package")
    .assert()
    .failure()
    .stderr(predicate::str::contains("indiekey_juce.cpp"));
}
