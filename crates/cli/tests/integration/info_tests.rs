//! `info` against a real repository, deriving version and branch from git.

use super::common::TestEnv;

fn info_json(env: &TestEnv, extra: &[&str]) -> serde_json::Value {
  let output = env
    .detect_cmd()
    .args(["info", "-o", "json"])
    .args(extra)
    .output()
    .unwrap();
  assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
  serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn info_reads_version_after_merge() {
  let env = TestEnv::empty().with_git_repo();
  env.git(&["commit", "-q", "--allow-empty", "-m", "root"]);
  env.git(&["checkout", "-q", "-b", "side"]);
  for message in ["side 1", "side 2", "side 3"] {
    env.git(&["commit", "-q", "--allow-empty", "-m", message]);
  }
  env.git(&["checkout", "-q", "main"]);
  env.git(&["commit", "-q", "--allow-empty", "-m", "tagged"]);
  env.git(&["tag", "-a", "v1.0", "-m", "v1.0"]);
  env.git(&["merge", "-q", "--no-ff", "side", "-m", "merge side"]);
  let head = env.git(&["rev-parse", "--short=7", "HEAD"]);

  let report = info_json(&env, &["--build-number", "5"]);

  assert_eq!(report["version"], format!("v1.0-4-g{}", head));
  assert_eq!(report["branch"], "main");
  assert_eq!(report["archive"], format!("indiekey_juce-v1.0-4-g{}-5-dist.zip", head));
}

#[test]
fn info_ignores_lightweight_tags() {
  let env = TestEnv::empty().with_git_repo();
  env.git(&["commit", "-q", "--allow-empty", "-m", "a"]);
  env.git(&["tag", "-a", "v1.0", "-m", "v1.0"]);
  env.git(&["commit", "-q", "--allow-empty", "-m", "b"]);
  env.git(&["tag", "v1.1-wip"]);
  let head = env.git(&["rev-parse", "--short=7", "HEAD"]);

  let report = info_json(&env, &[]);
  assert_eq!(report["version"], format!("v1.0-1-g{}", head));

  env.write_file("juce-dist.toml", "[git]\nlightweight_tags = true\n");
  let report = info_json(&env, &[]);
  assert_eq!(report["version"], "v1.1-wip");
}

#[test]
fn info_on_detached_tag_checkout() {
  let env = TestEnv::empty().with_git_repo();
  env.git(&["commit", "-q", "--allow-empty", "-m", "a"]);
  env.git(&["tag", "-a", "v2.0", "-m", "v2.0"]);
  env.git(&["commit", "-q", "--allow-empty", "-m", "b"]);
  env.git(&["checkout", "-q", "--detach", "v2.0"]);

  let report = info_json(&env, &["--build-number", "5"]);

  assert_eq!(report["version"], "v2.0");
  assert_eq!(report["branch"], "HEAD");
  assert_eq!(report["archive"], "indiekey_juce-v2.0-dist.zip");
}
