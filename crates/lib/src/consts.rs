/// Default JUCE module name, also the prefix of every archive.
pub const DEFAULT_MODULE_NAME: &str = "indiekey_juce";

/// Optional configuration file looked up in the project directory.
pub const CONFIG_FILENAME: &str = "juce-dist.toml";

/// Version manifest written into the module tree.
pub const VERSION_FILENAME: &str = "version.json";

/// Distribution pointer written next to the archive.
pub const DIST_POINTER_FILENAME: &str = "dist.json";

/// Staging directory (inside the dist build dir) the archive is made from.
pub const STAGING_DIRNAME: &str = "module";

/// Library subtree of a JUCE module.
pub const LIBS_DIRNAME: &str = "libs";

/// Branch name reported for a detached HEAD, usually a tag checkout.
pub const DETACHED_HEAD: &str = "HEAD";

pub const DEFAULT_TAG_PATTERN: &str = "v*";

pub const DEFAULT_SPACES_BUCKET: &str = "indiekey-juce";
pub const DEFAULT_SPACES_ENDPOINT: &str = "https://lon1.digitaloceanspaces.com";
pub const DEFAULT_SPACES_REGION: &str = "lon1";

pub const DEFAULT_VCPKG_ROOT: &str = "submodules/vcpkg";
pub const DEFAULT_OVERLAY_TRIPLETS: &str = "triplets";

/// Paths longer than MAX_PATH break vcpkg on Windows, so buildtrees live at the drive root.
pub const DEFAULT_WINDOWS_BUILDTREES_ROOT: &str = "C:\\indiekey_juce_vcpkg_buildtrees";

/// Static libraries picked up for the universal merge.
pub const STATIC_LIB_PATTERN: &str = "*.a";
