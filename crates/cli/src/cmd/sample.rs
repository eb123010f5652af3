//! Starter configuration

/// Configuration printed by `guanka sample-config`
pub const SAMPLE_CONFIG: &str = r#"# Hooks run in the order they are declared.

exclude = '^$'
fail_fast = false
default_stages = ["pre-commit"]

# Hooks from a repository publishing a .guanka-hooks.toml manifest:
#
# [[repos]]
# repo = "https://example.com/org/hooks.git"
# rev = "v1.0.0"
#
# [[repos.hooks]]
# id = "some-hook"
# args = ["--fix"]

[[repos]]
repo = "local"

[[repos.hooks]]
id = "no-rej-files"
name = "no merge leftovers"
entry = "Remove these leftovers of a failed patch or merge:"
language = "fail"
files = '\.(rej|orig)$'

[[repos]]
repo = "meta"

[[repos.hooks]]
id = "check-hooks-apply"

[[repos.hooks]]
id = "check-useless-excludes"
"#;

/// Print the starter configuration
pub fn run() {
    print!("{SAMPLE_CONFIG}");
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use guanka_config::{Config, RepoSource};

    #[test]
    fn test_sample_config_is_valid() {
        let config = Config::from_toml_str(SAMPLE_CONFIG).unwrap();
        config.validate().unwrap();
        assert_eq!(config.hook_count(), 3);
        assert_eq!(config.repos[0].source().unwrap(), RepoSource::Local);
        assert_eq!(config.repos[1].source().unwrap(), RepoSource::Meta);
    }
}
