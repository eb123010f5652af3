//! File classification
//!
//! Hooks select files by tag (`types`, `types_or`, `exclude_types`). A path
//! gets:
//! - its kind: `file`, `directory` or `symlink`
//! - `executable` or `non-executable` for regular files
//! - tags from its exact file name or extension
//! - tags from the interpreter named in a shebang line
//! - `text` or `binary`, from the tables or by sniffing the first 8 KiB

use indexmap::IndexMap;
use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

/// Set of tags describing one path
pub type Tags = HashSet<&'static str>;

const SNIFF_LEN: usize = 8192;

/// Exact filename to tags mapping
static FILENAME_TAGS: LazyLock<IndexMap<&'static str, &'static [&'static str]>> =
    LazyLock::new(|| {
        let mut m: IndexMap<&'static str, &'static [&'static str]> = IndexMap::new();

        m.insert(".gitignore", &["text", "gitignore"]);
        m.insert(".gitattributes", &["text", "gitattributes"]);
        m.insert(".gitmodules", &["text", "gitmodules"]);
        m.insert(".editorconfig", &["text", "editorconfig"]);
        m.insert("Cargo.lock", &["text", "toml"]);
        m.insert("Dockerfile", &["text", "dockerfile"]);
        m.insert("Makefile", &["text", "makefile"]);
        m.insert("makefile", &["text", "makefile"]);
        m.insert("Pipfile", &["text", "toml"]);
        m.insert("LICENSE", &["text", "plain-text"]);
        m.insert("README", &["text", "plain-text"]);
        m.insert(".bashrc", &["text", "shell", "bash"]);
        m.insert(".bash_profile", &["text", "shell", "bash"]);
        m.insert(".zshrc", &["text", "shell", "zsh"]);

        m
    });

/// File extension to tags mapping
static EXTENSION_TAGS: LazyLock<IndexMap<&'static str, &'static [&'static str]>> =
    LazyLock::new(|| {
        let mut m: IndexMap<&'static str, &'static [&'static str]> = IndexMap::new();

        // Config formats
        m.insert("toml", &["text", "toml"]);
        m.insert("yaml", &["text", "yaml"]);
        m.insert("yml", &["text", "yaml"]);
        m.insert("json", &["text", "json"]);
        m.insert("ini", &["text", "ini"]);
        m.insert("cfg", &["text"]);
        m.insert("xml", &["text", "xml"]);

        // Shell scripts
        m.insert("sh", &["text", "shell", "sh"]);
        m.insert("bash", &["text", "shell", "bash"]);
        m.insert("zsh", &["text", "shell", "zsh"]);
        m.insert("fish", &["text", "fish"]);

        // Text/docs
        m.insert("txt", &["text", "plain-text"]);
        m.insert("md", &["text", "markdown"]);
        m.insert("markdown", &["text", "markdown"]);
        m.insert("rst", &["text", "rst"]);

        // Programming languages
        m.insert("rs", &["text", "rust"]);
        m.insert("py", &["text", "python"]);
        m.insert("pyi", &["text", "pyi"]);
        m.insert("pyx", &["text", "cython"]);
        m.insert("js", &["text", "javascript"]);
        m.insert("mjs", &["text", "javascript"]);
        m.insert("jsx", &["text", "jsx"]);
        m.insert("ts", &["text", "ts"]);
        m.insert("tsx", &["text", "tsx"]);
        m.insert("go", &["text", "go"]);
        m.insert("c", &["text", "c"]);
        m.insert("h", &["text", "header", "c"]);
        m.insert("cpp", &["text", "c++"]);
        m.insert("cc", &["text", "c++"]);
        m.insert("hpp", &["text", "header", "c++"]);
        m.insert("java", &["text", "java"]);
        m.insert("rb", &["text", "ruby"]);
        m.insert("pl", &["text", "perl"]);
        m.insert("php", &["text", "php"]);
        m.insert("lua", &["text", "lua"]);
        m.insert("html", &["text", "html"]);
        m.insert("css", &["text", "css"]);
        m.insert("sql", &["text", "sql"]);
        m.insert("proto", &["text", "proto"]);

        // Binary formats
        m.insert("png", &["binary", "image", "png"]);
        m.insert("jpg", &["binary", "image", "jpeg"]);
        m.insert("jpeg", &["binary", "image", "jpeg"]);
        m.insert("gif", &["binary", "image", "gif"]);
        m.insert("ico", &["binary", "icon"]);
        m.insert("svg", &["text", "image", "svg", "xml"]);
        m.insert("pdf", &["binary", "pdf"]);
        m.insert("zip", &["binary", "zip"]);
        m.insert("gz", &["binary", "gzip"]);
        m.insert("tar", &["binary", "tar"]);
        m.insert("whl", &["binary", "wheel", "zip"]);
        m.insert("so", &["binary"]);
        m.insert("woff", &["binary", "woff"]);
        m.insert("ttf", &["binary", "ttf"]);

        m
    });

/// Shebang interpreter to tags mapping
static INTERPRETER_TAGS: LazyLock<IndexMap<&'static str, &'static [&'static str]>> =
    LazyLock::new(|| {
        let mut m: IndexMap<&'static str, &'static [&'static str]> = IndexMap::new();

        m.insert("sh", &["shell", "sh"]);
        m.insert("bash", &["shell", "bash"]);
        m.insert("zsh", &["shell", "zsh"]);
        m.insert("python", &["python"]);
        m.insert("python3", &["python", "python3"]);
        m.insert("node", &["javascript"]);
        m.insert("ruby", &["ruby"]);
        m.insert("perl", &["perl"]);

        m
    });

static KNOWN_TAGS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    let mut known: HashSet<&'static str> = [
        "file",
        "directory",
        "symlink",
        "executable",
        "non-executable",
        "text",
        "binary",
    ]
    .into_iter()
    .collect();
    for tags in FILENAME_TAGS
        .values()
        .chain(EXTENSION_TAGS.values())
        .chain(INTERPRETER_TAGS.values())
    {
        known.extend(tags.iter().copied());
    }
    known
});

/// Whether a tag can ever be produced by [`tags_from_path`]
#[must_use]
pub fn is_known_tag(tag: &str) -> bool {
    KNOWN_TAGS.contains(tag)
}

/// Classify a path
///
/// Missing paths get no tags at all, so they never satisfy a `types` filter.
#[must_use]
pub fn tags_from_path(path: &Path) -> Tags {
    let mut tags = Tags::new();

    let Ok(metadata) = fs::symlink_metadata(path) else {
        return tags;
    };

    if metadata.file_type().is_symlink() {
        tags.insert("symlink");
        return tags;
    }
    if metadata.is_dir() {
        tags.insert("directory");
        return tags;
    }

    tags.insert("file");
    let executable = is_executable(&metadata);
    tags.insert(if executable { "executable" } else { "non-executable" });

    tags.extend(tags_from_filename(path));

    if executable
        && let Some(interpreter) = shebang_interpreter(path)
        && let Some(extra) = INTERPRETER_TAGS.get(interpreter.as_str())
    {
        tags.extend(extra.iter().copied());
    }

    if !tags.contains("text") && !tags.contains("binary") {
        tags.insert(if is_text_file(path) { "text" } else { "binary" });
    }

    tags
}

/// Tags implied by a file name alone
#[must_use]
pub fn tags_from_filename(path: &Path) -> Tags {
    let mut tags = Tags::new();

    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        if let Some(found) = FILENAME_TAGS.get(name) {
            tags.extend(found.iter().copied());
        }

        if let Some((_, ext)) = name.rsplit_once('.')
            && let Some(found) = EXTENSION_TAGS.get(ext.to_ascii_lowercase().as_str())
        {
            tags.extend(found.iter().copied());
        }
    }

    tags
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    false
}

/// A file is text when its first 8 KiB contain no NUL byte
fn is_text_file(path: &Path) -> bool {
    let Ok(file) = fs::File::open(path) else {
        return false;
    };
    let mut buf = Vec::with_capacity(SNIFF_LEN);
    if file.take(SNIFF_LEN as u64).read_to_end(&mut buf).is_err() {
        return false;
    }
    !buf.contains(&0)
}

/// Interpreter named by a shebang line
///
/// - `#!/bin/bash` → `bash`
/// - `#!/usr/bin/env python3` → `python3`
/// - `#!/usr/bin/env -S bash -e` → `bash`
fn shebang_interpreter(path: &Path) -> Option<String> {
    let file = fs::File::open(path).ok()?;
    let mut head = Vec::with_capacity(128);
    file.take(128).read_to_end(&mut head).ok()?;

    let line = head.strip_prefix(b"#!")?;
    let line = String::from_utf8_lossy(line);
    let line = line.lines().next()?;

    let mut parts = line.split_whitespace();
    let first = parts.next()?;
    let program = if first.ends_with("/env") {
        parts.find(|p| !p.starts_with('-'))?
    } else {
        first
    };

    Path::new(program)
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extension_tags() {
        let tags = tags_from_filename(Path::new("src/app.py"));
        assert!(tags.contains("python"));
        assert!(tags.contains("text"));

        let tags = tags_from_filename(Path::new("logo.PNG"));
        assert!(tags.contains("binary"));
        assert!(tags.contains("image"));
    }

    #[test]
    fn test_filename_tags() {
        let tags = tags_from_filename(Path::new("docker/Dockerfile"));
        assert!(tags.contains("dockerfile"));
    }

    #[test]
    fn test_regular_text_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes");
        fs::write(&path, "plain words\n").unwrap();

        let tags = tags_from_path(&path);
        assert!(tags.contains("file"));
        assert!(tags.contains("text"));
        assert!(!tags.contains("binary"));
    }

    #[test]
    fn test_binary_sniff() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blob");
        fs::write(&path, [0x7f, b'E', b'L', b'F', 0, 1, 2]).unwrap();

        let tags = tags_from_path(&path);
        assert!(tags.contains("binary"));
        assert!(!tags.contains("text"));
    }

    #[test]
    fn test_directory_and_missing() {
        let temp = TempDir::new().unwrap();
        let tags = tags_from_path(temp.path());
        assert_eq!(tags, Tags::from(["directory"]));

        assert!(tags_from_path(&temp.path().join("missing.py")).is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn test_executable_with_shebang() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("run");
        fs::write(&path, "#!/usr/bin/env python3\nprint('hi')\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        let tags = tags_from_path(&path);
        assert!(tags.contains("executable"));
        assert!(tags.contains("python"));
        assert!(tags.contains("python3"));
        assert!(tags.contains("text"));
    }

    #[test]
    #[cfg(unix)]
    fn test_symlink() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("target.txt");
        fs::write(&target, "x").unwrap();
        let link = temp.path().join("link.txt");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(tags_from_path(&link), Tags::from(["symlink"]));
    }

    #[test]
    fn test_known_tags() {
        assert!(is_known_tag("file"));
        assert!(is_known_tag("python"));
        assert!(is_known_tag("non-executable"));
        assert!(!is_known_tag("pythn"));
    }
}
