use crate::env::SearchPath;
use nix::unistd::{AccessFlags, access};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Resolve a program name to an executable file the way the shell does.
///
/// Behavior:
/// - Name containing a `/` (absolute, `./foo`, `bin/foo`): used as given when it
///   names an executable regular file; the search path is not consulted.
/// - Bare name: each directory of `search_path` is tried in order and the first
///   executable regular file wins.
/// - Empty name: `None`.
///
/// Returns either a borrowed reference to the provided name or an owned `PathBuf`
/// when the result is discovered via the search path.
pub fn find_command_path<'a>(search_path: &SearchPath, name: &'a str) -> Option<Cow<'a, Path>> {
    if name.is_empty() {
        return None;
    }

    if name.contains('/') {
        let path = Path::new(name);
        return is_executable(path).then_some(Cow::Borrowed(path));
    }

    find_in_path(search_path, name).map(Cow::Owned)
}

fn find_in_path(search_path: &SearchPath, name: &str) -> Option<PathBuf> {
    search_path
        .iter()
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

/// True when `path` is a regular file this process may execute.
pub fn is_executable(path: &Path) -> bool {
    match path.metadata() {
        Ok(meta) if meta.is_file() => access(path, AccessFlags::X_OK).is_ok(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::fs::File;
    use std::os::unix::fs::PermissionsExt;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn bin() -> SearchPath {
        SearchPath::new(vec![PathBuf::from("/bin")])
    }

    fn make_unique_temp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "external_tests_{}_{}_{}",
            std::process::id(),
            tag,
            nanos
        ));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn touch(path: &Path, mode: u32) {
        File::create(path).expect("touch file");
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).expect("chmod");
    }

    #[test]
    fn absolute_existing_true() {
        let res = find_command_path(&bin(), "/bin/sh");
        let found = res.expect("Expected to find /bin/sh via absolute path");
        assert_eq!(found.as_ref(), Path::new("/bin/sh"));
    }

    #[test]
    fn absolute_nonexisting() {
        let res = find_command_path(&bin(), "/bin/nonexisting");
        assert!(
            res.is_none(),
            "Expected not to find /bin/nonexisting via absolute path"
        );
    }

    #[test]
    fn single_component_found_in_path() {
        let res = find_command_path(&bin(), "sh");
        let found = res.expect("Expected to find 'sh' in /bin via search path");
        assert_eq!(found.as_ref(), Path::new("/bin/sh"));
    }

    #[test]
    fn single_component_not_found_in_path() {
        let res = find_command_path(&bin(), "nonexistent_prog");
        assert!(res.is_none(), "Expected not to find 'nonexistent_prog'");
    }

    #[test]
    fn first_matching_directory_wins() {
        let tmp = make_unique_temp_dir("order");
        let first = tmp.join("first");
        let second = tmp.join("second");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        touch(&first.join("tool"), 0o755);
        touch(&second.join("tool"), 0o755);

        let path = SearchPath::new(vec![first.clone(), second]);
        let found = find_command_path(&path, "tool").expect("tool should resolve");
        assert_eq!(found.as_ref(), first.join("tool"));

        let _ = fs::remove_dir_all(tmp);
    }

    #[test]
    fn non_executable_and_directories_are_skipped() {
        let tmp = make_unique_temp_dir("perm");
        let plain = tmp.join("plain");
        let exec = tmp.join("exec");
        fs::create_dir_all(&plain).unwrap();
        fs::create_dir_all(exec.join("tool")).unwrap();
        fs::create_dir_all(&exec).unwrap();
        touch(&plain.join("tool"), 0o644);

        let path = SearchPath::new(vec![plain, exec]);
        assert!(find_command_path(&path, "tool").is_none());

        let _ = fs::remove_dir_all(tmp);
    }

    #[test]
    fn relative_path_with_separator_is_not_searched() {
        let tmp = make_unique_temp_dir("rel");
        fs::create_dir_all(tmp.join("bin")).unwrap();
        touch(&tmp.join("bin").join("tool"), 0o755);

        let path = SearchPath::new(vec![tmp.clone()]);
        assert!(find_command_path(&path, "bin/tool").is_none());

        let absolute = tmp.join("bin").join("tool");
        let name = absolute.to_string_lossy().to_string();
        assert!(find_command_path(&path, &name).is_some());

        let _ = fs::remove_dir_all(tmp);
    }

    #[test]
    fn empty_name_is_none() {
        let res = find_command_path(&bin(), "");
        assert!(res.is_none(), "Empty name should not resolve to anything");
    }
}
