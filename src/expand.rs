//! Pathname pattern expansion of individual words.

use glob::{MatchOptions, glob_with};
use log::debug;

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

fn has_pattern(word: &str) -> bool {
    word.contains(['*', '?', '['])
}

/// Expand one word into the words it stands for.
///
/// A leading `~` becomes the home directory. A word with pattern characters
/// becomes the sorted list of matching paths; without a match, or when the
/// pattern is malformed, the word is kept as it is.
pub fn expand_word(word: &str) -> Vec<String> {
    let word = shellexpand::tilde(word);
    if !has_pattern(&word) {
        return vec![word.into_owned()];
    }

    let matches: Vec<String> = match glob_with(&word, GLOB_OPTIONS) {
        Ok(paths) => paths
            .filter_map(Result::ok)
            .map(|path| path.to_string_lossy().into_owned())
            .collect(),
        Err(e) => {
            debug!("pattern {:?} left unexpanded: {}", word, e);
            Vec::new()
        }
    };

    if matches.is_empty() {
        vec![word.into_owned()]
    } else {
        matches
    }
}

/// Expand every word of a line, keeping their order.
pub fn expand_words<S: AsRef<str>>(words: &[S]) -> Vec<String> {
    words
        .iter()
        .flat_map(|word| expand_word(word.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn make_unique_temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("expand_tests_{}_{}", std::process::id(), nanos));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn operators_and_plain_words_pass_through() {
        assert_eq!(
            expand_words(&["cat", "<", "in", "|", "wc", ">", "out", "!"]),
            vec!["cat", "<", "in", "|", "wc", ">", "out", "!"]
        );
    }

    #[test]
    fn patterns_expand_sorted() {
        let dir = make_unique_temp_dir();
        for name in ["b.txt", "a.txt", "c.log", ".hidden.txt"] {
            fs::write(dir.join(name), "").unwrap();
        }

        let pattern = format!("{}/*.txt", dir.display());
        assert_eq!(
            expand_word(&pattern),
            vec![
                format!("{}/a.txt", dir.display()),
                format!("{}/b.txt", dir.display()),
            ]
        );

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn unmatched_and_malformed_patterns_are_kept() {
        assert_eq!(expand_word("/no/such/dir/*.zzz"), vec!["/no/such/dir/*.zzz"]);
        assert_eq!(expand_word("[unclosed"), vec!["[unclosed"]);
    }
}
