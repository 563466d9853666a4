//! Splitting of raw input lines into words.
//!
//! The tokenizer knows nothing about quoting or escaping. A word ends at a
//! separator character, and a small set of special characters always stand
//! alone as one-character words, so `a>b` becomes `["a", ">", "b"]`.

/// A single word of an input line. Its meaning is derived from its position.
pub type Token = String;

/// Characters that delimit words on an input line.
pub const WORD_SEPARATORS: &str = " \t\r\n";

/// Characters that are always returned as words by themselves.
pub const SPECIAL_CHARS: &str = "!><|";

/// Input redirection operator.
pub const INPUT_REDIRECT: &str = "<";
/// Output redirection operator. Doubled (`> >`) it appends.
pub const OUTPUT_REDIRECT: &str = ">";
/// Pipe operator.
pub const PIPE: &str = "|";

/// Returns true for words that act as redirection or pipe operators.
pub fn is_operator(word: &str) -> bool {
    matches!(word, INPUT_REDIRECT | OUTPUT_REDIRECT | PIPE)
}

/// Iterator over the words of one line. Consumed once, not restartable.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    rest: &'a str,
    separators: &'a str,
    special_chars: &'a str,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let separators = self.separators;
        let rest = self.rest.trim_start_matches(|c| separators.contains(c));
        let first = match rest.chars().next() {
            Some(c) => c,
            None => {
                self.rest = rest;
                return None;
            }
        };

        let word_len = rest
            .find(|c| separators.contains(c))
            .unwrap_or(rest.len());
        let len = if self.special_chars.contains(first) {
            first.len_utf8()
        } else {
            let special_at = rest
                .find(|c| self.special_chars.contains(c))
                .unwrap_or(rest.len());
            word_len.min(special_at)
        };

        let (word, remainder) = rest.split_at(len);
        self.rest = remainder;
        Some(word.to_string())
    }
}

/// Split `line` into words using the given separator and special character sets.
///
/// Leading and trailing separator runs are skipped. Any input, including the
/// empty string, yields a (possibly empty) sequence.
pub fn tokenize<'a>(line: &'a str, separators: &'a str, special_chars: &'a str) -> Tokens<'a> {
    Tokens {
        rest: line,
        separators,
        special_chars,
    }
}

/// Tokenize a command line with the shell's default separators and operators.
pub fn split_into_words(line: &str) -> Vec<Token> {
    tokenize(line, WORD_SEPARATORS, SPECIAL_CHARS).collect()
}
