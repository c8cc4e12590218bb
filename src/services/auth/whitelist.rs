//! Path whitelist: request paths that bypass gateway authentication.
//!
//! Patterns use path-glob syntax:
//! - `?` matches one character inside a segment
//! - `*` matches zero or more characters inside a single segment
//! - `**` matches zero or more whole segments
//! - `{name}` (URI-template variable, optionally `{name:regex}`) matches like `*`;
//!   the regex part is not evaluated
//!
//! A pattern ending in `/**` also matches its bare prefix, so `/public/**`
//! exempts `/public` as well as everything below it.
//!
//! The whitelist is compiled once at start-up and is read-only afterwards, so a
//! single instance can be shared across every in-flight request.

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

#[derive(Debug, thiserror::Error)]
#[error("invalid whitelist pattern '{pattern}': {source}")]
pub struct WhitelistError {
    pattern: String,
    #[source]
    source: globset::Error,
}

#[derive(Debug, Clone)]
pub struct PathWhitelist {
    patterns: Vec<String>,
    set: GlobSet,
}

impl PathWhitelist {
    pub fn new<I, S>(patterns: I) -> Result<Self, WhitelistError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let mut builder = GlobSetBuilder::new();

        for pattern in &patterns {
            builder.add(compile(pattern)?);

            if let Some(prefix) = pattern.strip_suffix("/**") {
                if !prefix.is_empty() {
                    builder.add(compile(prefix)?);
                }
            }
        }

        let set = builder.build().map_err(|source| WhitelistError {
            pattern: patterns.join(","),
            source,
        })?;

        Ok(Self { patterns, set })
    }

    /// Whether `path` is exempt from authentication.
    ///
    /// An empty path or an empty whitelist is never exempt: an unconfigured
    /// whitelist must not switch authentication off.
    pub fn is_exempt(&self, path: &str) -> bool {
        if path.is_empty() || self.patterns.is_empty() {
            return false;
        }
        self.set.is_match(path)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

fn compile(pattern: &str) -> Result<Glob, WhitelistError> {
    GlobBuilder::new(&template_vars_to_star(pattern))
        .literal_separator(true)
        .backslash_escape(true)
        .build()
        .map_err(|source| WhitelistError {
            pattern: pattern.to_string(),
            source,
        })
}

// `{...}` is a template variable, never a glob alternation. An unclosed brace is
// left alone so the glob compiler reports it.
fn template_vars_to_star(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);

        let mut depth = 0usize;
        let mut close = None;
        for (i, c) in rest[open..].char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(open + i);
                        break;
                    }
                }
                _ => {}
            }
        }

        match close {
            Some(close) => {
                out.push('*');
                rest = &rest[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}
