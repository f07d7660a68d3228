use std::{collections::BTreeMap, path::Path};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretsError {
    #[error("failed to read secrets file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Load `KEY=VALUE` pairs from a secrets env file. Blank lines and lines
/// starting with `#` (leading whitespace allowed) are ignored. These
/// secrets are passed only to the gateway process's environment, never to
/// the task containers it serves.
pub async fn load_secrets_env_file(
    path: &Path,
) -> Result<BTreeMap<String, String>, SecretsError> {
    let contents =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SecretsError::Read {
                path: path.display().to_string(),
                source,
            })?;

    Ok(parse_env_lines(&contents))
}

fn parse_env_lines(contents: &str) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            env.insert(key.trim().to_owned(), value.trim().to_owned());
        }
    }
    env
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_blank_lines() {
        let contents = "\n# a comment\nOPENAI_API_KEY=sk-test\n  # indented comment\nANTHROPIC_API_KEY=sk-ant-test\n";
        let env = parse_env_lines(contents);
        assert_eq!(env.len(), 2);
        assert_eq!(env.get("OPENAI_API_KEY"), Some(&"sk-test".to_owned()));
        assert_eq!(
            env.get("ANTHROPIC_API_KEY"),
            Some(&"sk-ant-test".to_owned())
        );
    }

    #[test]
    fn trims_whitespace_around_key_and_value() {
        let env = parse_env_lines("  FOO = bar  \n");
        assert_eq!(env.get("FOO"), Some(&"bar".to_owned()));
    }

    #[test]
    fn ignores_lines_without_equals() {
        let env = parse_env_lines("not-a-kv-pair\nFOO=bar\n");
        assert_eq!(env.len(), 1);
    }
}
