//! Canonical line compiler.
//!
//! Directive lines have the shape `COMMAND~ARG1~...~ARGN`. Blank and `#`
//! lines are kept in the materialized output as the `##` placeholder so line
//! indices stay stable when the output is compiled again.

use crate::command::{CanonicalCommand, CommandKind, CommandSequence};
use crate::error::{Error, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Token name to literal value. Keys are matched exactly.
pub type ParameterBindings = BTreeMap<String, String>;

/// Placeholder written in place of blank and comment lines.
pub const PLACEHOLDER: &str = "##";

/// Field separator of the canonical line format.
pub const SEPARATOR: char = '~';

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([A-Za-z0-9_]+)\$").expect("token pattern is valid")
});

/// Output of a successful compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledGraph {
    pub sequence: CommandSequence,
    /// Substituted source text, one line per input line. Valid compiler input.
    pub materialized: String,
}

/// Compile canonical text with the given parameter bindings.
///
/// Nothing is returned unless every line compiles.
pub fn compile(text: &str, bindings: &ParameterBindings) -> Result<CompiledGraph> {
    let mut commands = Vec::new();
    let mut materialized = String::with_capacity(text.len());

    for (index, raw) in text.lines().enumerate() {
        if raw.starts_with([' ', '\t']) {
            return Err(Error::Syntax { index });
        }

        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            materialized.push_str(PLACEHOLDER);
            materialized.push('\n');
            continue;
        }

        let line = substitute(line, bindings, index)?;
        let command = parse_directive(&line, index)?;
        commands.push(command);

        materialized.push_str(&line);
        materialized.push('\n');
    }

    tracing::debug!(directives = commands.len(), "compiled graph text");

    Ok(CompiledGraph {
        sequence: CommandSequence::new(commands),
        materialized,
    })
}

/// Replace every `$NAME$` token in one pass. Substituted values are not
/// scanned again.
fn substitute(line: &str, bindings: &ParameterBindings, index: usize) -> Result<String> {
    if let Some(missing) = TOKEN_RE
        .captures_iter(line)
        .map(|caps| caps[1].to_string())
        .find(|token| !bindings.contains_key(token))
    {
        return Err(Error::MissingParameter {
            token: missing,
            index,
        });
    }

    let substituted = TOKEN_RE.replace_all(line, |caps: &Captures<'_>| {
        bindings
            .get(&caps[1])
            .map(String::as_str)
            .unwrap_or_default()
            .to_string()
    });
    Ok(substituted.into_owned())
}

fn parse_directive(line: &str, index: usize) -> Result<CanonicalCommand> {
    let mut fields = line.split(SEPARATOR);
    let name = fields.next().unwrap_or_default().to_string();
    let kind = name
        .parse::<CommandKind>()
        .map_err(|_| Error::UnknownCommand {
            name: name.clone(),
            index,
        })?;

    Ok(CanonicalCommand {
        kind,
        name,
        args: fields.map(str::to_string).collect(),
        line: index,
    })
}

/// Tokens referenced anywhere in the directive lines of `text`.
pub fn referenced_tokens(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| TOKEN_RE.captures_iter(line).map(|caps| caps[1].to_string()))
        .collect();
    tokens.sort();
    tokens.dedup();
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn bindings(pairs: &[(&str, &str)]) -> ParameterBindings {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_compile_directives() {
        let text = "createfilterbyname~Reader~reader_1~b\nsetParams~reader_1~Path~in.mvx~b\n";
        let compiled = compile(text, &ParameterBindings::new()).unwrap();

        assert_eq!(compiled.sequence.len(), 2);
        let first = &compiled.sequence.commands()[0];
        assert_eq!(first.kind, CommandKind::CreateFilterByName);
        assert_eq!(first.args, vec!["Reader", "reader_1", "b"]);
        assert_eq!(compiled.sequence.commands()[1].line, 1);
    }

    #[test]
    fn test_blank_and_comment_lines_become_placeholders() {
        let text = "# header\n\ncreateGraph~g~b\n#attachFilter~g~x~b\n";
        let compiled = compile(text, &ParameterBindings::new()).unwrap();

        assert_eq!(compiled.sequence.len(), 1);
        assert_eq!(compiled.materialized, "##\n##\ncreateGraph~g~b\n##\n");
    }

    #[test]
    fn test_leading_whitespace_is_a_syntax_error() {
        let text = "createGraph~g~b\n  attachFilter~g~x~b\n";
        assert_matches!(
            compile(text, &ParameterBindings::new()),
            Err(Error::Syntax { index: 1 })
        );
        assert_matches!(
            compile("\tcreateGraph~g~b", &ParameterBindings::new()),
            Err(Error::Syntax { index: 0 })
        );
    }

    #[test]
    fn test_substitution() {
        let text = "setParams~reader_1~Path~$INPUT$~b\nsetParams~$SYM$~Gain~$GAIN$~b\n";
        let compiled = compile(
            text,
            &bindings(&[("INPUT", "/data/in.mvx"), ("SYM", "amp_1"), ("GAIN", "3")]),
        )
        .unwrap();

        assert_eq!(
            compiled.materialized,
            "setParams~reader_1~Path~/data/in.mvx~b\nsetParams~amp_1~Gain~3~b\n"
        );
        assert_eq!(compiled.sequence.commands()[1].args[0], "amp_1");
    }

    #[test]
    fn test_missing_binding_names_token() {
        let text = "createGraph~g~b\nsetParams~reader_1~Path~$INPUT$~b\n";
        let err = compile(text, &bindings(&[("OTHER", "x")])).unwrap_err();
        assert_matches!(err, Error::MissingParameter { ref token, index: 1 } if token == "INPUT");
    }

    #[test]
    fn test_tokens_in_comments_are_ignored() {
        let text = "#setParams~x~Path~$INPUT$~b\ncreateGraph~g~b\n";
        assert!(compile(text, &ParameterBindings::new()).is_ok());
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let text = "setParams~x~Path~$A$~b";
        let compiled = compile(text, &bindings(&[("A", "$B$")])).unwrap();
        assert_eq!(compiled.sequence.commands()[0].args[2], "$B$");
    }

    #[test]
    fn test_keys_match_exactly() {
        let text = "setParams~x~Path~$input$~b";
        assert_matches!(
            compile(text, &bindings(&[("INPUT", "a")])),
            Err(Error::MissingParameter { .. })
        );
    }

    #[test]
    fn test_unknown_command() {
        let text = "createGraph~g~b\nwarpGraph~g~b\n";
        assert_matches!(
            compile(text, &ParameterBindings::new()),
            Err(Error::UnknownCommand { ref name, index: 1 }) if name == "warpGraph"
        );
    }

    #[test]
    fn test_trailing_whitespace_is_trimmed() {
        let compiled = compile("createGraph~g~b  \r\n", &ParameterBindings::new()).unwrap();
        assert_eq!(compiled.sequence.commands()[0].args, vec!["g", "b"]);
        assert_eq!(compiled.materialized, "createGraph~g~b\n");
    }

    #[test]
    fn test_referenced_tokens() {
        let text = "setParams~a~P~$X$~b\n#$IGNORED$\nsetParams~$Y$~P~$X$~b\n";
        assert_eq!(referenced_tokens(text), vec!["X", "Y"]);
    }
}
