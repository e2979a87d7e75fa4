//! Rule parsing and representation (SPEC_FULL §4.5 grammar).

use super::lexer::{SpannedToken, Token};
use super::symbols::{resolve_char, resolve_code, resolve_flag, resolve_mod, CodeKind, ModSet};
use crate::error::KeymapError;
use crate::flags::TtyFlags;

#[derive(Debug, Clone, Copy)]
pub struct Precondition {
    pub flag: TtyFlags,
    pub expect_set: bool,
}

#[derive(Debug, Clone)]
pub struct KeyChord {
    pub mods: ModSet,
    pub key: String,
}

#[derive(Debug, Clone)]
pub enum EmitToken {
    Code(CodeKind),
    Char(u8),
    Str(String),
}

#[derive(Debug, Clone)]
pub enum Action {
    Emit(Vec<EmitToken>),
    Copy,
    Paste,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub precond: Option<Precondition>,
    pub pattern: Vec<KeyChord>,
    pub action: Action,
    pub line: usize,
}

/// Split a token stream into per-rule slices, each ending at (and
/// including) a `Semi`. A statement with no terminating `;` before EOF
/// is dropped with an error pointing at its first token's line.
pub fn parse_rules(tokens: &[SpannedToken]) -> (Vec<Rule>, Vec<KeymapError>) {
    let mut rules = Vec::new();
    let mut errors = Vec::new();
    let mut start = 0;
    for (i, tok) in tokens.iter().enumerate() {
        if matches!(tok.token, Token::Semi) {
            match parse_one_rule(&tokens[start..i]) {
                Ok(rule) => rules.push(rule),
                Err(e) => errors.push(e),
            }
            start = i + 1;
        }
    }
    if start < tokens.len() {
        errors.push(KeymapError {
            line: tokens[start].line,
            reason: "statement not terminated by ';'".to_string(),
        });
    }
    (rules, errors)
}

fn parse_one_rule(toks: &[SpannedToken]) -> Result<Rule, KeymapError> {
    if toks.is_empty() {
        return Err(KeymapError { line: 0, reason: "empty statement".to_string() });
    }
    let line = toks[0].line;
    let mut i = 0;

    let precond = if ident_at(toks, i) == Some("flag") {
        i += 1;
        expect(toks, &mut i, &Token::Dot, line)?;
        let name = ident_consume(toks, &mut i, line)?;
        expect(toks, &mut i, &Token::Eq, line)?;
        let value = int_consume(toks, &mut i, line)?;
        let flag = resolve_flag(&name)
            .ok_or_else(|| KeymapError { line, reason: format!("unknown flag '{name}'") })?;
        Some(Precondition { flag, expect_set: value != 0 })
    } else {
        None
    };

    let arrow_pos = toks[i..]
        .iter()
        .position(|t| matches!(t.token, Token::Arrow))
        .map(|p| p + i)
        .ok_or_else(|| KeymapError { line, reason: "missing '->'".to_string() })?;
    if arrow_pos == i {
        return Err(KeymapError { line, reason: "empty key pattern".to_string() });
    }
    let pattern = parse_pattern(&toks[i..arrow_pos], line)?;
    i = arrow_pos + 1;

    let action_kw = ident_consume(toks, &mut i, line)?;
    let action = match action_kw.as_str() {
        "copy" => Action::Copy,
        "paste" => Action::Paste,
        "emit" => Action::Emit(parse_emit_tokens(&toks[i..], line)?),
        other => {
            return Err(KeymapError { line, reason: format!("unknown action '{other}'") });
        }
    };

    Ok(Rule { precond, pattern, action, line })
}

fn parse_pattern(toks: &[SpannedToken], line: usize) -> Result<Vec<KeyChord>, KeymapError> {
    let mut chords = Vec::new();
    let mut mods = ModSet::empty();
    let mut i = 0;
    while i < toks.len() {
        let name = ident_consume(toks, &mut i, line)?;
        if let Some(m) = resolve_mod(&name) {
            mods.insert(m);
            if i < toks.len() && matches!(toks[i].token, Token::Plus) {
                i += 1;
            }
            continue;
        }
        chords.push(KeyChord { mods, key: name });
        mods = ModSet::empty();
    }
    if chords.is_empty() {
        return Err(KeymapError { line, reason: "key pattern has no key".to_string() });
    }
    Ok(chords)
}

fn parse_emit_tokens(toks: &[SpannedToken], line: usize) -> Result<Vec<EmitToken>, KeymapError> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < toks.len() {
        let namespace = ident_consume(toks, &mut i, line)?;
        expect(toks, &mut i, &Token::Dot, line)?;
        match namespace.as_str() {
            "code" => {
                let name = ident_consume(toks, &mut i, line)?;
                let code = resolve_code(&name)
                    .ok_or_else(|| KeymapError { line, reason: format!("unknown code '{name}'") })?;
                out.push(EmitToken::Code(code));
            }
            "char" => {
                let name = ident_consume(toks, &mut i, line)?;
                let base = resolve_char(&name)
                    .ok_or_else(|| KeymapError { line, reason: format!("unknown char '{name}'") })?;
                let mut value = base as i64;
                if i < toks.len() && matches!(toks[i].token, Token::Plus) {
                    i += 1;
                    value += int_consume(toks, &mut i, line)?;
                }
                out.push(EmitToken::Char(value as u8));
            }
            "string" => {
                let s = str_consume(toks, &mut i, line)?;
                out.push(EmitToken::Str(s));
            }
            other => {
                return Err(KeymapError { line, reason: format!("unknown emit namespace '{other}'") });
            }
        }
    }
    if out.is_empty() {
        return Err(KeymapError { line, reason: "emit with no tokens".to_string() });
    }
    Ok(out)
}

fn ident_at<'a>(toks: &'a [SpannedToken], i: usize) -> Option<&'a str> {
    match toks.get(i).map(|t| &t.token) {
        Some(Token::Ident(s)) => Some(s.as_str()),
        _ => None,
    }
}

fn ident_consume(toks: &[SpannedToken], i: &mut usize, line: usize) -> Result<String, KeymapError> {
    match toks.get(*i).map(|t| &t.token) {
        Some(Token::Ident(s)) => {
            *i += 1;
            Ok(s.clone())
        }
        _ => Err(KeymapError { line, reason: "expected identifier".to_string() }),
    }
}

fn int_consume(toks: &[SpannedToken], i: &mut usize, line: usize) -> Result<i64, KeymapError> {
    match toks.get(*i).map(|t| &t.token) {
        Some(Token::Int(v)) => {
            *i += 1;
            Ok(*v)
        }
        _ => Err(KeymapError { line, reason: "expected integer".to_string() }),
    }
}

fn str_consume(toks: &[SpannedToken], i: &mut usize, line: usize) -> Result<String, KeymapError> {
    match toks.get(*i).map(|t| &t.token) {
        Some(Token::Str(s)) => {
            *i += 1;
            Ok(s.clone())
        }
        _ => Err(KeymapError { line, reason: "expected string literal".to_string() }),
    }
}

fn expect(toks: &[SpannedToken], i: &mut usize, want: &Token, line: usize) -> Result<(), KeymapError> {
    if toks.get(*i).map(|t| &t.token) == Some(want) {
        *i += 1;
        Ok(())
    } else {
        Err(KeymapError { line, reason: format!("expected {want:?}") })
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::tokenize;
    use super::*;

    #[test]
    fn parses_preconditioned_emit_rule() {
        let toks = tokenize("flag.app_cursor_keys=1 up -> emit code.SS3 char.SOH+0x40;");
        let (rules, errors) = parse_rules(&toks);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(rules.len(), 1);
        let rule = &rules[0];
        assert!(rule.precond.unwrap().expect_set);
        assert_eq!(rule.pattern.len(), 1);
        assert_eq!(rule.pattern[0].key, "up");
        match &rule.action {
            Action::Emit(tokens) => {
                assert_eq!(tokens.len(), 2);
                assert!(matches!(tokens[0], EmitToken::Code(CodeKind::Ss3)));
                assert!(matches!(tokens[1], EmitToken::Char(0x41)));
            }
            _ => panic!("expected emit action"),
        }
    }

    #[test]
    fn parses_unconditioned_rule_with_modifier() {
        let toks = tokenize("control+c -> copy;");
        let (rules, errors) = parse_rules(&toks);
        assert!(errors.is_empty());
        assert_eq!(rules[0].pattern[0].mods, ModSet::CONTROL);
        assert_eq!(rules[0].pattern[0].key, "c");
        assert!(matches!(rules[0].action, Action::Copy));
    }

    #[test]
    fn unknown_flag_is_reported_and_rule_skipped() {
        let toks = tokenize("flag.nonexistent=1 up -> copy;");
        let (rules, errors) = parse_rules(&toks);
        assert!(rules.is_empty());
        assert_eq!(errors.len(), 1);
    }
}
