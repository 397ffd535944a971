//! Requirement parsing: `name[extras] (spec); marker` lines, environment
//! marker evaluation, and requirements-file iteration.
//!
//! This intentionally covers the subset of PEP 508 that wheel metadata and
//! lock files actually use. Version specifiers are carried as opaque strings;
//! only markers are evaluated.

use crate::naming::canonicalize;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequirementError {
    #[error("Invalid requirement '{line}': {reason}")]
    InvalidRequirement { line: String, reason: String },

    #[error("Invalid marker '{marker}': {reason}")]
    InvalidMarker { marker: String, reason: String },

    #[error("Failed to read requirements file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Circular include of requirements file {0}")]
    CircularInclude(PathBuf),
}

/// One parsed requirement.
#[derive(Debug, Clone, PartialEq)]
pub struct Requirement {
    /// Name exactly as written.
    pub name: String,
    /// Canonical (PEP 503) form of the name.
    pub canonical_name: String,
    /// Requested extras, in written order.
    pub extras: Vec<String>,
    /// Version specifier, verbatim (`>=2.8.1,!=2.9`), if any.
    pub specifier: Option<String>,
    /// Direct URL reference (`name @ url`), if any.
    pub url: Option<String>,
    /// Environment marker, if any.
    pub marker: Option<Marker>,
}

impl Requirement {
    /// Parses a single requirement line.
    pub fn parse(line: &str) -> Result<Self, RequirementError> {
        let invalid = |reason: &str| RequirementError::InvalidRequirement {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let (spec_part, marker_part) = match line.split_once(';') {
            Some((left, right)) => (left, Some(right)),
            None => (line, None),
        };

        let name_re = Regex::new(r"^\s*([0-9A-Za-z][0-9A-Za-z_.\-]*)").expect("valid regex");
        let caps = name_re
            .captures(spec_part)
            .ok_or_else(|| invalid("missing distribution name"))?;
        let name = caps[1].to_string();
        let mut rest = spec_part[caps.get(0).map_or(0, |m| m.end())..].trim_start();

        let mut extras = Vec::new();
        if let Some(stripped) = rest.strip_prefix('[') {
            let close = stripped
                .find(']')
                .ok_or_else(|| invalid("unterminated extras bracket"))?;
            for extra in stripped[..close].split(',') {
                let extra = extra.trim();
                if !extra.is_empty() {
                    extras.push(extra.to_string());
                }
            }
            rest = stripped[close + 1..].trim_start();
        }

        let mut specifier = None;
        let mut url = None;
        if let Some(stripped) = rest.strip_prefix('@') {
            let trimmed = stripped.trim();
            if trimmed.is_empty() {
                return Err(invalid("missing URL after '@'"));
            }
            url = Some(trimmed.to_string());
        } else if !rest.trim().is_empty() {
            let mut spec = rest.trim();
            if spec.starts_with('(') && spec.ends_with(')') {
                spec = spec[1..spec.len() - 1].trim();
            }
            if !spec.is_empty() {
                if !spec.starts_with(['<', '>', '=', '!', '~']) {
                    return Err(invalid("expected version specifier"));
                }
                specifier = Some(spec.to_string());
            }
        }

        let marker = match marker_part {
            Some(text) if !text.trim().is_empty() => Some(Marker::parse(text)?),
            _ => None,
        };

        Ok(Self {
            canonical_name: canonicalize(&name),
            name,
            extras,
            specifier,
            url,
            marker,
        })
    }

    /// Whether this requirement applies for the given environment and
    /// requested extras.
    ///
    /// A marker mentioning `extra` holds when it evaluates true for at least
    /// one requested extra; markers are also tried with `extra` unset so
    /// unconditional clauses still apply when no extras were requested.
    pub fn evaluate(&self, env: &MarkerEnvironment, extras: &BTreeSet<String>) -> bool {
        let marker = match &self.marker {
            Some(marker) => marker,
            None => return true,
        };

        if marker.evaluate(&env.with_extra(None)) {
            return true;
        }

        extras
            .iter()
            .any(|extra| marker.evaluate(&env.with_extra(Some(extra))))
    }
}

/// Fast path used when scanning lock-file lines for extras: returns the
/// canonical name and extras set when the line names extras, else `None`.
pub fn parse_requirement_extras(line: &str) -> Option<(String, BTreeSet<String>)> {
    let re = Regex::new(
        r"^\s*([0-9A-Za-z][0-9A-Za-z_.\-]*)\s*\[\s*([0-9A-Za-z][0-9A-Za-z_.\-]*(?:\s*,\s*[0-9A-Za-z][0-9A-Za-z_.\-]*)*)\s*\]",
    )
    .expect("valid regex");

    let caps = re.captures(line)?;
    let name = canonicalize(&caps[1]);
    let extras = caps[2]
        .split(',')
        .map(|extra| extra.trim().to_string())
        .collect();

    Some((name, extras))
}

/// Marker comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

/// One side of a marker comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerValue {
    /// Environment variable (`python_version`, `extra`, ...).
    Variable(String),
    /// Quoted string literal.
    Literal(String),
}

/// Parsed marker expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Marker {
    And(Box<Marker>, Box<Marker>),
    Or(Box<Marker>, Box<Marker>),
    Compare {
        lhs: MarkerValue,
        op: MarkerOp,
        rhs: MarkerValue,
    },
}

impl Marker {
    pub fn parse(text: &str) -> Result<Self, RequirementError> {
        let tokens = tokenize_marker(text)?;
        let mut parser = MarkerParser {
            text,
            tokens,
            pos: 0,
        };
        let marker = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(parser.error("trailing tokens after expression"));
        }
        Ok(marker)
    }

    pub fn evaluate(&self, env: &MarkerEnvironment) -> bool {
        match self {
            Marker::And(left, right) => left.evaluate(env) && right.evaluate(env),
            Marker::Or(left, right) => left.evaluate(env) || right.evaluate(env),
            Marker::Compare { lhs, op, rhs } => {
                let left = env.resolve(lhs);
                let right = env.resolve(rhs);
                compare_values(&left, *op, &right)
            }
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        if let Some(url) = &self.url {
            write!(f, " @ {}", url)?;
        } else if let Some(spec) = &self.specifier {
            write!(f, "{}", spec)?;
        }
        if let Some(marker) = &self.marker {
            write!(f, " ; {}", marker)?;
        }
        Ok(())
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `or` binds looser than `and`; parenthesize it when nested inside.
        fn and_operand(f: &mut fmt::Formatter<'_>, marker: &Marker) -> fmt::Result {
            match marker {
                Marker::Or(..) => write!(f, "({})", marker),
                _ => write!(f, "{}", marker),
            }
        }

        match self {
            Marker::And(left, right) => {
                and_operand(f, left)?;
                write!(f, " and ")?;
                and_operand(f, right)
            }
            Marker::Or(left, right) => write!(f, "{} or {}", left, right),
            Marker::Compare { lhs, op, rhs } => write!(f, "{} {} {}", lhs, op, rhs),
        }
    }
}

impl fmt::Display for MarkerOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MarkerOp::Eq => "==",
            MarkerOp::Ne => "!=",
            MarkerOp::Lt => "<",
            MarkerOp::Le => "<=",
            MarkerOp::Gt => ">",
            MarkerOp::Ge => ">=",
            MarkerOp::In => "in",
            MarkerOp::NotIn => "not in",
        };
        f.write_str(text)
    }
}

impl fmt::Display for MarkerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerValue::Variable(name) => f.write_str(name),
            MarkerValue::Literal(text) => write!(f, "\"{}\"", text),
        }
    }
}

/// Compares marker operands, numerically when both sides look like dotted
/// version numbers (so `"3.10" >= "3.7"` holds) and lexicographically
/// otherwise.
fn compare_values(left: &str, op: MarkerOp, right: &str) -> bool {
    match op {
        MarkerOp::In => right.contains(left),
        MarkerOp::NotIn => !right.contains(left),
        _ => {
            let ordering = match (parse_version_tuple(left), parse_version_tuple(right)) {
                (Some(l), Some(r)) => compare_version_tuples(&l, &r),
                _ => left.cmp(right),
            };
            match op {
                MarkerOp::Eq => ordering.is_eq(),
                MarkerOp::Ne => ordering.is_ne(),
                MarkerOp::Lt => ordering.is_lt(),
                MarkerOp::Le => ordering.is_le(),
                MarkerOp::Gt => ordering.is_gt(),
                MarkerOp::Ge => ordering.is_ge(),
                MarkerOp::In | MarkerOp::NotIn => unreachable!(),
            }
        }
    }
}

fn parse_version_tuple(value: &str) -> Option<Vec<u64>> {
    if value.is_empty() {
        return None;
    }
    value
        .split('.')
        .map(|segment| segment.parse::<u64>().ok())
        .collect()
}

fn compare_version_tuples(left: &[u64], right: &[u64]) -> std::cmp::Ordering {
    let len = left.len().max(right.len());
    for i in 0..len {
        let l = left.get(i).copied().unwrap_or(0);
        let r = right.get(i).copied().unwrap_or(0);
        match l.cmp(&r) {
            std::cmp::Ordering::Equal => continue,
            other => return other,
        }
    }
    std::cmp::Ordering::Equal
}

#[derive(Debug, Clone, PartialEq)]
enum MarkerToken {
    Ident(String),
    Literal(String),
    Op(MarkerOp),
    And,
    Or,
    LParen,
    RParen,
}

fn tokenize_marker(text: &str) -> Result<Vec<MarkerToken>, RequirementError> {
    let error = |reason: &str| RequirementError::InvalidMarker {
        marker: text.to_string(),
        reason: reason.to_string(),
    };

    let mut tokens = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => i += 1,
            '(' => {
                tokens.push(MarkerToken::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(MarkerToken::RParen);
                i += 1;
            }
            '\'' | '"' => {
                let quote = c;
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end] != quote {
                    end += 1;
                }
                if end == chars.len() {
                    return Err(error("unterminated string literal"));
                }
                tokens.push(MarkerToken::Literal(chars[start..end].iter().collect()));
                i = end + 1;
            }
            '=' | '!' | '<' | '>' | '~' => {
                let two: String = chars[i..chars.len().min(i + 2)].iter().collect();
                let (op, len) = match two.as_str() {
                    "==" => (MarkerOp::Eq, 2),
                    "!=" => (MarkerOp::Ne, 2),
                    "<=" => (MarkerOp::Le, 2),
                    ">=" => (MarkerOp::Ge, 2),
                    _ if c == '<' => (MarkerOp::Lt, 1),
                    _ if c == '>' => (MarkerOp::Gt, 1),
                    _ => return Err(error(&format!("unsupported operator starting at '{}'", c))),
                };
                tokens.push(MarkerToken::Op(op));
                i += len;
            }
            _ if c.is_alphanumeric() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.')
                {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                match word.as_str() {
                    "and" => tokens.push(MarkerToken::And),
                    "or" => tokens.push(MarkerToken::Or),
                    "in" => tokens.push(MarkerToken::Op(MarkerOp::In)),
                    "not" => {
                        // Only `not in` is valid; consume the following `in`.
                        let mut j = i;
                        while j < chars.len() && chars[j].is_whitespace() {
                            j += 1;
                        }
                        let followed_by_in = chars[j..].starts_with(&['i', 'n'])
                            && chars
                                .get(j + 2)
                                .map_or(true, |c| !c.is_alphanumeric() && *c != '_');
                        if followed_by_in {
                            tokens.push(MarkerToken::Op(MarkerOp::NotIn));
                            i = j + 2;
                        } else {
                            return Err(error("'not' must be followed by 'in'"));
                        }
                    }
                    _ => tokens.push(MarkerToken::Ident(word)),
                }
            }
            _ => return Err(error(&format!("unexpected character '{}'", c))),
        }
    }

    Ok(tokens)
}

struct MarkerParser<'a> {
    text: &'a str,
    tokens: Vec<MarkerToken>,
    pos: usize,
}

impl<'a> MarkerParser<'a> {
    fn error(&self, reason: &str) -> RequirementError {
        RequirementError::InvalidMarker {
            marker: self.text.to_string(),
            reason: reason.to_string(),
        }
    }

    fn peek(&self) -> Option<&MarkerToken> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<MarkerToken> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Result<Marker, RequirementError> {
        let mut left = self.parse_and()?;
        while matches!(self.peek(), Some(MarkerToken::Or)) {
            self.advance();
            let right = self.parse_and()?;
            left = Marker::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Marker, RequirementError> {
        let mut left = self.parse_atom()?;
        while matches!(self.peek(), Some(MarkerToken::And)) {
            self.advance();
            let right = self.parse_atom()?;
            left = Marker::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_atom(&mut self) -> Result<Marker, RequirementError> {
        if matches!(self.peek(), Some(MarkerToken::LParen)) {
            self.advance();
            let inner = self.parse_or()?;
            match self.advance() {
                Some(MarkerToken::RParen) => return Ok(inner),
                _ => return Err(self.error("missing closing parenthesis")),
            }
        }

        let lhs = self.parse_value()?;
        let op = match self.advance() {
            Some(MarkerToken::Op(op)) => op,
            _ => return Err(self.error("expected comparison operator")),
        };
        let rhs = self.parse_value()?;

        Ok(Marker::Compare { lhs, op, rhs })
    }

    fn parse_value(&mut self) -> Result<MarkerValue, RequirementError> {
        match self.advance() {
            Some(MarkerToken::Ident(name)) => Ok(MarkerValue::Variable(name)),
            Some(MarkerToken::Literal(value)) => Ok(MarkerValue::Literal(value)),
            _ => Err(self.error("expected variable or string literal")),
        }
    }
}

/// Values the marker evaluator resolves environment variables against.
#[derive(Debug, Clone)]
pub struct MarkerEnvironment {
    pub python_version: String,
    pub python_full_version: String,
    pub sys_platform: String,
    pub os_name: String,
    pub platform_machine: String,
    pub platform_system: String,
    pub implementation_name: String,
    pub extra: Option<String>,
}

impl Default for MarkerEnvironment {
    fn default() -> Self {
        Self {
            python_version: "3.11".to_string(),
            python_full_version: "3.11.0".to_string(),
            sys_platform: "linux".to_string(),
            os_name: "posix".to_string(),
            platform_machine: "x86_64".to_string(),
            platform_system: "Linux".to_string(),
            implementation_name: "cpython".to_string(),
            extra: None,
        }
    }
}

impl MarkerEnvironment {
    /// Copy of this environment with `extra` replaced.
    pub fn with_extra(&self, extra: Option<&str>) -> Self {
        Self {
            extra: extra.map(str::to_string),
            ..self.clone()
        }
    }

    fn resolve(&self, value: &MarkerValue) -> String {
        match value {
            MarkerValue::Literal(s) => s.clone(),
            MarkerValue::Variable(name) => match name.as_str() {
                "python_version" => self.python_version.clone(),
                "python_full_version" => self.python_full_version.clone(),
                "sys_platform" => self.sys_platform.clone(),
                "os_name" => self.os_name.clone(),
                "platform_machine" => self.platform_machine.clone(),
                "platform_system" => self.platform_system.clone(),
                "implementation_name" => self.implementation_name.clone(),
                "extra" => self.extra.clone().unwrap_or_default(),
                _ => String::new(),
            },
        }
    }
}

/// One requirement from a requirements file, with its source line and any
/// per-requirement options (`--hash=...`).
#[derive(Debug, Clone)]
pub struct RequirementLine {
    pub requirement: Requirement,
    pub line: String,
    pub options: Vec<String>,
}

/// A fully iterated requirements file: parsed requirement lines plus the
/// non-requirement option lines, carried through verbatim.
#[derive(Debug, Clone, Default)]
pub struct RequirementsFile {
    pub requirements: Vec<RequirementLine>,
    pub pass_through_args: Vec<String>,
}

impl RequirementsFile {
    /// Reads and parses a requirements file, following `-r`/`-c` includes
    /// relative to the including file.
    pub fn parse(path: &Path) -> Result<Self, RequirementError> {
        let mut file = Self::default();
        let mut visited = HashSet::new();
        file.parse_into(path, &mut visited)?;
        Ok(file)
    }

    fn parse_into(
        &mut self,
        path: &Path,
        visited: &mut HashSet<PathBuf>,
    ) -> Result<(), RequirementError> {
        let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if !visited.insert(resolved.clone()) {
            return Err(RequirementError::CircularInclude(resolved));
        }

        let content = fs::read_to_string(path).map_err(|source| RequirementError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let comment_re = Regex::new(r"(^|\s)#.*$").expect("valid regex");
        let mut pending = String::new();

        for raw_line in content.lines() {
            let stripped = comment_re.replace(raw_line, "");
            let stripped = stripped.trim_end();

            if let Some(continued) = stripped.strip_suffix('\\') {
                pending.push_str(continued);
                continue;
            }

            pending.push_str(stripped);
            let logical = std::mem::take(&mut pending);
            let logical = logical.trim();
            if logical.is_empty() {
                continue;
            }

            self.parse_logical_line(logical, path, visited)?;
        }

        Ok(())
    }

    fn parse_logical_line(
        &mut self,
        line: &str,
        source: &Path,
        visited: &mut HashSet<PathBuf>,
    ) -> Result<(), RequirementError> {
        if line.starts_with('-') {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let (flag, inline_value) = match tokens[0].split_once('=') {
                Some((flag, value)) => (flag, Some(value)),
                None => (tokens[0], None),
            };

            if matches!(flag, "-r" | "--requirement" | "-c" | "--constraint") {
                let target = inline_value
                    .or_else(|| tokens.get(1).copied())
                    .ok_or_else(|| RequirementError::InvalidRequirement {
                        line: line.to_string(),
                        reason: format!("{} needs a file argument", flag),
                    })?;
                let base = source.parent().unwrap_or_else(|| Path::new("."));
                return self.parse_into(&base.join(target), visited);
            }

            self.pass_through_args
                .extend(tokens.iter().map(|t| t.to_string()));
            return Ok(());
        }

        let (spec, options) = match line.find(" --") {
            Some(idx) => {
                let options = line[idx..]
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
                (&line[..idx], options)
            }
            None => (line, Vec::new()),
        };

        let requirement = Requirement::parse(spec)?;
        self.requirements.push(RequirementLine {
            requirement,
            line: line.to_string(),
            options,
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn env() -> MarkerEnvironment {
        MarkerEnvironment::default()
    }

    #[test]
    fn test_parse_bare_name() {
        let req = Requirement::parse("requests").unwrap();
        assert_eq!(req.name, "requests");
        assert_eq!(req.canonical_name, "requests");
        assert!(req.extras.is_empty());
        assert!(req.specifier.is_none());
        assert!(req.marker.is_none());
    }

    #[test]
    fn test_parse_name_is_canonicalized() {
        let req = Requirement::parse("Zope.Interface>=5.0").unwrap();
        assert_eq!(req.name, "Zope.Interface");
        assert_eq!(req.canonical_name, "zope-interface");
        assert_eq!(req.specifier.as_deref(), Some(">=5.0"));
    }

    #[test]
    fn test_parse_extras() {
        let req = Requirement::parse("requests[security,socks]==2.28.1").unwrap();
        assert_eq!(req.extras, vec!["security", "socks"]);
        assert_eq!(req.specifier.as_deref(), Some("==2.28.1"));
    }

    #[test]
    fn test_parse_parenthesized_specifier() {
        let req = Requirement::parse("mock (>=1.0.1,<2.0)").unwrap();
        assert_eq!(req.specifier.as_deref(), Some(">=1.0.1,<2.0"));
    }

    #[test]
    fn test_parse_url_requirement() {
        let req = Requirement::parse("pip @ https://example.com/pip-22.0.tar.gz").unwrap();
        assert_eq!(req.url.as_deref(), Some("https://example.com/pip-22.0.tar.gz"));
        assert!(req.specifier.is_none());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Requirement::parse("").is_err());
        assert!(Requirement::parse("[extra]").is_err());
        assert!(Requirement::parse("name junk").is_err());
    }

    #[test]
    fn test_marker_python_version_numeric_compare() {
        let req = Requirement::parse("tomli; python_version < '3.11'").unwrap();
        let mut environment = env();
        environment.python_version = "3.10".to_string();
        assert!(req.evaluate(&environment, &BTreeSet::new()));

        environment.python_version = "3.11".to_string();
        assert!(!req.evaluate(&environment, &BTreeSet::new()));
    }

    #[test]
    fn test_marker_numeric_compare_beats_lexicographic() {
        // "3.10" < "3.7" lexicographically; must compare numerically.
        let marker = Marker::parse("python_version >= '3.7'").unwrap();
        let mut environment = env();
        environment.python_version = "3.10".to_string();
        assert!(marker.evaluate(&environment));
    }

    #[test]
    fn test_marker_string_compare() {
        let marker = Marker::parse("sys_platform == 'linux'").unwrap();
        assert!(marker.evaluate(&env()));

        let marker = Marker::parse("sys_platform != 'win32'").unwrap();
        assert!(marker.evaluate(&env()));
    }

    #[test]
    fn test_marker_in_operator() {
        let marker = Marker::parse("'linux' in sys_platform").unwrap();
        assert!(marker.evaluate(&env()));

        let marker = Marker::parse("platform_machine not in 'aarch64 arm64'").unwrap();
        assert!(marker.evaluate(&env()));
    }

    #[test]
    fn test_marker_and_or_parens() {
        let marker =
            Marker::parse("(sys_platform == 'win32' or sys_platform == 'linux') and python_version >= '3.8'")
                .unwrap();
        assert!(marker.evaluate(&env()));

        let marker =
            Marker::parse("sys_platform == 'win32' or sys_platform == 'darwin'").unwrap();
        assert!(!marker.evaluate(&env()));
    }

    #[test]
    fn test_marker_extra_evaluation() {
        let req = Requirement::parse("coverage; extra == 'toml'").unwrap();

        let mut extras = BTreeSet::new();
        assert!(!req.evaluate(&env(), &extras));

        extras.insert("toml".to_string());
        assert!(req.evaluate(&env(), &extras));
    }

    #[test]
    fn test_marker_unknown_variable_is_empty() {
        let marker = Marker::parse("platform_release == ''").unwrap();
        assert!(marker.evaluate(&env()));
    }

    #[test]
    fn test_marker_parse_errors() {
        assert!(Marker::parse("python_version ~= '3.8'").is_err());
        assert!(Marker::parse("python_version ==").is_err());
        assert!(Marker::parse("(sys_platform == 'linux'").is_err());
        assert!(Marker::parse("not sys_platform").is_err());
    }

    #[test]
    fn test_parse_requirement_extras_basic() {
        let (name, extras) = parse_requirement_extras("requests[security]").unwrap();
        assert_eq!(name, "requests");
        assert_eq!(extras, BTreeSet::from(["security".to_string()]));
    }

    #[test]
    fn test_parse_requirement_extras_with_spacing_and_version() {
        let (name, extras) =
            parse_requirement_extras(" Requests [ security , socks ] >= 2.8.1 ").unwrap();
        assert_eq!(name, "requests");
        assert_eq!(
            extras,
            BTreeSet::from(["security".to_string(), "socks".to_string()])
        );
    }

    #[test]
    fn test_parse_requirement_extras_none_without_brackets() {
        assert!(parse_requirement_extras("requests==2.28.1").is_none());
        assert!(parse_requirement_extras("").is_none());
    }

    #[test]
    fn test_requirements_file_basic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("requirements.txt");
        fs::write(
            &path,
            "# locked\nrequests==2.28.1 \\\n    --hash=sha256:abc123\n\n--no-binary :all:\nboto3[crt]>=1.26\n",
        )
        .unwrap();

        let file = RequirementsFile::parse(&path).unwrap();
        assert_eq!(file.requirements.len(), 2);
        assert_eq!(file.requirements[0].requirement.name, "requests");
        assert_eq!(
            file.requirements[0].options,
            vec!["--hash=sha256:abc123".to_string()]
        );
        assert_eq!(file.requirements[1].requirement.extras, vec!["crt"]);
        assert_eq!(
            file.pass_through_args,
            vec!["--no-binary".to_string(), ":all:".to_string()]
        );
    }

    #[test]
    fn test_requirements_file_includes() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("base.txt");
        let main = dir.path().join("requirements.txt");
        fs::write(&base, "six==1.16.0\n").unwrap();
        fs::write(&main, "-r base.txt\nattrs==22.1.0\n").unwrap();

        let file = RequirementsFile::parse(&main).unwrap();
        let names: Vec<&str> = file
            .requirements
            .iter()
            .map(|r| r.requirement.name.as_str())
            .collect();
        assert_eq!(names, vec!["six", "attrs"]);
    }

    #[test]
    fn test_requirements_file_circular_include() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("requirements.txt");
        fs::write(&path, "-r requirements.txt\n").unwrap();

        let result = RequirementsFile::parse(&path);
        assert!(matches!(
            result,
            Err(RequirementError::CircularInclude(_))
        ));
    }

    #[test]
    fn test_requirements_file_missing() {
        let result = RequirementsFile::parse(Path::new("/nonexistent/requirements.txt"));
        assert!(matches!(result, Err(RequirementError::FileRead { .. })));
    }

    #[test]
    fn test_requirement_display_round_trip() {
        for line in [
            "requests",
            "requests[security,socks]>=2.8.1,!=2.9",
            "pip @ https://github.com/pypa/pip/archive/22.0.2.zip",
            "tomli>=1.1.0 ; python_version < \"3.11\"",
            "pytest ; extra == \"test\" and sys_platform != \"win32\"",
        ] {
            let parsed = Requirement::parse(line).unwrap();
            let rendered = parsed.to_string();
            let reparsed = Requirement::parse(&rendered).unwrap();
            assert_eq!(parsed, reparsed, "unstable rendering for {}", line);
        }
    }

    #[test]
    fn test_marker_display_parenthesizes_or_inside_and() {
        let marker =
            Marker::parse("python_version >= \"3.8\" and (sys_platform == \"linux\" or os_name == \"posix\")")
                .unwrap();
        assert_eq!(
            marker.to_string(),
            "python_version >= \"3.8\" and (sys_platform == \"linux\" or os_name == \"posix\")"
        );
    }
}
