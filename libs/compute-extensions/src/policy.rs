// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Rule-based policy engine
//!
//! Policies map action names (e.g. `compute_extension:v3:<alias>`) to rule
//! expressions:
//!
//! - `""` or `"@"` always passes, `"!"` never passes
//! - `role:<name>` passes when the caller holds the role
//! - `is_admin:True` / `is_admin:False` tests the admin flag
//! - `project_id:%(project_id)s`, `user_id:%(user_id)s` compare a caller
//!   credential against a value substituted from the target
//! - `rule:<name>` evaluates another named rule
//!
//! Checks combine with `not`, `and`, `or` and parentheses, with the usual
//! precedence (`not` binds tightest, `or` loosest).

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::context::ComputeContext;
use crate::error::PolicyError;

/// Rule applied to actions that have no rule of their own
pub const DEFAULT_RULE: &str = "default";

const MAX_RULE_DEPTH: usize = 32;

/// Values a rule may substitute through `%(key)s`
pub type PolicyTarget = BTreeMap<String, String>;

/// Build the standard target for a caller: its own project and user
pub fn caller_target(ctx: &ComputeContext) -> PolicyTarget {
    let mut target = PolicyTarget::new();
    target.insert("project_id".to_string(), ctx.project_id.clone());
    target.insert("user_id".to_string(), ctx.user_id.clone());
    target
}

/// Anything able to decide whether a caller may perform an action
pub trait PolicyCheck: Send + Sync {
    /// `Ok(false)` is a normal denial. `Err` means no decision was possible.
    fn check(
        &self,
        ctx: &ComputeContext,
        action: &str,
        target: &PolicyTarget,
    ) -> Result<bool, PolicyError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Rule {
    Allow,
    Deny,
    Role(String),
    IsAdmin(bool),
    Credential { field: Credential, template: String },
    Reference(String),
    Not(Box<Rule>),
    And(Vec<Rule>),
    Or(Vec<Rule>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Credential {
    ProjectId,
    UserId,
}

/// Parsed set of policy rules
#[derive(Clone, Debug)]
pub struct Policy {
    rules: HashMap<String, Rule>,
}

impl Policy {
    /// Parse a policy from `(action, expression)` pairs
    pub fn from_rules<I, K, V>(rules: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let rules = rules
            .into_iter()
            .map(|(name, expr)| -> Result<(String, Rule), PolicyError> {
                Ok((name.into(), parse_rule(expr.as_ref())?))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(Self { rules })
    }

    /// Parse a JSON policy document (`{"action": "expression", ...}`)
    pub fn from_json(document: &str) -> Result<Self, PolicyError> {
        let raw: BTreeMap<String, String> =
            serde_json::from_str(document).map_err(|e| PolicyError::Load(e.to_string()))?;
        Self::from_rules(raw)
    }

    /// Load a JSON policy document from disk
    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        let document = std::fs::read_to_string(path)
            .map_err(|e| PolicyError::Load(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&document)
    }

    /// Built-in rules used when no policy file is configured
    pub fn defaults() -> Self {
        let mut rules = HashMap::new();
        rules.insert(
            DEFAULT_RULE.to_string(),
            Rule::Reference("admin_or_owner".to_string()),
        );
        rules.insert(
            "admin_or_owner".to_string(),
            Rule::Or(vec![
                Rule::IsAdmin(true),
                Rule::Credential {
                    field: Credential::ProjectId,
                    template: "%(project_id)s".to_string(),
                },
            ]),
        );
        rules.insert("admin_api".to_string(), Rule::IsAdmin(true));
        rules.insert(
            "compute_extension:v3:os-extended-availability-zone".to_string(),
            Rule::Allow,
        );
        Self { rules }
    }

    pub fn contains(&self, action: &str) -> bool {
        self.rules.contains_key(action)
    }

    fn evaluate(
        &self,
        rule: &Rule,
        ctx: &ComputeContext,
        target: &PolicyTarget,
        depth: usize,
    ) -> Result<bool, PolicyError> {
        Ok(match rule {
            Rule::Allow => true,
            Rule::Deny => false,
            Rule::Role(role) => ctx.has_role(role),
            Rule::IsAdmin(expected) => ctx.is_admin == *expected,
            Rule::Credential { field, template } => {
                let Some(expected) = substitute(template, target) else {
                    return Ok(false);
                };
                match field {
                    Credential::ProjectId => ctx.project_id == expected,
                    Credential::UserId => ctx.user_id == expected,
                }
            }
            Rule::Reference(name) => {
                if depth >= MAX_RULE_DEPTH {
                    return Err(PolicyError::RecursionLimit(name.clone()));
                }
                let next = self
                    .rules
                    .get(name)
                    .ok_or_else(|| PolicyError::UnknownRule(name.clone()))?;
                self.evaluate(next, ctx, target, depth + 1)?
            }
            Rule::Not(inner) => !self.evaluate(inner, ctx, target, depth)?,
            Rule::And(rules) => {
                for r in rules {
                    if !self.evaluate(r, ctx, target, depth)? {
                        return Ok(false);
                    }
                }
                true
            }
            Rule::Or(rules) => {
                for r in rules {
                    if self.evaluate(r, ctx, target, depth)? {
                        return Ok(true);
                    }
                }
                false
            }
        })
    }
}

impl PolicyCheck for Policy {
    fn check(
        &self,
        ctx: &ComputeContext,
        action: &str,
        target: &PolicyTarget,
    ) -> Result<bool, PolicyError> {
        match self.rules.get(action) {
            Some(rule) => self.evaluate(rule, ctx, target, 0),
            None => match self.rules.get(DEFAULT_RULE) {
                Some(rule) => self.evaluate(rule, ctx, target, 0),
                None => Ok(false),
            },
        }
    }
}

/// Replace a whole-value `%(key)s` template with the target's value
fn substitute(template: &str, target: &PolicyTarget) -> Option<String> {
    match template
        .strip_prefix("%(")
        .and_then(|rest| rest.strip_suffix(")s"))
    {
        Some(key) => target.get(key).cloned(),
        None => Some(template.to_string()),
    }
}

fn parse_rule(expr: &str) -> Result<Rule, PolicyError> {
    let spaced = expr.replace('(', " ( ").replace(')', " ) ");
    // `%(project_id)s` must survive the paren split above
    let tokens = rejoin_templates(spaced.split_whitespace().collect());
    if tokens.is_empty() {
        return Ok(Rule::Allow);
    }
    let mut parser = Parser {
        expr,
        tokens,
        pos: 0,
    };
    let rule = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(parser.invalid("unexpected trailing tokens"));
    }
    Ok(rule)
}

/// Undo the paren split for `%(key)s` substitution templates
fn rejoin_templates(raw: Vec<&str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let tok = raw[i];
        if tok.ends_with('%') && i + 3 < raw.len() && raw[i + 1] == "(" && raw[i + 3] == ")" {
            let suffix = raw.get(i + 4).copied().unwrap_or("");
            if suffix.starts_with('s') {
                out.push(format!("{}({}){}", tok, raw[i + 2], suffix));
                i += 5;
                continue;
            }
        }
        out.push(tok.to_string());
        i += 1;
    }
    out
}

struct Parser<'a> {
    expr: &'a str,
    tokens: Vec<String>,
    pos: usize,
}

impl Parser<'_> {
    fn invalid(&self, reason: &str) -> PolicyError {
        PolicyError::InvalidRule {
            rule: self.expr.to_string(),
            reason: reason.to_string(),
        }
    }

    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn parse_or(&mut self) -> Result<Rule, PolicyError> {
        let mut rules = vec![self.parse_and()?];
        while self.peek() == Some("or") {
            self.pos += 1;
            rules.push(self.parse_and()?);
        }
        Ok(if rules.len() == 1 {
            rules.remove(0)
        } else {
            Rule::Or(rules)
        })
    }

    fn parse_and(&mut self) -> Result<Rule, PolicyError> {
        let mut rules = vec![self.parse_not()?];
        while self.peek() == Some("and") {
            self.pos += 1;
            rules.push(self.parse_not()?);
        }
        Ok(if rules.len() == 1 {
            rules.remove(0)
        } else {
            Rule::And(rules)
        })
    }

    fn parse_not(&mut self) -> Result<Rule, PolicyError> {
        if self.peek() == Some("not") {
            self.pos += 1;
            return Ok(Rule::Not(Box::new(self.parse_not()?)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Rule, PolicyError> {
        let Some(tok) = self.peek().map(str::to_string) else {
            return Err(self.invalid("expected a check"));
        };
        self.pos += 1;
        match tok.as_str() {
            "(" => {
                let inner = self.parse_or()?;
                if self.peek() != Some(")") {
                    return Err(self.invalid("unbalanced parenthesis"));
                }
                self.pos += 1;
                Ok(inner)
            }
            ")" | "and" | "or" => Err(self.invalid(&format!("unexpected '{}'", tok))),
            "@" => Ok(Rule::Allow),
            "!" => Ok(Rule::Deny),
            _ => self.parse_check(&tok),
        }
    }

    fn parse_check(&self, tok: &str) -> Result<Rule, PolicyError> {
        let Some((kind, value)) = tok.split_once(':') else {
            return Err(self.invalid(&format!("'{}' is not a kind:match check", tok)));
        };
        match kind {
            "role" => Ok(Rule::Role(value.to_string())),
            "rule" => Ok(Rule::Reference(value.to_string())),
            "is_admin" => match value.to_ascii_lowercase().as_str() {
                "true" => Ok(Rule::IsAdmin(true)),
                "false" => Ok(Rule::IsAdmin(false)),
                _ => Err(self.invalid("is_admin expects True or False")),
            },
            "project_id" => Ok(Rule::Credential {
                field: Credential::ProjectId,
                template: value.to_string(),
            }),
            "user_id" => Ok(Rule::Credential {
                field: Credential::UserId,
                template: value.to_string(),
            }),
            _ => Err(self.invalid(&format!("unsupported check kind '{}'", kind))),
        }
    }
}
