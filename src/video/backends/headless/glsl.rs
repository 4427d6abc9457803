//! Just enough GLSL scanning to emulate compile, link and introspection
//! without a driver.

use std::collections::HashMap;

use crate::video::assets::prelude::*;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Qualifier {
    Uniform,
    Attribute,
    Varying,
}

/// A global variable declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub qualifier: Qualifier,
    pub tp: String,
    pub name: String,
    /// Array length, `None` for plain variables.
    pub size: Option<u32>,
}

impl Declaration {
    /// Driver type code, zero for types without one.
    pub fn code(&self) -> u32 {
        UniformType::from_glsl(&self.tp)
            .map(|v| v.code())
            .unwrap_or(0)
    }
}

/// A scanned shader stage.
#[derive(Debug, Clone)]
pub struct Shader {
    pub stage: ShaderStage,
    pub declarations: Vec<Declaration>,
    identifiers: HashMap<String, usize>,
}

impl Shader {
    /// Scans `source`, failing with a driver-like info log.
    pub fn compile(stage: ShaderStage, source: &str) -> ::std::result::Result<Shader, String> {
        for (i, line) in source.lines().enumerate() {
            let line = line.trim_start();
            if line.starts_with("#error") {
                return Err(format!(
                    "ERROR: 0:{}: '#error' : {}",
                    i + 1,
                    line["#error".len()..].trim()
                ));
            }
        }

        let code = strip(source);
        let opens = code.chars().filter(|&c| c == '{').count();
        let closes = code.chars().filter(|&c| c == '}').count();
        if opens != closes {
            return Err("ERROR: 0:0: '' : syntax error, unbalanced braces".into());
        }

        let identifiers = identifiers(&code);
        if !identifiers.contains_key("main") {
            return Err("ERROR: 0:0: 'main' : function is not defined".into());
        }

        Ok(Shader {
            stage,
            declarations: declarations(stage, &code),
            identifiers,
        })
    }

    /// Number of times `name` occurs as an identifier.
    pub fn occurrences(&self, name: &str) -> usize {
        self.identifiers.get(name).cloned().unwrap_or(0)
    }

    pub fn declared(&self, qualifier: Qualifier, name: &str) -> bool {
        self.declarations
            .iter()
            .any(|d| d.qualifier == qualifier && d.name == name)
    }

    fn declarations_of(&self, name: &str) -> usize {
        self.declarations.iter().filter(|d| d.name == name).count()
    }

    /// A variable is statically used if it occurs outside its declarations.
    pub fn uses(&self, name: &str) -> bool {
        self.occurrences(name) > self.declarations_of(name)
    }
}

/// Removes comments and preprocessor lines.
pub fn strip(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '/' {
            match chars.peek() {
                Some(&'/') => {
                    while let Some(&n) = chars.peek() {
                        if n == '\n' {
                            break;
                        }
                        chars.next();
                    }
                    continue;
                }
                Some(&'*') => {
                    chars.next();
                    let mut last = ' ';
                    while let Some(n) = chars.next() {
                        if last == '*' && n == '/' {
                            break;
                        }
                        last = n;
                    }
                    out.push(' ');
                    continue;
                }
                _ => {}
            }
        }

        out.push(c);
    }

    out.lines()
        .filter(|l| !l.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Counts every identifier of `code`.
pub fn identifiers(code: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    let mut current = String::new();

    for c in code.chars().chain(Some(' ')) {
        if c.is_alphanumeric() || c == '_' {
            current.push(c);
        } else if !current.is_empty() {
            let starts_with_digit = current.chars().next().map(|v| v.is_digit(10));
            if starts_with_digit == Some(false) {
                *counts.entry(current.clone()).or_insert(0) += 1;
            }
            current.clear();
        }
    }

    counts
}

/// Parses the global `uniform`, `attribute`, `varying`, `in` and `out`
/// declarations of `code`.
pub fn declarations(stage: ShaderStage, code: &str) -> Vec<Declaration> {
    let mut out = Vec::new();

    for statement in code.split(';') {
        let statement = match statement.rfind(|c: char| c == '{' || c == '}') {
            Some(i) => &statement[i + 1..],
            None => statement,
        };

        let statement = match (statement.find("layout"), statement.find(')')) {
            (Some(_), Some(end)) => &statement[end + 1..],
            _ => statement,
        };

        let mut tokens = statement
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|v| !v.is_empty())
            .skip_while(|v| *v == "flat" || *v == "smooth" || *v == "centroid");

        let qualifier = match (tokens.next(), stage) {
            (Some("uniform"), _) => Qualifier::Uniform,
            (Some("attribute"), _) => Qualifier::Attribute,
            (Some("varying"), _) => Qualifier::Varying,
            (Some("in"), ShaderStage::Vertex) => Qualifier::Attribute,
            (Some("in"), ShaderStage::Fragment) => Qualifier::Varying,
            (Some("out"), ShaderStage::Vertex) => Qualifier::Varying,
            _ => continue,
        };

        let mut tokens = tokens.skip_while(|v| *v == "lowp" || *v == "mediump" || *v == "highp");
        let tp = match tokens.next() {
            Some(tp) => tp.to_owned(),
            None => continue,
        };

        for token in tokens {
            if token.starts_with('=') {
                break;
            }

            let (name, size) = match token.find('[') {
                Some(i) => {
                    let len = token[i + 1..].trim_end_matches(']');
                    (&token[..i], Some(len.parse().unwrap_or(1)))
                }
                None => (token, None),
            };

            if !name.is_empty() {
                out.push(Declaration {
                    qualifier,
                    tp: tp.clone(),
                    name: name.to_owned(),
                    size,
                });
            }
        }
    }

    out
}
