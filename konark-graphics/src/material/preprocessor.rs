use std::{collections::HashMap, error::Error, fmt::Display};

use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub enum ShaderValue {
    Uint(u32),
    Int(i32),
    Float(f32),
    Bool(bool),
    /// Just define. Has no value. Treat as true
    Def,
}

impl Display for ShaderValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uint(v) => write!(f, "{}u", v),
            Self::Int(v) => write!(f, "{}i", v),
            // WGSL needs a decimal point on float literals
            Self::Float(v) if v.fract() == 0.0 => write!(f, "{:.1}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Def => write!(f, "true"),
        }
    }
}

/// Conditional block state: `parent` is whether the enclosing block emits code.
#[derive(Debug, Clone, Copy)]
struct Branch {
    parent: bool,
    condition: bool,
    in_else: bool,
}

impl Branch {
    fn is_active(&self) -> bool {
        self.parent && (self.condition != self.in_else)
    }
}

/// Assembles WGSL sources.
///
/// It supports:
/// - `#include` of registered modules, with cycle detection.
/// - `#define KEY [VALUE]`.
/// - `#ifdef`, `#ifndef`, `#else`, `#endif`, nestable.
/// - `${KEY}` replacement with defined values.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    include_targets: HashMap<String, String>,
    is_include: Regex,
    is_define: Regex,
    is_ifdef: Regex,
    is_ifndef: Regex,
    is_else: Regex,
    is_endif: Regex,
    replace_define: Regex,
}

impl Preprocessor {
    pub fn new() -> Result<Self, PreprocessError> {
        Ok(Self {
            include_targets: HashMap::default(),
            is_include: Regex::new(
                r"^[[:blank:]]*#include[[:blank:]]+(?<module_name>[a-zA-Z0-9_\/\.\:]+)",
            )?,
            is_define: Regex::new(
                r"^[[:blank:]]*#define[[:blank:]]+(?<key>[[:word:]]+)([[:blank:]]+(?<value>[[:word:]\.\-]+))?",
            )?,
            is_ifdef: Regex::new(r"^[[:blank:]]*#ifdef[[:blank:]]+(?<key>[[:word:]]+)")?,
            is_ifndef: Regex::new(r"^[[:blank:]]*#ifndef[[:blank:]]+(?<key>[[:word:]]+)")?,
            is_else: Regex::new(r"^[[:blank:]]*#else")?,
            is_endif: Regex::new(r"^[[:blank:]]*#endif")?,
            replace_define: Regex::new(r"\$\{(?<key>[[:word:]]+)\}")?,
        })
    }

    pub fn with_include_module(mut self, module_name: &str, source: &str) -> Self {
        self.add_include_module(module_name, source);
        self
    }

    pub fn add_include_module(&mut self, module_name: &str, source: &str) {
        self.include_targets
            .insert(module_name.to_owned(), source.to_owned());
    }

    pub fn build<'a>(
        &self,
        shader_code: &str,
        defs: &HashMap<String, ShaderValue>,
        label: Option<&'a str>,
    ) -> Result<wgpu::ShaderModuleDescriptor<'a>, PreprocessError> {
        let output = self.process(shader_code, defs)?;

        Ok(wgpu::ShaderModuleDescriptor {
            label,
            source: wgpu::ShaderSource::Wgsl(std::borrow::Cow::Owned(output)),
        })
    }

    /// Expand includes, evaluate conditionals and substitute defines.
    pub fn process(
        &self,
        shader_code: &str,
        defs: &HashMap<String, ShaderValue>,
    ) -> Result<String, PreprocessError> {
        let mut include_stack = Vec::new();
        let included = self.process_include(shader_code, &mut include_stack)?;

        let mut output = String::new();
        let mut branches: Vec<Branch> = Vec::new();
        let mut runtime_defs: HashMap<String, ShaderValue> = HashMap::default();

        for (number, line) in included.lines().enumerate() {
            let active = branches.last().map_or(true, Branch::is_active);
            let is_defined =
                |key: &str, runtime_defs: &HashMap<String, ShaderValue>| {
                    defs.contains_key(key) || runtime_defs.contains_key(key)
                };

            if let Some(cap) = self.is_ifdef.captures(line) {
                branches.push(Branch {
                    parent: active,
                    condition: is_defined(&cap["key"], &runtime_defs),
                    in_else: false,
                });
            } else if let Some(cap) = self.is_ifndef.captures(line) {
                branches.push(Branch {
                    parent: active,
                    condition: !is_defined(&cap["key"], &runtime_defs),
                    in_else: false,
                });
            } else if self.is_else.is_match(line) {
                match branches.last_mut() {
                    Some(branch) if !branch.in_else => branch.in_else = true,
                    _ => {
                        return Err(PreprocessError::InvalidScope {
                            line: number + 1,
                        })
                    }
                }
            } else if self.is_endif.is_match(line) {
                if branches.pop().is_none() {
                    return Err(PreprocessError::InvalidScope { line: number + 1 });
                }
            } else if !active {
                // Skipped block
            } else if let Some(cap) = self.is_define.captures(line) {
                let value = match cap.name("value") {
                    Some(value) => Self::parse_shader_value(value.as_str())?,
                    None => ShaderValue::Def,
                };
                runtime_defs.insert(cap["key"].to_owned(), value);
            } else {
                output.push_str(&self.replace_defines(line, defs, &runtime_defs)?);
                output.push('\n');
            }
        }

        if !branches.is_empty() {
            return Err(PreprocessError::UnterminatedScope {
                open: branches.len(),
            });
        }

        log::trace!("Final code = {}\n", output);
        log::trace!("Defs = {:?}", defs);
        log::trace!("Runtime defs = {:?}", runtime_defs);

        Ok(output)
    }

    fn process_include(
        &self,
        shader_code: &str,
        include_stack: &mut Vec<String>,
    ) -> Result<String, PreprocessError> {
        let mut output = String::new();

        for line in shader_code.lines() {
            if let Some(cap) = self.is_include.captures(line) {
                let module_name = cap["module_name"].to_owned();

                if include_stack.contains(&module_name) {
                    return Err(PreprocessError::IncludeCycleDetected {
                        module_name,
                        stack: include_stack.clone(),
                    });
                }

                let included_source = self
                    .include_targets
                    .get(&module_name)
                    .ok_or(PreprocessError::IncludeTargetNotDefined {
                        module_name: module_name.clone(),
                    })?;

                include_stack.push(module_name);
                let included_content = self.process_include(included_source, include_stack)?;
                include_stack.pop();

                output.push_str(&included_content);
            } else {
                output.push_str(line);
                output.push('\n');
            }
        }

        Ok(output)
    }

    fn replace_defines(
        &self,
        line: &str,
        defs: &HashMap<String, ShaderValue>,
        runtime_defs: &HashMap<String, ShaderValue>,
    ) -> Result<String, PreprocessError> {
        let mut output = String::new();
        let mut offset = 0usize;

        for cap in self.replace_define.captures_iter(line) {
            let key = &cap["key"];
            let value = defs.get(key).or(runtime_defs.get(key)).ok_or(
                PreprocessError::DefineValueNotFound {
                    key: key.to_owned(),
                },
            )?;
            // Whole-match group always exists
            if let Some(define_match) = cap.get(0) {
                output.push_str(&line[offset..define_match.start()]);
                output.push_str(&value.to_string());
                offset = define_match.end();
            }
        }
        output.push_str(&line[offset..]);

        Ok(output)
    }

    fn parse_shader_value(value: &str) -> Result<ShaderValue, PreprocessError> {
        if let Ok(v) = value.parse::<u32>() {
            Ok(ShaderValue::Uint(v))
        } else if let Ok(v) = value.parse::<i32>() {
            Ok(ShaderValue::Int(v))
        } else if let Ok(v) = value.parse::<f32>() {
            Ok(ShaderValue::Float(v))
        } else if value.eq_ignore_ascii_case("true") {
            Ok(ShaderValue::Bool(true))
        } else if value.eq_ignore_ascii_case("false") {
            Ok(ShaderValue::Bool(false))
        } else {
            Err(PreprocessError::InvalidDefineValue {
                value: value.to_owned(),
            })
        }
    }
}

#[derive(Debug)]
pub enum PreprocessError {
    Regex(regex::Error),
    IncludeCycleDetected {
        module_name: String,
        stack: Vec<String>,
    },
    IncludeTargetNotDefined {
        module_name: String,
    },
    DefineValueNotFound {
        key: String,
    },
    InvalidDefineValue {
        value: String,
    },
    /// `#else` or `#endif` without a matching `#ifdef`/`#ifndef`
    InvalidScope {
        line: usize,
    },
    UnterminatedScope {
        open: usize,
    },
}

impl From<regex::Error> for PreprocessError {
    fn from(value: regex::Error) -> Self {
        Self::Regex(value)
    }
}

impl Error for PreprocessError {}

impl Display for PreprocessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{:?}", self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defs(entries: &[(&str, ShaderValue)]) -> HashMap<String, ShaderValue> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn include_and_replace() {
        let preprocessor = Preprocessor::new()
            .unwrap()
            .with_include_module("common::consts", "const EXPOSURE: f32 = ${EXPOSURE};");

        let output = preprocessor
            .process(
                "#include common::consts\nfn main() {}",
                &defs(&[("EXPOSURE", ShaderValue::Float(1.5))]),
            )
            .unwrap();

        assert_eq!(output, "const EXPOSURE: f32 = 1.5;\nfn main() {}\n");
    }

    #[test]
    fn whole_float_keeps_decimal_point() {
        assert_eq!(ShaderValue::Float(2.0).to_string(), "2.0");
        assert_eq!(ShaderValue::Uint(4).to_string(), "4u");
    }

    #[test]
    fn nested_conditionals() {
        let source = "\
#ifdef ENCODE_SRGB
srgb
#ifndef FAST
slow
#else
fast
#endif
#else
linear
#endif
tail";
        let preprocessor = Preprocessor::new().unwrap();

        let with = preprocessor
            .process(source, &defs(&[("ENCODE_SRGB", ShaderValue::Def)]))
            .unwrap();
        assert_eq!(with, "srgb\nslow\ntail\n");

        let without = preprocessor.process(source, &HashMap::new()).unwrap();
        assert_eq!(without, "linear\ntail\n");
    }

    #[test]
    fn runtime_define_inside_inactive_block_is_ignored() {
        let source = "\
#ifdef MISSING
#define SAMPLES 8
#endif
#define SAMPLES 4
let n = ${SAMPLES};";
        let output = Preprocessor::new()
            .unwrap()
            .process(source, &HashMap::new())
            .unwrap();

        assert_eq!(output, "let n = 4u;\n");
    }

    #[test]
    fn include_cycle_is_detected() {
        let preprocessor = Preprocessor::new()
            .unwrap()
            .with_include_module("a", "#include b")
            .with_include_module("b", "#include a");

        let err = preprocessor.process("#include a", &HashMap::new()).unwrap_err();
        assert!(matches!(err, PreprocessError::IncludeCycleDetected { .. }));
    }

    #[test]
    fn unbalanced_scopes_are_errors() {
        let preprocessor = Preprocessor::new().unwrap();

        assert!(matches!(
            preprocessor.process("#endif", &HashMap::new()),
            Err(PreprocessError::InvalidScope { line: 1 })
        ));
        assert!(matches!(
            preprocessor.process("#ifdef A\nx", &HashMap::new()),
            Err(PreprocessError::UnterminatedScope { open: 1 })
        ));
        assert!(matches!(
            preprocessor.process("${NOPE}", &HashMap::new()),
            Err(PreprocessError::DefineValueNotFound { .. })
        ));
    }
}
