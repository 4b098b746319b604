//! Lightweight GLSL ES front end used by the recording context.
//!
//! It does not type-check shader bodies. It checks that the source is
//! structurally sound and collects the interface declarations (attributes,
//! varyings, uniforms) so linking and location lookup behave like a driver.

use std::collections::HashMap;

use super::context::ShaderStage;

/// One interface variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub ty: String,
    pub name: String,
    pub array_len: Option<u32>,
    pub location: Option<u32>,
}

/// Interface of a compiled stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderInterface {
    pub inputs: Vec<Declaration>,
    pub outputs: Vec<Declaration>,
    pub uniforms: Vec<Declaration>,
}

/// Interface of a linked program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkedInterface {
    pub attributes: HashMap<String, u32>,
    pub uniforms: Vec<Declaration>,
}

pub const MAX_VERTEX_ATTRIBS: u32 = 16;

const QUALIFIER_NOISE: [&str; 7] = [
    "flat",
    "smooth",
    "centroid",
    "invariant",
    "highp",
    "mediump",
    "lowp",
];

/// "Compiles" one stage. The error string is a driver-style info log.
pub fn compile(stage: ShaderStage, source: &str) -> Result<ShaderInterface, String> {
    let source = strip_comments(source);
    check_structure(&source)?;
    scan_interface(stage, &source)
}

/// Matches the vertex outputs against the fragment inputs, merges uniforms
/// and assigns attribute slots.
pub fn link(vertex: &ShaderInterface, fragment: &ShaderInterface) -> Result<LinkedInterface, String> {
    for input in &fragment.inputs {
        let Some(output) = vertex.outputs.iter().find(|o| o.name == input.name) else {
            return Err(format!(
                "ERROR: fragment input '{}' is not written by the vertex shader",
                input.name
            ));
        };
        if output.ty != input.ty {
            return Err(format!(
                "ERROR: '{}' is {} in the vertex shader but {} in the fragment shader",
                input.name, output.ty, input.ty
            ));
        }
    }

    let mut uniforms: Vec<Declaration> = Vec::new();
    for uniform in vertex.uniforms.iter().chain(&fragment.uniforms) {
        match uniforms.iter().find(|u| u.name == uniform.name) {
            Some(existing) if existing.ty != uniform.ty || existing.array_len != uniform.array_len => {
                return Err(format!(
                    "ERROR: uniform '{}' declared as {} and {} across stages",
                    uniform.name, existing.ty, uniform.ty
                ));
            }
            Some(_) => {}
            None => uniforms.push(uniform.clone()),
        }
    }

    let mut attributes = HashMap::new();
    let mut used = Vec::new();
    for input in vertex.inputs.iter().filter(|i| i.location.is_some()) {
        let slot = input.location.unwrap_or_default();
        if slot >= MAX_VERTEX_ATTRIBS {
            return Err(format!(
                "ERROR: attribute '{}' location {slot} exceeds the limit of {MAX_VERTEX_ATTRIBS}",
                input.name
            ));
        }
        if used.contains(&slot) {
            return Err(format!(
                "ERROR: attribute '{}' reuses location {slot}",
                input.name
            ));
        }
        used.push(slot);
        attributes.insert(input.name.clone(), slot);
    }
    let mut next = 0;
    for input in vertex.inputs.iter().filter(|i| i.location.is_none()) {
        while used.contains(&next) {
            next += 1;
        }
        if next >= MAX_VERTEX_ATTRIBS {
            return Err(format!(
                "ERROR: too many vertex attributes, '{}' does not fit",
                input.name
            ));
        }
        used.push(next);
        attributes.insert(input.name.clone(), next);
    }

    Ok(LinkedInterface {
        attributes,
        uniforms,
    })
}

/// Whether a uniform declared as `declared` accepts a value of `value_type`.
pub fn uniform_accepts(declared: &str, value_type: &str) -> bool {
    if declared == value_type {
        return true;
    }
    value_type == "int" && (declared == "bool" || declared.starts_with("sampler"))
}

/// Removes `//` and `/* */` comments while keeping line numbering intact.
fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut in_block = false;
    while let Some(ch) = chars.next() {
        if in_block {
            if ch == '*' && chars.peek() == Some(&'/') {
                chars.next();
                in_block = false;
            } else if ch == '\n' {
                out.push('\n');
            }
            continue;
        }
        let next = chars.peek().copied();
        match (ch, next) {
            ('/', Some('/')) => {
                for rest in chars.by_ref() {
                    if rest == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                in_block = true;
            }
            _ => out.push(ch),
        }
    }
    out
}

fn check_structure(source: &str) -> Result<(), String> {
    if source.trim().is_empty() {
        return Err("ERROR: 0:1: '' : syntax error: empty shader source".to_string());
    }
    let mut open: Vec<(char, usize)> = Vec::new();
    let mut line = 1;
    for ch in source.chars() {
        match ch {
            '\n' => line += 1,
            '{' | '(' | '[' => open.push((ch, line)),
            '}' | ')' | ']' => {
                let expected = match ch {
                    '}' => '{',
                    ')' => '(',
                    _ => '[',
                };
                match open.pop() {
                    Some((found, _)) if found == expected => {}
                    _ => return Err(format!("ERROR: 0:{line}: '{ch}' : syntax error")),
                }
            }
            _ => {}
        }
    }
    if let Some((ch, opened)) = open.pop() {
        return Err(format!(
            "ERROR: 0:{line}: '' : unexpected end of file, '{ch}' from line {opened} is never closed"
        ));
    }
    let compact: String = source.split_whitespace().collect();
    if !compact.contains("voidmain(") {
        return Err("ERROR: 0:1: 'main' : missing main() function".to_string());
    }
    Ok(())
}

fn scan_interface(stage: ShaderStage, source: &str) -> Result<ShaderInterface, String> {
    // Preprocessor lines carry no semicolon; blank them so they do not merge
    // into the next declaration.
    let body = source
        .lines()
        .map(|line| if line.trim_start().starts_with('#') { "" } else { line })
        .collect::<Vec<_>>()
        .join("\n");

    let mut interface = ShaderInterface::default();
    let mut offset = 0;
    for raw in body.split(';') {
        let line = body[..offset].matches('\n').count() + 1;
        offset += raw.len() + 1;

        let statement = raw
            .rsplit(|c: char| c == '{' || c == '}')
            .next()
            .unwrap_or(raw)
            .trim();
        if statement.is_empty() {
            continue;
        }
        let (location, rest) = split_layout(statement)
            .map_err(|msg| format!("ERROR: 0:{line}: 'layout' : {msg}"))?;
        let mut tokens = rest
            .split_whitespace()
            .filter(|token| !QUALIFIER_NOISE.contains(token));
        let Some(qualifier) = tokens.next() else {
            continue;
        };
        let bucket = match (stage, qualifier) {
            (_, "uniform") => &mut interface.uniforms,
            (ShaderStage::Vertex, "in" | "attribute") => &mut interface.inputs,
            (ShaderStage::Vertex, "out" | "varying") => &mut interface.outputs,
            (ShaderStage::Fragment, "in" | "varying") => &mut interface.inputs,
            (ShaderStage::Fragment, "out") => &mut interface.outputs,
            _ => continue,
        };
        let Some(ty) = tokens.next() else {
            return Err(format!(
                "ERROR: 0:{line}: '{qualifier}' : syntax error, missing type"
            ));
        };
        let names = tokens.collect::<Vec<_>>().join(" ");
        if names.trim().is_empty() {
            return Err(format!(
                "ERROR: 0:{line}: '{ty}' : syntax error, missing variable name"
            ));
        }
        for name in names.split(',') {
            let (name, array_len) = split_array(name.trim())
                .map_err(|msg| format!("ERROR: 0:{line}: '{name}' : {msg}"))?;
            bucket.push(Declaration {
                ty: ty.to_string(),
                name,
                array_len,
                location,
            });
        }
    }
    Ok(interface)
}

fn split_layout(statement: &str) -> Result<(Option<u32>, &str), String> {
    let Some(after) = statement.strip_prefix("layout") else {
        return Ok((None, statement));
    };
    let (Some(open), Some(close)) = (after.find('('), after.find(')')) else {
        return Err("malformed layout qualifier".to_string());
    };
    let mut location = None;
    for part in after[open + 1..close].split(',') {
        let mut kv = part.split('=');
        let key = kv.next().unwrap_or_default().trim();
        if key != "location" {
            continue;
        }
        let value = kv.next().unwrap_or_default().trim();
        location = Some(
            value
                .parse::<u32>()
                .map_err(|_| format!("invalid location '{value}'"))?,
        );
    }
    Ok((location, &after[close + 1..]))
}

fn split_array(name: &str) -> Result<(String, Option<u32>), String> {
    let Some(open) = name.find('[') else {
        return Ok((name.to_string(), None));
    };
    let len = name[open + 1..]
        .trim_end_matches(']')
        .trim()
        .parse::<u32>()
        .map_err(|_| "array size must be a constant integer".to_string())?;
    Ok((name[..open].trim().to_string(), Some(len)))
}
