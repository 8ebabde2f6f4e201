//! # Built-in Planners
//!
//! | Kind | Version | Publishes |
//! |------|---------|-----------|
//! | `mappings` | composite mapping version | archive + POM |
//! | `bundle` | opaque | each configured file + POM |
//!
//! Input paths are templates. Placeholders:
//!
//! | Placeholder | Value |
//! |-------------|-------|
//! | `{module}` | module name |
//! | `{version}` | published version |
//! | `{timestamp}` | mapping timestamp (mappings only) |
//! | `{mc}` | targeted platform version (mappings only) |
//! | `{map_mc}` | origin platform version (mappings only) |

mod bundle;
mod mappings;
mod pom;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

pub use bundle::BundlePlanner;
pub use mappings::MappingsPlanner;
pub use pom::render_pom;

use crate::pipeline::Driver;

/// Registers every built-in planner
pub fn register_builtin(driver: &mut Driver) {
    driver.register(Box::new(MappingsPlanner));
    driver.register(Box::new(BundlePlanner));
}

/// Values available to input path templates
#[derive(Debug, Default)]
pub(crate) struct TemplateVars<'a> {
    vars: Vec<(&'static str, Option<&'a str>)>,
}

impl<'a> TemplateVars<'a> {
    pub(crate) fn new(module: &'a str, version: &'a str) -> Self {
        Self {
            vars: vec![("module", Some(module)), ("version", Some(version))],
        }
    }

    pub(crate) fn with(mut self, name: &'static str, value: Option<&'a str>) -> Self {
        self.vars.push((name, value));
        self
    }

    /// Substitutes every `{name}`; unknown or valueless placeholders are errors
    pub(crate) fn render(&self, template: &str) -> Result<String, String> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| format!("unclosed placeholder in '{}'", template))?;
            let name = &after[..close];

            match self.vars.iter().find(|(n, _)| *n == name) {
                Some((_, Some(value))) => out.push_str(value),
                Some((_, None)) => {
                    return Err(format!("placeholder {{{}}} has no value here", name))
                }
                None => return Err(format!("unknown placeholder {{{}}}", name)),
            }
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// Relative inputs resolve against the project root
pub(crate) fn resolve_input(base_dir: &Path, rendered: &str) -> PathBuf {
    let path = Path::new(rendered);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Size and mtime of an input, so a changed input misses the cache
pub(crate) fn fingerprint(path: &Path) -> String {
    match fs::metadata(path) {
        Ok(meta) => {
            let mtime = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_nanos())
                .unwrap_or_default();
            format!("{}:{}", meta.len(), mtime)
        }
        Err(_) => "absent".to_string(),
    }
}
