use std::path::Path;

use anyhow::{Result, bail};

/// One spec file, identified by its path relative to the spec directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpecDescriptor {
    /// Uses `/` separators on every platform.
    pub path: String,
}

impl SpecDescriptor {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// The path with everything from the first `.` of the file name removed.
    pub fn asset_name(&self) -> &str {
        strip_extension(&self.path)
    }

    /// URL of the page that runs this spec.
    pub fn page_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.asset_name())
    }
}

pub fn strip_extension(path: &str) -> &str {
    let file_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[file_start..].find('.') {
        Some(i) => &path[..file_start + i],
        None => path,
    }
}

/// Find spec files below `spec_dir`, sorted by path.
pub fn discover(spec_dir: &Path) -> Result<Vec<SpecDescriptor>> {
    let suffixes = [
        "*_spec.js",
        "*_spec.coffee",
        "*_spec.js.coffee",
        "*_test.js",
        "*_test.coffee",
        "*_test.js.coffee",
    ];

    let mut specs = Vec::new();
    for suffix in &suffixes {
        let pattern = spec_dir
            .join("**/")
            .join(suffix)
            .to_string_lossy()
            .to_string();
        for entry in glob::glob(&pattern)?.flatten() {
            if entry.to_string_lossy().contains("node_modules") {
                continue;
            }
            let Ok(relative) = entry.strip_prefix(spec_dir) else {
                continue;
            };
            let path = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let spec = SpecDescriptor::new(path);
            if !specs.contains(&spec) {
                specs.push(spec);
            }
        }
    }

    specs.sort();
    tracing::debug!(count = specs.len(), dir = %spec_dir.display(), "discovered specs");
    Ok(specs)
}

/// Keep the specs named by `filters`, each either a spec path or a directory above some.
/// An empty filter list keeps everything.
pub fn select(specs: Vec<SpecDescriptor>, filters: &[String]) -> Result<Vec<SpecDescriptor>> {
    if filters.is_empty() {
        return Ok(specs);
    }

    let matches = |spec: &SpecDescriptor, filter: &str| {
        let filter = filter.trim_end_matches('/');
        spec.path == filter
            || spec
                .path
                .strip_prefix(filter)
                .is_some_and(|rest| rest.starts_with('/'))
    };

    for filter in filters {
        if !specs.iter().any(|spec| matches(spec, filter)) {
            bail!("no spec matches '{}'", filter);
        }
    }

    Ok(specs
        .into_iter()
        .filter(|spec| filters.iter().any(|f| matches(spec, f)))
        .collect())
}
