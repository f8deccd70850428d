//! Configuration loading from sweepmap.toml and pyproject.toml.
//!
//! Follows the conventions of ruff, black, mypy for familiarity:
//! - Standalone sweepmap.toml first
//! - `[tool.sweepmap]` section in pyproject.toml as fallback
//!
//! ## Example
//!
//! ```toml
//! [tool.sweepmap.parser]
//! duplicates = "concatenate"
//! step-axis = true            # logs that sweep delta_step / eps_step
//!
//! [tool.sweepmap.families.first]
//! header = "Delta实验结果:"
//! title = "Delta Sensitivity (run 3)"
//!
//! [tool.sweepmap.render]
//! precision = 3
//! serif-fallback-chain = ["Charter", "DejaVu Serif", "serif"]
//!
//! [tool.sweepmap.series]
//! limit = 200
//! columns = ["L_t", "delta"]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::extraction::LogParser;
use crate::rendering::RenderConfig;
use crate::series::SeriesSpec;
use crate::types::{DuplicatePolicy, FamilySchema, LogSchema};

pub const CONFIG_FILE: &str = "sweepmap.toml";

/// Sweepmap configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Source file for this config (for display).
    pub source: Option<PathBuf>,

    /// Section headers, record keys and figure labels of both families.
    pub schema: LogSchema,

    /// How repeated keys within a family are resolved.
    pub duplicates: DuplicatePolicy,

    pub render: RenderConfig,

    pub series: SeriesSpec,
}

/// Raw config as deserialized from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    parser: Option<RawParser>,
    families: Option<RawFamilies>,
    render: Option<RenderConfig>,
    series: Option<SeriesSpec>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawParser {
    duplicates: Option<DuplicatePolicy>,
    step_axis: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawFamilies {
    first: Option<RawFamily>,
    second: Option<RawFamily>,
}

/// Partial family schema; unset fields keep the built-in value.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawFamily {
    name: Option<String>,
    header: Option<String>,
    key1: Option<String>,
    key2: Option<String>,
    title: Option<String>,
    x_label: Option<String>,
    y_label: Option<String>,
}

impl RawFamily {
    fn apply(self, mut schema: FamilySchema) -> FamilySchema {
        let fields = [
            (self.name, &mut schema.name),
            (self.header, &mut schema.header),
            (self.key1, &mut schema.key1),
            (self.key2, &mut schema.key2),
            (self.title, &mut schema.title),
            (self.x_label, &mut schema.x_label),
            (self.y_label, &mut schema.y_label),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
        schema
    }
}

/// Wrapper for pyproject.toml structure.
#[derive(Debug, Deserialize)]
struct PyProject {
    tool: Option<PyProjectTool>,
}

#[derive(Debug, Deserialize)]
struct PyProjectTool {
    sweepmap: Option<RawConfig>,
}

impl Config {
    /// Load configuration from the given directory.
    ///
    /// Search order:
    /// 1. sweepmap.toml in directory
    /// 2. pyproject.toml [tool.sweepmap] in directory
    /// 3. Walk up to find pyproject.toml with a [tool.sweepmap] table
    /// 4. Default config if nothing found
    ///
    /// A file that exists but does not parse is an error, not a silent
    /// fallback to defaults.
    pub fn load(directory: &Path) -> Result<Self> {
        let sweepmap_toml = directory.join(CONFIG_FILE);
        if sweepmap_toml.exists() {
            return Self::from_path(&sweepmap_toml);
        }

        let mut current = Some(directory);
        while let Some(dir) = current {
            let pyproject = dir.join("pyproject.toml");
            if pyproject.exists() {
                if let Some(config) = Self::load_pyproject(&pyproject)? {
                    return Ok(config);
                }
            }
            current = dir.parent();
        }

        Ok(Self::default())
    }

    /// Load a standalone config file (sweepmap.toml layout).
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config = Self::from_toml_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse a sweepmap.toml document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content).context("invalid sweepmap config")?;
        Self::from_raw(raw, None)
    }

    fn load_pyproject(path: &Path) -> Result<Option<Self>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let pyproject: PyProject = toml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        match pyproject.tool.and_then(|t| t.sweepmap) {
            Some(raw) => Self::from_raw(raw, Some(path.to_path_buf()))
                .with_context(|| format!("[tool.sweepmap] in {}", path.display()))
                .map(Some),
            None => Ok(None),
        }
    }

    fn from_raw(raw: RawConfig, source: Option<PathBuf>) -> Result<Self> {
        let parser = raw.parser.unwrap_or_default();
        let mut schema = LogSchema::default();
        if parser.step_axis.unwrap_or(false) {
            schema.first = schema.first.with_step_axis();
            schema.second = schema.second.with_step_axis();
        }
        if let Some(families) = raw.families {
            if let Some(first) = families.first {
                schema.first = first.apply(schema.first);
            }
            if let Some(second) = families.second {
                schema.second = second.apply(schema.second);
            }
        }

        for family in [&schema.first, &schema.second] {
            if family.header.trim().is_empty() {
                bail!("family {:?} has an empty section header", family.name);
            }
            if family.key1.is_empty() || family.key2.is_empty() {
                bail!("family {:?} needs both key1 and key2", family.name);
            }
        }
        if schema.first.header == schema.second.header {
            bail!("both families use the section header {:?}", schema.first.header);
        }

        Ok(Self {
            source,
            schema,
            duplicates: parser.duplicates.unwrap_or_default(),
            render: raw.render.unwrap_or_default(),
            series: raw.series.unwrap_or_default(),
        })
    }

    /// Build the log parser described by this config.
    pub fn parser(&self) -> Result<LogParser> {
        let parser = LogParser::new(self.schema.clone())
            .context("record keys do not form a valid pattern")?;
        Ok(parser.with_duplicates(self.duplicates))
    }

    /// Format config for verbose display.
    pub fn display_summary(&self) -> String {
        let mut lines = Vec::new();

        if let Some(ref source) = self.source {
            lines.push(format!("   Config: {}", source.display()));
        } else {
            lines.push("   Config: (defaults)".to_string());
        }

        for family in [&self.schema.first, &self.schema.second] {
            lines.push(format!(
                "   {}: {:?} ({}, {})",
                family.name, family.header, family.key1, family.key2
            ));
        }

        if self.duplicates != DuplicatePolicy::default() {
            lines.push(format!("   Duplicates: {:?}", self.duplicates));
        }

        let fonts: Vec<&str> = self.render.font_candidates().collect();
        if fonts.len() <= 3 {
            lines.push(format!("   Fonts: {}", fonts.join(", ")));
        } else {
            lines.push(format!(
                "   Fonts: {}, ... (+{} more)",
                fonts[..2].join(", "),
                fonts.len() - 2
            ));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.schema, LogSchema::default());
        assert_eq!(config.duplicates, DuplicatePolicy::LastWins);
        assert_eq!(config.render, RenderConfig::default());
        assert!(config.source.is_none());
    }

    #[test]
    fn test_partial_family_override() {
        let config = Config::from_toml_str(
            r#"
            [parser]
            duplicates = "concatenate"

            [families.second]
            title = "Eps Sweep"
            "#,
        )
        .unwrap();
        assert_eq!(config.duplicates, DuplicatePolicy::Concatenate);
        assert_eq!(config.schema.second.title, "Eps Sweep");
        assert_eq!(config.schema.second.header, "Epsilon实验结果:");
        assert_eq!(config.schema.first, FamilySchema::delta());
    }

    #[test]
    fn test_step_axis() {
        let config = Config::from_toml_str("[parser]\nstep-axis = true\n").unwrap();
        assert_eq!(config.schema.first.key2, "delta_step");
        assert_eq!(config.schema.second.key2, "eps_step");
    }

    #[test]
    fn test_render_and_series_sections() {
        let config = Config::from_toml_str(
            r#"
            [render]
            precision = 3
            use-math-typesetting = false

            [series]
            limit = 50
            columns = ["delta"]
            "#,
        )
        .unwrap();
        assert_eq!(config.render.precision, 3);
        assert!(!config.render.use_math_typesetting);
        assert_eq!(config.render.heatmap_width, 1800);
        assert_eq!(config.series.limit, Some(50));
        assert_eq!(config.series.columns, vec!["delta"]);
        assert_eq!(config.series.x_label, "Step");
    }

    #[test]
    fn test_rejects_bad_config() {
        assert!(Config::from_toml_str("[families.first]\nheader = \"  \"\n").is_err());
        assert!(Config::from_toml_str("[families.second]\nheader = \"Delta实验结果:\"\n").is_err());
        assert!(Config::from_toml_str("[parser]\nduplicates = \"first-wins\"\n").is_err());
        assert!(Config::from_toml_str("[unknown]\n").is_err());
    }

    #[test]
    fn test_load_prefers_sweepmap_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[render]\nprecision = 4\n").unwrap();
        std::fs::write(
            dir.path().join("pyproject.toml"),
            "[tool.sweepmap.render]\nprecision = 1\n",
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.render.precision, 4);
        assert_eq!(config.source.as_deref(), Some(dir.path().join(CONFIG_FILE).as_path()));
    }

    #[test]
    fn test_load_walks_up_to_pyproject() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\nname = \"x\"\n\n[tool.sweepmap.parser]\nduplicates = \"concatenate\"\n",
        )
        .unwrap();
        let nested = dir.path().join("runs").join("2024");
        std::fs::create_dir_all(&nested).unwrap();
        let config = Config::load(&nested).unwrap();
        assert_eq!(config.duplicates, DuplicatePolicy::Concatenate);
    }

    #[test]
    fn test_pyproject_without_section_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pyproject.toml"), "[project]\nname = \"x\"\n").unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.source.is_none());
    }

    #[test]
    fn test_parser_from_config() {
        let config = Config::from_toml_str("[parser]\nduplicates = \"concatenate\"\n").unwrap();
        let parser = config.parser().unwrap();
        let log = parser
            .parse(
                "Delta实验结果:\n\
                 delta_min=1, delta_max=2: 平均值=1.0, 标准差=0.0, 值=[1.0]\n\
                 delta_min=1, delta_max=2: 平均值=3.0, 标准差=0.0, 值=[3.0]\n\
                 Epsilon实验结果:\n",
            )
            .unwrap();
        assert_eq!(log.first.trials(1.0, 2.0), Some(&[1.0, 3.0][..]));
    }

    #[test]
    fn test_display_summary() {
        let summary = Config::default().display_summary();
        assert!(summary.contains("(defaults)"));
        assert!(summary.contains("delta_min, delta_max"));
        assert!(summary.contains("more"));
    }
}
