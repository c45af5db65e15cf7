//! TOML configuration for label tables, captions, colors and widths.
//!
//! Every key is optional; an empty file reproduces the built-in defaults.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::conf::{
    C_COLOR_GROUP_ALTERNATE, C_COLOR_GROUP_PRIMARY, C_COLOR_MARKER, N_WIDTH_COL_MAX,
    derive_builtin_code_label_map, derive_grid_formats_with_colors,
};
use crate::error::{Result, SecMatrixError};
use crate::spec::{SpecCodeLabelMap, SpecGridCaptions, SpecRenderOptions};
use crate::util::is_hex_color;

/// Root of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecSecMatrixConfig {
    /// Output sheet name.
    pub sheet_name: Option<String>,
    /// Drop the built-in label table instead of extending it.
    pub if_replace_labels: bool,
    /// Extra or overriding `code = "label"` entries.
    pub labels: BTreeMap<String, String>,
    /// Label-column captions.
    pub captions: SpecCaptionsConfig,
    /// Fill colors.
    pub colors: SpecColorsConfig,
    /// Column widths.
    pub widths: SpecWidthsConfig,
}

/// `[captions]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecCaptionsConfig {
    pub context_name: Option<String>,
    pub object_code: Option<String>,
    pub user: Option<String>,
}

/// `[colors]` table; values are `#RRGGBB`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecColorsConfig {
    pub group_primary: Option<String>,
    pub group_alternate: Option<String>,
    pub marker: Option<String>,
}

/// `[widths]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpecWidthsConfig {
    pub label: Option<f64>,
    pub data: Option<f64>,
}

impl SpecSecMatrixConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| SecMatrixError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|err| SecMatrixError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check colors and widths.
    pub fn validate(&self) -> Result<()> {
        for (c_key, c_color) in [
            ("colors.group_primary", &self.colors.group_primary),
            ("colors.group_alternate", &self.colors.group_alternate),
            ("colors.marker", &self.colors.marker),
        ] {
            if let Some(c_color) = c_color
                && !is_hex_color(c_color)
            {
                return Err(SecMatrixError::Config(format!(
                    "{c_key} must be #RRGGBB, got {c_color:?}"
                )));
            }
        }

        for (c_key, n_width) in [
            ("widths.label", self.widths.label),
            ("widths.data", self.widths.data),
        ] {
            if let Some(n_width) = n_width
                && !(n_width > 0.0 && n_width <= N_WIDTH_COL_MAX)
            {
                return Err(SecMatrixError::Config(format!(
                    "{c_key} must be within (0, {N_WIDTH_COL_MAX}], got {n_width}"
                )));
            }
        }

        Ok(())
    }

    /// Effective code label map: built-ins (unless replaced) overlaid with `labels`.
    pub fn code_label_map(&self) -> SpecCodeLabelMap {
        let mut labels = if self.if_replace_labels {
            SpecCodeLabelMap::new()
        } else {
            derive_builtin_code_label_map()
        };
        labels.extend(&SpecCodeLabelMap::from_pairs(self.labels.clone()));
        labels
    }

    /// Effective render options.
    pub fn render_options(&self) -> SpecRenderOptions {
        let cfg_default = SpecRenderOptions::default();
        let cfg_captions_default = SpecGridCaptions::default();

        SpecRenderOptions {
            sheet_name: self.sheet_name.clone().unwrap_or(cfg_default.sheet_name),
            captions: SpecGridCaptions {
                context_name: self
                    .captions
                    .context_name
                    .clone()
                    .unwrap_or(cfg_captions_default.context_name),
                object_code: self
                    .captions
                    .object_code
                    .clone()
                    .unwrap_or(cfg_captions_default.object_code),
                user: self
                    .captions
                    .user
                    .clone()
                    .unwrap_or(cfg_captions_default.user),
            },
            formats: derive_grid_formats_with_colors(
                self.colors
                    .group_primary
                    .as_deref()
                    .unwrap_or(C_COLOR_GROUP_PRIMARY),
                self.colors
                    .group_alternate
                    .as_deref()
                    .unwrap_or(C_COLOR_GROUP_ALTERNATE),
                self.colors.marker.as_deref().unwrap_or(C_COLOR_MARKER),
            ),
            width_label_col: self.widths.label.unwrap_or(cfg_default.width_label_col),
            width_data_col: self.widths.data.unwrap_or(cfg_default.width_data_col),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::TUP_BUILTIN_CODE_LABELS;

    #[test]
    fn test_empty_config_matches_defaults() {
        let config = SpecSecMatrixConfig::from_toml("").unwrap();
        assert_eq!(config.render_options(), SpecRenderOptions::default());
        assert_eq!(config.code_label_map().len(), TUP_BUILTIN_CODE_LABELS.len());
    }

    #[test]
    fn test_labels_extend_and_override_builtins() {
        let config = SpecSecMatrixConfig::from_toml(
            r##"
sheet_name = "Roles"

[labels]
OA4F_SEC_CUSTOM_LIST = "Custom List"
OA4F_SEC_FIN_LEDGER_LIST = "General Ledgers"

[colors]
marker = "#00FF00"

[widths]
label = 30
"##,
        )
        .unwrap();

        let labels = config.code_label_map();
        assert_eq!(labels.label_for("OA4F_SEC_CUSTOM_LIST"), "Custom List");
        assert_eq!(labels.label_for("OA4F_SEC_FIN_LEDGER_LIST"), "General Ledgers");
        assert_eq!(
            labels.label_for("OA4F_SEC_HCM_COUNTRY_LIST"),
            "HCM Country List"
        );

        let options = config.render_options();
        assert_eq!(options.sheet_name, "Roles");
        assert_eq!(options.width_label_col, 30.0);
        assert_eq!(options.width_data_col, 4.0);
        assert_eq!(options.formats.marker.bg_color.as_deref(), Some("#00FF00"));
        assert_eq!(
            options.formats.group_primary.bg_color.as_deref(),
            Some(C_COLOR_GROUP_PRIMARY)
        );
    }

    #[test]
    fn test_replace_labels_drops_builtins() {
        let config = SpecSecMatrixConfig::from_toml(
            "if_replace_labels = true\n[labels]\nX_CODE = \"X\"\n",
        )
        .unwrap();
        let labels = config.code_label_map();
        assert_eq!(labels.len(), 1);
        assert_eq!(
            labels.label_for("OA4F_SEC_HCM_COUNTRY_LIST"),
            "OA4F_SEC_HCM_COUNTRY_LIST"
        );
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        for c_toml in [
            "[colors]\nmarker = \"blue\"\n",
            "[widths]\ndata = 0\n",
            "[widths]\nlabel = 300\n",
            "unknown_key = 1\n",
            "sheet_name = [",
        ] {
            assert!(
                matches!(
                    SpecSecMatrixConfig::from_toml(c_toml),
                    Err(SecMatrixError::Config(_))
                ),
                "{c_toml}"
            );
        }
    }
}
