use anyhow::Context;
use tracing::info;

use crate::models::LayoutConfig;

/// `LAYOUT_ROWS=ABC` sets `rows`; `__` descends into tables, so
/// `LAYOUT_PRICES__GOLD=20` sets `prices.gold`.
fn layout_env() -> ::config::Environment {
    ::config::Environment::with_prefix("LAYOUT")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Loads the venue layout from an optional TOML file, overlaid by `LAYOUT_*`
/// variables. Missing keys keep the built-in venue.
pub fn load_layout(path: &str) -> anyhow::Result<LayoutConfig> {
    load_layout_with(path, layout_env())
}

fn load_layout_with(path: &str, env: ::config::Environment) -> anyhow::Result<LayoutConfig> {
    let settings = ::config::Config::builder()
        .add_source(::config::File::with_name(path).required(false))
        .add_source(env)
        .build()
        .with_context(|| format!("failed to read seat layout from {path}"))?;

    let layout: LayoutConfig = settings
        .try_deserialize()
        .context("seat layout has an invalid shape")?;

    layout.validate().context("seat layout is invalid")?;
    info!(rows = %layout.rows, seats = layout.seat_count(), "Seat layout loaded");
    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use std::io::Write;

    #[test]
    fn missing_file_yields_builtin_venue() {
        let layout = load_layout("definitely/not/here/layout").unwrap();
        assert_eq!(layout, LayoutConfig::default());
    }

    #[test]
    fn env_variables_override_nested_keys() {
        let vars: ::config::Map<String, String> = [
            ("LAYOUT_ROWS", "AB"),
            ("LAYOUT_LAST_COLUMN", "3"),
            ("LAYOUT_PRICES__STANDARD", "9.5"),
            ("SEAT_LAYOUT_FILE", "elsewhere.toml"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let layout = load_layout_with("definitely/not/here/layout", layout_env().source(Some(vars))).unwrap();

        assert_eq!(layout.rows, "AB");
        assert_eq!(layout.seat_count(), 6);
        assert_eq!(layout.prices.standard, 9.5);
        assert_eq!(layout.prices.gold, 15.0);
    }

    #[test]
    fn file_overrides_only_the_keys_it_sets() {
        let dir = std::env::temp_dir().join(format!("seat-layout-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("layout.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
rows = "AB"
last_column = 4

[[categories]]
category = "gold"
rows = "A"

[prices]
gold = 20.0
"#
        )
        .unwrap();

        let layout = load_layout(path.to_str().unwrap()).unwrap();

        assert_eq!(layout.seat_count(), 8);
        assert_eq!(layout.category_for('A'), Category::Gold);
        assert_eq!(layout.category_for('B'), Category::Standard);
        assert_eq!(layout.prices.gold, 20.0);
        assert_eq!(layout.prices.standard, 8.0);

        std::fs::remove_dir_all(dir).ok();
    }
}
