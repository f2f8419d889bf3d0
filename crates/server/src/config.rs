use catalog::ClothingType;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Service configuration, loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// gRPC address of the vision inference service.
    pub vision_addr: String,
    /// Model name of the clothing detector.
    pub detection_model: String,
    /// Model name of the pose estimator.
    pub pose_model: String,
    /// Catalog file; the built-in catalog is used when unset.
    pub catalog_path: Option<PathBuf>,
    /// Seed of the base affinity generator.
    pub affinity_seed: u64,
    /// Timeout in seconds for connecting to the vision service.
    pub connect_timeout_secs: u64,
    /// Fail requests when a model cannot be loaded instead of degrading.
    pub strict_models: bool,
    /// Load both models at startup rather than on first request.
    pub warm_up: bool,
    /// Clothing types never recommended.
    pub exclude_types: Vec<ClothingType>,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from `OUTFIT_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup (the environment, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            vision_addr: lookup("OUTFIT_VISION_ADDR")
                .unwrap_or_else(|| "http://localhost:50052".to_string()),
            detection_model: lookup("OUTFIT_DETECTION_MODEL")
                .unwrap_or_else(|| "coco-ssd".to_string()),
            pose_model: lookup("OUTFIT_POSE_MODEL")
                .unwrap_or_else(|| "movenet-lightning".to_string()),
            catalog_path: lookup("OUTFIT_CATALOG_PATH")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            affinity_seed: parsed(&lookup, "OUTFIT_AFFINITY_SEED", 42),
            connect_timeout_secs: parsed(&lookup, "OUTFIT_CONNECT_TIMEOUT_SECS", 5),
            strict_models: lookup("OUTFIT_STRICT_MODELS")
                .map(|v| v == "1")
                .unwrap_or(false),
            warm_up: lookup("OUTFIT_WARM_UP")
                .map(|v| v != "0")
                .unwrap_or(true),
            exclude_types: lookup("OUTFIT_EXCLUDE_TYPES")
                .map(|v| parse_types(&v))
                .unwrap_or_default(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Comma-separated clothing type names; unrecognized names are dropped
pub fn parse_types(list: &str) -> Vec<ClothingType> {
    let mut types = Vec::new();
    for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        match name.parse::<ClothingType>() {
            Ok(ClothingType::Unknown) | Err(_) => {
                warn!("Ignoring unknown clothing type '{}'", name)
            }
            Ok(t) if !types.contains(&t) => types.push(t),
            Ok(_) => {}
        }
    }
    types
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.vision_addr, "http://localhost:50052");
        assert_eq!(config.detection_model, "coco-ssd");
        assert_eq!(config.pose_model, "movenet-lightning");
        assert_eq!(config.catalog_path, None);
        assert_eq!(config.affinity_seed, 42);
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert!(!config.strict_models);
        assert!(config.warm_up);
        assert!(config.exclude_types.is_empty());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("OUTFIT_VISION_ADDR", "http://vision:9000"),
            ("OUTFIT_CATALOG_PATH", "/srv/catalog.json"),
            ("OUTFIT_AFFINITY_SEED", "7"),
            ("OUTFIT_STRICT_MODELS", "1"),
            ("OUTFIT_WARM_UP", "0"),
            ("OUTFIT_EXCLUDE_TYPES", "dress, Shoes"),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.vision_addr, "http://vision:9000");
        assert_eq!(config.catalog_path, Some(PathBuf::from("/srv/catalog.json")));
        assert_eq!(config.affinity_seed, 7);
        assert!(config.strict_models);
        assert!(!config.warm_up);
        assert_eq!(
            config.exclude_types,
            vec![ClothingType::Dress, ClothingType::Shoes]
        );
    }

    #[test]
    fn test_parse_types_drops_unknown_and_duplicates() {
        assert_eq!(
            parse_types("shirt,,boots?, shirt ,coat,unknown"),
            vec![ClothingType::Shirt, ClothingType::Jacket]
        );
        assert!(parse_types("").is_empty());
    }

    #[test]
    fn test_unparsable_numbers_fall_back() {
        let config = Config::from_lookup(|key| match key {
            "OUTFIT_AFFINITY_SEED" => Some("lucky".to_string()),
            "OUTFIT_CONNECT_TIMEOUT_SECS" => Some("-3".to_string()),
            _ => None,
        });

        assert_eq!(config.affinity_seed, 42);
        assert_eq!(config.connect_timeout_secs, 5);
    }
}
