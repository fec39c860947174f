//! Разрешение ссылок на внешние юниты.
//!
//! Ссылка присоединяется к базовой директории, а если у неё нет нужного
//! расширения, расширение дописывается.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{SinjError, SinjResult};

/// Резолвер ссылок на юниты.
#[derive(Debug)]
pub struct ModuleResolver {
    /// Базовая директория
    base_dir: PathBuf,
    /// Расширение файлов юнитов (без точки)
    extension: String,
    /// Кэш разрешённых путей
    cache: HashMap<String, PathBuf>,
}

impl ModuleResolver {
    /// Создать резолвер относительно текущей директории.
    pub fn new() -> Self {
        Self::with_base_dir(PathBuf::from("."), "json")
    }

    /// Создать резолвер с базовой директорией и расширением.
    pub fn with_base_dir(base_dir: PathBuf, extension: &str) -> Self {
        Self {
            base_dir,
            extension: extension.trim_start_matches('.').to_string(),
            cache: HashMap::new(),
        }
    }

    /// Очистить кэш.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Разрешить ссылку в путь к файлу.
    pub fn resolve(&mut self, reference: &str) -> SinjResult<PathBuf> {
        if reference.trim().is_empty() {
            return Err(SinjError::ModuleNotFound(reference.to_string()));
        }

        // Проверяем кэш
        if let Some(path) = self.cache.get(reference) {
            return Ok(path.clone());
        }

        let path = self.normalize_extension(&self.base_dir.join(reference));
        self.cache.insert(reference.to_string(), path.clone());

        Ok(path)
    }

    /// Дописать расширение, если оно отсутствует или отличается.
    pub fn normalize_extension(&self, path: &Path) -> PathBuf {
        let matches = path
            .extension()
            .map(|ext| ext == self.extension.as_str())
            .unwrap_or(false);

        if matches || self.extension.is_empty() {
            return path.to_path_buf();
        }

        let mut normalized = path.as_os_str().to_os_string();
        normalized.push(".");
        normalized.push(&self.extension);
        PathBuf::from(normalized)
    }

    /// Базовая директория.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl Default for ModuleResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_creation() {
        let resolver = ModuleResolver::new();
        assert_eq!(resolver.base_dir(), Path::new("."));
        assert_eq!(resolver.extension(), "json");
    }

    #[test]
    fn test_appends_missing_extension() {
        let mut resolver = ModuleResolver::with_base_dir(PathBuf::from("/srv/app"), ".json");

        let path = resolver.resolve("lib/db").unwrap();
        assert_eq!(path, PathBuf::from("/srv/app/lib/db.json"));

        let path = resolver.resolve("lib/db.json").unwrap();
        assert_eq!(path, PathBuf::from("/srv/app/lib/db.json"));

        // ".v1" не является расширением юнита
        let path = resolver.resolve("lib/api.v1").unwrap();
        assert_eq!(path, PathBuf::from("/srv/app/lib/api.v1.json"));
    }

    #[test]
    fn test_empty_reference() {
        let mut resolver = ModuleResolver::new();
        assert!(matches!(
            resolver.resolve("  "),
            Err(SinjError::ModuleNotFound(_))
        ));
    }

    #[test]
    fn test_cache() {
        let mut resolver = ModuleResolver::with_base_dir(PathBuf::from("/srv"), "json");

        let _ = resolver.resolve("cached");
        assert!(resolver.cache.contains_key("cached"));

        resolver.clear_cache();
        assert!(!resolver.cache.contains_key("cached"));
    }
}
