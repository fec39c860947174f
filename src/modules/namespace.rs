//! Реестр пространств имён.
//!
//! Хранит каждое созданное пространство имён и набор ссылок на другие
//! пространства, каждая с флагом "разрешена / не разрешена".

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

use crate::error::RegistryError;

/// Объявленное пространство имён.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Namespace {
    /// Имя пространства
    pub name: String,
    /// Ссылки на другие пространства: имя (или алиас) -> разрешена ли
    pub dependencies: IndexMap<String, bool>,
}

impl Namespace {
    /// Создать пустое пространство имён.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: IndexMap::new(),
        }
    }

    /// Все ли ссылки уже разрешены.
    pub fn is_resolved(&self) -> bool {
        self.dependencies.values().all(|&resolved| resolved)
    }

    /// Неразрешённые ссылки в порядке объявления.
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .filter(|(_, resolved)| !**resolved)
            .map(|(name, _)| name.as_str())
    }
}

/// Реестр пространств имён (в порядке создания).
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct NamespaceRegistry {
    namespaces: IndexMap<String, Namespace>,
}

impl NamespaceRegistry {
    /// Создать новый реестр.
    pub fn new() -> Self {
        Self::default()
    }

    /// Создать пространство имён. Имя должно быть уникальным на весь реестр.
    pub fn create(&mut self, name: &str) -> Result<&mut Namespace, RegistryError> {
        if self.namespaces.contains_key(name) {
            return Err(RegistryError::duplicate_namespace(name));
        }

        debug!("namespace '{}' created", name);
        let entry = self
            .namespaces
            .entry(name.to_string())
            .or_insert_with(|| Namespace::new(name));
        Ok(entry)
    }

    /// Записать ссылку `namespace -> dependency`.
    ///
    /// Флаг только повышается: уже разрешённая ссылка не становится снова
    /// неразрешённой.
    pub fn declare(
        &mut self,
        namespace: &str,
        dependency: &str,
        resolved: bool,
    ) -> Result<(), RegistryError> {
        let entry = self
            .namespaces
            .get_mut(namespace)
            .ok_or_else(|| RegistryError::unknown(namespace))?;

        let flag = entry
            .dependencies
            .entry(dependency.to_string())
            .or_insert(false);
        *flag |= resolved;

        debug!(
            "namespace '{}' declares '{}' (resolved: {})",
            namespace, dependency, *flag
        );
        Ok(())
    }

    /// Получить пространство по имени.
    pub fn get(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Namespace> {
        self.namespaces.get_mut(name)
    }

    /// Существует ли пространство.
    pub fn contains(&self, name: &str) -> bool {
        self.namespaces.contains_key(name)
    }

    /// Имена всех пространств в порядке создания.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    /// Все пространства в порядке создания.
    pub fn iter(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.values()
    }

    pub fn count(&self) -> usize {
        self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }
}
