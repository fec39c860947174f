//! Система модулей Sinj.
//!
//! Автор модуля объявляет пространство имён со списком зависимостей и
//! регистрирует в нём типизированные методы:
//!
//! ```rust
//! use sinj::{Engine, Injectable};
//! use serde_json::json;
//!
//! let mut engine = Engine::new();
//! engine
//!     .create_module("core", ["utils"])?
//!     .controller("init", vec![Injectable::callable(|_| Ok(json!("ready")))])?;
//! engine.create_module("utils", Vec::<String>::new())?;
//!
//! let report = engine.seal()?.expect("first seal runs the pass");
//! assert!(report.contains("core", "controller", "init"));
//! # Ok::<(), sinj::SinjError>(())
//! ```
//!
//! Зависимости бывают двух видов:
//! - список имён (непроверенный): существование проверяется при `seal()`;
//! - отображение `алиас -> ссылка` (проверенный): внешний юнит загружается
//!   и исполняется сразу.

mod handle;
mod loader;
mod namespace;
mod registry;
mod resolver;
mod validator;

pub use handle::ModuleHandle;
pub use loader::{JsonScriptHost, ScriptHost, ScriptUnit, SourceCache};
pub use namespace::{Namespace, NamespaceRegistry};
pub use registry::{Injectable, Method, MethodFn, MethodRegistry, MethodType};
pub use resolver::ModuleResolver;
pub use validator::{resolve_dependencies, sweep_duplicates};

use std::path::PathBuf;
use std::time::Duration;

use indexmap::IndexMap;

/// Бюджет исполнения одного внешнего юнита по умолчанию.
pub const DEFAULT_TIMEOUT_MS: u64 = 180_000;

/// Конфигурация модульной системы.
#[derive(Debug, Clone)]
pub struct ModuleConfig {
    /// Бюджет времени на исполнение одного внешнего юнита
    pub timeout: Duration,
    /// Директория, относительно которой разрешаются ссылки
    pub base_dir: PathBuf,
    /// Расширение файлов юнитов (добавляется, если отсутствует)
    pub extension: String,
}

impl ModuleConfig {
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout = Duration::from_millis(ms);
        self
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            base_dir: PathBuf::from("."),
            extension: "json".to_string(),
        }
    }
}

/// Одна объявленная зависимость пространства имён.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// Голое имя, проверяется при валидации
    Lazy(String),
    /// Внешний юнит, загружается немедленно и помечается разрешённым
    Eager { alias: String, reference: String },
}

/// Список зависимостей, передаваемый в `create_module`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleDependencies {
    /// Упорядоченный список имён пространств (непроверенная форма)
    Unverified(Vec<String>),
    /// Упорядоченное отображение алиас -> ссылка на юнит (проверенная форма).
    /// Алиасы уникальны: повторный алиас заменяет ссылку, сохраняя позицию.
    Verified(IndexMap<String, String>),
}

impl ModuleDependencies {
    pub fn none() -> Self {
        ModuleDependencies::Unverified(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ModuleDependencies::Unverified(names) => names.is_empty(),
            ModuleDependencies::Verified(units) => units.is_empty(),
        }
    }

    /// Развернуть в отдельные объявления.
    pub fn into_dependencies(self) -> Vec<Dependency> {
        match self {
            ModuleDependencies::Unverified(names) => {
                names.into_iter().map(Dependency::Lazy).collect()
            }
            ModuleDependencies::Verified(units) => units
                .into_iter()
                .map(|(alias, reference)| Dependency::Eager { alias, reference })
                .collect(),
        }
    }
}

impl Default for ModuleDependencies {
    fn default() -> Self {
        Self::none()
    }
}

impl From<Vec<String>> for ModuleDependencies {
    fn from(names: Vec<String>) -> Self {
        ModuleDependencies::Unverified(names)
    }
}

impl From<Vec<&str>> for ModuleDependencies {
    fn from(names: Vec<&str>) -> Self {
        ModuleDependencies::Unverified(names.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ModuleDependencies {
    fn from(names: [&str; N]) -> Self {
        ModuleDependencies::Unverified(names.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[(&str, &str); N]> for ModuleDependencies {
    fn from(units: [(&str, &str); N]) -> Self {
        ModuleDependencies::Verified(
            units
                .iter()
                .map(|(alias, reference)| (alias.to_string(), reference.to_string()))
                .collect(),
        )
    }
}

impl From<Vec<(String, String)>> for ModuleDependencies {
    fn from(units: Vec<(String, String)>) -> Self {
        ModuleDependencies::Verified(units.into_iter().collect())
    }
}

impl From<IndexMap<String, String>> for ModuleDependencies {
    fn from(units: IndexMap<String, String>) -> Self {
        ModuleDependencies::Verified(units)
    }
}
