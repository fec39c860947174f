//! Загрузка и исполнение внешних юнитов.
//!
//! Ядро не знает, как устроен юнит: чтение и исполнение делегируются
//! [`ScriptHost`]. Хост получает ссылку на тот же [`Engine`], поэтому
//! исполняемый юнит может регистрировать новые пространства имён и методы.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use log::{debug, trace};
use serde::Deserialize;
use serde_json::Value;

use crate::engine::Engine;
use crate::error::{SinjError, SinjResult};

use super::{Injectable, ModuleDependencies};

/// Юнит, готовый к исполнению.
#[derive(Debug, Clone)]
pub struct ScriptUnit {
    /// Разрешённый путь
    pub path: PathBuf,
    /// Исходный текст
    pub source: Arc<str>,
    /// Бюджет времени на исполнение
    pub timeout: Duration,
}

/// Внешний исполнитель юнитов.
pub trait ScriptHost {
    /// Прочитать исходный текст юнита.
    fn read(&self, path: &Path) -> SinjResult<String>;

    /// Исполнить юнит. Ошибки исполнения возвращаются вызывающему как есть.
    fn execute(&self, unit: &ScriptUnit, engine: &mut Engine) -> SinjResult<()>;
}

/// Кэш исходных текстов по разрешённому пути.
#[derive(Debug, Default)]
pub struct SourceCache {
    entries: HashMap<PathBuf, Arc<str>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Вернуть текст из кэша или прочитать его через хост.
    pub fn get_or_read(&mut self, path: &Path, host: &dyn ScriptHost) -> SinjResult<Arc<str>> {
        if let Some(source) = self.entries.get(path) {
            trace!("source cache hit: {}", path.display());
            return Ok(Arc::clone(source));
        }

        let source: Arc<str> = Arc::from(host.read(path)?);
        self.entries.insert(path.to_path_buf(), Arc::clone(&source));
        Ok(source)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Забыть один путь (например, если файл изменился).
    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Хост по умолчанию: юнит это JSON-документ с одним или несколькими
/// объявлениями модулей.
///
/// ```json
/// [
///   {
///     "module": "core",
///     "dependencies": ["utils"],
///     "methods": [{ "type": "controller", "name": "init", "inject": ["db", "ready"] }]
///   }
/// ]
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonScriptHost;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UnitDocument {
    Many(Vec<Statement>),
    One(Statement),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Statement {
    module: String,
    #[serde(default)]
    dependencies: DependencyDecl,
    #[serde(default)]
    methods: Vec<MethodDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DependencyDecl {
    List(Vec<String>),
    Map(IndexMap<String, String>),
}

impl Default for DependencyDecl {
    fn default() -> Self {
        DependencyDecl::List(Vec::new())
    }
}

impl DependencyDecl {
    fn into_module_dependencies(self) -> ModuleDependencies {
        match self {
            DependencyDecl::List(names) => ModuleDependencies::Unverified(names),
            DependencyDecl::Map(units) => ModuleDependencies::Verified(units),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MethodDecl {
    #[serde(rename = "type")]
    method_type: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inject: Vec<Value>,
}

impl JsonScriptHost {
    fn parse(unit: &ScriptUnit) -> SinjResult<Vec<Statement>> {
        let document: UnitDocument =
            serde_json::from_str(&unit.source).map_err(|e| SinjError::ParseError {
                path: unit.path.clone(),
                message: e.to_string(),
            })?;

        Ok(match document {
            UnitDocument::Many(statements) => statements,
            UnitDocument::One(statement) => vec![statement],
        })
    }
}

impl ScriptHost for JsonScriptHost {
    fn read(&self, path: &Path) -> SinjResult<String> {
        fs::read_to_string(path).map_err(|e| {
            SinjError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })
    }

    fn execute(&self, unit: &ScriptUnit, engine: &mut Engine) -> SinjResult<()> {
        let started = Instant::now();
        let statements = Self::parse(unit)?;

        debug!(
            "executing {} ({} statements)",
            unit.path.display(),
            statements.len()
        );

        for statement in statements {
            if started.elapsed() >= unit.timeout {
                return Err(SinjError::Timeout {
                    path: unit.path.clone(),
                    timeout_ms: unit.timeout.as_millis(),
                });
            }

            let dependencies = statement.dependencies.into_module_dependencies();
            let mut handle = engine.create_module(&statement.module, dependencies)?;
            for method in statement.methods {
                let inject = method.inject.into_iter().map(Injectable::Value).collect();
                handle.register(method.method_type, &method.name, inject)?;
            }
        }

        Ok(())
    }
}
