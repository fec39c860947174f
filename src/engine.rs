//! Движок регистрации: единый владеющий контекст.
//!
//! Работа идёт в две фазы:
//!
//! 1. **Регистрация**: синхронные вызовы [`Engine::create_module`] и
//!    регистрация методов через [`ModuleHandle`]. Проверенные зависимости
//!    загружаются и исполняются сразу; исполняемый юнит может рекурсивно
//!    регистрировать другие пространства.
//! 2. **Валидация и исполнение**: [`Engine::seal`]. Выполняется ровно один
//!    раз: проверяет ссылки между пространствами, сверяет реестр методов и
//!    передаёт его исполнителю. Повторные вызовы ничего не делают.
//!
//! Благодаря барьеру пространство может ссылаться на другое, объявленное
//! позже в той же фазе регистрации.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, info};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::error::{RegistryError, SinjError, SinjResult};
use crate::executor::{ExecutionReport, Executor, SequentialExecutor};
use crate::modules::{
    resolve_dependencies, sweep_duplicates, Dependency, Injectable, JsonScriptHost, Method,
    MethodRegistry, MethodType, ModuleConfig, ModuleDependencies, ModuleHandle, ModuleResolver,
    NamespaceRegistry, ScriptHost, ScriptUnit, SourceCache,
};

/// Снимок всех трёх реестров, передаваемый исполнителю.
#[derive(Debug, Clone, Copy)]
pub struct RegistrySnapshot<'a> {
    pub namespaces: &'a NamespaceRegistry,
    pub methods: &'a MethodRegistry,
}

impl Serialize for RegistrySnapshot<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RegistrySnapshot", 3)?;
        state.serialize_field("namespaces", self.namespaces)?;
        state.serialize_field("methods", self.methods.method_table())?;
        state.serialize_field("types", self.methods.type_table())?;
        state.end()
    }
}

/// Движок модульной системы.
pub struct Engine {
    config: ModuleConfig,
    namespaces: NamespaceRegistry,
    methods: MethodRegistry,
    resolver: ModuleResolver,
    cache: SourceCache,
    host: Rc<dyn ScriptHost>,
    executor: Box<dyn Executor>,
    /// Отложенный проход уже запускался
    executed: bool,
    /// Сколько пространств запросили отложенный проход
    scheduled: usize,
}

impl Engine {
    /// Создать движок с конфигурацией по умолчанию.
    pub fn new() -> Self {
        Self::with_config(ModuleConfig::default())
    }

    /// Создать движок с конфигурацией.
    pub fn with_config(config: ModuleConfig) -> Self {
        let resolver = ModuleResolver::with_base_dir(config.base_dir.clone(), &config.extension);
        Self {
            config,
            namespaces: NamespaceRegistry::new(),
            methods: MethodRegistry::new(),
            resolver,
            cache: SourceCache::new(),
            host: Rc::new(JsonScriptHost),
            executor: Box::new(SequentialExecutor),
            executed: false,
            scheduled: 0,
        }
    }

    /// Заменить хост внешних юнитов.
    pub fn with_host(mut self, host: impl ScriptHost + 'static) -> Self {
        self.host = Rc::new(host);
        self
    }

    /// Заменить стратегию исполнения.
    pub fn with_executor(mut self, executor: impl Executor + 'static) -> Self {
        self.executor = Box::new(executor);
        self
    }

    fn ensure_open(&self, namespace: &str) -> SinjResult<()> {
        if self.executed {
            return Err(SinjError::Sealed(namespace.to_string()));
        }
        Ok(())
    }

    /// Объявить пространство имён со списком зависимостей.
    ///
    /// Имя должно быть непустым и уникальным. Непроверенные зависимости
    /// записываются неразрешёнными; проверенные загружаются и исполняются
    /// до возврата из вызова, и их ошибки возвращаются отсюда же.
    pub fn create_module(
        &mut self,
        namespace: &str,
        dependencies: impl Into<ModuleDependencies>,
    ) -> SinjResult<ModuleHandle<'_>> {
        self.ensure_open(namespace)?;

        if namespace.is_empty() {
            return Err(RegistryError::missing_parameter(namespace).into());
        }

        self.namespaces.create(namespace)?;
        self.methods.create_namespace(namespace);
        self.scheduled += 1;

        match dependencies.into() {
            ModuleDependencies::Unverified(names) => {
                for name in names {
                    self.namespaces.declare(namespace, &name, false)?;
                }
            }
            ModuleDependencies::Verified(units) => self.load_verified(namespace, &units)?,
        }

        Ok(ModuleHandle::new(self, namespace.to_string()))
    }

    /// Объявить одну зависимость уже существующего пространства.
    pub fn declare_dependency(&mut self, namespace: &str, dependency: Dependency) -> SinjResult<()> {
        self.ensure_open(namespace)?;

        match dependency {
            Dependency::Lazy(name) => self.namespaces.declare(namespace, &name, false)?,
            Dependency::Eager { alias, reference } => {
                self.load_verified(namespace, &IndexMap::from([(alias, reference)]))?
            }
        }
        Ok(())
    }

    /// Зарегистрировать метод в пространстве имён.
    ///
    /// Последний элемент `inject` является реализацией. Дубликаты и
    /// отсутствующие параметры отклоняются сразу.
    pub fn register_method(
        &mut self,
        namespace: &str,
        method_type: MethodType,
        name: &str,
        inject: Vec<Injectable>,
    ) -> SinjResult<&Method> {
        self.ensure_open(namespace)?;
        Ok(self.methods.register(namespace, method_type, name, inject)?)
    }

    /// Загрузить и исполнить внешний юнит, не привязанный к пространству.
    pub fn load_unit(&mut self, reference: &str) -> SinjResult<()> {
        if self.executed {
            return Err(SinjError::SealedUnit(reference.to_string()));
        }
        let unit = self.prepare_unit(reference)?;
        self.execute_units(std::slice::from_ref(&unit))
    }

    // Сначала все ссылки разрешаются и помечаются, затем юниты исполняются
    // в порядке объявления.
    fn load_verified(
        &mut self,
        namespace: &str,
        units: &IndexMap<String, String>,
    ) -> SinjResult<()> {
        if !self.namespaces.contains(namespace) {
            return Err(RegistryError::unknown(namespace).into());
        }

        let mut pending = Vec::with_capacity(units.len());
        for (alias, reference) in units {
            let unit = self.prepare_unit(reference)?;
            self.namespaces.declare(namespace, alias, true)?;
            pending.push(unit);
        }

        self.execute_units(&pending)
    }

    fn prepare_unit(&mut self, reference: &str) -> SinjResult<ScriptUnit> {
        let path = self.resolver.resolve(reference)?;
        let source = self.cache.get_or_read(&path, self.host.as_ref())?;

        Ok(ScriptUnit {
            path,
            source,
            timeout: self.config.timeout,
        })
    }

    fn execute_units(&mut self, units: &[ScriptUnit]) -> SinjResult<()> {
        let host = Rc::clone(&self.host);
        for unit in units {
            debug!("loading unit {}", unit.path.display());
            host.execute(unit, self)?;
        }
        Ok(())
    }

    /// Закрыть фазу регистрации и выполнить отложенный проход.
    ///
    /// Первый вызов проверяет зависимости, сверяет реестр методов и
    /// запускает исполнителя, возвращая `Some(report)`. Флаг выставляется до
    /// проверки, так что проход не повторяется даже после ошибки; все
    /// последующие вызовы возвращают `Ok(None)`.
    pub fn seal(&mut self) -> SinjResult<Option<ExecutionReport>> {
        if self.executed {
            debug!("deferred pass already ran, skipping");
            return Ok(None);
        }
        self.executed = true;

        info!(
            "deferred pass: {} namespaces, {} methods ({} scheduled)",
            self.namespaces.count(),
            self.methods.count(),
            self.scheduled
        );

        let resolved = resolve_dependencies(&mut self.namespaces)?;
        let checked = sweep_duplicates(&self.methods);
        debug!("{} dependencies resolved, {} methods checked", resolved, checked);

        let snapshot = RegistrySnapshot {
            namespaces: &self.namespaces,
            methods: &self.methods,
        };
        let report = self.executor.execute(&snapshot)?;

        info!("deferred pass complete: {} methods executed", report.len());
        Ok(Some(report))
    }

    /// Выполнить пакет регистраций и сразу закрыть фазу.
    pub fn burst<F>(&mut self, register: F) -> SinjResult<Option<ExecutionReport>>
    where
        F: FnOnce(&mut Engine) -> SinjResult<()>,
    {
        register(self)?;
        self.seal()
    }

    /// Был ли уже выполнен отложенный проход.
    pub fn is_sealed(&self) -> bool {
        self.executed
    }

    /// Сколько пространств запросили отложенный проход.
    pub fn scheduled(&self) -> usize {
        self.scheduled
    }

    pub fn namespaces(&self) -> &NamespaceRegistry {
        &self.namespaces
    }

    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    /// Получить метод.
    pub fn method(&self, namespace: &str, name: &str) -> Option<&Method> {
        self.methods.get(namespace, name)
    }

    pub fn cache(&self) -> &SourceCache {
        &self.cache
    }

    /// Забыть кэшированный текст юнита, чтобы при следующей загрузке
    /// он был прочитан заново.
    pub fn invalidate(&mut self, reference: &str) -> SinjResult<bool> {
        let path = self.resolver.resolve(reference)?;
        Ok(self.cache.invalidate(&path))
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Снимок реестров (для вывода или собственного исполнителя).
    pub fn snapshot(&self) -> RegistrySnapshot<'_> {
        RegistrySnapshot {
            namespaces: &self.namespaces,
            methods: &self.methods,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("namespaces", &self.namespaces)
            .field("methods", &self.methods)
            .field("executed", &self.executed)
            .finish_non_exhaustive()
    }
}
