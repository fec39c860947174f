//! Реестр методов и индекс типов.
//!
//! Для каждого пространства имён хранится отображение `имя метода -> запись`,
//! а также производный индекс `тег типа -> множество имён методов`.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use log::debug;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{RegistryError, SinjResult};

/// Тег типа метода ("controller", "worker" или любой другой).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodType(Cow<'static, str>);

impl MethodType {
    pub const CONTROLLER: MethodType = MethodType(Cow::Borrowed("controller"));
    pub const WORKER: MethodType = MethodType(Cow::Borrowed("worker"));

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MethodType {
    fn from(tag: &str) -> Self {
        match tag {
            "controller" => Self::CONTROLLER,
            "worker" => Self::WORKER,
            other => MethodType(Cow::Owned(other.to_string())),
        }
    }
}

impl From<String> for MethodType {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

impl fmt::Display for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for MethodType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Вызываемая реализация метода. Получает собственную запись метода.
pub type MethodFn = Arc<dyn Fn(&Method) -> SinjResult<Value> + Send + Sync>;

/// Элемент списка зависимостей и реализации.
#[derive(Clone)]
pub enum Injectable {
    /// Обычное значение (идентификатор зависимости, константа и т.п.)
    Value(Value),
    /// Вызываемая реализация
    Callable(MethodFn),
}

impl Injectable {
    /// Обернуть замыкание в вызываемую реализацию.
    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(&Method) -> SinjResult<Value> + Send + Sync + 'static,
    {
        Injectable::Callable(Arc::new(f))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Injectable::Callable(_))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Injectable::Value(v) => Some(v),
            Injectable::Callable(_) => None,
        }
    }
}

impl fmt::Debug for Injectable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Injectable::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Injectable::Callable(_) => write!(f, "Callable"),
        }
    }
}

// Вызываемые сравниваются по идентичности указателя.
impl PartialEq for Injectable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Injectable::Value(a), Injectable::Value(b)) => a == b,
            (Injectable::Callable(a), Injectable::Callable(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Serialize for Injectable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Injectable::Value(v) => v.serialize(serializer),
            Injectable::Callable(_) => serializer.serialize_str("[Function]"),
        }
    }
}

impl From<&str> for Injectable {
    fn from(name: &str) -> Self {
        Injectable::Value(Value::String(name.to_string()))
    }
}

impl From<String> for Injectable {
    fn from(name: String) -> Self {
        Injectable::Value(Value::String(name))
    }
}

impl From<Value> for Injectable {
    fn from(value: Value) -> Self {
        Injectable::Value(value)
    }
}

/// Зарегистрированный метод. После создания не изменяется.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Method {
    /// Пространство имён-владелец
    pub namespace: String,
    /// Имя метода
    pub name: String,
    /// Тег типа
    #[serde(rename = "type")]
    pub method_type: MethodType,
    /// Собственные зависимости метода (всё, кроме последнего элемента)
    pub dependency: Vec<Injectable>,
    /// Реализация (последний элемент списка)
    #[serde(rename = "method")]
    pub implementation: Injectable,
}

/// Реестр методов с индексом типов.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    /// namespace -> имя -> метод
    methods: IndexMap<String, IndexMap<String, Method>>,
    /// namespace -> тег -> имена методов
    types: IndexMap<String, IndexMap<MethodType, IndexSet<String>>>,
}

impl MethodRegistry {
    /// Создать новый реестр.
    pub fn new() -> Self {
        Self::default()
    }

    /// Подготовить пустые слоты для пространства имён.
    pub fn create_namespace(&mut self, namespace: &str) {
        self.methods.entry(namespace.to_string()).or_default();
        self.types.entry(namespace.to_string()).or_default();
    }

    /// Зарегистрировать метод.
    ///
    /// Последний элемент `inject` становится реализацией, всё предшествующее
    /// сохраняется как зависимости метода. При ошибке реестр не изменяется.
    pub fn register(
        &mut self,
        namespace: &str,
        method_type: MethodType,
        name: &str,
        mut inject: Vec<Injectable>,
    ) -> Result<&Method, RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::missing_parameter(namespace));
        }

        let implementation = inject
            .pop()
            .ok_or_else(|| RegistryError::missing_parameter(namespace))?;

        let slot = self
            .methods
            .get_mut(namespace)
            .ok_or_else(|| RegistryError::unknown(namespace))?;

        if slot.contains_key(name) {
            return Err(RegistryError::duplicate_method(namespace, name));
        }

        debug!(
            "method '{}' registered in '{}' as {} ({} dependencies)",
            name,
            namespace,
            method_type,
            inject.len()
        );

        self.types
            .entry(namespace.to_string())
            .or_default()
            .entry(method_type.clone())
            .or_default()
            .insert(name.to_string());

        let method = Method {
            namespace: namespace.to_string(),
            name: name.to_string(),
            method_type,
            dependency: inject,
            implementation,
        };

        Ok(slot.entry(name.to_string()).or_insert(method))
    }

    /// Получить метод.
    pub fn get(&self, namespace: &str, name: &str) -> Option<&Method> {
        self.methods.get(namespace)?.get(name)
    }

    /// Все методы пространства в порядке регистрации.
    pub fn methods_of(&self, namespace: &str) -> impl Iterator<Item = &Method> {
        self.methods
            .get(namespace)
            .into_iter()
            .flat_map(|slot| slot.values())
    }

    /// Теги типов пространства в порядке первой регистрации.
    pub fn types_of(&self, namespace: &str) -> impl Iterator<Item = &MethodType> {
        self.types
            .get(namespace)
            .into_iter()
            .flat_map(|index| index.keys())
    }

    /// Имена методов данного типа внутри пространства.
    pub fn names_of_type(
        &self,
        namespace: &str,
        method_type: &MethodType,
    ) -> impl Iterator<Item = &str> {
        self.types
            .get(namespace)
            .and_then(|index| index.get(method_type))
            .into_iter()
            .flat_map(|names| names.iter().map(String::as_str))
    }

    /// Проверить, зарегистрирован ли метод.
    pub fn contains(&self, namespace: &str, name: &str) -> bool {
        self.get(namespace, name).is_some()
    }

    /// Общее количество методов.
    pub fn count(&self) -> usize {
        self.methods.values().map(IndexMap::len).sum()
    }

    pub(crate) fn method_table(&self) -> &IndexMap<String, IndexMap<String, Method>> {
        &self.methods
    }

    pub(crate) fn type_table(&self) -> &IndexMap<String, IndexMap<MethodType, IndexSet<String>>> {
        &self.types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn registry_with(namespace: &str) -> MethodRegistry {
        let mut registry = MethodRegistry::new();
        registry.create_namespace(namespace);
        registry
    }

    #[test]
    fn test_register_splits_dependencies() {
        let mut registry = registry_with("svc");
        let job = Injectable::callable(|_| Ok(json!("done")));

        let method = registry
            .register(
                "svc",
                MethodType::WORKER,
                "job",
                vec!["depA".into(), "depB".into(), job.clone()],
            )
            .unwrap();

        assert_eq!(method.dependency, vec![Injectable::from("depA"), "depB".into()]);
        assert_eq!(method.implementation, job);
        assert_eq!(method.method_type, MethodType::WORKER);
    }

    #[test]
    fn test_type_index() {
        let mut registry = registry_with("core");
        registry
            .register("core", MethodType::CONTROLLER, "init", vec![json!(1).into()])
            .unwrap();
        registry
            .register("core", MethodType::WORKER, "sync", vec![json!(2).into()])
            .unwrap();
        registry
            .register("core", MethodType::CONTROLLER, "boot", vec![json!(3).into()])
            .unwrap();

        let controllers: Vec<_> = registry
            .names_of_type("core", &MethodType::CONTROLLER)
            .collect();
        assert_eq!(controllers, vec!["init", "boot"]);
        assert_eq!(
            registry.types_of("core").collect::<Vec<_>>(),
            vec![&MethodType::CONTROLLER, &MethodType::WORKER]
        );
        assert_eq!(registry.count(), 3);
    }

    #[test]
    fn test_duplicate_across_types() {
        let mut registry = registry_with("core");
        registry
            .register("core", MethodType::CONTROLLER, "init", vec!["x".into()])
            .unwrap();

        let err = registry
            .register("core", MethodType::WORKER, "init", vec!["y".into()])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateNaming);
        assert_eq!(err.name.as_deref(), Some("init"));

        // первая запись осталась нетронутой
        let method = registry.get("core", "init").unwrap();
        assert_eq!(method.method_type, MethodType::CONTROLLER);
        assert_eq!(
            registry.names_of_type("core", &MethodType::WORKER).count(),
            0
        );
    }

    #[test]
    fn test_missing_parameters_leave_registry_untouched() {
        let mut registry = registry_with("core");

        let err = registry
            .register("core", MethodType::CONTROLLER, "", vec!["x".into()])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingParameter);

        let err = registry
            .register("core", MethodType::CONTROLLER, "init", vec![])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingParameter);
        assert_eq!(err.to_string(), "Missing parameter. Module: core");

        assert_eq!(registry.count(), 0);
        assert_eq!(registry.types_of("core").count(), 0);
    }

    #[test]
    fn test_unknown_namespace() {
        let mut registry = MethodRegistry::new();
        let err = registry
            .register("ghost", MethodType::WORKER, "job", vec!["x".into()])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unknown);
    }

    #[test]
    fn test_custom_type_tag() {
        assert_eq!(MethodType::from("controller"), MethodType::CONTROLLER);
        let tag = MethodType::from("listener");
        assert_eq!(tag.as_str(), "listener");
        assert_eq!(serde_json::to_value(&tag).unwrap(), json!("listener"));
    }

    #[test]
    fn test_method_serialization() {
        let mut registry = registry_with("svc");
        let method = registry
            .register(
                "svc",
                MethodType::WORKER,
                "job",
                vec!["db".into(), Injectable::callable(|_| Ok(Value::Null))],
            )
            .unwrap();

        assert_eq!(
            serde_json::to_value(method).unwrap(),
            json!({
                "namespace": "svc",
                "name": "job",
                "type": "worker",
                "dependency": ["db"],
                "method": "[Function]",
            })
        );
    }
}
