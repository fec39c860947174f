//! Запуск зарегистрированных методов после успешной валидации.

use log::debug;
use serde::Serialize;
use serde_json::Value;

use crate::engine::RegistrySnapshot;
use crate::error::SinjResult;
use crate::modules::{Injectable, Method, MethodType};

/// Результат одного метода.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invocation {
    pub namespace: String,
    #[serde(rename = "type")]
    pub method_type: MethodType,
    pub name: String,
    pub outcome: Value,
}

/// Отчёт об исполнении.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionReport {
    pub invocations: Vec<Invocation>,
}

impl ExecutionReport {
    /// Был ли исполнен метод `namespace -> name` с данным типом.
    pub fn contains(&self, namespace: &str, method_type: &str, name: &str) -> bool {
        self.invocations.iter().any(|inv| {
            inv.namespace == namespace && inv.method_type.as_str() == method_type && inv.name == name
        })
    }

    /// Результат метода, если он исполнялся.
    pub fn outcome(&self, namespace: &str, name: &str) -> Option<&Value> {
        self.invocations
            .iter()
            .find(|inv| inv.namespace == namespace && inv.name == name)
            .map(|inv| &inv.outcome)
    }

    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }
}

/// Стратегия исполнения. Порядок вызова методов определяет реализация.
pub trait Executor {
    fn execute(&mut self, snapshot: &RegistrySnapshot<'_>) -> SinjResult<ExecutionReport>;
}

/// Последовательный исполнитель по умолчанию.
///
/// Пространства в порядке создания, типы в порядке первой регистрации,
/// методы в порядке регистрации. Первая ошибка останавливает исполнение.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialExecutor;

impl SequentialExecutor {
    fn invoke(method: &Method) -> SinjResult<Value> {
        match &method.implementation {
            Injectable::Callable(f) => f(method),
            Injectable::Value(v) => Ok(v.clone()),
        }
    }
}

impl Executor for SequentialExecutor {
    fn execute(&mut self, snapshot: &RegistrySnapshot<'_>) -> SinjResult<ExecutionReport> {
        let mut report = ExecutionReport::default();
        let methods = snapshot.methods;

        for namespace in snapshot.namespaces.names() {
            for method_type in methods.types_of(namespace) {
                for name in methods.names_of_type(namespace, method_type) {
                    let Some(method) = methods.get(namespace, name) else {
                        continue;
                    };

                    debug!("invoking {} '{}' in '{}'", method_type, name, namespace);
                    let outcome = Self::invoke(method)?;

                    report.invocations.push(Invocation {
                        namespace: namespace.to_string(),
                        method_type: method_type.clone(),
                        name: name.to_string(),
                        outcome,
                    });
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinjError;
    use crate::modules::{MethodRegistry, NamespaceRegistry};
    use serde_json::json;

    fn fixture() -> (NamespaceRegistry, MethodRegistry) {
        let mut namespaces = NamespaceRegistry::new();
        let mut methods = MethodRegistry::new();
        for ns in ["core", "svc"] {
            namespaces.create(ns).unwrap();
            methods.create_namespace(ns);
        }
        (namespaces, methods)
    }

    #[test]
    fn test_invocation_order() {
        let (namespaces, mut methods) = fixture();
        methods
            .register("svc", MethodType::WORKER, "job", vec![json!(1).into()])
            .unwrap();
        methods
            .register("core", MethodType::WORKER, "sync", vec![json!(2).into()])
            .unwrap();
        methods
            .register("core", MethodType::CONTROLLER, "init", vec![json!(3).into()])
            .unwrap();

        let snapshot = RegistrySnapshot {
            namespaces: &namespaces,
            methods: &methods,
        };
        let report = SequentialExecutor.execute(&snapshot).unwrap();

        let order: Vec<_> = report.invocations.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(order, vec!["sync", "init", "job"]);
        assert_eq!(report.outcome("core", "init"), Some(&json!(3)));
        assert!(report.contains("svc", "worker", "job"));
        assert!(!report.contains("svc", "controller", "job"));
    }

    #[test]
    fn test_callable_receives_own_record() {
        let (namespaces, mut methods) = fixture();
        methods
            .register(
                "core",
                MethodType::CONTROLLER,
                "init",
                vec![
                    "db".into(),
                    Injectable::callable(|m| Ok(json!(format!("{}:{}", m.name, m.dependency.len())))),
                ],
            )
            .unwrap();

        let snapshot = RegistrySnapshot {
            namespaces: &namespaces,
            methods: &methods,
        };
        let report = SequentialExecutor.execute(&snapshot).unwrap();
        assert_eq!(report.outcome("core", "init"), Some(&json!("init:1")));
    }

    #[test]
    fn test_first_failure_stops() {
        let (namespaces, mut methods) = fixture();
        methods
            .register(
                "core",
                MethodType::WORKER,
                "boom",
                vec![Injectable::callable(|m| {
                    Err(SinjError::MethodFailed {
                        namespace: m.namespace.clone(),
                        name: m.name.clone(),
                        message: "boom".into(),
                    })
                })],
            )
            .unwrap();
        methods
            .register("svc", MethodType::WORKER, "job", vec![json!(1).into()])
            .unwrap();

        let snapshot = RegistrySnapshot {
            namespaces: &namespaces,
            methods: &methods,
        };
        let err = SequentialExecutor.execute(&snapshot).unwrap_err();
        assert_eq!(err.to_string(), "Method core -> boom failed: boom");
    }
}
