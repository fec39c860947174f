//! Дескриптор пространства имён: публичный API регистрации методов.

use crate::engine::Engine;
use crate::error::SinjResult;

use super::{Injectable, MethodType};

/// Дескриптор, возвращаемый [`Engine::create_module`].
///
/// Вызовы цепочечные: каждый возвращает тот же дескриптор.
///
/// ```rust
/// # use sinj::{Engine, Injectable};
/// # let mut engine = Engine::new();
/// engine
///     .create_module("svc", Vec::<String>::new())?
///     .worker("job", vec!["queue".into(), Injectable::callable(|_| Ok(serde_json::Value::Null))])?
///     .register("listener", "on_start", vec!["boot".into()])?;
/// # Ok::<(), sinj::SinjError>(())
/// ```
pub struct ModuleHandle<'e> {
    engine: &'e mut Engine,
    namespace: String,
}

impl<'e> ModuleHandle<'e> {
    pub(crate) fn new(engine: &'e mut Engine, namespace: String) -> Self {
        Self { engine, namespace }
    }

    /// Имя пространства имён.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Зарегистрировать контроллер.
    pub fn controller(&mut self, name: &str, inject: Vec<Injectable>) -> SinjResult<&mut Self> {
        self.register(MethodType::CONTROLLER, name, inject)
    }

    /// Зарегистрировать воркер.
    pub fn worker(&mut self, name: &str, inject: Vec<Injectable>) -> SinjResult<&mut Self> {
        self.register(MethodType::WORKER, name, inject)
    }

    /// Зарегистрировать метод произвольного типа.
    pub fn register(
        &mut self,
        method_type: impl Into<MethodType>,
        name: &str,
        inject: Vec<Injectable>,
    ) -> SinjResult<&mut Self> {
        self.engine
            .register_method(&self.namespace, method_type.into(), name, inject)?;
        Ok(self)
    }

    /// Доступ к движку (например, чтобы объявить ещё одно пространство).
    pub fn engine(&mut self) -> &mut Engine {
        &mut *self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_chained_registration() {
        let mut engine = Engine::new();
        engine
            .create_module("core", Vec::<String>::new())
            .unwrap()
            .controller("init", vec!["a".into()])
            .unwrap()
            .worker("sync", vec!["b".into()])
            .unwrap();

        assert!(engine.methods().contains("core", "init"));
        assert!(engine.methods().contains("core", "sync"));
    }

    #[test]
    fn test_chain_stops_on_duplicate() {
        let mut engine = Engine::new();
        let mut handle = engine.create_module("core", Vec::<String>::new()).unwrap();
        assert_eq!(handle.namespace(), "core");

        handle.controller("init", vec!["a".into()]).unwrap();
        let err = handle
            .worker("init", vec!["b".into()])
            .err()
            .and_then(|e| e.kind());
        assert_eq!(err, Some(ErrorKind::DuplicateNaming));
    }
}
