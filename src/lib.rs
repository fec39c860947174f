//! # Sinj
//!
//! Лёгкий движок регистрации модулей и проверки зависимостей.
//!
//! Автор модуля объявляет пространство имён, перечисляет пространства, от
//! которых оно зависит, и регистрирует в нём методы с тегом типа
//! ("controller", "worker", ...). Каждый метод несёт свой список
//! зависимостей и реализацию.
//!
//! ## Основные модули
//!
//! - [`engine`] - Владеющий контекст и двухфазный протокол
//! - [`modules`] - Реестры, API регистрации, загрузка внешних юнитов
//! - [`executor`] - Исполнение зарегистрированных методов
//! - [`error`] - Таксономия ошибок
//!
//! ## Пример
//!
//! ```rust
//! use sinj::{Engine, Injectable};
//!
//! let mut engine = Engine::new();
//! engine.create_module("core", ["utils"])?;
//! engine.create_module("utils", Vec::<String>::new())?;
//!
//! // "utils" объявлен позже "core", но проверка идёт только при seal()
//! assert!(engine.seal()?.is_some());
//! assert!(engine.seal()?.is_none());
//! # Ok::<(), sinj::SinjError>(())
//! ```

pub mod engine;
pub mod error;
pub mod executor;
pub mod modules;

// === Re-exports для удобства ===
pub use engine::{Engine, RegistrySnapshot};
pub use error::{ErrorKind, RegistryError, SinjError, SinjResult};
pub use executor::{ExecutionReport, Executor, Invocation, SequentialExecutor};
pub use modules::{
    Dependency, Injectable, JsonScriptHost, Method, MethodType, ModuleConfig,
    ModuleDependencies, ModuleHandle, ScriptHost, ScriptUnit,
};
