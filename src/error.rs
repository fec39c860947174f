//! Определения ошибок для Sinj.
//!
//! Ошибки регистрации имеют фиксированную индексированную таксономию
//! ([`ErrorKind`]) и единый формат сообщения:
//! `"<message>. Module: <namespace>[ -> <name>]"`.

use std::path::PathBuf;

use thiserror::Error;

/// Основной тип `Result` для библиотеки.
pub type SinjResult<T> = Result<T, SinjError>;

/// Категория ошибки регистрации. Индекс 0 зарезервирован под неизвестную ошибку.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unknown = 0,
    DuplicateNaming = 1,
    MissingParameter = 2,
    MissingDependency = 3,
    /// Зарезервировано: структурное нарушение (например, контроллер внутри контроллера).
    NestedScope = 4,
}

impl ErrorKind {
    const ALL: [ErrorKind; 5] = [
        ErrorKind::Unknown,
        ErrorKind::DuplicateNaming,
        ErrorKind::MissingParameter,
        ErrorKind::MissingDependency,
        ErrorKind::NestedScope,
    ];

    /// Индекс категории в таксономии.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Категория по индексу. Всё, что вне таблицы, считается неизвестной ошибкой.
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or(ErrorKind::Unknown)
    }

    /// Фиксированный текст сообщения.
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::Unknown => "Unknown error",
            ErrorKind::DuplicateNaming => "Duplicate naming",
            ErrorKind::MissingParameter => "Missing parameter",
            ErrorKind::MissingDependency => "Module missing dependency",
            ErrorKind::NestedScope => "Controller within controller",
        }
    }
}

fn name_suffix(name: &Option<String>) -> String {
    match name {
        Some(name) => format!(" -> {}", name),
        None => String::new(),
    }
}

/// Нарушение правил регистрации или валидации.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}. Module: {}{}", .kind.message(), .namespace, name_suffix(.name))]
pub struct RegistryError {
    pub kind: ErrorKind,
    /// Пространство имён, в котором обнаружено нарушение
    pub namespace: String,
    /// Метод или зависимость, если применимо
    pub name: Option<String>,
}

impl RegistryError {
    pub fn new(kind: ErrorKind, namespace: impl Into<String>, name: Option<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name,
        }
    }

    /// Повторное объявление пространства имён.
    pub fn duplicate_namespace(namespace: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateNaming, namespace, None)
    }

    /// Повторная регистрация метода внутри пространства имён.
    pub fn duplicate_method(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateNaming, namespace, Some(name.into()))
    }

    /// Не указано имя или список зависимостей/реализации.
    /// Сообщение называет только пространство имён.
    pub fn missing_parameter(namespace: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingParameter, namespace, None)
    }

    /// Ссылка на пространство имён, которое так и не было создано.
    pub fn missing_dependency(namespace: impl Into<String>, dependency: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::MissingDependency,
            namespace,
            Some(dependency.into()),
        )
    }

    pub fn nested_scope(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(ErrorKind::NestedScope, namespace, Some(name.into()))
    }

    pub fn unknown(namespace: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, namespace, None)
    }
}

/// Перечисление всех возможных ошибок.
#[derive(Error, Debug)]
pub enum SinjError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error in {}: {message}", .path.display())]
    ParseError { path: PathBuf, message: String },

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Evaluation of {} exceeded {timeout_ms} ms", .path.display())]
    Timeout { path: PathBuf, timeout_ms: u128 },

    #[error("Registration is sealed, cannot modify namespace {0}")]
    Sealed(String),

    #[error("Registration is sealed, cannot load unit {0}")]
    SealedUnit(String),

    #[error("Method {namespace} -> {name} failed: {message}")]
    MethodFailed {
        namespace: String,
        name: String,
        message: String,
    },
}

impl From<serde_json::Error> for SinjError {
    fn from(e: serde_json::Error) -> Self {
        SinjError::SerializationError(e.to_string())
    }
}

impl SinjError {
    /// Категория таксономии, если это ошибка регистрации.
    pub fn kind(&self) -> Option<ErrorKind> {
        self.registry().map(|e| e.kind)
    }

    pub fn registry(&self) -> Option<&RegistryError> {
        match self {
            SinjError::Registry(e) => Some(e),
            _ => None,
        }
    }
}
