//! Проверка зависимостей между пространствами имён.
//!
//! Проверка одноуровневая: каждая неразрешённая ссылка должна совпадать с
//! именем какого-либо существующего пространства. Транзитивное замыкание,
//! циклы и порядок загрузки не проверяются.

use std::collections::HashSet;

use log::debug;

use crate::error::RegistryError;

use super::{MethodRegistry, NamespaceRegistry};

/// Разрешить все неразрешённые ссылки.
///
/// Пространства обходятся в порядке создания, ссылки в порядке объявления.
/// Первая ссылка на несуществующее пространство прерывает проход с
/// `MissingDependency`; уже поднятые флаги при этом остаются поднятыми.
/// Возвращает количество поднятых флагов.
pub fn resolve_dependencies(namespaces: &mut NamespaceRegistry) -> Result<usize, RegistryError> {
    let owners: Vec<String> = namespaces.names().map(str::to_string).collect();
    let known: HashSet<String> = owners.iter().cloned().collect();
    let mut resolved = 0;

    for owner in &owners {
        let Some(namespace) = namespaces.get_mut(owner) else {
            continue;
        };

        for (dependency, flag) in namespace.dependencies.iter_mut() {
            if *flag {
                continue;
            }

            if !known.contains(dependency) {
                return Err(RegistryError::missing_dependency(owner, dependency.as_str()));
            }

            debug!("'{}' -> '{}' resolved", owner, dependency);
            *flag = true;
            resolved += 1;
        }
    }

    Ok(resolved)
}

/// Итоговая проверка реестра методов на дубликаты.
///
/// Дубликаты отклоняются при регистрации, поэтому здесь только
/// утверждается согласованность: каждый метод встречается ровно в одном
/// множестве индекса типов своего пространства. Ничего не отклоняет.
pub fn sweep_duplicates(methods: &MethodRegistry) -> usize {
    let mut checked = 0;

    for (namespace, slot) in methods.method_table() {
        for name in slot.keys() {
            let occurrences = methods
                .type_table()
                .get(namespace)
                .map(|index| index.values().filter(|names| names.contains(name)).count())
                .unwrap_or(0);

            debug_assert_eq!(
                occurrences, 1,
                "method {} -> {} indexed {} times",
                namespace, name, occurrences
            );
            checked += 1;
        }
    }

    checked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::modules::MethodType;

    #[test]
    fn test_forward_reference_resolves() {
        let mut namespaces = NamespaceRegistry::new();
        namespaces.create("core").unwrap();
        namespaces.declare("core", "utils", false).unwrap();
        namespaces.create("utils").unwrap();

        assert_eq!(resolve_dependencies(&mut namespaces).unwrap(), 1);
        assert!(namespaces.get("core").unwrap().is_resolved());
    }

    #[test]
    fn test_missing_dependency() {
        let mut namespaces = NamespaceRegistry::new();
        namespaces.create("core").unwrap();
        namespaces.declare("core", "missing", false).unwrap();

        let err = resolve_dependencies(&mut namespaces).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingDependency);
        assert_eq!(err.namespace, "core");
        assert_eq!(err.name.as_deref(), Some("missing"));
    }

    #[test]
    fn test_already_resolved_are_skipped() {
        let mut namespaces = NamespaceRegistry::new();
        namespaces.create("core").unwrap();
        // алиас проверенной зависимости не обязан совпадать с пространством
        namespaces.declare("core", "db", true).unwrap();

        assert_eq!(resolve_dependencies(&mut namespaces).unwrap(), 0);
    }

    #[test]
    fn test_single_level_only() {
        // a -> b -> c, c отсутствует: ошибка именно для b
        let mut namespaces = NamespaceRegistry::new();
        namespaces.create("a").unwrap();
        namespaces.declare("a", "b", false).unwrap();
        namespaces.create("b").unwrap();
        namespaces.declare("b", "c", false).unwrap();

        let err = resolve_dependencies(&mut namespaces).unwrap_err();
        assert_eq!(err.namespace, "b");
        // ссылка a -> b уже поднята
        assert_eq!(namespaces.get("a").unwrap().dependencies.get("b"), Some(&true));
    }

    #[test]
    fn test_cycles_are_accepted() {
        let mut namespaces = NamespaceRegistry::new();
        namespaces.create("a").unwrap();
        namespaces.declare("a", "b", false).unwrap();
        namespaces.create("b").unwrap();
        namespaces.declare("b", "a", false).unwrap();

        assert_eq!(resolve_dependencies(&mut namespaces).unwrap(), 2);
    }

    #[test]
    fn test_sweep_counts_methods() {
        let mut methods = MethodRegistry::new();
        methods.create_namespace("core");
        methods
            .register("core", MethodType::CONTROLLER, "init", vec!["x".into()])
            .unwrap();
        methods
            .register("core", MethodType::WORKER, "sync", vec!["y".into()])
            .unwrap();

        assert_eq!(sweep_duplicates(&methods), 2);
    }
}
