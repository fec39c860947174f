//! Sinj CLI - загрузка юнитов, проверка и исполнение.
//!
//! Использование:
//!   sinj <unit>...            - загрузить юниты, проверить и исполнить
//!   sinj --dump <unit>...     - вывести состояние реестров
//!   sinj --help               - справка

use std::env;
use std::process;

use sinj::{Engine, ExecutionReport, ModuleConfig, SinjResult};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP: &str = r#"
Sinj - module registration and dependency validation

USAGE:
    sinj [OPTIONS] <unit>...

OPTIONS:
    --timeout <ms>       Evaluation budget per unit (default 180000)
    --base-dir <dir>     Directory unit references are resolved against
    --dump               Print registry state instead of the execution report
    --help, -h           Show this help
    --version, -v        Show version

UNIT FORMAT (JSON, ".json" is appended when missing):
    [
      { "module": "core", "dependencies": ["utils"],
        "methods": [{ "type": "controller", "name": "init", "inject": ["db", "ready"] }] },
      { "module": "utils" }
    ]

    "dependencies" may also be an object {"alias": "path/to/unit"}: such
    units are loaded immediately.

ENVIRONMENT:
    RUST_LOG=debug       Verbose logging
"#;

struct Options {
    config: ModuleConfig,
    dump: bool,
    units: Vec<String>,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(Some(options)) => options,
        Ok(None) => return,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("Use --help for usage information.");
            process::exit(1);
        }
    };

    if let Err(e) = run(options) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Разобрать аргументы. `Ok(None)`, если справка или версия уже выведены.
fn parse_args(args: &[String]) -> Result<Option<Options>, String> {
    let mut config = ModuleConfig::default();
    let mut dump = false;
    let mut units = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                println!("{}", HELP);
                return Ok(None);
            }
            "--version" | "-v" => {
                println!("Sinj {}", VERSION);
                return Ok(None);
            }
            "--dump" => dump = true,
            "--timeout" => {
                let value = iter.next().ok_or("--timeout requires a value")?;
                let ms = value
                    .parse::<u64>()
                    .map_err(|_| format!("Invalid timeout: {}", value))?;
                config = config.with_timeout_ms(ms);
            }
            "--base-dir" => {
                let value = iter.next().ok_or("--base-dir requires a value")?;
                config = config.with_base_dir(value);
            }
            other if other.starts_with('-') => {
                return Err(format!("Unknown option: {}", other));
            }
            unit => units.push(unit.to_string()),
        }
    }

    if units.is_empty() {
        return Err("No units given.".to_string());
    }

    Ok(Some(Options {
        config,
        dump,
        units,
    }))
}

fn run(options: Options) -> SinjResult<()> {
    let mut engine = Engine::with_config(options.config);

    for unit in &options.units {
        engine.load_unit(unit)?;
    }

    let report = engine.seal()?;
    println!("{}", render(&engine, report, options.dump)?);

    Ok(())
}

/// Отчёт исполнения или дамп реестров в виде JSON.
fn render(engine: &Engine, report: Option<ExecutionReport>, dump: bool) -> SinjResult<String> {
    let json = if dump {
        serde_json::to_string_pretty(&engine.snapshot())?
    } else {
        serde_json::to_string_pretty(&report.unwrap_or_default())?
    };
    Ok(json)
}
