use std::env;

use crate::host::fixture::{load_fixture_host, DEFAULT_HOST_PATH};
use crate::host::validate::validate_host_fixture;
use crate::server;
use crate::session::{ApplyOutcome, ForgeSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Discover,
    Apply,
    Validate,
    Serve,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("discover") => Some(Command::Discover),
        Some("apply") => Some(Command::Apply),
        Some("validate") => Some(Command::Validate),
        Some("serve") => Some(Command::Serve),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Discover) => handle_discover(args),
        Some(Command::Apply) => handle_apply(args),
        Some(Command::Validate) => handle_validate(args),
        Some(Command::Serve) => handle_serve(),
        None => {
            eprintln!("usage: implantforge <discover|apply|validate|serve>");
            2
        }
    }
}

fn handle_discover(args: &[String]) -> i32 {
    let Some(path) = args.get(2) else {
        eprintln!("usage: implantforge discover <host.json>");
        return 2;
    };

    let host = match load_fixture_host(path) {
        Ok(host) => host,
        Err(err) => {
            eprintln!("discover failed: {err}");
            return 1;
        }
    };

    let mut session = ForgeSession::default();
    session.load_catalogs(&host);

    let payload = serde_json::json!({
        "loaded": session.is_loaded(),
        "status": session.status(),
        "effects": catalog_object(session.effects()),
        "conditions": catalog_object(session.conditions()),
        "templates": catalog_object(session.templates()),
    });
    match serde_json::to_string_pretty(&payload) {
        Ok(text) => println!("{text}"),
        Err(err) => {
            eprintln!("failed to serialize catalogs: {err}");
            return 1;
        }
    }

    let all_empty = session.effects().is_empty()
        && session.conditions().is_empty()
        && session.templates().is_empty();
    if all_empty {
        eprintln!("discovery found nothing: {}", session.status());
        return 1;
    }
    0
}

fn handle_apply(args: &[String]) -> i32 {
    let (Some(path), Some(template)) = (args.get(2), args.get(3)) else {
        eprintln!(
            "usage: implantforge apply <host.json> <template> [effect=magnitude ...] [+condition ...] [--uses n]"
        );
        return 2;
    };

    let mut host = match load_fixture_host(path) {
        Ok(host) => host,
        Err(err) => {
            eprintln!("apply failed: {err}");
            return 1;
        }
    };

    let mut session = ForgeSession::default();
    eprintln!("{}", session.load_catalogs(&host));
    eprintln!("{}", session.pick_template(template));

    let mut rest = args[4..].iter();
    while let Some(arg) = rest.next() {
        if arg == "--uses" {
            let uses = parse_i64_arg(rest.next(), "uses", 2);
            session.set_uses(uses);
        } else if let Some(condition) = arg.strip_prefix('+') {
            eprintln!("{}", session.add_condition(condition));
        } else if let Some((name, raw_magnitude)) = arg.split_once('=') {
            let magnitude = raw_magnitude.parse::<f32>().unwrap_or_else(|_| {
                eprintln!("invalid magnitude '{raw_magnitude}' for {name}, defaulting to 0.2");
                0.2
            });
            eprintln!("{}", session.add_effect(name, magnitude));
        } else {
            eprintln!("ignoring unrecognized argument '{arg}'");
        }
    }

    match session.apply(&mut host) {
        ApplyOutcome::Applied(report) => match serde_json::to_string_pretty(&report) {
            Ok(text) => {
                println!("{text}");
                eprintln!("{}", session.status());
                0
            }
            Err(err) => {
                eprintln!("failed to serialize apply report: {err}");
                1
            }
        },
        ApplyOutcome::Rejected(err) => {
            eprintln!("apply rejected: {err}");
            1
        }
    }
}

fn handle_validate(args: &[String]) -> i32 {
    let path = args.get(2).map(String::as_str).unwrap_or(DEFAULT_HOST_PATH);

    match validate_host_fixture(path) {
        Ok(report) => {
            if report.diagnostics.is_empty() {
                println!("validation passed: {path}");
                return 0;
            }
            for diagnostic in &report.diagnostics {
                println!("- {diagnostic}");
            }
            if report.has_errors() {
                eprintln!("validation failed: {path}");
                1
            } else {
                println!("validation passed with warnings: {path}");
                0
            }
        }
        Err(err) => {
            eprintln!("validation failed: {err}");
            1
        }
    }
}

fn handle_serve() -> i32 {
    let bind_addr =
        env::var("IMPLANTFORGE_BIND").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let host_path =
        env::var("IMPLANTFORGE_HOST").unwrap_or_else(|_| DEFAULT_HOST_PATH.to_string());
    match server::run_server(&bind_addr, &host_path) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn catalog_object(map: &crate::discovery::ConstantMap) -> Vec<serde_json::Value> {
    map.iter()
        .map(|(name, id)| serde_json::json!({ "name": name, "id": id }))
        .collect()
}

fn parse_i64_arg(raw: Option<&String>, name: &str, default: i64) -> i64 {
    raw.and_then(|value| value.parse::<i64>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}
