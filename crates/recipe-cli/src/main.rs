use std::io::{BufRead, Write};

use recipe_adapters::ToolRegistry;
use recipe_core::{ExecutionScope, ExecutionStatus, RecipeEngine};
use recipe_domain::{FieldType, InputField, RecipeRelease, ReleaseStep, StepKind};
use serde_json::{json, Value};
use uuid::Uuid;

fn main() {
    // CLI mínima:
    //   recipe-cli run --release <FILE.json> [--inputs '<JSON>']
    //   recipe-cli demo [--region <TXT>]
    let args: Vec<String> = std::env::args().collect();
    if args.len() >= 2 && args[1] == "run" {
        let mut release_path: Option<String> = None;
        let mut inputs: Option<String> = None;
        let mut i = 2;
        while i < args.len() {
            match args[i].as_str() {
                "--release" => { i += 1; if i < args.len() { release_path = Some(args[i].clone()); } }
                "--inputs" => { i += 1; if i < args.len() { inputs = Some(args[i].clone()); } }
                _ => {}
            }
            i += 1;
        }
        let Some(path) = release_path else {
            eprintln!("Uso: recipe-cli run --release <FILE.json> [--inputs '<JSON>']");
            std::process::exit(2);
        };
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => { eprintln!("[recipe run] no se pudo leer {path}: {e}"); std::process::exit(3); }
        };
        let release: RecipeRelease = match serde_json::from_str(&raw) {
            Ok(release) => release,
            Err(e) => { eprintln!("[recipe run] release JSON parse error: {e}"); std::process::exit(3); }
        };
        if let Err(e) = release.validate() {
            eprintln!("[recipe run] release inválida: {e}");
            std::process::exit(3);
        }
        let inputs: Value = match inputs.as_deref() {
            Some(raw) => match serde_json::from_str(raw) {
                Ok(v) => v,
                Err(e) => { eprintln!("[recipe run] inputs JSON parse error: {e}"); std::process::exit(3); }
            },
            None => json!({}),
        };
        run_release(&release, inputs);
    } else if args.len() >= 2 && args[1] == "demo" {
        let mut region = "us-east".to_string();
        let mut i = 2;
        while i < args.len() {
            if args[i].as_str() == "--region" {
                i += 1;
                if i < args.len() { region = args[i].clone(); }
            }
            i += 1;
        }
        run_release(&demo_release(), json!({ "region": region }));
    } else {
        println!("recipe-cli: use 'run' or 'demo' subcommands");
    }
}

/// Ejecuta la release con los tools builtin, preguntando por stdin en cada
/// suspensión hasta llegar a un estado terminal.
fn run_release(release: &RecipeRelease, inputs: Value) {
    let mut engine = RecipeEngine::in_memory(ToolRegistry::with_builtins());
    let scope = ExecutionScope { organization_id: Uuid::new_v4(),
                                 environment_id: Uuid::new_v4() };

    let mut execution = match engine.start(release, scope, inputs) {
        Ok(execution) => execution,
        Err(e) => { eprintln!("[recipe run] start error: {e}"); std::process::exit(5); }
    };

    while execution.status == ExecutionStatus::WaitingInput {
        let step = execution.current_step_key.clone().unwrap_or_default();
        let Some(pending) = execution.pending_input.clone() else {
            eprintln!("[recipe run] waiting_input sin pending_input");
            std::process::exit(5);
        };
        println!("-- step '{step}' espera input --");
        let response = prompt_fields(&pending.fields);
        execution = match engine.respond(execution.id, release, &response) {
            Ok(execution) => execution,
            Err(e) => { eprintln!("[recipe run] respond error: {e}"); std::process::exit(exit_code(e.http_status())); }
        };
    }

    match execution.status {
        ExecutionStatus::Completed => {
            println!("completed: {} steps", execution.results.len());
            for (key, result) in &execution.results {
                println!("  {key}: {}", result.value);
            }
            for item in engine.store().output_items_for(&execution) {
                let name = item.display_name.clone().unwrap_or_else(|| "output".into());
                println!("output [{name}]: {}", item.payload);
            }
        }
        ExecutionStatus::Failed => {
            eprintln!("failed: {}", execution.failure_reason.as_deref().unwrap_or("unknown"));
            std::process::exit(4);
        }
        other => {
            eprintln!("[recipe run] estado inesperado {other:?}");
            std::process::exit(5);
        }
    }
}

/// Pregunta cada campo por stdin y arma el objeto de respuesta. Un campo
/// opcional dejado vacío se omite (toma su default en el respond).
fn prompt_fields(fields: &[InputField]) -> Value {
    let stdin = std::io::stdin();
    let mut body = serde_json::Map::new();
    for field in fields {
        let suffix = match &field.default {
            Some(default) => format!(" [{default}]"),
            None => String::new(),
        };
        print!("{} ({}){}: ", field.prompt, field.field_type.name(), suffix);
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_field(field.field_type, line) {
            Some(value) => { body.insert(field.key.clone(), value); }
            None => eprintln!("  valor inválido para '{}', se omite", field.key),
        }
    }
    Value::Object(body)
}

fn parse_field(field_type: FieldType, raw: &str) -> Option<Value> {
    match field_type {
        FieldType::Text => Some(json!(raw)),
        FieldType::Boolean => match raw {
            "y" | "yes" | "true" | "si" | "sí" => Some(json!(true)),
            "n" | "no" | "false" => Some(json!(false)),
            _ => None,
        },
        FieldType::Number => serde_json::from_str::<Value>(raw).ok().filter(Value::is_number),
        FieldType::Json => serde_json::from_str(raw).ok(),
    }
}

fn exit_code(status: u16) -> i32 {
    match status {
        400 => 3,
        404 | 409 => 4,
        _ => 5,
    }
}

/// Release de demostración: fetch -> confirmación humana -> tabla.
fn demo_release() -> RecipeRelease {
    RecipeRelease::new(Uuid::new_v4(),
                       1,
                       vec![ReleaseStep::new("fetch_rows",
                                             StepKind::ToolCall { tool: "json.echo".into(),
                                                                  params: json!({"rows": [{"id": 7, "region": "{{ inputs.region }}"},
                                                                                          {"id": 9, "region": "{{ inputs.region }}"}]}) }),
                            ReleaseStep::new("confirm",
                                             StepKind::HumanInput { fields: vec![
                                                 InputField::required("proceed", "¿Armar la tabla?", FieldType::Boolean),
                                                 InputField::optional("title", "Título", FieldType::Text, json!("Rows {{ inputs.region }}")),
                                             ] }).after(&["fetch_rows"]),
                            ReleaseStep::new("build_table",
                                             StepKind::ToolCall { tool: "table.build".into(),
                                                                  params: json!({"rows": "{{ results.fetch_rows.rows }}",
                                                                                 "title": "{{ results.confirm.title }}"}) })
                                .after(&["confirm"])])
}
