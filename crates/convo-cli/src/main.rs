use std::sync::Arc;

use convo_adapters::{LocalFileRetrieval, MemoryChatChannel, TemplateStepGenerator};
use convo_core::{AnswerStore, ChatEvent, DialogEngine, ProcessRepository, StepGenerator};
use convo_domain::{ProcessDefinition, Step, StepType};

fn usage() {
    eprintln!("usage: convo-cli demo");
    eprintln!("       convo-cli generate --title <TXT> --description <TXT>");
}

#[tokio::main]
async fn main() {
    // Cargar .env si existe (paridad con el resto del workspace)
    let _ = dotenvy::dotenv();
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        usage();
        std::process::exit(2);
    }

    match args[1].as_str() {
        "demo" => run_demo().await,
        "generate" => {
            let mut title: Option<String> = None;
            let mut description: Option<String> = None;
            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--title" => {
                        i += 1;
                        if i < args.len() {
                            title = Some(args[i].clone());
                        }
                    }
                    "--description" => {
                        i += 1;
                        if i < args.len() {
                            description = Some(args[i].clone());
                        }
                    }
                    _ => {}
                }
                i += 1;
            }
            let (Some(title), Some(description)) = (title, description) else {
                usage();
                std::process::exit(2);
            };
            run_generate(&title, &description).await;
        }
        _ => {
            usage();
            std::process::exit(2);
        }
    }
}

/// Imprime como JSON la secuencia que produciría `regenerate_with_ai`.
async fn run_generate(title: &str, description: &str) {
    let generator = TemplateStepGenerator::new();
    match generator.generate_steps(title, description).await {
        Ok(steps) => match serde_json::to_string_pretty(&steps) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("[convo-cli] serialize error: {e}");
                std::process::exit(5);
            }
        },
        Err(e) => {
            eprintln!("[convo-cli] generation error: {e}");
            std::process::exit(5);
        }
    }
}

/// Conversación guionada de punta a punta contra stores en memoria,
/// imprimiendo el tráfico de ambos lados.
async fn run_demo() {
    const USER: i64 = 1;
    let channel = Arc::new(MemoryChatChannel::new());
    let engine = DialogEngine::in_memory().build(Box::new(channel.clone()),
                                                 Box::new(LocalFileRetrieval::new("/tmp/convo")),
                                                 Box::new(TemplateStepGenerator::new()));

    let mut process = match ProcessDefinition::new("Signup", "A quick signup flow", "demo-author") {
        Ok(p) => p,
        Err(e) => {
            eprintln!("[convo-cli] {e}");
            std::process::exit(5);
        }
    };
    for step in [Step::new(StepType::TextInput, "What is your name?"),
                 Step::new(StepType::YesNo, "Subscribe to the newsletter?"),
                 Step::new(StepType::Final, "Confirm to finish your signup.")]
    {
        match step {
            Ok(s) => process.push_step(s),
            Err(e) => {
                eprintln!("[convo-cli] {e}");
                std::process::exit(5);
            }
        }
    }
    let pid = process.id;
    engine.processes().save(process);

    let script = [ChatEvent::text(USER, "Alice"),
                  ChatEvent::button(USER, "yes"),
                  ChatEvent::button(USER, "confirm")];

    let mut printed = 0usize;
    let mut flush = |printed: &mut usize| {
        for (uid, msg) in channel.outbox().iter().skip(*printed) {
            println!("bot -> {uid}: {}", msg.text.replace('\n', " | "));
            for row in &msg.buttons {
                let labels: Vec<&str> = row.iter().map(|b| b.label.as_str()).collect();
                println!("            [{}]", labels.join("] ["));
            }
            *printed += 1;
        }
    };

    if let Err(e) = engine.begin_process(USER, pid).await {
        eprintln!("[convo-cli] begin failed: {e}");
        std::process::exit(4);
    }
    flush(&mut printed);

    for event in script {
        match &event.kind {
            convo_core::ChatEventKind::Text(t) => println!("user: {t}"),
            convo_core::ChatEventKind::Button(d) => println!("user: <{d}>"),
            convo_core::ChatEventKind::File(f) => println!("user: <file {}>", f.file_name),
        }
        if let Err(e) = engine.handle_event(event).await {
            eprintln!("[convo-cli] event failed: {e}");
            std::process::exit(4);
        }
        flush(&mut printed);
    }

    match engine.answers().load(USER, pid) {
        Some(record) => {
            println!("--");
            println!("recorded {} answers, completed: {}", record.answers.len(), record.completed_at.is_some());
        }
        None => {
            eprintln!("[convo-cli] no answer record after demo");
            std::process::exit(4);
        }
    }
}
