//! Textos visibles para el usuario, por `system_language` (en/es).
//!
//! El motor no renderiza markdown ni plantillas; cada función devuelve el
//! texto plano que el canal enviará tal cual.

pub fn already_first_step(lang: &str) -> &'static str {
    match lang {
        "es" => "Ya estás en el primer paso.",
        _ => "You are already at the first step.",
    }
}

pub fn busy(lang: &str) -> &'static str {
    match lang {
        "es" => "Todavía estoy procesando tu paso anterior, probá de nuevo en un momento.",
        _ => "Still processing your previous step, please try again in a moment.",
    }
}

pub fn text_required(lang: &str) -> &'static str {
    match lang {
        "es" => "Este paso requiere una respuesta; escribí algo.",
        _ => "This step requires an answer; please type something.",
    }
}

pub fn text_rejected(lang: &str) -> &'static str {
    match lang {
        "es" => "La respuesta no tiene el formato esperado, intentá de nuevo.",
        _ => "That answer does not match the expected format, please try again.",
    }
}

pub fn choice_empty(lang: &str) -> &'static str {
    match lang {
        "es" => "Elegí al menos una opción antes de continuar.",
        _ => "Pick at least one option before continuing.",
    }
}

pub fn file_type_rejected(lang: &str, allowed: &[String]) -> String {
    let list = allowed.join(", ");
    match lang {
        "es" => format!("Tipo de archivo no admitido. Enviá uno de: {list}."),
        _ => format!("File type not accepted. Send one of: {list}."),
    }
}

pub fn button_hint(lang: &str) -> &'static str {
    match lang {
        "es" => "Usá los botones del mensaje para responder este paso.",
        _ => "Use the buttons on the message to answer this step.",
    }
}

pub fn text_hint(lang: &str) -> &'static str {
    match lang {
        "es" => "Este paso espera una respuesta escrita.",
        _ => "This step expects a typed answer.",
    }
}

pub fn file_hint(lang: &str) -> &'static str {
    match lang {
        "es" => "Este paso espera un archivo adjunto.",
        _ => "This step expects a file attachment.",
    }
}

pub fn completed(lang: &str, answered: usize) -> String {
    match lang {
        "es" => format!("¡Proceso completado! Registramos {answered} respuestas."),
        _ => format!("Process complete! {answered} answers recorded."),
    }
}

pub fn already_completed(lang: &str) -> &'static str {
    match lang {
        "es" => "Este proceso ya fue completado.",
        _ => "This process was already completed.",
    }
}

pub fn session_expired(lang: &str) -> &'static str {
    match lang {
        "es" => "La sesión expiró por inactividad. Podés retomar el proceso desde el menú.",
        _ => "Your session expired due to inactivity. You can restart the process from the menu.",
    }
}

pub fn abandoned(lang: &str) -> &'static str {
    match lang {
        "es" => "Sesión cerrada. Tus respuestas guardadas se conservan.",
        _ => "Session closed. Your saved answers are kept.",
    }
}

pub fn no_active_process(lang: &str) -> &'static str {
    match lang {
        "es" => "No hay un proceso activo; empezá uno desde el menú.",
        _ => "No active process; start one from the menu.",
    }
}

pub fn not_found(lang: &str, what: &str) -> String {
    match lang {
        "es" => format!("No se encontró: {what}."),
        _ => format!("Not found: {what}."),
    }
}

pub fn at_boundary(lang: &str) -> &'static str {
    match lang {
        "es" => "El paso ya está en el extremo de la secuencia.",
        _ => "The step is already at the edge of the sequence.",
    }
}

pub fn external_failure(lang: &str) -> &'static str {
    match lang {
        "es" => "Un servicio externo falló; reenviá tu última acción para reintentar.",
        _ => "An external service failed; resend your last action to retry.",
    }
}

pub fn internal(lang: &str) -> &'static str {
    match lang {
        "es" => "Ocurrió un error inesperado; intentá de nuevo.",
        _ => "Something unexpected went wrong; please try again.",
    }
}

pub fn btn_yes(lang: &str) -> &'static str {
    match lang {
        "es" => "Sí",
        _ => "Yes",
    }
}

pub fn btn_no(_lang: &str) -> &'static str {
    "No"
}

pub fn btn_confirm(lang: &str) -> &'static str {
    match lang {
        "es" => "Confirmar",
        _ => "Confirm",
    }
}

pub fn btn_done(lang: &str) -> &'static str {
    match lang {
        "es" => "Listo",
        _ => "Done",
    }
}

pub fn btn_next(lang: &str) -> &'static str {
    match lang {
        "es" => "Siguiente",
        _ => "Next",
    }
}

pub fn btn_prev(lang: &str) -> &'static str {
    match lang {
        "es" => "Anterior",
        _ => "Previous",
    }
}

pub fn btn_finish(lang: &str) -> &'static str {
    match lang {
        "es" => "Finalizar",
        _ => "Finish",
    }
}
